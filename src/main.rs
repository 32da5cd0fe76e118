use clap::{Parser, Subcommand};
use qa_client::{
    document::short_session_id, load_payload, ApiClient, ClientConfig, DocumentKey, Shell,
    TranscriptScope, DEFAULT_BASE_URL,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tui_app::AppConfig;

mod logging;

/// PDF 问答后端的终端客户端
#[derive(Parser, Debug)]
#[command(name = "pdfchat", version, about)]
struct Cli {
    /// 后端地址
    #[arg(long, global = true, default_value = DEFAULT_BASE_URL)]
    server: String,

    /// 请求超时（秒），默认不限
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// 切换文档时清空问答记录
    #[arg(long, global = true)]
    per_document_chat: bool,

    /// 日志级别
    #[arg(long, global = true, value_enum, default_value_t = logging::LogLevel::Info)]
    log_level: logging::LogLevel,

    /// 日志目录
    #[arg(long, global = true, default_value = "logs")]
    log_dir: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 启动终端界面（默认）
    Tui,
    /// 列出已上传的 PDF，按会话分组
    List,
    /// 上传一个 PDF
    Upload { path: PathBuf },
    /// 针对一个已上传的 PDF 提问
    Ask {
        filename: String,
        question: String,
        /// 同名文件存在于多个会话时指定会话
        #[arg(long)]
        session: Option<String>,
    },
    /// 删除一个 PDF
    Delete {
        filename: String,
        /// 同名文件存在于多个会话时指定会话
        #[arg(long)]
        session: Option<String>,
    },
    /// 删除一个会话及其所有 PDF
    DeleteSession { session_id: String },
    /// 检查后端状态
    Ping,
}

fn build_client(cli: &Cli) -> Result<ApiClient, qa_client::ApiError> {
    let mut config = ClientConfig::new().with_base_url(&cli.server);
    if let Some(secs) = cli.timeout {
        config = config.with_timeout(Duration::from_secs(secs));
    }
    ApiClient::new(config)
}

/// 列出文件
async fn run_list(shell: &mut Shell) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(notification) = shell.hydrate().await {
        return Err(notification.text.into());
    }

    let store = shell.store();
    if store.is_empty() {
        println!("No PDFs uploaded yet.");
        return Ok(());
    }

    for (session_id, documents) in store.sessions() {
        println!("📁 Session {}... ({} PDFs)", short_session_id(session_id), documents.len());
        for doc in documents {
            println!("   📄 {}  [{}]", doc.name, doc.upload_timestamp);
        }
    }
    Ok(())
}

/// 加载列表并按文件名（和会话）找到文档
async fn hydrate_and_resolve(
    shell: &mut Shell,
    filename: &str,
    session: Option<&str>,
) -> Result<DocumentKey, Box<dyn std::error::Error>> {
    if let Some(notification) = shell.hydrate().await {
        return Err(notification.text.into());
    }
    shell
        .resolve(filename, session)
        .map_err(|err| err.to_string_for_user().into())
}

/// 上传文件
async fn run_upload(shell: &mut Shell, path: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let payload = load_payload(&path)
        .await
        .map_err(|err| err.to_string_for_user())?;
    let notification = shell.upload(payload).await;
    if notification.is_error() {
        return Err(notification.text.into());
    }

    println!("✅ {}", notification.text);
    if let Some(doc) = shell.selected() {
        println!("   {} (session {})", doc.name, doc.session_id);
    }
    Ok(())
}

/// 提问：先选中文档，再针对它提问
async fn run_ask(
    shell: &mut Shell,
    filename: &str,
    question: &str,
    session: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let key = hydrate_and_resolve(shell, filename, session).await?;
    shell.select(&key);
    let answer = shell
        .ask(question)
        .await
        .map_err(|err| err.to_string_for_user())?;
    println!("{}", answer);
    Ok(())
}

/// 删除文件：先加载列表，本地不存在时不发请求
async fn run_delete(
    shell: &mut Shell,
    filename: &str,
    session: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let key = hydrate_and_resolve(shell, filename, session).await?;
    match shell.delete_document(&key).await {
        Some(notification) if notification.is_error() => Err(notification.text.into()),
        Some(notification) => {
            println!("✅ {}", notification.text);
            Ok(())
        }
        None => Err(format!("No uploaded PDF named {}", filename).into()),
    }
}

/// 检查后端
async fn run_ping(client: &ApiClient) -> Result<(), Box<dyn std::error::Error>> {
    let health = client.health().await?;
    println!("Server:     {}", client.base_url());
    println!("Status:     {}", health.status);
    println!("Upload dir: {}", if health.upload_dir { "ok" } else { "missing" });
    println!("Vector dir: {}", if health.vector_dir { "ok" } else { "missing" });

    match client.test_cors().await {
        Ok(value) => println!("CORS:       {}", value),
        Err(err) => println!("CORS:       {}", err),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let command = cli.command.as_ref().unwrap_or(&Command::Tui);
    let tui_mode = matches!(command, Command::Tui);

    // TUI 模式：只输出到文件（避免干扰界面）
    let _guard = logging::LoggingConfig::new()
        .with_log_dir(&cli.log_dir)
        .with_level(cli.log_level)
        .with_console_output(!tui_mode)
        .init()?;

    let client = build_client(&cli)?;
    tracing::info!("后端地址: {}", client.base_url());

    match command {
        Command::Tui => {
            let scope = if cli.per_document_chat {
                TranscriptScope::PerDocument
            } else {
                TranscriptScope::Global
            };
            let server_url = client.base_url().to_string();
            let config = AppConfig::default().with_scope(scope);
            tui_app::run_tui(Arc::new(client), server_url, config).await?;
        }
        Command::List => run_list(&mut Shell::new(Arc::new(client))).await?,
        Command::Upload { path } => {
            run_upload(&mut Shell::new(Arc::new(client)), path.clone()).await?
        }
        Command::Ask {
            filename,
            question,
            session,
        } => {
            let mut shell = Shell::new(Arc::new(client));
            run_ask(&mut shell, filename, question, session.as_deref()).await?
        }
        Command::Delete { filename, session } => {
            let mut shell = Shell::new(Arc::new(client));
            run_delete(&mut shell, filename, session.as_deref()).await?
        }
        Command::DeleteSession { session_id } => {
            let notification = Shell::new(Arc::new(client)).delete_session(session_id).await;
            if notification.is_error() {
                return Err(notification.text.into());
            }
            println!("✅ {}", notification.text);
        }
        Command::Ping => run_ping(&client).await?,
    }

    Ok(())
}

//! TUI 应用主逻辑
//!
//! 管理应用状态和主事件循环。后台任务只通过事件通道回报结果，
//! 所有状态修改都在事件循环里完成。

use crate::components::{
    nav_rows, AppTab, ChatPanelState, FilePickerState, NavBarState, NavRow, PickerAction,
};
use crate::event::{AppResult, Event, EventHandler};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use qa_client::{
    ask_document, load_payload, DocumentApi, Notification, Shell, ShellOutcome, ShellRequest,
    SubmitOutcome, TranscriptScope,
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// 成功提示的显示时长
const SUCCESS_TOAST: Duration = Duration::from_secs(3);
/// 错误提示的显示时长
const ERROR_TOAST: Duration = Duration::from_secs(4);

/// 界面配置
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// 问答记录的作用范围
    pub scope: TranscriptScope,
    /// 定时刷新间隔
    pub tick_rate: Duration,
    /// 文件选择的起始目录
    pub start_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            scope: TranscriptScope::Global,
            tick_rate: Duration::from_millis(250),
            start_dir: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }
}

impl AppConfig {
    pub fn with_scope(mut self, scope: TranscriptScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_start_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.start_dir = dir.into();
        self
    }
}

/// TUI 应用
pub struct TuiApp {
    /// 文档状态
    shell: Shell,
    /// 导航栏状态
    nav_state: NavBarState,
    /// 聊天面板状态
    chat_panel_state: ChatPanelState,
    /// 文件选择状态
    file_picker_state: FilePickerState,
    /// 当前焦点面板
    current_tab: AppTab,
    /// 当前提示
    notification: Option<Notification>,
    /// 进行中的文件操作数
    pending: usize,
    /// 事件发送器，后台任务通过它回报结果
    event_tx: mpsc::Sender<Event>,
    /// 根取消令牌，退出时取消所有后台任务
    cancel: CancellationToken,
    /// 进行中的提问
    ask_tokens: HashMap<u64, CancellationToken>,
    /// 后端地址（仅显示用）
    server_url: String,
    tick_rate: Duration,
    /// 运行状态
    running: bool,
}

impl TuiApp {
    /// 创建新的 TUI 应用
    pub fn new(
        api: Arc<dyn DocumentApi>,
        server_url: impl Into<String>,
        config: AppConfig,
        event_tx: mpsc::Sender<Event>,
    ) -> Self {
        Self {
            shell: Shell::new(api),
            nav_state: NavBarState::new(),
            chat_panel_state: ChatPanelState::new(config.scope),
            file_picker_state: FilePickerState::open(config.start_dir),
            current_tab: AppTab::Sessions,
            notification: None,
            pending: 0,
            event_tx,
            cancel: CancellationToken::new(),
            ask_tokens: HashMap::new(),
            server_url: server_url.into(),
            tick_rate: config.tick_rate,
            running: true,
        }
    }

    /// 运行应用
    pub async fn run(&mut self, mut event_rx: mpsc::Receiver<Event>) -> AppResult<()> {
        // 启用原始模式
        crossterm::terminal::enable_raw_mode()?;

        // 进入备用屏幕，开启粘贴事件
        crossterm::execute!(
            std::io::stdout(),
            crossterm::terminal::EnterAlternateScreen,
            crossterm::event::EnableBracketedPaste
        )?;

        let result = self.event_loop(&mut event_rx).await;

        // 清理（无论事件循环是否出错）
        self.cancel.cancel();
        crossterm::terminal::disable_raw_mode()?;
        crossterm::execute!(
            std::io::stdout(),
            crossterm::event::DisableBracketedPaste,
            crossterm::terminal::LeaveAlternateScreen
        )?;

        result
    }

    async fn event_loop(&mut self, event_rx: &mut mpsc::Receiver<Event>) -> AppResult<()> {
        // 创建终端
        let backend = CrosstermBackend::new(std::io::stdout());
        let mut terminal = Terminal::new(backend)?;

        // 启动键盘监听
        let handler = EventHandler::new(self.event_tx.clone());
        let token = self.cancel.child_token();
        tokio::spawn(async move {
            if let Err(err) = handler.run_keyboard_listener(token).await {
                tracing::error!("键盘监听退出: {}", err);
            }
        });

        // 启动定时器
        let handler = EventHandler::new(self.event_tx.clone());
        let token = self.cancel.child_token();
        let tick_rate = self.tick_rate;
        tokio::spawn(async move {
            let _ = handler.run_ticker(tick_rate, token).await;
        });

        // 加载已有文件
        self.dispatch(ShellRequest::Hydrate);

        // 主事件循环
        while self.running {
            // 绘制 UI
            terminal.draw(|f| {
                crate::ui::draw_ui(f, self);
            })?;

            match event_rx.recv().await {
                Some(event) => self.handle_event(event)?,
                None => break,
            }
        }

        Ok(())
    }

    /// 在后台执行文件操作，结果以 [`Event::Shell`] 回报
    pub fn dispatch(&mut self, request: ShellRequest) {
        tracing::debug!("提交后台请求: {}", request_label(&request));
        self.pending += 1;

        let api = self.shell.api();
        let tx = self.event_tx.clone();
        let token = self.cancel.child_token();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                outcome = request.execute(api.as_ref()) => {
                    let _ = tx.send(Event::Shell(outcome)).await;
                }
            }
        });
    }

    /// 在后台读取本地文件，结果以 [`Event::FileLoaded`] 回报
    fn load_file(&mut self, path: PathBuf) {
        tracing::info!("读取待上传文件: {}", path.display());
        self.pending += 1;

        let tx = self.event_tx.clone();
        let token = self.cancel.child_token();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                result = load_payload(&path) => {
                    let result = result.map_err(|e| e.to_string_for_user());
                    let _ = tx.send(Event::FileLoaded(result)).await;
                }
            }
        });
    }

    /// 在后台提问，结果以 [`Event::Answer`] 回报
    fn spawn_ask(&mut self, ticket: u64, filename: String, question: String) {
        tracing::info!("提问 #{} ({}): {}", ticket, filename, question);

        let api = self.shell.api();
        let tx = self.event_tx.clone();
        let token = self.cancel.child_token();
        self.ask_tokens.insert(ticket, token.clone());
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::debug!("提问 #{} 已取消", ticket);
                }
                result = ask_document(api.as_ref(), &filename, &question) => {
                    let result = result.map_err(|e| e.to_string());
                    let _ = tx.send(Event::Answer { ticket, result }).await;
                }
            }
        });
    }

    /// 处理一个事件
    pub fn handle_event(&mut self, event: Event) -> AppResult<()> {
        match event {
            Event::Input(key_event) => self.handle_key_event(key_event)?,
            Event::Paste(content) => self.handle_paste_event(content),
            Event::Shell(outcome) => {
                self.pending = self.pending.saturating_sub(1);
                let uploaded = matches!(outcome, ShellOutcome::Uploaded { result: Ok(_), .. });
                let notification = self.shell.apply(outcome);
                self.after_store_change(uploaded);
                if let Some(notification) = notification {
                    self.notify(notification);
                }
            }
            Event::FileLoaded(result) => {
                self.pending = self.pending.saturating_sub(1);
                match result {
                    Ok(payload) => match self.shell.upload_request(payload) {
                        Ok(request) => self.dispatch(request),
                        Err(err) => self.notify(Notification::error(err.to_string_for_user())),
                    },
                    Err(message) => self.notify(Notification::error(message)),
                }
            }
            Event::Answer { ticket, result } => {
                self.ask_tokens.remove(&ticket);
                if !self.chat_panel_state.resolve(ticket, result) {
                    tracing::debug!("丢弃过期的回答 #{}", ticket);
                }
            }
            Event::Tick => self.update(),
        }
        Ok(())
    }

    /// 处理键盘事件
    fn handle_key_event(&mut self, key_event: KeyEvent) -> AppResult<()> {
        if key_event.code == KeyCode::Char('c') && key_event.modifiers.contains(KeyModifiers::CONTROL) {
            self.running = false;
            return Ok(());
        }

        match key_event.code {
            // Tab 切换焦点
            KeyCode::Tab => {
                self.current_tab = self.current_tab.next();
                return Ok(());
            }
            KeyCode::BackTab => {
                self.current_tab = self.current_tab.previous();
                return Ok(());
            }
            _ => {}
        }

        match self.current_tab {
            AppTab::Sessions => self.handle_nav_key(key_event.code),
            AppTab::Chat => self.handle_chat_key(key_event.code),
            AppTab::Upload => self.handle_picker_key(key_event.code),
        }
        Ok(())
    }

    fn handle_nav_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Up => self.nav_state.move_up(),
            KeyCode::Down => {
                let count = nav_rows(self.shell.store()).len();
                self.nav_state.move_down(count);
            }
            KeyCode::Enter => {
                let key = match self.nav_state.current(self.shell.store()) {
                    Some(NavRow::Document(doc)) => doc.key(),
                    _ => return,
                };
                self.shell.select(&key);
                self.sync_selection();
                self.current_tab = AppTab::Chat;
            }
            KeyCode::Char('d') => {
                let request = match self.nav_state.current(self.shell.store()) {
                    Some(NavRow::Document(doc)) => self.shell.delete_document_request(&doc.key()),
                    _ => None,
                };
                if let Some(request) = request {
                    self.dispatch(request);
                }
            }
            KeyCode::Char('D') => {
                let session_id = self
                    .nav_state
                    .current(self.shell.store())
                    .map(|row| row.session_id().to_string());
                if let Some(session_id) = session_id {
                    let request = self.shell.delete_session_request(&session_id);
                    self.dispatch(request);
                }
            }
            KeyCode::Char('s') => self.nav_state.toggle_expanded(),
            KeyCode::Char('u') => {
                self.file_picker_state.refresh();
                self.current_tab = AppTab::Upload;
            }
            KeyCode::Char('r') => self.dispatch(ShellRequest::Hydrate),
            KeyCode::Char('q') => self.running = false,
            _ => {}
        }
    }

    fn handle_chat_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Enter => {
                let selected = self.shell.selected();
                match self.chat_panel_state.submit(selected) {
                    SubmitOutcome::Ask {
                        ticket,
                        filename,
                        question,
                    } => self.spawn_ask(ticket, filename, question),
                    SubmitOutcome::NoDocument => {
                        tracing::warn!("没有选中的文档，无法提问");
                    }
                    SubmitOutcome::Busy | SubmitOutcome::Ignored => {}
                }
            }
            KeyCode::Backspace => self.chat_panel_state.handle_backspace(),
            KeyCode::Delete => self.chat_panel_state.handle_delete(),
            KeyCode::Left => self.chat_panel_state.move_cursor_left(),
            KeyCode::Right => self.chat_panel_state.move_cursor_right(),
            KeyCode::Home => self.chat_panel_state.move_cursor_home(),
            KeyCode::End => self.chat_panel_state.move_cursor_end(),
            KeyCode::Up => self.chat_panel_state.scroll_up(),
            KeyCode::Down => self.chat_panel_state.scroll_down(),
            KeyCode::Esc => self.current_tab = AppTab::Sessions,
            // 在聊天面板时允许所有字符（包括 q）
            KeyCode::Char(c) => self.chat_panel_state.handle_input_char(c),
            _ => {}
        }
    }

    fn handle_picker_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Up => self.file_picker_state.move_up(),
            KeyCode::Down => self.file_picker_state.move_down(),
            KeyCode::Enter => {
                if let PickerAction::Selected(path) = self.file_picker_state.enter() {
                    self.load_file(path);
                }
            }
            KeyCode::Backspace | KeyCode::Left => {
                self.file_picker_state.parent();
            }
            KeyCode::Esc => self.current_tab = AppTab::Sessions,
            KeyCode::Char('q') => self.running = false,
            _ => {}
        }
    }

    /// 处理粘贴/输入法输入事件
    fn handle_paste_event(&mut self, content: String) {
        if self.current_tab == AppTab::Chat {
            for c in content.chars().filter(|c| !c.is_control()) {
                self.chat_panel_state.handle_input_char(c);
            }
        }
    }

    /// 文档列表变化后同步导航和聊天状态；上传成功时光标跟随新文档
    fn after_store_change(&mut self, follow_selection: bool) {
        let store = self.shell.store();
        self.nav_state.clamp(nav_rows(store).len());
        if follow_selection {
            if let Some(key) = store.selected_key().cloned() {
                self.nav_state.focus_document(self.shell.store(), &key);
            }
        }
        self.sync_selection();
    }

    /// 选中文档变化时通知聊天面板，并取消被放弃的提问
    fn sync_selection(&mut self) {
        let selected = self.shell.store().selected_key().cloned();
        if let Some(ticket) = self.chat_panel_state.on_selection_changed(selected.as_ref()) {
            if let Some(token) = self.ask_tokens.remove(&ticket) {
                tracing::info!("选中文档已变化，取消提问 #{}", ticket);
                token.cancel();
            }
        }
    }

    fn notify(&mut self, notification: Notification) {
        if notification.is_error() {
            tracing::warn!("提示: {}", notification.text);
        } else {
            tracing::info!("提示: {}", notification.text);
        }
        self.notification = Some(notification);
    }

    /// 更新应用状态：过期的提示自动消失
    fn update(&mut self) {
        let expired = self.notification.as_ref().is_some_and(|n| {
            let ttl = if n.is_error() { ERROR_TOAST } else { SUCCESS_TOAST };
            n.created_at.elapsed() >= ttl
        });
        if expired {
            self.notification = None;
        }
    }

    /// 文档状态
    pub fn shell(&self) -> &Shell {
        &self.shell
    }

    /// 导航栏状态
    pub fn nav_state(&self) -> &NavBarState {
        &self.nav_state
    }

    /// 获取聊天面板状态
    pub fn chat_panel_state(&self) -> &ChatPanelState {
        &self.chat_panel_state
    }

    /// 文件选择状态
    pub fn file_picker_state(&self) -> &FilePickerState {
        &self.file_picker_state
    }

    /// 获取当前焦点面板
    pub fn current_tab(&self) -> AppTab {
        self.current_tab
    }

    /// 当前提示
    pub fn notification(&self) -> Option<&Notification> {
        self.notification.as_ref()
    }

    /// 进行中的文件操作数
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// 后端地址
    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    /// 是否仍在运行
    pub fn is_running(&self) -> bool {
        self.running
    }
}

fn request_label(request: &ShellRequest) -> String {
    match request {
        ShellRequest::Hydrate => "加载文件列表".to_string(),
        ShellRequest::Upload(payload) => format!("上传 {}", payload.file_name),
        ShellRequest::DeleteDocument { key } => format!("删除 {}", key),
        ShellRequest::DeleteSession { session_id } => format!("删除会话 {}", session_id),
    }
}

/// 运行 TUI 应用的便捷函数
pub async fn run_tui(
    api: Arc<dyn DocumentApi>,
    server_url: String,
    config: AppConfig,
) -> AppResult<()> {
    let (event_tx, event_rx) = mpsc::channel(100);
    let mut app = TuiApp::new(api, server_url, config, event_tx);
    app.run(event_rx).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use qa_client::chat::MSG_UPLOAD_FIRST;
    use qa_client::{
        ApiError, AskResponse, ChatPhase, FilePayload, FileRecord, MessageRole, StatusResponse,
        UploadResponse,
    };
    use std::sync::Mutex;
    use std::time::Instant;

    #[derive(Default)]
    struct FakeApi {
        files: Vec<FileRecord>,
        hang_ask: bool,
        calls: Mutex<Vec<String>>,
    }

    impl FakeApi {
        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }
    }

    #[async_trait]
    impl DocumentApi for FakeApi {
        async fn upload_document(&self, payload: &FilePayload) -> qa_client::Result<UploadResponse> {
            self.record(format!("upload {}", payload.file_name));
            Ok(UploadResponse {
                message: "PDF uploaded successfully".to_string(),
                filename: payload.file_name.clone(),
                session_id: "s9".to_string(),
                status: "success".to_string(),
            })
        }

        async fn ask_question(&self, filename: &str, question: &str) -> qa_client::Result<AskResponse> {
            self.record(format!("ask {} {}", filename, question));
            if self.hang_ask {
                std::future::pending::<()>().await;
            }
            Ok(AskResponse {
                answer: format!("answer to {}", question),
                filename: filename.to_string(),
                question: question.to_string(),
                status: "success".to_string(),
                message: None,
            })
        }

        async fn list_documents(&self) -> qa_client::Result<Vec<FileRecord>> {
            self.record("list".to_string());
            Ok(self.files.clone())
        }

        async fn delete_document(&self, filename: &str) -> qa_client::Result<StatusResponse> {
            self.record(format!("delete {}", filename));
            Ok(StatusResponse {
                message: "deleted".to_string(),
                status: "success".to_string(),
            })
        }

        async fn delete_session(&self, session_id: &str) -> qa_client::Result<StatusResponse> {
            self.record(format!("delete-session {}", session_id));
            Err(ApiError::Http {
                status: 500,
                status_text: "Internal Server Error".to_string(),
                body: "boom".to_string(),
            })
        }
    }

    fn record(filename: &str, session_id: &str) -> FileRecord {
        FileRecord {
            filename: filename.to_string(),
            upload_timestamp: None,
            session_id: session_id.to_string(),
        }
    }

    fn key(code: KeyCode) -> Event {
        Event::Input(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn setup(api: FakeApi, scope: TranscriptScope) -> (TuiApp, mpsc::Receiver<Event>, tempfile::TempDir) {
        setup_shared(Arc::new(api), scope)
    }

    fn setup_shared(
        api: Arc<FakeApi>,
        scope: TranscriptScope,
    ) -> (TuiApp, mpsc::Receiver<Event>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let (tx, rx) = mpsc::channel(16);
        let config = AppConfig::default()
            .with_scope(scope)
            .with_start_dir(dir.path());
        let app = TuiApp::new(api, "http://test", config, tx);
        (app, rx, dir)
    }

    /// 等待下一个后台事件并交给应用处理
    async fn pump(app: &mut TuiApp, rx: &mut mpsc::Receiver<Event>) {
        let event = rx.recv().await.unwrap();
        app.handle_event(event).unwrap();
    }

    async fn hydrated(api: FakeApi, scope: TranscriptScope) -> (TuiApp, mpsc::Receiver<Event>, tempfile::TempDir) {
        let (mut app, mut rx, dir) = setup(api, scope);
        app.dispatch(ShellRequest::Hydrate);
        assert_eq!(app.pending(), 1);
        pump(&mut app, &mut rx).await;
        assert_eq!(app.pending(), 0);
        (app, rx, dir)
    }

    fn two_files() -> FakeApi {
        FakeApi {
            files: vec![record("a.pdf", "s1"), record("b.pdf", "s1")],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_hydrate_fills_store_without_notification() {
        let (app, _rx, _dir) = hydrated(two_files(), TranscriptScope::Global).await;
        assert_eq!(app.shell().store().len(), 2);
        assert!(app.shell().selected().is_none());
        assert!(app.notification().is_none());
    }

    #[tokio::test]
    async fn test_select_and_ask() {
        let (mut app, mut rx, _dir) = hydrated(two_files(), TranscriptScope::Global).await;

        // 第一行是会话，第二行是 a.pdf
        app.handle_event(key(KeyCode::Down)).unwrap();
        app.handle_event(key(KeyCode::Enter)).unwrap();
        assert_eq!(app.shell().selected().unwrap().name, "a.pdf");
        assert_eq!(app.current_tab(), AppTab::Chat);

        for c in "why?".chars() {
            app.handle_event(key(KeyCode::Char(c))).unwrap();
        }
        app.handle_event(key(KeyCode::Enter)).unwrap();
        assert!(app.chat_panel_state().is_awaiting());

        pump(&mut app, &mut rx).await;
        let messages = app.chat_panel_state().transcript().messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].text, "answer to why?");
        assert_eq!(app.chat_panel_state().transcript().phase(), ChatPhase::Idle);
    }

    #[tokio::test]
    async fn test_per_document_selection_change_cancels_ask() {
        let api = FakeApi {
            hang_ask: true,
            ..two_files()
        };
        let (mut app, _rx, _dir) = hydrated(api, TranscriptScope::PerDocument).await;

        app.handle_event(key(KeyCode::Down)).unwrap();
        app.handle_event(key(KeyCode::Enter)).unwrap();
        app.handle_event(key(KeyCode::Char('x'))).unwrap();
        app.handle_event(key(KeyCode::Enter)).unwrap();
        assert!(app.chat_panel_state().is_awaiting());
        assert_eq!(app.ask_tokens.len(), 1);

        // 切换到 b.pdf
        app.handle_event(key(KeyCode::Esc)).unwrap();
        app.handle_event(key(KeyCode::Down)).unwrap();
        app.handle_event(key(KeyCode::Enter)).unwrap();
        assert_eq!(app.shell().selected().unwrap().name, "b.pdf");
        assert!(app.ask_tokens.is_empty());
        assert!(!app.chat_panel_state().is_awaiting());
        assert!(app.chat_panel_state().transcript().messages().is_empty());

        // 迟到的回答被忽略
        app.handle_event(Event::Answer {
            ticket: 1,
            result: Ok("late".to_string()),
        })
        .unwrap();
        assert!(app.chat_panel_state().transcript().messages().is_empty());
    }

    #[tokio::test]
    async fn test_delete_document_key() {
        let (mut app, mut rx, _dir) = hydrated(two_files(), TranscriptScope::Global).await;

        app.handle_event(key(KeyCode::Down)).unwrap();
        app.handle_event(key(KeyCode::Char('d'))).unwrap();
        pump(&mut app, &mut rx).await;

        let names: Vec<&str> = app.shell().store().documents().iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["b.pdf"]);
        assert_eq!(app.notification().unwrap().text, "PDF deleted successfully");
    }

    #[tokio::test]
    async fn test_delete_session_failure_keeps_documents() {
        let (mut app, mut rx, _dir) = hydrated(two_files(), TranscriptScope::Global).await;

        app.handle_event(key(KeyCode::Char('D'))).unwrap();
        pump(&mut app, &mut rx).await;

        assert_eq!(app.shell().store().len(), 2);
        let notification = app.notification().unwrap();
        assert!(notification.is_error());
        assert_eq!(notification.text, "Failed to delete session");
    }

    #[tokio::test]
    async fn test_upload_from_picker_selects_document() {
        let (mut app, mut rx, dir) = hydrated(FakeApi::default(), TranscriptScope::Global).await;
        std::fs::write(dir.path().join("report.pdf"), b"%PDF-1.4").unwrap();

        app.handle_event(key(KeyCode::Char('u'))).unwrap();
        assert_eq!(app.current_tab(), AppTab::Upload);
        app.handle_event(key(KeyCode::Enter)).unwrap();

        // 先读文件，再上传
        pump(&mut app, &mut rx).await;
        pump(&mut app, &mut rx).await;

        let selected = app.shell().selected().unwrap();
        assert_eq!(selected.name, "report.pdf");
        assert_eq!(selected.session_id, "s9");
        assert_eq!(app.notification().unwrap().text, "PDF uploaded successfully");
        assert_eq!(app.pending(), 0);
    }

    #[tokio::test]
    async fn test_ask_without_selection_adds_system_message() {
        let api = Arc::new(two_files());
        let (mut app, mut rx, _dir) = setup_shared(api.clone(), TranscriptScope::Global);
        app.dispatch(ShellRequest::Hydrate);
        pump(&mut app, &mut rx).await;
        assert!(app.shell().selected().is_none());

        app.handle_event(key(KeyCode::Tab)).unwrap();
        assert_eq!(app.current_tab(), AppTab::Chat);
        for c in "hi".chars() {
            app.handle_event(key(KeyCode::Char(c))).unwrap();
        }
        app.handle_event(key(KeyCode::Enter)).unwrap();

        let messages = app.chat_panel_state().transcript().messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, MessageRole::System);
        assert_eq!(messages[0].text, MSG_UPLOAD_FIRST);
        assert!(!app.chat_panel_state().is_awaiting());
        assert!(app.ask_tokens.is_empty());

        let calls = api.calls.lock().unwrap();
        assert!(calls.iter().all(|call| !call.starts_with("ask")), "{calls:?}");
    }

    #[tokio::test]
    async fn test_same_name_in_two_sessions_selects_and_deletes_by_session() {
        let api = FakeApi {
            files: vec![record("a.pdf", "s1"), record("a.pdf", "s2")],
            ..Default::default()
        };
        let (mut app, mut rx, _dir) = hydrated(api, TranscriptScope::Global).await;
        assert_eq!(app.shell().store().len(), 2);

        // 行顺序：会话 s1、a.pdf(s1)、会话 s2、a.pdf(s2)
        for _ in 0..3 {
            app.handle_event(key(KeyCode::Down)).unwrap();
        }
        app.handle_event(key(KeyCode::Enter)).unwrap();
        assert_eq!(app.shell().selected().unwrap().session_id, "s2");

        app.handle_event(key(KeyCode::Esc)).unwrap();
        app.handle_event(key(KeyCode::Char('d'))).unwrap();
        pump(&mut app, &mut rx).await;

        let remaining: Vec<&str> = app
            .shell()
            .store()
            .documents()
            .iter()
            .map(|d| d.session_id.as_str())
            .collect();
        assert_eq!(remaining, vec!["s1"]);
        assert!(app.shell().selected().is_none());
    }

    #[tokio::test]
    async fn test_unreadable_file_shows_error() {
        let (mut app, mut rx, dir) = setup(FakeApi::default(), TranscriptScope::Global);

        app.load_file(dir.path().join("missing.pdf"));
        pump(&mut app, &mut rx).await;

        let notification = app.notification().unwrap();
        assert!(notification.is_error());
        assert!(notification.text.starts_with("Failed to read file:"));
        assert_eq!(app.pending(), 0);
    }

    #[tokio::test]
    async fn test_quit_keys() {
        let (mut app, _rx, _dir) = setup(FakeApi::default(), TranscriptScope::Global);

        app.handle_event(key(KeyCode::Tab)).unwrap();
        app.handle_event(key(KeyCode::Char('q'))).unwrap();
        assert!(app.is_running());
        assert_eq!(app.chat_panel_state().input(), "q");

        app.handle_event(Event::Input(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)))
            .unwrap();
        assert!(!app.is_running());
    }

    #[tokio::test]
    async fn test_notification_expires_on_tick() {
        let (mut app, _rx, _dir) = setup(FakeApi::default(), TranscriptScope::Global);

        let mut stale = Notification::success("done");
        stale.created_at = Instant::now() - Duration::from_secs(5);
        app.notify(stale);
        app.handle_event(Event::Tick).unwrap();
        assert!(app.notification().is_none());

        app.notify(Notification::error("oops"));
        app.handle_event(Event::Tick).unwrap();
        assert!(app.notification().is_some());
    }
}

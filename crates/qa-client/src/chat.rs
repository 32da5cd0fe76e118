//! 聊天记录模块
//!
//! 定义聊天消息和提问状态机 `Idle` ⇄ `AwaitingAnswer`。
//! 每次提交最多产生一条终结消息（回答或失败提示），不会重复也不会丢失。

use crate::document::{DocumentKey, DocumentRef};
use chrono::{DateTime, Local};

/// 未选中文档时插入的系统消息
pub const MSG_UPLOAD_FIRST: &str = "Please upload a PDF first to start asking questions about it.";

/// 提问失败时插入的消息
pub const MSG_ANSWER_ERROR: &str =
    "Sorry, I encountered an error while processing your question. Please try again.";

/// 消息角色
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRole {
    /// 用户输入
    User,
    /// 后端回答（含失败提示）
    Assistant,
    /// 客户端生成的系统提示
    System,
}

/// 聊天消息
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    /// 由创建时间（毫秒）生成的 ID
    pub id: String,
    pub text: String,
    pub role: MessageRole,
    pub timestamp: DateTime<Local>,
}

impl ChatMessage {
    fn new(id: String, text: String, role: MessageRole, timestamp: DateTime<Local>) -> Self {
        Self {
            id,
            text,
            role,
            timestamp,
        }
    }

    /// 用户消息
    pub fn user(text: impl Into<String>) -> Self {
        let now = Local::now();
        Self::new(now.timestamp_millis().to_string(), text.into(), MessageRole::User, now)
    }

    /// 回答消息，ID 比当前毫秒数大 1
    pub fn assistant(text: impl Into<String>) -> Self {
        let now = Local::now();
        Self::new(
            (now.timestamp_millis() + 1).to_string(),
            text.into(),
            MessageRole::Assistant,
            now,
        )
    }

    /// 系统消息
    pub fn system(text: impl Into<String>) -> Self {
        let now = Local::now();
        Self::new(
            format!("{}_system", now.timestamp_millis()),
            text.into(),
            MessageRole::System,
            now,
        )
    }

    /// 是否为用户发送
    pub fn is_user(&self) -> bool {
        self.role == MessageRole::User
    }

    /// `HH:MM` 格式的时间
    pub fn time_label(&self) -> String {
        self.timestamp.format("%H:%M").to_string()
    }
}

/// 聊天记录的作用范围
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TranscriptScope {
    /// 所有文档共用一份记录，切换文档不清空
    #[default]
    Global,
    /// 切换文档时清空记录并放弃未完成的提问
    PerDocument,
}

/// 提问状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatPhase {
    Idle,
    /// 等待编号为 `ticket` 的提问返回
    AwaitingAnswer { ticket: u64 },
}

/// 一次提交的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// 输入为空，什么都没发生
    Ignored,
    /// 已有提问在等待，拒绝提交
    Busy,
    /// 没有选中文档，已插入系统消息
    NoDocument,
    /// 已插入用户消息，调用方需要发起提问
    Ask {
        ticket: u64,
        filename: String,
        question: String,
    },
}

/// 聊天记录与提问状态机
#[derive(Debug, Clone)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
    phase: ChatPhase,
    next_ticket: u64,
    scope: TranscriptScope,
    /// 记录所属的文档（仅 `PerDocument` 下有意义）
    document: Option<DocumentKey>,
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new(TranscriptScope::default())
    }
}

impl Transcript {
    pub fn new(scope: TranscriptScope) -> Self {
        Self {
            messages: Vec::new(),
            phase: ChatPhase::Idle,
            next_ticket: 1,
            scope,
            document: None,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn phase(&self) -> ChatPhase {
        self.phase
    }

    pub fn scope(&self) -> TranscriptScope {
        self.scope
    }

    /// 是否正在等待回答
    pub fn is_awaiting(&self) -> bool {
        matches!(self.phase, ChatPhase::AwaitingAnswer { .. })
    }

    /// 提交一条输入
    pub fn submit<D: DocumentRef + ?Sized>(
        &mut self,
        input: &str,
        selected: Option<&D>,
    ) -> SubmitOutcome {
        if input.trim().is_empty() {
            return SubmitOutcome::Ignored;
        }
        if self.is_awaiting() {
            return SubmitOutcome::Busy;
        }

        let Some(document) = selected else {
            self.messages.push(ChatMessage::system(MSG_UPLOAD_FIRST));
            return SubmitOutcome::NoDocument;
        };

        self.messages.push(ChatMessage::user(input));

        let ticket = self.next_ticket;
        self.next_ticket += 1;
        self.phase = ChatPhase::AwaitingAnswer { ticket };

        SubmitOutcome::Ask {
            ticket,
            filename: document.name().to_string(),
            question: input.to_string(),
        }
    }

    /// 提问结束，插入回答或失败消息
    ///
    /// 只有当前等待中的 `ticket` 会被处理；过期的结果返回 false。
    pub fn resolve<E>(&mut self, ticket: u64, result: Result<String, E>) -> bool {
        if self.phase != (ChatPhase::AwaitingAnswer { ticket }) {
            tracing::debug!("忽略过期的回答: ticket {}", ticket);
            return false;
        }

        let message = match result {
            Ok(answer) => ChatMessage::assistant(answer),
            Err(_) => ChatMessage::assistant(MSG_ANSWER_ERROR),
        };
        self.messages.push(message);
        self.phase = ChatPhase::Idle;
        true
    }

    /// 选中文档变化
    ///
    /// `PerDocument` 下若文档确实变了，清空记录并回到 `Idle`，
    /// 返回被放弃的 ticket（调用方负责取消对应请求）。
    pub fn on_selection_changed(&mut self, document: Option<&DocumentKey>) -> Option<u64> {
        if self.scope == TranscriptScope::Global {
            return None;
        }
        if self.document.as_ref() == document {
            return None;
        }

        self.document = document.cloned();
        self.messages.clear();

        match std::mem::replace(&mut self.phase, ChatPhase::Idle) {
            ChatPhase::AwaitingAnswer { ticket } => Some(ticket),
            ChatPhase::Idle => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Doc(&'static str);

    impl DocumentRef for Doc {
        fn id(&self) -> &str {
            self.0
        }

        fn name(&self) -> &str {
            self.0
        }
    }

    #[test]
    fn test_blank_input_ignored() {
        let mut transcript = Transcript::default();
        assert_eq!(transcript.submit("   ", Some(&Doc("a.pdf"))), SubmitOutcome::Ignored);
        assert!(transcript.messages().is_empty());
        assert_eq!(transcript.phase(), ChatPhase::Idle);
    }

    #[test]
    fn test_no_document_appends_one_system_message() {
        let mut transcript = Transcript::default();
        let outcome = transcript.submit::<Doc>("hello", None);

        assert_eq!(outcome, SubmitOutcome::NoDocument);
        assert_eq!(transcript.messages().len(), 1);
        assert_eq!(transcript.messages()[0].role, MessageRole::System);
        assert_eq!(transcript.messages()[0].text, MSG_UPLOAD_FIRST);
        assert!(transcript.messages()[0].id.ends_with("_system"));
        assert_eq!(transcript.phase(), ChatPhase::Idle);
    }

    #[test]
    fn test_submit_then_answer() {
        let mut transcript = Transcript::default();
        let outcome = transcript.submit("what is this?", Some(&Doc("a.pdf")));

        let ticket = match outcome {
            SubmitOutcome::Ask {
                ticket,
                filename,
                question,
            } => {
                assert_eq!(filename, "a.pdf");
                assert_eq!(question, "what is this?");
                ticket
            }
            other => panic!("expected Ask, got {other:?}"),
        };

        assert_eq!(transcript.messages().len(), 1);
        assert!(transcript.messages()[0].is_user());
        assert!(transcript.is_awaiting());

        assert!(transcript.resolve::<()>(ticket, Ok("a report".to_string())));
        assert_eq!(transcript.messages().len(), 2);
        assert_eq!(transcript.messages()[1].text, "a report");
        assert!(!transcript.messages()[1].is_user());
        assert_eq!(transcript.phase(), ChatPhase::Idle);

        // 同一个 ticket 不会再产生消息
        assert!(!transcript.resolve::<()>(ticket, Ok("again".to_string())));
        assert_eq!(transcript.messages().len(), 2);
    }

    #[test]
    fn test_failure_appends_error_message() {
        let mut transcript = Transcript::default();
        let SubmitOutcome::Ask { ticket, .. } = transcript.submit("q", Some(&Doc("a.pdf"))) else {
            panic!("expected Ask");
        };

        assert!(transcript.resolve(ticket, Err("boom")));
        assert_eq!(transcript.messages().len(), 2);
        assert_eq!(transcript.messages()[1].text, MSG_ANSWER_ERROR);
    }

    #[test]
    fn test_busy_while_awaiting() {
        let mut transcript = Transcript::default();
        transcript.submit("first", Some(&Doc("a.pdf")));
        assert_eq!(transcript.submit("second", Some(&Doc("a.pdf"))), SubmitOutcome::Busy);
        assert_eq!(transcript.messages().len(), 1);
    }

    #[test]
    fn test_global_scope_keeps_messages_on_switch() {
        let mut transcript = Transcript::new(TranscriptScope::Global);
        let SubmitOutcome::Ask { ticket, .. } = transcript.submit("q", Some(&Doc("a.pdf"))) else {
            panic!("expected Ask");
        };

        assert_eq!(transcript.on_selection_changed(Some(&key("b.pdf", "s1"))), None);
        assert!(transcript.is_awaiting());
        assert!(transcript.resolve::<()>(ticket, Ok("answer".to_string())));
        assert_eq!(transcript.messages().len(), 2);
    }

    #[test]
    fn test_per_document_scope_resets_on_switch() {
        let mut transcript = Transcript::new(TranscriptScope::PerDocument);
        transcript.on_selection_changed(Some(&key("a.pdf", "s1")));
        let SubmitOutcome::Ask { ticket, .. } = transcript.submit("q", Some(&Doc("a.pdf"))) else {
            panic!("expected Ask");
        };

        // 同一文档不重置
        assert_eq!(transcript.on_selection_changed(Some(&key("a.pdf", "s1"))), None);
        assert_eq!(transcript.messages().len(), 1);

        // 同名文件的另一个会话也算切换
        assert_eq!(
            transcript.on_selection_changed(Some(&key("a.pdf", "s2"))),
            Some(ticket)
        );
        assert!(transcript.messages().is_empty());
        assert_eq!(transcript.phase(), ChatPhase::Idle);

        // 被放弃的回答不会写入新文档的记录
        assert!(!transcript.resolve::<()>(ticket, Ok("late".to_string())));
        assert!(transcript.messages().is_empty());
    }

    fn key(name: &str, session: &str) -> DocumentKey {
        DocumentKey::new(name, session)
    }

    #[test]
    fn test_time_label_format() {
        let msg = ChatMessage::user("hi");
        let label = msg.time_label();
        assert_eq!(label.len(), 5);
        assert_eq!(&label[2..3], ":");
    }
}

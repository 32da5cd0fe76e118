//! 聊天面板组件
//!
//! 显示当前的问答记录和输入框，并驱动提问状态机。

use qa_client::{
    ChatMessage, DocumentKey, DocumentRef, MessageRole, SubmitOutcome, Transcript, TranscriptScope,
};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

/// 聊天面板状态
#[derive(Debug, Clone, Default)]
pub struct ChatPanelState {
    /// 问答记录和提问状态
    transcript: Transcript,
    /// 输入框内容
    input_buffer: String,
    /// 输入框光标位置（字符索引）
    cursor_position: usize,
    /// 消息列表滚动偏移
    scroll_offset: usize,
}

impl ChatPanelState {
    /// 创建新的聊天面板状态
    pub fn new(scope: TranscriptScope) -> Self {
        Self {
            transcript: Transcript::new(scope),
            ..Default::default()
        }
    }

    /// 问答记录
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// 是否正在等待回答
    pub fn is_awaiting(&self) -> bool {
        self.transcript.is_awaiting()
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.input_buffer
            .char_indices()
            .nth(char_index)
            .map(|(i, _)| i)
            .unwrap_or(self.input_buffer.len())
    }

    fn char_count(&self) -> usize {
        self.input_buffer.chars().count()
    }

    /// 处理输入字符；等待回答时输入框禁用
    pub fn handle_input_char(&mut self, c: char) {
        if self.is_awaiting() {
            return;
        }
        let index = self.byte_index(self.cursor_position);
        self.input_buffer.insert(index, c);
        self.cursor_position += 1;
    }

    /// 处理退格键
    pub fn handle_backspace(&mut self) {
        if self.cursor_position > 0 {
            let index = self.byte_index(self.cursor_position - 1);
            self.input_buffer.remove(index);
            self.cursor_position -= 1;
        }
    }

    /// 处理删除键
    pub fn handle_delete(&mut self) {
        if self.cursor_position < self.char_count() {
            let index = self.byte_index(self.cursor_position);
            self.input_buffer.remove(index);
        }
    }

    /// 处理左移光标
    pub fn move_cursor_left(&mut self) {
        if self.cursor_position > 0 {
            self.cursor_position -= 1;
        }
    }

    /// 处理右移光标
    pub fn move_cursor_right(&mut self) {
        if self.cursor_position < self.char_count() {
            self.cursor_position += 1;
        }
    }

    /// 移动光标到行首
    pub fn move_cursor_home(&mut self) {
        self.cursor_position = 0;
    }

    /// 移动光标到行尾
    pub fn move_cursor_end(&mut self) {
        self.cursor_position = self.char_count();
    }

    /// 向上滚动消息列表
    pub fn scroll_up(&mut self) {
        if self.scroll_offset > 0 {
            self.scroll_offset -= 1;
        }
    }

    /// 向下滚动消息列表
    pub fn scroll_down(&mut self) {
        if self.scroll_offset + 1 < self.transcript.messages().len() {
            self.scroll_offset += 1;
        }
    }

    /// 获取输入框内容（不清空）
    pub fn input(&self) -> &str {
        &self.input_buffer
    }

    fn clear_input(&mut self) {
        self.input_buffer.clear();
        self.cursor_position = 0;
    }

    /// 提交当前输入
    ///
    /// 只有真正发起提问时才清空输入框。
    pub fn submit<D: DocumentRef + ?Sized>(&mut self, selected: Option<&D>) -> SubmitOutcome {
        let input = self.input_buffer.clone();
        let outcome = self.transcript.submit(&input, selected);
        if matches!(outcome, SubmitOutcome::Ask { .. }) {
            self.clear_input();
        }
        self.follow_latest();
        outcome
    }

    /// 提问结束
    pub fn resolve<E>(&mut self, ticket: u64, result: Result<String, E>) -> bool {
        let applied = self.transcript.resolve(ticket, result);
        if applied {
            self.follow_latest();
        }
        applied
    }

    /// 选中文档变化，返回被放弃的提问
    pub fn on_selection_changed(&mut self, document: Option<&DocumentKey>) -> Option<u64> {
        let abandoned = self.transcript.on_selection_changed(document);
        self.scroll_offset = self.scroll_offset.min(self.transcript.messages().len());
        abandoned
    }

    /// 滚动到最新消息附近
    fn follow_latest(&mut self) {
        self.scroll_offset = self.transcript.messages().len().saturating_sub(MESSAGES_PER_PAGE);
    }
}

/// 滚动跟随时保留的消息条数
const MESSAGES_PER_PAGE: usize = 8;

/// 聊天面板组件
pub struct ChatPanel<'a> {
    /// 聊天面板状态
    pub state: &'a ChatPanelState,
    /// 当前选中的文档
    pub document: Option<&'a dyn DocumentRef>,
    /// 标题
    pub title: String,
    /// 边框样式
    pub border_style: Style,
    /// 是否有焦点
    pub focused: bool,
}

impl<'a> ChatPanel<'a> {
    /// 创建新的聊天面板
    pub fn new(state: &'a ChatPanelState) -> Self {
        Self {
            state,
            document: None,
            title: "Chat".to_string(),
            border_style: Style::default().fg(Color::Gray),
            focused: false,
        }
    }

    /// 设置当前文档
    pub fn document(mut self, document: Option<&'a dyn DocumentRef>) -> Self {
        self.document = document;
        self
    }

    /// 设置标题
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// 设置边框样式
    pub fn border_style(mut self, style: Style) -> Self {
        self.border_style = style;
        self
    }

    /// 设置是否有焦点
    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    /// 渲染欢迎信息
    fn render_welcome(&self, area: Rect, buf: &mut Buffer) {
        let hint = match self.document {
            Some(doc) => format!("Start asking questions about \"{}\"", doc.name()),
            None => "Upload a PDF document to get started with intelligent Q&A".to_string(),
        };

        let text = vec![
            Line::from(""),
            Line::from(vec![
                Span::styled("💬 ", Style::default().fg(Color::Yellow)),
                Span::styled(
                    "Welcome to PDFChat!",
                    Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
                ),
            ]),
            Line::from(""),
            Line::from(Span::styled(hint, Style::default().fg(Color::DarkGray))),
        ];

        Paragraph::new(text)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .render(area, buf);
    }

    /// 渲染消息列表
    fn render_message_list(&self, area: Rect, buf: &mut Buffer) {
        let messages = self.state.transcript.messages();
        if messages.is_empty() && !self.state.is_awaiting() {
            self.render_welcome(area, buf);
            return;
        }

        let mut lines: Vec<Line> = Vec::new();
        for msg in messages.iter().skip(self.state.scroll_offset) {
            lines.extend(message_lines(msg));
            lines.push(Line::from(""));
        }
        if self.state.is_awaiting() {
            lines.push(Line::from(Span::styled(
                "● ● ●",
                Style::default().fg(Color::DarkGray),
            )));
        }

        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .render(area, buf);
    }

    /// 渲染输入框
    fn render_input_box(&self, area: Rect, buf: &mut Buffer) {
        let input_text = self.state.input();
        let disabled = self.document.is_none() || self.state.is_awaiting();

        let input_line = if input_text.is_empty() {
            let placeholder = match self.document {
                Some(doc) => format!("Ask a question about {}...", doc.name()),
                None => "Upload a PDF to start asking questions...".to_string(),
            };
            Line::from(vec![
                Span::styled("> ", Style::default().fg(Color::White)),
                Span::styled(placeholder, Style::default().fg(Color::DarkGray)),
            ])
        } else {
            let style = if disabled {
                Style::default().fg(Color::DarkGray)
            } else {
                Style::default().fg(Color::White)
            };
            Line::from(Span::styled(format!("> {}", input_text), style))
        };

        let mut text = vec![input_line];
        if let Some(doc) = self.document {
            text.push(Line::from(vec![
                Span::styled("Currently analyzing: ", Style::default().fg(Color::Gray)),
                Span::styled(
                    doc.name().to_string(),
                    Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD),
                ),
            ]));
        }

        Paragraph::new(text)
            .block(Block::default().borders(Borders::TOP))
            .alignment(Alignment::Left)
            .render(area, buf);
    }
}

/// 单条消息的显示行：用户消息右对齐，其余左对齐
fn message_lines(msg: &ChatMessage) -> Vec<Line<'static>> {
    let (prefix, style, alignment) = match msg.role {
        MessageRole::User => ("You", Style::default().fg(Color::Cyan), Alignment::Right),
        MessageRole::Assistant => ("PDF", Style::default().fg(Color::Green), Alignment::Left),
        MessageRole::System => ("System", Style::default().fg(Color::Yellow), Alignment::Left),
    };

    let mut lines: Vec<Line<'static>> = msg
        .text
        .lines()
        .map(|line| Line::from(Span::styled(line.to_string(), style)).alignment(alignment))
        .collect();
    lines.push(
        Line::from(Span::styled(
            format!("{} · {}", prefix, msg.time_label()),
            Style::default().fg(Color::DarkGray),
        ))
        .alignment(alignment),
    );
    lines
}

impl<'a> Widget for ChatPanel<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(self.title.clone())
            .borders(Borders::ALL)
            .border_style(if self.focused {
                Style::default().fg(Color::Green)
            } else {
                self.border_style
            });
        let inner_area = block.inner(area);
        block.render(area, buf);

        // 消息列表 + 输入框（3 行：分隔线、输入、当前文档）
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(3)])
            .split(inner_area);

        self.render_message_list(chunks[0], buf);
        self.render_input_box(chunks[1], buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qa_client::ChatPhase;

    struct Doc;

    impl DocumentRef for Doc {
        fn id(&self) -> &str {
            "a.pdf"
        }

        fn name(&self) -> &str {
            "a.pdf"
        }
    }

    fn type_text(state: &mut ChatPanelState, text: &str) {
        for c in text.chars() {
            state.handle_input_char(c);
        }
    }

    #[test]
    fn test_chat_panel_state_creation() {
        let state = ChatPanelState::new(TranscriptScope::Global);
        assert!(!state.is_awaiting());
        assert!(state.input().is_empty());
        assert_eq!(state.cursor_position, 0);
    }

    #[test]
    fn test_handle_input_char() {
        let mut state = ChatPanelState::default();
        type_text(&mut state, "Hi");
        assert_eq!(state.input(), "Hi");
        assert_eq!(state.cursor_position, 2);
    }

    #[test]
    fn test_multibyte_editing() {
        let mut state = ChatPanelState::default();
        type_text(&mut state, "你好吗");
        state.move_cursor_left();
        state.handle_backspace();
        assert_eq!(state.input(), "你吗");
        state.move_cursor_home();
        state.handle_delete();
        assert_eq!(state.input(), "吗");
    }

    #[test]
    fn test_cursor_movement() {
        let mut state = ChatPanelState::default();
        type_text(&mut state, "ABC");
        assert_eq!(state.cursor_position, 3);

        state.move_cursor_home();
        assert_eq!(state.cursor_position, 0);

        state.move_cursor_end();
        assert_eq!(state.cursor_position, 3);

        state.move_cursor_left();
        assert_eq!(state.cursor_position, 2);

        state.move_cursor_right();
        state.move_cursor_right();
        assert_eq!(state.cursor_position, 3);
    }

    #[test]
    fn test_submit_without_document_keeps_input() {
        let mut state = ChatPanelState::default();
        type_text(&mut state, "hello");

        let outcome = state.submit::<Doc>(None);
        assert_eq!(outcome, SubmitOutcome::NoDocument);
        assert_eq!(state.input(), "hello");
        assert_eq!(state.transcript().messages().len(), 1);
    }

    #[test]
    fn test_submit_clears_input_and_disables_typing() {
        let mut state = ChatPanelState::default();
        type_text(&mut state, "what?");

        let outcome = state.submit(Some(&Doc));
        let SubmitOutcome::Ask { ticket, .. } = outcome else {
            panic!("expected Ask");
        };
        assert!(state.input().is_empty());
        assert_eq!(state.cursor_position, 0);

        state.handle_input_char('x');
        assert!(state.input().is_empty());

        assert!(state.resolve::<()>(ticket, Ok("yes".to_string())));
        assert_eq!(state.transcript().phase(), ChatPhase::Idle);
        assert_eq!(state.transcript().messages().len(), 2);
    }

    #[test]
    fn test_scroll_operations() {
        let mut state = ChatPanelState::default();
        state.scroll_up();
        assert_eq!(state.scroll_offset, 0);
        // 没有消息时不能向下滚动
        state.scroll_down();
        assert_eq!(state.scroll_offset, 0);

        for _ in 0..3 {
            type_text(&mut state, "q");
            state.submit::<Doc>(None);
        }
        state.move_cursor_home();
        state.scroll_down();
        assert_eq!(state.scroll_offset, 1);
    }

    #[test]
    fn test_render_welcome_and_placeholder() {
        let state = ChatPanelState::default();
        let area = Rect::new(0, 0, 80, 12);
        let mut buf = Buffer::empty(area);

        ChatPanel::new(&state).document(Some(&Doc)).render(area, &mut buf);

        let text: String = buf.content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("Welcome to PDFChat!"));
        assert!(text.contains("Ask a question about a.pdf..."));
        assert!(text.contains("Currently analyzing: a.pdf"));
    }
}

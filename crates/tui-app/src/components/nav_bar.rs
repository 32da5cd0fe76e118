//! 导航栏组件
//!
//! 按会话分组显示已上传的文档，支持选中、删除文档和删除整个会话。

use qa_client::document::short_session_id;
use qa_client::{Document, DocumentKey, DocumentStore};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, StatefulWidget, Widget},
};

/// 导航栏中的一行
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavRow<'a> {
    /// 会话标题行
    Session { session_id: &'a str, count: usize },
    /// 文档行
    Document(&'a Document),
}

impl<'a> NavRow<'a> {
    /// 该行所属的会话
    pub fn session_id(&self) -> &'a str {
        match *self {
            NavRow::Session { session_id, .. } => session_id,
            NavRow::Document(doc) => &doc.session_id,
        }
    }
}

/// 把文档集合展开成行：每个会话一行标题，后跟其文档
pub fn nav_rows(store: &DocumentStore) -> Vec<NavRow<'_>> {
    let mut rows = Vec::new();
    for (session_id, docs) in store.sessions() {
        rows.push(NavRow::Session {
            session_id,
            count: docs.len(),
        });
        rows.extend(docs.into_iter().map(NavRow::Document));
    }
    rows
}

/// 导航栏状态（仅界面本地，不持久化）
#[derive(Debug, Clone)]
pub struct NavBarState {
    /// 会话浏览器是否展开
    pub expanded: bool,
    /// 光标位置（行索引）
    pub cursor: usize,
}

impl Default for NavBarState {
    fn default() -> Self {
        Self {
            expanded: true,
            cursor: 0,
        }
    }
}

impl NavBarState {
    pub fn new() -> Self {
        Self::default()
    }

    /// 展开/收起会话浏览器
    pub fn toggle_expanded(&mut self) {
        self.expanded = !self.expanded;
    }

    /// 光标上移
    pub fn move_up(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
        }
    }

    /// 光标下移
    pub fn move_down(&mut self, row_count: usize) {
        if row_count > 0 && self.cursor < row_count - 1 {
            self.cursor += 1;
        }
    }

    /// 行数变化后修正光标
    pub fn clamp(&mut self, row_count: usize) {
        if row_count == 0 {
            self.cursor = 0;
        } else if self.cursor >= row_count {
            self.cursor = row_count - 1;
        }
    }

    /// 光标所在行
    pub fn current<'a>(&self, store: &'a DocumentStore) -> Option<NavRow<'a>> {
        if !self.expanded {
            return None;
        }
        nav_rows(store).get(self.cursor).copied()
    }

    /// 把光标移到指定文档
    pub fn focus_document(&mut self, store: &DocumentStore, key: &DocumentKey) {
        if let Some(pos) = nav_rows(store)
            .iter()
            .position(|row| matches!(row, NavRow::Document(doc) if key.matches(doc)))
        {
            self.cursor = pos;
        }
    }
}

/// 导航栏组件
pub struct NavBar<'a> {
    /// 文档状态
    pub store: &'a DocumentStore,
    /// 界面状态
    pub state: &'a NavBarState,
    /// 标题
    pub title: String,
    /// 边框样式
    pub border_style: Style,
}

impl<'a> NavBar<'a> {
    /// 创建新的导航栏
    pub fn new(store: &'a DocumentStore, state: &'a NavBarState) -> Self {
        Self {
            store,
            state,
            title: "Sessions".to_string(),
            border_style: Style::default().fg(Color::Blue),
        }
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

    fn block(&self) -> Block<'static> {
        Block::default()
            .title(self.title.clone())
            .borders(Borders::ALL)
            .border_style(self.border_style)
    }

    fn render_placeholder(&self, lines: Vec<Line<'static>>, area: Rect, buf: &mut Buffer) {
        Paragraph::new(lines)
            .block(self.block())
            .style(Style::default().fg(Color::Gray))
            .render(area, buf);
    }
}

impl<'a> Widget for NavBar<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if self.store.is_empty() {
            self.render_placeholder(
                vec![
                    Line::from("No PDFs yet"),
                    Line::from(""),
                    Line::from("Press [u] to upload a PDF"),
                ],
                area,
                buf,
            );
            return;
        }

        if !self.state.expanded {
            let sessions = self.store.sessions().len();
            self.render_placeholder(
                vec![
                    Line::from(format!("📁 {} session(s), {} PDF(s)", sessions, self.store.len())),
                    Line::from(""),
                    Line::from("Press [s] to browse sessions"),
                ],
                area,
                buf,
            );
            return;
        }

        let selected_key = self.store.selected_key();
        let items: Vec<ListItem> = nav_rows(self.store)
            .into_iter()
            .map(|row| match row {
                NavRow::Session { session_id, count } => ListItem::new(Line::from(vec![
                    Span::styled(
                        format!("Session {}...", short_session_id(session_id)),
                        Style::default()
                            .fg(Color::DarkGray)
                            .add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(format!(" ({count})"), Style::default().fg(Color::DarkGray)),
                ])),
                NavRow::Document(doc) => {
                    let is_selected = selected_key.is_some_and(|key| key.matches(doc));
                    let marker = if is_selected { "●" } else { " " };
                    let style = if is_selected {
                        Style::default().fg(Color::Cyan)
                    } else {
                        Style::default().fg(Color::White)
                    };
                    ListItem::new(Span::styled(format!("  {} {}", marker, doc.name), style))
                }
            })
            .collect();

        let list = List::new(items)
            .block(self.block())
            .highlight_style(
                Style::default()
                    .bg(Color::DarkGray)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("> ");

        let mut list_state = ListState::default().with_selected(Some(self.state.cursor));
        StatefulWidget::render(list, area, buf, &mut list_state);
    }
}

//! 文件选择组件
//!
//! 浏览本地目录并选择要上传的 PDF 文件。

use std::path::{Path, PathBuf};

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, StatefulWidget, Widget, Wrap},
};

/// 目录条目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickerEntry {
    /// 显示名称
    pub name: String,
    /// 完整路径
    pub path: PathBuf,
    /// 是否为目录
    pub is_dir: bool,
}

/// 确认操作的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickerAction {
    /// 无操作
    None,
    /// 进入了子目录
    Descended,
    /// 选中了文件
    Selected(PathBuf),
}

/// 文件选择状态
#[derive(Debug, Clone)]
pub struct FilePickerState {
    current_dir: PathBuf,
    entries: Vec<PickerEntry>,
    cursor: usize,
    error: Option<String>,
}

fn is_pdf_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

impl FilePickerState {
    /// 打开目录
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        let mut state = Self {
            current_dir: dir.into(),
            entries: Vec::new(),
            cursor: 0,
            error: None,
        };
        state.refresh();
        state
    }

    /// 当前目录
    pub fn current_dir(&self) -> &Path {
        &self.current_dir
    }

    /// 当前目录的条目：目录在前，PDF 文件在后，各自按名称排序
    pub fn entries(&self) -> &[PickerEntry] {
        &self.entries
    }

    /// 光标位置
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// 读取目录失败时的错误
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// 重新读取当前目录
    pub fn refresh(&mut self) {
        self.entries.clear();
        self.error = None;

        let read_dir = match std::fs::read_dir(&self.current_dir) {
            Ok(read_dir) => read_dir,
            Err(e) => {
                tracing::warn!("读取目录失败 {}: {}", self.current_dir.display(), e);
                self.error = Some(e.to_string());
                self.cursor = 0;
                return;
            }
        };

        let mut dirs = Vec::new();
        let mut files = Vec::new();
        for entry in read_dir.flatten() {
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }
            if path.is_dir() {
                dirs.push(PickerEntry { name, path, is_dir: true });
            } else if is_pdf_path(&path) {
                files.push(PickerEntry { name, path, is_dir: false });
            }
        }
        dirs.sort_by(|a, b| a.name.cmp(&b.name));
        files.sort_by(|a, b| a.name.cmp(&b.name));
        self.entries = dirs;
        self.entries.extend(files);
        self.cursor = self.cursor.min(self.entries.len().saturating_sub(1));
    }

    /// 上移光标
    pub fn move_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    /// 下移光标
    pub fn move_down(&mut self) {
        if self.cursor + 1 < self.entries.len() {
            self.cursor += 1;
        }
    }

    /// 确认当前条目：目录则进入，文件则选中
    pub fn enter(&mut self) -> PickerAction {
        let Some(entry) = self.entries.get(self.cursor).cloned() else {
            return PickerAction::None;
        };
        if entry.is_dir {
            self.current_dir = entry.path;
            self.cursor = 0;
            self.refresh();
            PickerAction::Descended
        } else {
            PickerAction::Selected(entry.path)
        }
    }

    /// 返回上级目录
    pub fn parent(&mut self) -> bool {
        let Some(parent) = self.current_dir.parent().map(Path::to_path_buf) else {
            return false;
        };
        let previous = std::mem::replace(&mut self.current_dir, parent);
        self.cursor = 0;
        self.refresh();
        if let Some(index) = self.entries.iter().position(|e| e.path == previous) {
            self.cursor = index;
        }
        true
    }
}

/// 文件选择组件
pub struct FilePickerComponent<'a> {
    /// 文件选择状态
    pub state: &'a FilePickerState,
    /// 标题
    pub title: String,
    /// 边框样式
    pub border_style: Style,
}

impl<'a> FilePickerComponent<'a> {
    /// 创建新的文件选择组件
    pub fn new(state: &'a FilePickerState) -> Self {
        Self {
            state,
            title: "Upload PDF".to_string(),
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
}

impl<'a> Widget for FilePickerComponent<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(self.title.clone())
            .borders(Borders::ALL)
            .border_style(self.border_style);
        let inner = block.inner(area);
        block.render(area, buf);

        let [header_area, list_area] = ratatui::layout::Layout::vertical([
            ratatui::layout::Constraint::Length(1),
            ratatui::layout::Constraint::Min(0),
        ])
        .areas(inner);

        Paragraph::new(Line::from(Span::styled(
            self.state.current_dir.display().to_string(),
            Style::default().fg(Color::Gray),
        )))
        .render(header_area, buf);

        if let Some(error) = &self.state.error {
            Paragraph::new(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )))
            .wrap(Wrap { trim: true })
            .render(list_area, buf);
            return;
        }

        if self.state.entries.is_empty() {
            Paragraph::new(Line::from(Span::styled(
                "No PDF files here",
                Style::default().fg(Color::DarkGray),
            )))
            .render(list_area, buf);
            return;
        }

        let items: Vec<ListItem> = self
            .state
            .entries
            .iter()
            .map(|entry| {
                let (icon, color) = if entry.is_dir {
                    ("📁 ", Color::Yellow)
                } else {
                    ("📄 ", Color::White)
                };
                ListItem::new(Line::from(vec![
                    Span::raw(icon),
                    Span::styled(entry.name.clone(), Style::default().fg(color)),
                ]))
            })
            .collect();

        let list = List::new(items)
            .highlight_style(Style::default().bg(Color::Blue).add_modifier(Modifier::BOLD))
            .highlight_symbol("> ");
        let mut list_state = ListState::default().with_selected(Some(self.state.cursor));
        StatefulWidget::render(list, list_area, buf, &mut list_state);
    }
}

//! UI 渲染模块
//!
//! 负责整个应用的 UI 渲染。

use crate::components::{AppTab, ChatPanel, FilePickerComponent, NavBar, PanelTabs};
use crate::TuiApp;
use qa_client::{DocumentRef, NotificationLevel};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// 绘制 UI
pub fn draw_ui(f: &mut Frame, app: &TuiApp) {
    // 获取整个区域
    let size = f.area();

    // 主布局：垂直分割（header, body, footer）
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Body (flexible)
            Constraint::Length(1), // Footer
        ])
        .split(size);

    // 绘制 Header
    draw_header(f, main_chunks[0], app);

    // Body 区域：水平分割为三栏（25% | 50% | 25%）
    let body_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(25), // 1 会话列表
            Constraint::Percentage(50), // 2 问答
            Constraint::Percentage(25), // 3 上传
        ])
        .split(main_chunks[1]);

    draw_panel_1_sessions(f, body_chunks[0], app);
    draw_panel_2_chat(f, body_chunks[1], app);
    draw_panel_3_upload(f, body_chunks[2], app);

    // 绘制 Footer
    draw_footer(f, main_chunks[2], app);
}

fn focus_style(has_focus: bool) -> Style {
    if has_focus {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::DarkGray)
    }
}

fn panel_title(tab: AppTab, has_focus: bool) -> String {
    if has_focus {
        format!("{} *", tab.title())
    } else {
        tab.title().to_string()
    }
}

/// 绘制 Header：标题、后端地址、进行中的操作和提示
fn draw_header(f: &mut Frame, area: Rect, app: &TuiApp) {
    let mut spans = vec![
        Span::styled(
            "ChatPDF",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw(" | "),
        Span::styled(
            format!("Server: {}", app.server_url()),
            Style::default().fg(Color::Green),
        ),
    ];

    if app.pending() > 0 {
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(
            format!("Working ({})...", app.pending()),
            Style::default().fg(Color::Yellow),
        ));
    }

    if let Some(notification) = app.notification() {
        let (icon, color) = match notification.level {
            NotificationLevel::Success => ("✓ ", Color::Green),
            NotificationLevel::Error => ("✗ ", Color::Red),
        };
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(
            format!("{}{}", icon, notification.text),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ));
    }

    let header = Paragraph::new(Line::from(spans))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Blue)),
        )
        .alignment(Alignment::Left);

    f.render_widget(header, area);
}

/// 绘制面板 1：会话列表（上下分栏）
fn draw_panel_1_sessions(f: &mut Frame, area: Rect, app: &TuiApp) {
    // 垂直分割：上部分会话列表，下部分选中文档信息
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(area);

    let has_focus = app.current_tab() == AppTab::Sessions;

    let nav_bar = NavBar::new(app.shell().store(), app.nav_state())
        .title(panel_title(AppTab::Sessions, has_focus))
        .border_style(focus_style(has_focus));
    f.render_widget(nav_bar, chunks[0]);

    draw_selected_document(f, chunks[1], app);
}

/// 绘制选中文档信息
fn draw_selected_document(f: &mut Frame, area: Rect, app: &TuiApp) {
    let block = Block::default()
        .title("Selected PDF")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let paragraph = match app.shell().selected() {
        Some(doc) => Paragraph::new(vec![
            Line::from(Span::styled(
                doc.name.clone(),
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            )),
            Line::from(format!("Session: {}...", doc.short_session_id())),
            Line::from(format!("Uploaded: {}", doc.upload_timestamp)),
        ])
        .style(Style::default().fg(Color::Gray)),
        None => Paragraph::new(vec![
            Line::from("No PDF selected"),
            Line::from(""),
            Line::from("Use ↑↓ and Enter to choose one"),
        ])
        .style(Style::default().fg(Color::Gray))
        .alignment(Alignment::Center),
    };

    f.render_widget(paragraph.block(block), area);
}

/// 绘制面板 2：问答
fn draw_panel_2_chat(f: &mut Frame, area: Rect, app: &TuiApp) {
    let has_focus = app.current_tab() == AppTab::Chat;
    let document = app.shell().selected().map(|doc| doc as &dyn DocumentRef);

    let chat_panel = ChatPanel::new(app.chat_panel_state())
        .document(document)
        .title(panel_title(AppTab::Chat, has_focus))
        .border_style(focus_style(has_focus))
        .focused(has_focus);

    f.render_widget(chat_panel, area);
}

/// 绘制面板 3：上传
fn draw_panel_3_upload(f: &mut Frame, area: Rect, app: &TuiApp) {
    let has_focus = app.current_tab() == AppTab::Upload;

    let file_picker = FilePickerComponent::new(app.file_picker_state())
        .title(panel_title(AppTab::Upload, has_focus))
        .border_style(focus_style(has_focus));

    f.render_widget(file_picker, area);
}

/// 绘制 Footer
fn draw_footer(f: &mut Frame, area: Rect, app: &TuiApp) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(40), Constraint::Min(0)])
        .split(area);

    f.render_widget(PanelTabs::new(app.current_tab()), chunks[0]);

    let help_keys = match app.current_tab() {
        AppTab::Sessions => "[↑↓] Move [Enter] Open [d] Delete PDF [D] Delete session [s] Collapse [u] Upload [r] Refresh [q] Quit",
        AppTab::Chat => "[Type] Ask [Enter] Send [↑↓] Scroll [Esc] Back",
        AppTab::Upload => "[↑↓] Move [Enter] Open/Upload [Backspace] Parent [Esc] Back",
    };
    let help_text = format!("[Tab] Switch | {}", help_keys);

    let footer = Paragraph::new(help_text)
        .style(Style::default().fg(Color::Gray))
        .alignment(Alignment::Left);

    f.render_widget(footer, chunks[1]);
}

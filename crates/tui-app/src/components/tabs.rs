//! 面板焦点切换

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::{Tabs, Widget},
};

/// 获得焦点的面板
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppTab {
    /// 会话与文档导航
    #[default]
    Sessions,
    /// 问答
    Chat,
    /// 上传文件选择
    Upload,
}

impl AppTab {
    pub fn title(&self) -> &'static str {
        match self {
            AppTab::Sessions => "[1] Sessions",
            AppTab::Chat => "[2] Chat",
            AppTab::Upload => "[3] Upload",
        }
    }

    pub fn all() -> &'static [AppTab] {
        &[AppTab::Sessions, AppTab::Chat, AppTab::Upload]
    }

    pub fn index(&self) -> usize {
        match self {
            AppTab::Sessions => 0,
            AppTab::Chat => 1,
            AppTab::Upload => 2,
        }
    }

    pub fn next(&self) -> Self {
        match self {
            AppTab::Sessions => AppTab::Chat,
            AppTab::Chat => AppTab::Upload,
            AppTab::Upload => AppTab::Sessions,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            AppTab::Sessions => AppTab::Upload,
            AppTab::Chat => AppTab::Sessions,
            AppTab::Upload => AppTab::Chat,
        }
    }
}

/// 面板指示条，高亮当前焦点
pub struct PanelTabs {
    pub current: AppTab,
}

impl PanelTabs {
    pub fn new(current: AppTab) -> Self {
        Self { current }
    }
}

impl Widget for PanelTabs {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let titles: Vec<&str> = AppTab::all().iter().map(|t| t.title()).collect();

        Tabs::new(titles)
            .style(Style::default().fg(Color::Gray))
            .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
            .select(self.current.index())
            .divider(" | ")
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tab_cycle() {
        let mut tab = AppTab::default();
        assert_eq!(tab, AppTab::Sessions);
        for _ in 0..AppTab::all().len() {
            tab = tab.next();
        }
        assert_eq!(tab, AppTab::Sessions);
        assert_eq!(tab.previous(), AppTab::Upload);
        assert_eq!(AppTab::Chat.index(), 1);
    }
}

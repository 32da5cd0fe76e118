//! UI 组件模块
//!
//! 包含各种可复用的 UI 组件。

pub mod chat_panel;
pub mod file_picker;
pub mod nav_bar;
pub mod tabs;

pub use chat_panel::{ChatPanel, ChatPanelState};
pub use file_picker::{FilePickerComponent, FilePickerState, PickerAction, PickerEntry};
pub use nav_bar::{nav_rows, NavBar, NavBarState, NavRow};
pub use tabs::{AppTab, PanelTabs};

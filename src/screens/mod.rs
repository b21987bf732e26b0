//! The three tabs. Each screen loads what it needs from the store when it is
//! activated, keeps a private snapshot while shown, writes the whole record
//! back on every change and drops the snapshot when the user navigates away.

pub mod create;
pub mod list;
pub mod settings;

pub use create::CreateScreen;
pub use list::ListScreen;
pub use settings::SettingsScreen;

use ratatui::layout::{Constraint, Direction, Layout, Rect};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenKind {
    List,
    Create,
    Settings,
}

impl ScreenKind {
    pub const ALL: [ScreenKind; 3] = [ScreenKind::List, ScreenKind::Create, ScreenKind::Settings];

    pub fn title(&self) -> &'static str {
        match self {
            ScreenKind::List => "Notes",
            ScreenKind::Create => "Create",
            ScreenKind::Settings => "Settings",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            ScreenKind::List => ScreenKind::Create,
            ScreenKind::Create => ScreenKind::Settings,
            ScreenKind::Settings => ScreenKind::List,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            ScreenKind::List => ScreenKind::Settings,
            ScreenKind::Create => ScreenKind::List,
            ScreenKind::Settings => ScreenKind::Create,
        }
    }
}

/// Splits a screen into a header of `header_height` rows and the body.
pub fn header_and_body(area: Rect, header_height: u16) -> (Rect, Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(header_height), Constraint::Min(1)])
        .split(area);
    (chunks[0], chunks[1])
}

pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tab_cycle() {
        for kind in ScreenKind::ALL {
            assert_eq!(kind.next().prev(), kind);
        }
        assert_eq!(ScreenKind::Settings.next(), ScreenKind::List);
    }

    #[test]
    fn test_centered_rect_is_inside() {
        let outer = Rect::new(0, 0, 100, 50);
        let inner = centered_rect(50, 20, outer);
        assert_eq!(outer.intersection(inner), inner);
        assert_eq!(inner.width, 50);
    }
}

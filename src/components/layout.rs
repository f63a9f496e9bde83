//! Layout calculations for the TOC panel

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Screen areas of the TOC panel, top to bottom
pub struct TocLayout {
    pub toolbar: Rect,
    /// Absent when there is nothing to filter
    pub filter: Option<Rect>,
    pub tree: Rect,
    pub status: Rect,
    pub help: Rect,
}

/// Calculate centered popup area
pub fn centered_popup(area: Rect, width: u16, height: u16) -> Rect {
    let popup_x = area.x + (area.width.saturating_sub(width)) / 2;
    let popup_y = area.y + (area.height.saturating_sub(height)) / 2;

    Rect::new(
        popup_x,
        popup_y,
        width.min(area.width),
        height.min(area.height),
    )
}

pub fn calculate_toc_layout(area: Rect, show_filter: bool) -> TocLayout {
    let mut constraints = vec![Constraint::Length(3)];
    if show_filter {
        constraints.push(Constraint::Length(3));
    }
    constraints.extend([Constraint::Min(0), Constraint::Length(1), Constraint::Length(1)]);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    if show_filter {
        TocLayout {
            toolbar: chunks[0],
            filter: Some(chunks[1]),
            tree: chunks[2],
            status: chunks[3],
            help: chunks[4],
        }
    } else {
        TocLayout {
            toolbar: chunks[0],
            filter: None,
            tree: chunks[1],
            status: chunks[2],
            help: chunks[3],
        }
    }
}

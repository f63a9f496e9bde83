//! TOC panel - the main screen
//!
//! Draws the toolbar, the filter control (only when the tree has something
//! to filter), the layer tree, a status bar and a help bar.

use crate::component::Component;
use crate::components::layout::calculate_toc_layout;
use crate::components::{FilterComponent, ToolbarComponent, TreeComponent};
use crate::model::{Focus, LayersState, SelectionState, SelectionStatus};
use anyhow::Result;
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

/// Context needed for rendering the TOC screen
pub struct TocRenderContext<'a> {
    pub layers: &'a LayersState,
    pub selection: &'a SelectionState,
    pub map_name: Option<&'a str>,
    pub error: Option<&'a str>,
    pub status_message: Option<&'a str>,
    pub focus: Focus,
}

/// Whether the filter control is drawn for this tree
pub fn shows_filter(layers: &LayersState) -> bool {
    layers.is_filterable()
}

pub fn draw_toc_screen(
    frame: &mut Frame,
    area: Rect,
    toolbar: &mut ToolbarComponent,
    filter: &mut FilterComponent,
    tree: &mut TreeComponent,
    ctx: &TocRenderContext,
) -> Result<()> {
    let layout = calculate_toc_layout(area, shows_filter(ctx.layers));

    toolbar.focused = ctx.focus == Focus::Toolbar;
    tree.set_focused(ctx.focus == Focus::Tree);

    toolbar.draw(frame, layout.toolbar)?;
    if let Some(filter_area) = layout.filter {
        filter.draw(frame, filter_area)?;
    }
    tree.draw(frame, layout.tree)?;

    render_status_bar(frame, layout.status, ctx, filter.error());
    render_help_bar(frame, layout.help, ctx.focus);

    Ok(())
}

fn render_status_bar(
    frame: &mut Frame,
    area: Rect,
    ctx: &TocRenderContext,
    filter_error: Option<&str>,
) {
    let mut spans = vec![];

    if let Some(name) = ctx.map_name {
        spans.push(Span::styled(
            format!(" {} ", name),
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::raw(" "));
    }

    let status_color = match ctx.selection.status {
        SelectionStatus::None => Color::DarkGray,
        SelectionStatus::Layer => Color::Green,
        SelectionStatus::Group => Color::Magenta,
    };
    spans.push(Span::styled(
        format!(" {} ", ctx.selection.status),
        Style::default()
            .fg(Color::Black)
            .bg(status_color)
            .add_modifier(Modifier::BOLD),
    ));
    let selected = ctx.selection.selected_layers.len() + ctx.selection.selected_groups.len();
    if selected > 0 {
        spans.push(Span::styled(
            format!(" {} selected", selected),
            Style::default().fg(Color::White),
        ));
    }

    if let Some(error) = ctx.error.or(filter_error) {
        spans.push(Span::styled(
            format!("  Error: {} ", error),
            Style::default().fg(Color::Red),
        ));
    } else if let Some(status) = ctx.status_message {
        spans.push(Span::styled(
            format!("  {} ", status),
            Style::default().fg(Color::Yellow),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn key_hint(key: &str, color: Color) -> Span<'static> {
    Span::styled(
        format!(" {} ", key),
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    )
}

fn render_help_bar(frame: &mut Frame, area: Rect, focus: Focus) {
    let help_spans = match focus {
        Focus::Filter => vec![
            key_hint("Enter", Color::Green),
            Span::raw("Done  "),
            key_hint("Esc", Color::Yellow),
            Span::raw("Stop editing  "),
            Span::styled("/text/ for regex", Style::default().fg(Color::DarkGray)),
        ],
        Focus::Toolbar => vec![
            key_hint("h/l", Color::Cyan),
            Span::raw("Move "),
            key_hint("Enter", Color::Green),
            Span::raw("Run tool "),
            key_hint("Tab", Color::Cyan),
            Span::raw("Back to tree "),
        ],
        Focus::Tree => vec![
            key_hint("q", Color::Yellow),
            Span::raw("Quit "),
            key_hint("Space", Color::Green),
            Span::raw("Select "),
            key_hint("v", Color::Cyan),
            Span::raw("Visibility "),
            key_hint("Tab", Color::Cyan),
            Span::raw("Tools "),
            key_hint("/", Color::Cyan),
            Span::raw("Filter "),
            key_hint("?", Color::White),
            Span::raw("Help"),
        ],
    };

    let paragraph = Paragraph::new(Line::from(help_spans)).alignment(Alignment::Left);
    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::filter::FilterMatcher;
    use crate::model::{builtin_items, compose, MapType, ToolbarEnv};
    use ratatui::{backend::TestBackend, Terminal};
    use serde_json::json;

    fn screen_text(layers: &LayersState) -> String {
        let selection = SelectionState::from_layers(layers);
        let mut toolbar = ToolbarComponent::new();
        toolbar.set_tools(compose(
            &builtin_items(),
            &[],
            &[],
            &selection,
            &ToolbarEnv::default(),
        ));
        let mut filter = FilterComponent::new();
        let mut tree = TreeComponent::new();
        tree.refresh(layers, MapType::Openlayers, &FilterMatcher::All);

        let ctx = TocRenderContext {
            layers,
            selection: &selection,
            map_name: Some("test map"),
            error: None,
            status_message: None,
            focus: Focus::Tree,
        };

        let mut terminal = Terminal::new(TestBackend::new(80, 20)).unwrap();
        terminal
            .draw(|frame| {
                let area = frame.area();
                draw_toc_screen(frame, area, &mut toolbar, &mut filter, &mut tree, &ctx).unwrap();
            })
            .unwrap();

        let buffer = terminal.backend().buffer();
        buffer
            .content
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_no_filter_without_layers() {
        let layers: LayersState = serde_json::from_value(json!({
            "groups": [{ "id": "default", "title": "Default", "nodes": [] }],
            "flat": []
        }))
        .unwrap();
        let text = screen_text(&layers);
        assert_eq!(text.matches("┌ Filter ").count(), 0);
        assert!(text.contains("Default"));
    }

    #[test]
    fn test_one_filter_with_layers() {
        let layers: LayersState = serde_json::from_value(json!({
            "groups": [{ "id": "default", "title": "Default", "nodes": ["topp:states__6"] }],
            "flat": [{ "id": "topp:states__6", "name": "topp:states", "type": "wms" }]
        }))
        .unwrap();
        let text = screen_text(&layers);
        assert_eq!(text.matches("┌ Filter ").count(), 1);
        assert!(text.contains("topp:states"));
    }

    #[test]
    fn test_toolbar_and_status_drawn() {
        let layers: LayersState = serde_json::from_value(json!({
            "groups": [{ "id": "Default", "title": "Default", "nodes": ["a"] }],
            "flat": [{ "id": "a", "title": "Rivers", "type": "wms" }],
            "selected": ["a"]
        }))
        .unwrap();
        let text = screen_text(&layers);
        assert!(text.contains("Toggle layers"));
        assert!(text.contains("Zoom to"));
        assert!(text.contains("LAYER"));
        assert!(text.contains("1 selected"));
    }
}

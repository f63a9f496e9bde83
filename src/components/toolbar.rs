//! Toolbar row drawn above the tree
//!
//! Shows the tools composed for the current frame. Buttons fall back to
//! bare symbols when their labels do not fit the row.

use crate::action::Action;
use crate::component::Component;
use crate::model::{ToolId, VisibleTool};
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use unicode_width::UnicodeWidthStr;

/// Terminal symbol for a button glyph name
pub fn glyph_symbol(glyph: &str) -> &'static str {
    match glyph {
        "eye-open" => "◉",
        "zoom-to" => "⌖",
        "trash" => "✖",
        "add-layer" => "✚",
        "add-folder" => "❏",
        "info-sign" => "ℹ",
        "features-grid" => "▦",
        "wrench" => "⚙",
        "filter-layer" => "⧩",
        "stats" => "▥",
        _ => "★",
    }
}

pub struct ToolbarComponent {
    tools: Vec<VisibleTool>,
    cursor: usize,
    pub focused: bool,
}

impl Default for ToolbarComponent {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolbarComponent {
    pub fn new() -> Self {
        Self {
            tools: Vec::new(),
            cursor: 0,
            focused: false,
        }
    }

    /// Replace the composed tools, keeping the cursor on the same tool
    /// when it is still present
    pub fn set_tools(&mut self, tools: Vec<VisibleTool>) {
        let current = self.selected_tool().map(|t| t.id.clone());
        self.tools = tools;
        self.cursor = current
            .and_then(|id| self.tools.iter().position(|t| t.id == id))
            .unwrap_or_else(|| self.cursor.min(self.tools.len().saturating_sub(1)));
    }

    pub fn tools(&self) -> &[VisibleTool] {
        &self.tools
    }

    pub fn button_count(&self) -> usize {
        self.tools.len()
    }

    pub fn selected_tool(&self) -> Option<&VisibleTool> {
        self.tools.get(self.cursor)
    }

    pub fn next(&mut self) {
        if !self.tools.is_empty() {
            self.cursor = (self.cursor + 1) % self.tools.len();
        }
    }

    pub fn previous(&mut self) {
        if !self.tools.is_empty() {
            self.cursor = self.cursor.checked_sub(1).unwrap_or(self.tools.len() - 1);
        }
    }

    fn button_text(tool: &VisibleTool, compact: bool) -> String {
        let symbol = glyph_symbol(&tool.button.glyph);
        if compact {
            format!(" {} ", symbol)
        } else {
            format!(" {} {} ", symbol, tool.button.label)
        }
    }

    /// Display width of the row with full labels
    pub fn full_width(&self) -> usize {
        self.tools
            .iter()
            .map(|t| Self::button_text(t, false).width() + 1)
            .sum()
    }

    pub fn render_line(&self, width: u16) -> Line<'static> {
        let compact = self.full_width() > width as usize;
        let mut spans = Vec::with_capacity(self.tools.len() * 2);
        for (i, tool) in self.tools.iter().enumerate() {
            let style = if self.focused && i == self.cursor {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Cyan)
            };
            spans.push(Span::styled(Self::button_text(tool, compact), style));
            spans.push(Span::raw(" "));
        }
        Line::from(spans)
    }
}

impl Component for ToolbarComponent {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if !self.focused {
            return Ok(None);
        }
        let action = match key.code {
            KeyCode::Char('l') | KeyCode::Right => Some(Action::NextTool),
            KeyCode::Char('h') | KeyCode::Left => Some(Action::PrevTool),
            KeyCode::Enter => Some(Action::ActivateTool),
            KeyCode::Esc | KeyCode::Tab => Some(Action::FocusTree),
            _ => None,
        };
        Ok(action)
    }

    fn update(&mut self, action: Action) -> Result<Option<Action>> {
        let follow_up = match action {
            Action::NextTool => {
                self.next();
                None
            }
            Action::PrevTool => {
                self.previous();
                None
            }
            Action::ActivateTool => self
                .selected_tool()
                .map(|t| Action::InvokeTool(t.id.clone())),
            _ => None,
        };
        Ok(follow_up)
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect) -> Result<()> {
        let border_color = if self.focused { Color::Cyan } else { Color::DarkGray };
        let line = self.render_line(area.width.saturating_sub(2));
        let paragraph = Paragraph::new(line).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Tools ")
                .border_style(Style::default().fg(border_color)),
        );
        frame.render_widget(paragraph, area);
        Ok(())
    }
}

/// Id of a tool as shown in status messages
pub fn tool_title(tools: &[VisibleTool], id: &ToolId) -> String {
    tools
        .iter()
        .find(|t| &t.id == id)
        .map(|t| t.button.label.clone())
        .unwrap_or_else(|| id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BuiltinTool, ToolButton};

    fn tool(id: ToolId, glyph: &str, label: &str) -> VisibleTool {
        VisibleTool {
            name: id.to_string(),
            button: ToolButton::new(&id.to_string(), glyph, label),
            id,
        }
    }

    fn sample() -> Vec<VisibleTool> {
        vec![
            tool(ToolId::Builtin(BuiltinTool::ToggleAll), "eye-open", "Toggle layers"),
            tool(ToolId::Builtin(BuiltinTool::ZoomTo), "zoom-to", "Zoom to"),
            tool(ToolId::External("Export".to_string()), "download", "Export"),
        ]
    }

    #[test]
    fn test_cursor_wraps() {
        let mut toolbar = ToolbarComponent::new();
        toolbar.set_tools(sample());
        toolbar.previous();
        assert_eq!(toolbar.selected_tool().unwrap().name, "External(Export)");
        toolbar.next();
        assert_eq!(toolbar.selected_tool().unwrap().name, "ToggleAll");
    }

    #[test]
    fn test_cursor_survives_recomposition() {
        let mut toolbar = ToolbarComponent::new();
        toolbar.set_tools(sample());
        toolbar.next();
        toolbar.next();

        let mut tools = sample();
        tools.remove(1);
        toolbar.set_tools(tools);
        assert_eq!(
            toolbar.selected_tool().unwrap().id,
            ToolId::External("Export".to_string())
        );

        toolbar.set_tools(vec![]);
        assert!(toolbar.selected_tool().is_none());
        assert_eq!(toolbar.button_count(), 0);
    }

    #[test]
    fn test_activate_invokes_selected() {
        let mut toolbar = ToolbarComponent::new();
        toolbar.set_tools(sample());
        toolbar.update(Action::NextTool).unwrap();
        assert_eq!(
            toolbar.update(Action::ActivateTool).unwrap(),
            Some(Action::InvokeTool(ToolId::Builtin(BuiltinTool::ZoomTo)))
        );
    }

    #[test]
    fn test_compact_when_narrow() {
        let mut toolbar = ToolbarComponent::new();
        toolbar.set_tools(sample());

        let wide = toolbar.render_line(200).to_string();
        assert!(wide.contains("Zoom to"));

        let narrow = toolbar.render_line(12).to_string();
        assert!(!narrow.contains("Zoom to"));
        assert!(narrow.contains('⌖'));
        assert!(narrow.contains('★'));
    }

    #[test]
    fn test_keys_ignored_without_focus() {
        let mut toolbar = ToolbarComponent::new();
        let key = KeyEvent::from(KeyCode::Enter);
        assert_eq!(toolbar.handle_key_event(key).unwrap(), None);
        toolbar.focused = true;
        assert_eq!(toolbar.handle_key_event(key).unwrap(), Some(Action::ActivateTool));
    }
}

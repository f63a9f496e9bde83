//! Yes/no confirmation dialog, used before quitting and removing nodes

use crate::action::Action;
use crate::component::Component;
use crate::components::centered_popup;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

pub struct ConfirmDialog {
    pub title: String,
    pub message: String,
    pub confirm_label: String,
}

impl ConfirmDialog {
    pub fn new(title: &str, message: &str, confirm_label: &str) -> Self {
        Self {
            title: title.to_string(),
            message: message.to_string(),
            confirm_label: confirm_label.to_string(),
        }
    }

    pub fn quit() -> Self {
        Self::new("Quit?", "Are you sure you want to quit?", "Yes, quit")
    }

    pub fn remove(title: &str) -> Self {
        Self::new("Remove?", &format!("Remove '{}' from the map?", title), "Yes, remove")
    }
}

impl Default for ConfirmDialog {
    fn default() -> Self {
        Self::quit()
    }
}

impl Component for ConfirmDialog {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let action = match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => Some(Action::ConfirmModal),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => Some(Action::CloseModal),
            _ => None,
        };
        Ok(action)
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect) -> Result<()> {
        let width = (self.message.width() as u16 + 6).clamp(40, 70);
        let popup_area = centered_popup(area, width, 7);

        frame.render_widget(Clear, popup_area);

        let content = vec![
            Line::from(""),
            Line::from(Span::styled(
                self.message.clone(),
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(vec![
                Span::styled(
                    " y ",
                    Style::default()
                        .fg(Color::Green)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::raw(format!("{}  ", self.confirm_label)),
                Span::styled(
                    " n/Esc ",
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                ),
                Span::raw("No, cancel"),
            ]),
        ];

        let paragraph = Paragraph::new(content)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Yellow))
                    .title(format!(" {} ", self.title))
                    .title_style(
                        Style::default()
                            .fg(Color::Yellow)
                            .add_modifier(Modifier::BOLD),
                    ),
            )
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });

        frame.render_widget(paragraph, popup_area);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confirm_keys() {
        let mut dialog = ConfirmDialog::remove("Roads");
        assert_eq!(dialog.message, "Remove 'Roads' from the map?");
        assert_eq!(
            dialog.handle_key_event(KeyEvent::from(KeyCode::Char('y'))).unwrap(),
            Some(Action::ConfirmModal)
        );
        assert_eq!(
            dialog.handle_key_event(KeyEvent::from(KeyCode::Esc)).unwrap(),
            Some(Action::CloseModal)
        );
        assert_eq!(dialog.handle_key_event(KeyEvent::from(KeyCode::Char('x'))).unwrap(), None);
    }
}

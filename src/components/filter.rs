//! Filter control for the layer tree
//!
//! Plain text narrows layers by a case-insensitive title substring. Text
//! written as `/pattern/` is compiled as a case-insensitive regex.

use crate::action::Action;
use crate::component::Component;
use crate::error::TocError;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use regex::{Regex, RegexBuilder};

// ═══════════════════════════════════════════════════════════════════════════════
// Matcher
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default)]
pub enum FilterMatcher {
    /// Empty filter
    #[default]
    All,
    /// Lowercased substring
    Text(String),
    Pattern(Regex),
    /// An invalid pattern matches nothing
    Nothing,
}

impl FilterMatcher {
    pub fn parse(query: &str) -> Result<Self, TocError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(FilterMatcher::All);
        }
        if let Some(inner) = query
            .strip_prefix('/')
            .and_then(|rest| rest.strip_suffix('/'))
        {
            let regex = RegexBuilder::new(inner).case_insensitive(true).build()?;
            return Ok(FilterMatcher::Pattern(regex));
        }
        Ok(FilterMatcher::Text(query.to_lowercase()))
    }

    pub fn is_all(&self) -> bool {
        matches!(self, FilterMatcher::All)
    }

    pub fn matches(&self, text: &str) -> bool {
        match self {
            FilterMatcher::All => true,
            FilterMatcher::Text(needle) => text.to_lowercase().contains(needle),
            FilterMatcher::Pattern(regex) => regex.is_match(text),
            FilterMatcher::Nothing => false,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Filter Component
// ═══════════════════════════════════════════════════════════════════════════════

/// Text input above the tree, owning the query and its compiled matcher
pub struct FilterComponent {
    pub query: String,
    /// Whether key presses go to the query
    pub editing: bool,
    matcher: FilterMatcher,
    error: Option<String>,
}

impl Default for FilterComponent {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterComponent {
    pub fn new() -> Self {
        Self {
            query: String::new(),
            editing: false,
            matcher: FilterMatcher::All,
            error: None,
        }
    }

    pub fn matcher(&self) -> &FilterMatcher {
        &self.matcher
    }

    /// Message for a query that failed to compile
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn set_query(&mut self, query: &str) {
        self.query = query.to_string();
        self.recompile();
    }

    pub fn clear(&mut self) {
        self.set_query("");
    }

    fn recompile(&mut self) {
        match FilterMatcher::parse(&self.query) {
            Ok(matcher) => {
                self.matcher = matcher;
                self.error = None;
            }
            Err(e) => {
                tracing::debug!(query = %self.query, error = %e, "Filter pattern rejected");
                self.matcher = FilterMatcher::Nothing;
                self.error = Some(e.to_string());
            }
        }
    }
}

impl Component for FilterComponent {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if !self.editing {
            return Ok(None);
        }
        let action = match key.code {
            KeyCode::Esc | KeyCode::Enter => Some(Action::ExitFilterMode),
            KeyCode::Backspace => Some(Action::FilterBackspace),
            KeyCode::Char(c) => Some(Action::FilterInput(c)),
            _ => None,
        };
        Ok(action)
    }

    fn update(&mut self, action: Action) -> Result<Option<Action>> {
        match action {
            Action::EnterFilterMode => self.editing = true,
            Action::ExitFilterMode => self.editing = false,
            Action::FilterInput(c) => {
                self.query.push(c);
                self.recompile();
            }
            Action::FilterBackspace => {
                self.query.pop();
                self.recompile();
            }
            Action::ClearFilter => {
                self.editing = false;
                self.clear();
            }
            _ => {}
        }
        Ok(None)
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect) -> Result<()> {
        let border_color = if self.error.is_some() {
            Color::Red
        } else if self.editing {
            Color::Cyan
        } else {
            Color::DarkGray
        };

        let mut spans = vec![Span::styled("⌕ ", Style::default().fg(Color::DarkGray))];
        if self.query.is_empty() && !self.editing {
            spans.push(Span::styled(
                "Press / to filter layers",
                Style::default().fg(Color::DarkGray),
            ));
        } else {
            spans.push(Span::styled(
                self.query.clone(),
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            ));
        }
        if self.editing {
            spans.push(Span::styled("▏", Style::default().fg(Color::Cyan)));
        }

        let paragraph = Paragraph::new(Line::from(spans)).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Filter ")
                .border_style(Style::default().fg(border_color)),
        );
        frame.render_widget(paragraph, area);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_match_is_case_insensitive() {
        let matcher = FilterMatcher::parse("STATES").unwrap();
        assert!(matcher.matches("USA Population States"));
        assert!(!matcher.matches("Roads"));
    }

    #[test]
    fn test_empty_matches_everything() {
        let matcher = FilterMatcher::parse("   ").unwrap();
        assert!(matcher.is_all());
        assert!(matcher.matches("anything"));
    }

    #[test]
    fn test_regex_pattern() {
        let matcher = FilterMatcher::parse("/^ro(ad|ute)s$/").unwrap();
        assert!(matcher.matches("Roads"));
        assert!(matcher.matches("routes"));
        assert!(!matcher.matches("main roads"));

        assert!(matches!(
            FilterMatcher::parse("/([/"),
            Err(TocError::InvalidFilter(_))
        ));
    }

    #[test]
    fn test_single_slash_is_text() {
        let matcher = FilterMatcher::parse("/").unwrap();
        assert!(matcher.matches("a/b"));
    }

    #[test]
    fn test_invalid_pattern_matches_nothing() {
        let mut filter = FilterComponent::new();
        filter.set_query("/([/");
        assert!(filter.error().is_some());
        assert!(!filter.matcher().matches("anything"));

        filter.update(Action::FilterBackspace).unwrap();
        assert_eq!(filter.query, "/([");
        assert!(filter.error().is_none());
        assert!(filter.matcher().matches("/([x"));
    }

    #[test]
    fn test_keys_only_captured_while_editing() {
        let mut filter = FilterComponent::new();
        let key = KeyEvent::from(KeyCode::Char('a'));
        assert_eq!(filter.handle_key_event(key).unwrap(), None);

        filter.update(Action::EnterFilterMode).unwrap();
        assert_eq!(
            filter.handle_key_event(key).unwrap(),
            Some(Action::FilterInput('a'))
        );
        filter.update(Action::FilterInput('a')).unwrap();
        filter.update(Action::ClearFilter).unwrap();
        assert!(filter.query.is_empty());
        assert!(!filter.editing);
    }
}

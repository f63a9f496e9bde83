//! Layer tree component
//!
//! Flattens the group hierarchy into display rows and draws each row
//! through a `NodeView`. Callers replace the default group or layer views
//! with `with_group_view` / `with_layer_view`.

use crate::action::Action;
use crate::component::Component;
use crate::components::filter::FilterMatcher;
use crate::model::{GroupNode, LayerNode, LayersState, MapType, DEFAULT_GROUP_ID};
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
    Frame,
};
use std::collections::HashSet;

// ═══════════════════════════════════════════════════════════════════════════════
// Node Views
// ═══════════════════════════════════════════════════════════════════════════════

/// Per-row facts a node view may use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NodeContext {
    pub depth: usize,
    pub selected: bool,
    /// Always false for layers
    pub expanded: bool,
}

/// Renders one tree node as a line
pub trait NodeView<N> {
    fn render(&self, node: &N, ctx: &NodeContext) -> Line<'static>;
}

impl<N, F> NodeView<N> for F
where
    F: Fn(&N, &NodeContext) -> Line<'static>,
{
    fn render(&self, node: &N, ctx: &NodeContext) -> Line<'static> {
        self(node, ctx)
    }
}

fn indent(depth: usize) -> Span<'static> {
    Span::raw("  ".repeat(depth))
}

fn selection_marker(selected: bool) -> Span<'static> {
    if selected {
        Span::styled("● ", Style::default().fg(Color::Green))
    } else {
        Span::raw("  ")
    }
}

pub struct DefaultGroupView;

impl NodeView<GroupNode> for DefaultGroupView {
    fn render(&self, group: &GroupNode, ctx: &NodeContext) -> Line<'static> {
        let arrow = if ctx.expanded { "▾ " } else { "▸ " };
        let title_style = if ctx.selected {
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        };
        Line::from(vec![
            selection_marker(ctx.selected),
            indent(ctx.depth),
            Span::styled(arrow, Style::default().fg(Color::DarkGray)),
            Span::styled(group.display_title().to_string(), title_style),
        ])
    }
}

pub struct DefaultLayerView;

impl NodeView<LayerNode> for DefaultLayerView {
    fn render(&self, layer: &LayerNode, ctx: &NodeContext) -> Line<'static> {
        let (eye, eye_color) = if layer.visibility {
            ("◉ ", Color::Yellow)
        } else {
            ("○ ", Color::DarkGray)
        };
        let title_style = match (ctx.selected, layer.visibility) {
            (true, _) => Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            (false, true) => Style::default().fg(Color::White),
            (false, false) => Style::default().fg(Color::DarkGray),
        };
        Line::from(vec![
            selection_marker(ctx.selected),
            indent(ctx.depth),
            Span::styled(eye, Style::default().fg(eye_color)),
            Span::styled(
                format!("{} ", layer.layer_type.icon()),
                Style::default().fg(Color::Yellow),
            ),
            Span::styled(layer.display_title().to_string(), title_style),
        ])
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Rows
// ═══════════════════════════════════════════════════════════════════════════════

/// A node placed in the flattened tree
#[derive(Debug, Clone, PartialEq)]
pub enum TreeRow {
    Group { group: GroupNode, depth: usize },
    Layer { layer: LayerNode, depth: usize },
}

impl TreeRow {
    pub fn id(&self) -> &str {
        match self {
            TreeRow::Group { group, .. } => &group.id,
            TreeRow::Layer { layer, .. } => &layer.id,
        }
    }

    pub fn depth(&self) -> usize {
        match self {
            TreeRow::Group { depth, .. } | TreeRow::Layer { depth, .. } => *depth,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, TreeRow::Group { .. })
    }
}

struct RowBuilder<'a> {
    layers: &'a LayersState,
    map_type: MapType,
    matcher: &'a FilterMatcher,
    visited: HashSet<String>,
}

impl<'a> RowBuilder<'a> {
    fn layer_shown(&self, layer: &LayerNode) -> bool {
        !layer.is_background() && layer.layer_type.supported_by(self.map_type)
    }

    /// Rows for a group and its subtree, plus whether any layer below it
    /// matched the filter
    fn group_rows(
        &mut self,
        group: &GroupNode,
        extra: &[&LayerNode],
        depth: usize,
    ) -> (Vec<TreeRow>, bool) {
        let mut children = Vec::new();
        let mut matched = false;

        for node in &group.nodes {
            if !self.visited.insert(node.clone()) {
                continue;
            }
            if let Some(layer) = self.layers.layer(node) {
                if self.layer_shown(layer) && self.matcher.matches(layer.display_title()) {
                    matched = true;
                    children.push(TreeRow::Layer {
                        layer: layer.clone(),
                        depth: depth + 1,
                    });
                }
            } else if let Some(child) = self.layers.group(node) {
                let orphans = self.orphans_of(&child.id);
                let (rows, child_matched) = self.group_rows(child, &orphans, depth + 1);
                matched |= child_matched;
                children.extend(rows);
            }
        }

        for layer in extra {
            if self.visited.insert(layer.id.clone())
                && self.matcher.matches(layer.display_title())
            {
                matched = true;
                children.push(TreeRow::Layer {
                    layer: (*layer).clone(),
                    depth: depth + 1,
                });
            }
        }

        if !matched && !self.matcher.is_all() {
            return (Vec::new(), false);
        }

        let mut rows = vec![TreeRow::Group {
            group: group.clone(),
            depth,
        }];
        if group.expanded {
            rows.extend(children);
        }
        (rows, matched)
    }

    /// Unlisted layers drawn under `group_id`
    fn orphans_of(&self, group_id: &str) -> Vec<&'a LayerNode> {
        let layers = self.layers;
        layers
            .unlisted_layers()
            .into_iter()
            .filter(|l| self.layer_shown(l) && layers.owner_of(l) == group_id)
            .collect()
    }
}

/// Flatten the tree in display order: root groups as listed, children in
/// `nodes` order, then unlisted layers of each group. Layers without a
/// known group go under an implicit default group.
pub fn build_rows(
    layers: &LayersState,
    map_type: MapType,
    matcher: &FilterMatcher,
) -> Vec<TreeRow> {
    let mut builder = RowBuilder {
        layers,
        map_type,
        matcher,
        visited: HashSet::new(),
    };

    let mut rows = Vec::new();
    for group in layers.root_groups() {
        if !builder.visited.insert(group.id.clone()) {
            continue;
        }
        let extra = builder.orphans_of(&group.id);
        let (group_rows, _) = builder.group_rows(group, &extra, 0);
        rows.extend(group_rows);
    }

    let homeless = builder.orphans_of(DEFAULT_GROUP_ID);
    if layers.group(DEFAULT_GROUP_ID).is_none() && !homeless.is_empty() {
        let implicit = GroupNode::new(DEFAULT_GROUP_ID, "Default", &[]);
        let (group_rows, _) = builder.group_rows(&implicit, &homeless, 0);
        rows.extend(group_rows);
    }

    rows
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tree Component
// ═══════════════════════════════════════════════════════════════════════════════

pub struct TreeComponent {
    pub list_state: ListState,
    rows: Vec<TreeRow>,
    selected: HashSet<String>,
    group_view: Box<dyn NodeView<GroupNode>>,
    layer_view: Box<dyn NodeView<LayerNode>>,
    focused: bool,
}

impl Default for TreeComponent {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeComponent {
    pub fn new() -> Self {
        Self {
            list_state: ListState::default(),
            rows: Vec::new(),
            selected: HashSet::new(),
            group_view: Box::new(DefaultGroupView),
            layer_view: Box::new(DefaultLayerView),
            focused: true,
        }
    }

    pub fn with_group_view(mut self, view: impl NodeView<GroupNode> + 'static) -> Self {
        self.group_view = Box::new(view);
        self
    }

    pub fn with_layer_view(mut self, view: impl NodeView<LayerNode> + 'static) -> Self {
        self.layer_view = Box::new(view);
        self
    }

    pub fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    /// Rebuild rows after the layer tree, selection or filter changed.
    /// The cursor stays on the same node when it is still shown.
    pub fn refresh(&mut self, layers: &LayersState, map_type: MapType, matcher: &FilterMatcher) {
        let current = self.current_id().map(str::to_string);
        self.rows = build_rows(layers, map_type, matcher);
        self.selected = layers.selected.iter().cloned().collect();

        let index = current
            .and_then(|id| self.rows.iter().position(|r| r.id() == id))
            .or_else(|| {
                let previous = self.list_state.selected().unwrap_or(0);
                (!self.rows.is_empty()).then(|| previous.min(self.rows.len() - 1))
            });
        self.list_state.select(index);
    }

    pub fn rows(&self) -> &[TreeRow] {
        &self.rows
    }

    pub fn current_row(&self) -> Option<&TreeRow> {
        self.rows.get(self.list_state.selected()?)
    }

    pub fn current_id(&self) -> Option<&str> {
        self.current_row().map(TreeRow::id)
    }

    pub fn layer_count(&self) -> usize {
        self.rows.iter().filter(|r| !r.is_group()).count()
    }

    /// One line per row, each node rendered once by its view
    pub fn render_lines(&self) -> Vec<Line<'static>> {
        self.rows
            .iter()
            .map(|row| match row {
                TreeRow::Group { group, depth } => self.group_view.render(
                    group,
                    &NodeContext {
                        depth: *depth,
                        selected: self.selected.contains(&group.id),
                        expanded: group.expanded,
                    },
                ),
                TreeRow::Layer { layer, depth } => self.layer_view.render(
                    layer,
                    &NodeContext {
                        depth: *depth,
                        selected: self.selected.contains(&layer.id),
                        expanded: false,
                    },
                ),
            })
            .collect()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Navigation
    // ─────────────────────────────────────────────────────────────────────────

    pub fn next(&mut self) {
        if self.rows.is_empty() {
            return;
        }
        let next = match self.list_state.selected() {
            Some(i) if i + 1 < self.rows.len() => i + 1,
            _ => 0,
        };
        self.list_state.select(Some(next));
    }

    pub fn previous(&mut self) {
        if self.rows.is_empty() {
            return;
        }
        let prev = match self.list_state.selected() {
            Some(0) | None => self.rows.len() - 1,
            Some(i) => i - 1,
        };
        self.list_state.select(Some(prev));
    }

    pub fn select_first(&mut self) {
        self.list_state
            .select((!self.rows.is_empty()).then_some(0));
    }

    pub fn select_last(&mut self) {
        self.list_state.select(self.rows.len().checked_sub(1));
    }
}

impl Component for TreeComponent {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let action = match key.code {
            KeyCode::Char('j') | KeyCode::Down => Some(Action::NextItem),
            KeyCode::Char('k') | KeyCode::Up => Some(Action::PrevItem),
            KeyCode::Char('g') => Some(Action::FirstItem),
            KeyCode::Char('G') => Some(Action::LastItem),
            KeyCode::Char(' ') => Some(Action::ToggleNodeSelection),
            KeyCode::Enter => Some(Action::ToggleExpanded),
            KeyCode::Char('v') => Some(Action::ToggleVisibility),
            KeyCode::Esc if !self.selected.is_empty() => Some(Action::ClearSelection),
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(Action::ClearFilter)
            }
            _ => None,
        };
        Ok(action)
    }

    fn update(&mut self, action: Action) -> Result<Option<Action>> {
        match action {
            Action::NextItem => self.next(),
            Action::PrevItem => self.previous(),
            Action::FirstItem => self.select_first(),
            Action::LastItem => self.select_last(),
            _ => {}
        }
        Ok(None)
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect) -> Result<()> {
        let items: Vec<ListItem> = self.render_lines().into_iter().map(ListItem::new).collect();

        let mut title = format!(" Layers ({}) ", self.layer_count());
        if !self.selected.is_empty() {
            title = format!(" Layers ({}) [{}✓] ", self.layer_count(), self.selected.len());
        }
        let border_color = if self.focused { Color::Cyan } else { Color::DarkGray };

        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(title)
                    .border_style(Style::default().fg(border_color)),
            )
            .highlight_style(
                Style::default()
                    .bg(Color::Blue)
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("▶ ");

        frame.render_stateful_widget(list, area, &mut self.list_state);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn state(value: serde_json::Value) -> LayersState {
        serde_json::from_value(value).unwrap()
    }

    fn nested_state() -> LayersState {
        state(json!({
            "groups": [
                { "id": "Default", "title": "Default", "nodes": ["rivers", "Default.transport"] },
                { "id": "Default.transport", "title": "Transport", "nodes": ["roads", "rail"] },
                { "id": "imagery", "title": "Imagery", "nodes": ["ortho"] }
            ],
            "flat": [
                { "id": "rivers", "title": "Rivers", "type": "wms" },
                { "id": "roads", "title": "Roads", "type": "wfs", "group": "Default.transport" },
                { "id": "rail", "title": "Railways", "type": "wfs", "group": "Default.transport" },
                { "id": "ortho", "title": "Orthophoto", "type": "wmts", "group": "imagery" },
                { "id": "loose", "title": "Loose points", "type": "vector" },
                { "id": "buildings", "title": "Buildings", "type": "3dtiles" },
                { "id": "osm", "title": "OSM", "type": "osm", "group": "background" }
            ]
        }))
    }

    fn ids(rows: &[TreeRow]) -> Vec<(&str, usize)> {
        rows.iter().map(|r| (r.id(), r.depth())).collect()
    }

    #[test]
    fn test_rows_follow_document_order() {
        let rows = build_rows(&nested_state(), MapType::Openlayers, &FilterMatcher::All);
        assert_eq!(
            ids(&rows),
            vec![
                ("Default", 0),
                ("rivers", 1),
                ("Default.transport", 1),
                ("roads", 2),
                ("rail", 2),
                ("loose", 1),
                ("imagery", 0),
                ("ortho", 1),
            ]
        );
    }

    #[test]
    fn test_3d_layers_shown_on_cesium() {
        let rows = build_rows(&nested_state(), MapType::Cesium, &FilterMatcher::All);
        assert!(rows.iter().any(|r| r.id() == "buildings"));
        assert!(rows.iter().all(|r| r.id() != "osm"));
    }

    #[test]
    fn test_implicit_default_group() {
        let layers = state(json!({
            "groups": [],
            "flat": [{ "id": "a", "title": "A", "type": "wms" }]
        }));
        let rows = build_rows(&layers, MapType::Openlayers, &FilterMatcher::All);
        assert_eq!(ids(&rows), vec![("Default", 0), ("a", 1)]);
    }

    #[test]
    fn test_collapsed_group_hides_children() {
        let mut layers = nested_state();
        layers.toggle_expanded("Default.transport");
        let rows = build_rows(&layers, MapType::Openlayers, &FilterMatcher::All);
        assert!(rows.iter().any(|r| r.id() == "Default.transport"));
        assert!(rows.iter().all(|r| r.id() != "roads"));
    }

    #[test]
    fn test_filter_keeps_matching_branches() {
        let matcher = FilterMatcher::parse("rail").unwrap();
        let rows = build_rows(&nested_state(), MapType::Openlayers, &matcher);
        assert_eq!(
            ids(&rows),
            vec![("Default", 0), ("Default.transport", 1), ("rail", 2)]
        );
    }

    #[test]
    fn test_node_listed_twice_renders_once() {
        let mut layers = nested_state();
        layers.groups[2].nodes.push("rivers".to_string());
        let rows = build_rows(&layers, MapType::Openlayers, &FilterMatcher::All);
        assert_eq!(rows.iter().filter(|r| r.id() == "rivers").count(), 1);
    }

    #[test]
    fn test_custom_group_view_renders_once() {
        let layers = state(json!({
            "groups": [{ "id": "default", "title": "Default", "nodes": ["layer00", "layer01"] }],
            "flat": [
                { "id": "layer00", "title": "layer00", "type": "wms" },
                { "id": "layer01", "title": "layer01", "type": "wms" }
            ]
        }));
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut tree = TreeComponent::new().with_group_view(
            move |group: &GroupNode, _ctx: &NodeContext| {
                counter.fetch_add(1, Ordering::SeqCst);
                Line::from(format!("custom-group:{}", group.id))
            },
        );
        tree.refresh(&layers, MapType::Openlayers, &FilterMatcher::All);

        let lines: Vec<String> = tree.render_lines().iter().map(|l| l.to_string()).collect();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "custom-group:default");
        assert!(lines[1].contains("◉") && lines[1].ends_with("layer00"));
        assert!(lines[2].contains("◉") && lines[2].ends_with("layer01"));
    }

    #[test]
    fn test_removed_default_group_leaves_no_rows() {
        let mut layers = state(json!({
            "groups": [{ "id": "Default", "title": "Default", "nodes": ["a"] }],
            "flat": [
                { "id": "a", "title": "A", "type": "wms" },
                { "id": "b", "title": "B", "type": "wms" }
            ]
        }));
        let rows = build_rows(&layers, MapType::Openlayers, &FilterMatcher::All);
        assert_eq!(ids(&rows), vec![("Default", 0), ("a", 1), ("b", 1)]);

        layers.remove_node("Default");
        assert!(build_rows(&layers, MapType::Openlayers, &FilterMatcher::All).is_empty());
    }

    #[test]
    fn test_custom_layer_view_renders_once_per_layer() {
        let layers = state(json!({
            "groups": [{ "id": "default", "title": "Default", "nodes": ["layer00", "layer01"] }],
            "flat": [
                { "id": "layer00", "title": "layer00", "type": "wms" },
                { "id": "layer01", "title": "layer01", "type": "wms" }
            ]
        }));
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut tree = TreeComponent::new().with_layer_view(
            move |layer: &LayerNode, _ctx: &NodeContext| {
                counter.fetch_add(1, Ordering::SeqCst);
                Line::from(format!("custom-layer:{}", layer.id))
            },
        );
        tree.refresh(&layers, MapType::Openlayers, &FilterMatcher::All);

        let lines: Vec<String> = tree.render_lines().iter().map(|l| l.to_string()).collect();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(lines.iter().filter(|l| l.starts_with("custom-layer:")).count(), 2);
        assert!(lines.iter().all(|l| !l.contains('◉')));
    }

    #[test]
    fn test_context_reports_selection() {
        let mut layers = nested_state();
        layers.selected = vec!["roads".to_string()];
        let mut tree = TreeComponent::new().with_layer_view(|layer: &LayerNode, ctx: &NodeContext| {
            Line::from(format!("{}:{}:{}", layer.id, ctx.depth, ctx.selected))
        });
        tree.refresh(&layers, MapType::Openlayers, &FilterMatcher::All);
        let lines: Vec<String> = tree.render_lines().iter().map(|l| l.to_string()).collect();
        assert!(lines.contains(&"roads:2:true".to_string()));
        assert!(lines.contains(&"rail:2:false".to_string()));
    }

    #[test]
    fn test_cursor_follows_node_across_refresh() {
        let mut layers = nested_state();
        let mut tree = TreeComponent::new();
        tree.refresh(&layers, MapType::Openlayers, &FilterMatcher::All);
        tree.select_last();
        assert_eq!(tree.current_id(), Some("ortho"));

        layers.remove_node("rivers");
        tree.refresh(&layers, MapType::Openlayers, &FilterMatcher::All);
        assert_eq!(tree.current_id(), Some("ortho"));

        tree.next();
        assert_eq!(tree.current_id(), Some("Default"));
        tree.previous();
        assert_eq!(tree.current_id(), Some("ortho"));
    }
}

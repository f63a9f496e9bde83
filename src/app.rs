//! Root application component
//!
//! The App owns the map document and coordinates the toolbar, filter and
//! tree components. The toolbar is recomposed from the current selection
//! after every action and on every frame.

use crate::action::Action;
use crate::component::Component;
use crate::components::{
    draw_toc_screen, tool_title, ConfirmDialog, FilterComponent, HelpDialog, TocRenderContext,
    ToolbarComponent, TreeComponent, TreeRow,
};
use crate::config::Config;
use crate::model::{
    builtin_items, compose, BuiltinTool, Capability, CapabilityRegistry, Collaborator, Focus,
    Modal, ModalStack, SelectionState, ToolId, ToolItem, ToolTarget, ToolbarEnv, VisibleTool,
};
use crate::services::{self, MapDocument};
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{layout::Rect, Frame};
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Title given to groups created from the toolbar
const NEW_GROUP_TITLE: &str = "New Group";

// ═══════════════════════════════════════════════════════════════════════════════
// App Struct
// ═══════════════════════════════════════════════════════════════════════════════

pub struct App {
    pub document: MapDocument,
    pub map_path: Option<PathBuf>,
    pub config: Config,

    /// Tools contributed by the enabled collaborators
    pub registry: CapabilityRegistry,
    builtins: Vec<ToolItem>,
    /// Tools declared in the config, after the registry tools
    pub external_items: Vec<ToolItem>,

    pub modals: ModalStack,
    pub focus: Focus,
    pub should_quit: bool,
    pub error: Option<String>,
    pub status_message: Option<String>,

    // ─────────────────────────────────────────────────────────────────────────
    // Child Components
    // ─────────────────────────────────────────────────────────────────────────
    pub toolbar: ToolbarComponent,
    pub filter: FilterComponent,
    pub tree: TreeComponent,
    pub quit_dialog: ConfirmDialog,
    pub remove_dialog: ConfirmDialog,
    pub help_dialog: HelpDialog,
}

// ═══════════════════════════════════════════════════════════════════════════════
// App Implementation
// ═══════════════════════════════════════════════════════════════════════════════

impl App {
    /// Create the app from the user config, opening `map_path` or the map
    /// opened last time
    pub fn new(map_path: Option<PathBuf>) -> App {
        let mut config = Config::load().unwrap_or_default();
        let path = map_path.or_else(|| config.last_map_path.as_ref().map(PathBuf::from));

        let (document, error) = match &path {
            Some(p) => match services::load_map_document(p) {
                Ok(doc) => {
                    let path_str = p.to_string_lossy().to_string();
                    if config.last_map_path.as_deref() != Some(path_str.as_str()) {
                        config.last_map_path = Some(path_str);
                        if let Err(e) = config.save() {
                            warn!(error = %e, "Failed to save config");
                        }
                    }
                    (doc, None)
                }
                Err(e) => {
                    warn!(path = %p.display(), error = %e, "Failed to load map document");
                    (MapDocument::default(), Some(format!("{}: {}", p.display(), e)))
                }
            },
            None => (
                MapDocument::default(),
                Some("No map document given. Usage: map-toc <MAP_FILE>".to_string()),
            ),
        };

        let mut app = Self::with_document(document, config);
        app.map_path = path;
        if error.is_some() {
            app.error = error;
        }
        app
    }

    /// Create the app around an already loaded document
    pub fn with_document(document: MapDocument, config: Config) -> App {
        let mut error = None;
        let collaborators = match config.collaborators() {
            Ok(collaborators) => collaborators,
            Err(e) => {
                warn!(error = %e, "Skipping unknown plugins");
                error = Some(e.to_string());
                config
                    .enabled_plugins
                    .iter()
                    .filter_map(|name| name.parse::<Collaborator>().ok())
                    .collect()
            }
        };
        let registry = CapabilityRegistry::from_enabled(&collaborators);
        let external_items = services::build_external_items(&config.items);
        for item in external_items.iter().filter(|i| i.target != ToolTarget::Toolbar) {
            // Only the toolbar is hosted in the terminal panel
            debug!(item = %item.name, placement = ?item.target, "Item has no host, not shown");
        }
        info!(
            plugins = ?registry.collaborators(),
            external = external_items.len(),
            "Toolbar registry ready"
        );

        let mut app = App {
            document,
            map_path: None,
            config,
            registry,
            builtins: builtin_items(),
            external_items,
            modals: ModalStack::new(),
            focus: Focus::Tree,
            should_quit: false,
            error,
            status_message: None,
            toolbar: ToolbarComponent::new(),
            filter: FilterComponent::new(),
            tree: TreeComponent::new(),
            quit_dialog: ConfirmDialog::quit(),
            remove_dialog: ConfirmDialog::default(),
            help_dialog: HelpDialog::default(),
        };
        app.refresh_view();
        app.tree.select_first();
        app
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Toolbar Composition
    // ─────────────────────────────────────────────────────────────────────────

    pub fn selection(&self) -> SelectionState {
        SelectionState::from_layers(&self.document.layers)
    }

    pub fn toolbar_env(&self) -> ToolbarEnv {
        self.document
            .toolbar_env(self.config.role_override.as_deref())
    }

    pub fn compose_toolbar(&self) -> Vec<VisibleTool> {
        compose(
            &self.builtins,
            &self.registry.items(),
            &self.external_items,
            &self.selection(),
            &self.toolbar_env(),
        )
    }

    /// Recompose the toolbar and rebuild the tree rows
    pub fn refresh_view(&mut self) {
        let tools = self.compose_toolbar();
        self.toolbar.set_tools(tools);
        self.tree.refresh(
            &self.document.layers,
            self.document.map_type(),
            self.filter.matcher(),
        );
    }

    fn set_focus(&mut self, focus: Focus) {
        debug!(focus = focus.name(), "Focus changed");
        self.focus = focus;
        self.toolbar.focused = focus == Focus::Toolbar;
        self.tree.set_focused(focus == Focus::Tree);
    }

    fn map_name(&self) -> Option<String> {
        self.map_path
            .as_ref()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().to_string())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Tool Invocation
    // ─────────────────────────────────────────────────────────────────────────

    fn invoke_tool(&mut self, id: ToolId) -> Option<Action> {
        let tools = self.compose_toolbar();
        if !tools.iter().any(|t| t.id == id) {
            self.status_message = Some(format!("{} is not available for this selection", id));
            return None;
        }
        let label = tool_title(&tools, &id);
        let selection = self.selection();
        info!(tool = %id, status = %selection.status, "Invoking tool");

        match id {
            ToolId::Builtin(BuiltinTool::ToggleAll) => {
                let show = !self.document.layers.all_visible();
                self.document.layers.set_all_visibility(show);
                self.status_message = Some(if show {
                    "All layers shown".to_string()
                } else {
                    "All layers hidden".to_string()
                });
            }
            ToolId::Builtin(BuiltinTool::ZoomTo) => {
                if let Some(node_id) = selection.single_node_id() {
                    self.status_message = Some(match self.document.layers.extent_of(node_id) {
                        Some(bbox) => format!(
                            "Zoom to {}: [{}, {}, {}, {}] {}",
                            node_id,
                            bbox.bounds.minx,
                            bbox.bounds.miny,
                            bbox.bounds.maxx,
                            bbox.bounds.maxy,
                            bbox.crs
                        ),
                        None => format!("{} has no extent", node_id),
                    });
                }
            }
            ToolId::Builtin(BuiltinTool::Remove) => {
                let target = selection
                    .single_layer()
                    .map(|l| (l.id.clone(), l.display_title().to_string()))
                    .or_else(|| {
                        selection
                            .single_group()
                            .map(|g| (g.id.clone(), g.display_title().to_string()))
                    });
                if let Some((node_id, title)) = target {
                    self.remove_dialog = ConfirmDialog::remove(&title);
                    self.modals.push(Modal::ConfirmRemove { node_id, title });
                }
            }
            ToolId::Capability(Capability::AddGroup) => {
                let parent = selection.single_group().map(|g| g.id.clone());
                let group_id = self
                    .document
                    .layers
                    .add_group(parent.as_deref(), NEW_GROUP_TITLE);
                self.status_message = Some(format!("Added group {}", group_id));
            }
            ToolId::Capability(_) | ToolId::External(_) => {
                let count = selection.selected_layers.len() + selection.selected_groups.len();
                self.status_message = Some(format!("{} requested ({} selected)", label, count));
            }
        }
        None
    }

    fn remove_node(&mut self, node_id: &str) {
        let removed = self.document.layers.remove_node(node_id);
        self.document.layers.clear_selection();
        info!(node = node_id, removed, "Removed node");
        self.status_message = Some(format!("Removed {} node(s)", removed));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Tree Edits
    // ─────────────────────────────────────────────────────────────────────────

    fn toggle_current_selection(&mut self) {
        if let Some(id) = self.tree.current_id().map(str::to_string) {
            self.document.layers.toggle_selected(&id);
        }
    }

    fn toggle_current_expanded(&mut self) {
        if let Some(TreeRow::Group { group, .. }) = self.tree.current_row() {
            let id = group.id.clone();
            self.document.layers.toggle_expanded(&id);
        }
    }

    fn toggle_current_visibility(&mut self) {
        if let Some(TreeRow::Layer { layer, .. }) = self.tree.current_row() {
            let id = layer.id.clone();
            self.document.layers.toggle_visibility(&id);
        }
    }

    fn reload_map(&mut self) {
        let Some(path) = self.map_path.clone() else {
            self.status_message = Some("No map document to reload".to_string());
            return;
        };
        match services::load_map_document(&path) {
            Ok(document) => {
                self.document = document;
                self.error = None;
                self.status_message = Some("Map reloaded".to_string());
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Reload failed");
                self.error = Some(e.to_string());
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Component Implementation
// ═══════════════════════════════════════════════════════════════════════════════

impl Component for App {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return Ok(Some(Action::ForceQuit));
        }

        if let Some(modal) = self.modals.top().cloned() {
            return self.handle_modal_key_event(&modal, key);
        }

        match self.focus {
            Focus::Filter => self.filter.handle_key_event(key),
            Focus::Toolbar => match self.toolbar.handle_key_event(key)? {
                Some(action) => Ok(Some(action)),
                None => Ok(self.handle_global_key_event(key)),
            },
            Focus::Tree => match self.handle_global_key_event(key) {
                Some(action) => Ok(Some(action)),
                None => self.tree.handle_key_event(key),
            },
        }
    }

    fn update(&mut self, action: Action) -> Result<Option<Action>> {
        let mut follow_up = None;
        match action {
            // ─────────────────────────────────────────────────────────────────
            // App Lifecycle
            // ─────────────────────────────────────────────────────────────────
            Action::Tick | Action::Resize(_, _) => {}
            Action::ForceQuit => self.should_quit = true,
            Action::ReloadMap => self.reload_map(),

            // ─────────────────────────────────────────────────────────────────
            // Tree (delegate to TreeComponent)
            // ─────────────────────────────────────────────────────────────────
            Action::NextItem | Action::PrevItem | Action::FirstItem | Action::LastItem => {
                self.tree.update(action)?;
            }
            Action::ToggleNodeSelection => self.toggle_current_selection(),
            Action::ClearSelection => self.document.layers.clear_selection(),
            Action::ToggleExpanded => self.toggle_current_expanded(),
            Action::ToggleVisibility => self.toggle_current_visibility(),

            // ─────────────────────────────────────────────────────────────────
            // Toolbar
            // ─────────────────────────────────────────────────────────────────
            Action::FocusToolbar => self.set_focus(Focus::Toolbar),
            Action::FocusTree => self.set_focus(Focus::Tree),
            Action::NextTool | Action::PrevTool | Action::ActivateTool => {
                follow_up = self.toolbar.update(action)?;
            }
            Action::InvokeTool(id) => follow_up = self.invoke_tool(id),

            // ─────────────────────────────────────────────────────────────────
            // Filter (delegate to FilterComponent)
            // ─────────────────────────────────────────────────────────────────
            Action::EnterFilterMode => {
                self.set_focus(Focus::Filter);
                self.filter.update(action)?;
            }
            Action::ExitFilterMode => {
                self.set_focus(Focus::Tree);
                self.filter.update(action)?;
            }
            Action::FilterInput(_) | Action::FilterBackspace | Action::ClearFilter => {
                self.filter.update(action)?;
            }

            // ─────────────────────────────────────────────────────────────────
            // Modals
            // ─────────────────────────────────────────────────────────────────
            Action::OpenQuitDialog => self.modals.push(Modal::QuitConfirm),
            Action::OpenHelp => {
                self.help_dialog.scroll_offset = 0;
                self.modals.push(Modal::Help);
            }
            Action::CloseModal => {
                self.modals.pop();
            }
            Action::ConfirmModal => match self.modals.pop() {
                Some(Modal::QuitConfirm) => follow_up = Some(Action::ForceQuit),
                Some(Modal::ConfirmRemove { node_id, .. }) => self.remove_node(&node_id),
                _ => {}
            },
            Action::ScrollUp | Action::ScrollDown => {
                self.help_dialog.update(action)?;
            }
        }

        self.refresh_view();
        Ok(follow_up)
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect) -> Result<()> {
        // Selectors are evaluated against the current selection every frame
        self.refresh_view();

        let selection = self.selection();
        let map_name = self.map_name();
        let ctx = TocRenderContext {
            layers: &self.document.layers,
            selection: &selection,
            map_name: map_name.as_deref(),
            error: self.error.as_deref(),
            status_message: self.status_message.as_deref(),
            focus: self.focus,
        };

        draw_toc_screen(
            frame,
            area,
            &mut self.toolbar,
            &mut self.filter,
            &mut self.tree,
            &ctx,
        )?;

        if let Some(modal) = self.modals.top().cloned() {
            self.draw_modal(frame, area, &modal)?;
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Helper Methods
// ═══════════════════════════════════════════════════════════════════════════════

impl App {
    fn handle_modal_key_event(&mut self, modal: &Modal, key: KeyEvent) -> Result<Option<Action>> {
        match modal {
            Modal::QuitConfirm => self.quit_dialog.handle_key_event(key),
            Modal::ConfirmRemove { .. } => self.remove_dialog.handle_key_event(key),
            Modal::Help => self.help_dialog.handle_key_event(key),
        }
    }

    /// Keys available from the tree and the toolbar
    fn handle_global_key_event(&self, key: KeyEvent) -> Option<Action> {
        match key.code {
            KeyCode::Char('q') => Some(Action::OpenQuitDialog),
            KeyCode::Char('?') => Some(Action::OpenHelp),
            KeyCode::Char('/') => Some(Action::EnterFilterMode),
            KeyCode::Char('R') => Some(Action::ReloadMap),
            KeyCode::Tab if self.focus == Focus::Tree => Some(Action::FocusToolbar),
            _ => None,
        }
    }

    fn draw_modal(&mut self, frame: &mut Frame, area: Rect, modal: &Modal) -> Result<()> {
        match modal {
            Modal::QuitConfirm => self.quit_dialog.draw(frame, area),
            Modal::ConfirmRemove { .. } => self.remove_dialog.draw(frame, area),
            Modal::Help => self.help_dialog.draw(frame, area),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::map_state::parse_map_document;

    fn document() -> MapDocument {
        parse_map_document(
            r#"{
                "layers": {
                    "groups": [
                        { "id": "Default", "title": "Default", "nodes": ["states", "Default.roads"] },
                        { "id": "Default.roads", "title": "Roads", "nodes": ["highways"] }
                    ],
                    "flat": [
                        { "id": "states", "title": "States", "type": "wms",
                          "search": { "url": "https://example.org/wfs", "type": "wfs" },
                          "bbox": { "crs": "EPSG:4326", "bounds": { "minx": -124.7, "miny": 24.9, "maxx": -66.9, "maxy": 49.3 } } },
                        { "id": "highways", "title": "Highways", "type": "wfs", "group": "Default.roads",
                          "bbox": { "crs": "EPSG:4326", "bounds": { "minx": -100.0, "miny": 30.0, "maxx": -90.0, "maxy": 40.0 } } }
                    ]
                },
                "security": { "user": { "role": "ADMIN" } }
            }"#,
            false,
        )
        .unwrap()
    }

    fn app() -> App {
        App::with_document(document(), Config::default())
    }

    fn dispatch(app: &mut App, action: Action) {
        let mut next = Some(action);
        while let Some(a) = next {
            next = app.update(a).unwrap();
        }
    }

    fn press(app: &mut App, code: KeyCode) {
        if let Some(action) = app.handle_key_event(KeyEvent::from(code)).unwrap() {
            dispatch(app, action);
        }
    }

    fn select(app: &mut App, id: &str) {
        let index = app.tree.rows().iter().position(|r| r.id() == id).unwrap();
        app.tree.list_state.select(Some(index));
        dispatch(app, Action::ToggleNodeSelection);
    }

    fn tool_names(app: &App) -> Vec<String> {
        app.toolbar.tools().iter().map(|t| t.name.clone()).collect()
    }

    #[test]
    fn test_toolbar_follows_selection() {
        let mut app = app();
        assert_eq!(
            tool_names(&app),
            vec!["ToggleAll", "AddLayer", "AddGroup", "UpdateLayerInfo"]
        );

        select(&mut app, "states");
        assert_eq!(
            tool_names(&app),
            vec![
                "ToggleAll",
                "ZoomTo",
                "Remove",
                "UpdateLayerInfo",
                "FeatureGrid",
                "Settings",
                "FilterLayer"
            ]
        );

        dispatch(&mut app, Action::ClearSelection);
        assert_eq!(app.toolbar.button_count(), 4);
    }

    #[test]
    fn test_role_override_hides_admin_tool() {
        let config = Config {
            role_override: Some("USER".to_string()),
            ..Config::default()
        };
        let app = App::with_document(document(), config);
        assert!(!tool_names(&app).contains(&"UpdateLayerInfo".to_string()));
    }

    #[test]
    fn test_toggle_all_visibility() {
        let mut app = app();
        dispatch(&mut app, Action::InvokeTool(ToolId::Builtin(BuiltinTool::ToggleAll)));
        assert!(app.document.layers.flat.iter().all(|l| !l.visibility));
        assert_eq!(app.status_message.as_deref(), Some("All layers hidden"));

        dispatch(&mut app, Action::InvokeTool(ToolId::Builtin(BuiltinTool::ToggleAll)));
        assert!(app.document.layers.all_visible());
    }

    #[test]
    fn test_zoom_to_group_reports_extent() {
        let mut app = app();
        select(&mut app, "Default");
        dispatch(&mut app, Action::InvokeTool(ToolId::Builtin(BuiltinTool::ZoomTo)));
        assert_eq!(
            app.status_message.as_deref(),
            Some("Zoom to Default: [-124.7, 24.9, -66.9, 49.3] EPSG:4326")
        );
    }

    #[test]
    fn test_remove_asks_for_confirmation() {
        let mut app = app();
        select(&mut app, "Default.roads");
        dispatch(&mut app, Action::InvokeTool(ToolId::Builtin(BuiltinTool::Remove)));
        assert!(matches!(
            app.modals.top(),
            Some(Modal::ConfirmRemove { node_id, .. }) if node_id == "Default.roads"
        ));

        press(&mut app, KeyCode::Char('y'));
        assert!(app.modals.is_empty());
        assert!(app.document.layers.layer("highways").is_none());
        assert!(app.document.layers.selected.is_empty());
        assert!(app.tree.rows().iter().all(|r| r.id() != "Default.roads"));
    }

    #[test]
    fn test_add_group_inside_selected_group() {
        let mut app = app();
        select(&mut app, "Default");
        dispatch(&mut app, Action::InvokeTool(ToolId::Capability(Capability::AddGroup)));
        assert!(app.document.layers.group("Default.group_1").is_some());
        assert!(app.tree.rows().iter().any(|r| r.id() == "Default.group_1"));
    }

    #[test]
    fn test_hidden_tool_is_not_invoked() {
        let mut app = app();
        dispatch(&mut app, Action::InvokeTool(ToolId::Builtin(BuiltinTool::Remove)));
        assert!(app.modals.is_empty());
        assert_eq!(
            app.status_message.as_deref(),
            Some("Remove is not available for this selection")
        );
    }

    #[test]
    fn test_toolbar_keys_invoke_tool() {
        let mut app = app();
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.focus, Focus::Toolbar);

        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.status_message.as_deref(), Some("Add layer requested (0 selected)"));

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.focus, Focus::Tree);
    }

    #[test]
    fn test_filter_narrows_tree() {
        let mut app = app();
        press(&mut app, KeyCode::Char('/'));
        assert_eq!(app.focus, Focus::Filter);
        for c in "high".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.focus, Focus::Tree);

        let ids: Vec<&str> = app.tree.rows().iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec!["Default", "Default.roads", "highways"]);
    }

    #[test]
    fn test_external_items_from_config() {
        let config: Config = serde_json::from_str(
            r#"{ "items": [{ "name": "Export", "visibleWhen": "single-layer" }] }"#,
        )
        .unwrap();
        let mut app = App::with_document(document(), config);
        assert!(!tool_names(&app).contains(&"Export".to_string()));

        select(&mut app, "highways");
        assert_eq!(tool_names(&app).last().map(String::as_str), Some("Export"));
    }

    #[test]
    fn test_context_menu_items_stay_off_toolbar() {
        let config: Config = serde_json::from_str(
            r#"{ "items": [
                { "name": "Share", "target": "context-menu" },
                { "name": "Export" }
            ] }"#,
        )
        .unwrap();
        let app = App::with_document(document(), config);
        assert_eq!(app.external_items.len(), 2);
        let names = tool_names(&app);
        assert!(names.contains(&"Export".to_string()));
        assert!(!names.contains(&"Share".to_string()));
    }

    #[test]
    fn test_unknown_plugin_is_reported_and_skipped() {
        let config = Config {
            enabled_plugins: vec!["AddGroup".to_string(), "Teleport".to_string()],
            ..Config::default()
        };
        let app = App::with_document(document(), config);
        assert!(app.error.as_deref().is_some_and(|e| e.contains("Teleport")));
        assert_eq!(app.registry.len(), 1);
    }

    #[test]
    fn test_quit_flow() {
        let mut app = app();
        press(&mut app, KeyCode::Char('q'));
        assert_eq!(app.modals.top(), Some(&Modal::QuitConfirm));
        press(&mut app, KeyCode::Char('n'));
        assert!(!app.should_quit);

        press(&mut app, KeyCode::Char('q'));
        press(&mut app, KeyCode::Char('y'));
        assert!(app.should_quit);
    }
}

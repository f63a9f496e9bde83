//! Toolbar composition
//!
//! Merges built-in tools, registry capabilities and caller-supplied items,
//! then keeps the ones whose selector and eligibility rule pass for the
//! current selection. Composition is recomputed on every frame and keeps no
//! state between calls.

use super::layer::LayersState;
use super::selection::{SelectionState, SelectionStatus};
use super::tool::{BuiltinTool, Capability, ToolButton, ToolId, ToolItem, ToolKind, ToolTarget};
use tracing::{debug, warn};

/// Role allowed to edit layer metadata
pub const ADMIN_ROLE: &str = "ADMIN";

/// Facts about the session the eligibility rules depend on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ToolbarEnv {
    pub is_admin: bool,
    pub widget_builder_available: bool,
    /// Layers whose title and description can be edited
    pub updatable_layers: usize,
}

impl ToolbarEnv {
    pub fn new(layers: &LayersState, role: Option<&str>, widget_builder_available: bool) -> Self {
        Self {
            is_admin: role.is_some_and(|r| r.eq_ignore_ascii_case(ADMIN_ROLE)),
            widget_builder_available,
            updatable_layers: layers.updatable_layer_count(),
        }
    }
}

/// An item that passed every check, with its button rendered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleTool {
    pub id: ToolId,
    pub name: String,
    pub button: ToolButton,
}

/// The tools the TOC always offers, in toolbar order
pub fn builtin_items() -> Vec<ToolItem> {
    BuiltinTool::all().into_iter().map(ToolItem::builtin).collect()
}

/// Compose the toolbar: builtins, then registry items, then external items
pub fn compose(
    builtins: &[ToolItem],
    registry_items: &[ToolItem],
    external_items: &[ToolItem],
    selection: &SelectionState,
    env: &ToolbarEnv,
) -> Vec<VisibleTool> {
    compose_target(
        ToolTarget::Toolbar,
        builtins,
        registry_items,
        external_items,
        selection,
        env,
    )
}

/// Compose the items placed on `target`
pub fn compose_target(
    target: ToolTarget,
    builtins: &[ToolItem],
    registry_items: &[ToolItem],
    external_items: &[ToolItem],
    selection: &SelectionState,
    env: &ToolbarEnv,
) -> Vec<VisibleTool> {
    let visible: Vec<VisibleTool> = builtins
        .iter()
        .chain(registry_items)
        .chain(external_items)
        .filter(|item| item.target == target)
        .filter(|item| match item.is_selected_by(selection) {
            Ok(selected) => selected,
            Err(err) => {
                // A failing selector only hides its own item
                warn!(item = %item.name, error = %err, "Hiding tool after selector error");
                false
            }
        })
        .filter(|item| is_eligible(&item.kind, selection, env))
        .map(|item| VisibleTool {
            id: item.id(),
            name: item.name.clone(),
            button: item.render(selection),
        })
        .collect();

    debug!(
        placement = ?target,
        status = %selection.status,
        count = visible.len(),
        "Composed tools"
    );
    visible
}

/// Built-in visibility rule for each kind of item
pub fn is_eligible(kind: &ToolKind, selection: &SelectionState, env: &ToolbarEnv) -> bool {
    let single_layer = selection.single_layer();
    let single_group = selection.single_group().is_some();

    match kind {
        ToolKind::Builtin(BuiltinTool::ToggleAll) => true,
        ToolKind::Builtin(BuiltinTool::ZoomTo) | ToolKind::Builtin(BuiltinTool::Remove) => {
            single_layer.is_some() || single_group
        }
        ToolKind::Capability(Capability::AddLayer) | ToolKind::Capability(Capability::AddGroup) => {
            selection.status == SelectionStatus::None || single_group
        }
        ToolKind::Capability(Capability::UpdateLayerInfo) => {
            env.is_admin && env.updatable_layers > 0
        }
        ToolKind::Capability(Capability::FeatureGrid) => {
            single_layer.is_some_and(|l| l.is_queryable())
        }
        ToolKind::Capability(Capability::Settings) => single_layer.is_some() || single_group,
        ToolKind::Capability(Capability::FilterLayer) => {
            single_layer.is_some_and(|l| l.layer_type.supports_filter())
        }
        ToolKind::Capability(Capability::WidgetBuilder) => {
            env.widget_builder_available && single_layer.is_some_and(|l| l.is_queryable())
        }
        ToolKind::External => true,
    }
}

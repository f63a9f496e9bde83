//! Toolbar item descriptors
//!
//! A `ToolItem` pairs a visibility selector with a component that renders a
//! button. Components and selectors only ever see the derived
//! `SelectionState`, never the application state.

use super::selection::SelectionState;
use crate::error::ToolError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Where an item is placed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolTarget {
    #[default]
    Toolbar,
    ContextMenu,
}

/// Actions the TOC always provides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinTool {
    /// Show or hide every layer at once
    ToggleAll,
    ZoomTo,
    Remove,
}

impl BuiltinTool {
    pub fn all() -> [BuiltinTool; 3] {
        [BuiltinTool::ToggleAll, BuiltinTool::ZoomTo, BuiltinTool::Remove]
    }

    pub fn glyph(&self) -> &'static str {
        match self {
            BuiltinTool::ToggleAll => "eye-open",
            BuiltinTool::ZoomTo => "zoom-to",
            BuiltinTool::Remove => "trash",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BuiltinTool::ToggleAll => "Toggle layers",
            BuiltinTool::ZoomTo => "Zoom to",
            BuiltinTool::Remove => "Remove",
        }
    }
}

/// Actions contributed by collaborator plugins
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    AddLayer,
    AddGroup,
    UpdateLayerInfo,
    FeatureGrid,
    Settings,
    FilterLayer,
    WidgetBuilder,
}

impl Capability {
    pub fn glyph(&self) -> &'static str {
        match self {
            Capability::AddLayer => "add-layer",
            Capability::AddGroup => "add-folder",
            Capability::UpdateLayerInfo => "info-sign",
            Capability::FeatureGrid => "features-grid",
            Capability::Settings => "wrench",
            Capability::FilterLayer => "filter-layer",
            Capability::WidgetBuilder => "stats",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Capability::AddLayer => "Add layer",
            Capability::AddGroup => "Add group",
            Capability::UpdateLayerInfo => "Layer info",
            Capability::FeatureGrid => "Attributes",
            Capability::Settings => "Settings",
            Capability::FilterLayer => "Filter",
            Capability::WidgetBuilder => "Widgets",
        }
    }
}

/// Discriminates built-in, plugin-contributed and caller-supplied items
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolKind {
    Builtin(BuiltinTool),
    Capability(Capability),
    External,
}

/// Identifies an item when its button is activated
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ToolId {
    Builtin(BuiltinTool),
    Capability(Capability),
    External(String),
}

impl fmt::Display for ToolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolId::Builtin(tool) => write!(f, "{:?}", tool),
            ToolId::Capability(cap) => write!(f, "{:?}", cap),
            ToolId::External(name) => write!(f, "External({})", name),
        }
    }
}

/// A rendered toolbar button
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolButton {
    /// Stable key, unique within one toolbar
    pub key: String,
    /// Glyph name, mapped to a terminal symbol when drawn
    pub glyph: String,
    pub label: String,
}

impl ToolButton {
    pub fn new(key: &str, glyph: &str, label: &str) -> Self {
        Self {
            key: key.to_string(),
            glyph: glyph.to_string(),
            label: label.to_string(),
        }
    }
}

/// Renders an item's button from the derived selection
pub trait ToolComponent: Send + Sync {
    fn render(&self, input: &SelectionState) -> ToolButton;
}

impl<F> ToolComponent for F
where
    F: Fn(&SelectionState) -> ToolButton + Send + Sync,
{
    fn render(&self, input: &SelectionState) -> ToolButton {
        self(input)
    }
}

/// Component for items whose button does not depend on the selection
#[derive(Debug, Clone)]
pub struct IconButton(pub ToolButton);

impl ToolComponent for IconButton {
    fn render(&self, _input: &SelectionState) -> ToolButton {
        self.0.clone()
    }
}

pub type Selector = Arc<dyn Fn(&SelectionState) -> Result<bool, ToolError> + Send + Sync>;

/// An action that may be placed on the toolbar
#[derive(Clone)]
pub struct ToolItem {
    pub name: String,
    pub target: ToolTarget,
    pub kind: ToolKind,
    selector: Option<Selector>,
    component: Arc<dyn ToolComponent>,
}

impl ToolItem {
    pub fn builtin(tool: BuiltinTool) -> Self {
        let name = format!("{:?}", tool);
        Self {
            component: Arc::new(IconButton(ToolButton::new(&name, tool.glyph(), tool.label()))),
            name,
            target: ToolTarget::Toolbar,
            kind: ToolKind::Builtin(tool),
            selector: None,
        }
    }

    pub fn capability(capability: Capability) -> Self {
        let name = format!("{:?}", capability);
        Self {
            component: Arc::new(IconButton(ToolButton::new(
                &name,
                capability.glyph(),
                capability.label(),
            ))),
            name,
            target: ToolTarget::Toolbar,
            kind: ToolKind::Capability(capability),
            selector: None,
        }
    }

    /// An item supplied by the caller, placed on the toolbar by default
    pub fn external(name: &str, component: impl ToolComponent + 'static) -> Self {
        Self {
            name: name.to_string(),
            target: ToolTarget::Toolbar,
            kind: ToolKind::External,
            selector: None,
            component: Arc::new(component),
        }
    }

    pub fn with_target(mut self, target: ToolTarget) -> Self {
        self.target = target;
        self
    }

    pub fn with_selector<F>(self, selector: F) -> Self
    where
        F: Fn(&SelectionState) -> bool + Send + Sync + 'static,
    {
        self.with_fallible_selector(move |state| Ok(selector(state)))
    }

    pub fn with_fallible_selector<F>(mut self, selector: F) -> Self
    where
        F: Fn(&SelectionState) -> Result<bool, ToolError> + Send + Sync + 'static,
    {
        self.selector = Some(Arc::new(selector));
        self
    }

    pub fn has_selector(&self) -> bool {
        self.selector.is_some()
    }

    pub fn id(&self) -> ToolId {
        match &self.kind {
            ToolKind::Builtin(tool) => ToolId::Builtin(*tool),
            ToolKind::Capability(cap) => ToolId::Capability(*cap),
            ToolKind::External => ToolId::External(self.name.clone()),
        }
    }

    /// Evaluate the selector; items without one are always selected
    pub fn is_selected_by(&self, selection: &SelectionState) -> Result<bool, ToolError> {
        match &self.selector {
            Some(selector) => selector(selection),
            None => Ok(true),
        }
    }

    pub fn render(&self, selection: &SelectionState) -> ToolButton {
        self.component.render(selection)
    }
}

impl fmt::Debug for ToolItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolItem")
            .field("name", &self.name)
            .field("target", &self.target)
            .field("kind", &self.kind)
            .field("has_selector", &self.selector.is_some())
            .finish()
    }
}

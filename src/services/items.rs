//! External toolbar items declared in the user config

use crate::model::tool::IconButton;
use crate::model::{SelectionState, SelectionStatus, ToolButton, ToolItem, ToolTarget};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// When a declared item should be shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VisibleWhen {
    /// No selector at all
    #[default]
    Always,
    Never,
    /// Nothing selected
    None,
    Layer,
    Group,
    SingleLayer,
    SingleGroup,
}

impl VisibleWhen {
    pub fn matches(&self, selection: &SelectionState) -> bool {
        match self {
            VisibleWhen::Always => true,
            VisibleWhen::Never => false,
            VisibleWhen::None => selection.status == SelectionStatus::None,
            VisibleWhen::Layer => selection.status == SelectionStatus::Layer,
            VisibleWhen::Group => selection.status == SelectionStatus::Group,
            VisibleWhen::SingleLayer => selection.single_layer().is_some(),
            VisibleWhen::SingleGroup => selection.single_group().is_some(),
        }
    }
}

/// A toolbar button declared in the config file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalItemSpec {
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default = "default_glyph")]
    pub glyph: String,
    #[serde(default)]
    pub target: ToolTarget,
    #[serde(default)]
    pub visible_when: VisibleWhen,
}

fn default_glyph() -> String {
    "star".to_string()
}

impl ExternalItemSpec {
    pub fn to_item(&self) -> ToolItem {
        let label = self.label.as_deref().unwrap_or(&self.name);
        let button = ToolButton::new(&self.name, &self.glyph, label);
        let item = ToolItem::external(&self.name, IconButton(button)).with_target(self.target);
        match self.visible_when {
            VisibleWhen::Always => item,
            rule => item.with_selector(move |selection| rule.matches(selection)),
        }
    }
}

/// Turn declared items into toolbar items, keeping their order
pub fn build_external_items(specs: &[ExternalItemSpec]) -> Vec<ToolItem> {
    let items: Vec<ToolItem> = specs.iter().map(ExternalItemSpec::to_item).collect();
    debug!(count = items.len(), "Built external toolbar items");
    items
}

//! Selection resolution
//!
//! Turns the raw list of selected ids into the `{status, selected_groups,
//! selected_layers}` triple that toolbar selectors and components read.

use super::layer::{GroupNode, LayerNode, LayersState};
use std::collections::HashSet;
use std::fmt;

/// What kind of node the current selection targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionStatus {
    #[default]
    None,
    Layer,
    Group,
}

impl SelectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectionStatus::None => "NONE",
            SelectionStatus::Layer => "LAYER",
            SelectionStatus::Group => "GROUP",
        }
    }
}

impl fmt::Display for SelectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Selection derived from the layer tree for a single render pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionState {
    pub status: SelectionStatus,
    pub selected_groups: Vec<GroupNode>,
    pub selected_layers: Vec<LayerNode>,
}

impl SelectionState {
    /// Resolve selected ids against the layer and group lists.
    ///
    /// Ids that match nothing are dropped, so a stale selection resolves to
    /// an empty one. Both lists keep the order of `selected`.
    pub fn resolve(flat: &[LayerNode], groups: &[GroupNode], selected: &[String]) -> Self {
        let mut seen = HashSet::new();
        let mut selected_layers = Vec::new();
        let mut selected_groups = Vec::new();

        for id in selected {
            if !seen.insert(id.as_str()) {
                continue;
            }
            if let Some(layer) = flat.iter().find(|l| &l.id == id) {
                selected_layers.push(layer.clone());
            } else if let Some(group) = groups.iter().find(|g| &g.id == id) {
                selected_groups.push(group.clone());
            }
        }

        let status = if !selected_layers.is_empty() {
            SelectionStatus::Layer
        } else if !selected_groups.is_empty() {
            SelectionStatus::Group
        } else {
            SelectionStatus::None
        };

        Self {
            status,
            selected_groups,
            selected_layers,
        }
    }

    pub fn from_layers(layers: &LayersState) -> Self {
        Self::resolve(&layers.flat, &layers.groups, &layers.selected)
    }

    pub fn is_empty(&self) -> bool {
        self.selected_layers.is_empty() && self.selected_groups.is_empty()
    }

    /// The selected layer when exactly one layer and nothing else is selected
    pub fn single_layer(&self) -> Option<&LayerNode> {
        match (self.selected_layers.as_slice(), self.selected_groups.is_empty()) {
            ([layer], true) => Some(layer),
            _ => None,
        }
    }

    /// The selected group when exactly one group and nothing else is selected
    pub fn single_group(&self) -> Option<&GroupNode> {
        match (self.selected_groups.as_slice(), self.selected_layers.is_empty()) {
            ([group], true) => Some(group),
            _ => None,
        }
    }

    /// Id of the single selected node, layer or group
    pub fn single_node_id(&self) -> Option<&str> {
        self.single_layer()
            .map(|l| l.id.as_str())
            .or_else(|| self.single_group().map(|g| g.id.as_str()))
    }
}

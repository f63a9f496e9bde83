//! Layer tree data: layers, groups and the `layers` section of a map document

use crate::error::TocError;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Id of the implicit root group for layers without an explicit group
pub const DEFAULT_GROUP_ID: &str = "Default";

/// Id of the group holding background layers
pub const BACKGROUND_GROUP_ID: &str = "background";

/// Kind of data source behind a layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerType {
    Wms,
    Wmts,
    Wfs,
    Vector,
    TileProvider,
    Osm,
    Empty,
    #[serde(rename = "3dtiles")]
    ThreeDTiles,
    Terrain,
    Cog,
    #[serde(rename = "arcgis")]
    ArcGis,
    #[default]
    #[serde(other)]
    Unknown,
}

impl LayerType {
    pub fn name(&self) -> &'static str {
        match self {
            LayerType::Wms => "wms",
            LayerType::Wmts => "wmts",
            LayerType::Wfs => "wfs",
            LayerType::Vector => "vector",
            LayerType::TileProvider => "tileprovider",
            LayerType::Osm => "osm",
            LayerType::Empty => "empty",
            LayerType::ThreeDTiles => "3dtiles",
            LayerType::Terrain => "terrain",
            LayerType::Cog => "cog",
            LayerType::ArcGis => "arcgis",
            LayerType::Unknown => "unknown",
        }
    }

    /// Whether title and description of this kind of layer can be edited
    pub fn supports_metadata_update(&self) -> bool {
        matches!(
            self,
            LayerType::Wms
                | LayerType::Wmts
                | LayerType::Wfs
                | LayerType::Vector
                | LayerType::Cog
                | LayerType::ArcGis
                | LayerType::ThreeDTiles
        )
    }

    /// Whether a layer filter can be applied to this kind of layer
    pub fn supports_filter(&self) -> bool {
        matches!(self, LayerType::Wms | LayerType::Wfs | LayerType::Vector)
    }

    /// Whether features can be queried without a dedicated search service
    pub fn has_features(&self) -> bool {
        matches!(self, LayerType::Wfs | LayerType::Vector)
    }

    /// 3D-only sources are not drawn by the 2D map libraries
    pub fn supported_by(&self, map_type: MapType) -> bool {
        match self {
            LayerType::ThreeDTiles | LayerType::Terrain => map_type == MapType::Cesium,
            _ => true,
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            LayerType::Wms | LayerType::Wmts | LayerType::TileProvider | LayerType::Osm => "▦",
            LayerType::Wfs | LayerType::Vector => "◆",
            LayerType::ThreeDTiles | LayerType::Terrain => "▲",
            LayerType::Cog => "▣",
            LayerType::ArcGis => "◈",
            LayerType::Empty | LayerType::Unknown => "□",
        }
    }
}

/// Map library the viewer is running on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MapType {
    #[default]
    Openlayers,
    Leaflet,
    Cesium,
}

/// Search service attached to a layer (usually WFS)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchService {
    pub url: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub minx: f64,
    pub miny: f64,
    pub maxx: f64,
    pub maxy: f64,
}

impl Bounds {
    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds {
            minx: self.minx.min(other.minx),
            miny: self.miny.min(other.miny),
            maxx: self.maxx.max(other.maxx),
            maxy: self.maxy.max(other.maxy),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    #[serde(default)]
    pub crs: String,
    pub bounds: Bounds,
}

/// A single data layer in the TOC
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerNode {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub layer_type: LayerType,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default = "default_true")]
    pub visibility: bool,
    #[serde(default)]
    pub search: Option<SearchService>,
    #[serde(default)]
    pub bbox: Option<BoundingBox>,
}

fn default_true() -> bool {
    true
}

impl LayerNode {
    pub fn new(id: &str, title: &str, layer_type: LayerType) -> Self {
        Self {
            id: id.to_string(),
            title: Some(title.to_string()),
            name: None,
            layer_type,
            group: None,
            visibility: true,
            search: None,
            bbox: None,
        }
    }

    /// Title shown in the tree, falling back to the name and then the id
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .or(self.name.as_deref())
            .unwrap_or(&self.id)
    }

    pub fn is_background(&self) -> bool {
        self.group.as_deref() == Some(BACKGROUND_GROUP_ID)
    }

    /// Layers whose title and description an administrator may change
    pub fn is_updatable(&self) -> bool {
        !self.is_background() && self.layer_type.supports_metadata_update()
    }

    /// Layers whose features can be listed in a grid
    pub fn is_queryable(&self) -> bool {
        self.layer_type.has_features() || self.search.is_some()
    }
}

/// A folder of layers and nested groups
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupNode {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub nodes: Vec<String>,
    #[serde(default = "default_true")]
    pub expanded: bool,
}

impl GroupNode {
    pub fn new(id: &str, title: &str, nodes: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            name: None,
            nodes: nodes.iter().map(|n| n.to_string()).collect(),
            expanded: true,
        }
    }

    pub fn display_title(&self) -> &str {
        if !self.title.is_empty() {
            &self.title
        } else {
            self.name.as_deref().unwrap_or(&self.id)
        }
    }
}

/// Layers, groups and the current selection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayersState {
    #[serde(default)]
    pub flat: Vec<LayerNode>,
    #[serde(default)]
    pub groups: Vec<GroupNode>,
    #[serde(default)]
    pub selected: Vec<String>,
}

impl LayersState {
    pub fn layer(&self, id: &str) -> Option<&LayerNode> {
        self.flat.iter().find(|l| l.id == id)
    }

    pub fn group(&self, id: &str) -> Option<&GroupNode> {
        self.groups.iter().find(|g| g.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.flat.is_empty() && self.groups.is_empty()
    }

    /// Whether the tree has anything a filter could narrow down
    pub fn is_filterable(&self) -> bool {
        !self.flat.is_empty() || self.groups.iter().any(|g| !g.nodes.is_empty())
    }

    pub fn updatable_layer_count(&self) -> usize {
        self.flat.iter().filter(|l| l.is_updatable()).count()
    }

    /// Check the tree invariants, returning every violation found
    pub fn validate(&self) -> Vec<TocError> {
        let mut problems = Vec::new();
        let mut seen = HashSet::new();

        for id in self
            .flat
            .iter()
            .map(|l| &l.id)
            .chain(self.groups.iter().map(|g| &g.id))
        {
            if !seen.insert(id.as_str()) {
                problems.push(TocError::DuplicateId(id.clone()));
            }
        }

        let mut parents: HashMap<&str, &str> = HashMap::new();
        for group in &self.groups {
            for node in &group.nodes {
                if !seen.contains(node.as_str()) {
                    problems.push(TocError::DanglingNode {
                        group: group.id.clone(),
                        node: node.clone(),
                    });
                    continue;
                }
                if let Some(first) = parents.insert(node.as_str(), group.id.as_str()) {
                    problems.push(TocError::MultipleParents {
                        node: node.clone(),
                        first: first.to_string(),
                        second: group.id.clone(),
                    });
                }
            }
        }

        problems
    }

    /// Groups not listed as a child of any other group, in document order
    pub fn root_groups(&self) -> Vec<&GroupNode> {
        let children: HashSet<&str> = self
            .groups
            .iter()
            .flat_map(|g| g.nodes.iter().map(|n| n.as_str()))
            .collect();
        self.groups
            .iter()
            .filter(|g| !children.contains(g.id.as_str()))
            .collect()
    }

    /// Layers not listed by any group
    pub fn unlisted_layers(&self) -> Vec<&LayerNode> {
        let listed: HashSet<&str> = self
            .groups
            .iter()
            .flat_map(|g| g.nodes.iter().map(|n| n.as_str()))
            .collect();
        self.flat
            .iter()
            .filter(|l| !listed.contains(l.id.as_str()))
            .collect()
    }

    /// Group a layer is drawn under when no group lists it. Layers naming
    /// no group, or a group that does not exist, belong to the default
    /// group. Background layers stay with the background switcher.
    pub fn owner_of<'a>(&self, layer: &'a LayerNode) -> &'a str {
        match layer.group.as_deref() {
            Some(g) if g == BACKGROUND_GROUP_ID || self.group(g).is_some() => g,
            _ => DEFAULT_GROUP_ID,
        }
    }

    /// Ids of all layers below a group, depth first
    pub fn layer_ids_in(&self, group_id: &str) -> Vec<String> {
        let mut result = Vec::new();
        let mut visited = HashSet::new();
        self.collect_layer_ids(group_id, &mut visited, &mut result);
        result
    }

    fn collect_layer_ids(
        &self,
        group_id: &str,
        visited: &mut HashSet<String>,
        out: &mut Vec<String>,
    ) {
        if !visited.insert(group_id.to_string()) {
            return;
        }
        let Some(group) = self.group(group_id) else {
            return;
        };
        for node in &group.nodes {
            if self.layer(node).is_some() {
                out.push(node.clone());
            } else if self.group(node).is_some() {
                self.collect_layer_ids(node, visited, out);
            }
        }
        for layer in self.unlisted_layers() {
            if self.owner_of(layer) == group_id && !out.contains(&layer.id) {
                out.push(layer.id.clone());
            }
        }
    }

    /// Ids of all groups below a group (excluding itself)
    fn subgroup_ids(&self, group_id: &str) -> Vec<String> {
        let mut result = Vec::new();
        let mut stack = vec![group_id.to_string()];
        let mut visited = HashSet::new();
        while let Some(id) = stack.pop() {
            if !visited.insert(id.clone()) {
                continue;
            }
            if let Some(group) = self.group(&id) {
                for node in &group.nodes {
                    if self.group(node).is_some() {
                        result.push(node.clone());
                        stack.push(node.clone());
                    }
                }
            }
        }
        result
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Edits
    // ─────────────────────────────────────────────────────────────────────────

    /// Add or remove a node from the selection, keeping selection order
    pub fn toggle_selected(&mut self, id: &str) {
        if let Some(pos) = self.selected.iter().position(|s| s == id) {
            self.selected.remove(pos);
        } else {
            self.selected.push(id.to_string());
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    pub fn all_visible(&self) -> bool {
        self.flat.iter().all(|l| l.visibility)
    }

    pub fn set_all_visibility(&mut self, visible: bool) {
        for layer in &mut self.flat {
            layer.visibility = visible;
        }
    }

    /// Flip visibility of one layer, returning the new value
    pub fn toggle_visibility(&mut self, layer_id: &str) -> Option<bool> {
        let layer = self.flat.iter_mut().find(|l| l.id == layer_id)?;
        layer.visibility = !layer.visibility;
        Some(layer.visibility)
    }

    /// Expand or collapse a group, returning the new value
    pub fn toggle_expanded(&mut self, group_id: &str) -> Option<bool> {
        let group = self.groups.iter_mut().find(|g| g.id == group_id)?;
        group.expanded = !group.expanded;
        Some(group.expanded)
    }

    /// Remove a layer, or a group with everything below it.
    /// Returns the number of nodes removed.
    pub fn remove_node(&mut self, id: &str) -> usize {
        let mut doomed: HashSet<String> = HashSet::new();
        if self.group(id).is_some() {
            doomed.extend(self.layer_ids_in(id));
            doomed.extend(self.subgroup_ids(id));
            doomed.insert(id.to_string());
        } else if self.layer(id).is_some() {
            doomed.insert(id.to_string());
        } else {
            return 0;
        }

        self.flat.retain(|l| !doomed.contains(&l.id));
        self.groups.retain(|g| !doomed.contains(&g.id));
        for group in &mut self.groups {
            group.nodes.retain(|n| !doomed.contains(n));
        }
        self.selected.retain(|s| !doomed.contains(s));
        doomed.len()
    }

    /// Append a new empty group, nested in `parent` when given.
    /// Returns the id of the new group.
    pub fn add_group(&mut self, parent: Option<&str>, title: &str) -> String {
        let mut n = 1;
        let id = loop {
            let base = format!("group_{}", n);
            let candidate = match parent {
                Some(p) => format!("{}.{}", p, base),
                None => base,
            };
            if self.layer(&candidate).is_none() && self.group(&candidate).is_none() {
                break candidate;
            }
            n += 1;
        };

        self.groups.push(GroupNode::new(&id, title, &[]));
        if let Some(parent_id) = parent {
            if let Some(parent) = self.groups.iter_mut().find(|g| g.id == parent_id) {
                parent.nodes.push(id.clone());
                parent.expanded = true;
            }
        }
        id
    }

    /// Bounding box of a layer, or the union of a group's layer extents
    pub fn extent_of(&self, id: &str) -> Option<BoundingBox> {
        if let Some(layer) = self.layer(id) {
            return layer.bbox.clone();
        }
        self.layer_ids_in(id)
            .iter()
            .filter_map(|layer_id| self.layer(layer_id).and_then(|l| l.bbox.clone()))
            .reduce(|acc, bbox| BoundingBox {
                crs: acc.crs,
                bounds: acc.bounds.union(&bbox.bounds),
            })
    }
}

//! Map document loading
//!
//! A map document is the slice of viewer state the TOC reads: the layer
//! tree, the map library, the user's role and the widget builder flag.

use crate::error::TocError;
use crate::model::{LayersState, MapType, ToolbarEnv};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapDocument {
    #[serde(default)]
    pub layers: LayersState,
    #[serde(default, alias = "maptype")]
    pub map_type: MapTypeSection,
    #[serde(default)]
    pub security: SecuritySection,
    #[serde(default)]
    pub controls: ControlsSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapTypeSection {
    #[serde(default)]
    pub map_type: MapType,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecuritySection {
    #[serde(default)]
    pub user: Option<UserInfo>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlsSection {
    #[serde(default)]
    pub widget_builder: Option<WidgetBuilderControl>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WidgetBuilderControl {
    #[serde(default)]
    pub available: bool,
}

impl MapDocument {
    pub fn map_type(&self) -> MapType {
        self.map_type.map_type
    }

    pub fn role(&self) -> Option<&str> {
        self.security.user.as_ref().and_then(|u| u.role.as_deref())
    }

    pub fn widget_builder_available(&self) -> bool {
        self.controls
            .widget_builder
            .as_ref()
            .is_some_and(|w| w.available)
    }

    /// Session facts for the toolbar, with an optional role taking the
    /// place of the one in the document
    pub fn toolbar_env(&self, role_override: Option<&str>) -> ToolbarEnv {
        ToolbarEnv::new(
            &self.layers,
            role_override.or(self.role()),
            self.widget_builder_available(),
        )
    }
}

/// Parse a map document; `.yaml`/`.yml` files are read as YAML, anything
/// else as JSON
pub fn parse_map_document(contents: &str, yaml: bool) -> Result<MapDocument, TocError> {
    let document = if yaml {
        serde_yaml::from_str(contents)?
    } else {
        serde_json::from_str(contents)?
    };
    Ok(document)
}

/// Load a map document from disk, logging tree inconsistencies
pub fn load_map_document<P: AsRef<Path>>(path: P) -> Result<MapDocument, TocError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    let yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    let document = parse_map_document(&contents, yaml)?;

    for problem in document.layers.validate() {
        warn!(path = %path.display(), "{}", problem);
    }
    info!(
        path = %path.display(),
        layers = document.layers.flat.len(),
        groups = document.layers.groups.len(),
        map_type = ?document.map_type(),
        "Loaded map document"
    );

    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{Builder, NamedTempFile};

    fn temp_file(suffix: &str, contents: &str) -> NamedTempFile {
        let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    const SAMPLE: &str = r#"{
        "layers": {
            "flat": [
                { "id": "layer_01", "title": "Rivers", "type": "wms" },
                { "id": "layer_02", "title": "Tiles", "type": "3dtiles" }
            ],
            "groups": [{ "id": "Default", "title": "Default", "nodes": ["layer_01", "layer_02"] }],
            "selected": ["layer_01"]
        },
        "maptype": { "mapType": "cesium" },
        "security": { "user": { "name": "admin", "role": "ADMIN" } },
        "controls": { "widgetBuilder": { "available": true } }
    }"#;

    #[test]
    fn test_parse_full_document() {
        let doc = parse_map_document(SAMPLE, false).unwrap();
        assert_eq!(doc.layers.flat.len(), 2);
        assert_eq!(doc.map_type(), MapType::Cesium);
        assert_eq!(doc.role(), Some("ADMIN"));
        assert!(doc.widget_builder_available());

        let env = doc.toolbar_env(None);
        assert!(env.is_admin);
        assert!(env.widget_builder_available);
        assert_eq!(env.updatable_layers, 2);
    }

    #[test]
    fn test_missing_sections_default() {
        let doc = parse_map_document("{}", false).unwrap();
        assert!(doc.layers.is_empty());
        assert_eq!(doc.map_type(), MapType::Openlayers);
        assert_eq!(doc.role(), None);
        assert!(!doc.widget_builder_available());
    }

    #[test]
    fn test_role_override_wins() {
        let doc = parse_map_document(SAMPLE, false).unwrap();
        assert!(!doc.toolbar_env(Some("USER")).is_admin);
    }

    #[test]
    fn test_load_json_and_yaml_files() {
        let json_file = temp_file(".json", SAMPLE);
        let doc = load_map_document(json_file.path()).unwrap();
        assert_eq!(doc.layers.selected, vec!["layer_01"]);

        let yaml = "layers:\n  flat:\n    - id: a\n      type: wfs\n  groups: []\nmapType:\n  mapType: leaflet\n";
        let yaml_file = temp_file(".yaml", yaml);
        let doc = load_map_document(yaml_file.path()).unwrap();
        assert_eq!(doc.map_type(), MapType::Leaflet);
        assert_eq!(doc.layers.flat[0].id, "a");
    }

    #[test]
    fn test_load_errors() {
        assert!(matches!(
            load_map_document("/definitely/not/here.json"),
            Err(TocError::Io(_))
        ));
        assert!(matches!(
            parse_map_document("{ not json", false),
            Err(TocError::MapDocument(_))
        ));
    }
}

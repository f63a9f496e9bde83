use crate::error::TocError;
use crate::model::Collaborator;
use crate::services::ExternalItemSpec;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Map document opened when none is given on the command line
    #[serde(default)]
    pub last_map_path: Option<String>,
    /// Collaborator plugins enabled next to the TOC, in toolbar order
    #[serde(default = "default_plugins")]
    pub enabled_plugins: Vec<String>,
    /// Extra toolbar buttons
    #[serde(default)]
    pub items: Vec<ExternalItemSpec>,
    /// Role used instead of the one in the map document
    #[serde(default)]
    pub role_override: Option<String>,
}

fn default_plugins() -> Vec<String> {
    Collaborator::defaults()
        .iter()
        .map(|c| c.name().to_string())
        .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            last_map_path: None,
            enabled_plugins: default_plugins(),
            items: Vec::new(),
            role_override: None,
        }
    }
}

impl Config {
    pub fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("map-toc"))
    }

    fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("config.json"))
    }

    pub fn load() -> Option<Config> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Option<Config> {
        if !path.exists() {
            return None;
        }

        let contents = fs::read_to_string(path).ok()?;
        match serde_json::from_str(&contents) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable config");
                None
            }
        }
    }

    /// Save the config to disk
    pub fn save(&self) -> anyhow::Result<()> {
        let config_dir = Self::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        self.save_to(&config_dir.join("config.json"))
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(dir) = path.parent() {
            if !dir.exists() {
                fs::create_dir_all(dir)?;
            }
        }

        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)?;

        Ok(())
    }

    /// Enabled collaborators; an unknown plugin name is an error
    pub fn collaborators(&self) -> Result<Vec<Collaborator>, TocError> {
        Collaborator::parse_list(&self.enabled_plugins)
    }
}

//! Capability registry
//!
//! Collaborator plugins contribute at most one TOC tool each. Instead of
//! probing plugin modules for an export, every collaborator is listed here
//! with the capability it brings, and the registry is built from the list of
//! enabled collaborators.

use super::tool::{Capability, ToolItem};
use crate::error::TocError;
use std::str::FromStr;

/// Plugins that may sit next to the TOC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collaborator {
    MetadataExplorer,
    AddGroup,
    LayerInfo,
    FeatureEditor,
    TocItemsSettings,
    FilterLayer,
    WidgetsBuilder,
    Identify,
    Measure,
}

impl Collaborator {
    pub fn all() -> Vec<Collaborator> {
        vec![
            Collaborator::MetadataExplorer,
            Collaborator::AddGroup,
            Collaborator::LayerInfo,
            Collaborator::FeatureEditor,
            Collaborator::TocItemsSettings,
            Collaborator::FilterLayer,
            Collaborator::WidgetsBuilder,
            Collaborator::Identify,
            Collaborator::Measure,
        ]
    }

    /// Collaborators enabled when the user has not configured any
    pub fn defaults() -> Vec<Collaborator> {
        Self::all()
            .into_iter()
            .filter(|c| c.toc_capability().is_some())
            .collect()
    }

    pub fn name(&self) -> &'static str {
        match self {
            Collaborator::MetadataExplorer => "MetadataExplorer",
            Collaborator::AddGroup => "AddGroup",
            Collaborator::LayerInfo => "LayerInfo",
            Collaborator::FeatureEditor => "FeatureEditor",
            Collaborator::TocItemsSettings => "TOCItemsSettings",
            Collaborator::FilterLayer => "FilterLayer",
            Collaborator::WidgetsBuilder => "WidgetsBuilder",
            Collaborator::Identify => "Identify",
            Collaborator::Measure => "Measure",
        }
    }

    /// The capability this collaborator adds to the TOC, if any
    pub fn toc_capability(&self) -> Option<Capability> {
        match self {
            Collaborator::MetadataExplorer => Some(Capability::AddLayer),
            Collaborator::AddGroup => Some(Capability::AddGroup),
            Collaborator::LayerInfo => Some(Capability::UpdateLayerInfo),
            Collaborator::FeatureEditor => Some(Capability::FeatureGrid),
            Collaborator::TocItemsSettings => Some(Capability::Settings),
            Collaborator::FilterLayer => Some(Capability::FilterLayer),
            Collaborator::WidgetsBuilder => Some(Capability::WidgetBuilder),
            Collaborator::Identify | Collaborator::Measure => None,
        }
    }

    pub fn toc_item(&self) -> Option<ToolItem> {
        self.toc_capability().map(ToolItem::capability)
    }

    /// Parse a list of plugin names, failing on the first unknown one
    pub fn parse_list<S: AsRef<str>>(names: &[S]) -> Result<Vec<Collaborator>, TocError> {
        names.iter().map(|n| n.as_ref().parse()).collect()
    }
}

impl FromStr for Collaborator {
    type Err = TocError;

    /// Accepts `AddGroup`, `AddGroupPlugin` and any casing of either
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let lower = trimmed.to_ascii_lowercase();
        let base = lower.strip_suffix("plugin").unwrap_or(&lower);
        Collaborator::all()
            .into_iter()
            .find(|c| c.name().to_ascii_lowercase() == base)
            .ok_or_else(|| TocError::UnknownCollaborator(trimmed.to_string()))
    }
}

/// Ordered TOC contributions of the enabled collaborators
#[derive(Debug, Default, Clone)]
pub struct CapabilityRegistry {
    entries: Vec<(Collaborator, ToolItem)>,
}

impl CapabilityRegistry {
    /// Build the registry in the order given, skipping collaborators that
    /// contribute nothing and collaborators listed twice
    pub fn from_enabled(enabled: &[Collaborator]) -> Self {
        let mut registry = Self::default();
        for collaborator in enabled {
            registry.register(*collaborator);
        }
        registry
    }

    pub fn register(&mut self, collaborator: Collaborator) {
        if self.entries.iter().any(|(c, _)| *c == collaborator) {
            return;
        }
        if let Some(item) = collaborator.toc_item() {
            self.entries.push((collaborator, item));
        }
    }

    pub fn items(&self) -> Vec<ToolItem> {
        self.entries.iter().map(|(_, item)| item.clone()).collect()
    }

    pub fn is_registered(&self, capability: Capability) -> bool {
        self.entries
            .iter()
            .any(|(c, _)| c.toc_capability() == Some(capability))
    }

    pub fn collaborators(&self) -> Vec<Collaborator> {
        self.entries.iter().map(|(c, _)| *c).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tool::ToolKind;

    #[test]
    fn test_registry_follows_enabled_order() {
        let registry = CapabilityRegistry::from_enabled(&[
            Collaborator::MetadataExplorer,
            Collaborator::AddGroup,
            Collaborator::LayerInfo,
        ]);

        let kinds: Vec<ToolKind> = registry.items().into_iter().map(|i| i.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ToolKind::Capability(Capability::AddLayer),
                ToolKind::Capability(Capability::AddGroup),
                ToolKind::Capability(Capability::UpdateLayerInfo),
            ]
        );
    }

    #[test]
    fn test_collaborators_without_contribution_are_skipped() {
        let registry = CapabilityRegistry::from_enabled(&[
            Collaborator::Identify,
            Collaborator::FilterLayer,
            Collaborator::Measure,
        ]);
        assert_eq!(registry.len(), 1);
        assert!(registry.is_registered(Capability::FilterLayer));
        assert!(!registry.is_registered(Capability::AddLayer));
    }

    #[test]
    fn test_duplicates_register_once() {
        let registry =
            CapabilityRegistry::from_enabled(&[Collaborator::AddGroup, Collaborator::AddGroup]);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_parse_plugin_names() {
        assert_eq!("AddGroup".parse::<Collaborator>().unwrap(), Collaborator::AddGroup);
        assert_eq!(
            "TOCItemsSettingsPlugin".parse::<Collaborator>().unwrap(),
            Collaborator::TocItemsSettings
        );
        assert_eq!(
            " widgetsbuilder ".parse::<Collaborator>().unwrap(),
            Collaborator::WidgetsBuilder
        );
        assert!(matches!(
            "Timeline".parse::<Collaborator>(),
            Err(TocError::UnknownCollaborator(name)) if name == "Timeline"
        ));
    }

    #[test]
    fn test_parse_list_fails_on_unknown() {
        assert_eq!(
            Collaborator::parse_list(&["FeatureEditor", "LayerInfo"]).unwrap(),
            vec![Collaborator::FeatureEditor, Collaborator::LayerInfo]
        );
        assert!(Collaborator::parse_list(&["FeatureEditor", "Nope"]).is_err());
    }

    #[test]
    fn test_defaults_only_contributors() {
        let defaults = Collaborator::defaults();
        assert_eq!(defaults.len(), 7);
        assert!(!defaults.contains(&Collaborator::Identify));
    }
}

//! Error types for the TOC model and services

use thiserror::Error;

/// Errors raised while loading, validating or filtering the layer tree
#[derive(Debug, Error)]
pub enum TocError {
    /// A plugin name in the configuration does not match any collaborator
    #[error("Unknown collaborator plugin: {0}")]
    UnknownCollaborator(String),

    /// A group lists a child id that is neither a layer nor a group
    #[error("Group '{group}' references missing node '{node}'")]
    DanglingNode { group: String, node: String },

    /// Two nodes share the same id
    #[error("Duplicate node id: {0}")]
    DuplicateId(String),

    /// A node is listed by more than one group
    #[error("Node '{node}' is listed by both '{first}' and '{second}'")]
    MultipleParents {
        node: String,
        first: String,
        second: String,
    },

    /// The filter text is not a valid pattern
    #[error("Invalid filter pattern: {0}")]
    InvalidFilter(#[from] regex::Error),

    /// The map document could not be parsed
    #[error("Failed to parse map document: {0}")]
    MapDocument(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for TocError {
    fn from(err: serde_json::Error) -> Self {
        TocError::MapDocument(err.to_string())
    }
}

impl From<serde_yaml::Error> for TocError {
    fn from(err: serde_yaml::Error) -> Self {
        TocError::MapDocument(err.to_string())
    }
}

/// Errors a toolbar item's selector may report
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolError {
    /// The selector could not decide visibility for this frame
    #[error("Selector for '{item}' failed: {reason}")]
    Selector { item: String, reason: String },
}

//! Services for loading data the TOC works on
//!
//! - Map document loading and parsing
//! - External toolbar items declared in the config

pub mod items;
pub mod map_state;

pub use items::{build_external_items, ExternalItemSpec, VisibleWhen};
pub use map_state::{load_map_document, MapDocument};

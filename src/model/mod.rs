//! Model layer - layer tree data and the toolbar protocol
//!
//! This module contains the state-related types:
//! - `LayersState` - Layers, groups and the raw selection
//! - `SelectionState` - Selection derived for one render pass
//! - `ToolItem` / `CapabilityRegistry` - Toolbar item descriptors
//! - `compose` - Visible toolbar for a selection
//! - `ModalStack` - Modal overlay management

pub mod capability;
pub mod layer;
pub mod modal;
pub mod selection;
pub mod tool;
pub mod toolbar;
pub mod ui;

// Re-export commonly used types
pub use capability::{CapabilityRegistry, Collaborator};
pub use layer::{
    BoundingBox, GroupNode, LayerNode, LayerType, LayersState, MapType, DEFAULT_GROUP_ID,
};
pub use modal::{Modal, ModalStack};
pub use selection::{SelectionState, SelectionStatus};
pub use tool::{
    BuiltinTool, Capability, ToolButton, ToolComponent, ToolId, ToolItem, ToolKind, ToolTarget,
};
pub use toolbar::{builtin_items, compose, ToolbarEnv, VisibleTool};
pub use ui::Focus;

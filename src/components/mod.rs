//! UI Components
//!
//! Each component encapsulates its own state, event handling, and rendering logic.
//! Components communicate through Actions rather than direct state mutation.

pub mod confirm_dialog;
pub mod filter;
pub mod help_dialog;
pub mod layout;
pub mod panel;
pub mod toolbar;
pub mod tree;

pub use confirm_dialog::ConfirmDialog;
pub use filter::{FilterComponent, FilterMatcher};
pub use help_dialog::HelpDialog;
pub use layout::{calculate_toc_layout, centered_popup};
pub use panel::{draw_toc_screen, TocRenderContext};
pub use toolbar::{tool_title, ToolbarComponent};
pub use tree::{NodeContext, NodeView, TreeComponent, TreeRow};

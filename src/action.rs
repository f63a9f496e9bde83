//! Action enum - All possible application actions
//!
//! Components emit Actions in response to events, and the App processes
//! them to update state.

use crate::model::ToolId;
use std::fmt;

/// All possible actions in the application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    // ─────────────────────────────────────────────────────────────────────────
    // App Lifecycle
    // ─────────────────────────────────────────────────────────────────────────
    /// Regular tick for time-based updates
    Tick,
    /// Terminal was resized
    Resize(u16, u16),
    /// Force quit without confirmation
    ForceQuit,
    /// Read the map document from disk again
    ReloadMap,

    // ─────────────────────────────────────────────────────────────────────────
    // Tree Navigation
    // ─────────────────────────────────────────────────────────────────────────
    NextItem,
    PrevItem,
    FirstItem,
    LastItem,

    // ─────────────────────────────────────────────────────────────────────────
    // Selection & Tree Edits
    // ─────────────────────────────────────────────────────────────────────────
    /// Add or remove the node under the cursor from the selection
    ToggleNodeSelection,
    ClearSelection,
    /// Expand or collapse the group under the cursor
    ToggleExpanded,
    /// Show or hide the layer under the cursor
    ToggleVisibility,

    // ─────────────────────────────────────────────────────────────────────────
    // Toolbar
    // ─────────────────────────────────────────────────────────────────────────
    FocusToolbar,
    FocusTree,
    NextTool,
    PrevTool,
    /// Invoke the tool under the toolbar cursor
    ActivateTool,
    InvokeTool(ToolId),

    // ─────────────────────────────────────────────────────────────────────────
    // Filter
    // ─────────────────────────────────────────────────────────────────────────
    EnterFilterMode,
    ExitFilterMode,
    FilterInput(char),
    FilterBackspace,
    ClearFilter,

    // ─────────────────────────────────────────────────────────────────────────
    // Modals
    // ─────────────────────────────────────────────────────────────────────────
    OpenQuitDialog,
    /// Open help dialog showing all keyboard shortcuts
    OpenHelp,
    /// Close the current modal
    CloseModal,
    /// Confirm the current modal action
    ConfirmModal,
    ScrollUp,
    ScrollDown,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Tick => write!(f, "Tick"),
            Action::Resize(w, h) => write!(f, "Resize({}, {})", w, h),
            Action::ForceQuit => write!(f, "ForceQuit"),
            Action::ReloadMap => write!(f, "ReloadMap"),
            Action::NextItem => write!(f, "NextItem"),
            Action::PrevItem => write!(f, "PrevItem"),
            Action::FirstItem => write!(f, "FirstItem"),
            Action::LastItem => write!(f, "LastItem"),
            Action::ToggleNodeSelection => write!(f, "ToggleNodeSelection"),
            Action::ClearSelection => write!(f, "ClearSelection"),
            Action::ToggleExpanded => write!(f, "ToggleExpanded"),
            Action::ToggleVisibility => write!(f, "ToggleVisibility"),
            Action::FocusToolbar => write!(f, "FocusToolbar"),
            Action::FocusTree => write!(f, "FocusTree"),
            Action::NextTool => write!(f, "NextTool"),
            Action::PrevTool => write!(f, "PrevTool"),
            Action::ActivateTool => write!(f, "ActivateTool"),
            Action::InvokeTool(id) => write!(f, "InvokeTool({})", id),
            Action::EnterFilterMode => write!(f, "EnterFilterMode"),
            Action::ExitFilterMode => write!(f, "ExitFilterMode"),
            Action::FilterInput(c) => write!(f, "FilterInput('{}')", c),
            Action::FilterBackspace => write!(f, "FilterBackspace"),
            Action::ClearFilter => write!(f, "ClearFilter"),
            Action::OpenQuitDialog => write!(f, "OpenQuitDialog"),
            Action::OpenHelp => write!(f, "OpenHelp"),
            Action::CloseModal => write!(f, "CloseModal"),
            Action::ConfirmModal => write!(f, "ConfirmModal"),
            Action::ScrollUp => write!(f, "ScrollUp"),
            Action::ScrollDown => write!(f, "ScrollDown"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BuiltinTool;

    #[test]
    fn test_action_display() {
        assert_eq!(Action::FilterInput('x').to_string(), "FilterInput('x')");
        assert_eq!(
            Action::InvokeTool(ToolId::Builtin(BuiltinTool::Remove)).to_string(),
            "InvokeTool(Remove)"
        );
        assert_eq!(
            Action::InvokeTool(ToolId::External("Export".to_string())).to_string(),
            "InvokeTool(External(Export))"
        );
    }
}

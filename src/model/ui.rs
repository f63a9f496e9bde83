//! UI state - presentation state separate from the layer data

/// Which part of the panel receives navigation keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Tree,
    Toolbar,
    Filter,
}

impl Focus {
    pub fn name(&self) -> &str {
        match self {
            Focus::Tree => "Tree",
            Focus::Toolbar => "Toolbar",
            Focus::Filter => "Filter",
        }
    }
}

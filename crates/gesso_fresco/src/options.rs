//! Optimizer options.

use serde::{Deserialize, Serialize};

/// Options for one optimization traversal
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizeOptions {
    /// Before committing a fully folded component literal, re-serialize the
    /// static subtree and compare. On mismatch the component falls back to
    /// its original render function instead of the literal.
    #[serde(default = "default_true")]
    pub validate_static: bool,
}

fn default_true() -> bool {
    true
}

impl Default for OptimizeOptions {
    fn default() -> Self {
        Self {
            validate_static: true,
        }
    }
}

//! Validation configuration
//!
//! Policies that change how a run treats certain findings. Loaded from
//! TOML; every key is optional.
//!
//! ```toml
//! name_collision = "error"    # warning | error | fatal
//! unresolved_type = "fatal"
//! traversal = "reverse"       # forward | reverse
//! check_names = true
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::diagnostic::Severity;
use crate::error::{BindError, Result};
use crate::tree::NodeId;

/// Sibling order used by both phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraversalOrder {
    /// Declaration order
    #[default]
    Forward,
    /// Reverse declaration order
    Reverse,
}

impl TraversalOrder {
    /// Children in visiting order
    pub fn arrange(self, children: &[NodeId]) -> Vec<NodeId> {
        match self {
            TraversalOrder::Forward => children.to_vec(),
            TraversalOrder::Reverse => children.iter().rev().copied().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidationConfig {
    /// Severity of two siblings sharing a name in one namespace
    pub name_collision: Severity,

    /// Severity of a declared type the resolver does not know
    pub unresolved_type: Severity,

    pub traversal: TraversalOrder,

    /// Check element and attribute names against XML name rules
    pub check_names: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            name_collision: Severity::Error,
            unresolved_type: Severity::Error,
            traversal: TraversalOrder::Forward,
            check_names: true,
        }
    }
}

impl ValidationConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| BindError::Config {
            reason: format!("Failed to parse config: {}", e),
        })
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| BindError::Config {
            reason: format!("Failed to read config file {:?}: {}", path, e),
        })?;
        Self::from_toml_str(&content)
    }

    pub fn with_traversal(mut self, traversal: TraversalOrder) -> Self {
        self.traversal = traversal;
        self
    }

    pub fn with_name_collision(mut self, severity: Severity) -> Self {
        self.name_collision = severity;
        self
    }

    pub fn with_unresolved_type(mut self, severity: Severity) -> Self {
        self.unresolved_type = severity;
        self
    }
}

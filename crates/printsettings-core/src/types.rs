use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use uuid::Uuid;

pub type NodeId = Uuid;
pub type RelationId = Uuid;

/// Setting field whose expression drives visibility relations.
pub const ENABLED_FIELD: &str = "enabled";

/// Metadata key and value that mark a machine definition container.
pub const CONTAINER_TYPE_KEY: &str = "type";
pub const MACHINE_CONTAINER_TYPE: &str = "machine";

/// Persisted preference gating the bundled example fragment.
pub const SHOW_EXAMPLE_PREFERENCE: &str = "printsettingappender/show_example";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationType {
    /// The owner needs the target to evaluate its property.
    RequiresTarget,
    /// The target's property depends on the owner.
    RequiredByTarget,
}

impl fmt::Display for RelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RelationType::RequiresTarget => "requires_target",
            RelationType::RequiredByTarget => "required_by_target",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for RelationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "requires_target" | "requirestarget" => Ok(RelationType::RequiresTarget),
            "required_by_target" | "requiredbytarget" => Ok(RelationType::RequiredByTarget),
            other => Err(format!("unknown relation type: {}", other)),
        }
    }
}

/// What a host container holds; only definition containers receive settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContainerKind {
    Definition,
    Instance,
    Stack,
}

/// A setting together with the keys its `enabled` expression refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyPair {
    pub dependent: String,
    pub requirements: Vec<String>,
}

impl DependencyPair {
    pub fn new<S: Into<String>>(dependent: S, requirements: Vec<String>) -> Self {
        Self {
            dependent: dependent.into(),
            requirements,
        }
    }
}

impl fmt::Display for DependencyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "('{}', [", self.dependent)?;
        for (i, req) in self.requirements.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "'{}'", req)?;
        }
        write!(f, "])")
    }
}

/// One parsed `*.appendable.json` file.
///
/// Maps category keys to category objects, each carrying a `children` map of
/// setting objects. The JSON is kept as parsed so hosts receive every property
/// the plugin declared, in document order.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub path: PathBuf,
    pub plugin: String,
    pub categories: Map<String, Value>,
}

impl Fragment {
    pub fn new<S: Into<String>>(path: PathBuf, plugin: S, categories: Map<String, Value>) -> Self {
        Self {
            path,
            plugin: plugin.into(),
            categories,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
    }

    pub fn category_keys(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }
}

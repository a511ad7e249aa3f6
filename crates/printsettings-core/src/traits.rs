use crate::{ContainerKind, Fragment, Result, SettingDefinition};
use std::sync::Arc;

/// A host container that can receive setting definitions.
pub trait SettingContainer: Send + Sync {
    fn id(&self) -> &str;
    fn name(&self) -> &str;
    fn kind(&self) -> ContainerKind;
    fn metadata_entry(&self, key: &str) -> Option<String>;

    /// Add every category and setting of `fragment` to this container's graph.
    fn append_setting_definitions(&self, fragment: &Fragment) -> Result<()>;

    /// All definitions registered under `key`, in registration order.
    fn find_definitions(&self, key: &str) -> Vec<Arc<SettingDefinition>>;
}

/// Host lookup from container id to the loaded container instances.
pub trait ContainerRegistry: Send + Sync {
    fn find_containers(&self, id: &str) -> Vec<Arc<dyn SettingContainer>>;
}

/// Persisted boolean preferences owned by the host.
pub trait PreferenceStore: Send + Sync {
    /// Register `key` with a default; an already persisted value is kept.
    fn add_preference(&self, key: &str, default: bool);
    fn get_bool(&self, key: &str) -> Option<bool>;
    fn set_bool(&self, key: &str, value: bool) -> Result<()>;
}

use dashmap::DashMap;
use parking_lot::RwLock;
use printsettings_core::{
    AppenderError, ContainerKind, ContainerRegistry, Fragment, Result, SettingContainer,
    SettingDefinition, CONTAINER_TYPE_KEY, MACHINE_CONTAINER_TYPE,
};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Default)]
struct DefinitionIndex {
    nodes: Vec<Arc<SettingDefinition>>,
    by_key: HashMap<String, Vec<Arc<SettingDefinition>>>,
}

impl DefinitionIndex {
    fn insert(&mut self, node: Arc<SettingDefinition>) {
        self.by_key
            .entry(node.key.clone())
            .or_default()
            .push(node.clone());
        self.nodes.push(node);
    }
}

/// In-memory setting-definition container for embedding hosts and tests.
///
/// Definitions are flattened: every category and nested setting becomes a
/// node addressable by key, with its parent key recorded on the node.
#[derive(Debug)]
pub struct DefinitionContainer {
    id: String,
    name: String,
    kind: ContainerKind,
    metadata: HashMap<String, String>,
    index: RwLock<DefinitionIndex>,
}

impl DefinitionContainer {
    pub fn new<S: Into<String>>(id: S, name: S, kind: ContainerKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            metadata: HashMap::new(),
            index: RwLock::new(DefinitionIndex::default()),
        }
    }

    /// A definition container tagged `type = machine`.
    pub fn machine<S: Into<String>>(id: S, name: S) -> Self {
        Self::new(id, name, ContainerKind::Definition)
            .with_metadata(CONTAINER_TYPE_KEY, MACHINE_CONTAINER_TYPE)
    }

    pub fn with_metadata<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn with_definition(self, definition: SettingDefinition) -> Self {
        self.index.write().insert(Arc::new(definition));
        self
    }

    pub fn definitions(&self) -> Vec<Arc<SettingDefinition>> {
        self.index.read().nodes.clone()
    }

    pub fn definition_count(&self) -> usize {
        self.index.read().nodes.len()
    }

    pub fn relation_count(&self) -> usize {
        self.index
            .read()
            .nodes
            .iter()
            .map(|n| n.relation_count())
            .sum()
    }

    fn merge_error(&self, reason: String) -> AppenderError {
        AppenderError::DefinitionMerge {
            container: self.id.clone(),
            reason,
        }
    }

    fn flatten(
        &self,
        key: &str,
        value: &Value,
        parent: Option<&str>,
        out: &mut Vec<SettingDefinition>,
    ) -> Result<()> {
        let object = value
            .as_object()
            .ok_or_else(|| self.merge_error(format!("definition '{}' is not an object", key)))?;

        let mut node = SettingDefinition::from_json(key, object);
        if let Some(parent) = parent {
            node = node.with_parent(parent);
        }
        out.push(node);

        match object.get("children") {
            None => Ok(()),
            Some(Value::Object(children)) => self.flatten_children(key, children, out),
            Some(_) => Err(self.merge_error(format!("children of '{}' are not an object", key))),
        }
    }

    fn flatten_children(
        &self,
        parent: &str,
        children: &Map<String, Value>,
        out: &mut Vec<SettingDefinition>,
    ) -> Result<()> {
        for (child_key, child) in children {
            self.flatten(child_key, child, Some(parent), out)?;
        }
        Ok(())
    }
}

impl SettingContainer for DefinitionContainer {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ContainerKind {
        self.kind
    }

    fn metadata_entry(&self, key: &str) -> Option<String> {
        self.metadata.get(key).cloned()
    }

    /// Validates the whole fragment before inserting anything, so a malformed
    /// fragment leaves the container untouched.
    fn append_setting_definitions(&self, fragment: &Fragment) -> Result<()> {
        let mut nodes = Vec::new();
        for (category_key, category) in &fragment.categories {
            self.flatten(category_key, category, None, &mut nodes)?;
        }

        debug!(
            "Appending {} definition(s) from {} to {}",
            nodes.len(),
            fragment.path.display(),
            self.id
        );
        let mut index = self.index.write();
        for node in nodes {
            index.insert(Arc::new(node));
        }
        Ok(())
    }

    fn find_definitions(&self, key: &str) -> Vec<Arc<SettingDefinition>> {
        self.index
            .read()
            .by_key
            .get(key)
            .cloned()
            .unwrap_or_default()
    }
}

/// Container lookup by id, safe to share between notification handlers.
#[derive(Default)]
pub struct InMemoryContainerRegistry {
    containers: DashMap<String, Vec<Arc<dyn SettingContainer>>>,
}

impl InMemoryContainerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_container(&self, container: Arc<dyn SettingContainer>) {
        self.containers
            .entry(container.id().to_string())
            .or_default()
            .push(container);
    }

    pub fn len(&self) -> usize {
        self.containers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }
}

impl ContainerRegistry for InMemoryContainerRegistry {
    fn find_containers(&self, id: &str) -> Vec<Arc<dyn SettingContainer>> {
        self.containers
            .get(id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }
}

use crate::{NodeId, RelationId, RelationType, ENABLED_FIELD};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Directed link between two setting definitions of one container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingRelation {
    pub id: RelationId,
    pub owner: NodeId,
    pub owner_key: String,
    pub target: NodeId,
    pub target_key: String,
    pub relation_type: RelationType,
    /// Property of the owner that triggers re-evaluation, e.g. `enabled`.
    pub role: String,
}

impl SettingRelation {
    pub fn new<S: Into<String>>(
        owner: &SettingDefinition,
        target: &SettingDefinition,
        relation_type: RelationType,
        role: S,
    ) -> Self {
        Self {
            id: RelationId::new_v4(),
            owner: owner.id,
            owner_key: owner.key.clone(),
            target: target.id,
            target_key: target.key.clone(),
            relation_type,
            role: role.into(),
        }
    }
}

/// A node of a container's setting-definition graph.
///
/// Relations are appended after the node is shared, so the list carries its
/// own lock; everything else is fixed at construction.
#[derive(Debug)]
pub struct SettingDefinition {
    pub id: NodeId,
    pub key: String,
    pub label: Option<String>,
    pub setting_type: Option<String>,
    pub parent: Option<String>,
    pub enabled: Option<String>,
    pub properties: Map<String, Value>,
    relations: RwLock<Vec<SettingRelation>>,
}

impl SettingDefinition {
    pub fn new<S: Into<String>>(key: S) -> Self {
        Self {
            id: NodeId::new_v4(),
            key: key.into(),
            label: None,
            setting_type: None,
            parent: None,
            enabled: None,
            properties: Map::new(),
            relations: RwLock::new(Vec::new()),
        }
    }

    /// Build a node from a setting object, leaving its `children` out.
    pub fn from_json<S: Into<String>>(key: S, object: &Map<String, Value>) -> Self {
        let mut properties = object.clone();
        properties.remove("children");

        let text = |name: &str| properties.get(name).and_then(Value::as_str).map(str::to_string);
        let label = text("label");
        let setting_type = text("type");
        let enabled = text(ENABLED_FIELD);

        Self {
            label,
            setting_type,
            enabled,
            properties,
            ..Self::new(key)
        }
    }

    pub fn with_parent<S: Into<String>>(mut self, parent: S) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_label<S: Into<String>>(mut self, label: S) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn relations(&self) -> Vec<SettingRelation> {
        self.relations.read().clone()
    }

    pub fn relation_count(&self) -> usize {
        self.relations.read().len()
    }

    pub fn append_relation(&self, relation: SettingRelation) {
        self.relations.write().push(relation);
    }

    pub fn append_relations<I: IntoIterator<Item = SettingRelation>>(&self, relations: I) {
        self.relations.write().extend(relations);
    }
}

use printsettings_core::{RelationType, SettingDefinition, SettingRelation, ENABLED_FIELD};

/// The two complementary relations between a requirement and the setting
/// whose `enabled` expression refers to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnabledRelations {
    /// requirement -> dependent, stored on the requirement
    pub required_by: SettingRelation,
    /// dependent -> requirement, stored on the dependent
    pub requires: SettingRelation,
}

impl EnabledRelations {
    pub fn between(requirement: &SettingDefinition, dependent: &SettingDefinition) -> Self {
        Self {
            required_by: SettingRelation::new(
                requirement,
                dependent,
                RelationType::RequiredByTarget,
                ENABLED_FIELD,
            ),
            requires: SettingRelation::new(
                dependent,
                requirement,
                RelationType::RequiresTarget,
                ENABLED_FIELD,
            ),
        }
    }

    /// Append each relation to its owner's relation list.
    pub fn attach(self, requirement: &SettingDefinition, dependent: &SettingDefinition) {
        requirement.append_relation(self.required_by);
        dependent.append_relation(self.requires);
    }
}

/// Wire `dependent` to `requirement` in both directions. Returns the number
/// of relations created.
pub fn link_enabled(requirement: &SettingDefinition, dependent: &SettingDefinition) -> usize {
    EnabledRelations::between(requirement, dependent).attach(requirement, dependent);
    2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_creates_one_relation_per_direction() {
        let parent = SettingDefinition::new("parent");
        let child = SettingDefinition::new("child");

        assert_eq!(link_enabled(&parent, &child), 2);

        let on_parent = parent.relations();
        let on_child = child.relations();
        assert_eq!(on_parent.len(), 1);
        assert_eq!(on_child.len(), 1);

        assert_eq!(on_parent[0].relation_type, RelationType::RequiredByTarget);
        assert_eq!(on_parent[0].owner, parent.id);
        assert_eq!(on_parent[0].target, child.id);
        assert_eq!(on_parent[0].role, "enabled");

        assert_eq!(on_child[0].relation_type, RelationType::RequiresTarget);
        assert_eq!(on_child[0].owner, child.id);
        assert_eq!(on_child[0].target, parent.id);
        assert_eq!(on_child[0].role, "enabled");
    }

    #[test]
    fn self_reference_lands_on_one_node() {
        let node = SettingDefinition::new("loop");
        link_enabled(&node, &node);
        let kinds: Vec<_> = node.relations().into_iter().map(|r| r.relation_type).collect();
        assert_eq!(
            kinds,
            vec![RelationType::RequiredByTarget, RelationType::RequiresTarget]
        );
    }
}

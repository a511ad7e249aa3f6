use crate::edge::link_enabled;
use dashmap::DashSet;
use printsettings_core::{
    AppenderError, ContainerKind, ContainerRegistry, DependencyPair, DependencyResolutionError,
    KeyRole, Result, SettingContainer, SettingDefinition, CONTAINER_TYPE_KEY,
    MACHINE_CONTAINER_TYPE,
};
use printsettings_parser::CollectedDefinitions;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Result of wiring one dependency pair into one container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairOutcome {
    pub pair: DependencyPair,
    /// Relations created, or why the pair was skipped.
    pub result: std::result::Result<usize, DependencyResolutionError>,
}

impl PairOutcome {
    pub fn is_wired(&self) -> bool {
        self.result.is_ok()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WiringReport {
    pub container_id: String,
    pub container_name: String,
    pub fragments_merged: usize,
    /// One entry per collected pair, in collection order.
    pub outcomes: Vec<PairOutcome>,
}

impl WiringReport {
    pub fn wired(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_wired()).count()
    }

    pub fn failed(&self) -> impl Iterator<Item = &PairOutcome> {
        self.outcomes.iter().filter(|o| !o.is_wired())
    }

    pub fn edges_created(&self) -> usize {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok())
            .sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Not a machine definition container; nothing was touched.
    Ignored,
    /// This container id was wired by an earlier notification.
    AlreadyWired,
    Wired(WiringReport),
}

/// Merges collected definitions into machine containers and wires their
/// `enabled` relations.
///
/// Remembers which container ids it has wired so a repeated load
/// notification does not duplicate relations.
#[derive(Debug)]
pub struct RelationApplier {
    collected: Arc<CollectedDefinitions>,
    wired: DashSet<String>,
}

impl RelationApplier {
    pub fn new(collected: Arc<CollectedDefinitions>) -> Self {
        Self {
            collected,
            wired: DashSet::new(),
        }
    }

    pub fn collected(&self) -> &CollectedDefinitions {
        &self.collected
    }

    pub fn is_wired(&self, container_id: &str) -> bool {
        self.wired.contains(container_id)
    }

    /// Handle a container-loaded notification for `container_id`.
    pub fn apply(
        &self,
        registry: &dyn ContainerRegistry,
        container_id: &str,
    ) -> Result<ApplyOutcome> {
        let container = registry
            .find_containers(container_id)
            .into_iter()
            .next()
            .ok_or_else(|| AppenderError::ContainerNotFound(container_id.to_string()))?;

        self.apply_to(container.as_ref())
    }

    /// Merge and wire an already resolved container.
    ///
    /// A merge failure aborts this container for good: the id stays claimed,
    /// so a later notification returns `AlreadyWired` instead of appending the
    /// fragments that did merge a second time. Pair failures never abort.
    pub fn apply_to(&self, container: &dyn SettingContainer) -> Result<ApplyOutcome> {
        if !is_machine_definition(container) {
            return Ok(ApplyOutcome::Ignored);
        }

        // claim the id first so concurrent notifications for it cannot both wire
        if !self.wired.insert(container.id().to_string()) {
            debug!("Machine {} already has plugin settings, skipping", container.name());
            return Ok(ApplyOutcome::AlreadyWired);
        }

        debug!("Appending settings to machine: {}", container.name());

        for fragment in self.collected.fragments() {
            if let Err(e) = container.append_setting_definitions(fragment) {
                debug!(
                    "Merging {} into {} failed, abandoning the container",
                    fragment.path.display(),
                    container.name()
                );
                return Err(e);
            }
        }

        let outcomes: Vec<PairOutcome> = self
            .collected
            .pairs()
            .iter()
            .map(|pair| {
                let result = wire_pair(container, pair);
                if let Err(ref e) = result {
                    error!("Failed to append {} due to {}", pair, e);
                }
                PairOutcome {
                    pair: pair.clone(),
                    result,
                }
            })
            .collect();

        let report = WiringReport {
            container_id: container.id().to_string(),
            container_name: container.name().to_string(),
            fragments_merged: self.collected.fragments().len(),
            outcomes,
        };
        info!(
            "Wired {}/{} setting relation(s) into {} ({} relation edges)",
            report.wired(),
            report.outcomes.len(),
            report.container_name,
            report.edges_created()
        );

        Ok(ApplyOutcome::Wired(report))
    }
}

fn is_machine_definition(container: &dyn SettingContainer) -> bool {
    container.kind() == ContainerKind::Definition
        && container.metadata_entry(CONTAINER_TYPE_KEY).as_deref() == Some(MACHINE_CONTAINER_TYPE)
}

/// Wire one pair into `container`.
///
/// Every key is resolved before any relation is attached, so a pair with a
/// missing key leaves no relations behind.
pub fn wire_pair(
    container: &dyn SettingContainer,
    pair: &DependencyPair,
) -> std::result::Result<usize, DependencyResolutionError> {
    let child = resolve(container, &pair.dependent, KeyRole::Dependent)?;
    let requirements = pair
        .requirements
        .iter()
        .map(|key| resolve(container, key, KeyRole::Requirement))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(requirements
        .iter()
        .map(|requirement| link_enabled(requirement, &child))
        .sum())
}

/// First definition registered under `key`.
///
/// Several matches are accepted; the earliest registration wins.
fn resolve(
    container: &dyn SettingContainer,
    key: &str,
    role: KeyRole,
) -> std::result::Result<Arc<SettingDefinition>, DependencyResolutionError> {
    let matches = container.find_definitions(key);
    if matches.len() > 1 {
        debug!(
            "{} definitions match '{}' in {}, using the first",
            matches.len(),
            key,
            container.id()
        );
    }
    matches
        .into_iter()
        .next()
        .ok_or_else(|| DependencyResolutionError::DefinitionNotFound {
            key: key.to_string(),
            role,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::{DefinitionContainer, InMemoryContainerRegistry};
    use printsettings_core::{DiscoveryConfig, Fragment, RelationType};
    use printsettings_parser::DefinitionCollector;
    use serde_json::{json, Value};
    use std::path::PathBuf;

    fn collected(fragments: Vec<Value>) -> Arc<CollectedDefinitions> {
        let collector = DefinitionCollector::new(DiscoveryConfig::default());
        collector
            .collect_fragments(fragments.into_iter().enumerate().map(|(i, v)| {
                Fragment::new(
                    PathBuf::from(format!("f{}.appendable.json", i)),
                    "test",
                    v.as_object().cloned().unwrap(),
                )
            }))
            .unwrap();
        collector.collected().unwrap()
    }

    fn wired(outcome: ApplyOutcome) -> WiringReport {
        match outcome {
            ApplyOutcome::Wired(report) => report,
            other => panic!("expected Wired, got {:?}", other),
        }
    }

    #[test]
    fn single_pair_creates_two_relations() {
        let applier = RelationApplier::new(collected(vec![json!({
            "cat": { "children": { "parent": {}, "child": { "enabled": "parent" } } }
        })]));
        let container = DefinitionContainer::machine("m", "Machine");

        let report = wired(applier.apply_to(&container).unwrap());
        assert_eq!(report.wired(), 1);
        assert_eq!(report.edges_created(), 2);

        let child = &container.find_definitions("child")[0];
        let parent = &container.find_definitions("parent")[0];
        let on_child = child.relations();
        let on_parent = parent.relations();
        assert_eq!(on_child.len(), 1);
        assert_eq!(on_parent.len(), 1);
        assert_eq!(on_child[0].relation_type, RelationType::RequiresTarget);
        assert_eq!(on_child[0].target, parent.id);
        assert_eq!(on_parent[0].relation_type, RelationType::RequiredByTarget);
        assert_eq!(on_parent[0].target, child.id);
        assert!(on_child.iter().chain(on_parent.iter()).all(|r| r.role == "enabled"));
    }

    #[test]
    fn missing_key_fails_only_its_pair() {
        let applier = RelationApplier::new(collected(vec![json!({
            "cat": { "children": {
                "a": {},
                "b": { "enabled": "a" },
                "c": { "enabled": "a and ghost" },
                "d": { "enabled": "not b" }
            } }
        })]));
        let container = DefinitionContainer::machine("m", "Machine");

        let report = wired(applier.apply_to(&container).unwrap());
        assert_eq!(report.outcomes.len(), 3);
        assert_eq!(report.wired(), 2);

        let order: Vec<&str> = report.outcomes.iter().map(|o| o.pair.dependent.as_str()).collect();
        assert_eq!(order, vec!["b", "c", "d"]);

        let failed: Vec<_> = report.failed().collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(
            failed[0].result,
            Err(DependencyResolutionError::DefinitionNotFound {
                key: "ghost".into(),
                role: KeyRole::Requirement
            })
        );
        // the failed pair left nothing on "c" or on "a" from "c"
        assert_eq!(container.find_definitions("c")[0].relation_count(), 0);
        assert_eq!(container.find_definitions("a")[0].relation_count(), 1);
    }

    #[test]
    fn missing_dependent_is_reported_with_its_role() {
        let container = DefinitionContainer::machine("m", "Machine")
            .with_definition(SettingDefinition::new("a"));
        let err =
            wire_pair(&container, &DependencyPair::new("nope", vec!["a".into()])).unwrap_err();
        assert_eq!(
            err,
            DependencyResolutionError::DefinitionNotFound {
                key: "nope".into(),
                role: KeyRole::Dependent
            }
        );
    }

    #[test]
    fn first_definition_wins_on_duplicate_keys() {
        let container = DefinitionContainer::machine("m", "Machine")
            .with_definition(SettingDefinition::new("dup").with_label("first"))
            .with_definition(SettingDefinition::new("dup").with_label("second"))
            .with_definition(SettingDefinition::new("x"));

        assert_eq!(
            wire_pair(&container, &DependencyPair::new("x", vec!["dup".into()])),
            Ok(2)
        );
        let dups = container.find_definitions("dup");
        assert_eq!(dups[0].relation_count(), 1);
        assert_eq!(dups[1].relation_count(), 0);
    }

    #[test]
    fn non_machine_containers_are_ignored() {
        let applier = RelationApplier::new(collected(vec![json!({
            "cat": { "children": { "s": {} } }
        })]));

        let extruder = DefinitionContainer::new("e", "Extruder", ContainerKind::Definition)
            .with_metadata(CONTAINER_TYPE_KEY, "extruder");
        let instance = DefinitionContainer::new("i", "Quality", ContainerKind::Instance)
            .with_metadata(CONTAINER_TYPE_KEY, MACHINE_CONTAINER_TYPE);
        let untyped = DefinitionContainer::new("u", "Untyped", ContainerKind::Definition);

        for container in [&extruder, &instance, &untyped] {
            assert_eq!(applier.apply_to(container).unwrap(), ApplyOutcome::Ignored);
            assert_eq!(container.definition_count(), 0);
        }
    }

    #[test]
    fn unknown_container_id_is_an_error() {
        let applier = RelationApplier::new(collected(vec![]));
        let registry = InMemoryContainerRegistry::new();
        let err = applier.apply(&registry, "ghost_machine").unwrap_err();
        assert!(matches!(err, AppenderError::ContainerNotFound(id) if id == "ghost_machine"));
    }

    #[test]
    fn repeated_notification_does_not_duplicate_relations() {
        let applier = RelationApplier::new(collected(vec![json!({
            "cat": { "children": { "a": {}, "b": { "enabled": "a" } } }
        })]));
        let registry = InMemoryContainerRegistry::new();
        let container = Arc::new(DefinitionContainer::machine("m", "Machine"));
        registry.add_container(container.clone());

        assert!(matches!(applier.apply(&registry, "m").unwrap(), ApplyOutcome::Wired(_)));
        assert_eq!(applier.apply(&registry, "m").unwrap(), ApplyOutcome::AlreadyWired);
        assert!(applier.is_wired("m"));
        assert_eq!(container.relation_count(), 2);
        assert_eq!(container.find_definitions("b").len(), 1);
    }

    #[test]
    fn merge_failure_aborts_the_container() {
        let applier = RelationApplier::new(collected(vec![
            json!({ "good": { "children": { "a": {}, "b": { "enabled": "a" } } } }),
            json!({ "bad": "not a category" }),
        ]));
        let container = DefinitionContainer::machine("m", "Machine");

        let err = applier.apply_to(&container).unwrap_err();
        assert!(matches!(err, AppenderError::DefinitionMerge { .. }));
        assert_eq!(container.relation_count(), 0);
        assert!(applier.is_wired("m"));
    }

    #[test]
    fn repeat_after_merge_failure_does_not_merge_again() {
        let applier = RelationApplier::new(collected(vec![
            json!({ "good": { "children": { "a": {}, "b": { "enabled": "a" } } } }),
            json!({ "bad": "not a category" }),
        ]));
        let registry = InMemoryContainerRegistry::new();
        let container = Arc::new(DefinitionContainer::machine("m", "Machine"));
        registry.add_container(container.clone());

        assert!(applier.apply(&registry, "m").is_err());
        let merged = container.definition_count();
        assert_eq!(container.find_definitions("a").len(), 1);

        assert_eq!(applier.apply(&registry, "m").unwrap(), ApplyOutcome::AlreadyWired);
        assert_eq!(container.find_definitions("a").len(), 1);
        assert_eq!(container.definition_count(), merged);
        assert_eq!(container.relation_count(), 0);
    }
}

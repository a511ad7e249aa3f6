use crate::expression::requirement_keys;
use printsettings_core::{DependencyPair, Fragment, ENABLED_FIELD};
use serde_json::Value;
use tracing::{debug, warn};

/// Walk a setting and all of its `children`, recording one pair for every
/// setting whose `enabled` expression is not hard disabled.
pub fn extract_dependencies(key: &str, setting: &Value, pairs: &mut Vec<DependencyPair>) {
    let Some(object) = setting.as_object() else {
        warn!("Setting {} is not an object, skipping", key);
        return;
    };

    if let Some(enabled) = object.get(ENABLED_FIELD) {
        match enabled.as_str() {
            Some(expression) => {
                if let Some(requirements) = requirement_keys(expression) {
                    pairs.push(DependencyPair::new(key, requirements));
                }
            }
            None => warn!(
                "Setting {} has a non-string enabled value {}, no relation recorded",
                key, enabled
            ),
        }
    }

    if let Some(children) = object.get("children") {
        match children.as_object() {
            Some(children) => {
                for (child_key, child) in children {
                    extract_dependencies(child_key, child, pairs);
                }
            }
            None => warn!("Children of {} are not an object, skipping them", key),
        }
    }
}

/// Dependency pairs of every setting below the fragment's categories, in
/// document order. The categories themselves are not inspected.
pub fn extract_fragment_dependencies(fragment: &Fragment) -> Vec<DependencyPair> {
    let mut pairs = Vec::new();

    for (category_key, category) in &fragment.categories {
        debug!("Creating settings for: {}", category_key);

        let Some(children) = category.get("children") else {
            debug!("Category {} declares no children", category_key);
            continue;
        };
        let Some(children) = children.as_object() else {
            warn!(
                "Children of category {} in {} are not an object, skipping",
                category_key,
                fragment.path.display()
            );
            continue;
        };

        for (setting_key, setting) in children {
            extract_dependencies(setting_key, setting, &mut pairs);
        }
    }

    pairs
}

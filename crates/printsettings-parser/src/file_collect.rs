use globset::{Glob, GlobMatcher};
use printsettings_core::{AppenderError, DiscoveryConfig, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// A fragment file found inside a plugin folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFragment {
    pub plugin: String,
    pub path: PathBuf,
}

/// Find fragment files under `root`.
///
/// Every directory `<root>/<plugin>` is a plugin; its fragments live in the
/// same-named inner folder `<root>/<plugin>/<plugin>/`. Plugins and files are
/// visited in file-name order so collection is reproducible. The example
/// fragment is skipped unless `show_example` is set.
pub fn discover_fragment_files(
    root: &Path,
    config: &DiscoveryConfig,
    show_example: bool,
) -> Result<Vec<DiscoveredFragment>> {
    info!("Discovering setting fragments under: {:?}", root);

    let matcher = fragment_matcher(&config.fragment_suffix)?;
    let mut found = Vec::new();

    for plugin_folder in sorted_entries(root)? {
        if !plugin_folder.is_dir() {
            continue;
        }
        let Some(plugin) = plugin_folder.file_name().and_then(|n| n.to_str()) else {
            warn!("Skipping plugin folder with non UTF-8 name: {:?}", plugin_folder);
            continue;
        };

        let inner = plugin_folder.join(plugin);
        if !inner.is_dir() {
            continue;
        }

        let files = match sorted_entries(&inner) {
            Ok(files) => files,
            Err(e) => {
                warn!("Cannot list {:?}: {}", inner, e);
                continue;
            }
        };

        for path in files {
            if !path.is_file() || !matcher.is_match(&path) {
                continue;
            }
            let is_example = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n == config.example_file_name);
            if is_example && !show_example {
                debug!("Skipping example fragment {:?}", path);
                continue;
            }

            debug!("Settings found for {}: {}", plugin, path.display());
            found.push(DiscoveredFragment {
                plugin: plugin.to_string(),
                path,
            });
        }
    }

    info!("Fragment discovery complete: {} file(s)", found.len());
    Ok(found)
}

fn fragment_matcher(suffix: &str) -> Result<GlobMatcher> {
    let glob = Glob::new(&format!("*{}", suffix)).map_err(|e| {
        AppenderError::Io(std::io::Error::new(std::io::ErrorKind::InvalidInput, e))
    })?;
    Ok(glob.compile_matcher())
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = std::fs::read_dir(dir)?
        .filter_map(|entry| match entry {
            Ok(e) => Some(e.path()),
            Err(e) => {
                warn!("Directory entry error in {:?}: {}", dir, e);
                None
            }
        })
        .collect::<Vec<_>>();
    entries.sort();
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn plugin_file(root: &Path, plugin: &str, file: &str) -> PathBuf {
        let dir = root.join(plugin).join(plugin);
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(file);
        fs::write(&path, "{}").unwrap();
        path
    }

    fn names(found: &[DiscoveredFragment]) -> Vec<String> {
        found
            .iter()
            .map(|f| format!("{}/{}", f.plugin, f.path.file_name().unwrap().to_str().unwrap()))
            .collect()
    }

    #[test]
    fn finds_fragments_in_inner_plugin_folders_only() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        plugin_file(root, "BetaPlugin", "b.appendable.json");
        plugin_file(root, "AlphaPlugin", "a.appendable.json");
        plugin_file(root, "AlphaPlugin", "plugin.json");
        // fragment at plugin top level is outside the namespace folder
        fs::write(root.join("AlphaPlugin").join("top.appendable.json"), "{}").unwrap();
        fs::write(root.join("stray.appendable.json"), "{}").unwrap();

        let found = discover_fragment_files(root, &DiscoveryConfig::default(), false).unwrap();
        assert_eq!(
            names(&found),
            vec!["AlphaPlugin/a.appendable.json", "BetaPlugin/b.appendable.json"]
        );
    }

    #[test]
    fn example_fragment_follows_the_toggle() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        plugin_file(root, "PrintSettingsAppender", "example_settings.appendable.json");
        plugin_file(root, "PrintSettingsAppender", "real.appendable.json");
        let config = DiscoveryConfig::default();

        let hidden = discover_fragment_files(root, &config, false).unwrap();
        assert_eq!(names(&hidden), vec!["PrintSettingsAppender/real.appendable.json"]);

        let shown = discover_fragment_files(root, &config, true).unwrap();
        assert_eq!(
            names(&shown),
            vec![
                "PrintSettingsAppender/example_settings.appendable.json",
                "PrintSettingsAppender/real.appendable.json"
            ]
        );
    }

    #[test]
    fn example_name_in_another_plugin_is_gated_too() {
        let tmp = TempDir::new().unwrap();
        plugin_file(tmp.path(), "Other", "example_settings.appendable.json");
        let found =
            discover_fragment_files(tmp.path(), &DiscoveryConfig::default(), false).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn missing_root_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let result = discover_fragment_files(
            &tmp.path().join("does-not-exist"),
            &DiscoveryConfig::default(),
            false,
        );
        assert!(matches!(result, Err(AppenderError::Io(_))));
    }
}

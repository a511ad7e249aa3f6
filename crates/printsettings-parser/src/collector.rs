use crate::extractor::extract_fragment_dependencies;
use crate::file_collect::discover_fragment_files;
use crate::fragment::load_fragment;
use once_cell::sync::OnceCell;
use printsettings_core::{AppenderError, DependencyPair, DiscoveryConfig, Fragment, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

/// Everything one collection pass produced. Read-only once published.
#[derive(Debug, Default)]
pub struct CollectedDefinitions {
    fragments: Vec<Fragment>,
    pairs: Vec<DependencyPair>,
}

impl CollectedDefinitions {
    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    pub fn pairs(&self) -> &[DependencyPair] {
        &self.pairs
    }

    fn push(&mut self, fragment: Fragment) -> usize {
        let pairs = extract_fragment_dependencies(&fragment);
        let count = pairs.len();
        self.pairs.extend(pairs);
        self.fragments.push(fragment);
        count
    }
}

#[derive(Debug)]
pub struct FragmentFailure {
    pub path: PathBuf,
    pub error: AppenderError,
}

#[derive(Debug, Default)]
pub struct CollectionReport {
    pub fragments_loaded: usize,
    pub pairs_extracted: usize,
    pub failures: Vec<FragmentFailure>,
}

/// Discovers plugin fragments and extracts their dependency pairs.
///
/// Collection happens at most once. The result is published in one step, so
/// a reader either sees nothing or the complete set.
#[derive(Debug)]
pub struct DefinitionCollector {
    config: DiscoveryConfig,
    collected: OnceCell<Arc<CollectedDefinitions>>,
}

impl DefinitionCollector {
    pub fn new(config: DiscoveryConfig) -> Self {
        Self {
            config,
            collected: OnceCell::new(),
        }
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// Discover, load and walk every fragment under `plugin_root`.
    ///
    /// A file that cannot be read or parsed is logged and reported; the rest
    /// of the pass continues. An unreadable root fails the pass and leaves
    /// the collector empty.
    pub fn collect(&self, plugin_root: &Path, show_example: bool) -> Result<CollectionReport> {
        if self.is_collected() {
            return Err(AppenderError::AlreadyCollected);
        }

        let discovered = discover_fragment_files(plugin_root, &self.config, show_example)?;

        let mut collected = CollectedDefinitions::default();
        let mut report = CollectionReport::default();

        for file in discovered {
            match load_fragment(&file.path, &file.plugin) {
                Ok(fragment) => {
                    report.pairs_extracted += collected.push(fragment);
                    report.fragments_loaded += 1;
                }
                Err(e) => {
                    error!("Failed to load settings from {}: {}", file.path.display(), e);
                    report.failures.push(FragmentFailure {
                        path: file.path,
                        error: e,
                    });
                }
            }
        }

        self.publish(collected)?;
        info!(
            "Collected {} fragment(s) with {} setting relation(s), {} failure(s)",
            report.fragments_loaded,
            report.pairs_extracted,
            report.failures.len()
        );
        Ok(report)
    }

    /// Publish fragments the host already loaded, extracting their pairs.
    pub fn collect_fragments<I>(&self, fragments: I) -> Result<CollectionReport>
    where
        I: IntoIterator<Item = Fragment>,
    {
        if self.is_collected() {
            return Err(AppenderError::AlreadyCollected);
        }

        let mut collected = CollectedDefinitions::default();
        let mut report = CollectionReport::default();
        for fragment in fragments {
            report.pairs_extracted += collected.push(fragment);
            report.fragments_loaded += 1;
        }

        self.publish(collected)?;
        Ok(report)
    }

    fn publish(&self, collected: CollectedDefinitions) -> Result<()> {
        self.collected
            .set(Arc::new(collected))
            .map_err(|_| AppenderError::AlreadyCollected)
    }

    pub fn collected(&self) -> Option<Arc<CollectedDefinitions>> {
        self.collected.get().cloned()
    }

    pub fn is_collected(&self) -> bool {
        self.collected.get().is_some()
    }
}

//! The extension object the host constructs at start-up.
//!
//! It registers the show-example preference and menu toggle, then reacts to
//! two host notifications: `pluginsLoaded` runs the single collection pass and
//! every `containerLoadComplete` wires the collected settings into that
//! container if it is a machine definition.

use once_cell::sync::OnceCell;
use printsettings_core::{
    AppenderConfig, AppenderError, ContainerRegistry, DiscoveryConfig, HostEvents,
    JsonPreferenceFile, MemoryPreferences, MenuItem, PreferenceStore, Result,
    SHOW_EXAMPLE_PREFERENCE,
};
use printsettings_graph::{ApplyOutcome, RelationApplier};
use printsettings_parser::{CollectionReport, DefinitionCollector};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, error, warn};

pub const SHOW_EXAMPLE_LABEL: &str = "Show Example";

pub struct PrintSettingsAppender {
    plugin_root: PathBuf,
    preferences: Arc<dyn PreferenceStore>,
    registry: Arc<dyn ContainerRegistry>,
    collector: DefinitionCollector,
    applier: OnceCell<RelationApplier>,
    show_example: AtomicBool,
}

impl PrintSettingsAppender {
    pub fn new(
        plugin_root: PathBuf,
        discovery: DiscoveryConfig,
        preferences: Arc<dyn PreferenceStore>,
        registry: Arc<dyn ContainerRegistry>,
    ) -> Self {
        preferences.add_preference(SHOW_EXAMPLE_PREFERENCE, false);
        let show_example = preferences
            .get_bool(SHOW_EXAMPLE_PREFERENCE)
            .unwrap_or(false);

        Self {
            plugin_root,
            preferences,
            registry,
            collector: DefinitionCollector::new(discovery),
            applier: OnceCell::new(),
            show_example: AtomicBool::new(show_example),
        }
    }

    /// Build from loaded configuration. A configured plugin root overrides the
    /// one the host passes; a configured preference path selects file-backed
    /// preferences, otherwise they live in memory.
    pub fn from_config(
        config: &AppenderConfig,
        host_plugin_root: &Path,
        registry: Arc<dyn ContainerRegistry>,
    ) -> Result<Self> {
        let plugin_root = config
            .discovery
            .plugin_root
            .clone()
            .unwrap_or_else(|| host_plugin_root.to_path_buf());

        let preferences: Arc<dyn PreferenceStore> = match &config.preferences.path {
            Some(path) => Arc::new(JsonPreferenceFile::open(path)?),
            None => Arc::new(MemoryPreferences::new()),
        };

        Ok(Self::new(
            plugin_root,
            config.discovery.clone(),
            preferences,
            registry,
        ))
    }

    /// Connect both notification handlers. Handlers hold a weak reference and
    /// stop doing anything once the extension is dropped.
    pub fn register(self: &Arc<Self>, events: &HostEvents) {
        let this: Weak<Self> = Arc::downgrade(self);
        events.connect_plugins_loaded(move || {
            if let Some(appender) = this.upgrade() {
                appender.handle_plugins_loaded();
            }
        });

        let this: Weak<Self> = Arc::downgrade(self);
        events.connect_container_load_complete(move |container_id| {
            if let Some(appender) = this.upgrade() {
                appender.handle_container_loaded(container_id);
            }
        });
    }

    pub fn menu_items(self: &Arc<Self>) -> Vec<MenuItem> {
        let this: Weak<Self> = Arc::downgrade(self);
        vec![MenuItem::new(SHOW_EXAMPLE_LABEL, move || {
            if let Some(appender) = this.upgrade() {
                if let Err(e) = appender.toggle_example() {
                    error!("Failed to store show example preference: {}", e);
                }
            }
        })]
    }

    pub fn show_example(&self) -> bool {
        self.show_example.load(Ordering::SeqCst)
    }

    /// Flip and persist the example toggle. Only the next collection pass
    /// sees the new value.
    pub fn toggle_example(&self) -> Result<bool> {
        let value = !self.show_example();
        self.preferences.set_bool(SHOW_EXAMPLE_PREFERENCE, value)?;
        self.show_example.store(value, Ordering::SeqCst);
        debug!("Show example is now {}", value);
        Ok(value)
    }

    pub fn plugin_root(&self) -> &Path {
        &self.plugin_root
    }

    pub fn collector(&self) -> &DefinitionCollector {
        &self.collector
    }

    pub fn applier(&self) -> Option<&RelationApplier> {
        self.applier.get()
    }

    /// Run the collection pass and make its result available for wiring.
    pub fn on_plugins_loaded(&self) -> Result<CollectionReport> {
        let report = self.collector.collect(&self.plugin_root, self.show_example())?;
        let collected = self.collector.collected().ok_or(AppenderError::NotCollected)?;
        self.applier
            .set(RelationApplier::new(collected))
            .map_err(|_| AppenderError::AlreadyCollected)?;
        Ok(report)
    }

    /// Merge and wire collected settings into `container_id`.
    pub fn on_container_loaded(&self, container_id: &str) -> Result<ApplyOutcome> {
        let applier = self.applier.get().ok_or(AppenderError::NotCollected)?;
        applier.apply(self.registry.as_ref(), container_id)
    }

    fn handle_plugins_loaded(&self) {
        if let Err(e) = self.on_plugins_loaded() {
            error!(
                "Collecting plugin settings from {} failed: {}",
                self.plugin_root.display(),
                e
            );
        }
    }

    fn handle_container_loaded(&self, container_id: &str) {
        match self.on_container_loaded(container_id) {
            Ok(_) => {}
            Err(AppenderError::NotCollected) => {
                warn!(
                    "Container {} loaded before plugin settings were collected",
                    container_id
                );
            }
            Err(e) => error!("Appending settings to {} failed: {}", container_id, e),
        }
    }
}

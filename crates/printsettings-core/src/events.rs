//! Host notification dispatch and the menu extension point.
//!
//! The host owns a `HostEvents` table and emits into it; extensions only
//! connect handlers. Emission snapshots the handler list first, so a handler
//! may connect further handlers without deadlocking.

use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

pub type PluginsLoadedHandler = Arc<dyn Fn() + Send + Sync>;
pub type ContainerLoadedHandler = Arc<dyn Fn(&str) + Send + Sync>;

#[derive(Default)]
pub struct HostEvents {
    plugins_loaded: RwLock<Vec<PluginsLoadedHandler>>,
    container_load_complete: RwLock<Vec<ContainerLoadedHandler>>,
}

impl HostEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect_plugins_loaded<F>(&self, handler: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.plugins_loaded.write().push(Arc::new(handler));
    }

    pub fn connect_container_load_complete<F>(&self, handler: F)
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.container_load_complete.write().push(Arc::new(handler));
    }

    pub fn emit_plugins_loaded(&self) {
        let handlers = self.plugins_loaded.read().clone();
        debug!("Dispatching pluginsLoaded to {} handler(s)", handlers.len());
        for handler in handlers {
            handler();
        }
    }

    pub fn emit_container_load_complete(&self, container_id: &str) {
        let handlers = self.container_load_complete.read().clone();
        for handler in handlers {
            handler(container_id);
        }
    }

    pub fn handler_counts(&self) -> (usize, usize) {
        (
            self.plugins_loaded.read().len(),
            self.container_load_complete.read().len(),
        )
    }
}

impl fmt::Debug for HostEvents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (plugins, containers) = self.handler_counts();
        f.debug_struct("HostEvents")
            .field("plugins_loaded", &plugins)
            .field("container_load_complete", &containers)
            .finish()
    }
}

/// An entry an extension contributes to the host's menu.
#[derive(Clone)]
pub struct MenuItem {
    pub label: String,
    action: Arc<dyn Fn() + Send + Sync>,
}

impl MenuItem {
    pub fn new<S, F>(label: S, action: F) -> Self
    where
        S: Into<String>,
        F: Fn() + Send + Sync + 'static,
    {
        Self {
            label: label.into(),
            action: Arc::new(action),
        }
    }

    pub fn trigger(&self) {
        (self.action)();
    }
}

impl fmt::Debug for MenuItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MenuItem").field("label", &self.label).finish()
    }
}

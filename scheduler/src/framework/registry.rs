use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use super::interface::Plugin;
use super::snapshot::SnapshotLister;
use crate::error::PluginError;

/// What a plugin factory receives besides its arguments: read access to the
/// cluster snapshot of the running cycle.
#[derive(Clone)]
pub struct Handle {
    lister: Arc<dyn SnapshotLister>,
}

impl Handle {
    pub fn new(lister: Arc<dyn SnapshotLister>) -> Self {
        Self { lister }
    }

    pub fn snapshot_lister(&self) -> &dyn SnapshotLister {
        self.lister.as_ref()
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle").finish_non_exhaustive()
    }
}

/// Builds a plugin from its (possibly absent) arguments.
pub type PluginFactory = fn(Option<&Value>, Handle) -> Result<Arc<dyn Plugin>, PluginError>;

#[derive(Default)]
pub struct Registry {
    factories: HashMap<String, PluginFactory>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: &str, factory: PluginFactory) -> Result<(), PluginError> {
        if self.factories.contains_key(name) {
            return Err(PluginError::AlreadyRegistered(name.to_string()));
        }
        self.factories.insert(name.to_string(), factory);
        tracing::debug!(plugin=%name, "Registered plugin");
        Ok(())
    }

    /// Instantiate the plugin registered under `name`.
    pub fn build(
        &self,
        name: &str,
        args: Option<&Value>,
        handle: Handle,
    ) -> Result<Arc<dyn Plugin>, PluginError> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| PluginError::NotRegistered(name.to_string()))?;
        factory(args, handle)
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.factories.keys().collect();
        names.sort();
        f.debug_struct("Registry").field("plugins", &names).finish()
    }
}

pub mod binpacking;

use crate::error::PluginError;
use crate::framework::Registry;

/// Registry preloaded with every plugin shipped in this crate.
pub fn new_in_tree_registry() -> Result<Registry, PluginError> {
    let mut registry = Registry::new();
    registry.register(binpacking::NAME, binpacking::new)?;
    Ok(registry)
}

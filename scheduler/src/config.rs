use std::env;

use serde_json::Value;

use crate::error::ConfigError;
use crate::framework::{PluginConfig, Profile};
use crate::plugins::binpacking;

/// Enabled plugins as `name[:weight]`, comma separated
pub const PLUGINS_VAR: &str = "BINPACK_PLUGINS";
/// JSON object mapping plugin name to its arguments
pub const PLUGIN_ARGS_VAR: &str = "BINPACK_PLUGIN_ARGS";
/// Seed for breaking ties between equally scored nodes
pub const SEED_VAR: &str = "BINPACK_SEED";

#[derive(Debug, Clone)]
pub struct Config {
    pub profile: Profile,
    pub seed: Option<u64>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Build the config from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let plugins = lookup(PLUGINS_VAR).unwrap_or_else(|| binpacking::NAME.to_string());
        let mut profile = parse_plugins(&plugins)?;

        if let Some(raw) = lookup(PLUGIN_ARGS_VAR) {
            let args: Value = serde_json::from_str(&raw).map_err(|source| ConfigError::InvalidJson {
                var: PLUGIN_ARGS_VAR,
                source,
            })?;
            let Value::Object(mut by_plugin) = args else {
                return Err(ConfigError::InvalidVar {
                    var: PLUGIN_ARGS_VAR,
                    value: raw,
                    reason: "expected a JSON object keyed by plugin name".to_string(),
                });
            };
            for plugin in profile.plugins.iter_mut() {
                plugin.args = by_plugin.remove(&plugin.name);
            }
            for name in by_plugin.keys() {
                tracing::warn!(plugin=%name, "Arguments given for a plugin that is not enabled");
            }
        }

        let seed = lookup(SEED_VAR)
            .map(|raw| {
                raw.trim().parse::<u64>().map_err(|e| ConfigError::InvalidVar {
                    var: SEED_VAR,
                    value: raw.clone(),
                    reason: e.to_string(),
                })
            })
            .transpose()?;

        Ok(Config { profile, seed })
    }
}

fn parse_plugins(raw: &str) -> Result<Profile, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidVar {
        var: PLUGINS_VAR,
        value: raw.to_string(),
        reason,
    };

    let mut plugins = Vec::new();
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let plugin = match entry.split_once(':') {
            Some((name, weight)) => {
                let weight = weight
                    .trim()
                    .parse::<i64>()
                    .map_err(|e| invalid(format!("weight of {name}: {e}")))?;
                PluginConfig {
                    weight,
                    ..PluginConfig::new(name.trim())
                }
            }
            None => PluginConfig::new(entry),
        };
        plugins.push(plugin);
    }

    if plugins.is_empty() {
        return Err(invalid("no plugins listed".to_string()));
    }
    Ok(Profile { plugins })
}

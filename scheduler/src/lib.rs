//! Bin-packing scheduling policy and the plugin framework that drives it.
//!
//! The policy lives in [`plugins::binpacking`]: it orders the pending queue
//! (big pods first), scores nodes by how many pods they already run and
//! rescales those scores into `[0, MAX_NODE_SCORE]`. [`framework`] is the
//! host side: snapshot, registry, queue and the scheduling cycle.

pub mod config;
pub mod error;
pub mod framework;
pub mod plugins;

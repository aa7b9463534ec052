//! Cache generation identity
//!
//! A generation is the opaque tag that namespaces one cache store instance.
//! It is derived once from the compile-time version marker, so a new build
//! of the agent addresses a fresh store and everything older becomes
//! eligible for deletion at activation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Version marker baked into the binary at compile time.
const VERSION_MARKER: &str = env!("CARGO_PKG_VERSION");

/// Prefix shared by every store this agent creates, so foreign directories
/// under the same root are never mistaken for cache generations.
pub const GENERATION_PREFIX: &str = "fresca-v";

/// Opaque identifier scoping one cache store instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Generation(String);

impl Generation {
    /// Build a generation from an arbitrary version marker.
    ///
    /// Path separators are flattened so the identifier is always usable as
    /// a directory name.
    pub fn from_marker(marker: &str) -> Self {
        let safe = marker.replace(['/', '\\'], "-");
        Self(format!("{GENERATION_PREFIX}{safe}"))
    }

    /// Reconstruct a generation from a raw identifier (store enumeration).
    ///
    /// Returns `None` for names that were not produced by [`from_marker`].
    pub fn from_name(name: &str) -> Option<Self> {
        name.starts_with(GENERATION_PREFIX)
            .then(|| Self(name.to_string()))
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The generation the running agent belongs to.
///
/// Pure and deterministic: every call in one process returns the same value.
pub fn current_generation() -> Generation {
    Generation::from_marker(VERSION_MARKER)
}

//! Weaver configuration.

use std::path::Path;

use propweave_core::WellKnownNames;
use serde::{Deserialize, Serialize};

use crate::error::{WeaveError, WeaveResult};
use crate::plan::ConflictPolicy;

/// Invoker method name used when none is configured.
pub const DEFAULT_EVENT_INVOKER: &str = "OnPropertyChanged";

/// How types are admitted into weaving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeavingMode {
    /// Every type passing the namespace filters participates.
    All,
    /// Types must also request injection on themselves or an ancestor.
    OptIn,
}

/// Immutable configuration for one weaving run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeaverConfig {
    /// Weave every type by default (`true`) or only opted-in types.
    #[serde(default = "default_weaving")]
    pub default_weaving: bool,

    /// Regular expressions matched against qualified type names.
    /// Empty means every namespace.
    #[serde(default)]
    pub namespace_filters: Vec<String>,

    /// Name of the synthesized invoker methods.
    #[serde(default = "default_event_invoker_name")]
    pub event_invoker_name: String,

    /// Skip weaving entirely.
    #[serde(default)]
    pub disabled: bool,

    /// Whether planning stops at the first conflict.
    #[serde(default)]
    pub conflict_policy: ConflictPolicy,

    /// Marker, annotation and event names.
    #[serde(default)]
    pub names: WellKnownNames,
}

fn default_weaving() -> bool {
    true
}

fn default_event_invoker_name() -> String {
    DEFAULT_EVENT_INVOKER.to_string()
}

impl Default for WeaverConfig {
    fn default() -> Self {
        Self {
            default_weaving: default_weaving(),
            namespace_filters: Vec::new(),
            event_invoker_name: default_event_invoker_name(),
            disabled: false,
            conflict_policy: ConflictPolicy::default(),
            names: WellKnownNames::default(),
        }
    }
}

impl WeaverConfig {
    /// Parse a configuration from JSON.
    pub fn from_json_str(json: &str) -> WeaveResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a configuration file.
    pub fn load(path: &Path) -> WeaveResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| WeaveError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    /// Save the configuration as pretty JSON.
    pub fn save(&self, path: &Path) -> WeaveResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| WeaveError::ConfigIo {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents).map_err(|source| WeaveError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Admission mode derived from `default_weaving`.
    pub fn weaving_mode(&self) -> WeavingMode {
        if self.default_weaving {
            WeavingMode::All
        } else {
            WeavingMode::OptIn
        }
    }

    /// Invoker name, falling back to the default when left blank.
    pub fn invoker_name(&self) -> &str {
        let name = self.event_invoker_name.trim();
        if name.is_empty() {
            DEFAULT_EVENT_INVOKER
        } else {
            name
        }
    }
}

//! Core domain types shared across the propweave workspace.
//!
//! A weaving run operates on a [`TypeRepository`]: a read-only view over every
//! known [`TypeDescriptor`], keyed by qualified name, together with the identity
//! of the module being woven. Descriptors from other modules are kept around so
//! inheritance chains can be followed past the module boundary.

mod descriptor;
mod error;
mod manifest;
mod repository;

pub use descriptor::{simple_name, ModuleId, TypeDescriptor, TypeName};
pub use error::{RepositoryError, RepositoryResult};
pub use manifest::TypeManifest;
pub use repository::{Ancestors, TypeRepository};

use serde::{Deserialize, Serialize};

// =============================================================================
// Well-known names
// =============================================================================

/// Interface that marks a type as raising property change notifications.
pub const NOTIFY_CAPABILITY: &str = "System.ComponentModel.INotifyPropertyChanged";

/// Annotation requesting that the capability be synthesized for a type.
pub const ADD_NOTIFY_ANNOTATION: &str =
    "PropertyChanged.AddINotifyPropertyChangedInterfaceAttribute";

/// Annotation suppressing weaving for a type.
pub const DO_NOT_NOTIFY_ANNOTATION: &str = "PropertyChanged.DoNotNotifyAttribute";

/// Name of the notification event member.
pub const NOTIFY_EVENT_NAME: &str = "PropertyChanged";

/// Names the weaver looks for on descriptors.
///
/// Defaults to the `PropertyChanged` conventions; hosts with their own marker
/// and annotation names can override any of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WellKnownNames {
    /// Capability marker interface.
    #[serde(default = "default_capability")]
    pub capability: String,
    /// Injection-request annotation.
    #[serde(default = "default_add_annotation")]
    pub add_annotation: String,
    /// Opt-out annotation.
    #[serde(default = "default_opt_out_annotation")]
    pub opt_out_annotation: String,
    /// Event member name.
    #[serde(default = "default_event_name")]
    pub event_name: String,
}

fn default_capability() -> String {
    NOTIFY_CAPABILITY.to_string()
}

fn default_add_annotation() -> String {
    ADD_NOTIFY_ANNOTATION.to_string()
}

fn default_opt_out_annotation() -> String {
    DO_NOT_NOTIFY_ANNOTATION.to_string()
}

fn default_event_name() -> String {
    NOTIFY_EVENT_NAME.to_string()
}

impl Default for WellKnownNames {
    fn default() -> Self {
        Self {
            capability: default_capability(),
            add_annotation: default_add_annotation(),
            opt_out_annotation: default_opt_out_annotation(),
            event_name: default_event_name(),
        }
    }
}

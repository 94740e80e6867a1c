//! Shape of the members the emitter must add to an injected type.
//!
//! Emission itself happens downstream; this module only decides names and
//! visibilities so every emitter produces the same surface.

use std::fmt;

use propweave_core::{TypeDescriptor, TypeName, WellKnownNames};
use serde::{Deserialize, Serialize};

/// Accessibility of a synthesized member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    Protected,
    ProtectedVirtual,
    Private,
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keyword = match self {
            Visibility::Public => "public",
            Visibility::Protected => "protected",
            Visibility::ProtectedVirtual => "protected virtual",
            Visibility::Private => "private",
        };
        f.write_str(keyword)
    }
}

/// Single parameter accepted by an invoker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvokerParameter {
    /// Name of the changed property, defaulted to the caller member name.
    PropertyName,
    /// Prebuilt change event arguments.
    EventArgs,
}

/// One synthesized invoker method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvokerPlan {
    pub name: String,
    pub parameter: InvokerParameter,
    pub visibility: Visibility,
}

/// Members to add to one injected type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesisPlan {
    pub type_name: TypeName,
    /// Capability marker interface to add, if not already listed.
    pub add_interface: Option<String>,
    /// Name of the public event field.
    pub event_name: String,
    /// Convenience form taking the property name.
    pub property_name_invoker: InvokerPlan,
    /// Overridable form taking event arguments; calls the event.
    pub event_args_invoker: InvokerPlan,
}

impl SynthesisPlan {
    /// Plan the members for `descriptor`.
    ///
    /// Sealed types get private invokers; others get protected ones, with the
    /// event-args form left overridable.
    pub fn for_type(
        descriptor: &TypeDescriptor,
        names: &WellKnownNames,
        invoker_name: &str,
    ) -> Self {
        let (convenience, overridable) = if descriptor.is_sealed {
            (Visibility::Private, Visibility::Private)
        } else {
            (Visibility::Protected, Visibility::ProtectedVirtual)
        };

        Self {
            type_name: descriptor.name.clone(),
            add_interface: (!descriptor.declares_interface(&names.capability))
                .then(|| names.capability.clone()),
            event_name: names.event_name.clone(),
            property_name_invoker: InvokerPlan {
                name: invoker_name.to_string(),
                parameter: InvokerParameter::PropertyName,
                visibility: convenience,
            },
            event_args_invoker: InvokerPlan {
                name: invoker_name.to_string(),
                parameter: InvokerParameter::EventArgs,
                visibility: overridable,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_class_gets_protected_invokers() {
        let descriptor = TypeDescriptor::class("App.Person", "App");
        let plan =
            SynthesisPlan::for_type(&descriptor, &WellKnownNames::default(), "OnPropertyChanged");

        assert_eq!(plan.add_interface.as_deref(), Some(propweave_core::NOTIFY_CAPABILITY));
        assert_eq!(plan.event_name, "PropertyChanged");
        assert_eq!(plan.property_name_invoker.visibility, Visibility::Protected);
        assert_eq!(plan.event_args_invoker.visibility, Visibility::ProtectedVirtual);
        assert_eq!(plan.event_args_invoker.visibility.to_string(), "protected virtual");
    }

    #[test]
    fn sealed_class_gets_private_invokers() {
        let descriptor = TypeDescriptor::class("App.Person", "App").sealed();
        let plan = SynthesisPlan::for_type(&descriptor, &WellKnownNames::default(), "Raise");

        assert_eq!(plan.property_name_invoker.name, "Raise");
        assert_eq!(plan.property_name_invoker.visibility, Visibility::Private);
        assert_eq!(plan.event_args_invoker.visibility, Visibility::Private);
    }
}

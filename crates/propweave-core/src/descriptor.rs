//! Type descriptors as produced by the declaration reader.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Fully qualified type name, e.g. `App.Models.User`.
///
/// Identity of a type is its qualified name; generic instantiations are only
/// distinguished textually.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeName(String);

impl TypeName {
    /// Create a new type name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The full qualified name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Unqualified part of a dotted name, e.g. `User` for `App.Models.User`.
pub fn simple_name(qualified: &str) -> &str {
    qualified.rsplit_once('.').map_or(qualified, |(_, name)| name)
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TypeName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for TypeName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for TypeName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for TypeName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Identity of a compiled module (assembly).
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleId(String);

impl ModuleId {
    /// Create a new module identity.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Module name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the identity was left blank (to be filled from a manifest).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModuleId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

fn default_true() -> bool {
    true
}

/// A single type declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDescriptor {
    /// Qualified name; identity of the type.
    pub name: TypeName,
    /// Module that declares the type.
    #[serde(default, skip_serializing_if = "ModuleId::is_empty")]
    pub module: ModuleId,
    /// Direct base type, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<TypeName>,
    /// Declared annotations (attribute type names), in declaration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<String>,
    /// Directly declared interfaces, in declaration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interfaces: Vec<String>,
    /// `false` for interfaces and value types.
    #[serde(default = "default_true")]
    pub is_class: bool,
    #[serde(default)]
    pub is_sealed: bool,
    /// Whether the type declares the notification event member itself.
    #[serde(default)]
    pub declares_notify_event: bool,
}

impl TypeDescriptor {
    /// An unsealed class with no base, annotations or interfaces.
    pub fn class(name: impl Into<TypeName>, module: impl Into<ModuleId>) -> Self {
        Self {
            name: name.into(),
            module: module.into(),
            base: None,
            annotations: Vec::new(),
            interfaces: Vec::new(),
            is_class: true,
            is_sealed: false,
            declares_notify_event: false,
        }
    }

    /// An interface declaration. Inherited interfaces go in `interfaces`.
    pub fn interface(name: impl Into<TypeName>, module: impl Into<ModuleId>) -> Self {
        Self {
            is_class: false,
            ..Self::class(name, module)
        }
    }

    /// Set the base type.
    pub fn with_base(mut self, base: impl Into<TypeName>) -> Self {
        self.base = Some(base.into());
        self
    }

    /// Add a declared annotation.
    pub fn with_annotation(mut self, annotation: impl Into<String>) -> Self {
        self.annotations.push(annotation.into());
        self
    }

    /// Add a declared interface.
    pub fn with_interface(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    /// Mark the type as sealed.
    pub fn sealed(mut self) -> Self {
        self.is_sealed = true;
        self
    }

    /// Mark the type as declaring the notification event directly.
    pub fn with_notify_event(mut self) -> Self {
        self.declares_notify_event = true;
        self
    }

    /// Whether the type itself carries `annotation`.
    pub fn has_annotation(&self, annotation: &str) -> bool {
        self.annotations.iter().any(|a| a == annotation)
    }

    /// Whether the type directly lists `interface`.
    pub fn declares_interface(&self, interface: &str) -> bool {
        self.interfaces.iter().any(|i| i == interface)
    }
}

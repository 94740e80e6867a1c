//! Stamping of the capability marker onto accepted descriptors.

use propweave_core::{TypeDescriptor, TypeName, TypeRepository};
use tracing::debug;

use crate::error::{WeaveError, WeaveResult};

/// Adds the capability marker to descriptors. Performs no validation.
#[derive(Debug, Clone, Copy)]
pub struct CapabilityInjector<'n> {
    capability: &'n str,
}

impl<'n> CapabilityInjector<'n> {
    pub fn new(capability: &'n str) -> Self {
        Self { capability }
    }

    /// Record the marker on `descriptor`. Returns `false` if it was already there.
    pub fn inject(&self, descriptor: &mut TypeDescriptor) -> bool {
        if descriptor.declares_interface(self.capability) {
            return false;
        }
        descriptor.interfaces.push(self.capability.to_string());
        true
    }

    /// Stamp every named type in `repo`, returning how many were changed.
    pub fn apply<'a>(
        &self,
        repo: &mut TypeRepository,
        names: impl IntoIterator<Item = &'a TypeName>,
    ) -> WeaveResult<usize> {
        let mut stamped = 0;
        for name in names {
            let descriptor = repo.get_mut(name.as_str()).ok_or_else(|| {
                WeaveError::inconsistent(format!("selected type {name} is not in the repository"))
            })?;
            if self.inject(descriptor) {
                debug!(type_name = %name, "capability marker stamped");
                stamped += 1;
            }
        }
        Ok(stamped)
    }
}

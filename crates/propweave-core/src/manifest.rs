//! JSON manifests describing the types declared by one module.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::descriptor::{ModuleId, TypeDescriptor};
use crate::error::{RepositoryError, RepositoryResult};

/// Every type declared by a single module.
///
/// Descriptors that leave `module` blank inherit the manifest's module.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TypeManifest {
    /// Declaring module.
    pub module: ModuleId,
    /// Declared types, in declaration order.
    #[serde(default)]
    pub types: Vec<TypeDescriptor>,
}

impl TypeManifest {
    /// Create an empty manifest for `module`.
    pub fn new(module: impl Into<ModuleId>) -> Self {
        Self {
            module: module.into(),
            types: Vec::new(),
        }
    }

    /// Parse a manifest from JSON and fill in blank module identities.
    pub fn from_json_str(json: &str) -> RepositoryResult<Self> {
        let mut manifest: TypeManifest = serde_json::from_str(json)?;
        manifest.normalize();
        Ok(manifest)
    }

    /// Load a manifest from disk.
    pub fn load(path: &Path) -> RepositoryResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| RepositoryError::ManifestIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    /// Write the manifest to disk as pretty JSON.
    pub fn save(&self, path: &Path) -> RepositoryResult<()> {
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents).map_err(|source| RepositoryError::ManifestIo {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Append a descriptor, adopting this manifest's module when blank.
    pub fn push(&mut self, mut descriptor: TypeDescriptor) {
        if descriptor.module.is_empty() {
            descriptor.module = self.module.clone();
        }
        self.types.push(descriptor);
    }

    fn normalize(&mut self) {
        for descriptor in &mut self.types {
            if descriptor.module.is_empty() {
                descriptor.module = self.module.clone();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn blank_modules_adopt_manifest_module() {
        let manifest = TypeManifest::from_json_str(
            r#"{
                "module": "App",
                "types": [
                    { "name": "App.Person" },
                    { "name": "Lib.Base", "module": "Lib" }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(manifest.types[0].module.as_str(), "App");
        assert_eq!(manifest.types[1].module.as_str(), "Lib");
    }

    #[test]
    fn save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.json");

        let mut manifest = TypeManifest::new("App");
        manifest.push(TypeDescriptor::class("App.Person", "").with_base("App.Entity"));
        manifest.save(&path).unwrap();

        let loaded = TypeManifest::load(&path).unwrap();
        assert_eq!(loaded.types, manifest.types);
        assert_eq!(loaded.types[0].module.as_str(), "App");
    }

    #[test]
    fn visibility_keys_are_ignored() {
        let manifest = TypeManifest::from_json_str(
            r#"{ "module": "App", "types": [ { "name": "App.Hidden", "is_public": false } ] }"#,
        )
        .unwrap();
        assert_eq!(manifest.types[0], TypeDescriptor::class("App.Hidden", "App"));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = TypeManifest::load(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, RepositoryError::ManifestIo { .. }));
        assert!(err.to_string().contains("/definitely/not/here.json"));
    }
}

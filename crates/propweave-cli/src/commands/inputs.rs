//! Manifest discovery and repository assembly.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use propweave_core::{TypeManifest, TypeRepository};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Expand files and directories into a sorted list of manifest paths.
///
/// Directories are searched recursively for `*.json` files.
pub fn discover(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();

    for input in inputs {
        if input.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(input)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .map(|e| e.into_path())
                .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
                .collect();
            found.sort();
            debug!(dir = %input.display(), manifests = found.len(), "scanned directory");
            paths.extend(found);
        } else if input.is_file() {
            paths.push(input.clone());
        } else {
            anyhow::bail!("Input not found: {}", input.display());
        }
    }

    if paths.is_empty() {
        anyhow::bail!("No manifests found in the given inputs");
    }
    Ok(paths)
}

/// Load every manifest and build the repository for the woven module.
///
/// Without an explicit module, a single manifest's module is used.
pub fn load_repository(inputs: &[PathBuf], module: Option<&str>) -> Result<TypeRepository> {
    let manifests = discover(inputs)?
        .iter()
        .map(|path| load_manifest(path))
        .collect::<Result<Vec<_>>>()?;

    let module = match module {
        Some(module) => module.to_string(),
        None => match manifests.as_slice() {
            [only] => only.module.to_string(),
            _ => anyhow::bail!(
                "{} manifests loaded; pass --module to choose the one to weave",
                manifests.len()
            ),
        },
    };

    if !manifests.iter().any(|m| m.module.as_str() == module) {
        anyhow::bail!("No manifest declares module '{}'", module);
    }

    let repo = TypeRepository::from_manifests(module.as_str(), manifests)
        .with_context(|| "Failed to assemble type repository")?;
    info!(module = %repo.module(), types = repo.len(), "repository loaded");
    Ok(repo)
}

fn load_manifest(path: &Path) -> Result<TypeManifest> {
    TypeManifest::load(path).with_context(|| format!("Failed to load manifest {}", path.display()))
}

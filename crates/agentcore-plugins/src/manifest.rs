//! Plugin manifest shape and validation (C13).

use semver::{Version, VersionReq};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PluginDependency {
    pub id: String,
    pub min_version: Version,
    /// Exclusive upper bound: `loaded_version < max_version`.
    pub max_version: Version,
}

#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct PluginLimits {
    pub max_schedules: Option<usize>,
    pub warning_size_mb: Option<f64>,
    pub max_size_mb: Option<f64>,
    pub signals_per_minute: Option<u32>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PluginManifest {
    pub manifest_version: u32,
    pub id: String,
    pub version: Version,
    pub provides: Vec<String>,
    #[serde(default)]
    pub dependencies: Vec<PluginDependency>,
    #[serde(default)]
    pub limits: PluginLimits,
}

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("unsupported manifestVersion: {0} (expected 2)")]
    UnsupportedVersion(u32),
    #[error("plugin id must not be empty")]
    EmptyId,
    #[error("plugin must provide at least one capability")]
    EmptyProvides,
    #[error("duplicate entry in provides: {0}")]
    DuplicateProvides(String),
}

pub fn validate_manifest(manifest: &PluginManifest) -> Result<(), ManifestError> {
    if manifest.manifest_version != 2 {
        return Err(ManifestError::UnsupportedVersion(manifest.manifest_version));
    }
    if manifest.id.is_empty() {
        return Err(ManifestError::EmptyId);
    }
    if manifest.provides.is_empty() {
        return Err(ManifestError::EmptyProvides);
    }
    let mut seen = HashSet::new();
    for entry in &manifest.provides {
        if !seen.insert(entry) {
            return Err(ManifestError::DuplicateProvides(entry.clone()));
        }
    }
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum DependencyError {
    #[error("dependency {id} is not loaded")]
    NotLoaded { id: String },
    #[error("dependency {id} version {loaded} does not satisfy [{min}, {max})")]
    VersionMismatch { id: String, loaded: Version, min: Version, max: Version },
}

/// Checks each declared dependency against the loaded-plugin version map.
/// `min_version` is inclusive, `max_version` exclusive.
pub fn check_dependencies(manifest: &PluginManifest, loaded_versions: &std::collections::HashMap<String, Version>) -> Result<(), DependencyError> {
    for dep in &manifest.dependencies {
        let Some(loaded) = loaded_versions.get(&dep.id) else {
            return Err(DependencyError::NotLoaded { id: dep.id.clone() });
        };
        let min_req = VersionReq::parse(&format!(">={}", dep.min_version)).expect("min_version formats to a valid req");
        let below_max = loaded < &dep.max_version;
        if !min_req.matches(loaded) || !below_max {
            return Err(DependencyError::VersionMismatch { id: dep.id.clone(), loaded: loaded.clone(), min: dep.min_version.clone(), max: dep.max_version.clone() });
        }
    }
    Ok(())
}

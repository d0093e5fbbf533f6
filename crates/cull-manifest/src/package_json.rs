//! Package manifest parsing.
//!
//! Focuses on the fields the analyzer needs: dependency buckets, entry
//! fields (`main`, `module`, `bin`, `exports`), `scripts` and the
//! `workspaces` declaration.

use cull_core::{Error, Result};
use cull_fs::FileSystem;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Maximum allowed size for package.json files (10MB).
const MAX_MANIFEST_SIZE: u64 = 10 * 1024 * 1024;

/// Parsed package.json structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackageJson {
    /// Package name.
    pub name: Option<String>,
    /// Package version.
    pub version: Option<String>,
    /// CommonJS entry point.
    pub main: Option<String>,
    /// ESM entry point.
    pub module: Option<String>,
    /// Type declarations entry point.
    pub types: Option<String>,
    /// Binary entries contributed by this package.
    pub bin: Option<BinField>,
    /// The `exports` map, kept structural (conditions are interpreted by
    /// the module resolver).
    pub exports: Option<serde_json::Value>,
    /// npm scripts.
    #[serde(default)]
    pub scripts: BTreeMap<String, String>,
    /// Production dependencies.
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
    /// Development dependencies.
    #[serde(default, rename = "devDependencies")]
    pub dev_dependencies: BTreeMap<String, String>,
    /// Peer dependencies.
    #[serde(default, rename = "peerDependencies")]
    pub peer_dependencies: BTreeMap<String, String>,
    /// Optional dependencies.
    #[serde(default, rename = "optionalDependencies")]
    pub optional_dependencies: BTreeMap<String, String>,
    /// Workspace member declaration.
    pub workspaces: Option<WorkspacesField>,
    /// File path this was loaded from.
    #[serde(skip)]
    pub path: PathBuf,
}

/// The `bin` field: a bare path or a name→path table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BinField {
    /// `"bin": "./cli.js"` — binary named after the package.
    Single(String),
    /// `"bin": { "name": "./cli.js", ... }`.
    Table(BTreeMap<String, String>),
}

/// The `workspaces` field: a pattern list or `{ "packages": [...] }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WorkspacesField {
    /// Plain pattern array.
    Patterns(Vec<String>),
    /// Yarn-style object form.
    Object {
        /// Member patterns.
        #[serde(default)]
        packages: Vec<String>,
    },
}

impl WorkspacesField {
    /// The member glob patterns, whichever form was used.
    pub fn patterns(&self) -> &[String] {
        match self {
            WorkspacesField::Patterns(p) => p,
            WorkspacesField::Object { packages } => packages,
        }
    }
}

/// Declaration bucket of a dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DependencyKind {
    /// `dependencies`
    Production,
    /// `devDependencies`
    Development,
    /// `peerDependencies`
    Peer,
    /// `optionalDependencies`
    Optional,
}

impl DependencyKind {
    /// The manifest key for this bucket.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Production => "dependencies",
            Self::Development => "devDependencies",
            Self::Peer => "peerDependencies",
            Self::Optional => "optionalDependencies",
        }
    }

    /// All buckets in manifest order.
    pub fn all() -> &'static [DependencyKind] {
        &[
            Self::Production,
            Self::Development,
            Self::Peer,
            Self::Optional,
        ]
    }
}

impl PackageJson {
    /// Load a manifest from a path.
    ///
    /// Enforces a 10MB size cap before reading; parse failures surface as
    /// [`Error::ManifestParse`], which is fatal.
    pub async fn from_path<F: FileSystem>(fs: &F, path: &Path) -> Result<Self> {
        let metadata = fs.metadata(path).await?;
        if !metadata.exists {
            return Err(Error::NoManifest {
                searched: path.to_path_buf(),
            });
        }
        if metadata.size > MAX_MANIFEST_SIZE {
            return Err(Error::InvalidConfig {
                message: format!(
                    "{} exceeds maximum manifest size of {}MB",
                    path.display(),
                    MAX_MANIFEST_SIZE / 1024 / 1024
                ),
            });
        }

        let content = fs.read_to_string(path).await?;
        let mut manifest: PackageJson =
            serde_json::from_str(&content).map_err(|source| Error::ManifestParse {
                file: path.to_path_buf(),
                source,
            })?;
        manifest.path = path.to_path_buf();
        Ok(manifest)
    }

    /// The dependencies of one bucket.
    pub fn get_dependencies(&self, kind: DependencyKind) -> &BTreeMap<String, String> {
        match kind {
            DependencyKind::Production => &self.dependencies,
            DependencyKind::Development => &self.dev_dependencies,
            DependencyKind::Peer => &self.peer_dependencies,
            DependencyKind::Optional => &self.optional_dependencies,
        }
    }

    /// The bucket declaring a package, if any.
    ///
    /// Buckets are checked in manifest order, so a package that appears in
    /// several buckets is credited to the first (each dep should live in
    /// exactly one).
    pub fn bucket_of(&self, package: &str) -> Option<DependencyKind> {
        DependencyKind::all()
            .iter()
            .copied()
            .find(|kind| self.get_dependencies(*kind).contains_key(package))
    }

    /// All declared dependency names across buckets, sorted and deduped.
    pub fn all_dependency_names(&self) -> Vec<String> {
        let mut names: Vec<String> = DependencyKind::all()
            .iter()
            .flat_map(|kind| self.get_dependencies(*kind).keys().cloned())
            .collect();
        names.sort();
        names.dedup();
        names
    }

    /// Binary names this package contributes, with their script paths.
    ///
    /// A bare-string `bin` uses the unscoped package name.
    pub fn bin_entries(&self) -> Vec<(String, String)> {
        match &self.bin {
            Some(BinField::Single(path)) => {
                let name = self
                    .name
                    .as_deref()
                    .map(unscoped_name)
                    .unwrap_or_default()
                    .to_string();
                if name.is_empty() {
                    Vec::new()
                } else {
                    vec![(name, path.clone())]
                }
            }
            Some(BinField::Table(table)) => table
                .iter()
                .map(|(name, path)| (name.clone(), path.clone()))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Entry-like manifest fields: `main`, `module`, `types`, `bin` paths,
    /// plus every file target found in the `exports` map.
    pub fn entry_fields(&self) -> Vec<String> {
        let mut entries = Vec::new();
        if let Some(main) = &self.main {
            entries.push(main.clone());
        }
        if let Some(module) = &self.module {
            entries.push(module.clone());
        }
        if let Some(types) = &self.types {
            entries.push(types.clone());
        }
        for (_, path) in self.bin_entries() {
            entries.push(path);
        }
        if let Some(exports) = &self.exports {
            collect_export_targets(exports, &mut entries);
        }
        entries.sort();
        entries.dedup();
        entries
    }
}

/// Collect every string leaf of an `exports` map (targets under any
/// condition or subpath).
fn collect_export_targets(value: &serde_json::Value, out: &mut Vec<String>) {
    match value {
        serde_json::Value::String(s) => out.push(s.clone()),
        serde_json::Value::Object(map) => {
            for v in map.values() {
                collect_export_targets(v, out);
            }
        }
        serde_json::Value::Array(items) => {
            for v in items {
                collect_export_targets(v, out);
            }
        }
        _ => {}
    }
}

/// The package name without its scope (`@scope/pkg` -> `pkg`).
pub fn unscoped_name(name: &str) -> &str {
    match name.rsplit_once('/') {
        Some((_, rest)) if name.starts_with('@') => rest,
        _ => name,
    }
}

/// Extract the base package name from an npm import specifier.
///
/// Handles scoped packages:
/// - `@foo/bar` -> `@foo/bar`
/// - `@foo/bar/baz` -> `@foo/bar`
/// - `lodash` -> `lodash`
/// - `lodash/fp` -> `lodash`
pub fn extract_package_name(specifier: &str) -> &str {
    if specifier.is_empty() {
        return specifier;
    }

    if specifier.starts_with('@') {
        if let Some(first_slash) = specifier.find('/') {
            if let Some(second_slash) = specifier[first_slash + 1..].find('/') {
                return &specifier[..first_slash + 1 + second_slash];
            }
        }
        return specifier;
    }

    match specifier.find('/') {
        Some(idx) => &specifier[..idx],
        None => specifier,
    }
}

/// The subpath of a specifier after the package name, without the slash.
pub fn specifier_subpath(specifier: &str) -> Option<&str> {
    let package = extract_package_name(specifier);
    specifier
        .strip_prefix(package)
        .and_then(|rest| rest.strip_prefix('/'))
        .filter(|rest| !rest.is_empty())
}

//! Dependency attribution tables.
//!
//! Every workspace gets a table mapping each declared package to who uses
//! it: source files encountered during traversal, or plugins that vouch
//! for it. A package with an empty table entry and no ignore mark is
//! unused. References from a workspace that does not itself declare the
//! package are credited to the nearest declaring ancestor.

use crate::package_json::DependencyKind;
use crate::workspace::WorkspaceSet;
use cull_core::DependencyCoverageStats;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

/// Packages never reported as unused.
///
/// These are referenced by toolchains rather than source code and show up
/// in nearly every manifest.
pub const ALWAYS_IGNORED_DEPENDENCIES: &[&str] = &["@types/node", "typescript"];

/// Who uses one declared dependency.
#[derive(Debug, Clone, Default)]
pub struct DependencyAttribution {
    /// Declaration bucket.
    pub kind: Option<DependencyKind>,
    /// Source files whose imports resolved to this package.
    pub referenced_from_files: BTreeSet<PathBuf>,
    /// Plugins that attribute this package as used.
    pub referenced_by_plugins: BTreeSet<String>,
    /// Excluded from unused reporting (user pattern, peer/optional bucket,
    /// or the built-in list).
    pub ignored: bool,
}

impl DependencyAttribution {
    /// Whether anything references this package.
    pub fn is_referenced(&self) -> bool {
        !self.referenced_from_files.is_empty() || !self.referenced_by_plugins.is_empty()
    }
}

/// Per-workspace attribution tables, indexed parallel to a [`WorkspaceSet`].
#[derive(Debug)]
pub struct AttributionTables {
    tables: Vec<BTreeMap<String, DependencyAttribution>>,
}

impl AttributionTables {
    /// Initialize tables from the declared dependencies of every workspace.
    ///
    /// Peer and optional dependencies start ignored: they describe host
    /// expectations, not usage, so their absence from source is not a
    /// finding.
    pub fn new(set: &WorkspaceSet) -> Self {
        let tables = set
            .all()
            .iter()
            .map(|ws| {
                let mut table = BTreeMap::new();
                for kind in DependencyKind::all() {
                    for package in ws.manifest.get_dependencies(*kind).keys() {
                        let ignored = matches!(
                            kind,
                            DependencyKind::Peer | DependencyKind::Optional
                        ) || ALWAYS_IGNORED_DEPENDENCIES.contains(&package.as_str());
                        table.insert(
                            package.clone(),
                            DependencyAttribution {
                                kind: Some(*kind),
                                ignored,
                                ..Default::default()
                            },
                        );
                    }
                }
                table
            })
            .collect();

        Self { tables }
    }

    /// Mark packages matching the given patterns as ignored in one
    /// workspace. Patterns are exact names or globs (`@storybook/*`).
    pub fn mark_ignored(&mut self, ws_idx: usize, patterns: &[String]) {
        let compiled: Vec<glob::Pattern> = patterns
            .iter()
            .filter_map(|p| glob::Pattern::new(p).ok())
            .collect();

        for (package, attribution) in self.tables[ws_idx].iter_mut() {
            if compiled.iter().any(|p| p.matches(package)) {
                attribution.ignored = true;
            }
        }
    }

    /// Credit a source-file reference to the nearest declaring workspace.
    ///
    /// Returns the index of the workspace that got the credit, or `None`
    /// when no visible manifest declares the package (an unlisted
    /// dependency from the referring workspace's point of view).
    pub fn record_file_reference(
        &mut self,
        set: &WorkspaceSet,
        referring_ws: usize,
        package: &str,
        file: PathBuf,
    ) -> Option<usize> {
        let target = set.nearest_declaring(referring_ws, package)?;
        self.tables[target]
            .entry(package.to_string())
            .or_default()
            .referenced_from_files
            .insert(file);
        Some(target)
    }

    /// Credit a plugin attribution to the nearest declaring workspace.
    pub fn record_plugin_reference(
        &mut self,
        set: &WorkspaceSet,
        ws_idx: usize,
        package: &str,
        plugin: &str,
    ) -> Option<usize> {
        let target = set.nearest_declaring(ws_idx, package)?;
        self.tables[target]
            .entry(package.to_string())
            .or_default()
            .referenced_by_plugins
            .insert(plugin.to_string());
        Some(target)
    }

    /// The attribution entry for one package in one workspace.
    pub fn get(&self, ws_idx: usize, package: &str) -> Option<&DependencyAttribution> {
        self.tables[ws_idx].get(package)
    }

    /// Unused dependencies of one workspace, sorted by package name.
    pub fn unused_in(&self, ws_idx: usize) -> Vec<(String, DependencyKind)> {
        self.tables[ws_idx]
            .iter()
            .filter(|(_, a)| !a.is_referenced() && !a.ignored)
            .filter_map(|(package, a)| a.kind.map(|k| (package.clone(), k)))
            .collect()
    }

    /// Coverage statistics across all workspaces.
    pub fn coverage(&self) -> DependencyCoverageStats {
        let mut stats = DependencyCoverageStats::default();
        for table in &self.tables {
            for attribution in table.values() {
                if attribution.kind.is_none() {
                    continue;
                }
                stats.total_declared += 1;
                if attribution.is_referenced() || attribution.ignored {
                    stats.total_used += 1;
                } else {
                    stats.total_unused += 1;
                }
            }
        }
        stats
    }
}

//! Entry and project file resolution.
//!
//! Per workspace, three pattern sets expand into concrete file sets:
//! `project` (the universe of owned files), `entry` (the reachability
//! seeds) and `ignore` (excluded from reporting, still reachable).
//! Negated patterns subtract, later patterns override earlier ones, and
//! ignore applies last, at classification time.

use crate::resolver::resolve_file;
use cull_core::{AnalyzerOptions, Error, Result};
use cull_fs::FileSystem;
use cull_manifest::{extract_package_name, WorkspaceSet};
use cull_plugins::PluginOutput;
use globset::{Glob, GlobMatcher};
use path_clean::PathClean;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Project patterns applied when the user configures none.
pub const DEFAULT_PROJECT_PATTERNS: &[&str] = &["**/*.{js,mjs,cjs,jsx,ts,mts,cts,tsx}"];

/// Entry patterns applied when the user configures none.
pub const DEFAULT_ENTRY_PATTERNS: &[&str] = &[
    "{index,main,cli}.{js,mjs,cjs,jsx,ts,mts,cts,tsx}",
    "src/{index,main,cli}.{js,mjs,cjs,jsx,ts,mts,cts,tsx}",
];

/// An ordered glob list with gitignore-style semantics: the last matching
/// pattern decides, negated patterns (`!...`) subtract.
#[derive(Debug, Default)]
pub struct OrderedGlobs {
    rules: Vec<(bool, GlobMatcher, String)>,
}

impl OrderedGlobs {
    /// Compile a pattern list. A malformed glob is a configuration error.
    pub fn new(patterns: &[String]) -> Result<Self> {
        let mut rules = Vec::new();
        for pattern in patterns {
            let (negated, body) = match pattern.strip_prefix('!') {
                Some(rest) => (true, rest),
                None => (false, pattern.as_str()),
            };
            let matcher = Glob::new(body)
                .map_err(|e| Error::Pattern(format!("invalid glob '{pattern}': {e}")))?
                .compile_matcher();
            rules.push((negated, matcher, pattern.clone()));
        }
        Ok(Self { rules })
    }

    /// Whether any rules are present.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Whether a relative path is selected by the list.
    pub fn matches(&self, relative: &Path) -> bool {
        self.decide(relative).is_some_and(|(negated, _)| !negated)
    }

    /// The pattern that selected a path, when one did.
    pub fn matched_pattern(&self, relative: &Path) -> Option<&str> {
        match self.decide(relative) {
            Some((false, pattern)) => Some(pattern),
            _ => None,
        }
    }

    fn decide(&self, relative: &Path) -> Option<(bool, &str)> {
        self.rules
            .iter()
            .rev()
            .find(|(_, matcher, _)| matcher.is_match(relative))
            .map(|(negated, _, pattern)| (*negated, pattern.as_str()))
    }
}

/// The resolved file sets of one workspace.
#[derive(Debug)]
pub struct WorkspaceFiles {
    /// Files this workspace owns for reporting purposes.
    pub project: BTreeSet<PathBuf>,
    /// Seed files for reachability.
    pub entries: BTreeSet<PathBuf>,
    /// Reporting exclusions.
    pub ignore: OrderedGlobs,
    /// Manifest entry fields that are bare package specifiers
    /// (`"main": "expo-router/entry"`); attributed as production
    /// dependency references.
    pub bare_entry_packages: Vec<String>,
}

/// Expand one workspace's pattern sets over its owned files.
pub async fn resolve_workspace_files<F: FileSystem>(
    fs: &F,
    set: &WorkspaceSet,
    ws_idx: usize,
    options: &AnalyzerOptions,
    plugin_outputs: &[PluginOutput],
    owned_files: &BTreeSet<PathBuf>,
) -> Result<WorkspaceFiles> {
    let ws = set.get(ws_idx);
    let rel_dir = workspace_key(set, ws_idx);

    // Project: user patterns (or defaults) plus plugin contributions.
    let mut project_patterns: Vec<String> = options.project_for(&rel_dir).to_vec();
    if project_patterns.is_empty() {
        project_patterns = DEFAULT_PROJECT_PATTERNS.iter().map(|s| s.to_string()).collect();
    }
    for output in plugin_outputs {
        project_patterns.extend(output.project.iter().cloned());
    }
    let project_globs = OrderedGlobs::new(&project_patterns)?;

    let mut project: BTreeSet<PathBuf> = owned_files
        .iter()
        .filter(|path| {
            path.strip_prefix(&ws.dir)
                .map(|rel| project_globs.matches(rel))
                .unwrap_or(false)
        })
        .cloned()
        .collect();

    // Entry: user patterns (or defaults), plugin patterns, plugin script
    // files, manifest entry fields.
    let mut entry_patterns: Vec<String> = options.entry_for(&rel_dir).to_vec();
    if entry_patterns.is_empty() {
        entry_patterns = DEFAULT_ENTRY_PATTERNS.iter().map(|s| s.to_string()).collect();
    }
    for output in plugin_outputs {
        entry_patterns.extend(output.entry.iter().cloned());
        entry_patterns.extend(output.script_files.iter().cloned());
    }

    let mut entries: BTreeSet<PathBuf> = BTreeSet::new();
    let mut bare_entry_packages: Vec<String> = Vec::new();

    let glob_patterns: Vec<String> = entry_patterns
        .iter()
        .filter(|p| has_glob_meta(p))
        .cloned()
        .collect();
    let entry_globs = OrderedGlobs::new(&glob_patterns)?;

    if !entry_globs.is_empty() {
        for path in owned_files {
            if let Ok(rel) = path.strip_prefix(&ws.dir) {
                if entry_globs.matches(rel) {
                    entries.insert(path.clone());
                }
            }
        }
    }

    // Literal patterns probe the filesystem directly; entry files outside
    // the project universe still count (and join the project below).
    for pattern in entry_patterns.iter().filter(|p| !has_glob_meta(p)) {
        let candidate = ws.dir.join(pattern.trim_start_matches("./")).clean();
        if let Some(found) = resolve_file(fs, &candidate).await? {
            entries.insert(found);
        }
    }

    // Manifest entry fields: paths that resolve become entries; a field
    // that does not resolve but reads as a package specifier
    // (`"main": "expo-router/entry"`) is a production dependency
    // reference. Attribution is inert for names no manifest declares, so
    // a missing build output ("dist/index.js") cannot misfire.
    for field in ws.manifest.entry_fields() {
        let candidate = ws.dir.join(field.trim_start_matches("./")).clean();
        if let Some(found) = resolve_file(fs, &candidate).await? {
            entries.insert(found);
        } else if is_bare_specifier(&field) {
            let package = extract_package_name(&field);
            if ws.manifest.name.as_deref() != Some(package) {
                bare_entry_packages.push(package.to_string());
            }
        }
    }

    // Entry ⊆ project.
    for entry in &entries {
        project.insert(entry.clone());
    }

    bare_entry_packages.sort();
    bare_entry_packages.dedup();

    debug!(
        workspace = %ws.name,
        project = project.len(),
        entries = entries.len(),
        "resolved workspace files"
    );

    let ignore = OrderedGlobs::new(&options.ignore_for(&rel_dir))?;

    Ok(WorkspaceFiles {
        project,
        entries,
        ignore,
        bare_entry_packages,
    })
}

/// The options key of a workspace: its root-relative directory, `.` for
/// the root itself.
pub fn workspace_key(set: &WorkspaceSet, ws_idx: usize) -> String {
    let ws = set.get(ws_idx);
    match ws.dir.strip_prefix(set.root()) {
        Ok(rel) if rel.as_os_str().is_empty() => ".".to_string(),
        Ok(rel) => rel.to_string_lossy().into_owned(),
        Err(_) => ws.dir.to_string_lossy().into_owned(),
    }
}

fn has_glob_meta(pattern: &str) -> bool {
    pattern.contains(['*', '?', '[', '{'])
}

fn is_bare_specifier(field: &str) -> bool {
    !field.starts_with('.') && !field.starts_with('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordered_globs_later_wins() {
        let globs = OrderedGlobs::new(&[
            "src/**/*.ts".to_string(),
            "!src/**/*.test.ts".to_string(),
        ])
        .unwrap();

        assert!(globs.matches(Path::new("src/app.ts")));
        assert!(!globs.matches(Path::new("src/app.test.ts")));
        assert!(!globs.matches(Path::new("README.md")));
    }

    #[test]
    fn negation_can_be_overridden_later() {
        let globs = OrderedGlobs::new(&[
            "**/*.ts".to_string(),
            "!fixtures/**".to_string(),
            "fixtures/keep.ts".to_string(),
        ])
        .unwrap();

        assert!(!globs.matches(Path::new("fixtures/other.ts")));
        assert!(globs.matches(Path::new("fixtures/keep.ts")));
    }

    #[test]
    fn matched_pattern_reports_the_decider() {
        let globs = OrderedGlobs::new(&["dist/**".to_string()]).unwrap();
        assert_eq!(
            globs.matched_pattern(Path::new("dist/index.js")),
            Some("dist/**")
        );
        assert_eq!(globs.matched_pattern(Path::new("src/index.ts")), None);
    }

    #[test]
    fn invalid_glob_is_fatal() {
        assert!(OrderedGlobs::new(&["src/[".to_string()]).is_err());
    }

    #[test]
    fn bare_specifier_detection() {
        assert!(is_bare_specifier("expo-router/entry"));
        assert!(is_bare_specifier("@scope/pkg/sub"));
        assert!(!is_bare_specifier("./src/index.ts"));
    }
}

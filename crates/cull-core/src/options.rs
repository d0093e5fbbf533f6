//! Analyzer configuration.
//!
//! The configuration surface exposed to collaborators (CLI, config-file
//! loaders). Field names are camelCase in serialized form; parsing the
//! config file itself is the collaborator's job, this type only gives it a
//! stable shape to deserialize into.

use crate::error::{Error, Result};
use crate::issue::IssueKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Options controlling one analysis pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct AnalyzerOptions {
    /// Entry file glob patterns, relative to each workspace.
    pub entry: Vec<String>,

    /// Project file glob patterns (the universe of owned files).
    pub project: Vec<String>,

    /// Patterns excluded from reporting (still allowed to be reachable).
    pub ignore: Vec<String>,

    /// Dependencies never reported as unused (exact names or globs).
    pub ignore_dependencies: Vec<String>,

    /// Binaries never reported as unlisted (exact names or globs).
    pub ignore_binaries: Vec<String>,

    /// Treat an export referenced inside its own file as used.
    pub ignore_exports_used_in_file: bool,

    /// Report unused exports of entry files too.
    pub include_entry_exports: bool,

    /// Issue kinds to report; empty means all.
    pub include: Vec<IssueKind>,

    /// Issue kinds to suppress.
    pub exclude: Vec<IssueKind>,

    /// Path alias map (tsconfig-style: prefix -> replacement list).
    pub paths: BTreeMap<String, Vec<String>>,

    /// Per-workspace overrides, keyed by workspace-relative directory.
    pub workspaces: BTreeMap<String, WorkspaceOptions>,

    /// Explicit plugin toggles by plugin name; absent means auto-detect.
    pub plugins: BTreeMap<String, bool>,

    /// Report unused class members.
    pub include_class_members: bool,

    /// Report unused enum members.
    pub include_enum_members: bool,

    /// Whether type-only reachability marks a dependency as used.
    pub type_reachability_counts: bool,

    /// Only value-channel reachability keeps a file out of the unused
    /// report; files reached solely through type-only imports are
    /// reported.
    pub value_mode: bool,

    /// Extra JSDoc tags that suppress unused-export reporting
    /// (in addition to `@public`). Tags are written without the `@`.
    pub ignore_export_tags: Vec<String>,
}

impl Default for AnalyzerOptions {
    fn default() -> Self {
        Self {
            entry: Vec::new(),
            project: Vec::new(),
            ignore: Vec::new(),
            ignore_dependencies: Vec::new(),
            ignore_binaries: Vec::new(),
            ignore_exports_used_in_file: false,
            include_entry_exports: false,
            include: Vec::new(),
            exclude: Vec::new(),
            paths: BTreeMap::new(),
            workspaces: BTreeMap::new(),
            plugins: BTreeMap::new(),
            include_class_members: false,
            include_enum_members: false,
            type_reachability_counts: true,
            value_mode: false,
            ignore_export_tags: Vec::new(),
        }
    }
}

/// Per-workspace option overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct WorkspaceOptions {
    /// Entry patterns for this workspace; overrides the top-level set.
    pub entry: Vec<String>,
    /// Project patterns for this workspace.
    pub project: Vec<String>,
    /// Ignore patterns added to the top-level set.
    pub ignore: Vec<String>,
    /// Dependencies ignored in this workspace only.
    pub ignore_dependencies: Vec<String>,
    /// Binaries ignored in this workspace only.
    pub ignore_binaries: Vec<String>,
}

impl AnalyzerOptions {
    /// Validate the option set before analysis starts.
    ///
    /// Configuration errors are fatal and surface before any file is read.
    pub fn validate(&self) -> Result<()> {
        for kind in &self.include {
            if self.exclude.contains(kind) {
                return Err(Error::InvalidConfig {
                    message: format!(
                        "issue kind '{}' is both included and excluded",
                        kind.filter_name()
                    ),
                });
            }
        }

        for (alias, targets) in &self.paths {
            if targets.is_empty() {
                return Err(Error::InvalidConfig {
                    message: format!("path alias '{alias}' has no targets"),
                });
            }
        }

        for tag in &self.ignore_export_tags {
            if tag.starts_with('@') {
                return Err(Error::InvalidConfig {
                    message: format!("export tag '{tag}' must be written without '@'"),
                });
            }
        }

        Ok(())
    }

    /// The issue kinds this run should report.
    ///
    /// `include` narrows, `exclude` subtracts, and member-level kinds stay
    /// off unless their mode flag is set.
    pub fn reported_kinds(&self) -> Vec<IssueKind> {
        IssueKind::all()
            .iter()
            .copied()
            .filter(|k| self.include.is_empty() || self.include.contains(k))
            .filter(|k| !self.exclude.contains(k))
            .filter(|k| match k {
                IssueKind::UnusedClassMember => self.include_class_members,
                IssueKind::UnusedEnumMember => self.include_enum_members,
                _ => true,
            })
            .collect()
    }

    /// Effective entry patterns for a workspace (overrides win wholesale).
    pub fn entry_for(&self, workspace_dir: &str) -> &[String] {
        match self.workspaces.get(workspace_dir) {
            Some(ws) if !ws.entry.is_empty() => &ws.entry,
            _ => &self.entry,
        }
    }

    /// Effective project patterns for a workspace.
    pub fn project_for(&self, workspace_dir: &str) -> &[String] {
        match self.workspaces.get(workspace_dir) {
            Some(ws) if !ws.project.is_empty() => &ws.project,
            _ => &self.project,
        }
    }

    /// Effective ignore patterns for a workspace (top-level plus overrides).
    pub fn ignore_for(&self, workspace_dir: &str) -> Vec<String> {
        let mut patterns = self.ignore.clone();
        if let Some(ws) = self.workspaces.get(workspace_dir) {
            patterns.extend(ws.ignore.iter().cloned());
        }
        patterns
    }

    /// Whether a plugin is explicitly disabled.
    pub fn plugin_disabled(&self, name: &str) -> bool {
        self.plugins.get(name) == Some(&false)
    }

    /// Whether a plugin is explicitly enabled (bypassing detection).
    pub fn plugin_enabled(&self, name: &str) -> bool {
        self.plugins.get(name) == Some(&true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_permissive() {
        let options = AnalyzerOptions::default();
        assert!(options.validate().is_ok());
        assert!(options.type_reachability_counts);
        assert!(!options.value_mode);
        // Member kinds stay off by default.
        let kinds = options.reported_kinds();
        assert!(!kinds.contains(&IssueKind::UnusedClassMember));
        assert!(!kinds.contains(&IssueKind::UnusedEnumMember));
        assert!(kinds.contains(&IssueKind::UnusedFile));
    }

    #[test]
    fn include_exclude_conflict_is_fatal() {
        let options = AnalyzerOptions {
            include: vec![IssueKind::UnusedFile],
            exclude: vec![IssueKind::UnusedFile],
            ..Default::default()
        };
        assert!(options.validate().is_err());
    }

    #[test]
    fn unknown_option_rejected() {
        let result: std::result::Result<AnalyzerOptions, _> =
            serde_json::from_str(r#"{ "entrry": ["src/index.ts"] }"#);
        assert!(result.is_err());
    }

    #[test]
    fn camel_case_field_names() {
        let options: AnalyzerOptions = serde_json::from_str(
            r#"{
                "entry": ["src/index.ts"],
                "ignoreDependencies": ["lodash"],
                "includeEntryExports": true
            }"#,
        )
        .unwrap();
        assert_eq!(options.ignore_dependencies, vec!["lodash"]);
        assert!(options.include_entry_exports);
    }

    #[test]
    fn member_kinds_gated_by_flags() {
        let options = AnalyzerOptions {
            include_class_members: true,
            ..Default::default()
        };
        let kinds = options.reported_kinds();
        assert!(kinds.contains(&IssueKind::UnusedClassMember));
        assert!(!kinds.contains(&IssueKind::UnusedEnumMember));
    }

    #[test]
    fn workspace_overrides() {
        let mut options = AnalyzerOptions {
            entry: vec!["src/index.ts".into()],
            ignore: vec!["**/fixtures/**".into()],
            ..Default::default()
        };
        options.workspaces.insert(
            "packages/app".into(),
            WorkspaceOptions {
                entry: vec!["app/main.ts".into()],
                ignore: vec!["**/*.gen.ts".into()],
                ..Default::default()
            },
        );

        assert_eq!(options.entry_for("packages/app"), ["app/main.ts"]);
        assert_eq!(options.entry_for("packages/lib"), ["src/index.ts"]);
        assert_eq!(
            options.ignore_for("packages/app"),
            vec!["**/fixtures/**".to_string(), "**/*.gen.ts".to_string()]
        );
    }
}

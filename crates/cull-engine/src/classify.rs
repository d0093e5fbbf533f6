//! Issue classification.
//!
//! Pure queries over the finished graph: diff the project universe
//! against the reachable set, read the attribution tables, match script
//! binaries against the installed registry, and walk export records for
//! anything without a reference. Ignore patterns apply last; filtered
//! issues are retained for transparency.

use crate::entries::{workspace_key, WorkspaceFiles};
use crate::graph::{Channel, FileGraph, FileKind};
use cull_core::{AnalyzerOptions, IgnoredIssue, Issue, IssueKind, Severity};
use cull_manifest::{is_os_binary, unscoped_name, AttributionTables, WorkspaceSet};
use cull_plugins::extract_from_shell;
use std::collections::BTreeMap;
use std::path::Path;

/// Everything the classifier reads.
pub struct ClassifyInput<'a> {
    /// The workspace tree.
    pub set: &'a WorkspaceSet,
    /// The finished reference graph.
    pub graph: &'a FileGraph,
    /// Dependency attribution tables.
    pub tables: &'a AttributionTables,
    /// Per-workspace file sets, indexed like the workspace set.
    pub files: &'a [WorkspaceFiles],
    /// Installed binary registry (bin name -> package).
    pub installed_bins: &'a BTreeMap<String, String>,
    /// Analyzer options.
    pub options: &'a AnalyzerOptions,
}

/// Run all derived reports.
pub fn classify(input: &ClassifyInput<'_>) -> (Vec<Issue>, Vec<IgnoredIssue>) {
    let mut sink = IssueSink::new(input);

    let kinds = input.options.reported_kinds();

    if kinds.contains(&IssueKind::UnusedFile) {
        unused_files(input, &mut sink);
    }
    if kinds.contains(&IssueKind::UnusedDependency) {
        unused_dependencies(input, &mut sink);
    }
    if kinds.contains(&IssueKind::UnlistedDependency) {
        unlisted_dependencies(input, &mut sink);
    }
    if kinds.contains(&IssueKind::UnlistedBinary) {
        unlisted_binaries(input, &mut sink);
    }
    unused_exports(input, &kinds, &mut sink);

    (sink.issues, sink.ignored)
}

/// Collects issues, diverting those matched by ignore patterns.
struct IssueSink<'a> {
    input: &'a ClassifyInput<'a>,
    issues: Vec<Issue>,
    ignored: Vec<IgnoredIssue>,
}

impl<'a> IssueSink<'a> {
    fn new(input: &'a ClassifyInput<'a>) -> Self {
        Self {
            input,
            issues: Vec::new(),
            ignored: Vec::new(),
        }
    }

    /// Push an issue; file-bearing issues go through the owning
    /// workspace's ignore patterns first.
    fn push(&mut self, ws_idx: usize, issue: Issue, file: Option<&Path>) {
        if let Some(file) = file {
            let ws_dir = &self.input.set.get(ws_idx).dir;
            if let Ok(rel) = file.strip_prefix(ws_dir) {
                if let Some(pattern) = self.input.files[ws_idx].ignore.matched_pattern(rel) {
                    self.ignored.push(IgnoredIssue {
                        issue,
                        matched_pattern: pattern.to_string(),
                    });
                    return;
                }
            }
        }
        self.issues.push(issue);
    }
}

/// (project ∖ ignore) ∖ reachable. Entries are seeds, so they are always
/// reachable and never show up here.
///
/// In value mode only the value channel keeps a file alive: a file
/// reached solely through type-only imports is reported.
fn unused_files(input: &ClassifyInput<'_>, sink: &mut IssueSink<'_>) {
    for ws_idx in input.set.iteration_order() {
        let ws = input.set.get(ws_idx);
        for path in &input.files[ws_idx].project {
            let reachable = input.graph.lookup(path).is_some_and(|id| {
                if input.options.value_mode {
                    input.graph.is_reachable(id, Channel::Value)
                } else {
                    input.graph.is_reachable_any(id)
                }
            });
            if reachable {
                continue;
            }
            let issue = Issue::new(ws.name.clone(), IssueKind::UnusedFile).with_file(path.clone());
            sink.push(ws_idx, issue, Some(path));
        }
    }
}

fn unused_dependencies(input: &ClassifyInput<'_>, sink: &mut IssueSink<'_>) {
    for ws_idx in input.set.iteration_order() {
        let ws = input.set.get(ws_idx);
        for (package, _kind) in input.tables.unused_in(ws_idx) {
            let issue = Issue::new(ws.name.clone(), IssueKind::UnusedDependency)
                .with_file(ws.manifest.path.clone())
                .with_symbol(package);
            sink.push(ws_idx, issue, None);
        }
    }
}

fn unlisted_dependencies(input: &ClassifyInput<'_>, sink: &mut IssueSink<'_>) {
    for (ws_idx, package) in input.graph.unlisted() {
        let ws = input.set.get(*ws_idx);
        if dependency_ignored(input, *ws_idx, package) {
            continue;
        }
        let issue = Issue::new(ws.name.clone(), IssueKind::UnlistedDependency)
            .with_file(ws.manifest.path.clone())
            .with_symbol(package.clone());
        sink.push(*ws_idx, issue, None);
    }
}

/// Script binaries with no provider: not installed, not a declared
/// dependency's own name, not OS-provided, not ignored.
fn unlisted_binaries(input: &ClassifyInput<'_>, sink: &mut IssueSink<'_>) {
    for ws_idx in input.set.iteration_order() {
        let ws = input.set.get(ws_idx);
        let mut seen: Vec<String> = Vec::new();

        for script in ws.manifest.scripts.values() {
            for invocation in extract_from_shell(script) {
                let binary = invocation.binary;
                if seen.contains(&binary) {
                    continue;
                }
                seen.push(binary.clone());

                if is_os_binary(&binary) || input.installed_bins.contains_key(&binary) {
                    continue;
                }
                // Without an install step the bin registry is empty; a
                // declared dependency whose unscoped name matches still
                // counts as listed.
                let declared = effective_dependency_names(input.set, ws_idx)
                    .any(|name| unscoped_name(&name) == binary);
                if declared || binary_ignored(input, ws_idx, &binary) {
                    continue;
                }

                let issue = Issue::new(ws.name.clone(), IssueKind::UnlistedBinary)
                    .with_file(ws.manifest.path.clone())
                    .with_symbol(binary);
                sink.push(ws_idx, issue, None);
            }
        }
    }
}

fn unused_exports(input: &ClassifyInput<'_>, kinds: &[IssueKind], sink: &mut IssueSink<'_>) {
    use crate::extract::ExportKind;

    let report_exports = kinds.contains(&IssueKind::UnusedExport);
    let report_class_members = kinds.contains(&IssueKind::UnusedClassMember);
    let report_enum_members = kinds.contains(&IssueKind::UnusedEnumMember);
    if !report_exports && !report_class_members && !report_enum_members {
        return;
    }

    for (id, record) in input.graph.files() {
        if record.kind != FileKind::Source || !input.graph.is_reachable_any(id) {
            continue;
        }
        let Some(summary) = input.graph.summary(id) else {
            continue;
        };

        let is_entry = input.graph.is_entry(id);
        if is_entry && !input.options.include_entry_exports {
            continue;
        }

        let ws_idx = record.workspace;
        let ws_name = input.set.get(ws_idx).name.clone();

        for export in &summary.exports {
            if export.tags.public || export.tags.has_any(&input.options.ignore_export_tags) {
                continue;
            }

            let (kind, referenced) = match &export.kind {
                ExportKind::ClassMember { .. } => {
                    if !report_class_members {
                        continue;
                    }
                    let member = member_short_name(&export.name);
                    if member.starts_with('_') {
                        continue;
                    }
                    (
                        IssueKind::UnusedClassMember,
                        input.graph.member_name_used(member),
                    )
                }
                ExportKind::EnumMember { .. } => {
                    if !report_enum_members {
                        continue;
                    }
                    let member = member_short_name(&export.name);
                    if member.starts_with('_') {
                        continue;
                    }
                    (
                        IssueKind::UnusedEnumMember,
                        input.graph.member_name_used(member),
                    )
                }
                _ => {
                    if !report_exports {
                        continue;
                    }
                    let referenced = input.graph.export_referenced(id, &export.name)
                        || (input.options.ignore_exports_used_in_file && export.used_in_file);
                    (IssueKind::UnusedExport, referenced)
                }
            };

            if referenced {
                continue;
            }

            let issue = Issue {
                workspace: ws_name.clone(),
                file: Some(record.path.clone()),
                symbol: Some(export.name.clone()),
                kind,
                severity: Severity::Warning,
                position: Some(export.position),
            };
            sink.push(ws_idx, issue, Some(&record.path));
        }
    }
}

fn member_short_name(name: &str) -> &str {
    name.rsplit_once('.').map(|(_, m)| m).unwrap_or(name)
}

fn dependency_ignored(input: &ClassifyInput<'_>, ws_idx: usize, package: &str) -> bool {
    ignore_patterns_match(
        &input.options.ignore_dependencies,
        ws_ignore_dependencies(input, ws_idx),
        package,
    )
}

fn binary_ignored(input: &ClassifyInput<'_>, ws_idx: usize, binary: &str) -> bool {
    ignore_patterns_match(
        &input.options.ignore_binaries,
        ws_ignore_binaries(input, ws_idx),
        binary,
    )
}

fn ws_ignore_dependencies<'a>(input: &'a ClassifyInput<'_>, ws_idx: usize) -> &'a [String] {
    let key = workspace_key(input.set, ws_idx);
    input
        .options
        .workspaces
        .get(&key)
        .map(|ws| ws.ignore_dependencies.as_slice())
        .unwrap_or(&[])
}

fn ws_ignore_binaries<'a>(input: &'a ClassifyInput<'_>, ws_idx: usize) -> &'a [String] {
    let key = workspace_key(input.set, ws_idx);
    input
        .options
        .workspaces
        .get(&key)
        .map(|ws| ws.ignore_binaries.as_slice())
        .unwrap_or(&[])
}

fn ignore_patterns_match(global: &[String], local: &[String], name: &str) -> bool {
    global
        .iter()
        .chain(local.iter())
        .filter_map(|p| glob::Pattern::new(p).ok())
        .any(|p| p.matches(name))
}

fn effective_dependency_names(
    set: &WorkspaceSet,
    ws_idx: usize,
) -> impl Iterator<Item = String> + '_ {
    let mut names = set.get(ws_idx).manifest.all_dependency_names();
    for ancestor in set.ancestors(ws_idx) {
        names.extend(set.get(ancestor).manifest.all_dependency_names());
    }
    names.sort();
    names.dedup();
    names.into_iter()
}

//! Issue and report types.
//!
//! An [`Issue`] is one reportable fact about the analyzed repository (an
//! unused file, an unlisted dependency, ...). The [`Report`] is the whole
//! output of an analysis pass: issues, issues filtered by ignore patterns
//! (kept for transparency), demoted errors, and summary counts.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The kind of problem an [`Issue`] describes.
///
/// Kinds double as the vocabulary for the `include`/`exclude` option
/// filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// A project file never reached from any entry point.
    UnusedFile,
    /// A declared dependency that nothing references.
    UnusedDependency,
    /// An imported package that no visible manifest declares.
    UnlistedDependency,
    /// A script binary that no installed package provides.
    UnlistedBinary,
    /// An export with no reference anywhere in the reachable set.
    UnusedExport,
    /// A class member never accessed outside its declaration.
    UnusedClassMember,
    /// An enum member never accessed outside its declaration.
    UnusedEnumMember,
}

impl IssueKind {
    /// All kinds in stable report order.
    pub fn all() -> &'static [IssueKind] {
        &[
            IssueKind::UnusedFile,
            IssueKind::UnusedDependency,
            IssueKind::UnlistedDependency,
            IssueKind::UnlistedBinary,
            IssueKind::UnusedExport,
            IssueKind::UnusedClassMember,
            IssueKind::UnusedEnumMember,
        ]
    }

    /// Display name for human-facing reporters.
    pub fn display_name(&self) -> &'static str {
        match self {
            IssueKind::UnusedFile => "Unused files",
            IssueKind::UnusedDependency => "Unused dependencies",
            IssueKind::UnlistedDependency => "Unlisted dependencies",
            IssueKind::UnlistedBinary => "Unlisted binaries",
            IssueKind::UnusedExport => "Unused exports",
            IssueKind::UnusedClassMember => "Unused class members",
            IssueKind::UnusedEnumMember => "Unused enum members",
        }
    }

    /// Identifier used by the `include`/`exclude` filters.
    pub fn filter_name(&self) -> &'static str {
        match self {
            IssueKind::UnusedFile => "files",
            IssueKind::UnusedDependency => "dependencies",
            IssueKind::UnlistedDependency => "unlisted",
            IssueKind::UnlistedBinary => "binaries",
            IssueKind::UnusedExport => "exports",
            IssueKind::UnusedClassMember => "class_members",
            IssueKind::UnusedEnumMember => "enum_members",
        }
    }

    /// Parse a filter identifier.
    pub fn from_filter_name(s: &str) -> Option<Self> {
        Self::all().iter().find(|k| k.filter_name() == s).copied()
    }

    /// Default severity for this kind.
    ///
    /// Unlisted artifacts break installs and CI, so they are errors;
    /// everything unused is a warning.
    pub fn default_severity(&self) -> Severity {
        match self {
            IssueKind::UnlistedDependency | IssueKind::UnlistedBinary => Severity::Error,
            _ => Severity::Warning,
        }
    }
}

/// Severity of an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Should be fixed; fails strict CI runs.
    Error,
    /// Worth cleaning up.
    Warning,
}

/// Source position of a symbol (1-indexed line, 0-indexed column).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcePosition {
    /// Line number (1-indexed).
    pub line: u32,
    /// Column number (0-indexed).
    pub column: u32,
}

/// One reportable fact about the analyzed repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    /// Name of the workspace the issue belongs to.
    pub workspace: String,
    /// File the issue points at (the manifest for dependency issues).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    /// Symbol the issue points at: an export name, a package name,
    /// a binary name, or `Class.member` / `Enum.Member`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    /// What kind of problem this is.
    pub kind: IssueKind,
    /// How serious it is.
    pub severity: Severity,
    /// Where the symbol is declared, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<SourcePosition>,
}

impl Issue {
    /// Create an issue with the kind's default severity.
    pub fn new(workspace: impl Into<String>, kind: IssueKind) -> Self {
        Self {
            workspace: workspace.into(),
            file: None,
            symbol: None,
            kind,
            severity: kind.default_severity(),
            position: None,
        }
    }

    /// Attach a file path.
    pub fn with_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Attach a symbol name.
    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }

    /// Attach a source position.
    pub fn with_position(mut self, position: SourcePosition) -> Self {
        self.position = Some(position);
        self
    }
}

/// Why a [`Diagnostic`] was emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A source file failed to parse and was admitted empty.
    Parse,
    /// A relative import did not resolve to a file.
    UnresolvedImport,
    /// A dynamic specifier could not be analyzed statically.
    DynamicImport,
    /// A file could not be read (non-entry; entries fail hard).
    Io,
    /// A plugin or configuration shape problem.
    Config,
}

/// A non-fatal problem encountered during analysis.
///
/// Every demoted error becomes a diagnostic; the analyzer never swallows
/// one silently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// File the diagnostic is about, when there is one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    /// What went wrong.
    pub message: String,
    /// Category of the problem.
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    /// Create a diagnostic attached to a file.
    pub fn for_file(file: impl Into<PathBuf>, kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            file: Some(file.into()),
            message: message.into(),
            kind,
        }
    }
}

/// An issue that was filtered out by an ignore pattern.
///
/// Always carried in the report so JSON consumers can see what was
/// suppressed and by which pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IgnoredIssue {
    /// The original issue.
    pub issue: Issue,
    /// The ignore pattern that matched it.
    pub matched_pattern: String,
}

/// Per-kind issue counts plus dependency coverage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// Unused file count.
    pub unused_files: usize,
    /// Unused dependency count.
    pub unused_dependencies: usize,
    /// Unlisted dependency count.
    pub unlisted_dependencies: usize,
    /// Unlisted binary count.
    pub unlisted_binaries: usize,
    /// Unused export count.
    pub unused_exports: usize,
    /// Unused class member count.
    pub unused_class_members: usize,
    /// Unused enum member count.
    pub unused_enum_members: usize,
    /// Number of issues suppressed by ignore patterns.
    pub ignored_issues: usize,
    /// Number of diagnostics attached to the report.
    pub diagnostics: usize,
    /// Declared-vs-used dependency coverage, when dependency analysis ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dependency_coverage: Option<DependencyCoverageStats>,
}

impl Summary {
    fn bump(&mut self, kind: IssueKind) {
        let slot = match kind {
            IssueKind::UnusedFile => &mut self.unused_files,
            IssueKind::UnusedDependency => &mut self.unused_dependencies,
            IssueKind::UnlistedDependency => &mut self.unlisted_dependencies,
            IssueKind::UnlistedBinary => &mut self.unlisted_binaries,
            IssueKind::UnusedExport => &mut self.unused_exports,
            IssueKind::UnusedClassMember => &mut self.unused_class_members,
            IssueKind::UnusedEnumMember => &mut self.unused_enum_members,
        };
        *slot += 1;
    }

    /// Count of all issues across kinds.
    pub fn total_issues(&self) -> usize {
        self.unused_files
            + self.unused_dependencies
            + self.unlisted_dependencies
            + self.unlisted_binaries
            + self.unused_exports
            + self.unused_class_members
            + self.unused_enum_members
    }
}

/// Declared-vs-used dependency coverage statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DependencyCoverageStats {
    /// Dependencies declared across all workspaces.
    pub total_declared: usize,
    /// Dependencies with at least one reference.
    pub total_used: usize,
    /// Dependencies with no reference.
    pub total_unused: usize,
}

impl DependencyCoverageStats {
    /// Used-over-declared percentage; 100 when nothing is declared.
    pub fn coverage_percentage(&self) -> f64 {
        if self.total_declared == 0 {
            100.0
        } else {
            (self.total_used as f64 / self.total_declared as f64) * 100.0
        }
    }
}

/// The complete output of one analysis pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Report {
    /// Issues, ordered by (workspace, kind, file, symbol).
    pub issues: Vec<Issue>,
    /// Issues filtered out by ignore patterns.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ignored_issues: Vec<IgnoredIssue>,
    /// Demoted errors.
    #[serde(default)]
    pub diagnostics: Vec<Diagnostic>,
    /// Per-kind counts.
    pub summary: Summary,
}

impl Report {
    /// Build a report, computing the summary from its parts.
    pub fn new(
        mut issues: Vec<Issue>,
        ignored_issues: Vec<IgnoredIssue>,
        diagnostics: Vec<Diagnostic>,
    ) -> Self {
        issues.sort_by(|a, b| {
            (&a.workspace, a.kind.filter_name(), &a.file, &a.symbol)
                .cmp(&(&b.workspace, b.kind.filter_name(), &b.file, &b.symbol))
        });

        let mut summary = Summary::default();
        for issue in &issues {
            summary.bump(issue.kind);
        }
        summary.ignored_issues = ignored_issues.len();
        summary.diagnostics = diagnostics.len();

        Self {
            issues,
            ignored_issues,
            diagnostics,
            summary,
        }
    }

    /// Issues of one kind, in report order.
    pub fn issues_of_kind(&self, kind: IssueKind) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(move |i| i.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_serialization_roundtrip() {
        let issue = Issue::new("root", IssueKind::UnlistedDependency)
            .with_file("package.json")
            .with_symbol("lodash");

        let json = serde_json::to_string(&issue).unwrap();
        let back: Issue = serde_json::from_str(&json).unwrap();
        assert_eq!(issue, back);
        assert_eq!(back.severity, Severity::Error);
    }

    #[test]
    fn kind_filter_names_roundtrip() {
        for kind in IssueKind::all() {
            assert_eq!(IssueKind::from_filter_name(kind.filter_name()), Some(*kind));
        }
        assert_eq!(IssueKind::from_filter_name("bogus"), None);
    }

    #[test]
    fn report_orders_issues_and_counts() {
        let issues = vec![
            Issue::new("pkg-b", IssueKind::UnusedExport).with_symbol("z"),
            Issue::new("pkg-a", IssueKind::UnusedFile).with_file("src/dead.ts"),
            Issue::new("pkg-a", IssueKind::UnusedExport).with_symbol("a"),
        ];

        let report = Report::new(issues, vec![], vec![]);

        assert_eq!(report.issues[0].workspace, "pkg-a");
        assert_eq!(report.summary.unused_exports, 2);
        assert_eq!(report.summary.unused_files, 1);
        assert_eq!(report.summary.total_issues(), 3);
    }

    #[test]
    fn report_determinism() {
        let a = vec![
            Issue::new("w", IssueKind::UnusedExport).with_symbol("b"),
            Issue::new("w", IssueKind::UnusedExport).with_symbol("a"),
        ];
        let b = vec![
            Issue::new("w", IssueKind::UnusedExport).with_symbol("a"),
            Issue::new("w", IssueKind::UnusedExport).with_symbol("b"),
        ];

        let ra = serde_json::to_string(&Report::new(a, vec![], vec![])).unwrap();
        let rb = serde_json::to_string(&Report::new(b, vec![], vec![])).unwrap();
        assert_eq!(ra, rb);
    }

    #[test]
    fn coverage_percentage() {
        let stats = DependencyCoverageStats {
            total_declared: 10,
            total_used: 7,
            total_unused: 3,
        };
        assert_eq!(stats.coverage_percentage(), 70.0);
        assert_eq!(DependencyCoverageStats::default().coverage_percentage(), 100.0);
    }
}

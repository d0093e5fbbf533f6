//! Reachability engine.
//!
//! A FIFO worklist fixpoint over the import graph: entries seed the list,
//! each popped file is parsed and extracted (once), its edges resolved,
//! and newly reachable internal files enqueued. External references feed
//! the dependency attribution tables; misses become diagnostics or
//! unlisted-dependency sightings. Files are processed at most once per
//! channel, so termination follows from monotone growth over a finite
//! universe.
//!
//! The walker is the single writer of the graph; extraction and
//! resolution only read files.

use crate::extract::{self, ExtractOptions, FileSummary, ImportClause};
use crate::graph::{Channel, FileGraph, FileId, FileKind};
use crate::parser::{CompilerRegistry, SourceKind};
use crate::resolver::{ModuleResolver, Resolution};
use cull_core::{AnalyzerOptions, Diagnostic, DiagnosticKind, Error, Result};
use cull_fs::FileSystem;
use cull_manifest::{extract_package_name, AttributionTables, WorkspaceSet};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// The reachability walker.
pub struct Walker<'a, F: FileSystem> {
    fs: &'a F,
    set: &'a WorkspaceSet,
    options: &'a AnalyzerOptions,
    compilers: &'a CompilerRegistry,
    resolver: &'a mut ModuleResolver,
    graph: &'a mut FileGraph,
    tables: &'a mut AttributionTables,
    diagnostics: Vec<Diagnostic>,
}

impl<'a, F: FileSystem> Walker<'a, F> {
    /// Assemble a walker over shared analysis state.
    pub fn new(
        fs: &'a F,
        set: &'a WorkspaceSet,
        options: &'a AnalyzerOptions,
        compilers: &'a CompilerRegistry,
        resolver: &'a mut ModuleResolver,
        graph: &'a mut FileGraph,
        tables: &'a mut AttributionTables,
    ) -> Self {
        Self {
            fs,
            set,
            options,
            compilers,
            resolver,
            graph,
            tables,
            diagnostics: Vec::new(),
        }
    }

    /// Run the fixpoint from the given seeds.
    ///
    /// Seeds must already be in deterministic order (workspace depth,
    /// then path); everything downstream preserves it.
    pub async fn walk(mut self, seeds: Vec<FileId>) -> Result<Vec<Diagnostic>> {
        let mut worklist: VecDeque<(FileId, Channel)> = VecDeque::new();
        let mut processed: rustc_hash::FxHashSet<(FileId, Channel)> =
            rustc_hash::FxHashSet::default();

        for id in seeds {
            self.graph.mark_reachable(id, Channel::Value);
            worklist.push_back((id, Channel::Value));
        }

        while let Some((id, channel)) = worklist.pop_front() {
            if !processed.insert((id, channel)) {
                continue;
            }
            if self.graph.record(id).kind != FileKind::Source {
                continue;
            }

            let Some(summary) = self.load_summary(id).await? else {
                continue;
            };

            let path = self.graph.path(id).to_path_buf();
            let ws = self.graph.record(id).workspace;

            for edge in &summary.imports {
                let edge_channel = if channel == Channel::Type || edge.is_type_only {
                    Channel::Type
                } else {
                    Channel::Value
                };

                let resolution = self
                    .resolver
                    .resolve(self.fs, self.set, &edge.specifier, &path, ws, edge.is_type_only)
                    .await?;

                match resolution {
                    Resolution::Internal(target_path) => {
                        let kind = if SourceKind::from_path(&target_path).is_parseable()
                            || self.compilers.for_path(&target_path).is_some()
                        {
                            FileKind::Source
                        } else {
                            FileKind::Asset
                        };
                        let owner = self.set.owner_of(&target_path).unwrap_or(ws);
                        let target = self.graph.intern(&target_path, kind, owner);

                        self.apply_reference_marks(target, &edge.clauses);

                        if self.graph.mark_reachable(target, edge_channel) {
                            worklist.push_back((target, edge_channel));
                        }
                    }
                    Resolution::External { package, .. } => {
                        self.record_external(ws, &package, &path, edge.is_type_only);
                    }
                    Resolution::Unresolved => {
                        if edge.specifier.starts_with('.') || edge.specifier.starts_with('/') {
                            self.diagnostics.push(Diagnostic::for_file(
                                &path,
                                DiagnosticKind::UnresolvedImport,
                                format!("cannot resolve import '{}'", edge.specifier),
                            ));
                        } else {
                            // A bare specifier with no resolution is a
                            // missing dependency declaration.
                            self.graph
                                .record_unlisted(ws, extract_package_name(&edge.specifier).to_string());
                        }
                    }
                }
            }

            for span in &summary.dynamic_unresolvable {
                self.diagnostics.push(Diagnostic::for_file(
                    &path,
                    DiagnosticKind::DynamicImport,
                    format!("dynamic import with non-literal specifier at offset {span}"),
                ));
            }
        }

        debug!(
            files = self.graph.len(),
            diagnostics = self.diagnostics.len(),
            "reachability fixpoint complete"
        );

        Ok(self.diagnostics)
    }

    /// Read, compile and extract a file, caching the summary on the graph.
    ///
    /// I/O failures are fatal for entry files and demoted to diagnostics
    /// otherwise. Parse and compile failures always demote: the file is
    /// admitted empty.
    async fn load_summary(&mut self, id: FileId) -> Result<Option<Arc<FileSummary>>> {
        if let Some(summary) = self.graph.summary(id) {
            return Ok(Some(summary.clone()));
        }

        let path = self.graph.path(id).to_path_buf();
        let source = match self.fs.read_to_string(&path).await {
            Ok(source) => source,
            Err(e) => {
                if self.graph.is_entry(id) {
                    return Err(Error::EntryPointNotFound { path });
                }
                self.diagnostics.push(Diagnostic::for_file(
                    &path,
                    DiagnosticKind::Io,
                    format!("cannot read file: {e}"),
                ));
                return Ok(None);
            }
        };

        let (source, kind) = match self.compilers.for_path(&path) {
            Some(compiler) => match compiler.compile(&path, &source) {
                // Compiled output is treated as TSX, the most permissive
                // flavor.
                Ok(compiled) => (compiled, SourceKind::Tsx),
                Err(message) => {
                    self.diagnostics.push(Diagnostic::for_file(
                        &path,
                        DiagnosticKind::Parse,
                        format!("compiler failed: {message}"),
                    ));
                    (String::new(), SourceKind::Tsx)
                }
            },
            None => {
                let kind = SourceKind::from_path(&path);
                (source, kind)
            }
        };

        let extract_options = ExtractOptions {
            class_members: self.options.include_class_members,
            enum_members: self.options.include_enum_members,
        };
        let summary = extract::extract_summary(&path, &source, kind, extract_options);

        for error in &summary.parse_errors {
            self.diagnostics.push(Diagnostic::for_file(
                &path,
                DiagnosticKind::Parse,
                error.clone(),
            ));
        }

        self.graph
            .record_member_accesses(summary.member_accesses.iter().map(String::as_str));

        let summary = Arc::new(summary);
        self.graph.set_summary(id, summary.clone());
        Ok(Some(summary))
    }

    /// Turn an edge's clauses into reference marks on the target file.
    fn apply_reference_marks(&mut self, target: FileId, clauses: &[ImportClause]) {
        for clause in clauses {
            match clause {
                ImportClause::Named { imported, used } => {
                    if *used {
                        self.graph.mark_export_referenced(target, imported);
                    }
                }
                ImportClause::Default { used } => {
                    if *used {
                        self.graph.mark_export_referenced(target, "default");
                    }
                }
                ImportClause::Namespace(access) => {
                    if access.whole {
                        self.graph.mark_all_exports_referenced(target);
                    } else {
                        for member in &access.members {
                            self.graph.mark_export_referenced(target, member);
                        }
                    }
                }
                ImportClause::ReExportNamed(names) => {
                    for (source_name, _) in names {
                        self.graph.mark_export_referenced(target, source_name);
                    }
                }
                // Star re-exports make every export visible downstream.
                ImportClause::ReExportAll { .. } => {
                    self.graph.mark_all_exports_referenced(target);
                }
                ImportClause::SideEffect => {}
            }
        }
    }

    /// Credit an external package reference or record it as unlisted.
    fn record_external(&mut self, ws: usize, package: &str, from: &Path, type_only: bool) {
        if crate::resolver::is_builtin(package) {
            return;
        }

        let counts = !type_only || self.options.type_reachability_counts;
        if counts {
            let credited =
                self.tables
                    .record_file_reference(self.set, ws, package, from.to_path_buf());
            if credited.is_none() {
                self.graph.record_unlisted(ws, package.to_string());
            }
        } else if !self.set.visible_in(ws, package) {
            self.graph.record_unlisted(ws, package.to_string());
        }
    }
}


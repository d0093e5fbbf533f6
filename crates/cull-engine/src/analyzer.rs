//! The analyzer pipeline.
//!
//! Phase order: workspaces, dependency tables, plugin detection,
//! entry/project resolution, the reachability fixpoint, classification.
//! Everything lives for one pass; the returned [`Report`] is the only
//! output.

use crate::classify::{classify, ClassifyInput};
use crate::entries::{resolve_workspace_files, workspace_key, WorkspaceFiles};
use crate::graph::{FileGraph, FileId, FileKind};
use crate::parser::{Compiler, CompilerRegistry, SourceKind};
use crate::resolver::ModuleResolver;
use crate::walker::Walker;
use cull_core::{AnalyzerOptions, Error, Report, Result};
use cull_fs::{DiscoveryOptions, FileSystem};
use cull_manifest::{collect_installed_bins, AttributionTables, WorkspaceSet};
use cull_plugins::{CompiledPlugin, DetectionInput, PluginOutput, PluginRegistry};
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::{debug, info};

/// Source file extensions discovered as project files.
const SOURCE_EXTENSIONS: &[&str] = &[
    ".js", ".mjs", ".cjs", ".jsx", ".ts", ".mts", ".cts", ".tsx",
];

/// The project-wide unused-code analyzer.
///
/// # Example
///
/// ```no_run
/// use cull_engine::Analyzer;
/// use cull_core::AnalyzerOptions;
/// use cull_fs::NativeFileSystem;
///
/// # #[tokio::main]
/// # async fn main() -> cull_core::Result<()> {
/// let fs = NativeFileSystem::new(".")?;
/// let analyzer = Analyzer::new(AnalyzerOptions::default())?;
/// let report = analyzer.analyze(&fs).await?;
/// println!("{} issues", report.summary.total_issues());
/// # Ok(())
/// # }
/// ```
pub struct Analyzer {
    options: AnalyzerOptions,
    compilers: CompilerRegistry,
    plugins: PluginRegistry,
}

impl Analyzer {
    /// Validate options and assemble the analyzer with the built-in
    /// plugin set.
    pub fn new(options: AnalyzerOptions) -> Result<Self> {
        options.validate()?;
        let plugins = PluginRegistry::with_built_ins().map_err(|e| Error::Plugin {
            plugin: "built-in".to_string(),
            message: e.to_string(),
        })?;
        Ok(Self {
            options,
            compilers: CompilerRegistry::new(),
            plugins,
        })
    }

    /// Register a compiler for a non-standard extension (`vue`,
    /// `svelte`, ...).
    pub fn register_compiler(&mut self, extension: impl Into<String>, compiler: Box<dyn Compiler>) {
        self.compilers.register(extension, compiler);
    }

    /// Register an additional plugin definition.
    pub fn register_plugin(&mut self, plugin: CompiledPlugin) {
        self.plugins.register(plugin);
    }

    /// Run one analysis pass over the filesystem's project root.
    pub async fn analyze<F: FileSystem>(&self, fs: &F) -> Result<Report> {
        // Workspace tree and dependency buckets.
        let set = WorkspaceSet::load(fs).await?;
        info!(workspaces = set.len(), "loaded workspace tree");

        let mut tables = AttributionTables::new(&set);
        for ws_idx in 0..set.len() {
            let key = workspace_key(&set, ws_idx);
            let mut patterns = self.options.ignore_dependencies.clone();
            if let Some(overrides) = self.options.workspaces.get(&key) {
                patterns.extend(overrides.ignore_dependencies.iter().cloned());
            }
            tables.mark_ignored(ws_idx, &patterns);
        }

        // Plugin detection, once per workspace.
        let mut plugin_outputs: Vec<Vec<PluginOutput>> = Vec::with_capacity(set.len());
        for ws_idx in 0..set.len() {
            let outputs = self.detect_plugins(fs, &set, ws_idx).await?;
            for output in &outputs {
                for (package, _scope) in &output.attributed {
                    tables.record_plugin_reference(&set, ws_idx, package, &output.plugin);
                }
            }
            plugin_outputs.push(outputs);
        }

        // Project discovery: one walk from the root, files assigned to
        // their nearest enclosing workspace.
        let mut extensions: Vec<String> = SOURCE_EXTENSIONS.iter().map(|s| s.to_string()).collect();
        extensions.extend(self.compilers.extensions().map(|e| format!(".{e}")));
        let extension_refs: Vec<&str> = extensions.iter().map(String::as_str).collect();

        let discovered = fs
            .discover_files(
                fs.project_root(),
                &extension_refs,
                &["**/node_modules/**"],
                &DiscoveryOptions::default(),
            )
            .await?;

        let mut owned: Vec<BTreeSet<PathBuf>> = vec![BTreeSet::new(); set.len()];
        for path in discovered {
            if let Some(owner) = set.owner_of(&path) {
                owned[owner].insert(path);
            }
        }

        // Entry/project expansion per workspace.
        let mut files: Vec<WorkspaceFiles> = Vec::with_capacity(set.len());
        for ws_idx in 0..set.len() {
            let ws_files = resolve_workspace_files(
                fs,
                &set,
                ws_idx,
                &self.options,
                &plugin_outputs[ws_idx],
                &owned[ws_idx],
            )
            .await?;
            for package in &ws_files.bare_entry_packages {
                tables.record_plugin_reference(&set, ws_idx, package, "manifest");
            }
            files.push(ws_files);
        }

        // Reachability fixpoint. Seeds ordered by workspace depth
        // (ancestors first), then path, so reports reproduce byte-for-byte.
        let mut graph = FileGraph::new();
        let mut seed_keys: Vec<(usize, PathBuf, usize)> = Vec::new();
        for ws_idx in 0..set.len() {
            for entry in &files[ws_idx].entries {
                seed_keys.push((set.get(ws_idx).depth, entry.clone(), ws_idx));
            }
        }
        seed_keys.sort();

        let mut seeds: Vec<FileId> = Vec::with_capacity(seed_keys.len());
        for (_, path, ws_idx) in seed_keys {
            let kind = if SourceKind::from_path(&path).is_parseable()
                || self.compilers.for_path(&path).is_some()
            {
                FileKind::Source
            } else {
                FileKind::Asset
            };
            let id = graph.intern(&path, kind, ws_idx);
            graph.mark_entry(id);
            // Interning dedups; the walker skips repeats per channel.
            seeds.push(id);
        }

        let mut resolver = ModuleResolver::new(&self.options.paths)?;
        let walker = Walker::new(
            fs,
            &set,
            &self.options,
            &self.compilers,
            &mut resolver,
            &mut graph,
            &mut tables,
        );
        let diagnostics = walker.walk(seeds).await?;

        // Derived reports.
        let installed_bins = collect_installed_bins(fs, &set).await;
        let (issues, ignored) = classify(&ClassifyInput {
            set: &set,
            graph: &graph,
            tables: &tables,
            files: &files,
            installed_bins: &installed_bins,
            options: &self.options,
        });

        let mut report = Report::new(issues, ignored, diagnostics);
        report.summary.dependency_coverage = Some(tables.coverage());

        debug!(
            issues = report.issues.len(),
            diagnostics = report.diagnostics.len(),
            "analysis complete"
        );

        Ok(report)
    }

    /// Build the detection input for one workspace and run the registry.
    async fn detect_plugins<F: FileSystem>(
        &self,
        fs: &F,
        set: &WorkspaceSet,
        ws_idx: usize,
    ) -> Result<Vec<PluginOutput>> {
        let ws = set.get(ws_idx);

        // Config files live in the workspace root, or one level into
        // dot-directories (.storybook/main.ts, .husky/pre-commit).
        let mut root_files: Vec<String> = Vec::new();
        if let Ok(names) = fs.read_dir(&ws.dir).await {
            for name in names {
                let child = ws.dir.join(&name);
                if name.starts_with('.') && fs.metadata(&child).await?.is_dir {
                    if let Ok(nested) = fs.read_dir(&child).await {
                        for inner in nested {
                            root_files.push(format!("{name}/{inner}"));
                        }
                    }
                } else {
                    root_files.push(name);
                }
            }
        }

        let dependency_names = ws.manifest.all_dependency_names();
        let dependencies: BTreeSet<&str> = dependency_names.iter().map(String::as_str).collect();

        let enabled: BTreeSet<&str> = self
            .options
            .plugins
            .iter()
            .filter(|(_, &on)| on)
            .map(|(name, _)| name.as_str())
            .collect();
        let disabled: BTreeSet<&str> = self
            .options
            .plugins
            .iter()
            .filter(|(_, &on)| !on)
            .map(|(name, _)| name.as_str())
            .collect();

        let input = DetectionInput {
            root_files: &root_files,
            dependencies,
            scripts: &ws.manifest.scripts,
            enabled,
            disabled,
        };

        Ok(self.plugins.detect(&input))
    }
}

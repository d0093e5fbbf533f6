//! Cull engine - the reachability and reference-resolution core.
//!
//! Given a repository, the engine computes the transitive closure of
//! reachable source files from declared entry points, builds the
//! export/import reference graph, and derives the unused-artifact report:
//! unused files, unused and unlisted dependencies, unlisted binaries,
//! unused exports, and unused class/enum members.
//!
//! # Pipeline
//!
//! ```text
//! WorkspaceSet ──► PluginRegistry ──► entry/project sets
//!      │                                    │
//!      ▼                                    ▼
//! AttributionTables ◄────────── Walker (fixpoint over FileGraph)
//!      │                                    │
//!      └──────────────► classify ◄──────────┘
//!                           │
//!                           ▼
//!                        Report
//! ```
//!
//! The walker is the single writer of the graph; extraction and
//! resolution are pure over file contents, with write-once caches for
//! parsed summaries and resolution results. Given identical inputs the
//! report is byte-identical across runs.
//!
//! # Example
//!
//! ```no_run
//! use cull_core::AnalyzerOptions;
//! use cull_engine::Analyzer;
//! use cull_fs::NativeFileSystem;
//!
//! # #[tokio::main]
//! # async fn main() -> cull_core::Result<()> {
//! let fs = NativeFileSystem::new(".")?;
//! let analyzer = Analyzer::new(AnalyzerOptions::default())?;
//! let report = analyzer.analyze(&fs).await?;
//!
//! for issue in &report.issues {
//!     println!("{:?}: {:?} {:?}", issue.kind, issue.file, issue.symbol);
//! }
//! # Ok(())
//! # }
//! ```

pub mod analyzer;
pub mod classify;
pub mod entries;
pub mod extract;
pub mod graph;
pub mod parser;
pub mod resolver;
pub mod walker;

#[cfg(feature = "logging")]
pub mod logging;

pub use analyzer::Analyzer;
pub use entries::{OrderedGlobs, WorkspaceFiles, DEFAULT_ENTRY_PATTERNS, DEFAULT_PROJECT_PATTERNS};
pub use extract::{ExportKind, ExportRecord, FileSummary, ImportClause, ImportEdge};
pub use graph::{Channel, FileGraph, FileId, FileKind};
pub use parser::{Compiler, CompilerRegistry, SourceKind};
pub use resolver::{ModuleResolver, Resolution};

#[cfg(feature = "logging")]
pub use logging::{init_logging, LogLevel};

//! Cull core - shared types for the unused-code analyzer.
//!
//! This crate defines the vocabulary the rest of cull speaks:
//!
//! - [`Issue`], [`Report`], [`Diagnostic`]: the analyzer's output surface
//! - [`AnalyzerOptions`]: the configuration surface collaborators feed in
//! - [`Error`]: the fatal-error taxonomy
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │   cull-engine    │  (resolver, walker, classifier)
//! └───┬────┬────┬────┘
//!     │    │    │
//!     ▼    ▼    ▼
//! ┌────────┐ ┌──────────────┐ ┌──────────────┐
//! │cull-fs │ │cull-manifest │ │ cull-plugins │
//! └───┬────┘ └──────┬───────┘ └──────┬───────┘
//!     │             │                │
//!     └─────────────┴───────┬────────┘
//!                           ▼
//!                  ┌─────────────────┐
//!                  │    cull-core    │  (this crate)
//!                  └─────────────────┘
//! ```
//!
//! Reporters and the CLI consume [`Report`]; its serde representation is the
//! stable machine-readable schema.

pub mod error;
pub mod issue;
pub mod options;

pub use error::{Error, Result};
pub use issue::{
    DependencyCoverageStats, Diagnostic, DiagnosticKind, IgnoredIssue, Issue, IssueKind, Report,
    Severity, SourcePosition, Summary,
};
pub use options::{AnalyzerOptions, WorkspaceOptions};

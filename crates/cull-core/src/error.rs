//! Error types for cull.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for cull operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during analysis.
///
/// Only configuration and manifest problems are fatal. Parse errors,
/// resolution misses and most I/O problems are demoted to per-file
/// [`Diagnostic`](crate::Diagnostic)s so a single broken file cannot take
/// down a whole run.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration is invalid (unknown option, conflicting roots, ...).
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the configuration error.
        message: String,
    },

    /// A glob pattern failed to compile.
    #[error("Pattern error: {0}")]
    Pattern(String),

    /// A package manifest could not be parsed.
    #[error("Manifest parse error in {file}: {source}")]
    ManifestParse {
        /// Path to the manifest with the error.
        file: PathBuf,
        /// The underlying JSON parsing error.
        #[source]
        source: serde_json::Error,
    },

    /// A workspace definition file (pnpm-workspace.yaml) could not be parsed.
    #[error("Workspace config parse error in {file}: {source}")]
    WorkspaceYaml {
        /// Path to the YAML file with the error.
        file: PathBuf,
        /// The underlying YAML parsing error.
        #[source]
        source: serde_yaml::Error,
    },

    /// The workspace member graph contains a cycle.
    #[error("Cyclic workspace graph: {}", format_chain(chain))]
    CyclicWorkspace {
        /// The directories forming the cycle, in discovery order.
        chain: Vec<PathBuf>,
    },

    /// No package manifest was found at or above the requested root.
    #[error("No package.json found in {searched}")]
    NoManifest {
        /// Path that was searched.
        searched: PathBuf,
    },

    /// An explicitly named entry point does not exist.
    #[error("Entry point not found: {path}")]
    EntryPointNotFound {
        /// Path to the missing entry point.
        path: PathBuf,
    },

    /// A plugin definition is invalid.
    #[error("Plugin error ({plugin}): {message}")]
    Plugin {
        /// Name of the plugin with the problem.
        plugin: String,
        /// Description of the problem.
        message: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn format_chain(chain: &[PathBuf]) -> String {
    chain
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

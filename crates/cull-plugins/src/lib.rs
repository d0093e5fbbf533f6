//! Cull plugins - declarative tool adapters.
//!
//! A plugin maps a tool's footprint (config files, dependencies, scripts)
//! to extra entry patterns and dependency attributions. Definitions are
//! TOML documents; the built-in set covers common JavaScript tooling and
//! user definitions can be registered alongside them.
//!
//! # Example
//!
//! ```toml
//! [plugin]
//! name = "vitest"
//!
//! [detect]
//! config_files = ["vitest.config.{js,ts}"]
//! dependencies = ["vitest"]
//!
//! entry = ["**/*.{test,spec}.ts"]
//!
//! [[attribute]]
//! package = "vitest"
//! scope = "development"
//! ```

pub mod built_in;
pub mod definition;
pub mod registry;
pub mod script;

pub use built_in::load_built_in_plugins;
pub use definition::{
    AttributedDependency, CompiledPlugin, DependencyScope, DetectionSpec, PluginDefinition,
    PluginMeta,
};
pub use registry::{DetectionInput, PluginOutput, PluginRegistry};
pub use script::{extract_from_shell, ScriptInvocation};

/// Result type for plugin operations.
pub type Result<T> = std::result::Result<T, PluginError>;

/// Error types for the plugin registry.
#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    /// A pattern failed validation.
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    /// A definition failed to parse.
    #[error("Invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    /// A script regex failed to compile.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// A config-file glob failed to compile.
    #[error("Glob error: {0}")]
    Glob(#[from] globset::Error),
}

//! TOML plugin definitions and their compiled form.
//!
//! A plugin is a declarative record: how to detect the tool in a
//! workspace, which extra entry/project patterns it contributes, and
//! which dependencies it vouches for. Definitions are data, so adding a
//! tool needs no code change.

use crate::{PluginError, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

/// Maximum regex pattern length (guards against pathological rules).
const MAX_REGEX_LEN: usize = 500;

/// Maximum DFA size for regex compilation (2MB).
const MAX_DFA_SIZE: usize = 2 * 1024 * 1024;

/// A complete plugin definition file.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PluginDefinition {
    /// Plugin metadata.
    pub plugin: PluginMeta,

    /// Detection rules; a plugin with no rules only fires when explicitly
    /// enabled.
    #[serde(default)]
    pub detect: DetectionSpec,

    /// Entry file patterns the tool implies (globs, workspace-relative).
    #[serde(default)]
    pub entry: Vec<String>,

    /// Project file patterns the tool implies.
    #[serde(default)]
    pub project: Vec<String>,

    /// Dependencies the tool guarantees are used.
    #[serde(default, rename = "attribute")]
    pub attributes: Vec<AttributedDependency>,
}

/// Plugin metadata.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PluginMeta {
    /// Plugin name (the toggle key in analyzer options).
    pub name: String,

    /// Human-readable description.
    #[serde(default)]
    pub description: Option<String>,
}

/// How a plugin detects its tool in a workspace.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DetectionSpec {
    /// Config file globs (e.g., `vitest.config.{js,ts}`).
    #[serde(default)]
    pub config_files: Vec<String>,

    /// Dependency names whose presence in any bucket fires the plugin.
    #[serde(default)]
    pub dependencies: Vec<String>,

    /// Regex patterns matched against `scripts` values.
    #[serde(default)]
    pub scripts: Vec<String>,
}

/// A dependency a plugin vouches for.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AttributedDependency {
    /// Package name.
    pub package: String,

    /// Whether the tool makes this a production or development concern.
    #[serde(default)]
    pub scope: DependencyScope,
}

/// Production-vs-dev classification of an attributed dependency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyScope {
    /// Needed at runtime.
    Production,
    /// Tooling-only.
    #[default]
    Development,
}

/// A plugin definition with its matchers compiled.
#[derive(Debug, Clone)]
pub struct CompiledPlugin {
    /// The source definition.
    pub definition: PluginDefinition,
    /// Compiled config-file matcher.
    pub config_matcher: GlobSet,
    /// Compiled script regexes.
    pub script_patterns: Vec<Regex>,
}

impl CompiledPlugin {
    /// Parse and compile a TOML definition.
    ///
    /// Unknown keys, oversized regexes and invalid globs all fail here so
    /// a broken definition never silently half-works.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let definition: PluginDefinition = toml::from_str(source)?;
        Self::compile(definition)
    }

    /// Compile a parsed definition.
    pub fn compile(definition: PluginDefinition) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &definition.detect.config_files {
            builder.add(Glob::new(pattern)?);
        }
        let config_matcher = builder.build()?;

        let mut script_patterns = Vec::new();
        for pattern in &definition.detect.scripts {
            if pattern.len() > MAX_REGEX_LEN {
                return Err(PluginError::InvalidPattern(format!(
                    "script pattern too long (max {} chars): {}",
                    MAX_REGEX_LEN,
                    pattern.len()
                )));
            }
            let regex = RegexBuilder::new(pattern)
                .dfa_size_limit(MAX_DFA_SIZE)
                .build()?;
            script_patterns.push(regex);
        }

        Ok(Self {
            definition,
            config_matcher,
            script_patterns,
        })
    }

    /// The plugin name.
    pub fn name(&self) -> &str {
        &self.definition.plugin.name
    }

    /// Whether a workspace-relative file name matches a config pattern.
    pub fn matches_config_file(&self, file: &str) -> bool {
        self.config_matcher.is_match(file)
    }

    /// Whether a script command line matches a script pattern.
    pub fn matches_script(&self, script: &str) -> bool {
        self.script_patterns.iter().any(|r| r.is_match(script))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VITEST: &str = r#"
        entry = ["vitest.config.{js,mjs,ts,cts,mts}"]

        [plugin]
        name = "vitest"
        description = "Vitest test runner"

        [detect]
        config_files = ["vitest.config.{js,mjs,ts,cts,mts}"]
        dependencies = ["vitest"]
        scripts = ["(?:^|\\s)vitest(?:\\s|$)"]

        [[attribute]]
        package = "vitest"
        scope = "development"
    "#;

    #[test]
    fn compiles_and_matches() {
        let plugin = CompiledPlugin::from_toml_str(VITEST).unwrap();
        assert_eq!(plugin.name(), "vitest");
        assert!(plugin.matches_config_file("vitest.config.ts"));
        assert!(!plugin.matches_config_file("jest.config.ts"));
        assert!(plugin.matches_script("vitest run --coverage"));
        assert!(!plugin.matches_script("npx vitest-preview"));
    }

    #[test]
    fn unknown_keys_rejected() {
        let bad = r#"
            [plugin]
            name = "x"
            unknown_field = true
        "#;
        assert!(CompiledPlugin::from_toml_str(bad).is_err());
    }

    #[test]
    fn oversized_regex_rejected() {
        let long = "a".repeat(MAX_REGEX_LEN + 1);
        let toml = format!(
            r#"
            [plugin]
            name = "x"
            [detect]
            scripts = ["{long}"]
            "#
        );
        assert!(CompiledPlugin::from_toml_str(&toml).is_err());
    }

    #[test]
    fn attribute_scope_defaults_to_development() {
        let toml = r#"
            [plugin]
            name = "x"
            [[attribute]]
            package = "x"
        "#;
        let plugin = CompiledPlugin::from_toml_str(toml).unwrap();
        assert_eq!(
            plugin.definition.attributes[0].scope,
            DependencyScope::Development
        );
    }
}

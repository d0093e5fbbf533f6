//! Plugin registry and detection.
//!
//! Holds the compiled plugin set and runs detection once per workspace:
//! a plugin fires on a present config file, a declared dependency, a
//! matching script, or an explicit enable. The outputs of all fired
//! plugins union.

use crate::definition::{CompiledPlugin, DependencyScope};
use crate::script::extract_from_shell;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// What one workspace looks like to plugin detection.
#[derive(Debug)]
pub struct DetectionInput<'a> {
    /// Workspace-relative names of files in the workspace root (config
    /// files live there).
    pub root_files: &'a [String],
    /// Declared dependency names, all buckets.
    pub dependencies: BTreeSet<&'a str>,
    /// npm scripts.
    pub scripts: &'a BTreeMap<String, String>,
    /// Plugins forced on.
    pub enabled: BTreeSet<&'a str>,
    /// Plugins forced off.
    pub disabled: BTreeSet<&'a str>,
}

static EMPTY_SCRIPTS: BTreeMap<String, String> = BTreeMap::new();

impl Default for DetectionInput<'_> {
    fn default() -> Self {
        Self {
            root_files: &[],
            dependencies: BTreeSet::new(),
            scripts: &EMPTY_SCRIPTS,
            enabled: BTreeSet::new(),
            disabled: BTreeSet::new(),
        }
    }
}

/// The contribution of one fired plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginOutput {
    /// Plugin name.
    pub plugin: String,
    /// Entry glob patterns to add to the workspace.
    pub entry: Vec<String>,
    /// Project glob patterns to add.
    pub project: Vec<String>,
    /// Dependencies the plugin vouches for, with their classification.
    pub attributed: Vec<(String, DependencyScope)>,
    /// Files referenced by matching script commands.
    pub script_files: Vec<String>,
}

/// Registry of compiled plugins.
#[derive(Debug, Default)]
pub struct PluginRegistry {
    plugins: Vec<CompiledPlugin>,
}

impl PluginRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry preloaded with the built-in plugin set.
    pub fn with_built_ins() -> crate::Result<Self> {
        Ok(Self {
            plugins: crate::built_in::load_built_in_plugins()?,
        })
    }

    /// Register an additional plugin.
    pub fn register(&mut self, plugin: CompiledPlugin) {
        self.plugins.push(plugin);
    }

    /// All registered plugins.
    pub fn plugins(&self) -> &[CompiledPlugin] {
        &self.plugins
    }

    /// Run detection for one workspace.
    ///
    /// Each plugin is evaluated at most once; results come back in
    /// registration order so output is deterministic.
    pub fn detect(&self, input: &DetectionInput<'_>) -> Vec<PluginOutput> {
        let mut outputs = Vec::new();

        for plugin in &self.plugins {
            let name = plugin.name();
            if input.disabled.contains(name) {
                continue;
            }

            let fired = input.enabled.contains(name)
                || input.root_files.iter().any(|f| plugin.matches_config_file(f))
                || plugin
                    .definition
                    .detect
                    .dependencies
                    .iter()
                    .any(|d| input.dependencies.contains(d.as_str()))
                || input.scripts.values().any(|s| plugin.matches_script(s));

            if !fired {
                continue;
            }

            debug!(plugin = name, "plugin fired");

            // Scripts that mention the tool may also name entry files.
            let mut script_files = Vec::new();
            for script in input.scripts.values() {
                if plugin.matches_script(script) {
                    for invocation in extract_from_shell(script) {
                        script_files.extend(invocation.referenced_files);
                    }
                }
            }
            script_files.sort();
            script_files.dedup();

            outputs.push(PluginOutput {
                plugin: name.to_string(),
                entry: plugin.definition.entry.clone(),
                project: plugin.definition.project.clone(),
                attributed: plugin
                    .definition
                    .attributes
                    .iter()
                    .map(|a| (a.package.clone(), a.scope))
                    .collect(),
                script_files,
            });
        }

        outputs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vitest_plugin() -> CompiledPlugin {
        CompiledPlugin::from_toml_str(
            r#"
            entry = ["vitest.config.{js,ts}", "**/*.test.ts"]

            [plugin]
            name = "vitest"

            [detect]
            config_files = ["vitest.config.{js,ts}"]
            dependencies = ["vitest"]
            scripts = ["(?:^|\\s)vitest(?:\\s|$)"]

            [[attribute]]
            package = "vitest"
            "#,
        )
        .unwrap()
    }

    #[test]
    fn fires_on_config_file() {
        let mut registry = PluginRegistry::new();
        registry.register(vitest_plugin());

        let root_files = vec!["vitest.config.ts".to_string()];
        let scripts = BTreeMap::new();
        let input = DetectionInput {
            root_files: &root_files,
            scripts: &scripts,
            ..Default::default()
        };

        let outputs = registry.detect(&input);
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].plugin, "vitest");
        assert!(outputs[0].entry.contains(&"**/*.test.ts".to_string()));
    }

    #[test]
    fn fires_on_dependency() {
        let mut registry = PluginRegistry::new();
        registry.register(vitest_plugin());

        let scripts = BTreeMap::new();
        let input = DetectionInput {
            root_files: &[],
            dependencies: BTreeSet::from(["vitest"]),
            scripts: &scripts,
            ..Default::default()
        };

        assert_eq!(registry.detect(&input).len(), 1);
    }

    #[test]
    fn script_match_extracts_referenced_files() {
        let mut registry = PluginRegistry::new();
        registry.register(vitest_plugin());

        let scripts = BTreeMap::from([(
            "test".to_string(),
            "vitest run src/setup.ts".to_string(),
        )]);
        let input = DetectionInput {
            root_files: &[],
            scripts: &scripts,
            ..Default::default()
        };

        let outputs = registry.detect(&input);
        assert_eq!(outputs[0].script_files, vec!["src/setup.ts"]);
    }

    #[test]
    fn disabled_plugin_never_fires() {
        let mut registry = PluginRegistry::new();
        registry.register(vitest_plugin());

        let scripts = BTreeMap::new();
        let input = DetectionInput {
            root_files: &[],
            dependencies: BTreeSet::from(["vitest"]),
            scripts: &scripts,
            disabled: BTreeSet::from(["vitest"]),
            ..Default::default()
        };

        assert!(registry.detect(&input).is_empty());
    }

    #[test]
    fn explicit_enable_bypasses_detection() {
        let mut registry = PluginRegistry::new();
        registry.register(vitest_plugin());

        let scripts = BTreeMap::new();
        let input = DetectionInput {
            root_files: &[],
            scripts: &scripts,
            enabled: BTreeSet::from(["vitest"]),
            ..Default::default()
        };

        assert_eq!(registry.detect(&input).len(), 1);
    }
}

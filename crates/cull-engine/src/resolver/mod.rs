//! Module resolution.
//!
//! Turns a specifier plus its referring file into an internal file, an
//! external package reference, or an unresolved miss. Resolution order,
//! first hit wins:
//!
//! 1. relative/absolute paths with extension probing and `index.*`
//! 2. path aliases
//! 3. workspace-local package names (monorepo siblings)
//! 4. `node_modules` ascent
//! 5. Node built-ins
//! 6. declared-dependency prefix in any ancestor workspace
//!
//! Soft failure: a miss returns [`Resolution::Unresolved`]; only I/O
//! errors propagate. Results are cached write-once per
//! (specifier, referring directory, channel).

mod aliases;
mod builtins;
mod extensions;

pub use aliases::{compile_aliases, CompiledAlias};
pub use builtins::{builtin_name, is_builtin, NODE_BUILTINS};
pub use extensions::{resolve_file, EXTENSIONS};

use cull_core::Result;
use cull_fs::FileSystem;
use cull_manifest::{extract_package_name, specifier_subpath, WorkspaceSet};
use path_clean::PathClean;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use tracing::trace;

/// Outcome of resolving one specifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A file inside the repository.
    Internal(PathBuf),
    /// An external package.
    External {
        /// Base package name.
        package: String,
        /// Subpath after the package name, when present.
        subpath: Option<String>,
    },
    /// Nothing matched.
    Unresolved,
}

/// Cached, alias-aware module resolver.
pub struct ModuleResolver {
    aliases: Vec<CompiledAlias>,
    cache: FxHashMap<(String, PathBuf, bool), Resolution>,
}

impl ModuleResolver {
    /// Build a resolver from the configured alias map.
    pub fn new(paths: &BTreeMap<String, Vec<String>>) -> Result<Self> {
        Ok(Self {
            aliases: compile_aliases(paths)?,
            cache: FxHashMap::default(),
        })
    }

    /// Resolve a specifier from a referring file.
    ///
    /// `type_only` steers `exports`-map condition selection toward
    /// `types`.
    pub async fn resolve<F: FileSystem>(
        &mut self,
        fs: &F,
        set: &WorkspaceSet,
        specifier: &str,
        from_file: &Path,
        from_ws: usize,
        type_only: bool,
    ) -> io::Result<Resolution> {
        let from_dir = from_file
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| set.root().to_path_buf());

        let key = (specifier.to_string(), from_dir.clone(), type_only);
        if let Some(hit) = self.cache.get(&key) {
            return Ok(hit.clone());
        }

        let resolution = self
            .resolve_uncached(fs, set, specifier, &from_dir, from_ws, type_only)
            .await?;

        trace!(specifier, from = %from_dir.display(), ?resolution, "resolved");
        self.cache.insert(key, resolution.clone());
        Ok(resolution)
    }

    async fn resolve_uncached<F: FileSystem>(
        &self,
        fs: &F,
        set: &WorkspaceSet,
        specifier: &str,
        from_dir: &Path,
        from_ws: usize,
        type_only: bool,
    ) -> io::Result<Resolution> {
        // 1. Exact relative/absolute paths.
        if specifier.starts_with("./") || specifier.starts_with("../") || specifier.starts_with('/')
        {
            let candidate = if specifier.starts_with('/') {
                PathBuf::from(specifier)
            } else {
                from_dir.join(specifier).clean()
            };
            return Ok(match resolve_file(fs, &candidate).await? {
                Some(path) => Resolution::Internal(path),
                None => Resolution::Unresolved,
            });
        }

        // 2. Path aliases, resolved against the referring workspace.
        let ws_dir = set.get(from_ws).dir.clone();
        for alias in &self.aliases {
            let Some(targets) = alias.expand(specifier) else {
                continue;
            };
            for target in targets {
                let candidate = ws_dir.join(&target).clean();
                if let Some(path) = resolve_file(fs, &candidate).await? {
                    return Ok(Resolution::Internal(path));
                }
            }
        }

        let package = extract_package_name(specifier);
        let subpath = specifier_subpath(specifier).map(str::to_string);

        // 3. Monorepo sibling packages.
        if let Some(sibling) = set.by_package_name(package) {
            if let Some(path) = self
                .resolve_into_workspace(fs, set, sibling, subpath.as_deref(), type_only)
                .await?
            {
                return Ok(Resolution::Internal(path));
            }
        }

        // 4. node_modules ascent.
        let mut dir = Some(from_dir.to_path_buf());
        while let Some(current) = dir {
            if !current.starts_with(set.root()) {
                break;
            }
            let package_dir = current.join("node_modules").join(package);
            if fs.metadata(&package_dir).await?.is_dir {
                return Ok(Resolution::External {
                    package: package.to_string(),
                    subpath,
                });
            }
            dir = current.parent().map(Path::to_path_buf);
        }

        // 5. Node built-ins.
        if is_builtin(specifier) {
            return Ok(Resolution::External {
                package: extract_package_name(builtin_name(specifier)).to_string(),
                subpath,
            });
        }

        // 6. Declared dependency of any visible manifest, longest name
        // first.
        if let Some(declared) = longest_declared_prefix(set, from_ws, specifier) {
            let subpath = specifier
                .strip_prefix(&declared)
                .and_then(|rest| rest.strip_prefix('/'))
                .filter(|rest| !rest.is_empty())
                .map(str::to_string);
            return Ok(Resolution::External {
                package: declared,
                subpath,
            });
        }

        Ok(Resolution::Unresolved)
    }

    /// Resolve a specifier into a sibling workspace, honoring its
    /// manifest's `exports` map and entry fields.
    async fn resolve_into_workspace<F: FileSystem>(
        &self,
        fs: &F,
        set: &WorkspaceSet,
        ws_idx: usize,
        subpath: Option<&str>,
        type_only: bool,
    ) -> io::Result<Option<PathBuf>> {
        let ws = set.get(ws_idx);

        if let Some(exports) = &ws.manifest.exports {
            if let Some(target) = exports_target(exports, subpath, type_only) {
                let candidate = ws.dir.join(target.trim_start_matches("./")).clean();
                if let Some(path) = resolve_file(fs, &candidate).await? {
                    return Ok(Some(path));
                }
            }
        }

        if let Some(sub) = subpath {
            return resolve_file(fs, &ws.dir.join(sub).clean()).await;
        }

        for field in [&ws.manifest.module, &ws.manifest.main, &ws.manifest.types]
            .into_iter()
            .flatten()
        {
            let candidate = ws.dir.join(field.trim_start_matches("./")).clean();
            if let Some(path) = resolve_file(fs, &candidate).await? {
                return Ok(Some(path));
            }
        }

        resolve_file(fs, &ws.dir).await
    }
}

/// Pick a target out of an `exports` map for a subpath.
///
/// Condition order prefers `types` for type-only imports, then
/// `import`, `require`, `default`.
fn exports_target(
    exports: &serde_json::Value,
    subpath: Option<&str>,
    type_only: bool,
) -> Option<String> {
    use serde_json::Value;

    let entry = match exports {
        Value::String(s) if subpath.is_none() => return Some(s.clone()),
        Value::Object(map) => {
            let has_subpath_keys = map.keys().any(|k| k.starts_with('.'));
            if has_subpath_keys {
                let key = match subpath {
                    Some(sub) => format!("./{sub}"),
                    None => ".".to_string(),
                };
                map.get(&key)?
            } else if subpath.is_none() {
                exports
            } else {
                return None;
            }
        }
        _ => return None,
    };

    resolve_conditions(entry, type_only)
}

fn resolve_conditions(value: &serde_json::Value, type_only: bool) -> Option<String> {
    use serde_json::Value;

    match value {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => {
            let conditions: &[&str] = if type_only {
                &["types", "import", "require", "default"]
            } else {
                &["import", "require", "default"]
            };
            for condition in conditions {
                if let Some(nested) = map.get(*condition) {
                    if let Some(target) = resolve_conditions(nested, type_only) {
                        return Some(target);
                    }
                }
            }
            None
        }
        Value::Array(items) => items
            .iter()
            .find_map(|item| resolve_conditions(item, type_only)),
        _ => None,
    }
}

/// The longest dependency name declared by the workspace or an ancestor
/// that prefixes the specifier.
fn longest_declared_prefix(set: &WorkspaceSet, from_ws: usize, specifier: &str) -> Option<String> {
    let mut best: Option<String> = None;

    let mut consider = |name: &String| {
        let matches = specifier == name.as_str()
            || specifier
                .strip_prefix(name.as_str())
                .is_some_and(|rest| rest.starts_with('/'));
        if matches && best.as_ref().is_none_or(|b| name.len() > b.len()) {
            best = Some(name.clone());
        }
    };

    for name in set.get(from_ws).manifest.all_dependency_names() {
        consider(&name);
    }
    for ancestor in set.ancestors(from_ws) {
        for name in set.get(ancestor).manifest.all_dependency_names() {
            consider(&name);
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use cull_fs::NativeFileSystem;
    use std::fs;
    use tempfile::TempDir;

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    async fn fixture(temp: &TempDir) -> (NativeFileSystem, WorkspaceSet) {
        let nfs = NativeFileSystem::new(temp.path()).unwrap();
        let set = WorkspaceSet::load(&nfs).await.unwrap();
        (nfs, set)
    }

    #[tokio::test]
    async fn relative_resolution() {
        let temp = TempDir::new().unwrap();
        write(&temp.path().join("package.json"), r#"{ "name": "app" }"#);
        write(&temp.path().join("src/index.ts"), "");
        write(&temp.path().join("src/util.ts"), "");

        let (nfs, set) = fixture(&temp).await;
        let mut resolver = ModuleResolver::new(&BTreeMap::new()).unwrap();
        let from = set.root().join("src/index.ts");

        let result = resolver
            .resolve(&nfs, &set, "./util", &from, 0, false)
            .await
            .unwrap();
        assert!(matches!(result, Resolution::Internal(p) if p.ends_with("src/util.ts")));

        let miss = resolver
            .resolve(&nfs, &set, "./missing", &from, 0, false)
            .await
            .unwrap();
        assert_eq!(miss, Resolution::Unresolved);
    }

    #[tokio::test]
    async fn alias_resolution() {
        let temp = TempDir::new().unwrap();
        write(&temp.path().join("package.json"), r#"{ "name": "app" }"#);
        write(&temp.path().join("src/components/button.tsx"), "");

        let (nfs, set) = fixture(&temp).await;
        let paths = BTreeMap::from([(
            "@app/*".to_string(),
            vec!["src/*".to_string()],
        )]);
        let mut resolver = ModuleResolver::new(&paths).unwrap();
        let from = set.root().join("src/index.ts");

        let result = resolver
            .resolve(&nfs, &set, "@app/components/button", &from, 0, false)
            .await
            .unwrap();
        assert!(matches!(result, Resolution::Internal(p) if p.ends_with("button.tsx")));
    }

    #[tokio::test]
    async fn workspace_sibling_resolution() {
        let temp = TempDir::new().unwrap();
        write(
            &temp.path().join("package.json"),
            r#"{ "name": "root", "workspaces": ["packages/*"] }"#,
        );
        write(
            &temp.path().join("packages/ui/package.json"),
            r#"{ "name": "@repo/ui", "main": "./src/index.ts" }"#,
        );
        write(&temp.path().join("packages/ui/src/index.ts"), "");
        write(
            &temp.path().join("packages/app/package.json"),
            r#"{ "name": "@repo/app" }"#,
        );
        write(&temp.path().join("packages/app/src/main.ts"), "");

        let (nfs, set) = fixture(&temp).await;
        let mut resolver = ModuleResolver::new(&BTreeMap::new()).unwrap();
        let app = set.by_package_name("@repo/app").unwrap();
        let from = set.get(app).dir.join("src/main.ts");

        let result = resolver
            .resolve(&nfs, &set, "@repo/ui", &from, app, false)
            .await
            .unwrap();
        assert!(matches!(result, Resolution::Internal(p) if p.ends_with("packages/ui/src/index.ts")));
    }

    #[tokio::test]
    async fn node_modules_is_external() {
        let temp = TempDir::new().unwrap();
        write(
            &temp.path().join("package.json"),
            r#"{ "name": "app", "dependencies": { "lodash": "^4.0.0" } }"#,
        );
        write(
            &temp.path().join("node_modules/lodash/package.json"),
            r#"{ "name": "lodash" }"#,
        );
        write(&temp.path().join("src/index.ts"), "");

        let (nfs, set) = fixture(&temp).await;
        let mut resolver = ModuleResolver::new(&BTreeMap::new()).unwrap();
        let from = set.root().join("src/index.ts");

        let result = resolver
            .resolve(&nfs, &set, "lodash/fp", &from, 0, false)
            .await
            .unwrap();
        assert_eq!(
            result,
            Resolution::External {
                package: "lodash".to_string(),
                subpath: Some("fp".to_string()),
            }
        );
    }

    #[tokio::test]
    async fn builtins_are_external() {
        let temp = TempDir::new().unwrap();
        write(&temp.path().join("package.json"), r#"{ "name": "app" }"#);
        write(&temp.path().join("src/index.ts"), "");

        let (nfs, set) = fixture(&temp).await;
        let mut resolver = ModuleResolver::new(&BTreeMap::new()).unwrap();
        let from = set.root().join("src/index.ts");

        let result = resolver
            .resolve(&nfs, &set, "node:path", &from, 0, false)
            .await
            .unwrap();
        assert_eq!(
            result,
            Resolution::External {
                package: "path".to_string(),
                subpath: None,
            }
        );
    }

    #[tokio::test]
    async fn declared_dep_without_install_is_external() {
        let temp = TempDir::new().unwrap();
        write(
            &temp.path().join("package.json"),
            r#"{ "name": "app", "dependencies": { "react": "^18.0.0" } }"#,
        );
        write(&temp.path().join("src/index.ts"), "");

        let (nfs, set) = fixture(&temp).await;
        let mut resolver = ModuleResolver::new(&BTreeMap::new()).unwrap();
        let from = set.root().join("src/index.ts");

        let result = resolver
            .resolve(&nfs, &set, "react/jsx-runtime", &from, 0, false)
            .await
            .unwrap();
        assert_eq!(
            result,
            Resolution::External {
                package: "react".to_string(),
                subpath: Some("jsx-runtime".to_string()),
            }
        );

        // Bare specifier with no matching dependency anywhere.
        let miss = resolver
            .resolve(&nfs, &set, "unknown-pkg", &from, 0, false)
            .await
            .unwrap();
        assert_eq!(miss, Resolution::Unresolved);
    }

    #[test]
    fn exports_map_condition_order() {
        let exports: serde_json::Value = serde_json::from_str(
            r#"{
                ".": { "types": "./index.d.ts", "import": "./index.mjs", "default": "./index.cjs" },
                "./sub": "./sub.mjs"
            }"#,
        )
        .unwrap();

        assert_eq!(
            exports_target(&exports, None, false).as_deref(),
            Some("./index.mjs")
        );
        assert_eq!(
            exports_target(&exports, None, true).as_deref(),
            Some("./index.d.ts")
        );
        assert_eq!(
            exports_target(&exports, Some("sub"), false).as_deref(),
            Some("./sub.mjs")
        );
        assert_eq!(exports_target(&exports, Some("missing"), false), None);
    }
}

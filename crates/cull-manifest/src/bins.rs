//! Installed binary registry.
//!
//! Collects the binary names contributed by installed packages (their
//! `bin` fields under `node_modules`) and by workspace members themselves.
//! The unlisted-binary report checks script binaries against this registry
//! and the OS allowlist.

use crate::package_json::PackageJson;
use crate::workspace::WorkspaceSet;
use cull_fs::FileSystem;
use std::collections::BTreeMap;
use tracing::debug;

/// Binaries provided by the OS or package managers, never reported.
pub const OS_BINARIES: &[&str] = &[
    "basename", "bash", "cat", "cd", "chmod", "cp", "curl", "dirname", "echo", "env", "exit",
    "export", "false", "find", "git", "grep", "head", "kill", "ln", "ls", "mkdir", "mv", "node",
    "npm", "npx", "pnpm", "rm", "set", "sh", "sleep", "sort", "tail", "tar", "test", "touch",
    "true", "wget", "xargs", "yarn",
];

/// Whether a binary name is on the OS allowlist.
pub fn is_os_binary(name: &str) -> bool {
    OS_BINARIES.binary_search(&name).is_ok()
}

/// Map of binary name to providing package for every installed dependency.
///
/// For each workspace the declared dependencies are looked up under the
/// nearest `node_modules` (own directory first, then ancestors, covering
/// hoisted installs). Workspace members contribute their own `bin` entries
/// too, since package managers link those. Unreadable or unparsable
/// third-party manifests are skipped, not fatal.
pub async fn collect_installed_bins<F: FileSystem>(
    fs: &F,
    set: &WorkspaceSet,
) -> BTreeMap<String, String> {
    let mut bins: BTreeMap<String, String> = BTreeMap::new();

    // Workspace members' own binaries.
    for ws in set.all() {
        if let Some(name) = &ws.manifest.name {
            for (bin, _) in ws.manifest.bin_entries() {
                bins.entry(bin).or_insert_with(|| name.clone());
            }
        }
    }

    for ws_idx in 0..set.len() {
        let ws = set.get(ws_idx);
        for package in ws.manifest.all_dependency_names() {
            // Probe node_modules from the workspace upward.
            let mut search_dirs = vec![ws.dir.clone()];
            search_dirs.extend(set.ancestors(ws_idx).map(|a| set.get(a).dir.clone()));

            for dir in search_dirs {
                let manifest_path = dir.join("node_modules").join(&package).join("package.json");
                let Ok(true) = fs.exists(&manifest_path).await else {
                    continue;
                };
                match PackageJson::from_path(fs, &manifest_path).await {
                    Ok(manifest) => {
                        for (bin, _) in manifest.bin_entries() {
                            bins.entry(bin).or_insert_with(|| package.clone());
                        }
                    }
                    Err(e) => {
                        debug!(package = %package, error = %e, "skipping unreadable installed manifest");
                    }
                }
                break;
            }
        }
    }

    bins
}

#[cfg(test)]
mod tests {
    use super::*;
    use cull_fs::NativeFileSystem;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn os_allowlist_is_sorted_for_binary_search() {
        let mut sorted = OS_BINARIES.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, OS_BINARIES);
        assert!(is_os_binary("node"));
        assert!(!is_os_binary("vitest"));
    }

    #[tokio::test]
    async fn collects_bins_from_hoisted_node_modules() {
        let temp = TempDir::new().unwrap();
        write(
            &temp.path().join("package.json"),
            r#"{
                "name": "root",
                "workspaces": ["packages/*"],
                "devDependencies": { "vitest": "^1.0.0" }
            }"#,
        );
        write(
            &temp.path().join("packages/a/package.json"),
            r#"{ "name": "pkg-a", "dependencies": { "esbuild": "^0.20.0" } }"#,
        );
        // Hoisted installs at the root.
        write(
            &temp.path().join("node_modules/vitest/package.json"),
            r#"{ "name": "vitest", "bin": { "vitest": "./vitest.mjs" } }"#,
        );
        write(
            &temp.path().join("node_modules/esbuild/package.json"),
            r#"{ "name": "esbuild", "bin": "./bin/esbuild" }"#,
        );

        let fs = NativeFileSystem::new(temp.path()).unwrap();
        let set = WorkspaceSet::load(&fs).await.unwrap();
        let bins = collect_installed_bins(&fs, &set).await;

        assert_eq!(bins.get("vitest"), Some(&"vitest".to_string()));
        assert_eq!(bins.get("esbuild"), Some(&"esbuild".to_string()));
    }

    #[tokio::test]
    async fn workspace_members_contribute_their_own_bins() {
        let temp = TempDir::new().unwrap();
        write(
            &temp.path().join("package.json"),
            r#"{ "name": "root", "workspaces": ["tools/*"] }"#,
        );
        write(
            &temp.path().join("tools/gen/package.json"),
            r#"{ "name": "@repo/gen", "bin": { "repo-gen": "./cli.js" } }"#,
        );

        let fs = NativeFileSystem::new(temp.path()).unwrap();
        let set = WorkspaceSet::load(&fs).await.unwrap();
        let bins = collect_installed_bins(&fs, &set).await;

        assert_eq!(bins.get("repo-gen"), Some(&"@repo/gen".to_string()));
    }
}

//! Workspace tree construction.
//!
//! Builds the (possibly nested) workspace tree from the root manifest's
//! `workspaces` field or `pnpm-workspace.yaml`, links each member to its
//! nearest enclosing parent, and exposes the deepest-first iteration order
//! the analyzer uses everywhere.

use crate::package_json::{DependencyKind, PackageJson};
use cull_core::{Error, Result};
use cull_fs::FileSystem;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One workspace: a directory with a manifest.
#[derive(Debug, Clone)]
pub struct Workspace {
    /// Absolute directory of the workspace.
    pub dir: PathBuf,
    /// Workspace name: manifest `name` or the root-relative directory.
    pub name: String,
    /// Parsed manifest.
    pub manifest: PackageJson,
    /// Nesting depth in the tree (root = 0).
    pub depth: usize,
    /// Index of the parent workspace, if any.
    pub parent: Option<usize>,
    /// Indices of child workspaces.
    pub children: Vec<usize>,
}

/// The complete workspace tree of a repository.
#[derive(Debug)]
pub struct WorkspaceSet {
    workspaces: Vec<Workspace>,
    root: PathBuf,
}

#[derive(Deserialize)]
struct PnpmWorkspaceFile {
    #[serde(default)]
    packages: Vec<String>,
}

impl WorkspaceSet {
    /// Load the workspace tree rooted at the filesystem's project root.
    ///
    /// The root directory must contain a `package.json`. Members come from
    /// its `workspaces` field or a sibling `pnpm-workspace.yaml`
    /// (pnpm wins when both exist, matching pnpm's own behavior).
    pub async fn load<F: FileSystem>(fs: &F) -> Result<Self> {
        let root = fs.project_root().to_path_buf();
        let root_manifest = PackageJson::from_path(fs, &root.join("package.json")).await?;

        let mut member_patterns: Vec<String> = Vec::new();

        let pnpm_path = root.join("pnpm-workspace.yaml");
        if fs.exists(&pnpm_path).await? {
            let content = fs.read_to_string(&pnpm_path).await?;
            let parsed: PnpmWorkspaceFile =
                serde_yaml::from_str(&content).map_err(|source| Error::WorkspaceYaml {
                    file: pnpm_path.clone(),
                    source,
                })?;
            member_patterns = parsed.packages;
        } else if let Some(field) = &root_manifest.workspaces {
            member_patterns = field.patterns().to_vec();
        }

        let mut workspaces = vec![Workspace {
            name: root_manifest
                .name
                .clone()
                .unwrap_or_else(|| ".".to_string()),
            dir: root.clone(),
            manifest: root_manifest,
            depth: 0,
            parent: None,
            children: Vec::new(),
        }];

        let mut seen: BTreeMap<PathBuf, usize> = BTreeMap::new();
        seen.insert(root.clone(), 0);

        for member_dir in expand_member_patterns(&root, &member_patterns)? {
            if let Some(&existing) = seen.get(&member_dir) {
                // A member pattern resolved back onto an already-registered
                // directory (symlinked member or self-referencing pattern).
                return Err(Error::CyclicWorkspace {
                    chain: vec![workspaces[existing].dir.clone(), member_dir],
                });
            }

            let manifest = PackageJson::from_path(fs, &member_dir.join("package.json")).await?;
            let name = manifest.name.clone().unwrap_or_else(|| {
                member_dir
                    .strip_prefix(&root)
                    .unwrap_or(&member_dir)
                    .to_string_lossy()
                    .into_owned()
            });

            debug!(workspace = %name, dir = %member_dir.display(), "registered workspace");

            seen.insert(member_dir.clone(), workspaces.len());
            workspaces.push(Workspace {
                name,
                dir: member_dir,
                manifest,
                depth: 0,
                parent: None,
                children: Vec::new(),
            });
        }

        link_parents(&mut workspaces)?;

        Ok(Self { workspaces, root })
    }

    /// Build a workspace set directly from parsed parts (tests, embedders).
    pub fn from_parts(root: PathBuf, mut workspaces: Vec<Workspace>) -> Result<Self> {
        link_parents(&mut workspaces)?;
        Ok(Self { workspaces, root })
    }

    /// The repository root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// All workspaces, in registration order (root first).
    pub fn all(&self) -> &[Workspace] {
        &self.workspaces
    }

    /// One workspace by index.
    pub fn get(&self, idx: usize) -> &Workspace {
        &self.workspaces[idx]
    }

    /// Number of workspaces.
    pub fn len(&self) -> usize {
        self.workspaces.len()
    }

    /// Whether the set is empty (never true after a successful load).
    pub fn is_empty(&self) -> bool {
        self.workspaces.is_empty()
    }

    /// Indices in iteration order: deepest first, then lexicographic by
    /// directory, so every run visits workspaces identically.
    pub fn iteration_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.workspaces.len()).collect();
        order.sort_by(|&a, &b| {
            let wa = &self.workspaces[a];
            let wb = &self.workspaces[b];
            wb.depth.cmp(&wa.depth).then_with(|| wa.dir.cmp(&wb.dir))
        });
        order
    }

    /// The nearest workspace enclosing a path (the file's owner).
    pub fn owner_of(&self, path: &Path) -> Option<usize> {
        self.workspaces
            .iter()
            .enumerate()
            .filter(|(_, ws)| path.starts_with(&ws.dir))
            .max_by_key(|(_, ws)| ws.dir.components().count())
            .map(|(idx, _)| idx)
    }

    /// Ancestors of a workspace, nearest first (excluding itself).
    pub fn ancestors(&self, idx: usize) -> impl Iterator<Item = usize> + '_ {
        std::iter::successors(self.workspaces[idx].parent, move |&i| {
            self.workspaces[i].parent
        })
    }

    /// The bucket declaring a package in this workspace, if any.
    pub fn declares(&self, idx: usize, package: &str) -> Option<DependencyKind> {
        self.workspaces[idx].manifest.bucket_of(package)
    }

    /// The nearest workspace (self, then ancestors) declaring a package.
    ///
    /// This is the attribution tie-break: when several workspaces could
    /// claim a reference, the nearest declaring ancestor wins.
    pub fn nearest_declaring(&self, idx: usize, package: &str) -> Option<usize> {
        if self.declares(idx, package).is_some() {
            return Some(idx);
        }
        self.ancestors(idx)
            .find(|&a| self.declares(a, package).is_some())
    }

    /// Whether a package is visible to a workspace: declared by it or any
    /// ancestor. Backs the "unlisted" check.
    pub fn visible_in(&self, idx: usize, package: &str) -> bool {
        self.nearest_declaring(idx, package).is_some()
    }

    /// Workspace index by package name (monorepo sibling lookup).
    pub fn by_package_name(&self, name: &str) -> Option<usize> {
        self.workspaces
            .iter()
            .position(|ws| ws.manifest.name.as_deref() == Some(name))
    }
}

/// Expand member glob patterns into workspace directories.
///
/// Mirrors npm/pnpm behavior: each pattern is matched against directories
/// containing a `package.json`. Negated patterns (`!pkg`) subtract.
fn expand_member_patterns(root: &Path, patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut members: Vec<PathBuf> = Vec::new();
    let mut negated: Vec<PathBuf> = Vec::new();

    for pattern in patterns {
        let (target, pattern_str) = match pattern.strip_prefix('!') {
            Some(rest) => (&mut negated, rest),
            None => (&mut members, pattern.as_str()),
        };

        let full_pattern = root.join(pattern_str).join("package.json");
        let Some(full_pattern) = full_pattern.to_str() else {
            continue;
        };

        for manifest_path in glob::glob(full_pattern)
            .map_err(|e| Error::Pattern(format!("invalid workspace pattern '{pattern}': {e}")))?
            .flatten()
        {
            if let Some(dir) = manifest_path.parent() {
                let dir = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
                target.push(dir);
            }
        }
    }

    members.retain(|dir| !negated.contains(dir));
    members.sort();
    members.dedup();
    Ok(members)
}

/// Link each workspace to its nearest enclosing parent and compute depths.
fn link_parents(workspaces: &mut [Workspace]) -> Result<()> {
    for idx in 0..workspaces.len() {
        let dir = workspaces[idx].dir.clone();
        let parent = workspaces
            .iter()
            .enumerate()
            .filter(|(other, ws)| *other != idx && dir.starts_with(&ws.dir) && ws.dir != dir)
            .max_by_key(|(_, ws)| ws.dir.components().count())
            .map(|(other, _)| other);
        workspaces[idx].parent = parent;
        if let Some(parent) = parent {
            workspaces[parent].children.push(idx);
        }
    }

    // Depths follow parent chains; a chain longer than the workspace count
    // means the links loop.
    for idx in 0..workspaces.len() {
        let mut depth = 0;
        let mut current = workspaces[idx].parent;
        let mut chain = vec![workspaces[idx].dir.clone()];
        while let Some(parent) = current {
            depth += 1;
            chain.push(workspaces[parent].dir.clone());
            if depth > workspaces.len() {
                return Err(Error::CyclicWorkspace { chain });
            }
            current = workspaces[parent].parent;
        }
        workspaces[idx].depth = depth;
    }

    Ok(())
}

//! Native filesystem implementation using std::fs + tokio.

use crate::{DiscoveryOptions, FileMetadata, FileSystem};
use ignore::WalkBuilder;
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use tokio::task;

/// Native filesystem scoped to a project root.
///
/// Blocking std::fs calls are wrapped in `tokio::spawn_blocking` so they
/// never stall the async runtime.
#[derive(Debug, Clone)]
pub struct NativeFileSystem {
    project_root: PathBuf,
    canonical_root: PathBuf,
}

impl NativeFileSystem {
    /// Create a native filesystem scoped to a project root.
    ///
    /// # Errors
    ///
    /// Returns an error if the root doesn't exist or can't be canonicalized.
    pub fn new(project_root: impl AsRef<Path>) -> io::Result<Self> {
        let project_root = project_root.as_ref().canonicalize()?;
        let canonical_root = project_root.clone();
        Ok(Self {
            project_root,
            canonical_root,
        })
    }

    /// Validate that a path stays within the project root.
    ///
    /// Prevents traversal out of the analyzed tree: symlinked paths are
    /// resolved before the prefix check.
    fn validate_path(&self, path: &Path) -> io::Result<PathBuf> {
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        };

        let canonical = match absolute.canonicalize() {
            Ok(p) => p,
            Err(_) => {
                // Path doesn't exist: canonicalize the parent and re-join,
                // falling back to syntactic normalization.
                match (absolute.parent(), absolute.file_name()) {
                    (Some(parent), Some(name)) => match parent.canonicalize() {
                        Ok(canonical_parent) => canonical_parent.join(name),
                        Err(_) => normalize_syntactically(&absolute),
                    },
                    _ => absolute.clone(),
                }
            }
        };

        if !canonical.starts_with(&self.canonical_root) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!(
                    "Path traversal detected: {} is outside project root {}",
                    canonical.display(),
                    self.project_root.display()
                ),
            ));
        }

        Ok(canonical)
    }
}

/// Syntactic path normalization for paths that don't exist yet.
fn normalize_syntactically(path: &Path) -> PathBuf {
    let mut components: Vec<std::ffi::OsString> = Vec::new();
    for component in path.components() {
        match component {
            std::path::Component::Prefix(_) | std::path::Component::RootDir => {
                components.clear();
                components.push(component.as_os_str().to_owned());
            }
            std::path::Component::CurDir => {}
            std::path::Component::ParentDir => {
                if components.len() > 1 {
                    components.pop();
                }
            }
            std::path::Component::Normal(name) => {
                components.push(name.to_owned());
            }
        }
    }

    let mut result = PathBuf::new();
    for component in components {
        result.push(component);
    }
    result
}

#[async_trait::async_trait]
impl FileSystem for NativeFileSystem {
    async fn exists(&self, path: &Path) -> io::Result<bool> {
        let validated = match self.validate_path(path) {
            Ok(p) => p,
            // Outside the root means "not visible", not an error.
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => return Ok(false),
            Err(e) => return Err(e),
        };
        task::spawn_blocking(move || Ok(validated.exists()))
            .await
            .map_err(io::Error::other)?
    }

    async fn read_to_string(&self, path: &Path) -> io::Result<String> {
        let validated = self.validate_path(path)?;
        task::spawn_blocking(move || std::fs::read_to_string(&validated))
            .await
            .map_err(io::Error::other)?
    }

    async fn metadata(&self, path: &Path) -> io::Result<FileMetadata> {
        let validated = self.validate_path(path)?;
        task::spawn_blocking(move || match std::fs::symlink_metadata(&validated) {
            Ok(meta) => Ok(FileMetadata {
                exists: true,
                is_file: meta.is_file(),
                is_dir: meta.is_dir(),
                is_symlink: meta.file_type().is_symlink(),
                size: meta.len(),
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(FileMetadata {
                exists: false,
                is_file: false,
                is_dir: false,
                is_symlink: false,
                size: 0,
            }),
            Err(e) => Err(e),
        })
        .await
        .map_err(io::Error::other)?
    }

    async fn read_dir(&self, path: &Path) -> io::Result<Vec<String>> {
        let validated = self.validate_path(path)?;
        task::spawn_blocking(move || {
            let mut names = Vec::new();
            for entry in std::fs::read_dir(&validated)? {
                let entry = entry?;
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
            names.sort();
            Ok(names)
        })
        .await
        .map_err(io::Error::other)?
    }

    async fn discover_files(
        &self,
        root: &Path,
        extensions: &[&str],
        ignore_patterns: &[&str],
        options: &DiscoveryOptions,
    ) -> io::Result<HashSet<PathBuf>> {
        let validated_root = self.validate_path(root)?;
        let extensions: Vec<String> = extensions.iter().map(|s| s.to_string()).collect();
        let ignore_patterns: Vec<String> = ignore_patterns.iter().map(|s| s.to_string()).collect();
        let opts = options.clone();
        let canonical_root = self.canonical_root.clone();

        task::spawn_blocking(move || {
            discover_files_sync(
                &validated_root,
                &extensions,
                &ignore_patterns,
                &opts,
                &canonical_root,
            )
        })
        .await
        .map_err(io::Error::other)?
    }

    async fn normalize_path(&self, path: &Path) -> io::Result<PathBuf> {
        let path_buf = path.to_path_buf();
        let canonical_root = self.canonical_root.clone();
        task::spawn_blocking(move || {
            let normalized = if path_buf.is_absolute() {
                path_buf.canonicalize().unwrap_or(path_buf)
            } else {
                canonical_root
                    .join(&path_buf)
                    .canonicalize()
                    .unwrap_or_else(|_| canonical_root.join(&path_buf))
            };

            if !normalized.starts_with(&canonical_root) {
                return Err(io::Error::new(
                    io::ErrorKind::PermissionDenied,
                    "Path outside project root",
                ));
            }

            Ok(normalized)
        })
        .await
        .map_err(io::Error::other)?
    }

    fn project_root(&self) -> &Path {
        &self.project_root
    }
}

/// Synchronous file discovery implementation.
fn discover_files_sync(
    root: &Path,
    extensions: &[String],
    ignore_patterns: &[String],
    options: &DiscoveryOptions,
    project_root: &Path,
) -> io::Result<HashSet<PathBuf>> {
    let mut discovered = HashSet::new();

    let mut walker = WalkBuilder::new(root);
    walker
        .follow_links(options.follow_symlinks)
        .hidden(!options.include_hidden)
        .git_ignore(options.respect_gitignore)
        .git_exclude(options.respect_gitignore)
        .max_depth(Some(options.max_depth))
        .max_filesize(options.max_file_size);

    if !ignore_patterns.is_empty() {
        let mut overrides = ignore::overrides::OverrideBuilder::new(root);
        for pattern in ignore_patterns {
            overrides
                .add(&format!("!{}", pattern))
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        }
        if let Ok(ov) = overrides.build() {
            walker.overrides(ov);
        }
    }

    for result in walker.build() {
        let entry = result.map_err(io::Error::other)?;

        if !entry.file_type().map(|ft| ft.is_file()).unwrap_or(false) {
            continue;
        }

        let path = entry.path();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            let ext_with_dot = format!(".{}", ext);
            if extensions.contains(&ext_with_dot) {
                if let Ok(canonical) = path.canonicalize() {
                    if canonical.starts_with(project_root) {
                        discovered.insert(canonical);
                    }
                }
            }
        }
    }

    Ok(discovered)
}

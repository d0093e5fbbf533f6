//! The read-only filesystem seam.
//!
//! Everything the analyzer learns about a repository flows through
//! [`FileSystem`]: manifest loads, resolver probes and project-file
//! discovery. Implementations decide where the bytes come from; the
//! native one reads disk, and a test host can serve an in-memory tree.

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};

/// Answer to one path probe.
///
/// Probing is the resolver's hot path, so a single call reports
/// existence, kind and size together. A missing path comes back with
/// `exists` unset rather than as an error; only genuine I/O failures
/// error out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    /// The path is present on disk.
    pub exists: bool,
    /// The path names a regular file.
    pub is_file: bool,
    /// The path names a directory.
    pub is_dir: bool,
    /// The path names a symbolic link.
    pub is_symlink: bool,
    /// Size in bytes; zero for directories and missing paths.
    pub size: u64,
}

/// Knobs for project-file discovery.
///
/// The defaults suit a checked-out repository under analysis: gitignored
/// and hidden files stay out of the project universe, symlinks are left
/// unfollowed so a link back into the tree cannot loop the walk, and
/// oversized files are skipped instead of parsed.
#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    /// Skip files larger than this many bytes; `None` lifts the cap.
    pub max_file_size: Option<u64>,

    /// Walk through symbolic links.
    pub follow_symlinks: bool,

    /// Stop descending past this directory depth.
    pub max_depth: usize,

    /// Pick up dotfiles and files under dot-directories.
    pub include_hidden: bool,

    /// Honor .gitignore and git exclude files during the walk.
    pub respect_gitignore: bool,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            max_file_size: Some(10 * 1024 * 1024),
            follow_symlinks: false,
            max_depth: 100,
            include_hidden: false,
            respect_gitignore: true,
        }
    }
}

/// Read-only filesystem abstraction.
///
/// The analyzer never writes: its filesystem interface covers existence
/// checks, reads, metadata, discovery and path normalization. All methods
/// are async so a native implementation can offload blocking I/O while an
/// in-memory implementation (tests, editors) completes immediately.
///
/// Errors use `std::io::Result<T>`; `io::ErrorKind::NotFound` and
/// `PermissionDenied` carry the same meaning everywhere.
#[async_trait::async_trait]
pub trait FileSystem: Send + Sync {
    /// Check if a path exists.
    async fn exists(&self, path: &Path) -> io::Result<bool>;

    /// Read file contents as a string.
    ///
    /// # Errors
    ///
    /// Returns `io::ErrorKind::NotFound` if the file doesn't exist and
    /// `io::ErrorKind::InvalidData` if it is not valid UTF-8.
    async fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Get file/directory metadata.
    ///
    /// Returns metadata even if the file doesn't exist (exists=false), so
    /// probing does not need separate exists() + metadata() calls.
    async fn metadata(&self, path: &Path) -> io::Result<FileMetadata>;

    /// List the entries of a directory (names, not paths).
    async fn read_dir(&self, path: &Path) -> io::Result<Vec<String>>;

    /// Discover files matching extensions under a root.
    ///
    /// # Parameters
    ///
    /// - `root`: starting directory (must be within the project root)
    /// - `extensions`: file extensions to include (e.g., [".ts", ".js"])
    /// - `ignore_patterns`: glob patterns to skip (e.g., ["**/dist/**"])
    /// - `options`: additional discovery options
    ///
    /// # Returns
    ///
    /// Set of absolute paths to discovered files.
    async fn discover_files(
        &self,
        root: &Path,
        extensions: &[&str],
        ignore_patterns: &[&str],
        options: &DiscoveryOptions,
    ) -> io::Result<HashSet<PathBuf>>;

    /// Normalize a path, resolving symlinks where the platform supports it.
    ///
    /// # Errors
    ///
    /// Returns an error if the normalized path escapes the project root.
    async fn normalize_path(&self, path: &Path) -> io::Result<PathBuf>;

    /// The project root this filesystem is scoped to.
    ///
    /// All operations are validated against this root.
    fn project_root(&self) -> &Path;
}

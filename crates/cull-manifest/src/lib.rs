//! Package manifest parsing and workspace modelling for cull.
//!
//! This crate turns a repository into a [`WorkspaceSet`]: the tree of
//! directories with manifests, each with classified dependency buckets.
//! [`AttributionTables`] then track who uses each declared dependency, and
//! [`bins::collect_installed_bins`] gathers the binaries installed packages
//! provide.
//!
//! # Example
//!
//! ```no_run
//! use cull_fs::NativeFileSystem;
//! use cull_manifest::{AttributionTables, WorkspaceSet};
//!
//! # #[tokio::main]
//! # async fn main() -> cull_core::Result<()> {
//! let fs = NativeFileSystem::new(".")?;
//! let workspaces = WorkspaceSet::load(&fs).await?;
//! let mut tables = AttributionTables::new(&workspaces);
//!
//! for idx in workspaces.iteration_order() {
//!     println!("{}", workspaces.get(idx).name);
//! }
//! # Ok(())
//! # }
//! ```

pub mod attribution;
pub mod bins;
pub mod package_json;
pub mod workspace;

pub use attribution::{AttributionTables, DependencyAttribution, ALWAYS_IGNORED_DEPENDENCIES};
pub use bins::{collect_installed_bins, is_os_binary, OS_BINARIES};
pub use package_json::{
    extract_package_name, specifier_subpath, unscoped_name, BinField, DependencyKind, PackageJson,
    WorkspacesField,
};
pub use workspace::{Workspace, WorkspaceSet};

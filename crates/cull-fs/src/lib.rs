//! Read-only filesystem abstraction for cull.
//!
//! The analyzer reads project trees but never modifies them, so the
//! [`FileSystem`] trait exposes only reads, metadata, discovery and path
//! normalization. The native implementation wraps `std::fs` with
//! `tokio::spawn_blocking`; tests or editor hosts can provide in-memory
//! implementations.
//!
//! # Example
//!
//! ```no_run
//! use cull_fs::{FileSystem, NativeFileSystem};
//! use std::sync::Arc;
//! use std::path::Path;
//!
//! # #[tokio::main]
//! # async fn main() -> std::io::Result<()> {
//! let fs = Arc::new(NativeFileSystem::new(".")?);
//! let manifest = fs.read_to_string(Path::new("package.json")).await?;
//! println!("{}", manifest);
//! # Ok(())
//! # }
//! ```

mod file_system;
pub use file_system::{DiscoveryOptions, FileMetadata, FileSystem};

pub mod native;
pub use native::NativeFileSystem;

//! Extension probing for file resolution.
//!
//! Tries a candidate path as written, with TypeScript's `.js` → `.ts`
//! rewrites, with each known extension appended, and finally as a
//! directory with `index.*` files.

use cull_fs::FileSystem;
use std::io;
use std::path::{Path, PathBuf};

/// Probe order for appended extensions.
pub const EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx", "mjs", "cjs", "d.ts", "json"];

/// TS-style source rewrites: an emitted-extension specifier may point at
/// the source file.
const EXTENSION_REWRITES: &[(&str, &[&str])] = &[
    ("js", &["ts", "tsx"]),
    ("jsx", &["tsx"]),
    ("mjs", &["mts"]),
    ("cjs", &["cts"]),
];

async fn is_file<F: FileSystem>(fs: &F, path: &Path) -> io::Result<bool> {
    Ok(fs.metadata(path).await?.is_file)
}

/// Append an extension without replacing an existing one.
fn with_appended_extension(path: &Path, ext: &str) -> PathBuf {
    match path.file_name().and_then(|n| n.to_str()) {
        Some(name) => path.with_file_name(format!("{name}.{ext}")),
        None => path.to_path_buf(),
    }
}

/// Try a candidate path with extension probing.
pub async fn try_extensions<F: FileSystem>(
    fs: &F,
    candidate: &Path,
) -> io::Result<Option<PathBuf>> {
    if is_file(fs, candidate).await? {
        return Ok(Some(candidate.to_path_buf()));
    }

    // `./util.js` written against emitted output resolves to the source.
    if let Some(ext) = candidate.extension().and_then(|e| e.to_str()) {
        if let Some((_, rewrites)) = EXTENSION_REWRITES.iter().find(|(from, _)| *from == ext) {
            for rewrite in *rewrites {
                let rewritten = candidate.with_extension(rewrite);
                if is_file(fs, &rewritten).await? {
                    return Ok(Some(rewritten));
                }
            }
        }
    }

    for ext in EXTENSIONS {
        let with_ext = with_appended_extension(candidate, ext);
        if is_file(fs, &with_ext).await? {
            return Ok(Some(with_ext));
        }
    }

    Ok(None)
}

/// Try a directory's `index.*` files.
pub async fn try_index_files<F: FileSystem>(fs: &F, dir: &Path) -> io::Result<Option<PathBuf>> {
    if !fs.metadata(dir).await?.is_dir {
        return Ok(None);
    }
    for ext in EXTENSIONS {
        let index = dir.join(format!("index.{ext}"));
        if is_file(fs, &index).await? {
            return Ok(Some(index));
        }
    }
    Ok(None)
}

/// Full local probe: extensions first, then index fallback.
pub async fn resolve_file<F: FileSystem>(fs: &F, candidate: &Path) -> io::Result<Option<PathBuf>> {
    if let Some(found) = try_extensions(fs, candidate).await? {
        return Ok(Some(found));
    }
    try_index_files(fs, candidate).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use cull_fs::NativeFileSystem;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn probes_extensions_and_index() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("lib")).unwrap();
        fs::write(temp.path().join("util.ts"), "").unwrap();
        fs::write(temp.path().join("lib/index.ts"), "").unwrap();

        let nfs = NativeFileSystem::new(temp.path()).unwrap();
        let root = nfs.project_root().to_path_buf();

        let found = resolve_file(&nfs, &root.join("util")).await.unwrap();
        assert!(found.unwrap().ends_with("util.ts"));

        let found = resolve_file(&nfs, &root.join("lib")).await.unwrap();
        assert!(found.unwrap().ends_with("lib/index.ts"));

        let missing = resolve_file(&nfs, &root.join("nope")).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn js_specifier_finds_ts_source() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("util.ts"), "").unwrap();

        let nfs = NativeFileSystem::new(temp.path()).unwrap();
        let root = nfs.project_root().to_path_buf();

        let found = resolve_file(&nfs, &root.join("util.js")).await.unwrap();
        assert!(found.unwrap().ends_with("util.ts"));
    }

    #[tokio::test]
    async fn dotted_names_keep_their_stem() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("user.service.ts"), "").unwrap();

        let nfs = NativeFileSystem::new(temp.path()).unwrap();
        let root = nfs.project_root().to_path_buf();

        let found = resolve_file(&nfs, &root.join("user.service")).await.unwrap();
        assert!(found.unwrap().ends_with("user.service.ts"));
    }
}

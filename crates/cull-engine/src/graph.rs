//! The reference graph.
//!
//! Files are interned to integer ids so the import graph can contain
//! cycles without ownership contortions; edges, reachability marks and
//! export references all key off [`FileId`]. The graph is mutated only by
//! the reachability engine (single-writer), everything else reads.

use cull_core::SourcePosition;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Interned file identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(pub u32);

/// What a file is, decided on first reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Parseable source.
    Source,
    /// Tool configuration.
    Config,
    /// Referenced but not parseable (images, css, ...).
    Asset,
    /// Lives outside the repository.
    External,
    /// Produced by a compiler, not on disk.
    Virtual,
}

/// Reachability channel.
///
/// Type-only imports pull files in for type checking but not for runtime,
/// so the two closures are tracked separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Runtime reachability.
    Value,
    /// Type-only reachability.
    Type,
}

/// One interned file.
#[derive(Debug, Clone)]
pub struct FileRecord {
    /// Absolute path.
    pub path: PathBuf,
    /// Kind tag.
    pub kind: FileKind,
    /// Owning workspace index (nearest enclosing).
    pub workspace: usize,
}

/// The analysis-wide reference graph.
#[derive(Debug, Default)]
pub struct FileGraph {
    ids: FxHashMap<PathBuf, FileId>,
    records: Vec<FileRecord>,
    summaries: FxHashMap<FileId, Arc<crate::extract::FileSummary>>,
    reachable_value: FxHashSet<FileId>,
    reachable_type: FxHashSet<FileId>,
    entries: FxHashSet<FileId>,
    referenced_exports: FxHashMap<FileId, FxHashSet<String>>,
    whole_file_referenced: FxHashSet<FileId>,
    used_member_names: FxHashSet<String>,
    unlisted: BTreeSet<(usize, String)>,
}

impl FileGraph {
    /// An empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a path, creating the record on first reference.
    ///
    /// Records are immutable after creation; a second intern of the same
    /// path returns the original id regardless of the arguments.
    pub fn intern(&mut self, path: &Path, kind: FileKind, workspace: usize) -> FileId {
        if let Some(&id) = self.ids.get(path) {
            return id;
        }
        let id = FileId(self.records.len() as u32);
        self.ids.insert(path.to_path_buf(), id);
        self.records.push(FileRecord {
            path: path.to_path_buf(),
            kind,
            workspace,
        });
        id
    }

    /// Look up an already-interned path.
    pub fn lookup(&self, path: &Path) -> Option<FileId> {
        self.ids.get(path).copied()
    }

    /// The record behind an id.
    pub fn record(&self, id: FileId) -> &FileRecord {
        &self.records[id.0 as usize]
    }

    /// The path behind an id.
    pub fn path(&self, id: FileId) -> &Path {
        &self.records[id.0 as usize].path
    }

    /// Number of interned files.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no files are interned.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Mark a file as an entry point.
    pub fn mark_entry(&mut self, id: FileId) {
        self.entries.insert(id);
    }

    /// Whether a file is an entry point.
    pub fn is_entry(&self, id: FileId) -> bool {
        self.entries.contains(&id)
    }

    /// Mark a file reachable in a channel. Returns true if newly marked.
    pub fn mark_reachable(&mut self, id: FileId, channel: Channel) -> bool {
        match channel {
            Channel::Value => self.reachable_value.insert(id),
            Channel::Type => self.reachable_type.insert(id),
        }
    }

    /// Whether a file is reachable in a channel.
    pub fn is_reachable(&self, id: FileId, channel: Channel) -> bool {
        match channel {
            Channel::Value => self.reachable_value.contains(&id),
            Channel::Type => self.reachable_type.contains(&id),
        }
    }

    /// Whether a file is reachable in any channel.
    pub fn is_reachable_any(&self, id: FileId) -> bool {
        self.reachable_value.contains(&id) || self.reachable_type.contains(&id)
    }

    /// Attach the extracted summary of a file (write-once).
    pub fn set_summary(&mut self, id: FileId, summary: Arc<crate::extract::FileSummary>) {
        self.summaries.entry(id).or_insert(summary);
    }

    /// The extracted summary of a file, if processed.
    pub fn summary(&self, id: FileId) -> Option<&Arc<crate::extract::FileSummary>> {
        self.summaries.get(&id)
    }

    /// Mark one export of a file as referenced.
    pub fn mark_export_referenced(&mut self, id: FileId, name: &str) {
        self.referenced_exports
            .entry(id)
            .or_default()
            .insert(name.to_string());
    }

    /// Mark every export of a file as referenced (namespace conservatism).
    pub fn mark_all_exports_referenced(&mut self, id: FileId) {
        self.whole_file_referenced.insert(id);
    }

    /// Whether an export has at least one reference.
    pub fn export_referenced(&self, id: FileId, name: &str) -> bool {
        self.whole_file_referenced.contains(&id)
            || self
                .referenced_exports
                .get(&id)
                .is_some_and(|names| names.contains(name))
    }

    /// Record property names accessed somewhere in a reachable file.
    pub fn record_member_accesses<'a>(&mut self, names: impl Iterator<Item = &'a str>) {
        for name in names {
            self.used_member_names.insert(name.to_string());
        }
    }

    /// Whether a member name is accessed anywhere in the reachable set.
    pub fn member_name_used(&self, name: &str) -> bool {
        self.used_member_names.contains(name)
    }

    /// Record an unlisted-dependency sighting.
    pub fn record_unlisted(&mut self, workspace: usize, package: String) {
        self.unlisted.insert((workspace, package));
    }

    /// All unlisted-dependency sightings, sorted.
    pub fn unlisted(&self) -> &BTreeSet<(usize, String)> {
        &self.unlisted
    }

    /// All interned files with their ids, in id order.
    pub fn files(&self) -> impl Iterator<Item = (FileId, &FileRecord)> {
        self.records
            .iter()
            .enumerate()
            .map(|(i, r)| (FileId(i as u32), r))
    }
}

/// Compute line/column for a byte offset (1-indexed line, 0-indexed column).
pub fn position_at(source: &str, offset: u32) -> SourcePosition {
    let offset = offset as usize;
    let mut line = 1u32;
    let mut column = 0u32;
    let mut current = 0usize;

    for ch in source.chars() {
        if current >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            column = 0;
        } else {
            column += 1;
        }
        current += ch.len_utf8();
    }

    SourcePosition { line, column }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_is_idempotent() {
        let mut graph = FileGraph::new();
        let a = graph.intern(Path::new("/repo/a.ts"), FileKind::Source, 0);
        let again = graph.intern(Path::new("/repo/a.ts"), FileKind::Asset, 3);
        assert_eq!(a, again);
        assert_eq!(graph.record(a).kind, FileKind::Source);
        assert_eq!(graph.record(a).workspace, 0);
    }

    #[test]
    fn channels_tracked_separately() {
        let mut graph = FileGraph::new();
        let a = graph.intern(Path::new("/repo/a.ts"), FileKind::Source, 0);

        assert!(graph.mark_reachable(a, Channel::Type));
        assert!(!graph.mark_reachable(a, Channel::Type));
        assert!(graph.is_reachable(a, Channel::Type));
        assert!(!graph.is_reachable(a, Channel::Value));
        assert!(graph.is_reachable_any(a));
    }

    #[test]
    fn whole_file_reference_covers_every_name() {
        let mut graph = FileGraph::new();
        let a = graph.intern(Path::new("/repo/fruits.ts"), FileKind::Source, 0);

        assert!(!graph.export_referenced(a, "apple"));
        graph.mark_all_exports_referenced(a);
        assert!(graph.export_referenced(a, "apple"));
        assert!(graph.export_referenced(a, "orange"));
    }

    #[test]
    fn position_computation() {
        let source = "line 1\nline 2\nline 3";
        assert_eq!(position_at(source, 0), SourcePosition { line: 1, column: 0 });
        assert_eq!(position_at(source, 7), SourcePosition { line: 2, column: 0 });
        assert_eq!(position_at(source, 9), SourcePosition { line: 2, column: 2 });
    }
}

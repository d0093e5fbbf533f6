//! Reference extraction.
//!
//! One pass over a parsed file yields its [`FileSummary`]: import edges
//! (static, re-export, dynamic, `require`, `new URL`), export records
//! (including class/enum members when enabled), and the namespace-use and
//! member-access information the classifier needs. Summaries are immutable
//! once built; the walker applies them to the shared graph.

mod collect;
mod members;
mod visitor;

use crate::parser::jsdoc::ExportTags;
use crate::parser::{self, SourceKind};
use cull_core::SourcePosition;
use oxc_allocator::Allocator;
use oxc_semantic::SemanticBuilder;
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;
use std::path::Path;

/// Extraction mode flags.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractOptions {
    /// Extract class members of exported classes.
    pub class_members: bool,
    /// Extract members of exported enums.
    pub enum_members: bool,
}

/// Everything extracted from one file.
#[derive(Debug, Default)]
pub struct FileSummary {
    /// Import edges, in source order.
    pub imports: Vec<ImportEdge>,
    /// Export records.
    pub exports: Vec<ExportRecord>,
    /// Property names accessed anywhere in the file.
    pub member_accesses: BTreeSet<String>,
    /// Span starts of dynamic imports whose specifier is not a string
    /// literal; these resolve to nothing and surface as diagnostics.
    pub dynamic_unresolvable: Vec<u32>,
    /// Parser error messages; non-empty means the file was admitted empty.
    pub parse_errors: Vec<String>,
}

/// One import edge: a specifier plus how its bindings are used.
#[derive(Debug, Clone)]
pub struct ImportEdge {
    /// The specifier text as written.
    pub specifier: String,
    /// The bindings this statement introduces.
    pub clauses: Vec<ImportClause>,
    /// `import()` rather than a static form.
    pub is_dynamic: bool,
    /// Type-only (`import type`, `export type ... from`).
    pub is_type_only: bool,
    /// Span start of the statement.
    pub span_start: u32,
}

/// One binding (or binding-free form) of an import edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportClause {
    /// `import { name }` — references the named export when read locally.
    Named {
        /// Name as exported by the target module.
        imported: String,
        /// Whether the local binding is read in this file.
        used: bool,
    },
    /// `import name from` — references the default export.
    Default {
        /// Whether the local binding is read in this file.
        used: bool,
    },
    /// `import * as ns` with how the namespace object is consumed.
    Namespace(NamespaceAccess),
    /// `import 'x'` or other binding-free reference.
    SideEffect,
    /// `export { a as b } from 'x'` — (source name, exported-as) pairs.
    ReExportNamed(Vec<(String, String)>),
    /// `export * from 'x'` / `export * as ns from 'x'`.
    ReExportAll {
        /// The namespace name for the `as ns` form.
        exported_as: Option<String>,
    },
}

/// How a namespace binding is consumed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceAccess {
    /// Member names accessed as `ns.member` or destructured.
    pub members: BTreeSet<String>,
    /// A whole-namespace use was seen (iteration, spread, passing the
    /// object around); every export of the source module counts as
    /// referenced.
    pub whole: bool,
}

/// Kind of an export record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportKind {
    /// Runtime value (const, function, class, ...).
    Value,
    /// Type-only (interface, type alias, `export type`).
    Type,
    /// The default export.
    Default,
    /// `export * as ns from` namespace export.
    Namespace,
    /// An exported enum declaration.
    Enum,
    /// One member of an exported enum.
    EnumMember {
        /// The owning enum's exported name.
        enum_name: String,
    },
    /// One member of an exported class.
    ClassMember {
        /// The owning class's exported name.
        class_name: String,
        /// Member flavor.
        member: MemberKind,
        /// Member visibility.
        visibility: Visibility,
        /// Static member.
        is_static: bool,
    },
}

/// Class member flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    /// Method.
    Method,
    /// Property.
    Property,
    /// Getter.
    Getter,
    /// Setter.
    Setter,
}

/// Class member visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Public (default).
    Public,
    /// TypeScript `protected`.
    Protected,
    /// TypeScript `private` or `#name`.
    Private,
}

/// One export of a file.
#[derive(Debug, Clone)]
pub struct ExportRecord {
    /// Export name; `"default"` for the default export, `Enum.Member` /
    /// `Class.member` for members.
    pub name: String,
    /// What kind of export this is.
    pub kind: ExportKind,
    /// Span start of the declaration.
    pub span_start: u32,
    /// Line/column of the declaration.
    pub position: SourcePosition,
    /// JSDoc tags on the declaration.
    pub tags: ExportTags,
    /// Whether the exported binding is also read inside its own file.
    pub used_in_file: bool,
}

/// Extract the summary of one source file.
///
/// Parse errors do not fail the call: the summary comes back empty with
/// the errors recorded, so one broken file never cascades.
pub fn extract_summary(
    path: &Path,
    source: &str,
    kind: SourceKind,
    options: ExtractOptions,
) -> FileSummary {
    let mut summary = FileSummary::default();
    if !kind.is_parseable() {
        return summary;
    }

    let allocator = Allocator::default();
    let ret = match parser::parse_program(&allocator, source, path, kind) {
        Ok(ret) => ret,
        Err(errors) => {
            summary.parse_errors = errors;
            return summary;
        }
    };
    let program = &ret.program;

    let semantic_ret = SemanticBuilder::new().build(program);
    let reads = read_counts(&semantic_ret.semantic);

    // Pass 1: module declarations (static imports, exports, re-exports)
    // plus top-level require bindings.
    let mut namespace_locals: FxHashMap<String, usize> = FxHashMap::default();
    let consumed = collect::collect_module_records(
        program,
        source,
        &reads,
        options,
        &mut summary,
        &mut namespace_locals,
    );

    // Pass 2: expression-level references (dynamic imports, nested
    // require, `new URL`, namespace uses, member accesses).
    visitor::collect_references(program, &namespace_locals, &consumed.require_calls, &mut summary);

    summary
}

/// Read counts per module-level binding name.
fn read_counts(semantic: &oxc_semantic::Semantic<'_>) -> FxHashMap<String, u32> {
    let scoping = semantic.scoping();
    let root = scoping.root_scope_id();
    let mut reads: FxHashMap<String, u32> = FxHashMap::default();

    for symbol_id in scoping.symbol_ids() {
        if scoping.symbol_scope_id(symbol_id) != root {
            continue;
        }
        let mut count = 0u32;
        for &reference_id in scoping.get_resolved_reference_ids(symbol_id) {
            let reference = scoping.get_reference(reference_id);
            // Type-annotation references are neither read nor write; they
            // still count as uses.
            if reference.is_read() || !reference.is_write() {
                count += 1;
            }
        }
        let name = scoping.symbol_name(symbol_id).to_string();
        let entry = reads.entry(name).or_insert(0);
        *entry = (*entry).max(count);
    }

    reads
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summarize(source: &str) -> FileSummary {
        extract_summary(
            Path::new("test.ts"),
            source,
            SourceKind::TypeScript,
            ExtractOptions::default(),
        )
    }

    #[test]
    fn static_import_forms() {
        let summary = summarize(
            "import def from './a';\n\
             import { one, two as alias } from './b';\n\
             import * as ns from './c';\n\
             import './side-effect';\n",
        );

        assert_eq!(summary.imports.len(), 4);
        assert_eq!(summary.imports[0].specifier, "./a");
        assert!(matches!(summary.imports[0].clauses[0], ImportClause::Default { .. }));
        assert!(matches!(
            &summary.imports[1].clauses[0],
            ImportClause::Named { imported, .. } if imported == "one"
        ));
        assert!(matches!(
            &summary.imports[1].clauses[1],
            ImportClause::Named { imported, .. } if imported == "two"
        ));
        assert!(matches!(summary.imports[2].clauses[0], ImportClause::Namespace(_)));
        assert_eq!(summary.imports[3].clauses[0], ImportClause::SideEffect);
    }

    #[test]
    fn named_import_used_flag_tracks_reads() {
        let summary = summarize(
            "import { used, unused } from './a';\nconsole.log(used);\n",
        );
        let clauses = &summary.imports[0].clauses;
        assert_eq!(
            clauses[0],
            ImportClause::Named { imported: "used".into(), used: true }
        );
        assert_eq!(
            clauses[1],
            ImportClause::Named { imported: "unused".into(), used: false }
        );
    }

    #[test]
    fn type_only_imports_flagged() {
        let summary = summarize("import type { Props } from './types';\n");
        assert!(summary.imports[0].is_type_only);
    }

    #[test]
    fn exports_collected_with_kinds() {
        let summary = summarize(
            "export const value = 1;\n\
             export type Alias = string;\n\
             export interface Shape { x: number }\n\
             export default function main() {}\n",
        );

        let names: Vec<(&str, &ExportKind)> = summary
            .exports
            .iter()
            .map(|e| (e.name.as_str(), &e.kind))
            .collect();

        assert!(names.contains(&("value", &ExportKind::Value)));
        assert!(names.contains(&("Alias", &ExportKind::Type)));
        assert!(names.contains(&("Shape", &ExportKind::Type)));
        assert!(names.contains(&("default", &ExportKind::Default)));
    }

    #[test]
    fn re_exports_are_edges_and_exports() {
        let summary = summarize(
            "export { a, b as c } from './a';\nexport * from './b';\n",
        );

        assert_eq!(summary.imports.len(), 2);
        assert!(matches!(
            &summary.imports[0].clauses[0],
            ImportClause::ReExportNamed(names) if names.len() == 2
        ));
        assert!(matches!(
            &summary.imports[1].clauses[0],
            ImportClause::ReExportAll { exported_as: None }
        ));

        // Named re-exports surface as exports of this file.
        assert!(summary.exports.iter().any(|e| e.name == "a"));
        assert!(summary.exports.iter().any(|e| e.name == "c"));
    }

    #[test]
    fn dynamic_import_string_literal_is_edge() {
        let summary = summarize("const mod = await import('./lazy');\n");
        assert_eq!(summary.imports.len(), 1);
        assert!(summary.imports[0].is_dynamic);
        assert_eq!(summary.imports[0].specifier, "./lazy");
    }

    #[test]
    fn dynamic_import_expression_is_unresolvable() {
        let summary = summarize("const m = await import('./entry-' + name + '.ts');\n");
        assert!(summary.imports.is_empty());
        assert_eq!(summary.dynamic_unresolvable.len(), 1);
    }

    #[test]
    fn require_with_string_literal() {
        let summary = extract_summary(
            Path::new("test.js"),
            "const lib = require('./lib');\nrequire('./register');\n",
            SourceKind::JavaScript,
            ExtractOptions::default(),
        );
        assert_eq!(summary.imports.len(), 2);
        assert_eq!(summary.imports[0].specifier, "./lib");
        assert_eq!(summary.imports[1].specifier, "./register");
    }

    #[test]
    fn new_url_pattern_is_edge() {
        let summary = summarize("const worker = new URL('./worker.ts', import.meta.url);\n");
        assert_eq!(summary.imports.len(), 1);
        assert_eq!(summary.imports[0].specifier, "./worker.ts");
    }

    #[test]
    fn namespace_member_use() {
        let summary = summarize("import * as F from './fruits';\nconsole.log(F.apple);\n");
        let ImportClause::Namespace(access) = &summary.imports[0].clauses[0] else {
            panic!("expected namespace clause");
        };
        assert!(access.members.contains("apple"));
        assert!(!access.whole);
    }

    #[test]
    fn namespace_iteration_is_whole_use() {
        let summary = summarize("import * as F from './fruits';\nObject.values(F);\n");
        let ImportClause::Namespace(access) = &summary.imports[0].clauses[0] else {
            panic!("expected namespace clause");
        };
        assert!(access.whole);
    }

    #[test]
    fn namespace_destructuring_marks_names_only() {
        let summary = summarize("import * as F from './fruits';\nconst { apple } = F;\n");
        let ImportClause::Namespace(access) = &summary.imports[0].clauses[0] else {
            panic!("expected namespace clause");
        };
        assert!(access.members.contains("apple"));
        assert!(!access.whole);
    }

    #[test]
    fn namespace_passed_as_argument_is_whole_use() {
        let summary = summarize("import * as F from './fruits';\nprocess(F);\n");
        let ImportClause::Namespace(access) = &summary.imports[0].clauses[0] else {
            panic!("expected namespace clause");
        };
        assert!(access.whole);
    }

    #[test]
    fn parse_error_admits_file_empty() {
        let summary = summarize("const x = {{{{");
        assert!(!summary.parse_errors.is_empty());
        assert!(summary.imports.is_empty());
        assert!(summary.exports.is_empty());
    }

    #[test]
    fn jsdoc_public_tag_lands_on_export() {
        let summary = summarize(
            "/** Part of the published API.\n * @public\n */\nexport const api = 1;\n\nexport const internal = 2;\n",
        );
        let api = summary.exports.iter().find(|e| e.name == "api").unwrap();
        assert!(api.tags.public);
        let other = summary.exports.iter().find(|e| e.name == "internal").unwrap();
        assert!(!other.tags.public);
    }

    #[test]
    fn enum_members_extracted_when_enabled() {
        let summary = extract_summary(
            Path::new("test.ts"),
            "export enum Status { Active = 'active', Retired = 'retired' }\n",
            SourceKind::TypeScript,
            ExtractOptions { enum_members: true, ..Default::default() },
        );

        assert!(summary.exports.iter().any(|e| e.kind == ExportKind::Enum));
        let members: Vec<&str> = summary
            .exports
            .iter()
            .filter(|e| matches!(e.kind, ExportKind::EnumMember { .. }))
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(members, vec!["Status.Active", "Status.Retired"]);
    }

    #[test]
    fn class_members_extracted_when_enabled() {
        let summary = extract_summary(
            Path::new("test.ts"),
            "export class C {\n  used() {}\n  unused() {}\n  private secret() {}\n}\n",
            SourceKind::TypeScript,
            ExtractOptions { class_members: true, ..Default::default() },
        );

        let members: Vec<(&str, &ExportKind)> = summary
            .exports
            .iter()
            .filter(|e| matches!(e.kind, ExportKind::ClassMember { .. }))
            .map(|e| (e.name.as_str(), &e.kind))
            .collect();

        assert_eq!(members.len(), 3);
        assert!(members.iter().any(|(n, _)| *n == "C.used"));
        let secret = summary
            .exports
            .iter()
            .find(|e| e.name == "C.secret")
            .unwrap();
        assert!(matches!(
            &secret.kind,
            ExportKind::ClassMember { visibility: Visibility::Private, .. }
        ));
    }

    #[test]
    fn member_accesses_recorded() {
        let summary = summarize("const a = obj.fieldOne;\nobj.methodTwo();\n");
        assert!(summary.member_accesses.contains("fieldOne"));
        assert!(summary.member_accesses.contains("methodTwo"));
    }
}

//! Static import/export collection.
//!
//! Walks the module declarations of a parsed program: `import` statements,
//! `export` declarations, re-exports and top-level `require()` bindings.
//! Expression-level references are the visitor's job.

use super::members;
use super::{
    ExportKind, ExportRecord, ExtractOptions, FileSummary, ImportClause, ImportEdge,
    NamespaceAccess,
};
use crate::graph::position_at;
use crate::parser::jsdoc;
use oxc_ast::ast::{
    BindingPatternKind, Declaration, Expression, ModuleDeclaration, ModuleExportName, Program,
    PropertyKey, Statement,
};
use rustc_hash::{FxHashMap, FxHashSet};

/// Spans already handled here, so the visitor does not double-count.
#[derive(Debug, Default)]
pub(super) struct ConsumedSpans {
    /// Span starts of `require()` calls turned into edges.
    pub require_calls: FxHashSet<u32>,
}

pub(super) fn collect_module_records(
    program: &Program<'_>,
    source: &str,
    reads: &FxHashMap<String, u32>,
    options: ExtractOptions,
    summary: &mut FileSummary,
    namespace_locals: &mut FxHashMap<String, usize>,
) -> ConsumedSpans {
    let mut consumed = ConsumedSpans::default();

    for stmt in program.body.iter() {
        if let Some(module_decl) = stmt.as_module_declaration() {
            collect_module_declaration(
                module_decl,
                program,
                source,
                reads,
                options,
                summary,
                namespace_locals,
            );
            continue;
        }

        collect_top_level_require(stmt, summary, namespace_locals, &mut consumed);
    }

    consumed
}

fn collect_module_declaration(
    module_decl: &ModuleDeclaration<'_>,
    program: &Program<'_>,
    source: &str,
    reads: &FxHashMap<String, u32>,
    options: ExtractOptions,
    summary: &mut FileSummary,
    namespace_locals: &mut FxHashMap<String, usize>,
) {
    match module_decl {
        ModuleDeclaration::ImportDeclaration(import) => {
            let mut clauses = Vec::new();
            let mut all_specifiers_type_only = true;

            if let Some(specifiers) = &import.specifiers {
                for spec in specifiers {
                    use oxc_ast::ast::ImportDeclarationSpecifier::*;
                    match spec {
                        ImportDefaultSpecifier(default_spec) => {
                            all_specifiers_type_only = false;
                            clauses.push(ImportClause::Default {
                                used: is_read(reads, default_spec.local.name.as_str()),
                            });
                        }
                        ImportNamespaceSpecifier(ns_spec) => {
                            all_specifiers_type_only = false;
                            namespace_locals
                                .insert(ns_spec.local.name.to_string(), summary.imports.len());
                            clauses.push(ImportClause::Namespace(NamespaceAccess::default()));
                        }
                        ImportSpecifier(named_spec) => {
                            if !named_spec.import_kind.is_type() {
                                all_specifiers_type_only = false;
                            }
                            clauses.push(ImportClause::Named {
                                imported: export_name(&named_spec.imported),
                                used: is_read(reads, named_spec.local.name.as_str()),
                            });
                        }
                    }
                }
            }

            let is_type_only = import.import_kind.is_type()
                || (import.specifiers.as_ref().is_some_and(|s| !s.is_empty())
                    && all_specifiers_type_only);

            if clauses.is_empty() {
                clauses.push(ImportClause::SideEffect);
            }

            summary.imports.push(ImportEdge {
                specifier: import.source.value.to_string(),
                clauses,
                is_dynamic: false,
                is_type_only,
                span_start: import.span.start,
            });
        }

        ModuleDeclaration::ExportNamedDeclaration(named) => {
            let tags = jsdoc::tags_for_declaration(source, &program.comments, named.span.start);

            if let Some(src) = &named.source {
                // Re-export: an edge plus exports on this file.
                let names: Vec<(String, String)> = named
                    .specifiers
                    .iter()
                    .map(|spec| (export_name(&spec.local), export_name(&spec.exported)))
                    .collect();

                for spec in &named.specifiers {
                    let kind = if named.export_kind.is_type() || spec.export_kind.is_type() {
                        ExportKind::Type
                    } else {
                        ExportKind::Value
                    };
                    summary.exports.push(ExportRecord {
                        name: export_name(&spec.exported),
                        kind,
                        span_start: named.span.start,
                        position: position_at(source, named.span.start),
                        tags: tags.clone(),
                        used_in_file: false,
                    });
                }

                summary.imports.push(ImportEdge {
                    specifier: src.value.to_string(),
                    clauses: vec![ImportClause::ReExportNamed(names)],
                    is_dynamic: false,
                    is_type_only: named.export_kind.is_type(),
                    span_start: named.span.start,
                });
            } else if let Some(decl) = &named.declaration {
                collect_export_declaration(
                    decl,
                    named.span.start,
                    program,
                    source,
                    reads,
                    options,
                    summary,
                );
            } else {
                // `export { a, b as c }` over local bindings. The export
                // specifier itself counts as one read of the binding.
                for spec in &named.specifiers {
                    let local = export_name(&spec.local);
                    let kind = if named.export_kind.is_type() || spec.export_kind.is_type() {
                        ExportKind::Type
                    } else {
                        ExportKind::Value
                    };
                    summary.exports.push(ExportRecord {
                        name: export_name(&spec.exported),
                        kind,
                        span_start: named.span.start,
                        position: position_at(source, named.span.start),
                        tags: tags.clone(),
                        used_in_file: reads.get(local.as_str()).copied().unwrap_or(0) > 1,
                    });
                }
            }
        }

        ModuleDeclaration::ExportDefaultDeclaration(default) => {
            let tags = jsdoc::tags_for_declaration(source, &program.comments, default.span.start);
            summary.exports.push(ExportRecord {
                name: "default".to_string(),
                kind: ExportKind::Default,
                span_start: default.span.start,
                position: position_at(source, default.span.start),
                tags,
                used_in_file: false,
            });

            if options.class_members {
                use oxc_ast::ast::ExportDefaultDeclarationKind;
                if let ExportDefaultDeclarationKind::ClassDeclaration(class) = &default.declaration
                {
                    let class_name = class
                        .id
                        .as_ref()
                        .map(|id| id.name.to_string())
                        .unwrap_or_else(|| "default".to_string());
                    members::collect_class_members(class, &class_name, source, summary);
                }
            }
        }

        ModuleDeclaration::ExportAllDeclaration(all) => {
            let exported_as = all.exported.as_ref().map(export_name);

            if let Some(name) = &exported_as {
                let tags = jsdoc::tags_for_declaration(source, &program.comments, all.span.start);
                summary.exports.push(ExportRecord {
                    name: name.clone(),
                    kind: ExportKind::Namespace,
                    span_start: all.span.start,
                    position: position_at(source, all.span.start),
                    tags,
                    used_in_file: false,
                });
            }

            summary.imports.push(ImportEdge {
                specifier: all.source.value.to_string(),
                clauses: vec![ImportClause::ReExportAll { exported_as }],
                is_dynamic: false,
                is_type_only: all.export_kind.is_type(),
                span_start: all.span.start,
            });
        }

        _ => {}
    }
}

fn collect_export_declaration(
    decl: &Declaration<'_>,
    span_start: u32,
    program: &Program<'_>,
    source: &str,
    reads: &FxHashMap<String, u32>,
    options: ExtractOptions,
    summary: &mut FileSummary,
) {
    let tags = jsdoc::tags_for_declaration(source, &program.comments, span_start);

    let position = position_at(source, span_start);
    let mut push = |name: String, kind: ExportKind, summary: &mut FileSummary| {
        let used_in_file = is_read(reads, name.as_str());
        summary.exports.push(ExportRecord {
            name,
            kind,
            span_start,
            position,
            tags: tags.clone(),
            used_in_file,
        });
    };

    match decl {
        Declaration::FunctionDeclaration(func) => {
            if let Some(id) = &func.id {
                push(id.name.to_string(), ExportKind::Value, summary);
            }
        }
        Declaration::VariableDeclaration(var) => {
            for declarator in &var.declarations {
                if let BindingPatternKind::BindingIdentifier(ident) = &declarator.id.kind {
                    push(ident.name.to_string(), ExportKind::Value, summary);
                }
            }
        }
        Declaration::ClassDeclaration(class) => {
            if let Some(id) = &class.id {
                let class_name = id.name.to_string();
                push(class_name.clone(), ExportKind::Value, summary);
                if options.class_members {
                    members::collect_class_members(class, &class_name, source, summary);
                }
            }
        }
        Declaration::TSEnumDeclaration(enum_decl) => {
            let enum_name = enum_decl.id.name.to_string();
            push(enum_name.clone(), ExportKind::Enum, summary);
            if options.enum_members {
                members::collect_enum_members(enum_decl, &enum_name, source, summary);
            }
        }
        Declaration::TSTypeAliasDeclaration(alias) => {
            push(alias.id.name.to_string(), ExportKind::Type, summary);
        }
        Declaration::TSInterfaceDeclaration(interface) => {
            push(interface.id.name.to_string(), ExportKind::Type, summary);
        }
        _ => {}
    }
}

/// Top-level `require()` forms: bound namespaces, destructured names and
/// bare side-effect calls.
fn collect_top_level_require(
    stmt: &Statement<'_>,
    summary: &mut FileSummary,
    namespace_locals: &mut FxHashMap<String, usize>,
    consumed: &mut ConsumedSpans,
) {
    match stmt {
        Statement::VariableDeclaration(var) => {
            for declarator in &var.declarations {
                let Some(init) = &declarator.init else {
                    continue;
                };
                let Some((specifier, call_span)) = require_specifier(init) else {
                    continue;
                };
                consumed.require_calls.insert(call_span);

                match &declarator.id.kind {
                    BindingPatternKind::BindingIdentifier(ident) => {
                        // The binding behaves like a namespace object;
                        // later uses classify through the same machinery.
                        namespace_locals.insert(ident.name.to_string(), summary.imports.len());
                        summary.imports.push(ImportEdge {
                            specifier,
                            clauses: vec![ImportClause::Namespace(NamespaceAccess::default())],
                            is_dynamic: false,
                            is_type_only: false,
                            span_start: call_span,
                        });
                    }
                    BindingPatternKind::ObjectPattern(pattern) => {
                        let mut clauses = Vec::new();
                        for property in &pattern.properties {
                            if let PropertyKey::StaticIdentifier(key) = &property.key {
                                clauses.push(ImportClause::Named {
                                    imported: key.name.to_string(),
                                    used: true,
                                });
                            }
                        }
                        if pattern.rest.is_some() || clauses.is_empty() {
                            clauses.push(ImportClause::Namespace(NamespaceAccess {
                                whole: true,
                                ..Default::default()
                            }));
                        }
                        summary.imports.push(ImportEdge {
                            specifier,
                            clauses,
                            is_dynamic: false,
                            is_type_only: false,
                            span_start: call_span,
                        });
                    }
                    _ => {
                        summary.imports.push(ImportEdge {
                            specifier,
                            clauses: vec![ImportClause::SideEffect],
                            is_dynamic: false,
                            is_type_only: false,
                            span_start: call_span,
                        });
                    }
                }
            }
        }
        Statement::ExpressionStatement(expr_stmt) => {
            if let Some((specifier, call_span)) = require_specifier(&expr_stmt.expression) {
                consumed.require_calls.insert(call_span);
                summary.imports.push(ImportEdge {
                    specifier,
                    clauses: vec![ImportClause::SideEffect],
                    is_dynamic: false,
                    is_type_only: false,
                    span_start: call_span,
                });
            }
        }
        _ => {}
    }
}

/// `require("literal")` — the specifier and call span.
pub(super) fn require_specifier(expr: &Expression<'_>) -> Option<(String, u32)> {
    let Expression::CallExpression(call) = expr else {
        return None;
    };
    require_from_call(call)
}

/// Same check starting from an already-matched call expression.
pub(super) fn require_from_call(call: &oxc_ast::ast::CallExpression<'_>) -> Option<(String, u32)> {
    let Expression::Identifier(callee) = &call.callee else {
        return None;
    };
    if callee.name != "require" || call.arguments.len() != 1 {
        return None;
    }
    let Some(Expression::StringLiteral(lit)) = call.arguments[0].as_expression() else {
        return None;
    };
    Some((lit.value.to_string(), call.span.start))
}

fn export_name(name: &ModuleExportName) -> String {
    match name {
        ModuleExportName::IdentifierName(ident) => ident.name.to_string(),
        ModuleExportName::IdentifierReference(ident) => ident.name.to_string(),
        ModuleExportName::StringLiteral(lit) => lit.value.to_string(),
    }
}

fn is_read(reads: &FxHashMap<String, u32>, name: &str) -> bool {
    reads.get(name).copied().unwrap_or(0) > 0
}

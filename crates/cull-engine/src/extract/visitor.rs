//! Expression-level reference collection.
//!
//! An AST visitor that finds what the module-declaration walk cannot see:
//! dynamic `import()`, nested `require()`, `new URL(..., import.meta.url)`,
//! property accesses, and how namespace bindings are consumed.
//!
//! Namespace classification: a handled context (member access,
//! destructuring, recognized iteration) consumes the identifier; any
//! remaining bare reference to a namespace binding is a whole-namespace
//! use, which conservatively references every export of the source module.

use super::collect::require_from_call;
use super::{FileSummary, ImportClause, ImportEdge, NamespaceAccess};
use oxc_ast::ast::{
    CallExpression, ComputedMemberExpression, Expression, ForInStatement, ForOfStatement,
    ImportExpression, NewExpression, Program, SpreadElement, StaticMemberExpression,
    VariableDeclarator,
};
use oxc_ast_visit::{walk, Visit};
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::BTreeSet;

/// `Object` statics whose first argument is consumed wholesale.
const OBJECT_ITERATORS: &[&str] = &["values", "keys", "entries", "assign", "freeze"];

pub(super) fn collect_references(
    program: &Program<'_>,
    namespace_locals: &FxHashMap<String, usize>,
    consumed_requires: &FxHashSet<u32>,
    summary: &mut FileSummary,
) {
    let mut visitor = ReferenceVisitor {
        namespace_locals,
        consumed_requires,
        handled_identifiers: FxHashSet::default(),
        accesses: FxHashMap::default(),
        new_edges: Vec::new(),
        dynamic_unresolvable: Vec::new(),
        member_accesses: BTreeSet::new(),
    };

    visitor.visit_program(program);

    let ReferenceVisitor {
        accesses,
        new_edges,
        dynamic_unresolvable,
        member_accesses,
        ..
    } = visitor;

    for (edge_idx, found) in accesses {
        if let Some(edge) = summary.imports.get_mut(edge_idx) {
            for clause in &mut edge.clauses {
                if let ImportClause::Namespace(access) = clause {
                    access.whole |= found.whole;
                    access.members.extend(found.members.iter().cloned());
                }
            }
        }
    }

    summary.imports.extend(new_edges);
    summary.dynamic_unresolvable.extend(dynamic_unresolvable);
    summary.member_accesses.extend(member_accesses);
}

struct ReferenceVisitor<'a> {
    namespace_locals: &'a FxHashMap<String, usize>,
    consumed_requires: &'a FxHashSet<u32>,
    /// Identifier spans already classified by an enclosing context.
    handled_identifiers: FxHashSet<u32>,
    accesses: FxHashMap<usize, NamespaceAccess>,
    new_edges: Vec<ImportEdge>,
    dynamic_unresolvable: Vec<u32>,
    member_accesses: BTreeSet<String>,
}

impl<'a> ReferenceVisitor<'a> {
    /// The namespace edge behind an expression, when it is a bare
    /// namespace identifier.
    fn namespace_of(&self, expr: &Expression<'_>) -> Option<(usize, u32)> {
        let Expression::Identifier(ident) = expr else {
            return None;
        };
        self.namespace_locals
            .get(ident.name.as_str())
            .map(|&edge| (edge, ident.span.start))
    }

    fn mark_member(&mut self, edge: usize, span: u32, member: &str) {
        self.handled_identifiers.insert(span);
        self.accesses
            .entry(edge)
            .or_default()
            .members
            .insert(member.to_string());
    }

    fn mark_whole(&mut self, edge: usize, span: u32) {
        self.handled_identifiers.insert(span);
        self.accesses.entry(edge).or_default().whole = true;
    }
}

impl<'a, 'ast> Visit<'ast> for ReferenceVisitor<'a> {
    fn visit_import_expression(&mut self, expr: &ImportExpression<'ast>) {
        match &expr.source {
            Expression::StringLiteral(lit) => {
                // The awaited module object is opaque to this pass, so all
                // of its exports count as referenced.
                self.new_edges.push(ImportEdge {
                    specifier: lit.value.to_string(),
                    clauses: vec![ImportClause::Namespace(NamespaceAccess {
                        whole: true,
                        ..Default::default()
                    })],
                    is_dynamic: true,
                    is_type_only: false,
                    span_start: expr.span.start,
                });
            }
            _ => self.dynamic_unresolvable.push(expr.span.start),
        }
        walk::walk_import_expression(self, expr);
    }

    fn visit_call_expression(&mut self, call: &CallExpression<'ast>) {
        if let Some((specifier, span)) = require_from_call(call) {
            if !self.consumed_requires.contains(&span) {
                self.new_edges.push(ImportEdge {
                    specifier,
                    clauses: vec![ImportClause::SideEffect],
                    is_dynamic: false,
                    is_type_only: false,
                    span_start: span,
                });
            }
        }

        // Object.values(ns) and friends iterate every export.
        if let Expression::StaticMemberExpression(member) = &call.callee {
            if matches!(&member.object, Expression::Identifier(obj) if obj.name == "Object")
                && OBJECT_ITERATORS.contains(&member.property.name.as_str())
            {
                if let Some(first) = call.arguments.first().and_then(|a| a.as_expression()) {
                    if let Some((edge, span)) = self.namespace_of(first) {
                        self.mark_whole(edge, span);
                    }
                }
            }
        }

        // A namespace passed to any call escapes analysis.
        for argument in &call.arguments {
            if let Some(expr) = argument.as_expression() {
                if let Some((edge, span)) = self.namespace_of(expr) {
                    self.mark_whole(edge, span);
                }
            }
        }

        walk::walk_call_expression(self, call);
    }

    fn visit_new_expression(&mut self, new_expr: &NewExpression<'ast>) {
        if let Expression::Identifier(callee) = &new_expr.callee {
            if callee.name == "URL" && new_expr.arguments.len() == 2 {
                let spec = new_expr.arguments[0].as_expression();
                let base = new_expr.arguments[1].as_expression();
                if let (Some(Expression::StringLiteral(lit)), Some(base)) = (spec, base) {
                    if is_import_meta_url(base) {
                        self.new_edges.push(ImportEdge {
                            specifier: lit.value.to_string(),
                            clauses: vec![ImportClause::SideEffect],
                            is_dynamic: false,
                            is_type_only: false,
                            span_start: new_expr.span.start,
                        });
                    }
                }
            }
        }
        walk::walk_new_expression(self, new_expr);
    }

    fn visit_static_member_expression(&mut self, expr: &StaticMemberExpression<'ast>) {
        self.member_accesses
            .insert(expr.property.name.to_string());

        if let Some((edge, span)) = self.namespace_of(&expr.object) {
            self.mark_member(edge, span, expr.property.name.as_str());
        }

        walk::walk_static_member_expression(self, expr);
    }

    fn visit_computed_member_expression(&mut self, expr: &ComputedMemberExpression<'ast>) {
        match (&self.namespace_of(&expr.object), &expr.expression) {
            (Some((edge, span)), Expression::StringLiteral(lit)) => {
                self.member_accesses.insert(lit.value.to_string());
                self.mark_member(*edge, *span, lit.value.as_str());
            }
            (Some((edge, span)), _) => {
                // Computed access with an unknown key reaches anything.
                self.mark_whole(*edge, *span);
            }
            (None, Expression::StringLiteral(lit)) => {
                self.member_accesses.insert(lit.value.to_string());
            }
            _ => {}
        }

        walk::walk_computed_member_expression(self, expr);
    }

    fn visit_for_in_statement(&mut self, stmt: &ForInStatement<'ast>) {
        if let Some((edge, span)) = self.namespace_of(&stmt.right) {
            self.mark_whole(edge, span);
        }
        walk::walk_for_in_statement(self, stmt);
    }

    fn visit_for_of_statement(&mut self, stmt: &ForOfStatement<'ast>) {
        if let Some((edge, span)) = self.namespace_of(&stmt.right) {
            self.mark_whole(edge, span);
        }
        walk::walk_for_of_statement(self, stmt);
    }

    fn visit_spread_element(&mut self, spread: &SpreadElement<'ast>) {
        if let Some((edge, span)) = self.namespace_of(&spread.argument) {
            self.mark_whole(edge, span);
        }
        walk::walk_spread_element(self, spread);
    }

    fn visit_variable_declarator(&mut self, declarator: &VariableDeclarator<'ast>) {
        use oxc_ast::ast::{BindingPatternKind, PropertyKey};

        if let Some(init) = &declarator.init {
            if let Some((edge, span)) = self.namespace_of(init) {
                match &declarator.id.kind {
                    BindingPatternKind::ObjectPattern(pattern) => {
                        for property in &pattern.properties {
                            if let PropertyKey::StaticIdentifier(key) = &property.key {
                                self.mark_member(edge, span, key.name.as_str());
                            }
                        }
                        if pattern.rest.is_some() {
                            self.mark_whole(edge, span);
                        } else {
                            self.handled_identifiers.insert(span);
                        }
                    }
                    // Aliasing the namespace object escapes analysis.
                    _ => self.mark_whole(edge, span),
                }
            } else if let BindingPatternKind::ObjectPattern(pattern) = &declarator.id.kind {
                // Destructuring any object is a member access by name.
                for property in &pattern.properties {
                    if let PropertyKey::StaticIdentifier(key) = &property.key {
                        self.member_accesses.insert(key.name.to_string());
                    }
                }
            }
        }

        walk::walk_variable_declarator(self, declarator);
    }

    fn visit_private_field_expression(
        &mut self,
        expr: &oxc_ast::ast::PrivateFieldExpression<'ast>,
    ) {
        // `this.#secret` counts as a use of the private member.
        self.member_accesses.insert(format!("#{}", expr.field.name));
        walk::walk_private_field_expression(self, expr);
    }

    fn visit_identifier_reference(&mut self, ident: &oxc_ast::ast::IdentifierReference<'ast>) {
        if self.handled_identifiers.contains(&ident.span.start) {
            return;
        }
        if let Some(&edge) = self.namespace_locals.get(ident.name.as_str()) {
            // Bare reference in an unrecognized context.
            self.accesses.entry(edge).or_default().whole = true;
        }
    }
}

/// Matches `import.meta.url`.
fn is_import_meta_url(expr: &Expression<'_>) -> bool {
    let Expression::StaticMemberExpression(member) = expr else {
        return false;
    };
    if member.property.name != "url" {
        return false;
    }
    matches!(&member.object, Expression::MetaProperty(meta)
        if meta.meta.name == "import" && meta.property.name == "meta")
}

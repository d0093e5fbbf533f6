//! Class and enum member extraction.
//!
//! Members of exported classes and enums become sub-symbol export records
//! (`Class.member`, `Enum.Member`) so the classifier can report unused
//! members when member-level analysis is enabled.

use super::{ExportKind, ExportRecord, FileSummary, MemberKind, Visibility};
use crate::graph::position_at;
use crate::parser::jsdoc::ExportTags;
use oxc_ast::ast::{
    Class, ClassElement, MethodDefinitionKind, PropertyKey, TSAccessibility, TSEnumDeclaration,
    TSEnumMemberName,
};

pub(super) fn collect_class_members(
    class: &Class<'_>,
    class_name: &str,
    source: &str,
    summary: &mut FileSummary,
) {
    for element in &class.body.body {
        match element {
            ClassElement::MethodDefinition(method) => {
                // Constructors are invoked through the class itself.
                if method.kind == MethodDefinitionKind::Constructor {
                    continue;
                }
                let Some(name) = property_key_name(&method.key) else {
                    continue;
                };
                let member = match method.kind {
                    MethodDefinitionKind::Get => MemberKind::Getter,
                    MethodDefinitionKind::Set => MemberKind::Setter,
                    _ => MemberKind::Method,
                };
                summary.exports.push(ExportRecord {
                    name: format!("{class_name}.{name}"),
                    kind: ExportKind::ClassMember {
                        class_name: class_name.to_string(),
                        member,
                        visibility: visibility_of(&method.key, method.accessibility),
                        is_static: method.r#static,
                    },
                    span_start: method.span.start,
                    position: position_at(source, method.span.start),
                    tags: ExportTags::default(),
                    used_in_file: false,
                });
            }
            ClassElement::PropertyDefinition(prop) => {
                let Some(name) = property_key_name(&prop.key) else {
                    continue;
                };
                summary.exports.push(ExportRecord {
                    name: format!("{class_name}.{name}"),
                    kind: ExportKind::ClassMember {
                        class_name: class_name.to_string(),
                        member: MemberKind::Property,
                        visibility: visibility_of(&prop.key, prop.accessibility),
                        is_static: prop.r#static,
                    },
                    span_start: prop.span.start,
                    position: position_at(source, prop.span.start),
                    tags: ExportTags::default(),
                    used_in_file: false,
                });
            }
            ClassElement::AccessorProperty(accessor) => {
                let Some(name) = property_key_name(&accessor.key) else {
                    continue;
                };
                summary.exports.push(ExportRecord {
                    name: format!("{class_name}.{name}"),
                    kind: ExportKind::ClassMember {
                        class_name: class_name.to_string(),
                        member: MemberKind::Property,
                        visibility: visibility_of(&accessor.key, None),
                        is_static: accessor.r#static,
                    },
                    span_start: accessor.span.start,
                    position: position_at(source, accessor.span.start),
                    tags: ExportTags::default(),
                    used_in_file: false,
                });
            }
            _ => {}
        }
    }
}

pub(super) fn collect_enum_members(
    enum_decl: &TSEnumDeclaration<'_>,
    enum_name: &str,
    source: &str,
    summary: &mut FileSummary,
) {
    for member in &enum_decl.body.members {
        let name = match &member.id {
            TSEnumMemberName::Identifier(ident) => ident.name.to_string(),
            TSEnumMemberName::String(lit) => lit.value.to_string(),
            _ => continue,
        };

        summary.exports.push(ExportRecord {
            name: format!("{enum_name}.{name}"),
            kind: ExportKind::EnumMember {
                enum_name: enum_name.to_string(),
            },
            span_start: member.span.start,
            position: position_at(source, member.span.start),
            tags: ExportTags::default(),
            used_in_file: false,
        });
    }
}

/// JavaScript `#private` fields and TypeScript accessibility modifiers.
fn visibility_of(key: &PropertyKey<'_>, accessibility: Option<TSAccessibility>) -> Visibility {
    if matches!(key, PropertyKey::PrivateIdentifier(_)) {
        return Visibility::Private;
    }
    match accessibility {
        Some(TSAccessibility::Private) => Visibility::Private,
        Some(TSAccessibility::Protected) => Visibility::Protected,
        Some(TSAccessibility::Public) | None => Visibility::Public,
    }
}

fn property_key_name(key: &PropertyKey<'_>) -> Option<String> {
    match key {
        PropertyKey::StaticIdentifier(ident) => Some(ident.name.to_string()),
        PropertyKey::PrivateIdentifier(ident) => Some(format!("#{}", ident.name)),
        PropertyKey::StringLiteral(lit) => Some(lit.value.to_string()),
        PropertyKey::NumericLiteral(lit) => Some(lit.value.to_string()),
        // Computed keys cannot be matched by name.
        _ => None,
    }
}

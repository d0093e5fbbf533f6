//! Source parser facade.
//!
//! Wraps the oxc toolchain: pick a source type from the file extension,
//! run registered compilers for non-standard extensions, and parse into an
//! arena. Parse errors never propagate; callers get the error strings and
//! admit the file with no imports or exports.
//!
//! The program borrows from the caller's [`Allocator`], so semantic
//! analysis and extraction happen in the same scope that owns the arena.

pub mod compilers;
pub mod jsdoc;

pub use compilers::{Compiler, CompilerRegistry};

use oxc_allocator::Allocator;
use oxc_parser::{Parser, ParserReturn};
use oxc_span::SourceType as OxcSourceType;
use std::path::Path;

/// Source flavor derived from a file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Plain JavaScript (.js, .mjs, .cjs).
    JavaScript,
    /// TypeScript (.ts, .mts, .cts).
    TypeScript,
    /// JavaScript with JSX (.jsx).
    Jsx,
    /// TypeScript with JSX (.tsx).
    Tsx,
    /// Not parseable by the analyzer.
    Unknown,
}

impl SourceKind {
    /// Derive the kind from a file path.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("js" | "mjs" | "cjs") => Self::JavaScript,
            Some("ts" | "mts" | "cts") => Self::TypeScript,
            Some("jsx") => Self::Jsx,
            Some("tsx") => Self::Tsx,
            _ => Self::Unknown,
        }
    }

    /// Whether files of this kind go through the parser.
    pub fn is_parseable(&self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

/// Convert to oxc's source type.
fn oxc_source_type(kind: SourceKind, path: &Path) -> OxcSourceType {
    match kind {
        SourceKind::JavaScript => {
            OxcSourceType::from_path(path).unwrap_or_else(|_| OxcSourceType::mjs())
        }
        SourceKind::TypeScript => OxcSourceType::ts(),
        SourceKind::Jsx => OxcSourceType::jsx(),
        SourceKind::Tsx => OxcSourceType::tsx(),
        SourceKind::Unknown => OxcSourceType::mjs(),
    }
}

/// Parse a source file into the given arena.
///
/// Returns `Err` with the parser's error messages when the file has syntax
/// errors; the caller records them as diagnostics and admits the file
/// empty rather than failing the run.
pub fn parse_program<'a>(
    allocator: &'a Allocator,
    source: &'a str,
    path: &Path,
    kind: SourceKind,
) -> Result<ParserReturn<'a>, Vec<String>> {
    let source_type = oxc_source_type(kind, path);
    let ret = Parser::new(allocator, source, source_type).parse();

    if !ret.errors.is_empty() {
        return Err(ret.errors.iter().map(|e| e.to_string()).collect());
    }

    Ok(ret)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_from_extension() {
        assert_eq!(SourceKind::from_path(Path::new("a.ts")), SourceKind::TypeScript);
        assert_eq!(SourceKind::from_path(Path::new("a.tsx")), SourceKind::Tsx);
        assert_eq!(SourceKind::from_path(Path::new("a.mjs")), SourceKind::JavaScript);
        assert_eq!(SourceKind::from_path(Path::new("a.css")), SourceKind::Unknown);
        assert!(!SourceKind::from_path(Path::new("a.css")).is_parseable());
    }

    #[test]
    fn parse_reports_syntax_errors() {
        let allocator = Allocator::default();
        let source = "const x = {{{ nope";
        let result = parse_program(
            &allocator,
            source,
            Path::new("broken.js"),
            SourceKind::JavaScript,
        );
        assert!(result.is_err());
        match result {
            Err(errors) => assert!(!errors.is_empty()),
            Ok(_) => unreachable!(),
        }
    }

    #[test]
    fn parse_accepts_typescript() {
        let allocator = Allocator::default();
        let source = "interface A { x: string }\nexport const a: A = { x: '1' };";
        let result = parse_program(&allocator, source, Path::new("a.ts"), SourceKind::TypeScript);
        assert!(result.is_ok());
    }
}

//! JSDoc tag extraction.
//!
//! The classifier only cares about a handful of tags (`@public`,
//! `@internal`, `@alias`, plus user-configured ones), so this is a
//! lightweight scan over comment text rather than a JSDoc grammar.

use oxc_ast::ast::Comment;

/// Tags found on one export's doc comment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportTags {
    /// `@public` — suppresses unused-export reporting.
    pub public: bool,
    /// `@internal`.
    pub internal: bool,
    /// `@alias` target, when present.
    pub alias: Option<String>,
    /// Every other tag name, without the `@`.
    pub other: Vec<String>,
}

impl ExportTags {
    /// Whether any tag was found.
    pub fn is_empty(&self) -> bool {
        !self.public && !self.internal && self.alias.is_none() && self.other.is_empty()
    }

    /// Whether one of the given tag names is present.
    pub fn has_any(&self, names: &[String]) -> bool {
        names.iter().any(|n| {
            (n == "public" && self.public)
                || (n == "internal" && self.internal)
                || self.other.iter().any(|o| o == n)
        })
    }
}

/// Parse the tags out of a raw JSDoc block body.
pub fn parse_tags(raw: &str) -> ExportTags {
    let mut tags = ExportTags::default();

    for line in raw.lines() {
        let line = line.trim().trim_start_matches('*').trim_start();
        let Some(rest) = line.strip_prefix('@') else {
            continue;
        };
        let (name, payload) = match rest.split_once(char::is_whitespace) {
            Some((name, payload)) => (name, payload.trim()),
            None => (rest, ""),
        };

        match name {
            "public" => tags.public = true,
            "internal" => tags.internal = true,
            "alias" => {
                if !payload.is_empty() {
                    tags.alias = Some(payload.split_whitespace().next().unwrap_or("").to_string());
                }
            }
            "" => {}
            other => tags.other.push(other.to_string()),
        }
    }

    tags
}

/// Find the JSDoc tags attached to a declaration starting at `decl_start`.
///
/// The attached comment is the nearest `/** ... */` block ending before
/// the declaration with only whitespace in between.
pub fn tags_for_declaration(source: &str, comments: &[Comment], decl_start: u32) -> ExportTags {
    let mut best: Option<&Comment> = None;

    for comment in comments {
        if comment.span.end > decl_start {
            continue;
        }
        let gap = &source[comment.span.end as usize..decl_start as usize];
        if !gap.trim().is_empty() {
            continue;
        }
        if best.is_none_or(|b| comment.span.end > b.span.end) {
            best = Some(comment);
        }
    }

    let Some(comment) = best else {
        return ExportTags::default();
    };

    let text = &source[comment.span.start as usize..comment.span.end as usize];
    // Only JSDoc blocks carry tags; strip delimiters if the span includes
    // them.
    let body = text
        .trim_start_matches("/**")
        .trim_start_matches("/*")
        .trim_end_matches("*/");
    if !text.contains('*') {
        return ExportTags::default();
    }

    parse_tags(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_tags() {
        let tags = parse_tags(
            "* Widget helper.\n* @public\n* @alias makeWidget\n* @deprecated use other\n",
        );
        assert!(tags.public);
        assert!(!tags.internal);
        assert_eq!(tags.alias.as_deref(), Some("makeWidget"));
        assert_eq!(tags.other, vec!["deprecated"]);
    }

    #[test]
    fn custom_tag_matching() {
        let tags = parse_tags("* @lintignore\n");
        assert!(tags.has_any(&["lintignore".to_string()]));
        assert!(!tags.has_any(&["other".to_string()]));
    }

    #[test]
    fn no_tags_in_plain_comment() {
        let tags = parse_tags("just an email@example.com mention\n");
        assert!(tags.is_empty());
    }
}

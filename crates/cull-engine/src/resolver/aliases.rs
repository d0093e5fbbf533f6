//! tsconfig-style path alias resolution.
//!
//! Alias patterns contain at most one `*`; the matched middle substitutes
//! into each target in order. Targets resolve relative to the referring
//! file's workspace directory.

use cull_core::{Error, Result};
use std::collections::BTreeMap;

/// One compiled alias pattern.
#[derive(Debug, Clone)]
pub struct CompiledAlias {
    prefix: String,
    suffix: Option<String>,
    targets: Vec<String>,
}

impl CompiledAlias {
    /// Substituted targets when the specifier matches, in declaration
    /// order.
    pub fn expand(&self, specifier: &str) -> Option<Vec<String>> {
        match &self.suffix {
            None => {
                if specifier == self.prefix {
                    Some(self.targets.clone())
                } else {
                    None
                }
            }
            Some(suffix) => {
                let rest = specifier.strip_prefix(&self.prefix)?;
                let middle = rest.strip_suffix(suffix.as_str())?;
                Some(
                    self.targets
                        .iter()
                        .map(|t| t.replacen('*', middle, 1))
                        .collect(),
                )
            }
        }
    }
}

/// Compile an alias map, longest prefix first so the most specific
/// pattern wins.
pub fn compile_aliases(paths: &BTreeMap<String, Vec<String>>) -> Result<Vec<CompiledAlias>> {
    let mut aliases = Vec::new();

    for (pattern, targets) in paths {
        if pattern.matches('*').count() > 1 {
            return Err(Error::Pattern(format!(
                "path alias '{pattern}' has more than one '*'"
            )));
        }
        for target in targets {
            if target.matches('*').count() > 1 {
                return Err(Error::Pattern(format!(
                    "path alias target '{target}' has more than one '*'"
                )));
            }
        }

        let (prefix, suffix) = match pattern.split_once('*') {
            Some((prefix, suffix)) => (prefix.to_string(), Some(suffix.to_string())),
            None => (pattern.clone(), None),
        };

        aliases.push(CompiledAlias {
            prefix,
            suffix,
            targets: targets.clone(),
        });
    }

    aliases.sort_by(|a, b| b.prefix.len().cmp(&a.prefix.len()));
    Ok(aliases)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(pairs: &[(&str, &[&str])]) -> Vec<CompiledAlias> {
        let map: BTreeMap<String, Vec<String>> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.iter().map(|s| s.to_string()).collect()))
            .collect();
        compile_aliases(&map).unwrap()
    }

    #[test]
    fn wildcard_substitution() {
        let aliases = compile(&[("@app/*", &["src/*"])]);
        assert_eq!(
            aliases[0].expand("@app/components/button"),
            Some(vec!["src/components/button".to_string()])
        );
        assert_eq!(aliases[0].expand("@other/x"), None);
    }

    #[test]
    fn exact_alias() {
        let aliases = compile(&[("#config", &["src/config.ts"])]);
        assert_eq!(
            aliases[0].expand("#config"),
            Some(vec!["src/config.ts".to_string()])
        );
        assert_eq!(aliases[0].expand("#config/extra"), None);
    }

    #[test]
    fn longest_prefix_first() {
        let aliases = compile(&[("@app/*", &["src/*"]), ("@app/test/*", &["test/*"])]);
        assert_eq!(aliases[0].prefix, "@app/test/");
    }

    #[test]
    fn double_star_rejected() {
        let map = BTreeMap::from([("@a/*/b/*".to_string(), vec!["src/*".to_string()])]);
        assert!(compile_aliases(&map).is_err());
    }
}

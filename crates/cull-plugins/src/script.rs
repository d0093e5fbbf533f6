//! Shell script parsing.
//!
//! npm `scripts` values are small shell command lines. This parser splits
//! them into individual invocations, peels off environment assignments and
//! runner prefixes, and pulls out the binary plus any source files the
//! command references. It intentionally covers the subset of shell that
//! appears in manifests, not the full grammar.

/// One command extracted from a script line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptInvocation {
    /// The binary being run.
    pub binary: String,
    /// Arguments after the binary.
    pub argv: Vec<String>,
    /// Arguments that look like source files.
    pub referenced_files: Vec<String>,
}

/// Extensions that mark an argument as a referenced source file.
const SOURCE_EXTENSIONS: &[&str] = &[
    ".js", ".jsx", ".ts", ".tsx", ".mjs", ".cjs", ".mts", ".cts",
];

/// Runner binaries whose first file argument is the real entry.
const RUNNERS: &[&str] = &["node", "tsx", "ts-node", "bun", "deno"];

/// Extract the invocations from a shell command line.
///
/// Splits on `&&`, `||`, `;` and `|` outside quotes; each segment yields
/// at most one invocation.
pub fn extract_from_shell(command: &str) -> Vec<ScriptInvocation> {
    split_segments(command)
        .into_iter()
        .filter_map(|segment| parse_segment(&segment))
        .collect()
}

/// Split a command line on top-level shell operators.
fn split_segments(command: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = command.chars().peekable();
    let mut quote: Option<char> = None;

    while let Some(c) = chars.next() {
        match quote {
            Some(q) => {
                current.push(c);
                if c == q {
                    quote = None;
                }
            }
            None => match c {
                '\'' | '"' => {
                    quote = Some(c);
                    current.push(c);
                }
                '&' | '|' if chars.peek() == Some(&c) => {
                    chars.next();
                    segments.push(std::mem::take(&mut current));
                }
                '|' | ';' => {
                    segments.push(std::mem::take(&mut current));
                }
                _ => current.push(c),
            },
        }
    }
    segments.push(current);

    segments
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Tokenize one segment, respecting quotes.
fn tokenize(segment: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for c in segment.chars() {
        match quote {
            Some(q) => {
                if c == q {
                    quote = None;
                } else {
                    current.push(c);
                }
            }
            None => match c {
                '\'' | '"' => quote = Some(c),
                c if c.is_whitespace() => {
                    if !current.is_empty() {
                        tokens.push(std::mem::take(&mut current));
                    }
                }
                _ => current.push(c),
            },
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Whether a token is a `VAR=value` environment assignment.
fn is_env_assignment(token: &str) -> bool {
    match token.split_once('=') {
        Some((name, _)) => {
            !name.is_empty()
                && name
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    }
}

/// Whether an argument references a source file.
fn is_source_file(token: &str) -> bool {
    !token.starts_with('-') && SOURCE_EXTENSIONS.iter().any(|ext| token.ends_with(ext))
}

fn parse_segment(segment: &str) -> Option<ScriptInvocation> {
    let mut tokens = tokenize(segment).into_iter().peekable();

    // Strip leading VAR=x assignments and cross-env wrappers.
    let binary = loop {
        let token = tokens.next()?;
        if is_env_assignment(&token) {
            continue;
        }
        if token == "cross-env" || token == "dotenv" {
            // cross-env consumes its own assignments; dotenv takes `--`.
            continue;
        }
        if token == "--" {
            continue;
        }

        // Unwrap runner prefixes down to the real binary.
        match token.as_str() {
            "npx" | "bunx" => {
                // Skip npx flags (-y, --yes, --no-install, -p pkg).
                let mut next = tokens.next()?;
                while next.starts_with('-') {
                    if next == "-p" || next == "--package" {
                        tokens.next()?;
                    }
                    next = tokens.next()?;
                }
                break next;
            }
            "npm" | "pnpm" | "yarn" => {
                // `npm run x` / `pnpm exec bin` / `yarn bin`.
                let sub = tokens.next()?;
                match sub.as_str() {
                    "exec" | "dlx" => break tokens.next()?,
                    // Script invocations resolve within the same manifest,
                    // nothing external to report.
                    "run" | "run-script" => return None,
                    _ => return None,
                }
            }
            _ => break token,
        }
    };

    let argv: Vec<String> = tokens.collect();
    let mut referenced_files: Vec<String> = argv
        .iter()
        .filter(|t| is_source_file(t))
        .cloned()
        .collect();

    // A runner's binary itself references nothing; its file argument does.
    if RUNNERS.contains(&binary.as_str()) && referenced_files.is_empty() {
        if let Some(file) = argv.iter().find(|t| !t.starts_with('-')) {
            referenced_files.push(file.clone());
        }
    }

    Some(ScriptInvocation {
        binary,
        argv,
        referenced_files,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_binary() {
        let invocations = extract_from_shell("vitest run --coverage");
        assert_eq!(invocations.len(), 1);
        assert_eq!(invocations[0].binary, "vitest");
        assert_eq!(invocations[0].argv, vec!["run", "--coverage"]);
    }

    #[test]
    fn splits_on_operators() {
        let invocations = extract_from_shell("tsc --noEmit && eslint . || echo failed");
        let binaries: Vec<&str> = invocations.iter().map(|i| i.binary.as_str()).collect();
        assert_eq!(binaries, vec!["tsc", "eslint", "echo"]);
    }

    #[test]
    fn strips_env_assignments() {
        let invocations = extract_from_shell("NODE_ENV=production API_URL=x node server.mjs");
        assert_eq!(invocations[0].binary, "node");
        assert_eq!(invocations[0].referenced_files, vec!["server.mjs"]);
    }

    #[test]
    fn unwraps_npx() {
        let invocations = extract_from_shell("npx -y playwright test");
        assert_eq!(invocations[0].binary, "playwright");
    }

    #[test]
    fn pnpm_exec_unwrapped_and_run_skipped() {
        let invocations = extract_from_shell("pnpm exec tsup && pnpm run build");
        assert_eq!(invocations.len(), 1);
        assert_eq!(invocations[0].binary, "tsup");
    }

    #[test]
    fn collects_source_file_arguments() {
        let invocations = extract_from_shell("vitest run src/app.test.ts --silent");
        assert_eq!(invocations[0].referenced_files, vec!["src/app.test.ts"]);
    }

    #[test]
    fn quoted_operator_not_a_splitter() {
        let invocations = extract_from_shell(r#"echo "a && b""#);
        assert_eq!(invocations.len(), 1);
        assert_eq!(invocations[0].argv, vec!["a && b"]);
    }

    #[test]
    fn cross_env_wrapper() {
        let invocations = extract_from_shell("cross-env NODE_ENV=test jest --ci");
        assert_eq!(invocations[0].binary, "jest");
    }
}

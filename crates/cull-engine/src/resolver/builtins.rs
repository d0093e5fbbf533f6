//! Node.js built-in module list.

/// Built-in module names, without the `node:` prefix.
pub const NODE_BUILTINS: &[&str] = &[
    "assert",
    "async_hooks",
    "buffer",
    "child_process",
    "cluster",
    "console",
    "constants",
    "crypto",
    "dgram",
    "diagnostics_channel",
    "dns",
    "domain",
    "events",
    "fs",
    "http",
    "http2",
    "https",
    "inspector",
    "module",
    "net",
    "os",
    "path",
    "perf_hooks",
    "process",
    "punycode",
    "querystring",
    "readline",
    "repl",
    "stream",
    "string_decoder",
    "sys",
    "timers",
    "tls",
    "trace_events",
    "tty",
    "url",
    "util",
    "v8",
    "vm",
    "wasi",
    "worker_threads",
    "zlib",
];

/// Whether a specifier names a Node built-in (`fs`, `node:fs`,
/// `fs/promises`).
pub fn is_builtin(specifier: &str) -> bool {
    if let Some(rest) = specifier.strip_prefix("node:") {
        // The `node:` scheme is reserved for builtins, known or not.
        return !rest.is_empty();
    }
    let head = specifier.split('/').next().unwrap_or(specifier);
    NODE_BUILTINS.binary_search(&head).is_ok()
}

/// The builtin's canonical name (strips the `node:` prefix).
pub fn builtin_name(specifier: &str) -> &str {
    specifier.strip_prefix("node:").unwrap_or(specifier)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_is_sorted_for_binary_search() {
        let mut sorted = NODE_BUILTINS.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, NODE_BUILTINS);
    }

    #[test]
    fn recognizes_builtin_forms() {
        assert!(is_builtin("fs"));
        assert!(is_builtin("fs/promises"));
        assert!(is_builtin("node:fs"));
        assert!(is_builtin("node:test"));
        assert!(!is_builtin("lodash"));
        assert!(!is_builtin("fsevents"));
    }
}

//! Compiler registry for non-standard extensions.
//!
//! `.vue`, `.svelte`, `.astro` and friends are opaque preprocessors from
//! the analyzer's point of view: a registered compiler turns them into
//! plain script before parsing. The analyzer ships no compilers itself;
//! hosts register them per extension.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// Turns a non-standard source file into plain JS/TS.
pub trait Compiler: Send + Sync {
    /// Compile `source` into plain script.
    ///
    /// # Errors
    ///
    /// Returns a message describing the failure; the file is then admitted
    /// empty with a diagnostic, like a parse error.
    fn compile(&self, path: &Path, source: &str) -> Result<String, String>;
}

/// Registry of compilers keyed by file extension (without the dot).
#[derive(Default)]
pub struct CompilerRegistry {
    by_extension: BTreeMap<String, Box<dyn Compiler>>,
}

impl CompilerRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a compiler for an extension (e.g. `"vue"`).
    pub fn register(&mut self, extension: impl Into<String>, compiler: Box<dyn Compiler>) {
        self.by_extension.insert(extension.into(), compiler);
    }

    /// The compiler for a path's extension, if one is registered.
    pub fn for_path(&self, path: &Path) -> Option<&dyn Compiler> {
        let ext = path.extension()?.to_str()?;
        self.by_extension.get(ext).map(|b| b.as_ref())
    }

    /// Extensions with a registered compiler.
    pub fn extensions(&self) -> impl Iterator<Item = &str> {
        self.by_extension.keys().map(|s| s.as_str())
    }
}

impl fmt::Debug for CompilerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompilerRegistry")
            .field("extensions", &self.by_extension.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ScriptTagCompiler;

    impl Compiler for ScriptTagCompiler {
        fn compile(&self, _path: &Path, source: &str) -> Result<String, String> {
            let start = source.find("<script>").ok_or("no script tag")? + "<script>".len();
            let end = source.find("</script>").ok_or("unterminated script tag")?;
            Ok(source[start..end].to_string())
        }
    }

    #[test]
    fn registry_dispatches_by_extension() {
        let mut registry = CompilerRegistry::new();
        registry.register("vue", Box::new(ScriptTagCompiler));

        assert!(registry.for_path(Path::new("App.vue")).is_some());
        assert!(registry.for_path(Path::new("app.ts")).is_none());

        let compiled = registry
            .for_path(Path::new("App.vue"))
            .unwrap()
            .compile(Path::new("App.vue"), "<template/><script>import 'x';</script>")
            .unwrap();
        assert_eq!(compiled, "import 'x';");
    }

    #[test]
    fn compile_failure_is_a_message() {
        let mut registry = CompilerRegistry::new();
        registry.register("vue", Box::new(ScriptTagCompiler));

        let err = registry
            .for_path(Path::new("App.vue"))
            .unwrap()
            .compile(Path::new("App.vue"), "<template/>")
            .unwrap_err();
        assert!(err.contains("script"));
    }
}

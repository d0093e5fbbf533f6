//! Built-in plugin definitions embedded in the binary.
//!
//! The default adapters for common JavaScript tooling, embedded at compile
//! time via `include_str!()` for zero-config detection.

use crate::definition::CompiledPlugin;
use crate::Result;

/// ESLint linter.
pub const ESLINT: &str = include_str!("built_in/eslint.toml");
/// Prettier formatter.
pub const PRETTIER: &str = include_str!("built_in/prettier.toml");
/// Vitest test runner.
pub const VITEST: &str = include_str!("built_in/vitest.toml");
/// Jest test runner.
pub const JEST: &str = include_str!("built_in/jest.toml");
/// TypeScript compiler.
pub const TYPESCRIPT: &str = include_str!("built_in/typescript.toml");
/// Next.js framework.
pub const NEXT: &str = include_str!("built_in/next.toml");
/// Vite bundler.
pub const VITE: &str = include_str!("built_in/vite.toml");
/// Storybook component workshop.
pub const STORYBOOK: &str = include_str!("built_in/storybook.toml");
/// Expo app framework.
pub const EXPO: &str = include_str!("built_in/expo.toml");
/// Playwright end-to-end tests.
pub const PLAYWRIGHT: &str = include_str!("built_in/playwright.toml");
/// Cypress end-to-end tests.
pub const CYPRESS: &str = include_str!("built_in/cypress.toml");
/// Husky git hooks.
pub const HUSKY: &str = include_str!("built_in/husky.toml");

/// All built-in definitions, in registration order.
pub fn built_in_sources() -> &'static [&'static str] {
    &[
        ESLINT, PRETTIER, VITEST, JEST, TYPESCRIPT, NEXT, VITE, STORYBOOK, EXPO, PLAYWRIGHT,
        CYPRESS, HUSKY,
    ]
}

/// Compile the built-in plugin set.
pub fn load_built_in_plugins() -> Result<Vec<CompiledPlugin>> {
    built_in_sources()
        .iter()
        .map(|source| CompiledPlugin::from_toml_str(source))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_built_ins_compile() {
        let plugins = load_built_in_plugins().expect("built-in plugin failed to compile");
        assert_eq!(plugins.len(), built_in_sources().len());

        let names: Vec<&str> = plugins.iter().map(|p| p.name()).collect();
        assert!(names.contains(&"eslint"));
        assert!(names.contains(&"expo"));
        assert!(names.contains(&"vitest"));
    }

    #[test]
    fn names_are_unique() {
        let plugins = load_built_in_plugins().unwrap();
        let mut names: Vec<&str> = plugins.iter().map(|p| p.name()).collect();
        names.sort_unstable();
        let before = names.len();
        names.dedup();
        assert_eq!(before, names.len());
    }

    #[test]
    fn expo_attributes_expo_router() {
        let plugins = load_built_in_plugins().unwrap();
        let expo = plugins.iter().find(|p| p.name() == "expo").unwrap();
        assert!(expo
            .definition
            .attributes
            .iter()
            .any(|a| a.package == "expo-router"));
    }
}

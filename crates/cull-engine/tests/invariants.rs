//! Cross-cutting properties: determinism, idempotence, monotonicity, and
//! closure soundness.

use cull_core::{AnalyzerOptions, IssueKind, Report};
use cull_engine::Analyzer;
use cull_fs::NativeFileSystem;
use std::path::Path;
use tempfile::TempDir;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

async fn analyze(root: &Path, options: AnalyzerOptions) -> Report {
    let fs = NativeFileSystem::new(root).unwrap();
    let analyzer = Analyzer::new(options).unwrap();
    analyzer.analyze(&fs).await.unwrap()
}

fn fixture(temp: &TempDir) {
    write(
        temp.path(),
        "package.json",
        r#"{
            "name": "root",
            "dependencies": { "a": "^1.0.0" },
            "devDependencies": { "b": "^2.0.0" }
        }"#,
    );
    write(
        temp.path(),
        "src/index.ts",
        "import { helper } from './helper';\nimport 'a';\nexport const main = helper();\n",
    );
    write(
        temp.path(),
        "src/helper.ts",
        "import './transitive';\nexport function helper() { return 1; }\n",
    );
    write(temp.path(), "src/transitive.ts", "export {};\n");
    write(temp.path(), "src/orphan.ts", "export const lonely = 1;\n");
    write(
        temp.path(),
        "node_modules/a/package.json",
        r#"{ "name": "a" }"#,
    );
}

#[tokio::test]
async fn identical_inputs_produce_byte_identical_reports() {
    let temp = TempDir::new().unwrap();
    fixture(&temp);

    let options = AnalyzerOptions {
        entry: vec!["src/index.ts".into()],
        ..Default::default()
    };

    let first = analyze(temp.path(), options.clone()).await;
    let second = analyze(temp.path(), options).await;

    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[tokio::test]
async fn every_resolvable_static_import_is_reachable() {
    let temp = TempDir::new().unwrap();
    fixture(&temp);

    let options = AnalyzerOptions {
        entry: vec!["src/index.ts".into()],
        ..Default::default()
    };
    let report = analyze(temp.path(), options).await;

    // The import chain index -> helper -> transitive is fully reachable;
    // only the orphan is unused.
    let unused: Vec<&Path> = report
        .issues_of_kind(IssueKind::UnusedFile)
        .filter_map(|i| i.file.as_deref())
        .collect();
    assert_eq!(unused.len(), 1);
    assert!(unused[0].ends_with("src/orphan.ts"));
}

#[tokio::test]
async fn adding_entries_never_increases_unused_counts() {
    let temp = TempDir::new().unwrap();
    fixture(&temp);

    let narrow = analyze(
        temp.path(),
        AnalyzerOptions {
            entry: vec!["src/index.ts".into()],
            ..Default::default()
        },
    )
    .await;

    let wide = analyze(
        temp.path(),
        AnalyzerOptions {
            entry: vec!["src/index.ts".into(), "src/orphan.ts".into()],
            ..Default::default()
        },
    )
    .await;

    assert!(wide.summary.unused_files <= narrow.summary.unused_files);
    assert!(wide.summary.unused_dependencies <= narrow.summary.unused_dependencies);
}

#[tokio::test]
async fn removing_a_reported_unused_file_is_safe() {
    let temp = TempDir::new().unwrap();
    fixture(&temp);

    let options = AnalyzerOptions {
        entry: vec!["src/index.ts".into()],
        ..Default::default()
    };

    let before = analyze(temp.path(), options.clone()).await;
    let unused: Vec<std::path::PathBuf> = before
        .issues_of_kind(IssueKind::UnusedFile)
        .filter_map(|i| i.file.clone())
        .collect();
    assert!(!unused.is_empty());

    for file in &unused {
        std::fs::remove_file(file).unwrap();
    }

    let after = analyze(temp.path(), options).await;

    // An unused file had no incoming edges, so deleting it cannot create
    // new resolution misses.
    assert_eq!(after.summary.unused_files, 0);
    assert_eq!(
        after.summary.unlisted_dependencies,
        before.summary.unlisted_dependencies
    );
    assert!(after
        .diagnostics
        .iter()
        .all(|d| d.kind != cull_core::DiagnosticKind::UnresolvedImport));
}

#[tokio::test]
async fn declared_dependencies_partition_exactly() {
    let temp = TempDir::new().unwrap();
    fixture(&temp);

    let options = AnalyzerOptions {
        entry: vec!["src/index.ts".into()],
        ..Default::default()
    };
    let report = analyze(temp.path(), options).await;

    // `a` is imported, `b` is not; together they cover the declared set.
    let coverage = report.summary.dependency_coverage.clone().unwrap();
    assert_eq!(coverage.total_declared, 2);
    assert_eq!(coverage.total_used + coverage.total_unused, 2);

    let unused: Vec<&str> = report
        .issues_of_kind(IssueKind::UnusedDependency)
        .filter_map(|i| i.symbol.as_deref())
        .collect();
    assert_eq!(unused, vec!["b"]);
}

#[tokio::test]
async fn type_only_reachability_is_tracked_separately() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "package.json", r#"{ "name": "root" }"#);
    write(
        temp.path(),
        "index.ts",
        "import type { Shape } from './shapes';\nexport const x: Shape = { width: 1 };\n",
    );
    write(
        temp.path(),
        "shapes.ts",
        "export interface Shape { width: number }\n",
    );

    let options = AnalyzerOptions {
        entry: vec!["index.ts".into()],
        ..Default::default()
    };
    let report = analyze(temp.path(), options.clone()).await;

    // By default any channel keeps a file out of the unused report.
    assert_eq!(report.summary.unused_files, 0);
    assert_eq!(report.summary.unused_exports, 0);

    // In value mode a file reached only through type-only imports is
    // reported.
    let strict = analyze(
        temp.path(),
        AnalyzerOptions {
            value_mode: true,
            ..options
        },
    )
    .await;

    let unused: Vec<&Path> = strict
        .issues_of_kind(IssueKind::UnusedFile)
        .filter_map(|i| i.file.as_deref())
        .collect();
    assert_eq!(unused.len(), 1);
    assert!(unused[0].ends_with("shapes.ts"));
}

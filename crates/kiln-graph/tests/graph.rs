use std::fs;
use std::path::{Path, PathBuf};

use kiln_graph::{CycleDetector, CycleScope, GraphBuilder, GraphError, ImportKind, ModuleGraph};
use tempfile::TempDir;

struct Project {
    _dir: TempDir,
    root: PathBuf,
}

impl Project {
    fn new(files: &[(&str, &str)]) -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root = dir.path().canonicalize().expect("canonical root");
        for (path, content) in files {
            let full = root.join(path);
            fs::create_dir_all(full.parent().expect("parent")).expect("mkdir");
            fs::write(full, content).expect("write fixture");
        }
        Self { _dir: dir, root }
    }

    fn entries(&self, entries: &[(&str, &str)]) -> Vec<(String, PathBuf)> {
        entries
            .iter()
            .map(|(name, path)| (name.to_string(), self.root.join(path)))
            .collect()
    }

    fn graph(&self, entries: &[(&str, &str)]) -> ModuleGraph {
        GraphBuilder::new()
            .with_external_filter(|request| request.starts_with("@wordpress/"))
            .build(&self.entries(entries))
            .expect("graph builds")
    }
}

fn rel(ids: Vec<&kiln_graph::ModuleId>, root: &Path) -> Vec<String> {
    ids.into_iter().map(|id| id.relative_to(root)).collect()
}

#[test]
fn styles_follow_import_order() {
    let project = Project::new(&[
        (
            "src/js/main.js",
            "import './widget';\nimport '../scss/main.scss';\n",
        ),
        ("src/js/widget.js", "import '../scss/widget.scss';\n"),
        ("src/scss/widget.scss", ".widget { color: red; }"),
        ("src/scss/main.scss", "body { margin: 0; }"),
    ]);
    let graph = project.graph(&[("main", "src/js/main.js")]);

    assert_eq!(graph.len(), 4);
    assert_eq!(
        rel(graph.styles_for("main"), &project.root),
        ["src/scss/widget.scss", "src/scss/main.scss"]
    );
}

#[test]
fn externals_are_recorded_per_entry_and_not_followed() {
    let project = Project::new(&[
        (
            "src/js/main.js",
            "import { __ } from '@wordpress/i18n';\nimport './shared';\n",
        ),
        ("src/js/admin.js", "import './shared';\n"),
        ("src/js/shared.js", "import { addAction } from '@wordpress/hooks';\n"),
    ]);
    let graph = project.graph(&[("admin", "src/js/admin.js"), ("main", "src/js/main.js")]);

    let main: Vec<_> = graph.externals_for("main").into_iter().collect();
    assert_eq!(main, ["@wordpress/hooks", "@wordpress/i18n"]);
    let admin: Vec<_> = graph.externals_for("admin").into_iter().collect();
    assert_eq!(admin, ["@wordpress/hooks"]);

    // Externals never become modules
    assert_eq!(graph.len(), 3);
    let hooks = graph
        .externals()
        .find(|e| e.specifier == "@wordpress/hooks")
        .expect("hooks recorded");
    assert_eq!(hooks.importers.len(), 1);
}

#[test]
fn unresolved_import_names_importer() {
    let project = Project::new(&[("src/js/main.js", "import './missing';\n")]);
    let result = GraphBuilder::new().build(&project.entries(&[("main", "src/js/main.js")]));

    match result {
        Err(GraphError::Unresolved {
            specifier,
            importer,
            ..
        }) => {
            assert_eq!(specifier, "./missing");
            assert!(importer.ends_with("src/js/main.js"));
        }
        other => panic!("expected Unresolved, got {other:?}"),
    }
}

#[test]
fn missing_entry_is_rejected() {
    let project = Project::new(&[]);
    let result = GraphBuilder::new().build(&project.entries(&[("main", "src/js/main.js")]));
    assert!(matches!(result, Err(GraphError::Entry { .. })));
}

#[test]
fn detects_static_cycle() {
    let project = Project::new(&[
        ("src/js/main.js", "import './a';\n"),
        ("src/js/a.js", "import './b';\nexport const a = 1;\n"),
        ("src/js/b.js", "import { a } from './a';\nexport const b = a;\n"),
    ]);
    let graph = project.graph(&[("main", "src/js/main.js")]);

    let cycles = CycleDetector::new(CycleScope::everything(&project.root)).detect(&graph);
    assert_eq!(cycles.len(), 1);
    assert_eq!(
        cycles[0].format_chain(&project.root),
        "src/js/a.js -> src/js/b.js -> src/js/a.js"
    );
}

#[test]
fn async_edges_can_be_ignored() {
    let project = Project::new(&[
        ("src/js/main.js", "import './a';\n"),
        ("src/js/a.js", "export const load = () => import('./b');\n"),
        ("src/js/b.js", "import './a';\n"),
    ]);
    let graph = project.graph(&[("main", "src/js/main.js")]);

    let a = graph.entry("main").map(|id| graph.dependencies(id)).expect("entry");
    assert_eq!(a[0].1, ImportKind::Static);

    let strict = CycleDetector::new(CycleScope::everything(&project.root));
    assert_eq!(strict.detect(&graph).len(), 1);

    let relaxed = CycleDetector::new(CycleScope::everything(&project.root)).allow_async_cycles(true);
    assert!(relaxed.detect(&graph).is_empty());
}

#[test]
fn excluded_modules_do_not_report_cycles() {
    let project = Project::new(&[
        ("src/js/main.js", "import 'loopy';\n"),
        (
            "node_modules/loopy/package.json",
            r#"{ "name": "loopy", "main": "index.js" }"#,
        ),
        ("node_modules/loopy/index.js", "import './other';\n"),
        ("node_modules/loopy/other.js", "import './index';\n"),
    ]);
    let graph = project.graph(&[("main", "src/js/main.js")]);

    let scoped = CycleScope::new(&project.root, None, Some("node_modules")).expect("scope");
    assert!(CycleDetector::new(scoped).detect(&graph).is_empty());

    let everything = CycleScope::everything(&project.root);
    assert_eq!(CycleDetector::new(everything).detect(&graph).len(), 1);
}

#[test]
fn include_pattern_limits_reported_cycles() {
    let project = Project::new(&[
        ("src/js/main.js", "import './a';\nimport '../lib/x';\n"),
        ("src/js/a.js", "import './main';\n"),
        ("src/lib/x.js", "import './y';\n"),
        ("src/lib/y.js", "import './x';\n"),
    ]);
    let graph = project.graph(&[("main", "src/js/main.js")]);

    let scope = CycleScope::new(&project.root, Some("^src/lib/"), None).expect("scope");
    let cycles = CycleDetector::new(scope).detect(&graph);
    assert_eq!(cycles.len(), 1);
    assert_eq!(
        cycles[0].format_chain(&project.root),
        "src/lib/x.js -> src/lib/y.js -> src/lib/x.js"
    );
}

#[test]
fn invalid_scope_pattern_is_reported() {
    let result = CycleScope::new("/tmp", Some("("), None);
    assert!(matches!(result, Err(GraphError::InvalidPattern { .. })));
}

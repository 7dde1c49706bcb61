//! End-to-end builds against throwaway theme projects.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use kiln_bundler::{BuildState, Error, Pipeline};
use kiln_config::{KilnConfig, ManifestFormat, Mode};
use tempfile::TempDir;
use walkdir::WalkDir;

fn write(root: &Path, path: &str, contents: &str) {
    let path = root.join(path);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

/// A theme with one script, one stylesheet, one image and a WordPress import.
fn theme() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();

    write(
        root,
        "src/js/main.js",
        r#"import { __ } from '@wordpress/i18n';
import '../scss/main.scss';
import logo from '../images/logo.png';
import { greet } from './greet.js';

console.log(greet(__('Hello')), logo);
"#,
    );
    write(
        root,
        "src/js/greet.js",
        "export function greet(name) {\n  return `hi ${name}`;\n}\n",
    );
    write(
        root,
        "src/js/admin.js",
        "import { greet } from './greet.js';\nconsole.log(greet('admin'));\n",
    );
    write(
        root,
        "src/scss/main.scss",
        "$accent: red;\n.site-title { color: $accent; }\n",
    );
    fs::create_dir_all(root.join("src/images")).unwrap();
    fs::write(root.join("src/images/logo.png"), [0x89, b'P', b'N', b'G', 1, 2, 3]).unwrap();

    // Installed, but provided by the host at runtime
    write(
        root,
        "node_modules/@wordpress/i18n/package.json",
        r#"{ "name": "@wordpress/i18n", "main": "index.js" }"#,
    );
    write(
        root,
        "node_modules/@wordpress/i18n/index.js",
        "export function __(text) { return 'I18N_PACKAGE_BODY' + text; }\n",
    );

    dir
}

fn config(mode: Mode, entries: &[(&str, &str)]) -> KilnConfig {
    let mut config = KilnConfig::default();
    config.mode = mode;
    for (name, path) in entries {
        config.entry.insert(name.to_string(), path.into());
    }
    config
}

fn read_tree(dir: &Path) -> BTreeMap<String, Vec<u8>> {
    WalkDir::new(dir)
        .into_iter()
        .map(|e| e.unwrap())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let rel = e.path().strip_prefix(dir).unwrap().to_string_lossy().replace('\\', "/");
            (rel, fs::read(e.path()).unwrap())
        })
        .collect()
}

#[tokio::test]
async fn builds_scripts_styles_assets_and_manifest() {
    let dir = theme();
    let mut pipeline = Pipeline::new(
        dir.path(),
        config(
            Mode::Production,
            &[("main", "src/js/main.js"), ("admin", "src/js/admin.js")],
        ),
    );

    let report = pipeline.run().await.expect("build succeeds");
    assert_eq!(pipeline.state(), BuildState::Done);

    let paths: Vec<_> = report.artifacts.iter().map(|a| a.path.as_str()).collect();
    assert_eq!(
        paths,
        [
            "assets.php",
            "assets/logo.png",
            "css/main.css",
            "js/admin.js",
            "js/admin.js.map",
            "js/main.js",
            "js/main.js.map",
        ]
    );

    let build = dir.path().join("build");
    let css = fs::read_to_string(build.join("css/main.css")).unwrap();
    assert!(css.contains(".site-title{color:red}"), "{css}");

    let script = fs::read_to_string(build.join("js/main.js")).unwrap();
    assert!(script.contains("assets/logo.png"));
    assert!(script.ends_with("//# sourceMappingURL=main.js.map\n"));

    assert_eq!(
        fs::read(build.join("assets/logo.png")).unwrap(),
        [0x89, b'P', b'N', b'G', 1, 2, 3]
    );
}

#[tokio::test]
async fn missing_entry_fails_without_writing() {
    let dir = theme();
    let mut pipeline = Pipeline::new(
        dir.path(),
        config(
            Mode::Production,
            &[("main", "src/js/main.js"), ("gone", "src/js/gone.js")],
        ),
    );

    let err = pipeline.run().await.unwrap_err();
    assert!(matches!(err, Error::Configuration { .. }), "{err:?}");
    assert!(err.to_string().contains("gone"));
    assert_eq!(pipeline.state(), BuildState::Failed);
    assert!(!dir.path().join("build").exists());
}

#[tokio::test]
async fn distinct_entries_never_share_a_path() {
    let dir = theme();
    let report = Pipeline::new(
        dir.path(),
        config(
            Mode::Development,
            &[("main", "src/js/main.js"), ("admin", "src/js/admin.js")],
        ),
    )
    .run()
    .await
    .unwrap();

    let scripts: Vec<_> = report
        .artifacts
        .iter()
        .filter(|a| a.path.starts_with("js/") && a.path.ends_with(".js"))
        .map(|a| (a.entry.clone().unwrap(), a.path.clone()))
        .collect();
    assert_eq!(
        scripts,
        [
            ("admin".to_string(), "js/admin.js".to_string()),
            ("main".to_string(), "js/main.js".to_string()),
        ]
    );
}

#[tokio::test]
async fn template_without_name_is_a_configuration_error() {
    let dir = theme();
    let mut config = config(
        Mode::Production,
        &[("main", "src/js/main.js"), ("admin", "src/js/admin.js")],
    );
    config.output.script = "js/bundle.js".to_string();

    let err = Pipeline::new(dir.path(), config).run().await.unwrap_err();
    assert!(matches!(err, Error::Configuration { .. }), "{err:?}");
    assert!(!dir.path().join("build").exists());
}

#[tokio::test]
async fn static_cycle_fails_the_build() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "src/js/a.js", "import { b } from './b.js';\nexport const a = () => b;\n");
    write(dir.path(), "src/js/b.js", "import { a } from './a.js';\nexport const b = () => a;\n");

    let err = Pipeline::new(dir.path(), config(Mode::Production, &[("main", "src/js/a.js")]))
        .run()
        .await
        .unwrap_err();

    match err {
        Error::Cycle { cycles } => {
            assert_eq!(cycles, ["src/js/a.js -> src/js/b.js -> src/js/a.js"]);
        }
        other => panic!("expected cycle error, got {other:?}"),
    }
    assert!(!dir.path().join("build").exists());
}

#[tokio::test]
async fn async_cycle_is_allowed_when_configured() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "src/js/a.js",
        "export const a = 1;\nimport('./b.js').then((m) => console.log(m.b()));\n",
    );
    write(dir.path(), "src/js/b.js", "import { a } from './a.js';\nexport const b = () => a;\n");

    let strict = config(Mode::Production, &[("main", "src/js/a.js")]);
    let err = Pipeline::new(dir.path(), strict.clone()).run().await.unwrap_err();
    assert!(matches!(err, Error::Cycle { .. }), "{err:?}");

    let mut relaxed = strict;
    relaxed.plugins.circular.allow_async_cycles = true;
    Pipeline::new(dir.path(), relaxed)
        .run()
        .await
        .expect("async cycle is allowed");
    assert!(dir.path().join("build/js/main.js").exists());
}

#[tokio::test]
async fn non_fatal_cycle_becomes_a_warning() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "src/js/a.js", "import './b.js';\nexport const a = 1;\n");
    write(dir.path(), "src/js/b.js", "import './a.js';\nexport const b = 2;\n");

    let mut config = config(Mode::Development, &[("main", "src/js/a.js")]);
    config.plugins.circular.fail_on_error = false;

    let report = Pipeline::new(dir.path(), config).run().await.unwrap();
    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].contains("src/js/a.js -> src/js/b.js"));
}

#[tokio::test]
async fn production_removes_stale_outputs() {
    let dir = theme();
    let both = [("main", "src/js/main.js"), ("admin", "src/js/admin.js")];

    Pipeline::new(dir.path(), config(Mode::Production, &both))
        .run()
        .await
        .unwrap();
    assert!(dir.path().join("build/js/admin.js").exists());

    let report = Pipeline::new(
        dir.path(),
        config(Mode::Production, &[("main", "src/js/main.js")]),
    )
    .run()
    .await
    .unwrap();

    assert_eq!(report.removed, ["js/admin.js", "js/admin.js.map"]);
    assert!(!dir.path().join("build/js/admin.js").exists());
    assert!(dir.path().join("build/js/main.js").exists());
}

#[tokio::test]
async fn development_keeps_previous_outputs() {
    let dir = theme();
    let both = [("main", "src/js/main.js"), ("admin", "src/js/admin.js")];

    Pipeline::new(dir.path(), config(Mode::Development, &both))
        .run()
        .await
        .unwrap();
    let report = Pipeline::new(
        dir.path(),
        config(Mode::Development, &[("main", "src/js/main.js")]),
    )
    .run()
    .await
    .unwrap();

    assert!(report.removed.is_empty());
    assert!(dir.path().join("build/js/admin.js").exists());
}

#[tokio::test]
async fn used_external_is_listed_and_not_bundled() {
    let dir = theme();
    let mut config = config(
        Mode::Production,
        &[("main", "src/js/main.js"), ("admin", "src/js/admin.js")],
    );
    config.plugins.manifest.format = ManifestFormat::Json;
    config.plugins.manifest.combine_assets = false;

    Pipeline::new(dir.path(), config).run().await.unwrap();
    let build = dir.path().join("build");

    let script = fs::read_to_string(build.join("js/main.js")).unwrap();
    assert!(!script.contains("I18N_PACKAGE_BODY"));
    assert!(script.contains("wp.i18n"));

    let manifest: serde_json::Value =
        serde_json::from_slice(&fs::read(build.join("js/main.asset.json")).unwrap()).unwrap();
    assert_eq!(
        manifest["dependencies"],
        serde_json::json!(["wp-i18n", "wp-polyfill"])
    );
    assert_eq!(manifest["version"].as_str().unwrap().len(), 20);

    // admin.js uses no externals
    let admin: serde_json::Value =
        serde_json::from_slice(&fs::read(build.join("js/admin.asset.json")).unwrap()).unwrap();
    assert_eq!(admin["dependencies"], serde_json::json!(["wp-polyfill"]));
}

#[tokio::test]
async fn php_manifest_is_keyed_by_script() {
    let dir = theme();
    Pipeline::new(dir.path(), config(Mode::Production, &[("main", "src/js/main.js")]))
        .run()
        .await
        .unwrap();

    let php = fs::read_to_string(dir.path().join("build/assets.php")).unwrap();
    assert!(php.starts_with("<?php return array('js/main.js' => array('dependencies' => array('wp-i18n', 'wp-polyfill'), 'version' => '"));
    assert!(php.ends_with("'));"));
}

#[tokio::test]
async fn rebuilding_unchanged_input_is_byte_identical() {
    let dir = theme();
    let entries = [("main", "src/js/main.js"), ("admin", "src/js/admin.js")];

    Pipeline::new(dir.path(), config(Mode::Production, &entries))
        .run()
        .await
        .unwrap();
    let first = read_tree(&dir.path().join("build"));

    Pipeline::new(dir.path(), config(Mode::Production, &entries))
        .run()
        .await
        .unwrap();
    let second = read_tree(&dir.path().join("build"));

    assert!(!first.is_empty());
    assert_eq!(first, second);
}

#[tokio::test]
async fn transform_error_names_the_file() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "src/js/main.js", "import '../scss/broken.scss';\n");
    write(dir.path(), "src/scss/broken.scss", ".a { color: $missing; }\n");

    let err = Pipeline::new(dir.path(), config(Mode::Production, &[("main", "src/js/main.js")]))
        .run()
        .await
        .unwrap_err();

    match err {
        Error::Transform { file, .. } => assert!(file.ends_with("src/scss/broken.scss")),
        other => panic!("expected transform error, got {other:?}"),
    }
}

#[tokio::test]
async fn cycle_scope_cwd_is_normalized() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "src/js/a.js", "import { b } from './b.js';\nexport const a = () => b;\n");
    write(dir.path(), "src/js/b.js", "import { a } from './a.js';\nexport const b = () => a;\n");

    let mut config = config(Mode::Production, &[("main", "src/js/a.js")]);
    config.plugins.circular.cwd = Some("src/css/../js".into());
    config.plugins.circular.include = Some(r"^a\.js$".to_string());

    let err = Pipeline::new(dir.path(), config).run().await.unwrap_err();
    match err {
        Error::Cycle { cycles } => assert_eq!(cycles, ["a.js -> b.js -> a.js"]),
        other => panic!("expected cycle error, got {other:?}"),
    }
}

/// An entry importing `a/logo.png` and `b/logo.png`.
fn two_logos(a: &[u8], b: &[u8]) -> TempDir {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "src/js/main.js",
        "import a from '../a/logo.png';\nimport b from '../b/logo.png';\nconsole.log(a, b);\n",
    );
    fs::create_dir_all(dir.path().join("src/a")).unwrap();
    fs::create_dir_all(dir.path().join("src/b")).unwrap();
    fs::write(dir.path().join("src/a/logo.png"), a).unwrap();
    fs::write(dir.path().join("src/b/logo.png"), b).unwrap();
    dir
}

#[tokio::test]
async fn same_named_assets_with_different_bytes_collide() {
    let dir = two_logos(b"first", b"second");

    let mut pipeline = Pipeline::new(
        dir.path(),
        config(Mode::Production, &[("main", "src/js/main.js")]),
    );
    let err = pipeline.run().await.unwrap_err();

    assert!(matches!(err, Error::Configuration { .. }), "{err:?}");
    let message = err.to_string();
    assert!(message.contains("assets/logo.png"), "{message}");
    assert!(message.contains("a/logo.png") && message.contains("b/logo.png"), "{message}");
    assert_eq!(pipeline.state(), BuildState::Failed);
    assert!(!dir.path().join("build").exists());
}

#[tokio::test]
async fn same_named_assets_with_identical_bytes_share_one_file() {
    let dir = two_logos(b"same", b"same");

    let report = Pipeline::new(
        dir.path(),
        config(Mode::Production, &[("main", "src/js/main.js")]),
    )
    .run()
    .await
    .unwrap();

    let assets: Vec<_> = report
        .artifacts
        .iter()
        .filter(|a| a.path.starts_with("assets/"))
        .map(|a| a.path.as_str())
        .collect();
    assert_eq!(assets, ["assets/logo.png"]);
    assert_eq!(
        fs::read(dir.path().join("build/assets/logo.png")).unwrap(),
        b"same"
    );
}

#[test]
fn check_reports_graph_without_writing() {
    let dir = theme();
    let report = Pipeline::new(
        dir.path(),
        config(Mode::Production, &[("main", "src/js/main.js")]),
    )
    .check()
    .unwrap();

    assert_eq!(report.entries, ["main"]);
    assert_eq!(report.externals, ["@wordpress/i18n"]);
    assert!(report.modules >= 4);
    assert!(!dir.path().join("build").exists());
}

use std::fs;
use std::path::PathBuf;

use kiln_config::{ConfigDiscovery, ConfigError, ManifestFormat, Mode, TransformStep};
use tempfile::TempDir;

fn project(toml: &str) -> TempDir {
    let dir = TempDir::new().expect("tempdir");
    fs::write(dir.path().join("kiln.toml"), toml).expect("write kiln.toml");
    dir
}

#[test]
fn loads_toml_over_defaults() {
    let dir = project(
        r#"
[entry]
main = "src/js/main.js"

[output]
dir = "dist"

[plugins.manifest]
format = "json"
"#,
    );

    let config = ConfigDiscovery::new(dir.path())
        .load(Some(Mode::Production))
        .expect("config loads");

    assert_eq!(config.entry["main"], PathBuf::from("src/js/main.js"));
    assert_eq!(config.output.dir, PathBuf::from("dist"));
    // Untouched fields keep their defaults
    assert_eq!(config.output.style, "css/[name].css");
    assert_eq!(config.plugins.manifest.format, ManifestFormat::Json);
    assert!(config.plugins.manifest.inject_polyfill);
}

#[test]
fn explicit_rules_replace_default_rules() {
    let dir = project(
        r#"
[entry]
main = "src/main.js"

[[rules]]
test = '\.js$'
use = ["script"]
"#,
    );

    let config = ConfigDiscovery::new(dir.path()).load(None).expect("config loads");
    assert_eq!(config.rules.len(), 1);
    assert_eq!(config.rules[0].uses, vec![TransformStep::Script]);
}

#[test]
fn explicit_externals_extend_default_table() {
    let dir = project(
        r#"
[entry]
main = "src/main.js"

[externals]
"my-lib" = "MyLib"
"#,
    );

    let config = ConfigDiscovery::new(dir.path()).load(None).expect("config loads");
    assert_eq!(config.externals["my-lib"], "MyLib");
    assert_eq!(config.externals["@wordpress/hooks"], "wp.hooks");
}

#[test]
fn mode_argument_selects_overrides() {
    let dir = project(
        r#"
mode = "production"

[entry]
main = "src/main.js"

[modes.development.output]
sourcemap = false
"#,
    );

    let discovery = ConfigDiscovery::new(dir.path());

    let dev = discovery.load(Some(Mode::Development)).expect("dev config");
    assert_eq!(dev.mode, Mode::Development);
    assert!(!dev.output.sourcemap);

    let prod = discovery.load(None).expect("prod config");
    assert_eq!(prod.mode, Mode::Production);
    assert!(prod.output.sourcemap);
}

#[test]
fn loads_package_json_field() {
    let dir = TempDir::new().expect("tempdir");
    fs::write(
        dir.path().join("package.json"),
        r#"{
            "name": "theme",
            "kiln": { "entry": { "main": "src/js/main.js" } }
        }"#,
    )
    .expect("write package.json");

    let config = ConfigDiscovery::new(dir.path()).load(None).expect("config loads");
    assert_eq!(config.entry["main"], PathBuf::from("src/js/main.js"));
}

#[test]
fn invalid_toml_reports_invalid_value() {
    let dir = project("[entry\nmain = ");
    let result = ConfigDiscovery::new(dir.path()).load(None);
    assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
}

#[test]
fn unknown_keys_are_rejected() {
    let dir = project("[entry]\nmain = \"a.js\"\n\n[output]\nfilename = \"x.js\"\n");
    let result = ConfigDiscovery::new(dir.path()).load(None);
    assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
}

#[test]
fn load_file_uses_explicit_path() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("theme.toml");
    fs::write(&path, "[entry]\nadmin = \"src/admin.js\"\n").expect("write config");

    let config = ConfigDiscovery::new(dir.path())
        .load_file(&path, None)
        .expect("config loads");
    assert!(config.entry.contains_key("admin"));
}

use std::path::PathBuf;

use indexmap::IndexMap;

use crate::rules::{Rule, TransformStep};

// Helper defaults
pub(crate) fn default_true() -> bool {
    true
}

pub(crate) fn default_output_dir() -> PathBuf {
    PathBuf::from("build")
}

pub(crate) fn default_script_template() -> String {
    "js/[name].js".to_string()
}

pub(crate) fn default_style_template() -> String {
    "css/[name].css".to_string()
}

pub(crate) fn default_asset_template() -> String {
    "assets/[name][ext]".to_string()
}

pub(crate) fn default_script_target() -> String {
    "es2015".to_string()
}

pub(crate) fn default_browserslist() -> Vec<String> {
    vec!["defaults".to_string()]
}

pub(crate) fn default_circular_exclude() -> Option<String> {
    Some("node_modules".to_string())
}

pub(crate) fn default_manifest_filename() -> String {
    "assets".to_string()
}

pub(crate) fn default_rules() -> Vec<Rule> {
    vec![
        Rule {
            test: r"\.js$".to_string(),
            include: vec!["src/js".to_string()],
            exclude: Some("node_modules".to_string()),
            uses: vec![TransformStep::Script],
        },
        Rule {
            test: r"\.(s[ac]ss|css)$".to_string(),
            include: Vec::new(),
            exclude: Some("node_modules".to_string()),
            uses: vec![
                TransformStep::Sass,
                TransformStep::Postcss,
                TransformStep::Css,
                TransformStep::Extract,
            ],
        },
        Rule {
            test: r"\.(png|jpe?g|gif|svg|webp|woff2?|ttf|eot)$".to_string(),
            include: Vec::new(),
            exclude: None,
            uses: vec![TransformStep::Asset],
        },
    ]
}

pub(crate) fn default_externals() -> IndexMap<String, String> {
    [
        "a11y",
        "components",
        "blocks",
        "data",
        "date",
        "element",
        "hooks",
        "i18n",
        "utils",
    ]
    .iter()
    .map(|pkg| (format!("@wordpress/{pkg}"), format!("wp.{pkg}")))
    .collect()
}

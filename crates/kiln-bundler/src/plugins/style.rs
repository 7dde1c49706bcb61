use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use kiln_config::{CompiledRule, RuleKind, TransformStep};
use kiln_graph::{ModuleId, ModuleKind};
use lightningcss::printer::PrinterOptions;
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};
use rolldown_common::ModuleType;
use rolldown_plugin::{
    HookLoadArgs, HookLoadOutput, HookLoadReturn, HookUsage, Plugin, PluginContext,
};
use tracing::debug;

use super::{KilnPlugin, PluginPhase};
use crate::bundle::BundleContext;
use crate::{Error, Result};

/// Sass compilation plus lightningcss post-processing.
#[derive(Debug, Clone)]
pub struct StyleProcessor {
    targets: Targets,
    load_paths: Vec<PathBuf>,
}

impl StyleProcessor {
    /// # Errors
    ///
    /// `Error::Configuration` for browserslist queries lightningcss rejects.
    pub fn new(browsers: &[String], load_paths: Vec<PathBuf>) -> Result<Self> {
        let targets = match Browsers::from_browserslist(browsers.iter().map(String::as_str)) {
            Ok(Some(browsers)) => Targets::from(browsers),
            Ok(None) => Targets::default(),
            Err(e) => {
                return Err(Error::Configuration {
                    message: format!("invalid browserslist query {browsers:?}: {e}"),
                    hint: Some("See https://browsersl.ist for the query syntax".into()),
                });
            }
        };
        Ok(Self {
            targets,
            load_paths,
        })
    }

    /// Run the rule's steps up to extraction and return plain CSS.
    pub fn compile(&self, path: &Path, rule: &CompiledRule) -> std::result::Result<String, String> {
        let is_sass = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("scss" | "sass")
        );

        let css = if is_sass {
            if !rule.has_step(TransformStep::Sass) {
                return Err(format!(
                    "rule #{} has no `sass` step for a Sass source",
                    rule.index
                ));
            }
            let mut options = grass::Options::default();
            for load_path in &self.load_paths {
                options = options.load_path(load_path);
            }
            grass::from_path(path, &options).map_err(|e| e.to_string())?
        } else {
            fs::read_to_string(path).map_err(|e| e.to_string())?
        };

        if rule.has_step(TransformStep::Postcss) {
            self.print(path, &css, true, false)
        } else if rule.has_step(TransformStep::Css) {
            self.print(path, &css, false, false)
        } else {
            Ok(css)
        }
    }

    /// Minify an extracted stylesheet.
    pub fn minify(&self, filename: &str, css: &str) -> std::result::Result<String, String> {
        self.print(Path::new(filename), css, true, true)
    }

    fn print(
        &self,
        path: &Path,
        css: &str,
        apply_targets: bool,
        minify: bool,
    ) -> std::result::Result<String, String> {
        let targets = if apply_targets {
            self.targets
        } else {
            Targets::default()
        };

        let mut stylesheet = StyleSheet::parse(
            css,
            ParserOptions {
                filename: path.to_string_lossy().to_string(),
                ..Default::default()
            },
        )
        .map_err(|e| e.to_string())?;

        if apply_targets {
            stylesheet
                .minify(MinifyOptions {
                    targets,
                    ..Default::default()
                })
                .map_err(|e| e.to_string())?;
        }

        let printed = stylesheet
            .to_css(PrinterOptions {
                minify,
                targets,
                ..Default::default()
            })
            .map_err(|e| e.to_string())?;

        Ok(printed.code)
    }
}

/// Loads stylesheets through their style rule and hands rolldown an empty
/// module; the compiled CSS goes to the style registry for extraction.
#[derive(Debug, Clone)]
pub struct StylePlugin {
    ctx: Arc<BundleContext>,
    processor: Arc<StyleProcessor>,
}

impl StylePlugin {
    pub fn new(ctx: Arc<BundleContext>, processor: Arc<StyleProcessor>) -> Self {
        Self { ctx, processor }
    }
}

impl Plugin for StylePlugin {
    fn name(&self) -> Cow<'static, str> {
        "kiln:style".into()
    }

    fn register_hook_usage(&self) -> HookUsage {
        HookUsage::Load
    }

    fn load(
        &self,
        _ctx: &PluginContext,
        args: &HookLoadArgs<'_>,
    ) -> impl std::future::Future<Output = HookLoadReturn> + Send {
        let path = PathBuf::from(args.id);
        let ctx = Arc::clone(&self.ctx);
        let processor = Arc::clone(&self.processor);

        async move {
            if !path.is_absolute() || ModuleKind::from_path(&path) != ModuleKind::Style {
                return Ok(None);
            }

            let module = ModuleId::new(&path);
            let rel = module.relative_to(&ctx.root);
            let compiled = match ctx.rules.find(&rel, RuleKind::Style) {
                Some(rule) => processor.compile(&path, rule),
                None => Err(format!("no style rule matches '{rel}'")),
            };

            match compiled {
                Ok(css) => {
                    debug!(file = %rel, bytes = css.len(), "compiled stylesheet");
                    ctx.styles.register(module, css);
                    Ok(Some(HookLoadOutput {
                        code: String::new().into(),
                        module_type: Some(ModuleType::Js),
                        ..Default::default()
                    }))
                }
                Err(message) => {
                    ctx.failures.record(Error::Transform {
                        file: path.clone(),
                        message: message.clone(),
                    });
                    Err(anyhow::anyhow!(
                        "Failed to compile {}: {}",
                        path.display(),
                        message
                    ))
                }
            }
        }
    }
}

impl KilnPlugin for StylePlugin {
    fn phase(&self) -> PluginPhase {
        PluginPhase::Load
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_config::{Rule, RuleSet};
    use tempfile::TempDir;

    fn style_rule(uses: Vec<TransformStep>) -> CompiledRule {
        let rules = RuleSet::compile(&[Rule {
            test: r"\.(s[ac]ss|css)$".to_string(),
            include: Vec::new(),
            exclude: None,
            uses,
        }])
        .unwrap();
        rules.find("a.scss", RuleKind::Style).unwrap().clone()
    }

    fn processor() -> StyleProcessor {
        StyleProcessor::new(&["defaults".to_string()], Vec::new()).unwrap()
    }

    #[test]
    fn compiles_scss_through_full_chain() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.scss");
        fs::write(&path, "$c: red;\n.a { .b { color: $c; } }\n").unwrap();

        let rule = style_rule(vec![
            TransformStep::Sass,
            TransformStep::Postcss,
            TransformStep::Css,
            TransformStep::Extract,
        ]);
        let css = processor().compile(&path, &rule).unwrap();
        assert!(css.contains(".a .b"));
        assert!(css.contains("red"));
        assert!(!css.contains("$c"));
    }

    #[test]
    fn sass_source_without_sass_step_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.scss");
        fs::write(&path, ".a { color: red; }").unwrap();

        let rule = style_rule(vec![TransformStep::Css, TransformStep::Extract]);
        assert!(processor().compile(&path, &rule).is_err());
    }

    #[test]
    fn invalid_scss_reports_message() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.scss");
        fs::write(&path, ".a { color: $missing; }").unwrap();

        let rule = style_rule(vec![TransformStep::Sass, TransformStep::Extract]);
        let err = processor().compile(&path, &rule).unwrap_err();
        assert!(err.to_lowercase().contains("undefined variable"));
    }

    #[test]
    fn minify_strips_whitespace() {
        let out = processor().minify("main.css", ".a {\n  color: red;\n}\n").unwrap();
        assert_eq!(out, ".a{color:red}");
    }

    #[test]
    fn rejects_bad_browserslist() {
        assert!(StyleProcessor::new(&["not a real query".to_string()], Vec::new()).is_err());
    }
}

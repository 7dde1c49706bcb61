use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use kiln_config::{RuleKind, TransformStep};
use kiln_graph::{ModuleId, ModuleKind};
use oxc_allocator::Allocator;
use oxc_codegen::Codegen;
use oxc_parser::Parser;
use oxc_semantic::SemanticBuilder;
use oxc_span::SourceType;
use oxc_transformer::{TransformOptions, Transformer};
use rolldown_plugin::{
    HookTransformArgs, HookTransformOutput, HookTransformReturn, HookUsage, Plugin,
    SharedTransformPluginContext,
};
use tracing::debug;

use super::{KilnPlugin, PluginPhase};
use crate::bundle::BundleContext;
use crate::{Error, Result};

/// Lowers script syntax to the configured target for files matched by a
/// `script` rule. Everything else (including excluded vendor code) passes
/// through untouched.
#[derive(Debug, Clone)]
pub struct ScriptPlugin {
    ctx: Arc<BundleContext>,
    options: Arc<TransformOptions>,
}

impl ScriptPlugin {
    /// # Errors
    ///
    /// `Error::Configuration` when the script target is not understood.
    pub fn new(ctx: Arc<BundleContext>) -> Result<Self> {
        let options = TransformOptions::from_target(&ctx.script_target).map_err(|message| {
            Error::Configuration {
                message: format!("invalid script target '{}': {message}", ctx.script_target),
                hint: Some("Use an ES version such as es2015 or a browser like chrome80".into()),
            }
        })?;
        Ok(Self {
            ctx,
            options: Arc::new(options),
        })
    }

    fn applies_to(&self, path: &Path) -> bool {
        if !path.is_absolute() || ModuleKind::from_path(path) != ModuleKind::Script {
            return false;
        }
        let rel = ModuleId::new(path).relative_to(&self.ctx.root);
        self.ctx
            .rules
            .find(&rel, RuleKind::Script)
            .is_some_and(|rule| rule.has_step(TransformStep::Script))
    }
}

impl Plugin for ScriptPlugin {
    fn name(&self) -> Cow<'static, str> {
        "kiln:script".into()
    }

    fn register_hook_usage(&self) -> HookUsage {
        HookUsage::Transform
    }

    fn transform(
        &self,
        _ctx: SharedTransformPluginContext,
        args: &HookTransformArgs<'_>,
    ) -> impl std::future::Future<Output = HookTransformReturn> + Send {
        let path = PathBuf::from(args.id);
        let code = args.code.to_string();
        let applies = self.applies_to(&path);
        let options = Arc::clone(&self.options);
        let ctx = Arc::clone(&self.ctx);

        async move {
            if !applies {
                return Ok(None);
            }

            match lower_script(&path, &code, &options) {
                Ok(lowered) => {
                    debug!(file = %path.display(), "lowered script");
                    Ok(Some(HookTransformOutput {
                        code: Some(lowered),
                        map: None,
                        side_effects: None,
                        module_type: None,
                    }))
                }
                Err(message) => {
                    ctx.failures.record(Error::Transform {
                        file: path.clone(),
                        message: message.clone(),
                    });
                    Err(anyhow::anyhow!(
                        "Failed to transform {}: {}",
                        path.display(),
                        message
                    ))
                }
            }
        }
    }
}

impl KilnPlugin for ScriptPlugin {
    fn phase(&self) -> PluginPhase {
        PluginPhase::Transform
    }
}

/// Parse, lower and print one script.
///
/// Returns the first diagnostics as a message on failure.
pub fn lower_script(
    path: &Path,
    source: &str,
    options: &TransformOptions,
) -> std::result::Result<String, String> {
    let allocator = Allocator::default();
    let source_type = SourceType::from_path(path).unwrap_or(SourceType::mjs());

    let parsed = Parser::new(&allocator, source, source_type).parse();
    if !parsed.errors.is_empty() {
        return Err(join_diagnostics(&parsed.errors));
    }
    let mut program = parsed.program;

    let scoping = SemanticBuilder::new()
        .build(&program)
        .semantic
        .into_scoping();
    let transformed =
        Transformer::new(&allocator, path, options).build_with_scoping(scoping, &mut program);
    if !transformed.errors.is_empty() {
        return Err(join_diagnostics(&transformed.errors));
    }

    Ok(Codegen::new().build(&program).code)
}

fn join_diagnostics<E: std::fmt::Display>(errors: &[E]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use kiln_config::{RuleKind, TransformStep};
use kiln_graph::ModuleId;
use rolldown_common::ModuleType;
use rolldown_plugin::{
    HookLoadArgs, HookLoadOutput, HookLoadReturn, HookUsage, Plugin, PluginContext,
};
use tracing::debug;

use super::{KilnPlugin, PluginPhase};
use crate::Error;
use crate::bundle::BundleContext;

/// Emits files matched by an `asset` rule and exports their public URL.
#[derive(Debug, Clone)]
pub struct AssetPlugin {
    ctx: Arc<BundleContext>,
}

impl AssetPlugin {
    pub fn new(ctx: Arc<BundleContext>) -> Self {
        Self { ctx }
    }
}

/// Render the output path for `path` and the module that exports its URL.
fn emit(ctx: &BundleContext, path: &Path) -> std::result::Result<(String, Vec<u8>, String), String> {
    let bytes = fs::read(path).map_err(|e| e.to_string())?;
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("asset");
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{e}"))
        .unwrap_or_default();

    let output_path = ctx.asset_template.render(name, &ext, &bytes);
    let url = format!("{}{}", ctx.public_path, output_path);
    let url = serde_json::to_string(&url).map_err(|e| e.to_string())?;
    Ok((output_path, bytes, format!("export default {url};\n")))
}

impl Plugin for AssetPlugin {
    fn name(&self) -> Cow<'static, str> {
        "kiln:asset".into()
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

        async move {
            if !path.is_absolute() {
                return Ok(None);
            }
            let rel = ModuleId::new(&path).relative_to(&ctx.root);
            let matched = ctx
                .rules
                .find(&rel, RuleKind::Asset)
                .is_some_and(|rule| rule.has_step(TransformStep::Asset));
            if !matched {
                return Ok(None);
            }

            match emit(&ctx, &path) {
                Ok((output_path, bytes, code)) => {
                    debug!(file = %rel, output = %output_path, "emitted asset");
                    if let Err(err) = ctx.assets.register(output_path, &path, bytes) {
                        let message = err.to_string();
                        ctx.failures.record(err);
                        return Err(anyhow::anyhow!(message));
                    }
                    Ok(Some(HookLoadOutput {
                        code: code.into(),
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
                        "Failed to emit {}: {}",
                        path.display(),
                        message
                    ))
                }
            }
        }
    }
}

impl KilnPlugin for AssetPlugin {
    fn phase(&self) -> PluginPhase {
        PluginPhase::Load
    }
}

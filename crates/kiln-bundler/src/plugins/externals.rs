use std::borrow::Cow;
use std::sync::Arc;

use rolldown_common::ResolvedExternal;
use rolldown_plugin::{
    HookResolveIdArgs, HookResolveIdOutput, HookResolveIdReturn, HookUsage, Plugin,
    PluginContext,
};
use tracing::trace;

use super::{KilnPlugin, PluginPhase};
use crate::bundle::BundleContext;

/// Marks requests from the external table as external, so the chunk refers
/// to the host global instead of bundling the package.
#[derive(Debug, Clone)]
pub struct ExternalsPlugin {
    ctx: Arc<BundleContext>,
}

impl ExternalsPlugin {
    pub fn new(ctx: Arc<BundleContext>) -> Self {
        Self { ctx }
    }
}

impl Plugin for ExternalsPlugin {
    fn name(&self) -> Cow<'static, str> {
        "kiln:externals".into()
    }

    fn register_hook_usage(&self) -> HookUsage {
        HookUsage::ResolveId
    }

    fn resolve_id(
        &self,
        _ctx: &PluginContext,
        args: &HookResolveIdArgs,
    ) -> impl std::future::Future<Output = HookResolveIdReturn> + Send {
        let specifier = args.specifier.to_string();
        let ctx = Arc::clone(&self.ctx);

        async move {
            if !ctx.externals.is_external(&specifier) {
                return Ok(None);
            }

            trace!(request = %specifier, "externalized");
            Ok(Some(HookResolveIdOutput {
                id: specifier.into(),
                external: Some(ResolvedExternal::Bool(true)),
                ..Default::default()
            }))
        }
    }
}

impl KilnPlugin for ExternalsPlugin {
    fn phase(&self) -> PluginPhase {
        PluginPhase::Resolve
    }
}

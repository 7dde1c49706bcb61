//! Rolldown plugins that implement the kiln transform chain.
//!
//! - [`ExternalsPlugin`] keeps host-provided packages out of the bundle
//! - [`ScriptPlugin`] lowers script syntax for rule-matched files
//! - [`StylePlugin`] compiles and post-processes stylesheets for extraction
//! - [`AssetPlugin`] emits files through the asset template
//!
//! Plugins are ordered by [`PluginPhase`]: resolution, then loading, then
//! transformation.

mod asset;
mod externals;
mod script;
mod style;

pub use asset::AssetPlugin;
pub use externals::ExternalsPlugin;
pub use script::{ScriptPlugin, lower_script};
pub use style::{StylePlugin, StyleProcessor};

use std::sync::Arc;

use rolldown_plugin::Plugin;
use rolldown_plugin::__inner::SharedPluginable;

/// Plugin execution phases. Lower phases run first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PluginPhase {
    /// Claims requests before rolldown's resolver sees them
    Resolve = 10,

    /// Replaces file contents (stylesheets, emitted files)
    Load = 20,

    /// Rewrites loaded JavaScript
    Transform = 30,
}

/// A rolldown plugin that knows its phase.
pub trait KilnPlugin: Plugin {
    fn phase(&self) -> PluginPhase {
        PluginPhase::Transform
    }
}

/// Plugins kept in phase order.
#[derive(Default)]
pub struct PluginRegistry {
    plugins: Vec<(PluginPhase, SharedPluginable)>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<P: KilnPlugin + 'static>(&mut self, plugin: P) {
        let phase = plugin.phase();
        self.plugins.push((phase, Arc::new(plugin)));
    }

    /// Plugins sorted by phase; registration order is kept within a phase.
    pub fn into_rolldown_plugins(mut self) -> Vec<SharedPluginable> {
        self.plugins.sort_by_key(|(phase, _)| *phase);
        self.plugins.into_iter().map(|(_, plugin)| plugin).collect()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

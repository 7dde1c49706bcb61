//! Hook pipeline.
//!
//! Hooks subscribe to build events and run synchronously, in registration
//! order, when the pipeline reaches that event. Any hook can abort the build
//! by returning an error.

mod clean;
mod cycle;
mod manifest;

pub use clean::CleanHook;
pub use cycle::CycleHook;
pub use manifest::{ManifestHook, ManifestRecord, render_php};

use std::fmt;
use std::path::Path;

use kiln_config::KilnConfig;
use kiln_graph::ModuleGraph;
use tracing::debug;

use crate::Result;
use crate::entry::ResolvedEntries;
use crate::output::ArtifactSet;

/// Build events, in the order the pipeline raises them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookEvent {
    /// Config loaded and entries resolved
    Configure,
    /// Module graph built
    Resolve,
    /// Artifacts assembled, nothing written yet
    Emit,
    /// Artifacts written
    Complete,
}

impl fmt::Display for HookEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HookEvent::Configure => "configure",
            HookEvent::Resolve => "resolve",
            HookEvent::Emit => "emit",
            HookEvent::Complete => "complete",
        })
    }
}

/// What a hook can see and change.
///
/// `graph` is `None` during [`HookEvent::Configure`]; `artifacts` is empty
/// until [`HookEvent::Emit`].
pub struct HookContext<'a> {
    pub root: &'a Path,
    pub config: &'a KilnConfig,
    pub output_dir: &'a Path,
    pub entries: &'a ResolvedEntries,
    pub graph: Option<&'a ModuleGraph>,
    pub artifacts: &'a mut ArtifactSet,
    pub warnings: &'a mut Vec<String>,
    /// Output paths removed by the cleaner, relative to `output_dir`
    pub removed: &'a mut Vec<String>,
}

pub trait Hook: Send + Sync {
    fn name(&self) -> &str;

    /// Events this hook runs for.
    fn events(&self) -> &'static [HookEvent];

    fn run(&self, event: HookEvent, ctx: &mut HookContext<'_>) -> Result<()>;
}

#[derive(Default)]
pub struct HookPipeline {
    hooks: Vec<Box<dyn Hook>>,
}

impl HookPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in hooks enabled by `config`: cycle detector, manifest
    /// emitter, stale-output cleaner.
    pub fn with_builtins(config: &KilnConfig) -> Self {
        let mut pipeline = Self::new();
        if config.plugins.circular.enabled {
            pipeline.register(CycleHook);
        }
        if config.plugins.manifest.enabled {
            pipeline.register(ManifestHook);
        }
        pipeline.register(CleanHook);
        pipeline
    }

    pub fn register(&mut self, hook: impl Hook + 'static) {
        self.hooks.push(Box::new(hook));
    }

    pub fn names(&self) -> Vec<&str> {
        self.hooks.iter().map(|h| h.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Run every hook subscribed to `event`; stops at the first error.
    pub fn dispatch(&self, event: HookEvent, ctx: &mut HookContext<'_>) -> Result<()> {
        for hook in self.hooks.iter().filter(|h| h.events().contains(&event)) {
            debug!(hook = hook.name(), %event, "running hook");
            hook.run(event, ctx)?;
        }
        Ok(())
    }
}

impl fmt::Debug for HookPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookPipeline")
            .field("hooks", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use parking_lot::Mutex;
    use std::sync::Arc;

    struct Recorder {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
        fail: bool,
    }

    impl Hook for Recorder {
        fn name(&self) -> &str {
            self.name
        }

        fn events(&self) -> &'static [HookEvent] {
            &[HookEvent::Configure, HookEvent::Complete]
        }

        fn run(&self, event: HookEvent, _ctx: &mut HookContext<'_>) -> Result<()> {
            self.log.lock().push(format!("{}:{event}", self.name));
            if self.fail {
                return Err(Error::configuration("stop"));
            }
            Ok(())
        }
    }

    fn dispatch(pipeline: &HookPipeline, event: HookEvent) -> Result<()> {
        let config = KilnConfig::default();
        let entries = ResolvedEntries::default();
        let mut artifacts = ArtifactSet::new();
        let mut warnings = Vec::new();
        let mut removed = Vec::new();
        let mut ctx = HookContext {
            root: Path::new("/project"),
            config: &config,
            output_dir: Path::new("/project/build"),
            entries: &entries,
            graph: None,
            artifacts: &mut artifacts,
            warnings: &mut warnings,
            removed: &mut removed,
        };
        pipeline.dispatch(event, &mut ctx)
    }

    #[test]
    fn runs_in_registration_order_for_subscribed_events() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut pipeline = HookPipeline::new();
        for name in ["first", "second"] {
            pipeline.register(Recorder {
                name,
                log: Arc::clone(&log),
                fail: false,
            });
        }

        dispatch(&pipeline, HookEvent::Configure).unwrap();
        dispatch(&pipeline, HookEvent::Emit).unwrap();
        dispatch(&pipeline, HookEvent::Complete).unwrap();

        assert_eq!(
            *log.lock(),
            vec![
                "first:configure",
                "second:configure",
                "first:complete",
                "second:complete"
            ]
        );
    }

    #[test]
    fn error_stops_later_hooks() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut pipeline = HookPipeline::new();
        pipeline.register(Recorder {
            name: "failing",
            log: Arc::clone(&log),
            fail: true,
        });
        pipeline.register(Recorder {
            name: "never",
            log: Arc::clone(&log),
            fail: false,
        });

        assert!(dispatch(&pipeline, HookEvent::Configure).is_err());
        assert_eq!(*log.lock(), vec!["failing:configure"]);
    }

    #[test]
    fn builtins_follow_config() {
        let mut config = KilnConfig::default();
        assert_eq!(
            HookPipeline::with_builtins(&config).names(),
            vec!["circular-dependency", "dependency-manifest", "clean-stale-outputs"]
        );

        config.plugins.circular.enabled = false;
        config.plugins.manifest.enabled = false;
        assert_eq!(
            HookPipeline::with_builtins(&config).names(),
            vec!["clean-stale-outputs"]
        );
    }
}

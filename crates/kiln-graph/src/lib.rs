//! Module import graph for kiln builds.
//!
//! The graph is crawled from the configured entries before bundling. It records
//! which modules each entry reaches, which stylesheets it pulls in (in import
//! order), which external requests it references, and which import edges are
//! dynamic. Cycle detection runs on top of it.

mod collect;
mod cycles;
mod dependency_chain;
mod error;
mod external_dep;
mod graph;
mod module;
mod resolve;

pub use collect::{ImportKind, ImportRecord, collect_imports};
pub use cycles::{CycleDetector, CycleScope};
pub use dependency_chain::DependencyChain;
pub use error::{GraphError, Result};
pub use external_dep::ExternalDependency;
pub use graph::{GraphBuilder, ModuleGraph};
pub use module::{Module, ModuleId, ModuleKind};
pub use resolve::{ModuleResolver, resolve_conditions, resolve_extensions, resolve_main_fields};

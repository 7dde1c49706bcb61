//! Circular import detection.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use regex::Regex;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use crate::dependency_chain::DependencyChain;
use crate::error::{GraphError, Result};
use crate::graph::ModuleGraph;
use crate::module::ModuleId;

/// Which modules may start a reported cycle.
///
/// Patterns are tested against the module path relative to `cwd`, with `/`
/// separators.
#[derive(Debug, Clone)]
pub struct CycleScope {
    cwd: PathBuf,
    include: Option<Regex>,
    exclude: Option<Regex>,
}

impl CycleScope {
    pub fn new(cwd: impl Into<PathBuf>, include: Option<&str>, exclude: Option<&str>) -> Result<Self> {
        Ok(Self {
            cwd: cwd.into(),
            include: include.map(compile).transpose()?,
            exclude: exclude.map(compile).transpose()?,
        })
    }

    /// Scope that admits every module.
    pub fn everything(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            include: None,
            exclude: None,
        }
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn contains(&self, id: &ModuleId) -> bool {
        let rel = id.relative_to(&self.cwd);
        let included = self.include.as_ref().is_none_or(|re| re.is_match(&rel));
        let excluded = self.exclude.as_ref().is_some_and(|re| re.is_match(&rel));
        included && !excluded
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| GraphError::InvalidPattern {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })
}

/// Finds import cycles in a [`ModuleGraph`].
///
/// Each strongly connected component with an in-scope member yields one
/// cycle: the shortest loop through its first in-scope module (by path).
pub struct CycleDetector {
    scope: CycleScope,
    allow_async_cycles: bool,
}

impl CycleDetector {
    pub fn new(scope: CycleScope) -> Self {
        Self {
            scope,
            allow_async_cycles: false,
        }
    }

    /// Ignore `import()` edges, so loops through a lazy import are allowed.
    pub fn allow_async_cycles(mut self, allow: bool) -> Self {
        self.allow_async_cycles = allow;
        self
    }

    pub fn scope(&self) -> &CycleScope {
        &self.scope
    }

    /// Detected cycles, deduplicated and sorted.
    pub fn detect(&self, graph: &ModuleGraph) -> Vec<DependencyChain> {
        let mut g = DiGraph::<(), ()>::with_capacity(graph.len(), 0);
        for _ in 0..graph.len() {
            g.add_node(());
        }
        for (from, to, kind) in graph.edges() {
            if self.allow_async_cycles && kind.is_dynamic() {
                continue;
            }
            g.update_edge(NodeIndex::new(from), NodeIndex::new(to), ());
        }

        let mut cycles = Vec::new();
        for component in tarjan_scc(&g) {
            let is_cycle = component.len() > 1
                || component
                    .first()
                    .is_some_and(|&n| g.contains_edge(n, n));
            if !is_cycle {
                continue;
            }

            let mut starts: Vec<usize> = component
                .iter()
                .map(|n| n.index())
                .filter(|&i| self.scope.contains(&graph.module_at(i).id))
                .collect();
            starts.sort_by(|a, b| graph.module_at(*a).id.cmp(&graph.module_at(*b).id));

            let Some(&start) = starts.first() else {
                continue;
            };
            let members: FxHashSet<usize> = component.iter().map(|n| n.index()).collect();
            if let Some(path) = shortest_loop(&g, graph, start, &members) {
                cycles.push(DependencyChain::new(
                    path.into_iter()
                        .map(|i| graph.module_at(i).id.clone())
                        .collect(),
                ));
            }
        }

        cycles.sort();
        cycles.dedup();
        debug!(cycles = cycles.len(), "cycle detection finished");
        cycles
    }
}

/// Breadth-first search for the shortest path from `start` back to itself.
fn shortest_loop(
    g: &DiGraph<(), ()>,
    graph: &ModuleGraph,
    start: usize,
    members: &FxHashSet<usize>,
) -> Option<Vec<usize>> {
    let mut parent: FxHashMap<usize, usize> = FxHashMap::default();
    let mut queue = VecDeque::from([start]);

    while let Some(node) = queue.pop_front() {
        let mut next: Vec<usize> = g
            .neighbors(NodeIndex::new(node))
            .map(|n| n.index())
            .filter(|i| members.contains(i))
            .collect();
        next.sort_by(|a, b| graph.module_at(*a).id.cmp(&graph.module_at(*b).id));

        for target in next {
            if target == start {
                let mut path = vec![node];
                let mut cursor = node;
                while cursor != start {
                    cursor = *parent.get(&cursor)?;
                    path.push(cursor);
                }
                path.reverse();
                path.push(start);
                return Some(path);
            }
            if !parent.contains_key(&target) {
                parent.insert(target, node);
                queue.push_back(target);
            }
        }
    }

    None
}

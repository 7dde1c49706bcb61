use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fs;
use std::path::PathBuf;

use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::collect::{ImportKind, collect_imports};
use crate::error::{GraphError, Result};
use crate::external_dep::ExternalDependency;
use crate::module::{Module, ModuleId, ModuleKind};
use crate::resolve::ModuleResolver;

#[derive(Debug, Clone)]
enum Target {
    Module(usize),
    External(String),
}

#[derive(Debug, Clone)]
struct Dependency {
    target: Target,
    kind: ImportKind,
}

/// Import graph reachable from a set of named entries.
///
/// Modules are stored in discovery order (breadth-first from the entries in
/// entry order), so every query on the graph is deterministic.
#[derive(Debug, Default)]
pub struct ModuleGraph {
    modules: Vec<Module>,
    index: FxHashMap<ModuleId, usize>,
    dependencies: Vec<Vec<Dependency>>,
    entries: Vec<(String, ModuleId)>,
    externals: BTreeMap<String, ExternalDependency>,
}

impl ModuleGraph {
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn entries(&self) -> &[(String, ModuleId)] {
        &self.entries
    }

    pub fn entry(&self, name: &str) -> Option<&ModuleId> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, id)| id)
    }

    pub fn module(&self, id: &ModuleId) -> Option<&Module> {
        self.index.get(id).map(|&i| &self.modules[i])
    }

    pub fn contains(&self, id: &ModuleId) -> bool {
        self.index.contains_key(id)
    }

    /// External requests seen anywhere in the graph, sorted by specifier.
    pub fn externals(&self) -> impl Iterator<Item = &ExternalDependency> {
        self.externals.values()
    }

    /// In-graph dependencies of `id`, in source order.
    pub fn dependencies(&self, id: &ModuleId) -> Vec<(&ModuleId, ImportKind)> {
        let Some(&i) = self.index.get(id) else {
            return Vec::new();
        };
        self.dependencies[i]
            .iter()
            .filter_map(|dep| match dep.target {
                Target::Module(j) => Some((&self.modules[j].id, dep.kind)),
                Target::External(_) => None,
            })
            .collect()
    }

    /// Modules reachable from the named entry, depth-first in import order,
    /// each listed after everything it imports.
    pub fn reachable_from(&self, entry: &str) -> Vec<&ModuleId> {
        self.entry_index(entry)
            .map(|start| {
                self.post_order(start)
                    .into_iter()
                    .map(|i| &self.modules[i].id)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Stylesheets an entry pulls in, in the order they must be concatenated.
    pub fn styles_for(&self, entry: &str) -> Vec<&ModuleId> {
        self.reachable_from(entry)
            .into_iter()
            .filter(|id| self.module(id).is_some_and(|m| m.kind == ModuleKind::Style))
            .collect()
    }

    /// External requests reachable from the named entry.
    pub fn externals_for(&self, entry: &str) -> BTreeSet<String> {
        let Some(start) = self.entry_index(entry) else {
            return BTreeSet::new();
        };
        self.post_order(start)
            .into_iter()
            .flat_map(|i| self.dependencies[i].iter())
            .filter_map(|dep| match &dep.target {
                Target::External(specifier) => Some(specifier.clone()),
                Target::Module(_) => None,
            })
            .collect()
    }

    pub(crate) fn module_at(&self, index: usize) -> &Module {
        &self.modules[index]
    }

    /// Every in-graph edge as `(from, to, kind)` indices.
    pub(crate) fn edges(&self) -> impl Iterator<Item = (usize, usize, ImportKind)> + '_ {
        self.dependencies
            .iter()
            .enumerate()
            .flat_map(|(from, deps)| {
                deps.iter().filter_map(move |dep| match dep.target {
                    Target::Module(to) => Some((from, to, dep.kind)),
                    Target::External(_) => None,
                })
            })
    }

    fn entry_index(&self, entry: &str) -> Option<usize> {
        self.entry(entry).and_then(|id| self.index.get(id).copied())
    }

    fn post_order(&self, start: usize) -> Vec<usize> {
        let mut visited = vec![false; self.modules.len()];
        let mut order = Vec::new();
        let mut stack = vec![(start, 0usize)];
        visited[start] = true;

        while let Some(frame) = stack.last_mut() {
            let (node, cursor) = *frame;
            match self.dependencies[node].get(cursor) {
                Some(dep) => {
                    frame.1 += 1;
                    if let Target::Module(next) = dep.target {
                        if !visited[next] {
                            visited[next] = true;
                            stack.push((next, 0));
                        }
                    }
                }
                None => {
                    order.push(node);
                    stack.pop();
                }
            }
        }

        order
    }

    fn insert(&mut self, module: Module) -> usize {
        let index = self.modules.len();
        self.index.insert(module.id.clone(), index);
        self.modules.push(module);
        self.dependencies.push(Vec::new());
        index
    }
}

/// Crawls the import graph from entry files.
///
/// Script modules are parsed for imports; styles and assets are leaves. Requests
/// accepted by the external filter are recorded but never resolved or followed.
pub struct GraphBuilder<'a> {
    resolver: ModuleResolver,
    is_external: Box<dyn Fn(&str) -> bool + 'a>,
}

impl<'a> GraphBuilder<'a> {
    pub fn new() -> Self {
        Self {
            resolver: ModuleResolver::new(),
            is_external: Box::new(|_| false),
        }
    }

    pub fn with_external_filter(mut self, filter: impl Fn(&str) -> bool + 'a) -> Self {
        self.is_external = Box::new(filter);
        self
    }

    /// Build the graph for `(name, absolute path)` entries.
    ///
    /// # Errors
    ///
    /// Fails on the first entry that is not a file, unreadable module, syntax
    /// error or unresolvable import.
    pub fn build(&self, entries: &[(String, PathBuf)]) -> Result<ModuleGraph> {
        let mut graph = ModuleGraph::default();
        let mut queue = VecDeque::new();

        for (name, path) in entries {
            if !path.is_file() {
                return Err(GraphError::Entry {
                    name: name.clone(),
                    path: path.clone(),
                });
            }
            let id = ModuleId::new(path);
            let index = match graph.index.get(&id) {
                Some(&index) => index,
                None => {
                    let index = graph.insert(Module::new(id.clone(), ModuleKind::from_path(path)));
                    queue.push_back(index);
                    index
                }
            };
            graph.modules[index].mark_entry();
            graph.entries.push((name.clone(), id));
        }

        while let Some(index) = queue.pop_front() {
            if graph.modules[index].kind != ModuleKind::Script {
                continue;
            }

            let path = graph.modules[index].id.as_path().to_path_buf();
            let source = fs::read_to_string(&path).map_err(|source| GraphError::Io {
                path: path.clone(),
                source,
            })?;
            let imports = collect_imports(&path, &source)?;
            trace!(module = %path.display(), imports = imports.len(), "parsed module");

            for record in &imports {
                let target = if (self.is_external)(&record.specifier) {
                    graph
                        .externals
                        .entry(record.specifier.clone())
                        .or_insert_with(|| ExternalDependency::new(record.specifier.clone()))
                        .push_importer(graph.modules[index].id.clone());
                    Target::External(record.specifier.clone())
                } else {
                    let resolved = self.resolver.resolve(&path, &record.specifier)?;
                    let id = ModuleId::new(&resolved);
                    let target_index = match graph.index.get(&id) {
                        Some(&existing) => existing,
                        None => {
                            let new = graph.insert(Module::new(id, ModuleKind::from_path(&resolved)));
                            queue.push_back(new);
                            new
                        }
                    };
                    Target::Module(target_index)
                };

                graph.dependencies[index].push(Dependency {
                    target,
                    kind: record.kind,
                });
            }
            graph.modules[index].imports = imports;
        }

        debug!(
            modules = graph.len(),
            externals = graph.externals.len(),
            "module graph built"
        );
        Ok(graph)
    }
}

impl Default for GraphBuilder<'_> {
    fn default() -> Self {
        Self::new()
    }
}

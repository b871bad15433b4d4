//! Dependency graph and topological scheduling (spec §4.1 "Graph & Topology").
//!
//! `DependencyGraph` wraps `petgraph::graph::DiGraph`, grounded on the
//! teacher's `nebula-execution::plan::ExecutionPlan::from_workflow` (which
//! itself delegates to a `DependencyGraph` built from the workflow's
//! connections). Edges point from a dependency to its dependent (`B -> A`
//! when `A requires B`) so a node's in-degree is its unresolved-dependency
//! count and [`petgraph::Direction::Incoming`] walks toward dependencies.

use std::collections::{BTreeSet, HashMap, HashSet};

use kestrel_core::ActionId;
use kestrel_error::ResolverError;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;

use crate::model::Resource;

/// The workflow's resource dependency graph.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    graph: DiGraph<ActionId, ()>,
    index_of: HashMap<ActionId, NodeIndex>,
    resources: HashMap<ActionId, Resource>,
}

impl DependencyGraph {
    /// Construct an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of resources loaded so far.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Look up a previously inserted resource by action id.
    #[must_use]
    pub fn resource(&self, action_id: &ActionId) -> Option<&Resource> {
        self.resources.get(action_id)
    }

    fn index_for(&mut self, id: &ActionId) -> NodeIndex {
        if let Some(&idx) = self.index_of.get(id) {
            return idx;
        }
        let idx = self.graph.add_node(id.clone());
        self.index_of.insert(id.clone(), idx);
        idx
    }

    /// Insert a loaded resource, registering its `requires` edges.
    ///
    /// `requires` entries are expected to already be canonicalised (spec
    /// §4.1: "the node's declared `requires` is canonicalised through C5"
    /// before the resource reaches this graph).
    pub fn insert(&mut self, resource: Resource) {
        let node = self.index_for(&resource.action_id);
        for dep in &resource.requires {
            let dep_node = self.index_for(dep);
            self.graph.add_edge(dep_node, node, ());
        }
        self.resources.insert(resource.action_id.clone(), resource);
    }

    /// Returns the set of node indices in `target`'s transitive dependency
    /// closure, including `target` itself.
    fn transitive_closure(&self, target: NodeIndex) -> HashSet<NodeIndex> {
        let mut closure = HashSet::new();
        let mut stack = vec![target];
        while let Some(idx) = stack.pop() {
            if closure.insert(idx) {
                stack.extend(self.graph.neighbors_directed(idx, Direction::Incoming));
            }
        }
        closure
    }

    /// Build the transitive closure of `target` in reverse-topological order
    /// (leaves first, `target` last), tie-broken lexically by action id
    /// (spec §4.1).
    ///
    /// # Errors
    ///
    /// [`ResolverError::Validation`] if `target` was never inserted;
    /// [`ResolverError::CycleDetected`] if the closure contains a cycle.
    pub fn build_dependency_stack(&self, target: &ActionId) -> Result<Vec<ActionId>, ResolverError> {
        let target_idx = *self.index_of.get(target).ok_or_else(|| {
            ResolverError::Validation(format!("unknown action id in dependency graph: {target}"))
        })?;

        let closure = self.transitive_closure(target_idx);

        let mut in_degree: HashMap<NodeIndex, usize> = HashMap::new();
        for &idx in &closure {
            let count = self
                .graph
                .neighbors_directed(idx, Direction::Incoming)
                .filter(|pred| closure.contains(pred))
                .count();
            in_degree.insert(idx, count);
        }

        let mut ready: BTreeSet<ActionId> = closure
            .iter()
            .filter(|idx| in_degree[idx] == 0)
            .map(|&idx| self.graph[idx].clone())
            .collect();

        let mut order = Vec::with_capacity(closure.len());
        while let Some(id) = ready.iter().next().cloned() {
            ready.remove(&id);
            let idx = self.index_of[&id];
            order.push(id);
            for succ in self.graph.neighbors_directed(idx, Direction::Outgoing) {
                if !closure.contains(&succ) {
                    continue;
                }
                let degree = in_degree.get_mut(&succ).expect("tracked in closure");
                *degree -= 1;
                if *degree == 0 {
                    ready.insert(self.graph[succ].clone());
                }
            }
        }

        if order.len() != closure.len() {
            return Err(ResolverError::CycleDetected(self.find_cycle_chain(&closure)));
        }

        Ok(order)
    }

    /// DFS back-edge trace producing the offending chain, e.g. `[A, B, A]`
    /// for a two-node cycle (spec §8 scenario 6).
    fn find_cycle_chain(&self, scope: &HashSet<NodeIndex>) -> Vec<ActionId> {
        let mut starts: Vec<NodeIndex> = scope.iter().copied().collect();
        starts.sort_by_key(|idx| self.graph[*idx].clone());

        let mut visited = HashSet::new();
        for start in starts {
            if visited.contains(&start) {
                continue;
            }
            let mut rec_stack = HashSet::new();
            let mut path = Vec::new();
            if let Some(chain) =
                self.cycle_dfs(start, scope, &mut visited, &mut rec_stack, &mut path)
            {
                return chain;
            }
        }
        Vec::new()
    }

    #[allow(clippy::only_used_in_recursion)]
    fn cycle_dfs(
        &self,
        node: NodeIndex,
        scope: &HashSet<NodeIndex>,
        visited: &mut HashSet<NodeIndex>,
        rec_stack: &mut HashSet<NodeIndex>,
        path: &mut Vec<NodeIndex>,
    ) -> Option<Vec<ActionId>> {
        visited.insert(node);
        rec_stack.insert(node);
        path.push(node);

        for dep in self.graph.neighbors_directed(node, Direction::Incoming) {
            if !scope.contains(&dep) {
                continue;
            }
            if !visited.contains(&dep) {
                if let Some(chain) = self.cycle_dfs(dep, scope, visited, rec_stack, path) {
                    return Some(chain);
                }
            } else if rec_stack.contains(&dep) {
                let start = path.iter().position(|&p| p == dep).expect("in rec_stack");
                let mut chain: Vec<ActionId> =
                    path[start..].iter().map(|&idx| self.graph[idx].clone()).collect();
                chain.push(self.graph[dep].clone());
                return Some(chain);
            }
        }

        rec_stack.remove(&node);
        path.pop();
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Resource;
    use std::path::PathBuf;

    fn resource(id: &str, requires: &[&str]) -> Resource {
        Resource {
            action_id: ActionId::new(id).unwrap(),
            file: PathBuf::from(format!("/resources/{id}.pkl")),
            requires: requires.iter().map(|r| ActionId::new(*r).unwrap()).collect(),
            run: None,
            items: None,
        }
    }

    #[test]
    fn single_node_stack() {
        let mut graph = DependencyGraph::new();
        graph.insert(resource("a", &[]));
        let stack = graph.build_dependency_stack(&ActionId::new("a").unwrap()).unwrap();
        assert_eq!(stack, vec![ActionId::new("a").unwrap()]);
    }

    #[test]
    fn linear_chain_is_leaves_first() {
        let mut graph = DependencyGraph::new();
        graph.insert(resource("a", &["b"]));
        graph.insert(resource("b", &["c"]));
        graph.insert(resource("c", &[]));
        let stack = graph.build_dependency_stack(&ActionId::new("a").unwrap()).unwrap();
        assert_eq!(
            stack,
            vec!["c", "b", "a"]
                .into_iter()
                .map(|s| ActionId::new(s).unwrap())
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn diamond_dependency_all_present_once() {
        let mut graph = DependencyGraph::new();
        graph.insert(resource("a", &["b", "c"]));
        graph.insert(resource("b", &["d"]));
        graph.insert(resource("c", &["d"]));
        graph.insert(resource("d", &[]));
        let stack = graph.build_dependency_stack(&ActionId::new("a").unwrap()).unwrap();
        assert_eq!(stack.len(), 4);
        assert_eq!(stack[0], ActionId::new("d").unwrap());
        assert_eq!(stack[3], ActionId::new("a").unwrap());
    }

    #[test]
    fn ties_break_lexically() {
        let mut graph = DependencyGraph::new();
        graph.insert(resource("target", &["z", "a"]));
        graph.insert(resource("z", &[]));
        graph.insert(resource("a", &[]));
        let stack = graph
            .build_dependency_stack(&ActionId::new("target").unwrap())
            .unwrap();
        assert_eq!(
            stack,
            vec!["a", "z", "target"]
                .into_iter()
                .map(|s| ActionId::new(s).unwrap())
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn unknown_target_is_validation_error() {
        let graph = DependencyGraph::new();
        let err = graph
            .build_dependency_stack(&ActionId::new("missing").unwrap())
            .unwrap_err();
        assert!(matches!(err, ResolverError::Validation(_)));
    }

    #[test]
    fn two_node_cycle_detected_with_chain() {
        let mut graph = DependencyGraph::new();
        graph.insert(resource("a", &["b"]));
        graph.insert(resource("b", &["a"]));
        let err = graph.build_dependency_stack(&ActionId::new("a").unwrap()).unwrap_err();
        match err {
            ResolverError::CycleDetected(chain) => {
                assert_eq!(chain.len(), 3);
                assert_eq!(chain.first(), chain.last());
            }
            other => panic!("expected CycleDetected, got {other:?}"),
        }
    }

    #[test]
    fn resource_lookup_after_insert() {
        let mut graph = DependencyGraph::new();
        graph.insert(resource("a", &[]));
        assert!(graph.resource(&ActionId::new("a").unwrap()).is_some());
        assert!(graph.resource(&ActionId::new("missing").unwrap()).is_none());
    }
}

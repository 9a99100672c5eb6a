//! Dependency ordering of abstraction definitions.
//!
//! Kahn's algorithm in levels, lexicographic within a level. Cycles are reported with
//! the offending strongly connected component found by Tarjan's algorithm.

use std::collections::{BTreeMap, BTreeSet};

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};

use tempora_core::errors::CompileError;

use super::closure::Closure;

/// Abstraction ids in dependency order, and each id's rank in that order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopologicalOrder {
    pub order: Vec<String>,
    pub rank: BTreeMap<String, usize>,
}

/// Order the abstraction definitions of `closure` so every definition follows the
/// abstractions it is computed from.
pub fn order(closure: &Closure) -> Result<TopologicalOrder, CompileError> {
    let abstractions: BTreeSet<&str> = closure
        .definitions
        .values()
        .filter(|d| d.is_abstraction())
        .map(|d| d.id())
        .collect();

    let mut graph: DiGraph<&str, ()> = DiGraph::new();
    let mut nodes: BTreeMap<&str, NodeIndex> = BTreeMap::new();
    for &id in &abstractions {
        nodes.insert(id, graph.add_node(id));
    }

    // Edge dependency -> dependent.
    let mut dependencies: BTreeMap<&str, BTreeSet<String>> = BTreeMap::new();
    for &id in &abstractions {
        let deps: BTreeSet<String> = closure
            .get(id)
            .map(|d| d.abstracted_from())
            .unwrap_or_default()
            .into_iter()
            .filter(|dep| abstractions.contains(dep.as_str()))
            .collect();
        for dep in &deps {
            graph.add_edge(nodes[dep.as_str()], nodes[id], ());
        }
        dependencies.insert(id, deps);
    }

    if let Some(cycle) = find_cycle(&graph) {
        return Err(CompileError::CyclicDependency { cycle });
    }

    let mut remaining: BTreeMap<&str, usize> = dependencies
        .iter()
        .map(|(id, deps)| (*id, deps.len()))
        .collect();
    let mut ready: BTreeSet<&str> = remaining
        .iter()
        .filter(|(_, n)| **n == 0)
        .map(|(id, _)| *id)
        .collect();

    let mut result = TopologicalOrder::default();
    while !ready.is_empty() {
        let level: Vec<&str> = std::mem::take(&mut ready).into_iter().collect();
        for id in level {
            remaining.remove(id);
            result.rank.insert(id.to_string(), result.order.len());
            result.order.push(id.to_string());
            for (dependent, deps) in &dependencies {
                if deps.contains(id) {
                    if let Some(count) = remaining.get_mut(dependent) {
                        *count -= 1;
                        if *count == 0 {
                            ready.insert(*dependent);
                        }
                    }
                }
            }
        }
    }

    if !remaining.is_empty() {
        // Only reachable if find_cycle missed a cycle.
        let ids: Vec<&str> = remaining.keys().copied().collect();
        return Err(CompileError::CyclicDependency {
            cycle: ids.join(" -> "),
        });
    }
    Ok(result)
}

/// The first cycle (smallest by id), rendered as `a -> b -> a`.
fn find_cycle(graph: &DiGraph<&str, ()>) -> Option<String> {
    let mut cycles: Vec<Vec<&str>> = tarjan_scc(graph)
        .into_iter()
        .filter(|scc| scc.len() > 1 || graph.contains_edge(scc[0], scc[0]))
        .map(|scc| {
            let mut ids: Vec<&str> = scc.iter().map(|n| graph[*n]).collect();
            ids.sort_unstable();
            ids
        })
        .collect();
    cycles.sort();
    cycles.into_iter().next().map(|mut ids| {
        ids.push(ids[0]);
        ids.join(" -> ")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempora_core::definitions::{
        HighLevelAbstractionDefinition, PropositionDefinition, RawDefinition,
        TemporalExtendedPropositionDefinition,
    };

    fn pattern(id: &str, deps: &[&str]) -> PropositionDefinition {
        let mut def = HighLevelAbstractionDefinition::new(id);
        for dep in deps {
            def = def.with_extended(TemporalExtendedPropositionDefinition::new(*dep));
        }
        def.into()
    }

    fn closure(defs: Vec<PropositionDefinition>) -> Closure {
        let mut c = Closure::default();
        for d in defs {
            c.definitions.insert(d.id().to_string(), d);
        }
        c
    }

    #[test]
    fn levels_are_lexicographic() {
        let c = closure(vec![
            PropositionDefinition::Primitive(RawDefinition::new("p")),
            pattern("z", &["p"]),
            pattern("a", &["p"]),
            pattern("m", &["a", "z"]),
        ]);
        let order = order(&c).unwrap();
        assert_eq!(order.order, vec!["a", "z", "m"]);
        assert_eq!(order.rank["m"], 2);
    }

    #[test]
    fn mutual_dependency_is_reported() {
        let c = closure(vec![pattern("a", &["b"]), pattern("b", &["a"])]);
        match order(&c) {
            Err(CompileError::CyclicDependency { cycle }) => assert_eq!(cycle, "a -> b -> a"),
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn self_dependency_is_a_cycle() {
        let c = closure(vec![pattern("a", &["a"])]);
        assert!(matches!(order(&c), Err(CompileError::CyclicDependency { .. })));
    }
}

use std::collections::{HashMap, HashSet};

use super::types::DependencyGraph;

/// Result of layering a requested subset of tickets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Layering {
    /// Layers in execution order; tickets inside one layer are independent.
    pub layers: Vec<Vec<String>>,

    /// Requested tickets that never reached in-degree zero (internal cycle).
    pub excluded: Vec<String>,
}

/// Topological layering using Kahn's algorithm, restricted to `subset`.
///
/// Only edges with both endpoints in `subset` count; dependencies pointing
/// outside the subset are ignored. Tickets in a layer keep the order they
/// were requested in.
///
/// # Algorithm
///
/// 1. Calculate in-degree for every requested ticket inside the subgraph
/// 2. Tickets with in-degree 0 form the first layer
/// 3. Remove them and decrement their dependents' in-degree
/// 4. Repeat until no ticket reaches in-degree 0
pub fn topological_layers(graph: &DependencyGraph, subset: &[String]) -> Layering {
    let mut requested: Vec<&str> = Vec::with_capacity(subset.len());
    let mut members: HashSet<&str> = HashSet::with_capacity(subset.len());
    for id in subset {
        if members.insert(id.as_str()) {
            requested.push(id.as_str());
        }
    }
    let position: HashMap<&str, usize> = requested
        .iter()
        .enumerate()
        .map(|(i, id)| (*id, i))
        .collect();

    // edges[A] = [B] means A depends on B, i.e. B -> A in execution order.
    let mut in_degree: HashMap<&str, usize> = HashMap::with_capacity(requested.len());
    for id in &requested {
        let degree = graph
            .dependencies_of(id)
            .iter()
            .filter(|dep| members.contains(dep.as_str()))
            .count();
        in_degree.insert(*id, degree);
    }

    let mut layers: Vec<Vec<String>> = Vec::new();
    let mut current: Vec<&str> = requested
        .iter()
        .copied()
        .filter(|id| in_degree[id] == 0)
        .collect();
    let mut placed = 0usize;

    while !current.is_empty() {
        placed += current.len();

        let mut next: Vec<&str> = Vec::new();
        for id in &current {
            for dependent in graph.dependents_of(id) {
                let Some(degree) = in_degree.get_mut(dependent.as_str()) else {
                    continue;
                };
                *degree -= 1;
                if *degree == 0 {
                    next.push(dependent.as_str());
                }
            }
        }
        next.sort_by_key(|id| position.get(id).copied().unwrap_or(usize::MAX));

        layers.push(current.iter().map(|s| s.to_string()).collect());
        current = next;
    }

    let excluded: Vec<String> = if placed == requested.len() {
        Vec::new()
    } else {
        requested
            .iter()
            .filter(|id| in_degree[*id] > 0)
            .map(|s| s.to_string())
            .collect()
    };

    Layering { layers, excluded }
}

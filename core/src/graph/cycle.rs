//! Iterative three-colour DFS cycle detection.

use std::collections::HashMap;

use super::types::DependencyGraph;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    Unvisited,
    InProgress,
    Done,
}

/// Find a dependency cycle in `graph`.
///
/// Returns the cycle as an ordered list of ticket ids where each entry depends
/// on the next and the last depends on the first. Uses an explicit stack so
/// deep chains cannot exhaust the call stack.
///
/// # Time Complexity
///
/// O(V + E)
pub fn detect_cycle(graph: &DependencyGraph) -> Option<Vec<String>> {
    let mut color: HashMap<&str, Color> = graph
        .nodes()
        .iter()
        .map(|n| (n.as_str(), Color::Unvisited))
        .collect();
    let mut parent: HashMap<&str, &str> = HashMap::new();

    for root in graph.nodes() {
        if color.get(root.as_str()) != Some(&Color::Unvisited) {
            continue;
        }

        // (node, index of the next dependency to visit)
        let mut stack: Vec<(&str, usize)> = vec![(root.as_str(), 0)];
        color.insert(root.as_str(), Color::InProgress);

        while let Some((node, next)) = stack.last_mut() {
            let node: &str = *node;
            let deps = graph.dependencies_of(node);

            if *next >= deps.len() {
                color.insert(node, Color::Done);
                stack.pop();
                continue;
            }

            let dep = deps[*next].as_str();
            *next += 1;

            match color.get(dep).copied().unwrap_or(Color::Unvisited) {
                Color::Unvisited => {
                    parent.insert(dep, node);
                    color.insert(dep, Color::InProgress);
                    stack.push((dep, 0));
                }
                Color::InProgress => return Some(reconstruct(&parent, node, dep)),
                Color::Done => {}
            }
        }
    }

    None
}

fn reconstruct(parent: &HashMap<&str, &str>, from: &str, back_to: &str) -> Vec<String> {
    let mut path = vec![from.to_string()];
    let mut cursor = from;
    while cursor != back_to {
        match parent.get(cursor) {
            Some(p) => {
                cursor = p;
                path.push(cursor.to_string());
            }
            None => break,
        }
    }
    path.reverse();
    path
}

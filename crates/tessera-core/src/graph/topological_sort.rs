// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A stable implementation of Kahn's algorithm for topological sorting.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::fmt;
use std::hash::Hash;

/// An error indicating that a cycle was detected in the graph.
///
/// `nodes` lists the members of one offending cycle in edge order, starting with the
/// member that appeared first in the input node list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleError<T> {
    /// The nodes forming the cycle.
    pub nodes: Vec<T>,
}

impl<T: fmt::Debug> fmt::Display for CycleError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Dependency cycle detected between {:?}", self.nodes)
    }
}

impl<T: fmt::Debug> std::error::Error for CycleError<T> {}

/// Performs a topological sort on a generic directed graph.
///
/// The graph is defined by a collection of nodes and a set of directed edges
/// representing dependencies (from parent to child). Whenever several nodes are ready at
/// the same time, the one listed first in `nodes` is emitted first, so the output is a
/// pure function of the input order.
///
/// Edges that mention a node absent from `nodes` and self edges are ignored.
///
/// # Type Parameters
///
/// * `T`: The type of the nodes in the graph. It must be hashable and equatable
///   to be used in internal maps.
///
/// # Arguments
///
/// * `nodes`: An iterator over the unique nodes in the graph.
/// * `edges`: An iterator over the directed edges, represented as `(parent, child)` tuples.
///
/// # Returns
///
/// * `Ok(Vec<T>)`: A vector of nodes in a valid topological order.
/// * `Err(CycleError)`: If the graph contains one or more cycles.
pub fn topological_sort<T>(
    nodes: impl IntoIterator<Item = T>,
    edges: impl IntoIterator<Item = (T, T)>,
) -> Result<Vec<T>, CycleError<T>>
where
    T: Copy + Eq + Hash,
{
    let node_list: Vec<T> = nodes.into_iter().collect();
    if node_list.is_empty() {
        return Ok(Vec::new());
    }

    let rank: HashMap<T, usize> = node_list
        .iter()
        .enumerate()
        .map(|(position, node)| (*node, position))
        .collect();

    let mut adjacency_list: HashMap<T, Vec<T>> = HashMap::new();
    let mut predecessors: HashMap<T, Vec<T>> = HashMap::new();
    let mut in_degree: HashMap<T, usize> = node_list.iter().map(|id| (*id, 0)).collect();

    // 1. Build adjacency list and in-degree counts from edges.
    for (parent, child) in edges {
        if parent == child || !rank.contains_key(&parent) || !rank.contains_key(&child) {
            continue;
        }
        adjacency_list.entry(parent).or_default().push(child);
        predecessors.entry(child).or_default().push(parent);
        if let Some(degree) = in_degree.get_mut(&child) {
            *degree += 1;
        }
    }

    // 2. Seed the ready set with all root nodes (in-degree of 0).
    let mut ready: BinaryHeap<Reverse<usize>> = node_list
        .iter()
        .enumerate()
        .filter(|(_, node)| in_degree.get(*node).copied().unwrap_or(0) == 0)
        .map(|(position, _)| Reverse(position))
        .collect();

    // 3. Process the ready set, lowest input position first.
    let mut sorted_list = Vec::with_capacity(node_list.len());
    while let Some(Reverse(position)) = ready.pop() {
        let parent_node = node_list[position];
        sorted_list.push(parent_node);
        if let Some(children) = adjacency_list.get(&parent_node) {
            for child_node in children {
                if let Some(degree) = in_degree.get_mut(child_node) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.push(Reverse(rank[child_node]));
                    }
                }
            }
        }
    }

    // 4. Check for cycles.
    if sorted_list.len() != node_list.len() {
        Err(CycleError {
            nodes: extract_cycle(&node_list, &rank, &predecessors, &in_degree),
        })
    } else {
        Ok(sorted_list)
    }
}

/// Walks predecessor links among the unsorted nodes until one repeats.
///
/// Every node left with a non-zero in-degree has at least one unsorted predecessor, so
/// the walk always closes on a cycle.
fn extract_cycle<T>(
    node_list: &[T],
    rank: &HashMap<T, usize>,
    predecessors: &HashMap<T, Vec<T>>,
    in_degree: &HashMap<T, usize>,
) -> Vec<T>
where
    T: Copy + Eq + Hash,
{
    let unsorted = |node: &T| in_degree.get(node).copied().unwrap_or(0) > 0;

    let Some(&start) = node_list.iter().find(|node| unsorted(*node)) else {
        return Vec::new();
    };

    let mut path: Vec<T> = Vec::new();
    let mut seen_at: HashMap<T, usize> = HashMap::new();
    let mut current = start;

    loop {
        if let Some(&at) = seen_at.get(&current) {
            // The path runs against the edges; reverse it to get edge order.
            let mut cycle: Vec<T> = path[at..].to_vec();
            cycle.reverse();
            let first = cycle
                .iter()
                .enumerate()
                .min_by_key(|(_, node)| rank.get(*node).copied().unwrap_or(usize::MAX))
                .map(|(i, _)| i)
                .unwrap_or(0);
            cycle.rotate_left(first);
            return cycle;
        }

        seen_at.insert(current, path.len());
        path.push(current);

        let next = predecessors
            .get(&current)
            .and_then(|parents| parents.iter().copied().find(|p| unsorted(p)));
        match next {
            Some(parent) => current = parent,
            None => return path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_is_sorted_regardless_of_input_order() {
        let sorted = topological_sort(["c", "a", "b"], [("a", "b"), ("b", "c")]).unwrap();
        assert_eq!(sorted, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_independent_nodes_keep_input_order() {
        let sorted = topological_sort([3, 1, 2], std::iter::empty()).unwrap();
        assert_eq!(sorted, vec![3, 1, 2]);
    }

    #[test]
    fn test_ready_ties_prefer_earlier_input() {
        // `z` and `y` both become ready after `root`; `z` is listed first.
        let sorted =
            topological_sort(["z", "root", "y"], [("root", "y"), ("root", "z")]).unwrap();
        assert_eq!(sorted, vec!["root", "z", "y"]);
    }

    #[test]
    fn test_three_node_cycle_is_reported_in_edge_order() {
        let err = topological_sort(["a", "b", "c"], [("a", "b"), ("b", "c"), ("c", "a")])
            .unwrap_err();
        assert_eq!(err.nodes, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_cycle_report_excludes_downstream_nodes() {
        // `d` is blocked by the cycle but is not part of it.
        let err = topological_sort(
            ["d", "a", "b"],
            [("a", "b"), ("b", "a"), ("b", "d")],
        )
        .unwrap_err();
        assert_eq!(err.nodes, vec!["a", "b"]);
    }

    #[test]
    fn test_self_edges_and_unknown_nodes_are_ignored() {
        let sorted = topological_sort([1, 2], [(1, 1), (1, 2), (9, 1)]).unwrap();
        assert_eq!(sorted, vec![1, 2]);
    }

    #[test]
    fn test_empty_graph() {
        let sorted: Vec<u32> = topological_sort(Vec::new(), Vec::new()).unwrap();
        assert!(sorted.is_empty());
    }
}

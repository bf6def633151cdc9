use std::collections::{HashMap, VecDeque};

use super::model::{Edge, Node};

/// Hop count from the nearest root-class node (root or area) to every node.
///
/// Multi-source BFS over the undirected adjacency implied by `edges`.
/// Unreachable nodes are absent from the result; edges with an endpoint outside
/// `nodes` are ignored.
pub fn compute_distances(nodes: &[Node], edges: &[Edge]) -> HashMap<String, u32> {
    let index_by_id = nodes
        .iter()
        .enumerate()
        .map(|(index, node)| (node.id.as_str(), index))
        .collect::<HashMap<_, _>>();

    let mut adjacency = vec![Vec::new(); nodes.len()];
    for edge in edges {
        if let (Some(&source), Some(&target)) = (
            index_by_id.get(edge.source.as_str()),
            index_by_id.get(edge.target.as_str()),
        ) {
            adjacency[source].push(target);
            adjacency[target].push(source);
        }
    }

    let mut distance = vec![None::<u32>; nodes.len()];
    let mut queue = VecDeque::new();
    for (index, node) in nodes.iter().enumerate() {
        if node.is_root_class() {
            distance[index] = Some(0);
            queue.push_back(index);
        }
    }

    while let Some(current) = queue.pop_front() {
        let Some(current_distance) = distance[current] else {
            continue;
        };

        for &next in &adjacency[current] {
            if distance[next].is_none() {
                distance[next] = Some(current_distance + 1);
                queue.push_back(next);
            }
        }
    }

    nodes
        .iter()
        .zip(distance)
        .filter_map(|(node, distance)| distance.map(|distance| (node.id.clone(), distance)))
        .collect()
}

/// Largest finite distance, never below 1 so it is always safe to divide by.
pub fn max_finite_distance(distances: &HashMap<String, u32>) -> u32 {
    distances.values().copied().max().unwrap_or(0).max(1)
}

/// Unreachable nodes are treated as the farthest reachable depth.
pub fn effective_distance(distance: Option<u32>, max_distance: u32) -> u32 {
    distance.unwrap_or(max_distance.max(1))
}

use std::collections::HashSet;

use super::super::RenderEdge;

/// Adds every edge in `adjacency[selected]` and the node at its far end.
pub(super) fn collect_direct_neighbours(
    edges: &[RenderEdge],
    adjacency: &[Vec<usize>],
    selected: usize,
    nodes: &mut HashSet<usize>,
    edge_set: &mut HashSet<usize>,
) {
    let Some(edge_indices) = adjacency.get(selected) else {
        return;
    };

    for &edge_index in edge_indices {
        let Some(edge) = edges.get(edge_index) else {
            continue;
        };
        let other = if edge.source == selected {
            edge.target
        } else {
            edge.source
        };
        nodes.insert(other);
        edge_set.insert(edge_index);
    }
}

use std::collections::HashSet;

mod collect;

use self::collect::collect_direct_neighbours;
use super::{HighlightState, RenderGraph};

pub(super) fn build_highlight_state(cache: &RenderGraph, selected: usize) -> HighlightState {
    let mut nodes = HashSet::from([selected]);
    let mut edges = HashSet::new();

    collect_direct_neighbours(&cache.edges, &cache.outgoing, selected, &mut nodes, &mut edges);
    collect_direct_neighbours(&cache.edges, &cache.incoming, selected, &mut nodes, &mut edges);

    HighlightState { nodes, edges }
}

impl HighlightState {
    pub(super) fn is_node_dimmed(&self, index: usize) -> bool {
        !self.nodes.contains(&index)
    }

    pub(super) fn is_edge_dimmed(&self, index: usize) -> bool {
        !self.edges.contains(&index)
    }
}

use std::collections::HashMap;

use log::debug;

use crate::atlas::{AtlasGraph, NodeType};

use super::super::filter::FilterState;
use super::super::layout::{LayoutNode, Simulation};
use super::super::render_utils::node_radius;
use super::super::{RenderEdge, RenderGraph, RenderNode, ViewModel};

/// Position of every node in the conversation sequence.
///
/// Turns use their own index. Other nodes keep an explicit index when they carry one,
/// otherwise they borrow the earliest index among Turns they link to directly.
fn sequence_indices(graph: &AtlasGraph) -> Vec<i64> {
    let mut borrowed = vec![None::<i64>; graph.node_count()];
    for link in &graph.links {
        for (node, other) in [(link.source, link.target), (link.target, link.source)] {
            let other = &graph.nodes[other];
            if other.node_type != NodeType::Turn {
                continue;
            }
            let index = other.turn_index.unwrap_or(0);
            let slot = &mut borrowed[node];
            *slot = Some(slot.map_or(index, |current| current.min(index)));
        }
    }

    graph
        .nodes
        .iter()
        .zip(borrowed)
        .map(|(node, borrowed)| match node.node_type {
            NodeType::Turn => node.turn_index.unwrap_or(0),
            _ => node.turn_index.or(borrowed).unwrap_or(0),
        })
        .collect()
}

fn visible_subgraph(graph: &AtlasGraph, filter: &FilterState) -> (Vec<usize>, Vec<usize>) {
    let visible_nodes = (0..graph.node_count())
        .filter(|&index| filter.is_active(&graph.nodes[index].node_type))
        .collect::<Vec<_>>();
    let visible_links = graph
        .links
        .iter()
        .enumerate()
        .filter(|(_, link)| {
            filter.is_active(&graph.nodes[link.source].node_type)
                && filter.is_active(&graph.nodes[link.target].node_type)
        })
        .map(|(index, _)| index)
        .collect();
    (visible_nodes, visible_links)
}

impl ViewModel {
    pub(in crate::app) fn rebuild_render_graph(&mut self) {
        self.graph_dirty = false;

        let (visible_nodes, visible_links) = visible_subgraph(&self.graph, &self.filter);
        let sequence = sequence_indices(&self.graph);

        let render_index_by_graph = visible_nodes
            .iter()
            .enumerate()
            .map(|(render_index, &graph_index)| (graph_index, render_index))
            .collect::<HashMap<_, _>>();

        let nodes = visible_nodes
            .iter()
            .map(|&graph_index| {
                let node_type = self.graph.nodes[graph_index].node_type.clone();
                RenderNode {
                    graph_index,
                    radius: node_radius(&node_type),
                    node_type,
                }
            })
            .collect::<Vec<_>>();

        let edges = visible_links
            .iter()
            .filter_map(|&link_index| {
                let link = &self.graph.links[link_index];
                Some(RenderEdge {
                    source: *render_index_by_graph.get(&link.source)?,
                    target: *render_index_by_graph.get(&link.target)?,
                    edge_type: link.edge_type.clone(),
                })
            })
            .collect::<Vec<_>>();

        let mut outgoing = vec![Vec::new(); nodes.len()];
        let mut incoming = vec![Vec::new(); nodes.len()];
        for (edge_index, edge) in edges.iter().enumerate() {
            outgoing[edge.source].push(edge_index);
            incoming[edge.target].push(edge_index);
        }

        let profiles = nodes
            .iter()
            .map(|node| LayoutNode {
                node_type: node.node_type.clone(),
                sequence_index: sequence[node.graph_index],
                radius: node.radius,
            })
            .collect();
        let pairs = edges
            .iter()
            .map(|edge| (edge.source, edge.target))
            .collect::<Vec<_>>();
        let simulation = Simulation::new(profiles, &pairs, self.mode, self.canvas_size);

        debug!(
            "render graph rebuilt: {} of {} nodes, {} of {} links, {} layout",
            nodes.len(),
            self.graph.node_count(),
            edges.len(),
            self.graph.edge_count(),
            self.mode.label()
        );

        self.graph_cache = Some(RenderGraph {
            nodes,
            edges,
            render_index_by_graph,
            outgoing,
            incoming,
            simulation,
            screen_positions: Vec::new(),
            screen_radii: Vec::new(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atlas::parse_graph;

    const SCENARIO: &str = r#"{
        "nodes": [
            {"id": "conv", "node_type": "Conversation"},
            {"id": "t0", "node_type": "Turn", "turn_index": 0, "role": "user"},
            {"id": "t1", "node_type": "Turn", "turn_index": 1, "role": "assistant"},
            {"id": "t2", "node_type": "Turn", "turn_index": 2, "role": "user"},
            {"id": "m1", "node_type": "Move", "move_type": "REPAIR_INITIATION"},
            {"id": "k1", "node_type": "Constraint", "current_state": "SURVIVED"},
            {"id": "v1", "node_type": "ViolationEvent", "turn_index": 1}
        ],
        "links": [
            {"source": "conv", "target": "t0", "edge_type": "CONTAINS"},
            {"source": "conv", "target": "t1", "edge_type": "CONTAINS"},
            {"source": "conv", "target": "t2", "edge_type": "CONTAINS"},
            {"source": "t0", "target": "t1", "edge_type": "NEXT"},
            {"source": "t1", "target": "t2", "edge_type": "NEXT"},
            {"source": "t2", "target": "m1", "edge_type": "HAS_MOVE"},
            {"source": "t0", "target": "k1", "edge_type": "INTRODUCES"},
            {"source": "v1", "target": "k1", "edge_type": "VIOLATES"},
            {"source": "m1", "target": "v1", "edge_type": "REPAIRS"},
            {"source": "t2", "target": "ghost", "edge_type": "NEXT"}
        ]
    }"#;

    fn model() -> ViewModel {
        ViewModel::new(parse_graph(SCENARIO).unwrap(), None)
    }

    #[test]
    fn dangling_link_is_not_rendered() {
        let mut model = model();
        model.rebuild_render_graph();
        let cache = model.graph_cache.as_ref().unwrap();
        assert_eq!(cache.nodes.len(), 7);
        // Ten links in the document, one pointing at a missing node.
        assert_eq!(cache.edges.len(), 9);
    }

    #[test]
    fn hidden_type_removes_nodes_and_touching_links() {
        let mut model = model();
        model.toggle_filter(&NodeType::Move);
        model.rebuild_render_graph();
        let cache = model.graph_cache.as_ref().unwrap();

        assert!(cache.nodes.iter().all(|node| node.node_type != NodeType::Move));
        assert_eq!(cache.nodes.len(), 6);
        for edge in &cache.edges {
            let source = &model.graph.nodes[cache.nodes[edge.source].graph_index];
            let target = &model.graph.nodes[cache.nodes[edge.target].graph_index];
            assert!(model.filter.is_active(&source.node_type));
            assert!(model.filter.is_active(&target.node_type));
        }
        // HAS_MOVE and REPAIRS both touch the hidden move.
        assert_eq!(cache.edges.len(), 7);
        assert_eq!(model.graph.node_count(), 7);
    }

    #[test]
    fn every_visible_link_has_visible_endpoints() {
        let graph = parse_graph(SCENARIO).unwrap();
        let mut filter = FilterState::for_graph(&graph);
        filter.toggle(&NodeType::Turn);
        filter.toggle(&NodeType::Constraint);

        let (nodes, links) = visible_subgraph(&graph, &filter);
        assert!(nodes.iter().all(|&index| {
            let node_type = &graph.nodes[index].node_type;
            *node_type != NodeType::Turn && *node_type != NodeType::Constraint
        }));
        for link in links {
            let link = &graph.links[link];
            assert!(nodes.contains(&link.source) && nodes.contains(&link.target));
        }
    }

    #[test]
    fn sequence_indices_borrow_from_linked_turns() {
        let graph = parse_graph(SCENARIO).unwrap();
        let sequence = sequence_indices(&graph);
        let at = |id: &str| sequence[graph.index_by_id[id]];
        assert_eq!(at("t2"), 2);
        assert_eq!(at("m1"), 2);
        assert_eq!(at("k1"), 0);
        assert_eq!(at("v1"), 1);
        assert_eq!(at("conv"), 0);
    }
}

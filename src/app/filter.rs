use std::collections::BTreeSet;

use crate::atlas::{AtlasGraph, NodeType};

pub(in crate::app) struct FilterState {
    available: Vec<NodeType>,
    active: BTreeSet<NodeType>,
}

impl FilterState {
    pub(in crate::app) fn for_graph(graph: &AtlasGraph) -> Self {
        let mut available = NodeType::KNOWN.to_vec();
        for node_type in graph.node_types() {
            if !available.contains(&node_type) {
                available.push(node_type);
            }
        }
        let active = available.iter().cloned().collect();
        Self { available, active }
    }

    pub(in crate::app) fn available(&self) -> &[NodeType] {
        &self.available
    }

    pub(in crate::app) fn is_active(&self, node_type: &NodeType) -> bool {
        self.active.contains(node_type)
    }

    pub(in crate::app) fn toggle(&mut self, node_type: &NodeType) -> bool {
        if self.active.remove(node_type) {
            false
        } else {
            self.active.insert(node_type.clone());
            true
        }
    }

    pub(in crate::app) fn active_count(&self) -> usize {
        self.active.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atlas::parse_graph;

    #[test]
    fn starts_with_known_and_present_types_enabled() {
        let graph = parse_graph(
            r#"{"nodes": [
                {"id": "c", "node_type": "Conversation"},
                {"id": "x", "node_type": "Annotation"}
            ], "links": []}"#,
        )
        .unwrap();
        let filter = FilterState::for_graph(&graph);

        assert_eq!(filter.available().len(), NodeType::KNOWN.len() + 1);
        for node_type in filter.available() {
            assert!(filter.is_active(node_type), "{node_type}");
        }
        assert!(filter.is_active(&NodeType::Unknown("Annotation".to_owned())));
    }

    #[test]
    fn toggle_round_trips() {
        let mut filter = FilterState::for_graph(&AtlasGraph::default());
        let before = filter.active_count();

        assert!(!filter.toggle(&NodeType::Move));
        assert!(!filter.is_active(&NodeType::Move));
        assert_eq!(filter.active_count(), before - 1);

        assert!(filter.toggle(&NodeType::Move));
        assert!(filter.is_active(&NodeType::Move));
        assert_eq!(filter.active_count(), before);
    }
}

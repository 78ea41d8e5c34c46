use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use super::graph::{AtlasGraph, EdgeType, NodeType};

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SummaryStats {
    pub turns: usize,
    pub constraints: usize,
    pub violations: usize,
    pub repair_moves: usize,
    pub survived_constraints: usize,
    pub drift_velocity: f64,
    pub survival_rate: f64,
    pub agency_tax: f64,
    pub repair_success_rate: f64,
    pub mode_violation_rate: f64,
    pub constraint_half_life: Option<f64>,
    pub mean_constraint_lifespan: f64,
    pub mode_entropy: f64,
    pub move_coverage: f64,
    pub node_type_counts: BTreeMap<String, usize>,
    pub edge_type_counts: BTreeMap<String, usize>,
    pub dropped_links: usize,
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

fn median(mut values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    Some(if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    })
}

fn shannon_entropy<'a>(labels: impl IntoIterator<Item = &'a str>) -> f64 {
    let mut counts = BTreeMap::<&str, usize>::new();
    for label in labels {
        *counts.entry(label).or_default() += 1;
    }
    let total = counts.values().sum::<usize>();
    if total == 0 {
        return 0.0;
    }
    counts
        .values()
        .map(|&count| {
            let p = count as f64 / total as f64;
            -p * p.log2()
        })
        .sum::<f64>()
        .max(0.0)
}

/// Median distance in turns from a constraint's introduction to its earliest violation.
fn constraint_half_life(graph: &AtlasGraph) -> Option<f64> {
    let mut first_violation = HashMap::<usize, i64>::new();
    for link in &graph.links {
        if link.edge_type != EdgeType::Violates {
            continue;
        }
        let Some(turn_index) = graph.nodes[link.source].turn_index else {
            continue;
        };
        first_violation
            .entry(link.target)
            .and_modify(|earliest| *earliest = (*earliest).min(turn_index))
            .or_insert(turn_index);
    }

    let lifetimes = graph
        .nodes
        .iter()
        .enumerate()
        .filter(|(_, node)| node.node_type == NodeType::Constraint)
        .filter(|(_, node)| node.number("times_violated").unwrap_or(0.0) > 0.0)
        .filter_map(|(index, node)| {
            let violated_at = *first_violation.get(&index)? as f64;
            let lifetime = violated_at - node.number("introduced_at").unwrap_or(0.0);
            (lifetime >= 0.0).then_some(lifetime)
        })
        .collect::<Vec<_>>();
    median(lifetimes)
}

fn move_coverage(graph: &AtlasGraph) -> f64 {
    let mut covered = vec![false; graph.nodes.len()];
    for link in &graph.links {
        let (source, target) = (&graph.nodes[link.source], &graph.nodes[link.target]);
        if source.node_type == NodeType::Turn && target.node_type == NodeType::Move {
            covered[link.source] = true;
        }
        if target.node_type == NodeType::Turn && source.node_type == NodeType::Move {
            covered[link.target] = true;
        }
    }
    let turns = graph
        .nodes
        .iter()
        .enumerate()
        .filter(|(_, node)| node.node_type == NodeType::Turn)
        .collect::<Vec<_>>();
    let covered_turns = turns.iter().filter(|(index, _)| covered[*index]).count();
    ratio(covered_turns, turns.len())
}

impl SummaryStats {
    pub fn compute(graph: &AtlasGraph) -> Self {
        let mut stats = Self {
            dropped_links: graph.dropped_links,
            ..Self::default()
        };
        let mut constraint_violations = 0usize;
        let mut repaired_violations = 0usize;
        let mut lifespan_total = 0.0;
        let mut mode_nodes = 0usize;
        let mut mode_violations = 0usize;
        let mut requested_modes = Vec::new();

        for node in &graph.nodes {
            *stats
                .node_type_counts
                .entry(node.node_type.label().to_owned())
                .or_default() += 1;

            match node.node_type {
                NodeType::Turn => stats.turns += 1,
                NodeType::Constraint => {
                    stats.constraints += 1;
                    if node.has_survived() {
                        stats.survived_constraints += 1;
                    }
                    lifespan_total += node.number("lifespan").unwrap_or(0.0);
                }
                NodeType::ViolationEvent => {
                    stats.violations += 1;
                    // Mode violations are not repairable constraint breaches.
                    if node.text("violation_type") == Some("constraint_violation") {
                        constraint_violations += 1;
                        if node.flag("was_repaired") {
                            repaired_violations += 1;
                        }
                    }
                }
                NodeType::Move => {
                    let is_repair = node
                        .move_type
                        .as_deref()
                        .is_some_and(|move_type| move_type.to_ascii_uppercase().starts_with("REPAIR"));
                    if is_repair {
                        stats.repair_moves += 1;
                    }
                }
                NodeType::InteractionMode => {
                    mode_nodes += 1;
                    if node.flag("is_violation") {
                        mode_violations += 1;
                    }
                    requested_modes.push(node.text("user_requested").unwrap_or("AMBIGUOUS"));
                }
                NodeType::Conversation | NodeType::Unknown(_) => {}
            }
        }

        for link in &graph.links {
            *stats
                .edge_type_counts
                .entry(link.edge_type.label().to_owned())
                .or_default() += 1;
        }

        stats.drift_velocity = ratio(stats.violations, stats.turns);
        stats.survival_rate = ratio(stats.survived_constraints, stats.constraints);
        stats.agency_tax = ratio(stats.repair_moves, stats.violations);
        stats.repair_success_rate = ratio(repaired_violations, constraint_violations);
        stats.mode_violation_rate = ratio(mode_violations, mode_nodes);
        stats.constraint_half_life = constraint_half_life(graph);
        if stats.constraints > 0 {
            stats.mean_constraint_lifespan = lifespan_total / stats.constraints as f64;
        }
        stats.mode_entropy = shannon_entropy(requested_modes);
        stats.move_coverage = move_coverage(graph);
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atlas::parse_graph;

    #[test]
    fn drift_velocity_is_zero_without_turns() {
        let graph = parse_graph(
            r#"{"nodes": [{"id": "v", "node_type": "ViolationEvent"}], "links": []}"#,
        )
        .unwrap();
        let stats = SummaryStats::compute(&graph);
        assert_eq!(stats.turns, 0);
        assert_eq!(stats.violations, 1);
        assert_eq!(stats.drift_velocity, 0.0);
        assert!(!stats.drift_velocity.is_nan());
    }

    #[test]
    fn empty_graph_is_all_zero() {
        let stats = SummaryStats::compute(&AtlasGraph::default());
        assert_eq!(stats, SummaryStats::default());
    }

    #[test]
    fn counts_and_ratios() {
        let graph = parse_graph(
            r#"{"nodes": [
                {"id": "t0", "node_type": "Turn", "turn_index": 0},
                {"id": "t1", "node_type": "Turn", "turn_index": 1},
                {"id": "t2", "node_type": "Turn", "turn_index": 2},
                {"id": "t3", "node_type": "Turn", "turn_index": 3},
                {"id": "c0", "node_type": "Constraint", "current_state": "SURVIVED"},
                {"id": "c1", "node_type": "Constraint", "current_state": "ACTIVE"},
                {"id": "c2", "node_type": "Constraint", "current_state": "VIOLATED"},
                {"id": "v0", "node_type": "ViolationEvent", "violation_type": "constraint_violation", "was_repaired": true},
                {"id": "v1", "node_type": "ViolationEvent", "violation_type": "constraint_violation", "was_repaired": "False"},
                {"id": "m0", "node_type": "Move", "move_type": "REPAIR_INITIATE"},
                {"id": "m1", "node_type": "Move", "move_type": "repair_execute"},
                {"id": "m2", "node_type": "Move", "move_type": "STATE_CONSTRAINT"},
                {"id": "i0", "node_type": "InteractionMode", "is_violation": "True"},
                {"id": "i1", "node_type": "InteractionMode", "is_violation": false}
            ], "links": [
                {"source": "v0", "target": "c2", "edge_type": "VIOLATES"},
                {"source": "t0", "target": "t1", "edge_type": "NEXT"}
            ]}"#,
        )
        .unwrap();
        let stats = SummaryStats::compute(&graph);
        assert_eq!(stats.turns, 4);
        assert_eq!(stats.constraints, 3);
        assert_eq!(stats.survived_constraints, 2);
        assert_eq!(stats.violations, 2);
        assert_eq!(stats.repair_moves, 2);
        assert_eq!(stats.drift_velocity, 0.5);
        assert_eq!(stats.agency_tax, 1.0);
        assert_eq!(stats.repair_success_rate, 0.5);
        assert_eq!(stats.mode_violation_rate, 0.5);
        assert_eq!(stats.node_type_counts["Turn"], 4);
        assert_eq!(stats.edge_type_counts["VIOLATES"], 1);
    }

    #[test]
    fn recomputing_is_stable() {
        let graph = parse_graph(
            r#"{"nodes": [{"id": "t", "node_type": "Turn"}], "links": []}"#,
        )
        .unwrap();
        assert_eq!(SummaryStats::compute(&graph), SummaryStats::compute(&graph));
    }

    #[test]
    fn bundled_sample_graph() {
        let graph = parse_graph(include_str!("../../data/sample_conversation.json")).unwrap();
        let stats = SummaryStats::compute(&graph);
        assert_eq!(stats.turns, 4);
        assert_eq!(stats.constraints, 2);
        assert_eq!(stats.survived_constraints, 1);
        assert_eq!(stats.violations, 1);
        assert_eq!(stats.repair_moves, 1);
        assert_eq!(stats.drift_velocity, 0.25);
        assert_eq!(stats.survival_rate, 0.5);
        assert_eq!(stats.repair_success_rate, 1.0);
        assert_eq!(stats.mode_violation_rate, 0.5);
        assert_eq!(stats.constraint_half_life, Some(1.0));
        assert_eq!(stats.mean_constraint_lifespan, 3.5);
        assert_eq!(stats.mode_entropy, 1.0);
        assert_eq!(stats.move_coverage, 0.75);
        assert_eq!(stats.dropped_links, 1);
        assert_eq!(graph.edge_count(), 19);
    }

    #[test]
    fn repair_success_counts_constraint_violations_only() {
        let graph = parse_graph(
            r#"{"nodes": [
                {"id": "v0", "node_type": "ViolationEvent", "violation_type": "constraint_violation", "was_repaired": true},
                {"id": "v1", "node_type": "ViolationEvent", "violation_type": "mode_violation", "was_repaired": false}
            ], "links": []}"#,
        )
        .unwrap();
        let stats = SummaryStats::compute(&graph);
        assert_eq!(stats.violations, 2);
        assert_eq!(stats.repair_success_rate, 1.0);
    }

    #[test]
    fn repair_success_is_zero_without_constraint_violations() {
        let graph = parse_graph(
            r#"{"nodes": [
                {"id": "v", "node_type": "ViolationEvent", "violation_type": "mode_violation", "was_repaired": true}
            ], "links": []}"#,
        )
        .unwrap();
        assert_eq!(SummaryStats::compute(&graph).repair_success_rate, 0.0);
    }

    #[test]
    fn half_life_uses_earliest_violation_per_constraint() {
        let graph = parse_graph(
            r#"{"nodes": [
                {"id": "c0", "node_type": "Constraint", "introduced_at": 1, "times_violated": 2},
                {"id": "c1", "node_type": "Constraint", "introduced_at": 0, "times_violated": 1},
                {"id": "c2", "node_type": "Constraint", "introduced_at": 0, "times_violated": 0},
                {"id": "v0", "node_type": "ViolationEvent", "turn_index": 6},
                {"id": "v1", "node_type": "ViolationEvent", "turn_index": 4},
                {"id": "v2", "node_type": "ViolationEvent", "turn_index": 8},
                {"id": "v3", "node_type": "ViolationEvent", "turn_index": 2}
            ], "links": [
                {"source": "v0", "target": "c0", "edge_type": "VIOLATES"},
                {"source": "v1", "target": "c0", "edge_type": "VIOLATES"},
                {"source": "v2", "target": "c1", "edge_type": "VIOLATES"},
                {"source": "v3", "target": "c2", "edge_type": "VIOLATES"}
            ]}"#,
        )
        .unwrap();
        // c0: 4 - 1 = 3, c1: 8 - 0 = 8, c2 never counted as violated.
        assert_eq!(SummaryStats::compute(&graph).constraint_half_life, Some(5.5));
    }

    #[test]
    fn half_life_is_none_without_violations() {
        let graph = parse_graph(
            r#"{"nodes": [{"id": "c", "node_type": "Constraint", "times_violated": 1}], "links": []}"#,
        )
        .unwrap();
        assert_eq!(SummaryStats::compute(&graph).constraint_half_life, None);
    }

    #[test]
    fn lifespan_defaults_missing_values_to_zero() {
        let graph = parse_graph(
            r#"{"nodes": [
                {"id": "c0", "node_type": "Constraint", "lifespan": 6},
                {"id": "c1", "node_type": "Constraint"}
            ], "links": []}"#,
        )
        .unwrap();
        assert_eq!(SummaryStats::compute(&graph).mean_constraint_lifespan, 3.0);
        assert_eq!(
            SummaryStats::compute(&AtlasGraph::default()).mean_constraint_lifespan,
            0.0
        );
    }

    #[test]
    fn mode_entropy_over_requested_modes() {
        let uniform = parse_graph(
            r#"{"nodes": [
                {"id": "i0", "node_type": "InteractionMode", "user_requested": "ADVICE"},
                {"id": "i1", "node_type": "InteractionMode", "user_requested": "EXECUTION"},
                {"id": "i2", "node_type": "InteractionMode", "user_requested": "EMOTIONAL"},
                {"id": "i3", "node_type": "InteractionMode"}
            ], "links": []}"#,
        )
        .unwrap();
        assert!((SummaryStats::compute(&uniform).mode_entropy - 2.0).abs() < 1e-9);

        let single = parse_graph(
            r#"{"nodes": [
                {"id": "i0", "node_type": "InteractionMode", "user_requested": "ADVICE"},
                {"id": "i1", "node_type": "InteractionMode", "user_requested": "ADVICE"}
            ], "links": []}"#,
        )
        .unwrap();
        assert_eq!(SummaryStats::compute(&single).mode_entropy, 0.0);
    }

    #[test]
    fn move_coverage_checks_both_directions() {
        let graph = parse_graph(
            r#"{"nodes": [
                {"id": "t0", "node_type": "Turn", "turn_index": 0},
                {"id": "t1", "node_type": "Turn", "turn_index": 1},
                {"id": "t2", "node_type": "Turn", "turn_index": 2},
                {"id": "t3", "node_type": "Turn", "turn_index": 3},
                {"id": "m0", "node_type": "Move"},
                {"id": "m1", "node_type": "Move"}
            ], "links": [
                {"source": "t0", "target": "m0", "edge_type": "HAS_MOVE"},
                {"source": "m1", "target": "t1", "edge_type": "HAS_MOVE"},
                {"source": "t2", "target": "t3", "edge_type": "NEXT"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(SummaryStats::compute(&graph).move_coverage, 0.5);
        assert_eq!(SummaryStats::compute(&AtlasGraph::default()).move_coverage, 0.0);
    }
}

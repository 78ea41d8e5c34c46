mod forces;
mod quadtree;
mod simulation;

use std::f32::consts::{FRAC_PI_2, TAU};

use clap::ValueEnum;
use eframe::egui::{Vec2, vec2};

use crate::atlas::NodeType;

pub(in crate::app) use simulation::Simulation;

/// Gap kept between neighbouring ring members on top of their diameters.
pub(in crate::app) const RING_PADDING: f32 = 12.0;
pub(in crate::app) const RING_MIN_CLEARANCE: f32 = 140.0;
const MOVE_RING_OFFSET: f32 = 80.0;
const OUTER_RING_OFFSET: f32 = 160.0;

const TIMELINE_TOP_MARGIN: f32 = 80.0;
const TIMELINE_SPACING: f32 = 90.0;
const TIMELINE_COLUMN_OFFSET: f32 = 260.0;

const COLLIDE_PADDING: f32 = 4.0;
const COLLIDE_STRENGTH: f32 = 0.7;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LayoutMode {
    #[default]
    Force,
    Radial,
    Timeline,
    Hierarchical,
}

impl LayoutMode {
    pub const ALL: [LayoutMode; 4] = [
        LayoutMode::Force,
        LayoutMode::Radial,
        LayoutMode::Timeline,
        LayoutMode::Hierarchical,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Force => "Force",
            Self::Radial => "Radial",
            Self::Timeline => "Timeline",
            Self::Hierarchical => "Hierarchical",
        }
    }
}

#[derive(Clone, Debug)]
pub(in crate::app) struct LayoutNode {
    pub(in crate::app) node_type: NodeType,
    pub(in crate::app) sequence_index: i64,
    pub(in crate::app) radius: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(in crate::app) struct AxisPull {
    pub(in crate::app) target: f32,
    pub(in crate::app) strength: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(in crate::app) struct RadialPull {
    pub(in crate::app) radius: f32,
    pub(in crate::app) strength: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(in crate::app) struct Placement {
    pub(in crate::app) x: Option<AxisPull>,
    pub(in crate::app) y: Option<AxisPull>,
    pub(in crate::app) radial: Option<RadialPull>,
    pub(in crate::app) anchor: Option<Vec2>,
}

#[derive(Clone, Debug, PartialEq)]
pub(in crate::app) struct ForceSet {
    pub(in crate::app) charge: f32,
    pub(in crate::app) link_distance: f32,
    pub(in crate::app) link_strength: f32,
    pub(in crate::app) center_strength: f32,
    pub(in crate::app) collide_strength: f32,
    pub(in crate::app) collide_padding: f32,
    pub(in crate::app) placements: Vec<Placement>,
}

impl ForceSet {
    fn base(charge: f32, link_distance: f32, link_strength: f32, node_count: usize) -> Self {
        Self {
            charge,
            link_distance,
            link_strength,
            center_strength: 0.0,
            collide_strength: COLLIDE_STRENGTH,
            collide_padding: COLLIDE_PADDING,
            placements: vec![Placement::default(); node_count],
        }
    }
}

/// Ring radius large enough for `count` evenly spaced nodes of `node_radius` to sit
/// side by side with [`RING_PADDING`] between them.
pub(in crate::app) fn ring_radius(count: usize, node_radius: f32) -> f32 {
    let packing = (count as f32 * (node_radius * 2.0 + RING_PADDING)) / TAU;
    RING_MIN_CLEARANCE.max(packing)
}

fn pull(target: f32, strength: f32) -> Option<AxisPull> {
    Some(AxisPull { target, strength })
}

pub(in crate::app) fn configure_forces(
    mode: LayoutMode,
    dims: Vec2,
    nodes: &[LayoutNode],
) -> ForceSet {
    match mode {
        LayoutMode::Force => force_set(nodes),
        LayoutMode::Radial => radial_set(nodes),
        LayoutMode::Timeline => timeline_set(dims, nodes),
        LayoutMode::Hierarchical => hierarchical_set(dims, nodes),
    }
}

fn force_set(nodes: &[LayoutNode]) -> ForceSet {
    let mut set = ForceSet::base(300.0, 80.0, 0.6, nodes.len());
    set.center_strength = 1.0;
    set
}

fn radial_set(nodes: &[LayoutNode]) -> ForceSet {
    let root = nodes
        .iter()
        .position(|node| node.node_type == NodeType::Conversation);

    let mut turns = nodes
        .iter()
        .enumerate()
        .filter(|(_, node)| node.node_type == NodeType::Turn)
        .map(|(index, node)| (node.sequence_index, index))
        .collect::<Vec<_>>();

    if turns.is_empty() {
        let mut set = force_set(nodes);
        if let Some(root) = root {
            set.placements[root].anchor = Some(Vec2::ZERO);
        }
        return set;
    }

    turns.sort();
    let turn_radius = turns
        .iter()
        .map(|&(_, index)| nodes[index].radius)
        .fold(0.0_f32, f32::max);
    let ring = ring_radius(turns.len(), turn_radius);

    let mut set = ForceSet::base(120.0, 60.0, 0.1, nodes.len());
    for (index, node) in nodes.iter().enumerate() {
        let placement = &mut set.placements[index];
        if Some(index) == root {
            placement.anchor = Some(Vec2::ZERO);
            continue;
        }
        let (radius, strength) = match node.node_type {
            NodeType::Conversation => (0.0, 0.8),
            NodeType::Turn => (ring, 0.9),
            NodeType::Move => (ring + MOVE_RING_OFFSET, 0.7),
            _ => (ring + OUTER_RING_OFFSET, 0.7),
        };
        placement.radial = Some(RadialPull { radius, strength });
    }

    // Evenly spaced slots in sequence order, starting at twelve o'clock.
    let slot_angle = TAU / turns.len() as f32;
    for (rank, &(_, index)) in turns.iter().enumerate() {
        let angle = -FRAC_PI_2 + rank as f32 * slot_angle;
        let slot = vec2(angle.cos(), angle.sin()) * ring;
        let placement = &mut set.placements[index];
        placement.x = pull(slot.x, 0.3);
        placement.y = pull(slot.y, 0.3);
    }
    set
}

fn timeline_set(dims: Vec2, nodes: &[LayoutNode]) -> ForceSet {
    let column_offset = (dims.x * 0.25).min(TIMELINE_COLUMN_OFFSET);
    let top = -dims.y * 0.5 + TIMELINE_TOP_MARGIN;

    let mut set = ForceSet::base(30.0, 60.0, 0.05, nodes.len());
    for (placement, node) in set.placements.iter_mut().zip(nodes) {
        let column = match node.node_type {
            NodeType::Turn => 0.0,
            NodeType::Move => -column_offset,
            _ => column_offset,
        };
        placement.x = pull(column, 0.7);
        placement.y = pull(top + node.sequence_index as f32 * TIMELINE_SPACING, 0.7);
    }
    set
}

fn hierarchical_set(dims: Vec2, nodes: &[LayoutNode]) -> ForceSet {
    let mut set = ForceSet::base(200.0, 80.0, 0.3, nodes.len());
    for (placement, node) in set.placements.iter_mut().zip(nodes) {
        let band = match node.node_type {
            NodeType::Conversation => -0.35,
            NodeType::Turn => -0.05,
            _ => 0.25,
        };
        placement.x = pull(0.0, 0.05);
        placement.y = pull(dims.y * band, 0.6);
    }
    set
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(node_type: NodeType, sequence_index: i64) -> LayoutNode {
        LayoutNode {
            node_type,
            sequence_index,
            radius: 14.0,
        }
    }

    #[test]
    fn ring_circumference_fits_all_members() {
        let node_radius = 14.0;
        for count in [5usize, 50, 200] {
            let radius = ring_radius(count, node_radius);
            let circumference = TAU * radius;
            let required = count as f32 * (2.0 * node_radius + RING_PADDING);
            assert!(
                circumference >= required * (1.0 - 1e-5),
                "{count} nodes: circumference {circumference} < {required}"
            );
            assert!(radius >= RING_MIN_CLEARANCE);
        }
        assert!(ring_radius(200, node_radius) > ring_radius(50, node_radius));
        assert_eq!(ring_radius(5, node_radius), RING_MIN_CLEARANCE);
    }

    #[test]
    fn collision_is_present_in_every_mode() {
        let nodes = vec![node(NodeType::Conversation, 0), node(NodeType::Turn, 0)];
        for mode in LayoutMode::ALL {
            let set = configure_forces(mode, vec2(1000.0, 800.0), &nodes);
            assert!(set.collide_strength > 0.0, "{mode:?}");
            assert_eq!(set.placements.len(), nodes.len());
        }
    }

    #[test]
    fn radial_anchors_root_and_rings_turns() {
        let nodes = vec![
            node(NodeType::Conversation, 0),
            node(NodeType::Turn, 2),
            node(NodeType::Turn, 0),
            node(NodeType::Move, 0),
            node(NodeType::Constraint, 0),
        ];
        let set = configure_forces(LayoutMode::Radial, vec2(1000.0, 800.0), &nodes);
        assert_eq!(set.placements[0].anchor, Some(Vec2::ZERO));

        let ring = ring_radius(2, 14.0);
        assert_eq!(set.placements[1].radial.unwrap().radius, ring);
        assert_eq!(set.placements[3].radial.unwrap().radius, ring + MOVE_RING_OFFSET);
        assert_eq!(set.placements[4].radial.unwrap().radius, ring + OUTER_RING_OFFSET);

        // The lowest sequence index takes the top slot.
        let top = set.placements[2];
        assert!(top.x.unwrap().target.abs() < 1e-3);
        assert!((top.y.unwrap().target + ring).abs() < 1e-3);
        assert!(set.charge < force_set(&nodes).charge);
    }

    #[test]
    fn radial_without_turns_falls_back_to_force_placement() {
        let nodes = vec![node(NodeType::Conversation, 0), node(NodeType::Constraint, 0)];
        let set = configure_forces(LayoutMode::Radial, vec2(1000.0, 800.0), &nodes);
        assert_eq!(set.charge, force_set(&nodes).charge);
        assert_eq!(set.placements[0].anchor, Some(Vec2::ZERO));
        assert!(set.placements[1].radial.is_none());
    }

    #[test]
    fn timeline_columns_and_rows() {
        let nodes = vec![
            node(NodeType::Turn, 3),
            node(NodeType::Move, 3),
            node(NodeType::Constraint, 1),
        ];
        let dims = vec2(1200.0, 900.0);
        let set = configure_forces(LayoutMode::Timeline, dims, &nodes);
        let x = |index: usize| set.placements[index].x.unwrap().target;
        let y = |index: usize| set.placements[index].y.unwrap().target;
        assert_eq!(x(0), 0.0);
        assert!(x(1) < 0.0);
        assert!(x(2) > 0.0);
        assert_eq!(y(0), y(1));
        assert_eq!(y(0) - y(2), 2.0 * TIMELINE_SPACING);
    }

    #[test]
    fn hierarchical_bands_are_ordered() {
        let nodes = vec![
            node(NodeType::Conversation, 0),
            node(NodeType::Turn, 0),
            node(NodeType::ViolationEvent, 0),
        ];
        let set = configure_forces(LayoutMode::Hierarchical, vec2(1000.0, 800.0), &nodes);
        let y = |index: usize| set.placements[index].y.unwrap().target;
        assert!(y(0) < y(1));
        assert!(y(1) < y(2));
        assert!(set.placements[0].x.unwrap().strength < 0.1);
    }
}

use eframe::egui::{Vec2, vec2};

use super::quadtree::QuadNode;

// Squared distance below which many-body repulsion stops growing.
const MIN_DISTANCE_SQ: f32 = 1.0;

/// Deterministic unit direction for bodies sitting on top of each other.
pub(super) fn jiggle(from: usize, to: usize) -> Vec2 {
    let angle = ((from as f32) * 0.618_034 + (to as f32) * 0.414_214) * std::f32::consts::TAU;
    vec2(angle.cos(), angle.sin()) * 1e-3
}

#[derive(Clone, Copy)]
pub(super) struct RepulsionParams {
    pub(super) strength: f32,
    pub(super) theta: f32,
}

fn charge_from(point: Vec2, source: Vec2, weight: f32, strength: f32, index: usize, other: usize) -> Vec2 {
    let mut delta = point - source;
    if delta.length_sq() == 0.0 {
        delta = jiggle(index, other);
    }
    let distance_sq = delta.length_sq().max(MIN_DISTANCE_SQ);
    delta * (strength * weight / distance_sq)
}

pub(super) fn accumulate_repulsion_for_node(
    node: &QuadNode,
    index: usize,
    positions: &[Vec2],
    params: RepulsionParams,
    force: &mut Vec2,
) {
    if node.mass <= 0.0 {
        return;
    }

    let point = positions[index];

    if node.is_leaf() {
        for &other_index in &node.indices {
            if other_index == index {
                continue;
            }
            *force += charge_from(
                point,
                positions[other_index],
                1.0,
                params.strength,
                index,
                other_index,
            );
        }
        return;
    }

    let distance = (point - node.center_of_mass).length().max(1e-3);
    let can_approximate = !node.bounds.contains(point)
        && (node.bounds.side_length() / distance) < params.theta
        && node.mass > 1.0;

    if can_approximate {
        *force += charge_from(
            point,
            node.center_of_mass,
            node.mass,
            params.strength,
            index,
            usize::MAX,
        );
        return;
    }

    for child in node.children.iter().flatten() {
        accumulate_repulsion_for_node(child, index, positions, params, force);
    }
}

#[derive(Clone, Copy)]
pub(super) struct CollisionParams {
    pub(super) strength: f32,
    pub(super) max_distance_sq: f32,
}

fn resolve_overlap(
    from: usize,
    to: usize,
    positions: &[Vec2],
    radii: &[f32],
    strength: f32,
    nudges: &mut [Vec2],
) {
    let reach = radii[from] + radii[to];
    let mut delta = positions[from] - positions[to];
    if delta.length_sq() == 0.0 {
        delta = jiggle(from, to);
    }
    let distance = delta.length();
    if distance >= reach {
        return;
    }

    let push = delta * ((reach - distance) / distance * strength);
    let from_area = radii[from] * radii[from];
    let to_area = radii[to] * radii[to];
    let total = (from_area + to_area).max(f32::EPSILON);
    // Smaller bodies give way to larger ones.
    nudges[from] += push * (to_area / total);
    nudges[to] -= push * (from_area / total);
}

pub(super) fn accumulate_collision_pairs(
    node_a: &QuadNode,
    node_b: &QuadNode,
    same_node: bool,
    positions: &[Vec2],
    radii: &[f32],
    params: CollisionParams,
    nudges: &mut [Vec2],
) {
    if node_a.bounds.distance_sq_to(node_b.bounds) > params.max_distance_sq {
        return;
    }

    if node_a.is_leaf() && node_b.is_leaf() {
        if same_node {
            for (offset, &from) in node_a.indices.iter().enumerate() {
                for &to in &node_a.indices[offset + 1..] {
                    resolve_overlap(from, to, positions, radii, params.strength, nudges);
                }
            }
        } else {
            for &from in &node_a.indices {
                for &to in &node_b.indices {
                    resolve_overlap(from, to, positions, radii, params.strength, nudges);
                }
            }
        }
        return;
    }

    if same_node {
        for first in 0..4 {
            let Some(child_a) = node_a.children[first].as_deref() else {
                continue;
            };

            accumulate_collision_pairs(child_a, child_a, true, positions, radii, params, nudges);

            for second in (first + 1)..4 {
                let Some(child_b) = node_a.children[second].as_deref() else {
                    continue;
                };
                accumulate_collision_pairs(child_a, child_b, false, positions, radii, params, nudges);
            }
        }
        return;
    }

    let split_a = if node_a.is_leaf() {
        false
    } else if node_b.is_leaf() {
        true
    } else {
        node_a.bounds.half_extent >= node_b.bounds.half_extent
    };

    if split_a {
        for child in node_a.children.iter().flatten() {
            accumulate_collision_pairs(child, node_b, false, positions, radii, params, nudges);
        }
    } else {
        for child in node_b.children.iter().flatten() {
            accumulate_collision_pairs(node_a, child, false, positions, radii, params, nudges);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repulsion_pushes_apart() {
        let positions = vec![vec2(-10.0, 0.0), vec2(10.0, 0.0)];
        let tree = QuadNode::build(&positions).unwrap();
        let params = RepulsionParams {
            strength: 100.0,
            theta: 0.9,
        };
        let mut left = Vec2::ZERO;
        let mut right = Vec2::ZERO;
        accumulate_repulsion_for_node(&tree, 0, &positions, params, &mut left);
        accumulate_repulsion_for_node(&tree, 1, &positions, params, &mut right);
        assert!(left.x < 0.0);
        assert!(right.x > 0.0);
        assert!((left.x + right.x).abs() < 1e-4);
    }

    #[test]
    fn overlapping_bodies_separate_and_distant_ones_do_not() {
        let positions = vec![vec2(0.0, 0.0), vec2(5.0, 0.0), vec2(500.0, 0.0)];
        let radii = vec![10.0, 10.0, 10.0];
        let tree = QuadNode::build(&positions).unwrap();
        let mut nudges = vec![Vec2::ZERO; 3];
        accumulate_collision_pairs(
            &tree,
            &tree,
            true,
            &positions,
            &radii,
            CollisionParams {
                strength: 0.7,
                max_distance_sq: 400.0,
            },
            &mut nudges,
        );
        assert!(nudges[0].x < 0.0);
        assert!(nudges[1].x > 0.0);
        assert_eq!(nudges[2], Vec2::ZERO);
    }
}

use eframe::egui::{Vec2, vec2};

use super::forces::{
    CollisionParams, RepulsionParams, accumulate_collision_pairs, accumulate_repulsion_for_node,
    jiggle,
};
use super::quadtree::QuadNode;
use super::{ForceSet, LayoutMode, LayoutNode, configure_forces};

const ALPHA_MIN: f32 = 0.001;
const VELOCITY_DECAY: f32 = 0.4;
const BARNES_HUT_THETA: f32 = 0.9;
const INITIAL_RADIUS: f32 = 10.0;
const REHEAT_ALPHA: f32 = 1.0;

// `1 - ALPHA_MIN^(1/300)`: cools from 1 to `ALPHA_MIN` in roughly 300 steps.
fn alpha_decay() -> f32 {
    1.0 - ALPHA_MIN.powf(1.0 / 300.0)
}

#[derive(Clone, Copy, Debug)]
struct Body {
    position: Vec2,
    velocity: Vec2,
    pin: Option<Vec2>,
}

#[derive(Clone, Copy, Debug)]
struct Spring {
    from: usize,
    to: usize,
    bias: f32,
    scale: f32,
}

pub(in crate::app) struct Simulation {
    mode: LayoutMode,
    dims: Vec2,
    profiles: Vec<LayoutNode>,
    bodies: Vec<Body>,
    springs: Vec<Spring>,
    forces: ForceSet,
    alpha: f32,
    alpha_target: f32,
    scratch: Scratch,
}

#[derive(Default)]
struct Scratch {
    positions: Vec<Vec2>,
    radii: Vec<f32>,
    deltas: Vec<Vec2>,
}

impl Simulation {
    pub(in crate::app) fn new(
        profiles: Vec<LayoutNode>,
        edges: &[(usize, usize)],
        mode: LayoutMode,
        dims: Vec2,
    ) -> Self {
        let golden_angle = std::f32::consts::PI * (3.0 - 5.0_f32.sqrt());
        let bodies = (0..profiles.len())
            .map(|index| {
                let radius = INITIAL_RADIUS * (0.5 + index as f32).sqrt();
                let angle = index as f32 * golden_angle;
                Body {
                    position: vec2(angle.cos(), angle.sin()) * radius,
                    velocity: Vec2::ZERO,
                    pin: None,
                }
            })
            .collect::<Vec<_>>();

        let mut degree = vec![0usize; profiles.len()];
        let edges = edges
            .iter()
            .copied()
            .filter(|&(from, to)| from != to && from < profiles.len() && to < profiles.len())
            .collect::<Vec<_>>();
        for &(from, to) in &edges {
            degree[from] += 1;
            degree[to] += 1;
        }
        let springs = edges
            .into_iter()
            .map(|(from, to)| Spring {
                from,
                to,
                bias: degree[from] as f32 / (degree[from] + degree[to]) as f32,
                scale: 1.0 / degree[from].min(degree[to]) as f32,
            })
            .collect();

        let forces = configure_forces(mode, dims, &profiles);
        Self {
            mode,
            dims,
            profiles,
            bodies,
            springs,
            forces,
            alpha: 1.0,
            alpha_target: 0.0,
            scratch: Scratch::default(),
        }
    }

    pub(in crate::app) fn mode(&self) -> LayoutMode {
        self.mode
    }

    pub(in crate::app) fn alpha(&self) -> f32 {
        self.alpha
    }

    pub(in crate::app) fn position(&self, index: usize) -> Vec2 {
        self.bodies[index].position
    }

    pub(in crate::app) fn is_active(&self) -> bool {
        !self.bodies.is_empty() && (self.alpha >= ALPHA_MIN || self.alpha_target >= ALPHA_MIN)
    }

    pub(in crate::app) fn set_mode(&mut self, mode: LayoutMode) {
        self.mode = mode;
        self.forces = configure_forces(mode, self.dims, &self.profiles);
        self.alpha = REHEAT_ALPHA;
    }

    pub(in crate::app) fn resize(&mut self, dims: Vec2) {
        if (dims - self.dims).length_sq() < 1.0 {
            return;
        }
        self.dims = dims;
        self.forces = configure_forces(self.mode, dims, &self.profiles);
        if matches!(self.mode, LayoutMode::Timeline | LayoutMode::Hierarchical) {
            self.alpha = self.alpha.max(0.3);
        }
    }

    pub(in crate::app) fn pin(&mut self, index: usize, position: Vec2) {
        if let Some(body) = self.bodies.get_mut(index) {
            body.pin = Some(position);
            body.position = position;
            body.velocity = Vec2::ZERO;
        }
    }

    pub(in crate::app) fn release(&mut self, index: usize) {
        if let Some(body) = self.bodies.get_mut(index) {
            body.pin = None;
        }
    }

    pub(in crate::app) fn is_pinned(&self, index: usize) -> bool {
        self.bodies.get(index).is_some_and(|body| body.pin.is_some())
    }

    pub(in crate::app) fn set_alpha_target(&mut self, target: f32) {
        self.alpha_target = target.clamp(0.0, 1.0);
    }

    pub(in crate::app) fn step(&mut self) -> bool {
        if !self.is_active() {
            return false;
        }

        self.alpha += (self.alpha_target - self.alpha) * alpha_decay();
        let alpha = self.alpha;

        self.apply_springs(alpha);
        self.apply_repulsion(alpha);
        self.apply_centering();
        self.apply_placements(alpha);
        self.apply_collisions();

        let retain = 1.0 - VELOCITY_DECAY;
        for (body, placement) in self.bodies.iter_mut().zip(&self.forces.placements) {
            if let Some(fixed) = body.pin.or(placement.anchor) {
                body.position = fixed;
                body.velocity = Vec2::ZERO;
            } else {
                body.velocity *= retain;
                body.position += body.velocity;
            }
        }

        self.is_active()
    }

    fn apply_springs(&mut self, alpha: f32) {
        let strength = self.forces.link_strength * alpha;
        if strength <= 0.0 {
            return;
        }
        let rest = self.forces.link_distance;

        for spring in &self.springs {
            let source = self.bodies[spring.from];
            let target = self.bodies[spring.to];
            let mut delta =
                (target.position + target.velocity) - (source.position + source.velocity);
            if delta.length_sq() == 0.0 {
                delta = jiggle(spring.from, spring.to);
            }
            let length = delta.length();
            let correction = delta * ((length - rest) / length * strength * spring.scale);
            self.bodies[spring.to].velocity -= correction * spring.bias;
            self.bodies[spring.from].velocity += correction * (1.0 - spring.bias);
        }
    }

    fn apply_repulsion(&mut self, alpha: f32) {
        let strength = self.forces.charge * alpha;
        if strength <= 0.0 || self.bodies.len() < 2 {
            return;
        }

        let scratch = &mut self.scratch;
        scratch.positions.clear();
        scratch
            .positions
            .extend(self.bodies.iter().map(|body| body.position));

        let Some(tree) = QuadNode::build(&scratch.positions) else {
            return;
        };
        let params = RepulsionParams {
            strength,
            theta: BARNES_HUT_THETA,
        };
        for (index, body) in self.bodies.iter_mut().enumerate() {
            let mut force = Vec2::ZERO;
            accumulate_repulsion_for_node(&tree, index, &scratch.positions, params, &mut force);
            body.velocity += force;
        }
    }

    fn apply_centering(&mut self) {
        let strength = self.forces.center_strength;
        if strength <= 0.0 || self.bodies.is_empty() {
            return;
        }

        let centroid = self
            .bodies
            .iter()
            .fold(Vec2::ZERO, |sum, body| sum + body.position)
            / self.bodies.len() as f32;
        let shift = centroid * strength;
        for body in &mut self.bodies {
            body.position -= shift;
        }
    }

    fn apply_placements(&mut self, alpha: f32) {
        for (body, placement) in self.bodies.iter_mut().zip(&self.forces.placements) {
            if let Some(pull) = placement.x {
                body.velocity.x += (pull.target - body.position.x) * pull.strength * alpha;
            }
            if let Some(pull) = placement.y {
                body.velocity.y += (pull.target - body.position.y) * pull.strength * alpha;
            }
            if let Some(pull) = placement.radial {
                let mut offset = body.position;
                if offset.length_sq() == 0.0 {
                    offset = vec2(1e-6, 0.0);
                }
                let distance = offset.length();
                let k = (pull.radius - distance) * pull.strength * alpha / distance;
                body.velocity += offset * k;
            }
        }
    }

    fn apply_collisions(&mut self) {
        let strength = self.forces.collide_strength;
        if strength <= 0.0 || self.bodies.len() < 2 {
            return;
        }

        let padding = self.forces.collide_padding;
        let scratch = &mut self.scratch;
        scratch.positions.clear();
        scratch
            .positions
            .extend(self.bodies.iter().map(|body| body.position + body.velocity));
        scratch.radii.clear();
        scratch
            .radii
            .extend(self.profiles.iter().map(|profile| profile.radius + padding));
        scratch.deltas.clear();
        scratch.deltas.resize(self.bodies.len(), Vec2::ZERO);

        let Some(tree) = QuadNode::build(&scratch.positions) else {
            return;
        };
        let max_reach = scratch.radii.iter().copied().fold(0.0_f32, f32::max) * 2.0;
        accumulate_collision_pairs(
            &tree,
            &tree,
            true,
            &scratch.positions,
            &scratch.radii,
            CollisionParams {
                strength,
                max_distance_sq: max_reach * max_reach,
            },
            &mut scratch.deltas,
        );

        for (body, delta) in self.bodies.iter_mut().zip(&scratch.deltas) {
            body.velocity += *delta;
        }
    }
}

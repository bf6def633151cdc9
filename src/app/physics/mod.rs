mod controller;
mod forces;
mod quadtree;

use std::f32::consts::PI;

use eframe::egui::{Vec2, vec2};

use crate::util::stable_pair;

use super::present::{clamp_scale, collision_radius};

use forces::{
    ChargeParams, CollisionParams, LinkParams, accumulate_charge, accumulate_collisions,
    apply_links, apply_position_springs, recenter,
};
use quadtree::QuadNode;

pub(in crate::app) use controller::SimulationController;

pub(in crate::app) const ALPHA_MIN: f32 = 0.001;
/// Heat injected when a continuous parameter changes.
pub(in crate::app) const NUDGE_ALPHA: f32 = 0.3;
/// Heat the simulation is held at while a node is dragged.
pub(in crate::app) const DRAG_ALPHA_TARGET: f32 = 0.3;
pub(in crate::app) const COLLISION_PADDING: f32 = 20.0;
pub(in crate::app) const SPACING_RANGE: std::ops::RangeInclusive<f32> = 30.0..=300.0;

const ALPHA_DECAY_TICKS: f32 = 300.0;
const VELOCITY_DECAY: f32 = 0.4;
const LINK_STRENGTH: f32 = 0.5;
const CHARGE_STRENGTH: f32 = -300.0;
const CHARGE_DISTANCE_MIN: f32 = 10.0;
const CHARGE_DISTANCE_MAX: f32 = 600.0;
const BARNES_HUT_THETA: f32 = 0.9;
const COLLISION_STRENGTH: f32 = 0.7;
const POSITION_STRENGTH: f32 = 0.05;
const CENTER_STRENGTH: f32 = 1.0;
const SEED_RADIUS: f32 = 10.0;
const SEED_SPEED: f32 = 1.5;
const RELEASE_COOLDOWN_TICKS: u16 = 60;

/// Parameters the user can change without rebuilding the simulation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(in crate::app) struct LayoutParams {
    pub link_distance: f32,
    pub node_scale: f32,
}

impl LayoutParams {
    pub(in crate::app) fn clamped(self) -> Self {
        Self {
            link_distance: self
                .link_distance
                .clamp(*SPACING_RANGE.start(), *SPACING_RANGE.end()),
            node_scale: clamp_scale(self.node_scale),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(in crate::app) enum PinState {
    Free,
    /// Held under the pointer; forces still act on its neighbours.
    Dragging { pin: Vec2 },
    /// Just let go; cools down under the normal velocity decay.
    Released { ticks_left: u16 },
}

#[derive(Clone, Debug)]
pub(in crate::app) struct SimNode {
    pub position: Vec2,
    pub velocity: Vec2,
    /// Radius at scale 1.0; the rendered and collision radii derive from it.
    pub base_radius: f32,
    pub pin: PinState,
}

/// Phyllotaxis seed so fresh layouts start compact and evenly spread.
fn seed_position(index: usize) -> Vec2 {
    let radius = SEED_RADIUS * (0.5 + index as f32).sqrt();
    let angle = index as f32 * PI * (3.0 - 5.0_f32.sqrt());
    vec2(angle.cos(), angle.sin()) * radius
}

fn seed_velocity(id: &str, index: usize) -> Vec2 {
    let (jx, jy) = stable_pair(id);
    let direction = vec2(jx, jy);
    if direction.length_sq() <= 0.0001 {
        let angle = ((index as f32) * 0.618_034 + 0.11) * std::f32::consts::TAU;
        return vec2(angle.cos(), angle.sin()) * SEED_SPEED;
    }
    direction.normalized() * SEED_SPEED
}

pub(in crate::app) struct Simulation {
    nodes: Vec<SimNode>,
    links: Vec<(usize, usize)>,
    link_bias: Vec<f32>,
    params: LayoutParams,
    alpha: f32,
    alpha_target: f32,
    alpha_decay: f32,
    scratch: Scratch,
}

#[derive(Default)]
struct Scratch {
    positions: Vec<Vec2>,
    velocities: Vec<Vec2>,
    radii: Vec<f32>,
    deltas: Vec<Vec2>,
}

impl Simulation {
    /// Fresh simulation; `seeds` pairs each node id with its radius at scale 1.0.
    pub(in crate::app) fn new(
        seeds: &[(&str, f32)],
        links: &[(usize, usize)],
        params: LayoutParams,
    ) -> Self {
        let nodes = seeds
            .iter()
            .enumerate()
            .map(|(index, (id, base_radius))| SimNode {
                position: seed_position(index),
                velocity: seed_velocity(id, index),
                base_radius: *base_radius,
                pin: PinState::Free,
            })
            .collect::<Vec<_>>();

        let links = links
            .iter()
            .copied()
            .filter(|&(source, target)| {
                source != target && source < nodes.len() && target < nodes.len()
            })
            .collect::<Vec<_>>();

        let mut degree = vec![0usize; nodes.len()];
        for &(source, target) in &links {
            degree[source] += 1;
            degree[target] += 1;
        }
        let link_bias = links
            .iter()
            .map(|&(source, target)| {
                degree[source] as f32 / (degree[source] + degree[target]) as f32
            })
            .collect();

        Self {
            nodes,
            links,
            link_bias,
            params: params.clamped(),
            alpha: 1.0,
            alpha_target: 0.0,
            alpha_decay: 1.0 - ALPHA_MIN.powf(1.0 / ALPHA_DECAY_TICKS),
            scratch: Scratch::default(),
        }
    }

    pub(in crate::app) fn nodes(&self) -> &[SimNode] {
        &self.nodes
    }

    pub(in crate::app) fn params(&self) -> LayoutParams {
        self.params
    }

    pub(in crate::app) fn alpha(&self) -> f32 {
        self.alpha
    }

    pub(in crate::app) fn alpha_target(&self) -> f32 {
        self.alpha_target
    }

    pub(in crate::app) fn set_alpha_target(&mut self, target: f32) {
        self.alpha_target = target.clamp(0.0, 1.0);
    }

    /// Raises the heat without touching positions or velocities.
    pub(in crate::app) fn nudge(&mut self, alpha: f32) {
        self.alpha = self.alpha.max(alpha.clamp(0.0, 1.0));
    }

    pub(in crate::app) fn set_params(&mut self, params: LayoutParams) {
        self.params = params.clamped();
    }

    pub(in crate::app) fn rendered_radius(&self, index: usize) -> f32 {
        self.nodes
            .get(index)
            .map_or(0.0, |node| node.base_radius * self.params.node_scale)
    }

    pub(in crate::app) fn collision_radius(&self, index: usize) -> f32 {
        collision_radius(self.rendered_radius(index))
    }

    pub(in crate::app) fn is_settled(&self) -> bool {
        self.alpha < ALPHA_MIN && self.alpha_target < ALPHA_MIN
    }

    pub(in crate::app) fn pin(&mut self, index: usize, position: Vec2) {
        if let Some(node) = self.nodes.get_mut(index) {
            node.pin = PinState::Dragging { pin: position };
            node.position = position;
            node.velocity = Vec2::ZERO;
        }
    }

    pub(in crate::app) fn release(&mut self, index: usize) {
        if let Some(node) = self.nodes.get_mut(index)
            && matches!(node.pin, PinState::Dragging { .. })
        {
            node.pin = PinState::Released {
                ticks_left: RELEASE_COOLDOWN_TICKS,
            };
        }
    }

    /// Advances one frame. Returns `false` once the layout has cooled down.
    pub(in crate::app) fn tick(&mut self) -> bool {
        if self.nodes.is_empty() || self.is_settled() {
            return false;
        }

        self.alpha += (self.alpha_target - self.alpha) * self.alpha_decay;
        let alpha = self.alpha;
        let node_count = self.nodes.len();

        let scratch = &mut self.scratch;
        scratch.positions.clear();
        scratch.velocities.clear();
        scratch.radii.clear();
        for node in &self.nodes {
            scratch.positions.push(node.position);
            scratch.velocities.push(node.velocity);
            scratch
                .radii
                .push(collision_radius(node.base_radius * self.params.node_scale));
        }

        apply_links(
            &scratch.positions,
            &mut scratch.velocities,
            &self.links,
            &self.link_bias,
            LinkParams {
                distance: self.params.link_distance,
                strength: LINK_STRENGTH,
            },
            alpha,
        );

        if let Some(tree) = QuadNode::build(&scratch.positions, &scratch.radii) {
            let charge = ChargeParams {
                strength: CHARGE_STRENGTH,
                distance_min_sq: CHARGE_DISTANCE_MIN * CHARGE_DISTANCE_MIN,
                distance_max_sq: CHARGE_DISTANCE_MAX * CHARGE_DISTANCE_MAX,
                theta_sq: BARNES_HUT_THETA * BARNES_HUT_THETA,
            };
            for index in 0..node_count {
                let mut velocity = scratch.velocities[index];
                accumulate_charge(
                    &tree,
                    index,
                    &scratch.positions,
                    charge,
                    alpha,
                    &mut velocity,
                );
                scratch.velocities[index] = velocity;
            }
        }

        recenter(&mut scratch.positions, Vec2::ZERO, CENTER_STRENGTH);

        let predicted = scratch
            .positions
            .iter()
            .zip(&scratch.velocities)
            .map(|(position, velocity)| *position + *velocity)
            .collect::<Vec<_>>();
        if let Some(tree) = QuadNode::build(&predicted, &scratch.radii) {
            scratch.deltas.clear();
            scratch.deltas.resize(node_count, Vec2::ZERO);
            accumulate_collisions(
                &tree,
                &tree,
                true,
                &predicted,
                &scratch.radii,
                CollisionParams {
                    strength: COLLISION_STRENGTH,
                },
                &mut scratch.deltas,
            );
            for (velocity, delta) in scratch.velocities.iter_mut().zip(&scratch.deltas) {
                *velocity += *delta;
            }
        }

        apply_position_springs(
            &scratch.positions,
            &mut scratch.velocities,
            Vec2::ZERO,
            POSITION_STRENGTH,
            alpha,
        );

        for (index, node) in self.nodes.iter_mut().enumerate() {
            match node.pin {
                PinState::Dragging { pin } => {
                    node.position = pin;
                    node.velocity = Vec2::ZERO;
                }
                PinState::Free | PinState::Released { .. } => {
                    node.velocity = scratch.velocities[index] * (1.0 - VELOCITY_DECAY);
                    node.position = scratch.positions[index] + node.velocity;
                }
            }

            if let PinState::Released { ticks_left } = node.pin {
                node.pin = match ticks_left.checked_sub(1) {
                    Some(0) | None => PinState::Free,
                    Some(left) => PinState::Released { ticks_left: left },
                };
            }
        }

        true
    }
}

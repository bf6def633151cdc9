use std::f32::consts::TAU;

use eframe::egui::{Vec2, vec2};

use super::quadtree::QuadNode;

const COINCIDENT_EPSILON_SQ: f32 = 1e-9;

/// Tiny deterministic offset used when two points coincide.
fn jiggle(seed: usize) -> Vec2 {
    let angle = ((seed as f32) * 0.618_034 + 0.11) * TAU;
    vec2(angle.cos(), angle.sin()) * 1e-3
}

#[derive(Clone, Copy)]
pub(super) struct LinkParams {
    pub(super) distance: f32,
    pub(super) strength: f32,
}

/// Spring toward `params.distance`, shared between endpoints by degree so
/// hubs move less than leaves.
pub(super) fn apply_links(
    positions: &[Vec2],
    velocities: &mut [Vec2],
    links: &[(usize, usize)],
    bias: &[f32],
    params: LinkParams,
    alpha: f32,
) {
    for (link_index, &(source, target)) in links.iter().enumerate() {
        let mut delta =
            (positions[target] + velocities[target]) - (positions[source] + velocities[source]);
        if delta.length_sq() < COINCIDENT_EPSILON_SQ {
            delta = jiggle(link_index);
        }

        let length = delta.length();
        let correction = delta * ((length - params.distance) / length * alpha * params.strength);
        let target_share = bias.get(link_index).copied().unwrap_or(0.5);

        velocities[target] -= correction * target_share;
        velocities[source] += correction * (1.0 - target_share);
    }
}

#[derive(Clone, Copy)]
pub(super) struct ChargeParams {
    /// Negative values repel.
    pub(super) strength: f32,
    pub(super) distance_min_sq: f32,
    pub(super) distance_max_sq: f32,
    pub(super) theta_sq: f32,
}

fn charge_from(delta: Vec2, weight: f32, params: ChargeParams, seed: usize) -> Vec2 {
    let mut delta = delta;
    let mut distance_sq = delta.length_sq();
    if distance_sq >= params.distance_max_sq {
        return Vec2::ZERO;
    }
    if distance_sq < COINCIDENT_EPSILON_SQ {
        delta = jiggle(seed);
        distance_sq = delta.length_sq();
    }
    if distance_sq < params.distance_min_sq {
        distance_sq = (params.distance_min_sq * distance_sq).sqrt();
    }
    delta * (weight / distance_sq)
}

/// Barnes-Hut many-body term for node `index`, added to `velocity`.
pub(super) fn accumulate_charge(
    cell: &QuadNode,
    index: usize,
    positions: &[Vec2],
    params: ChargeParams,
    alpha: f32,
    velocity: &mut Vec2,
) {
    if cell.mass <= 0.0 {
        return;
    }

    let point = positions[index];

    if cell.is_leaf() {
        for &other in &cell.indices {
            if other == index {
                continue;
            }
            *velocity += charge_from(
                positions[other] - point,
                params.strength * alpha,
                params,
                index ^ other,
            );
        }
        return;
    }

    let delta = cell.centroid - point;
    let distance_sq = delta.length_sq();
    let side = cell.bounds.side_length();
    if !cell.bounds.contains(point) && side * side < params.theta_sq * distance_sq {
        *velocity += charge_from(delta, params.strength * cell.mass * alpha, params, index);
        return;
    }

    for child in cell.children() {
        accumulate_charge(child, index, positions, params, alpha, velocity);
    }
}

#[derive(Clone, Copy)]
pub(super) struct CollisionParams {
    pub(super) strength: f32,
}

fn resolve_overlap(
    from: usize,
    to: usize,
    predicted: &[Vec2],
    radii: &[f32],
    params: CollisionParams,
    deltas: &mut [Vec2],
) {
    let reach = radii[from] + radii[to];
    let mut delta = predicted[from] - predicted[to];
    let mut distance_sq = delta.length_sq();
    if distance_sq >= reach * reach {
        return;
    }
    if distance_sq < COINCIDENT_EPSILON_SQ {
        delta = jiggle(from.wrapping_mul(31) ^ to);
        distance_sq = delta.length_sq();
    }

    let distance = distance_sq.sqrt();
    let push = delta * ((reach - distance) / distance * params.strength);
    let from_sq = radii[from] * radii[from];
    let to_sq = radii[to] * radii[to];
    let from_share = to_sq / (from_sq + to_sq).max(f32::EPSILON);

    deltas[from] += push * from_share;
    deltas[to] -= push * (1.0 - from_share);
}

/// Pairwise overlap resolution over two cells of the same tree.
///
/// Cells farther apart than their largest radii can reach are pruned.
pub(super) fn accumulate_collisions(
    cell_a: &QuadNode,
    cell_b: &QuadNode,
    same_cell: bool,
    predicted: &[Vec2],
    radii: &[f32],
    params: CollisionParams,
    deltas: &mut [Vec2],
) {
    let reach = cell_a.max_radius + cell_b.max_radius;
    if cell_a.bounds.gap_sq(cell_b.bounds) > reach * reach {
        return;
    }

    if cell_a.is_leaf() && cell_b.is_leaf() {
        if same_cell {
            for (offset, &from) in cell_a.indices.iter().enumerate() {
                for &to in &cell_a.indices[offset + 1..] {
                    resolve_overlap(from, to, predicted, radii, params, deltas);
                }
            }
        } else {
            for &from in &cell_a.indices {
                for &to in &cell_b.indices {
                    resolve_overlap(from, to, predicted, radii, params, deltas);
                }
            }
        }
        return;
    }

    if same_cell {
        let children = cell_a.children().collect::<Vec<_>>();
        for (offset, child_a) in children.iter().enumerate() {
            accumulate_collisions(child_a, child_a, true, predicted, radii, params, deltas);
            for child_b in &children[offset + 1..] {
                accumulate_collisions(child_a, child_b, false, predicted, radii, params, deltas);
            }
        }
        return;
    }

    let split_a = !cell_a.is_leaf()
        && (cell_b.is_leaf() || cell_a.bounds.half_extent >= cell_b.bounds.half_extent);
    if split_a {
        for child in cell_a.children() {
            accumulate_collisions(child, cell_b, false, predicted, radii, params, deltas);
        }
    } else {
        for child in cell_b.children() {
            accumulate_collisions(cell_a, child, false, predicted, radii, params, deltas);
        }
    }
}

/// Weak per-axis spring toward `anchor`.
pub(super) fn apply_position_springs(
    positions: &[Vec2],
    velocities: &mut [Vec2],
    anchor: Vec2,
    strength: f32,
    alpha: f32,
) {
    for (position, velocity) in positions.iter().zip(velocities.iter_mut()) {
        *velocity += (anchor - *position) * (strength * alpha);
    }
}

/// Translates every position so the centroid moves toward `anchor`.
pub(super) fn recenter(positions: &mut [Vec2], anchor: Vec2, strength: f32) {
    if positions.is_empty() {
        return;
    }

    let centroid = positions.iter().fold(Vec2::ZERO, |sum, p| sum + *p) / positions.len() as f32;
    let shift = (anchor - centroid) * strength;
    for position in positions {
        *position += shift;
    }
}

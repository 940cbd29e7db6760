use super::{ChainPose, ChainSolution, FabrikSettings};
use crate::math::{DEGENERATE_LENGTH, direction_degrees, normalize_degrees, unit_from_degrees};
use glam::Vec2;
use rand::Rng;

/// Moves `from` so it sits `length` away from `anchor`, keeping its bearing. Coincident points
/// fall back to `fallback`.
fn place_at_length(anchor: Vec2, from: Vec2, length: f32, fallback: Vec2) -> Vec2 {
    let dir = (from - anchor).try_normalize().unwrap_or(fallback);
    anchor + dir * length
}

/// Pins the effector on `target` and walks back toward the root.
fn reach_backward(points: &mut [Vec2], lengths: &[f32], target: Vec2) {
    let n = lengths.len();
    points[n] = target;
    for i in (0..n).rev() {
        points[i] = place_at_length(points[i + 1], points[i], lengths[i], Vec2::NEG_X);
    }
}

/// Re-pins the root and walks out toward the effector.
fn reach_forward(points: &mut [Vec2], lengths: &[f32], root: Vec2) {
    points[0] = root;
    for i in 0..lengths.len() {
        points[i + 1] = place_at_length(points[i], points[i + 1], lengths[i], Vec2::X);
    }
}

/// Basic FABRIK over world points. Joint limits and reach softening are ignored.
pub fn solve_fabrik(
    pose: &ChainPose,
    target: Vec2,
    iterations: u32,
    threshold: f32,
) -> ChainSolution {
    let n = pose.segment_count();
    let mut points = pose.points();
    let root = points[0];
    let mut distance = points[n].distance(target);
    let mut used = 0;

    while used < iterations && distance >= threshold {
        used += 1;
        reach_backward(&mut points, &pose.lengths, target);
        reach_forward(&mut points, &pose.lengths, root);
        distance = points[n].distance(target);
    }

    ChainSolution {
        angles: pose.angles_from_points(&points, false),
        distance,
        iterations: used,
        converged: distance < threshold,
    }
}

/// Pulls `target` toward `root` once it passes `total_length * stretch_ratio` minus the soft
/// band, so dragging past full reach approaches the limit asymptotically instead of snapping.
pub fn soft_reach_target(
    root: Vec2,
    target: Vec2,
    total_length: f32,
    stretch_ratio: f32,
    soft_margin: f32,
) -> Vec2 {
    let offset = target - root;
    let distance = offset.length();
    let soft_distance = total_length * soft_margin;
    let soft_threshold = total_length * stretch_ratio - soft_distance;
    if distance <= soft_threshold || distance < DEGENERATE_LENGTH || soft_distance <= 0.0 {
        return target;
    }
    let overflow = distance - soft_threshold;
    let damped = soft_distance * (1.0 - (-overflow / soft_distance).exp());
    root + offset / distance * (soft_threshold + damped)
}

/// Nudges the first mid-joint toward the side the limb should bend to.
fn seed_bend(points: &mut [Vec2], pose: &ChainPose, target: Vec2, settings: &FabrikSettings) {
    let to_target = target - points[0];
    if to_target.length_squared() < DEGENERATE_LENGTH * DEGENERATE_LENGTH {
        return;
    }
    let bias =
        pose.bend_direction.signum() as f32 * pose.curve_strength * settings.bend_bias_degrees;
    let heading = unit_from_degrees(direction_degrees(to_target) + bias);
    let length = pose.lengths[0];
    let desired = points[0] + heading * length;
    let nudged = points[1].lerp(desired, 0.5);
    points[1] = place_at_length(points[0], nudged, length, heading);
}

/// Outward pass that also projects each bone back inside its joint's limits.
fn reach_forward_constrained(points: &mut [Vec2], pose: &ChainPose, root: Vec2) {
    points[0] = root;
    let mut parent_rotation = pose.base_rotation;
    for i in 0..pose.segment_count() {
        let length = pose.lengths[i];
        let current = parent_rotation + pose.rest[i] + pose.angles[i];
        let bone = points[i + 1] - points[i];
        let direction = if bone.length_squared() < DEGENERATE_LENGTH * DEGENERATE_LENGTH {
            current
        } else {
            direction_degrees(bone)
        };
        let local = normalize_degrees(direction - pose.rest[i] - parent_rotation);
        let clamped = pose.constrain(i, local);
        points[i + 1] =
            points[i] + unit_from_degrees(parent_rotation + pose.rest[i] + clamped) * length;
        parent_rotation += clamped;
    }
}

/// Reach-softened, limit-aware FABRIK. Always returns the best iterate it saw.
pub fn solve_constrained_fabrik<R: Rng + ?Sized>(
    pose: &ChainPose,
    target: Vec2,
    settings: &FabrikSettings,
    rng: &mut R,
) -> ChainSolution {
    solve_constrained_fabrik_observed(pose, target, settings, rng, |_| {})
}

/// One pass of the constrained FABRIK loop.
#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) struct FabrikIteration {
    pub iteration: u32,
    /// Effector distance to the softened target after the pass.
    pub distance: f32,
    /// Perturbation radius applied to the interior joints after the pass; 0 when none was.
    pub jitter_radius: f32,
}

pub(crate) fn solve_constrained_fabrik_observed<R: Rng + ?Sized>(
    pose: &ChainPose,
    target: Vec2,
    settings: &FabrikSettings,
    rng: &mut R,
    mut observe: impl FnMut(FabrikIteration),
) -> ChainSolution {
    let n = pose.segment_count();
    let total_length = pose.total_length();
    let mut points = pose.points();
    let root = points[0];

    if total_length < DEGENERATE_LENGTH {
        return ChainSolution::unchanged(pose, target, settings.tolerance);
    }

    let goal = soft_reach_target(
        root,
        target,
        total_length,
        pose.stretch_ratio,
        settings.soft_margin,
    );

    let mut best_points = points.clone();
    let mut best_distance = points[n].distance(goal);
    let mut used = 0;

    if best_distance >= settings.tolerance && n >= 2 && pose.bend_direction != 0 {
        seed_bend(&mut points, pose, goal, settings);
    }

    let mean_length = total_length / n as f32;
    let mut iteration = 0;
    while iteration < settings.max_iterations && best_distance >= settings.tolerance {
        used += 1;
        reach_backward(&mut points, &pose.lengths, goal);
        reach_forward_constrained(&mut points, pose, root);

        let distance = points[n].distance(goal);
        if distance < best_distance {
            best_distance = distance;
            best_points.copy_from_slice(&points);
        }
        if distance < settings.tolerance {
            observe(FabrikIteration {
                iteration,
                distance,
                jitter_radius: 0.0,
            });
            break;
        }

        let stagnating = iteration > settings.stagnation_start
            && settings.stagnation_interval > 0
            && iteration % settings.stagnation_interval == 0
            && distance > settings.stagnation_factor * settings.tolerance;
        let mut jitter_radius = 0.0;
        if stagnating && n >= 2 {
            let remaining = 1.0 - iteration as f32 / settings.max_iterations as f32;
            let radius = settings.jitter * mean_length * remaining.max(0.0);
            if radius > 0.0 {
                for point in &mut points[1..n] {
                    *point += Vec2::new(
                        rng.gen_range(-radius..=radius),
                        rng.gen_range(-radius..=radius),
                    );
                }
                jitter_radius = radius;
            }
        }
        observe(FabrikIteration {
            iteration,
            distance,
            jitter_radius,
        });
        iteration += 1;
    }

    ChainSolution {
        angles: pose.angles_from_points(&best_points, true),
        distance: best_distance,
        iterations: used,
        converged: best_distance < settings.tolerance,
    }
}

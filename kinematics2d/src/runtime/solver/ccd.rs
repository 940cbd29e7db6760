use super::{ChainPose, ChainSolution};
use crate::math::signed_angle_between;
use glam::Vec2;

/// Cyclic coordinate descent, innermost joint first.
///
/// Each pass rotates every joint so the end effector swings toward `target`, scaled by
/// `strength`. Stops after `iterations` passes or once the effector is within `threshold`.
pub fn solve_ccd(
    pose: &ChainPose,
    target: Vec2,
    iterations: u32,
    threshold: f32,
    strength: f32,
) -> ChainSolution {
    let n = pose.segment_count();
    let mut angles = pose.angles.clone();
    let mut points = pose.points_for(&angles);
    let mut distance = points[n].distance(target);
    let mut used = 0;

    while used < iterations && distance >= threshold {
        used += 1;
        for i in (0..n).rev() {
            let pivot = points[i];
            let Some(delta) = signed_angle_between(points[n] - pivot, target - pivot) else {
                continue;
            };
            angles[i] = pose.constrain(i, angles[i] + delta * strength);
            points = pose.points_for(&angles);
        }
        distance = points[n].distance(target);
    }

    ChainSolution {
        angles,
        distance,
        iterations: used,
        converged: distance < threshold,
    }
}

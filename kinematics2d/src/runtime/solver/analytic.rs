use super::{ChainPose, ChainSolution};
use crate::math::{DEGENERATE_LENGTH, direction_degrees, normalize_degrees};
use glam::Vec2;

/// Closed-form two-segment solve (law of cosines). Any other chain shape is returned unchanged.
///
/// Out of reach, the first segment points at the target and the second continues straight.
/// Inside the inner dead zone (`distance < |l1 - l2|`) both joints return to zero.
pub fn solve_analytic(pose: &ChainPose, target: Vec2, threshold: f32) -> ChainSolution {
    if pose.segment_count() != 2 {
        return ChainSolution::unchanged(pose, target, threshold);
    }
    let l1 = pose.lengths[0];
    let l2 = pose.lengths[1];
    if l1 < DEGENERATE_LENGTH || l2 < DEGENERATE_LENGTH {
        return ChainSolution::unchanged(pose, target, threshold);
    }

    let offset = target - pose.origin;
    let dd = offset.length_squared();
    let distance = dd.sqrt();

    let angles = if distance > l1 + l2 {
        let bearing = direction_degrees(offset);
        bone_directions_to_angles(pose, bearing, bearing)
    } else if distance < (l1 - l2).abs() {
        vec![pose.constrain(0, 0.0), pose.constrain(1, 0.0)]
    } else {
        // Positive bend puts the elbow counter-clockwise of the root-target line.
        let bend = if pose.bend_direction < 0 { 1.0 } else { -1.0 };
        let cos = ((dd - l1 * l1 - l2 * l2) / (2.0 * l1 * l2)).clamp(-1.0, 1.0);
        let a2 = cos.acos() * bend;
        let a1 = offset.y.atan2(offset.x) - (l2 * a2.sin()).atan2(l1 + l2 * a2.cos());
        let first = a1.to_degrees();
        bone_directions_to_angles(pose, first, first + a2.to_degrees())
    };

    let distance = pose.effector_for(&angles).distance(target);
    ChainSolution {
        angles,
        distance,
        iterations: 0,
        converged: distance < threshold,
    }
}

fn bone_directions_to_angles(pose: &ChainPose, first: f32, second: f32) -> Vec<f32> {
    let a1 = pose.constrain(
        0,
        normalize_degrees(first - pose.rest[0] - pose.base_rotation),
    );
    let parent_rotation = pose.base_rotation + a1;
    let a2 = pose.constrain(1, normalize_degrees(second - pose.rest[1] - parent_rotation));
    vec![a1, a2]
}

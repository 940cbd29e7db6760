use super::{ChainPose, ChainSolution, JacobianSettings};
use crate::math::DEGENERATE_LENGTH;
use glam::Vec2;

/// Damped Jacobian-transpose solve with finite-difference derivatives.
///
/// Each iteration nudges every joint by `settings.epsilon` radians to estimate how the end
/// effector moves, then turns each joint by the error projected onto that derivative. The step
/// is normalized by the summed squared derivative lengths, which keeps it stable for chains of
/// any scale.
pub fn solve_jacobian_transpose(
    pose: &ChainPose,
    target: Vec2,
    settings: &JacobianSettings,
    threshold: f32,
) -> ChainSolution {
    let n = pose.segment_count();
    let step_degrees = settings.epsilon.to_degrees();
    let mut angles = pose.angles.clone();
    let mut derivatives = vec![Vec2::ZERO; n];
    let mut used = 0;

    let mut points = pose.points_for(&angles);
    let mut distance = points[n].distance(target);

    while used < settings.max_iterations && distance >= threshold {
        if settings.epsilon <= 0.0 {
            break;
        }
        used += 1;
        let effector = points[n];
        let error = target - effector;

        let mut nudged = angles.clone();
        for i in 0..n {
            nudged[i] = angles[i] + step_degrees;
            derivatives[i] = (pose.effector_for(&nudged) - effector) / settings.epsilon;
            nudged[i] = angles[i];
        }

        let norm: f32 = derivatives.iter().map(|d| d.length_squared()).sum();
        if norm < DEGENERATE_LENGTH * DEGENERATE_LENGTH {
            break;
        }

        for i in 0..n {
            let projection = derivatives[i].dot(error);
            let turn = (effector - points[i]).perp_dot(error);
            if projection == 0.0 || turn == 0.0 {
                continue;
            }
            let radians = settings.step * projection.abs() * turn.signum() / norm;
            angles[i] = pose.constrain(i, angles[i] + radians.to_degrees());
        }

        points = pose.points_for(&angles);
        distance = points[n].distance(target);
    }

    ChainSolution {
        angles,
        distance,
        iterations: used,
        converged: distance < threshold,
    }
}

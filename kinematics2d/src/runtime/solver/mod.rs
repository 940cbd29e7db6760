//! Chain IK solvers.
//!
//! Every solver is a pure function of a [`ChainPose`] and a target point and returns the local
//! angles it would write back. [`solve`] dispatches on [`SolverKind`].

mod analytic;
mod ccd;
mod fabrik;
mod jacobian;

pub use analytic::*;
pub use ccd::*;
pub use fabrik::*;
pub use jacobian::*;



use crate::math::{DEGENERATE_LENGTH, direction_degrees, normalize_degrees, unit_from_degrees};
use crate::{AngleLimits, SolverKind};
use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IkSettings {
    /// Iteration cap for CCD, basic FABRIK and the joint tree.
    pub iterations: u32,
    /// End effector distance at which a solve counts as converged.
    pub threshold: f32,
    /// Scale applied to every CCD rotation.
    pub ik_strength: f32,
    pub fabrik: FabrikSettings,
    pub jacobian: JacobianSettings,
    /// Seed for the stagnation-escape perturbation.
    pub seed: u64,
}

impl Default for IkSettings {
    fn default() -> Self {
        Self {
            iterations: 20,
            threshold: 0.1,
            ik_strength: 1.0,
            fabrik: FabrikSettings::default(),
            jacobian: JacobianSettings::default(),
            seed: 0x5eed,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FabrikSettings {
    pub max_iterations: u32,
    pub tolerance: f32,
    /// Width of the soft-reach band as a fraction of the chain length.
    pub soft_margin: f32,
    /// Mid-joint bend seed in degrees at `curve_strength == 1`.
    pub bend_bias_degrees: f32,
    pub stagnation_start: u32,
    pub stagnation_interval: u32,
    /// Perturb only while the residual exceeds this multiple of `tolerance`.
    pub stagnation_factor: f32,
    /// Initial perturbation radius as a fraction of the mean segment length.
    pub jitter: f32,
}

impl Default for FabrikSettings {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            tolerance: 0.01,
            soft_margin: 0.12,
            bend_bias_degrees: 20.0,
            stagnation_start: 10,
            stagnation_interval: 5,
            stagnation_factor: 5.0,
            jitter: 0.1,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct JacobianSettings {
    pub max_iterations: u32,
    /// Finite-difference step in radians.
    pub epsilon: f32,
    pub step: f32,
}

impl Default for JacobianSettings {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            epsilon: 0.01,
            step: 0.5,
        }
    }
}

/// Flat, solver-facing view of one chain.
///
/// Segment `i` runs from joint `i` to joint `i + 1`; the last joint is the end effector and is
/// never rotated.
#[derive(Clone, Debug, PartialEq)]
pub struct ChainPose {
    /// World position of the first chain joint.
    pub origin: Vec2,
    /// World orientation of the first chain joint's parent.
    pub base_rotation: f32,
    pub angles: Vec<f32>,
    pub lengths: Vec<f32>,
    /// Direction of the next pivot in each joint's local frame.
    pub rest: Vec<f32>,
    pub limits: Vec<Option<AngleLimits>>,
    pub stretch_ratio: f32,
    pub curve_strength: f32,
    pub bend_direction: i32,
}

impl ChainPose {
    pub fn new(origin: Vec2, base_rotation: f32) -> Self {
        Self {
            origin,
            base_rotation,
            angles: Vec::new(),
            lengths: Vec::new(),
            rest: Vec::new(),
            limits: Vec::new(),
            stretch_ratio: 1.0,
            curve_strength: 0.0,
            bend_direction: 0,
        }
    }

    /// A chain whose pivots all lie on their parent's +X axis.
    pub fn straight(origin: Vec2, lengths: &[f32]) -> Self {
        let mut pose = Self::new(origin, 0.0);
        for &length in lengths {
            pose.push_segment(length, 0.0, 0.0, None);
        }
        pose
    }

    pub fn push_segment(
        &mut self,
        length: f32,
        rest: f32,
        angle: f32,
        limits: Option<AngleLimits>,
    ) {
        self.lengths.push(length);
        self.rest.push(rest);
        self.angles.push(angle);
        self.limits.push(limits);
    }

    pub fn segment_count(&self) -> usize {
        self.lengths.len()
    }

    pub fn total_length(&self) -> f32 {
        self.lengths.iter().sum()
    }

    /// Normalizes and clamps a candidate local angle for joint `i`.
    pub fn constrain(&self, i: usize, degrees: f32) -> f32 {
        let degrees = normalize_degrees(degrees);
        match self.limits.get(i).copied().flatten() {
            Some(limits) => limits.clamp(degrees),
            None => degrees,
        }
    }

    pub fn points(&self) -> Vec<Vec2> {
        self.points_for(&self.angles)
    }

    /// Joint positions for `angles`, root first, effector last.
    pub fn points_for(&self, angles: &[f32]) -> Vec<Vec2> {
        let mut points = Vec::with_capacity(self.lengths.len() + 1);
        let mut position = self.origin;
        let mut rotation = self.base_rotation;
        points.push(position);
        for (i, &length) in self.lengths.iter().enumerate() {
            rotation += angles.get(i).copied().unwrap_or(0.0);
            position += unit_from_degrees(rotation + self.rest[i]) * length;
            points.push(position);
        }
        points
    }

    pub fn effector_for(&self, angles: &[f32]) -> Vec2 {
        self.points_for(angles)
            .last()
            .copied()
            .unwrap_or(self.origin)
    }

    /// Recovers local angles from solved joint positions. Coincident points keep the current
    /// angle.
    pub fn angles_from_points(&self, points: &[Vec2], clamp: bool) -> Vec<f32> {
        let mut angles = self.angles.clone();
        let mut parent_rotation = self.base_rotation;
        for i in 0..self.segment_count().min(points.len().saturating_sub(1)) {
            let bone = points[i + 1] - points[i];
            if bone.length_squared() < DEGENERATE_LENGTH * DEGENERATE_LENGTH {
                parent_rotation += angles[i];
                continue;
            }
            let mut local =
                normalize_degrees(direction_degrees(bone) - self.rest[i] - parent_rotation);
            if clamp {
                local = self.constrain(i, local);
            }
            angles[i] = local;
            parent_rotation += local;
        }
        angles
    }
}

/// Angles produced by one solver call, plus how it got there.
#[derive(Clone, Debug, PartialEq)]
pub struct ChainSolution {
    pub angles: Vec<f32>,
    /// Residual end effector distance to the target the solver aimed at.
    pub distance: f32,
    pub iterations: u32,
    pub converged: bool,
}

impl ChainSolution {
    /// The input pose, untouched.
    pub fn unchanged(pose: &ChainPose, target: Vec2, threshold: f32) -> Self {
        let distance = pose.effector_for(&pose.angles).distance(target);
        Self {
            angles: pose.angles.clone(),
            distance,
            iterations: 0,
            converged: distance < threshold,
        }
    }
}

/// Runs the solver selected by `kind`. Chains with no segments come back unchanged.
pub fn solve<R: Rng + ?Sized>(
    kind: SolverKind,
    pose: &ChainPose,
    target: Vec2,
    settings: &IkSettings,
    rng: &mut R,
) -> ChainSolution {
    if pose.segment_count() == 0 {
        return ChainSolution::unchanged(pose, target, settings.threshold);
    }
    let solution = match kind {
        SolverKind::Ccd => solve_ccd(
            pose,
            target,
            settings.iterations,
            settings.threshold,
            settings.ik_strength,
        ),
        SolverKind::Fabrik => {
            solve_fabrik(pose, target, settings.iterations, settings.threshold)
        }
        SolverKind::ConstrainedFabrik => {
            solve_constrained_fabrik(pose, target, &settings.fabrik, rng)
        }
        SolverKind::JacobianTranspose => {
            solve_jacobian_transpose(pose, target, &settings.jacobian, settings.threshold)
        }
        SolverKind::Analytic => solve_analytic(pose, target, settings.threshold),
    };
    log::trace!(
        "{} solve: {} iterations, residual {:.4}",
        kind.name(),
        solution.iterations,
        solution.distance
    );
    solution
}

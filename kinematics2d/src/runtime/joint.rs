use crate::AngleLimits;
use crate::math::{angle_difference, normalize_degrees, wrap_degrees_positive};
use serde::{Deserialize, Serialize};

/// How unconstrained joint angles are wrapped after each update.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AngleWrap {
    /// `(-180, 180]`
    #[default]
    Signed,
    /// `[0, 360)`
    Positive,
}

impl AngleWrap {
    pub fn apply(self, degrees: f32) -> f32 {
        match self {
            Self::Signed => normalize_degrees(degrees),
            Self::Positive => wrap_degrees_positive(degrees),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JointConstraint {
    pub enabled: bool,
    pub min_angle: f32,
    pub max_angle: f32,
}

impl Default for JointConstraint {
    fn default() -> Self {
        Self {
            enabled: false,
            min_angle: -180.0,
            max_angle: 180.0,
        }
    }
}

impl JointConstraint {
    pub fn from_limits(limits: Option<AngleLimits>) -> Self {
        match limits {
            Some(limits) => Self {
                enabled: true,
                min_angle: limits.min,
                max_angle: limits.max,
            },
            None => Self::default(),
        }
    }

    pub fn limits(&self) -> Option<AngleLimits> {
        self.enabled
            .then(|| AngleLimits::new(self.min_angle, self.max_angle))
    }
}

/// Mutable per-joint state shared by the joint tree and the chain skeleton.
#[derive(Clone, Debug, PartialEq)]
pub struct Joint {
    /// Local angle in degrees.
    pub angle: f32,
    /// Angle the FK update eases toward.
    pub target_angle: f32,
    pub fk_enabled: bool,
    pub ik_enabled: bool,
    pub ik_weight: f32,
    /// 0 moves at full `rotation_speed`, 1 does not move at all.
    pub stiffness: f32,
    /// Fraction of each IK correction withheld (tree CCD).
    pub damping: f32,
    /// Degrees per second. Non-positive snaps to `target_angle`.
    pub rotation_speed: f32,
    pub constraint: JointConstraint,
}

impl Default for Joint {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl Joint {
    pub fn new(angle: f32) -> Self {
        Self {
            angle,
            target_angle: angle,
            fk_enabled: true,
            ik_enabled: true,
            ik_weight: 1.0,
            stiffness: 0.0,
            damping: 0.0,
            rotation_speed: 0.0,
            constraint: JointConstraint::default(),
        }
    }

    pub fn with_limits(mut self, limits: Option<AngleLimits>) -> Self {
        self.constraint = JointConstraint::from_limits(limits);
        self.angle = self.constrain(self.angle, AngleWrap::Signed);
        self.target_angle = self.angle;
        self
    }

    /// Pulls `angle` and `target_angle` back inside the constraint, or the wrap range when
    /// unconstrained.
    pub fn enforce_constraint(&mut self, wrap: AngleWrap) {
        self.angle = self.constrain(self.angle, wrap);
        self.target_angle = self.constrain(self.target_angle, wrap);
    }

    pub fn set_constraint(&mut self, min_angle: f32, max_angle: f32) {
        let limits = AngleLimits::new(min_angle, max_angle);
        self.constraint = JointConstraint {
            enabled: true,
            min_angle: limits.min,
            max_angle: limits.max,
        };
    }

    pub fn clear_constraint(&mut self) {
        self.constraint.enabled = false;
    }

    /// Normalizes `degrees` and applies the constraint, or `wrap` when unconstrained.
    pub fn constrain(&self, degrees: f32, wrap: AngleWrap) -> f32 {
        match self.constraint.limits() {
            Some(limits) => limits.clamp(normalize_degrees(degrees)),
            None => wrap.apply(degrees),
        }
    }

    /// Sets the pose directly, bypassing smoothing.
    pub fn set_angle(&mut self, degrees: f32, wrap: AngleWrap) {
        self.angle = self.constrain(degrees, wrap);
        self.target_angle = self.angle;
    }

    /// Range the IK solvers may move this joint within. Joints with IK disabled are locked in
    /// place.
    pub fn solver_limits(&self) -> Option<AngleLimits> {
        if !self.ik_enabled {
            return Some(AngleLimits::locked(normalize_degrees(self.angle)));
        }
        self.constraint.limits()
    }

    /// Forward-kinematics step: eases `angle` toward `target_angle` along the shortest arc.
    pub fn advance(&mut self, delta: f32, wrap: AngleWrap) {
        if !self.fk_enabled {
            return;
        }
        let diff = angle_difference(self.angle, self.target_angle);
        let next = if self.rotation_speed <= 0.0 {
            self.angle + diff
        } else {
            let max_step =
                self.rotation_speed * (1.0 - self.stiffness.clamp(0.0, 1.0)) * delta.max(0.0);
            self.angle + diff.clamp(-max_step, max_step)
        };
        self.angle = self.constrain(next, wrap);
    }
}

//! Planar angle helpers and a small affine transform.
//!
//! Angles are degrees everywhere in this crate. Radians only appear inside these helpers.

use glam::Vec2;

/// Vectors shorter than this have no defined direction.
pub const DEGENERATE_LENGTH: f32 = 1.0e-5;

/// Wraps `degrees` into `(-180, 180]`.
pub fn normalize_degrees(degrees: f32) -> f32 {
    if degrees > -180.0 && degrees <= 180.0 {
        return degrees;
    }
    let mut degrees = degrees.rem_euclid(360.0);
    if degrees > 180.0 {
        degrees -= 360.0;
    }
    degrees
}

/// Wraps `degrees` into `[0, 360)`.
pub fn wrap_degrees_positive(degrees: f32) -> f32 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs.
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Direction of `v` in degrees, measured counter-clockwise from +X.
pub fn direction_degrees(v: Vec2) -> f32 {
    v.y.atan2(v.x).to_degrees()
}

/// Unit vector pointing at `degrees`.
pub fn unit_from_degrees(degrees: f32) -> Vec2 {
    let (sin, cos) = degrees.to_radians().sin_cos();
    Vec2::new(cos, sin)
}

pub fn rotate_degrees(v: Vec2, degrees: f32) -> Vec2 {
    unit_from_degrees(degrees).rotate(v)
}

/// Signed rotation in degrees that turns `from` onto `to`, or `None` when either vector is too
/// short to have a direction.
pub fn signed_angle_between(from: Vec2, to: Vec2) -> Option<f32> {
    if from.length_squared() < DEGENERATE_LENGTH * DEGENERATE_LENGTH
        || to.length_squared() < DEGENERATE_LENGTH * DEGENERATE_LENGTH
    {
        return None;
    }
    Some(from.perp_dot(to).atan2(from.dot(to)).to_degrees())
}

/// Shortest signed difference `to - from`, in `(-180, 180]`.
pub fn angle_difference(from: f32, to: f32) -> f32 {
    normalize_degrees(to - from)
}

/// Column-major 2x3 affine transform:
///
/// ```text
/// | a b x |
/// | c d y |
/// ```
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Transform2 {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub x: f32,
    pub y: f32,
}

impl Default for Transform2 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform2 {
    pub const IDENTITY: Self = Self {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        x: 0.0,
        y: 0.0,
    };

    pub fn from_rotation_translation(degrees: f32, translation: Vec2) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        Self {
            a: cos,
            b: -sin,
            c: sin,
            d: cos,
            x: translation.x,
            y: translation.y,
        }
    }

    pub fn translation(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn rotation(&self) -> f32 {
        self.c.atan2(self.a).to_degrees()
    }

    pub fn determinant(&self) -> f32 {
        self.a * self.d - self.b * self.c
    }

    pub fn transform_point(&self, p: Vec2) -> Vec2 {
        Vec2::new(
            self.a * p.x + self.b * p.y + self.x,
            self.c * p.x + self.d * p.y + self.y,
        )
    }

    pub fn transform_vector(&self, v: Vec2) -> Vec2 {
        Vec2::new(self.a * v.x + self.b * v.y, self.c * v.x + self.d * v.y)
    }

    /// Returns `self * child`: `child` is expressed in this transform's local frame.
    pub fn mul(&self, child: &Self) -> Self {
        Self {
            a: self.a * child.a + self.b * child.c,
            b: self.a * child.b + self.b * child.d,
            c: self.c * child.a + self.d * child.c,
            d: self.c * child.b + self.d * child.d,
            x: self.a * child.x + self.b * child.y + self.x,
            y: self.c * child.x + self.d * child.y + self.y,
        }
    }

    pub fn try_inverse(&self) -> Result<Self, crate::Error> {
        let det = self.determinant();
        if !det.is_finite() || det.abs() <= 1.0e-8 {
            return Err(crate::Error::SingularTransform { determinant: det });
        }
        let inv = 1.0 / det;
        let a = self.d * inv;
        let b = -self.b * inv;
        let c = -self.c * inv;
        let d = self.a * inv;
        Ok(Self {
            a,
            b,
            c,
            d,
            x: -(a * self.x + b * self.y),
            y: -(c * self.x + d * self.y),
        })
    }
}

//! Planar forward and inverse kinematics.
//!
//! Two models share one forward-kinematics evaluator:
//! - [`JointTree`]: an editable joint hierarchy driven by a single end effector (damped CCD).
//! - [`Skeleton`]: an instance of an immutable [`SkeletonData`] with named chains, each solved
//!   by one of the chain solvers ([`SolverKind`]).
//!
//! All angles are degrees. Rendering, input and storage are left to the caller; see
//! [`build_joint_list`] and [`SkeletonState`] for the data handed across those boundaries.

#![forbid(unsafe_code)]

mod error;
pub mod math;
mod model;
mod render;
mod runtime;
mod state;

#[cfg(feature = "json")]
mod json;

pub use error::*;
pub use math::Transform2;
pub use model::*;
pub use render::*;
pub use runtime::*;
pub use state::*;

#[cfg(test)]
mod math_tests;

mod joint;
mod kinematics;
mod skeleton;
mod solver;
mod tree;

pub use joint::*;
pub use kinematics::*;
pub use skeleton::*;
pub use solver::*;
pub use tree::*;


#[cfg(test)]
mod joint_tests;


#[cfg(test)]
mod skeleton_tests;

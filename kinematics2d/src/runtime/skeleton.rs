use crate::math::{DEGENERATE_LENGTH, direction_degrees, normalize_degrees};
use crate::{
    AngleWrap, ChainPose, ChainSolution, Error, Hierarchy, IkSettings, Joint, SkeletonData,
    SolverKind, WorldTransform, world_transform,
};
use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use std::sync::Arc;

/// Run-time state of one chain.
#[derive(Clone, Debug)]
pub struct Chain {
    data_index: usize,
    /// `None` holds the last solved pose.
    pub target: Option<Vec2>,
    pub active: bool,
    pub stretch_ratio: f32,
    pub curve_strength: f32,
    pub priority: i32,
    pub bend_direction: i32,
    pub solver: SolverKind,
}

impl Chain {
    pub fn data_index(&self) -> usize {
        self.data_index
    }
}

/// A posed instance of a [`SkeletonData`].
///
/// The skeleton is the single writer of its joint angles: [`Skeleton::solve_ik`] computes each
/// chain against a fresh forward-kinematics pass and writes all of that chain's angles back in
/// one step.
#[derive(Clone, Debug)]
pub struct Skeleton {
    pub data: Arc<SkeletonData>,
    pub joints: Vec<Joint>,
    pub chains: Vec<Chain>,
    pub settings: IkSettings,
    pub x: f32,
    pub y: f32,
    world: Vec<WorldTransform>,
    rng: Pcg32,
}

impl Skeleton {
    pub fn new(data: Arc<SkeletonData>) -> Self {
        let joints = data
            .joints
            .iter()
            .map(|joint| Joint::new(joint.rotation).with_limits(joint.limits))
            .collect();
        let chains = data
            .chains
            .iter()
            .enumerate()
            .map(|(data_index, chain)| Chain {
                data_index,
                target: None,
                active: true,
                stretch_ratio: chain.stretch_ratio,
                curve_strength: chain.curve_strength,
                priority: chain.priority,
                bend_direction: chain.bend_direction,
                solver: chain.solver,
            })
            .collect();
        let settings = data.settings.clone();
        let rng = Pcg32::seed_from_u64(settings.seed);
        let world = vec![WorldTransform::default(); data.joints.len()];

        let mut skeleton = Self {
            data,
            joints,
            chains,
            settings,
            x: 0.0,
            y: 0.0,
            world,
            rng,
        };
        skeleton.update_world_transform();
        skeleton
    }

    pub fn origin(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// Restarts the perturbation sequence used by the constrained FABRIK solver.
    pub fn reseed(&mut self, seed: u64) {
        self.settings.seed = seed;
        self.rng = Pcg32::seed_from_u64(seed);
    }

    pub fn angles(&self) -> Vec<f32> {
        self.joints.iter().map(|joint| joint.angle).collect()
    }

    pub fn joint_index(&self, name: &str) -> Result<usize, Error> {
        self.data.joint_index(name)
    }

    pub fn chain_index(&self, name: &str) -> Result<usize, Error> {
        self.data.chain_index(name)
    }

    pub fn joint_mut(&mut self, name: &str) -> Result<&mut Joint, Error> {
        let index = self.data.joint_index(name)?;
        Ok(&mut self.joints[index])
    }

    pub fn chain_mut(&mut self, name: &str) -> Result<&mut Chain, Error> {
        let index = self.data.chain_index(name)?;
        Ok(&mut self.chains[index])
    }

    pub fn set_target(&mut self, chain: &str, target: Vec2) -> Result<(), Error> {
        self.chain_mut(chain)?.target = Some(target);
        Ok(())
    }

    pub fn clear_target(&mut self, chain: &str) -> Result<(), Error> {
        self.chain_mut(chain)?.target = None;
        Ok(())
    }

    /// Advances forward-kinematics smoothing on every joint.
    pub fn update(&mut self, delta: f32) {
        for joint in &mut self.joints {
            joint.advance(delta, AngleWrap::Signed);
        }
    }

    /// One frame: FK smoothing, IK for every targeted chain, then world transforms.
    pub fn step(&mut self, delta: f32) -> Vec<(usize, ChainSolution)> {
        self.update(delta);
        let solutions = self.solve_ik();
        self.update_world_transform();
        solutions
    }

    /// Resolves the cached world transform of every joint, parents first.
    pub fn update_world_transform(&mut self) {
        let origin = self.origin();
        for &index in &self.data.solve_order {
            let pivot = self.data.pivot(index);
            let angle = self.joints[index].angle;
            self.world[index] = match self.data.joints[index].parent {
                None => WorldTransform::root(origin, pivot, angle),
                Some(parent) => self.world[parent].child(pivot, angle),
            };
        }
    }

    /// Cached world transform from the last [`Skeleton::update_world_transform`].
    pub fn world(&self, joint: usize) -> Option<&WorldTransform> {
        self.world.get(joint)
    }

    /// Evaluates forward kinematics for `joint` against the current angles.
    pub fn world_transform(&self, joint: usize) -> Result<WorldTransform, Error> {
        world_transform(self.data.as_ref(), joint, &self.angles(), self.origin())
    }

    /// Builds the solver-facing view of a chain from the current pose.
    pub fn chain_pose(&self, chain_index: usize) -> Result<ChainPose, Error> {
        let chain = self
            .chains
            .get(chain_index)
            .ok_or(Error::InvalidChainIndex { index: chain_index })?;
        let joints = &self.data.chains[chain.data_index].joints;
        let Some(&first) = joints.first() else {
            return Ok(ChainPose::new(self.origin(), 0.0));
        };

        let base = self.world_transform(first)?;
        let mut pose = ChainPose::new(base.position, base.parent_rotation);
        pose.stretch_ratio = chain.stretch_ratio;
        pose.curve_strength = chain.curve_strength;
        pose.bend_direction = chain.bend_direction;
        for pair in joints.windows(2) {
            let joint = &self.joints[pair[0]];
            let pivot = self.data.pivot(pair[1]);
            let length = pivot.length();
            let rest = if length > DEGENERATE_LENGTH {
                direction_degrees(pivot)
            } else {
                0.0
            };
            pose.push_segment(
                length,
                rest,
                normalize_degrees(joint.angle),
                joint.solver_limits(),
            );
        }
        Ok(pose)
    }

    /// Solves one chain toward its target and writes the angles back. Returns `None` when the
    /// chain is inactive or has no target.
    pub fn solve_chain(&mut self, chain_index: usize) -> Result<Option<ChainSolution>, Error> {
        let chain = self
            .chains
            .get(chain_index)
            .ok_or(Error::InvalidChainIndex { index: chain_index })?;
        let (Some(target), true) = (chain.target, chain.active) else {
            return Ok(None);
        };
        let kind = chain.solver;
        let data_index = chain.data_index;

        let pose = self.chain_pose(chain_index)?;
        let solution = crate::solve(kind, &pose, target, &self.settings, &mut self.rng);

        let joints = &self.data.chains[data_index].joints;
        for (&joint_index, &angle) in joints.iter().zip(&solution.angles) {
            let joint = &mut self.joints[joint_index];
            if joint.ik_enabled {
                joint.set_angle(angle, AngleWrap::Signed);
            }
        }

        log::debug!(
            "chain '{}' solved with {}: {} iterations, residual {:.4}{}",
            self.data.chains[data_index].name,
            kind.name(),
            solution.iterations,
            solution.distance,
            if solution.converged { "" } else { " (not converged)" }
        );
        Ok(Some(solution))
    }

    /// Solves every active, targeted chain in priority order. Each chain is independent: a
    /// no-op on one does not affect the others.
    pub fn solve_ik(&mut self) -> Vec<(usize, ChainSolution)> {
        let mut order: Vec<usize> = (0..self.chains.len()).collect();
        order.sort_by_key(|&index| (self.chains[index].priority, index));

        let mut solutions = Vec::new();
        for index in order {
            match self.solve_chain(index) {
                Ok(Some(solution)) => solutions.push((index, solution)),
                Ok(None) => {}
                Err(err) => log::warn!("skipping chain {index}: {err}"),
            }
        }
        solutions
    }
}

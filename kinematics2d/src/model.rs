use crate::{Error, IkSettings};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Allowed local angle range of a joint, in degrees.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AngleLimits {
    pub min: f32,
    pub max: f32,
}

impl AngleLimits {
    pub fn new(min: f32, max: f32) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    /// A zero-width range that pins a joint at `angle`.
    pub fn locked(angle: f32) -> Self {
        Self {
            min: angle,
            max: angle,
        }
    }

    pub fn contains(&self, degrees: f32) -> bool {
        degrees >= self.min && degrees <= self.max
    }

    pub fn clamp(&self, degrees: f32) -> f32 {
        degrees.clamp(self.min, self.max)
    }
}

/// Which IK algorithm drives a chain.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SolverKind {
    Ccd,
    Fabrik,
    #[default]
    ConstrainedFabrik,
    JacobianTranspose,
    Analytic,
}

impl SolverKind {
    pub const ALL: [Self; 5] = [
        Self::Ccd,
        Self::Fabrik,
        Self::ConstrainedFabrik,
        Self::JacobianTranspose,
        Self::Analytic,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Ccd => "ccd",
            Self::Fabrik => "fabrik",
            Self::ConstrainedFabrik => "constrainedFabrik",
            Self::JacobianTranspose => "jacobianTranspose",
            Self::Analytic => "analytic",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

#[derive(Clone, Debug)]
pub struct JointData {
    pub name: String,
    pub parent: Option<usize>,
    /// Pivot offset in the parent's local frame (or from the origin for roots).
    pub x: f32,
    pub y: f32,
    /// Display length along local +X. Chains infer segment lengths from pivots instead.
    pub length: f32,
    /// Setup angle in degrees.
    pub rotation: f32,
    pub limits: Option<AngleLimits>,
}

impl JointData {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            x: 0.0,
            y: 0.0,
            length: 0.0,
            rotation: 0.0,
            limits: None,
        }
    }

    pub fn with_parent(mut self, parent: usize) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_offset(mut self, x: f32, y: f32) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn with_length(mut self, length: f32) -> Self {
        self.length = length;
        self
    }

    pub fn with_rotation(mut self, degrees: f32) -> Self {
        self.rotation = degrees;
        self
    }

    pub fn with_limits(mut self, min: f32, max: f32) -> Self {
        self.limits = Some(AngleLimits::new(min, max));
        self
    }
}

/// An ordered run of joints from a proximal joint to the end effector.
#[derive(Clone, Debug)]
pub struct ChainData {
    pub name: String,
    pub joints: Vec<usize>,
    /// Maximum reach as a multiple of the summed segment lengths.
    pub stretch_ratio: f32,
    pub curve_strength: f32,
    /// Lower priorities solve first.
    pub priority: i32,
    /// -1, 0 or +1. Sign of the seeded mid-joint bend.
    pub bend_direction: i32,
    pub solver: SolverKind,
}

impl ChainData {
    pub fn new(name: impl Into<String>, joints: Vec<usize>) -> Self {
        let name = name.into();
        let bend_direction = bend_direction_for_name(&name);
        Self {
            name,
            joints,
            stretch_ratio: 1.0,
            curve_strength: 0.5,
            priority: 0,
            bend_direction,
            solver: SolverKind::default(),
        }
    }

    pub fn with_solver(mut self, solver: SolverKind) -> Self {
        self.solver = solver;
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn effector(&self) -> Option<usize> {
        self.joints.last().copied()
    }
}

/// Left limbs bend one way, right limbs the other; anything else gets no bias.
pub fn bend_direction_for_name(name: &str) -> i32 {
    let lower = name.to_ascii_lowercase();
    if lower.starts_with("left") {
        -1
    } else if lower.starts_with("right") {
        1
    } else {
        0
    }
}

/// Immutable skeleton definition shared by every [`crate::Skeleton`] instance built from it.
#[derive(Clone, Debug)]
pub struct SkeletonData {
    pub joints: Vec<JointData>,
    pub chains: Vec<ChainData>,
    /// Every joint appears after its parent.
    pub solve_order: Vec<usize>,
    pub settings: IkSettings,
    joint_index: HashMap<String, usize>,
    chain_index: HashMap<String, usize>,
}

impl SkeletonData {
    pub fn new(
        joints: Vec<JointData>,
        chains: Vec<ChainData>,
        settings: IkSettings,
    ) -> Result<Arc<Self>, Error> {
        let mut joint_index = HashMap::with_capacity(joints.len());
        for (index, joint) in joints.iter().enumerate() {
            if joint_index.insert(joint.name.clone(), index).is_some() {
                return Err(Error::DuplicateName {
                    kind: "joint",
                    name: joint.name.clone(),
                });
            }
            if let Some(parent) = joint.parent {
                if parent >= joints.len() {
                    return Err(Error::InvalidJointIndex { index: parent });
                }
            }
        }

        let solve_order = topological_order(&joints)?;

        let mut chain_index = HashMap::with_capacity(chains.len());
        for (index, chain) in chains.iter().enumerate() {
            if chain_index.insert(chain.name.clone(), index).is_some() {
                return Err(Error::DuplicateName {
                    kind: "chain",
                    name: chain.name.clone(),
                });
            }
            validate_chain(&joints, chain)?;
        }

        Ok(Arc::new(Self {
            joints,
            chains,
            solve_order,
            settings,
            joint_index,
            chain_index,
        }))
    }

    pub fn joint(&self, name: &str) -> Option<(usize, &JointData)> {
        let index = *self.joint_index.get(name)?;
        Some((index, &self.joints[index]))
    }

    pub fn chain(&self, name: &str) -> Option<(usize, &ChainData)> {
        let index = *self.chain_index.get(name)?;
        Some((index, &self.chains[index]))
    }

    pub fn joint_index(&self, name: &str) -> Result<usize, Error> {
        self.joint_index
            .get(name)
            .copied()
            .ok_or_else(|| Error::UnknownJoint {
                name: name.to_string(),
            })
    }

    pub fn chain_index(&self, name: &str) -> Result<usize, Error> {
        self.chain_index
            .get(name)
            .copied()
            .ok_or_else(|| Error::UnknownChain {
                name: name.to_string(),
            })
    }
}

fn topological_order(joints: &[JointData]) -> Result<Vec<usize>, Error> {
    let mut children = vec![Vec::<usize>::new(); joints.len()];
    let mut order = Vec::with_capacity(joints.len());
    for (index, joint) in joints.iter().enumerate() {
        match joint.parent {
            Some(parent) => children[parent].push(index),
            None => order.push(index),
        }
    }

    let mut cursor = 0;
    while cursor < order.len() {
        let index = order[cursor];
        order.extend_from_slice(&children[index]);
        cursor += 1;
    }

    if order.len() != joints.len() {
        let mut placed = vec![false; joints.len()];
        for &index in &order {
            placed[index] = true;
        }
        let joint = placed
            .iter()
            .position(|placed| !placed)
            .map(|index| joints[index].name.clone())
            .unwrap_or_default();
        return Err(Error::CyclicHierarchy { joint });
    }
    Ok(order)
}

fn validate_chain(joints: &[JointData], chain: &ChainData) -> Result<(), Error> {
    for &joint in &chain.joints {
        if joint >= joints.len() {
            return Err(Error::InvalidChain {
                chain: chain.name.clone(),
                message: format!("joint index {joint} out of range"),
            });
        }
    }
    for pair in chain.joints.windows(2) {
        if joints[pair[1]].parent != Some(pair[0]) {
            return Err(Error::InvalidChain {
                chain: chain.name.clone(),
                message: format!(
                    "'{}' is not a child of '{}'",
                    joints[pair[1]].name, joints[pair[0]].name
                ),
            });
        }
    }
    validate_stretch_ratio(&chain.name, chain.stretch_ratio)
}

pub(crate) fn validate_stretch_ratio(chain: &str, stretch_ratio: f32) -> Result<(), Error> {
    if !stretch_ratio.is_finite() || stretch_ratio <= 0.0 {
        return Err(Error::InvalidChain {
            chain: chain.to_string(),
            message: format!("stretch ratio must be positive, got {stretch_ratio}"),
        });
    }
    Ok(())
}

use crate::{
    AngleLimits, ChainData, Error, IkSettings, JointData, SkeletonData, SolverKind,
    bend_direction_for_name,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct Root {
    #[serde(default)]
    joints: Vec<JointDef>,
    #[serde(default)]
    chains: Vec<ChainDef>,
    #[serde(default)]
    settings: IkSettings,
}

#[derive(Debug, Deserialize)]
struct JointDef {
    name: String,
    #[serde(default)]
    parent: Option<String>,
    #[serde(default)]
    x: f32,
    #[serde(default)]
    y: f32,
    #[serde(default)]
    length: f32,
    #[serde(default)]
    rotation: f32,
    #[serde(default)]
    limits: Option<LimitsDef>,
}

#[derive(Debug, Deserialize)]
struct LimitsDef {
    min: f32,
    max: f32,
}

fn default_one() -> f32 {
    1.0
}

fn default_curve() -> f32 {
    0.5
}

#[derive(Debug, Deserialize)]
struct ChainDef {
    name: String,
    joints: Vec<String>,
    #[serde(default = "default_one", rename = "stretch")]
    stretch_ratio: f32,
    #[serde(default = "default_curve", rename = "curve")]
    curve_strength: f32,
    #[serde(default)]
    priority: i32,
    #[serde(default)]
    bend: Option<i32>,
    #[serde(default)]
    solver: Option<String>,
}

impl SkeletonData {
    /// Loads a skeleton definition. Joints may appear in any order; parents and chain members
    /// are resolved by name.
    pub fn from_json_str(input: &str) -> Result<Arc<Self>, Error> {
        let root: Root = serde_json::from_str(input).map_err(|e| Error::JsonParse {
            message: e.to_string(),
        })?;

        let mut joint_index = HashMap::<&str, usize>::with_capacity(root.joints.len());
        for (index, joint) in root.joints.iter().enumerate() {
            if joint_index.insert(joint.name.as_str(), index).is_some() {
                return Err(Error::DuplicateName {
                    kind: "joint",
                    name: joint.name.clone(),
                });
            }
        }

        let mut joints = Vec::with_capacity(root.joints.len());
        for joint in &root.joints {
            let parent = match joint.parent.as_deref() {
                None => None,
                Some(parent_name) => Some(joint_index.get(parent_name).copied().ok_or_else(
                    || Error::JsonUnknownJointParent {
                        joint: joint.name.clone(),
                        parent: parent_name.to_string(),
                    },
                )?),
            };
            joints.push(JointData {
                name: joint.name.clone(),
                parent,
                x: joint.x,
                y: joint.y,
                length: joint.length,
                rotation: joint.rotation,
                limits: joint
                    .limits
                    .as_ref()
                    .map(|limits| AngleLimits::new(limits.min, limits.max)),
            });
        }

        let mut chains = Vec::with_capacity(root.chains.len());
        for chain in &root.chains {
            let mut members = Vec::with_capacity(chain.joints.len());
            for joint in &chain.joints {
                let index = joint_index.get(joint.as_str()).copied().ok_or_else(|| {
                    Error::JsonUnknownChainJoint {
                        chain: chain.name.clone(),
                        joint: joint.clone(),
                    }
                })?;
                members.push(index);
            }
            let solver = match chain.solver.as_deref() {
                None => SolverKind::default(),
                Some(value) => {
                    SolverKind::from_name(value).ok_or_else(|| Error::JsonUnknownSolver {
                        chain: chain.name.clone(),
                        value: value.to_string(),
                    })?
                }
            };
            chains.push(ChainData {
                name: chain.name.clone(),
                joints: members,
                stretch_ratio: chain.stretch_ratio,
                curve_strength: chain.curve_strength,
                priority: chain.priority,
                bend_direction: chain
                    .bend
                    .map(i32::signum)
                    .unwrap_or_else(|| bend_direction_for_name(&chain.name)),
                solver,
            });
        }

        Self::new(joints, chains, root.settings)
    }
}

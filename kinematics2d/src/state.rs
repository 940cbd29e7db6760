//! Plain-data snapshots for persistence.
//!
//! Records are keyed by joint and chain names, never by in-memory indices, so a snapshot can be
//! restored onto any instance built from the same definition.

use crate::model::validate_stretch_ratio;
use crate::{
    AngleWrap, Error, IkSettings, Joint, JointConstraint, JointTree, Skeleton, SolverKind,
};
use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JointRecord {
    pub angle: f32,
    pub target_angle: f32,
    pub fk_enabled: bool,
    pub ik_enabled: bool,
    pub ik_weight: f32,
    pub stiffness: f32,
    pub damping: f32,
    pub rotation_speed: f32,
    pub constraint: JointConstraint,
}

impl From<&Joint> for JointRecord {
    fn from(joint: &Joint) -> Self {
        Self {
            angle: joint.angle,
            target_angle: joint.target_angle,
            fk_enabled: joint.fk_enabled,
            ik_enabled: joint.ik_enabled,
            ik_weight: joint.ik_weight,
            stiffness: joint.stiffness,
            damping: joint.damping,
            rotation_speed: joint.rotation_speed,
            constraint: joint.constraint,
        }
    }
}

impl JointRecord {
    /// Rebuilds the joint for `name`, pulling its angles back inside the recorded constraint.
    /// Non-finite numbers are rejected.
    pub fn to_joint(&self, name: &str, wrap: AngleWrap) -> Result<Joint, Error> {
        let values = [
            ("angle", self.angle),
            ("targetAngle", self.target_angle),
            ("ikWeight", self.ik_weight),
            ("stiffness", self.stiffness),
            ("damping", self.damping),
            ("rotationSpeed", self.rotation_speed),
            ("minAngle", self.constraint.min_angle),
            ("maxAngle", self.constraint.max_angle),
        ];
        if let Some((field, value)) = values.iter().find(|(_, value)| !value.is_finite()) {
            return Err(Error::InvalidValue {
                message: format!("joint '{name}': {field} is {value}"),
            });
        }

        let mut joint = Joint {
            angle: self.angle,
            target_angle: self.target_angle,
            fk_enabled: self.fk_enabled,
            ik_enabled: self.ik_enabled,
            ik_weight: self.ik_weight,
            stiffness: self.stiffness,
            damping: self.damping,
            rotation_speed: self.rotation_speed,
            constraint: self.constraint,
        };
        joint.enforce_constraint(wrap);
        Ok(joint)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainRecord {
    pub active: bool,
    #[serde(default)]
    pub target: Option<Vec2>,
    pub stretch_ratio: f32,
    pub curve_strength: f32,
    pub priority: i32,
    pub bend_direction: i32,
    pub solver: SolverKind,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SkeletonState {
    pub joints: BTreeMap<String, JointRecord>,
    pub chains: BTreeMap<String, ChainRecord>,
    pub settings: Option<IkSettings>,
}

impl Skeleton {
    pub fn save_state(&self) -> SkeletonState {
        let joints = self
            .data
            .joints
            .iter()
            .zip(&self.joints)
            .map(|(data, joint)| (data.name.clone(), JointRecord::from(joint)))
            .collect();
        let chains = self
            .chains
            .iter()
            .map(|chain| {
                let name = self.data.chains[chain.data_index()].name.clone();
                let record = ChainRecord {
                    active: chain.active,
                    target: chain.target,
                    stretch_ratio: chain.stretch_ratio,
                    curve_strength: chain.curve_strength,
                    priority: chain.priority,
                    bend_direction: chain.bend_direction,
                    solver: chain.solver,
                };
                (name, record)
            })
            .collect();
        SkeletonState {
            joints,
            chains,
            settings: Some(self.settings.clone()),
        }
    }

    /// Applies a snapshot. Records naming joints or chains this skeleton does not have are
    /// skipped. Every record is checked before anything is applied, so an error leaves the
    /// skeleton untouched.
    pub fn restore_state(&mut self, state: &SkeletonState) -> Result<(), Error> {
        let mut joints = Vec::with_capacity(state.joints.len());
        for (name, record) in &state.joints {
            let Some((index, _)) = self.data.joint(name) else {
                log::warn!("restore: skipping unknown joint '{name}'");
                continue;
            };
            joints.push((index, record.to_joint(name, AngleWrap::Signed)?));
        }
        let mut chains = Vec::with_capacity(state.chains.len());
        for (name, record) in &state.chains {
            let Some((index, _)) = self.data.chain(name) else {
                log::warn!("restore: skipping unknown chain '{name}'");
                continue;
            };
            validate_stretch_ratio(name, record.stretch_ratio)?;
            chains.push((index, record));
        }

        for (index, joint) in joints {
            self.joints[index] = joint;
        }
        for (index, record) in chains {
            let chain = &mut self.chains[index];
            chain.active = record.active;
            chain.target = record.target;
            chain.stretch_ratio = record.stretch_ratio;
            chain.curve_strength = record.curve_strength;
            chain.priority = record.priority;
            chain.bend_direction = record.bend_direction;
            chain.solver = record.solver;
        }
        if let Some(settings) = &state.settings {
            let seed = settings.seed;
            self.settings = settings.clone();
            self.reseed(seed);
        }
        self.update_world_transform();
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeJointRecord {
    pub name: String,
    #[serde(default)]
    pub parent: Option<String>,
    pub offset: Vec2,
    pub length: f32,
    #[serde(flatten)]
    pub joint: JointRecord,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeState {
    pub origin: Vec2,
    #[serde(default)]
    pub wrap: AngleWrap,
    #[serde(default)]
    pub effector: Option<String>,
    pub effector_weight: f32,
    /// Parents are always listed before their children.
    pub joints: Vec<TreeJointRecord>,
}

impl JointTree {
    pub fn save_state(&self) -> TreeState {
        let mut joints = Vec::with_capacity(self.len());
        let mut stack: Vec<usize> = self.roots().into_iter().rev().collect();
        while let Some(index) = stack.pop() {
            let Some(node) = self.get(index) else {
                continue;
            };
            joints.push(TreeJointRecord {
                name: node.name.clone(),
                parent: node
                    .parent()
                    .and_then(|parent| self.get(parent))
                    .map(|parent| parent.name.clone()),
                offset: node.offset,
                length: node.length,
                joint: JointRecord::from(&node.joint),
            });
            stack.extend(node.children().iter().rev().copied());
        }

        TreeState {
            origin: self.origin,
            wrap: self.wrap,
            effector: self
                .effector()
                .and_then(|index| self.get(index))
                .map(|node| node.name.clone()),
            effector_weight: self.effector_weight,
            joints,
        }
    }

    /// Rebuilds a tree from a snapshot. Joint names must be unique and every parent must be
    /// listed before its children.
    pub fn from_state(state: &TreeState) -> Result<Self, Error> {
        let mut tree = Self::new(state.origin);
        tree.wrap = state.wrap;
        tree.effector_weight = state.effector_weight;

        let mut by_name = HashMap::<&str, usize>::with_capacity(state.joints.len());
        for record in &state.joints {
            let index = match record.parent.as_deref() {
                None => tree.add_root(record.name.clone(), record.offset, record.length),
                Some(parent) => {
                    let parent = by_name.get(parent).copied().ok_or_else(|| {
                        Error::UnknownJoint {
                            name: parent.to_string(),
                        }
                    })?;
                    tree.add_joint(parent, record.name.clone(), record.offset, record.length)?
                }
            };
            if by_name.insert(record.name.as_str(), index).is_some() {
                return Err(Error::DuplicateName {
                    kind: "joint",
                    name: record.name.clone(),
                });
            }
            let joint = record.joint.to_joint(&record.name, tree.wrap)?;
            if let Some(node) = tree.get_mut(index) {
                node.joint = joint;
            }
        }

        if let Some(name) = state.effector.as_deref() {
            let index = by_name
                .get(name)
                .copied()
                .ok_or_else(|| Error::UnknownJoint {
                    name: name.to_string(),
                })?;
            tree.set_effector(Some(index))?;
        }
        Ok(tree)
    }
}

#[cfg(feature = "json")]
impl SkeletonState {
    pub fn to_json_string(&self) -> Result<String, Error> {
        serde_json::to_string(self).map_err(|e| Error::JsonParse {
            message: e.to_string(),
        })
    }

    pub fn from_json_str(input: &str) -> Result<Self, Error> {
        serde_json::from_str(input).map_err(|e| Error::JsonParse {
            message: e.to_string(),
        })
    }
}

#[cfg(feature = "json")]
impl TreeState {
    pub fn to_json_string(&self) -> Result<String, Error> {
        serde_json::to_string(self).map_err(|e| Error::JsonParse {
            message: e.to_string(),
        })
    }

    pub fn from_json_str(input: &str) -> Result<Self, Error> {
        serde_json::from_str(input).map_err(|e| Error::JsonParse {
            message: e.to_string(),
        })
    }
}

use crate::{AngleLimits, Joint, JointTree, Skeleton, WorldTransform};
use glam::Vec2;

/// Everything a renderer needs to draw one joint without re-deriving kinematics.
#[derive(Clone, Debug, PartialEq)]
pub struct JointVisual {
    pub index: usize,
    pub parent: Option<usize>,
    pub position: Vec2,
    /// World orientation in degrees.
    pub rotation: f32,
    /// End of the joint's display segment.
    pub tip: Vec2,
    pub fk_enabled: bool,
    pub ik_enabled: bool,
    pub constraint: Option<AngleLimits>,
}

impl JointVisual {
    fn new(
        index: usize,
        parent: Option<usize>,
        world: &WorldTransform,
        length: f32,
        joint: &Joint,
    ) -> Self {
        Self {
            index,
            parent,
            position: world.position,
            rotation: world.rotation,
            tip: world.tip(length),
            fk_enabled: joint.fk_enabled,
            ik_enabled: joint.ik_enabled,
            constraint: joint.constraint.limits(),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TargetHandle {
    pub chain: usize,
    pub position: Vec2,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct JointList {
    pub joints: Vec<JointVisual>,
    pub targets: Vec<TargetHandle>,
}

impl JointList {
    pub fn clear(&mut self) {
        self.joints.clear();
        self.targets.clear();
    }
}

/// Snapshot of a skeleton's cached world transforms, in solve order.
pub fn build_joint_list(skeleton: &Skeleton) -> JointList {
    let mut out = JointList::default();
    append_joint_list(&mut out, skeleton);
    out
}

pub fn append_joint_list(out: &mut JointList, skeleton: &Skeleton) {
    for &index in &skeleton.data.solve_order {
        let Some(world) = skeleton.world(index) else {
            continue;
        };
        let data = &skeleton.data.joints[index];
        out.joints.push(JointVisual::new(
            index,
            data.parent,
            world,
            data.length,
            &skeleton.joints[index],
        ));
    }
    for (chain, state) in skeleton.chains.iter().enumerate() {
        if let Some(position) = state.target {
            out.targets.push(TargetHandle { chain, position });
        }
    }
}

/// Snapshot of a joint tree, in index order.
pub fn build_tree_joint_list(tree: &JointTree) -> JointList {
    let mut out = JointList::default();
    for (index, node) in tree.iter() {
        let Ok(world) = tree.world_transform(index) else {
            continue;
        };
        out.joints.push(JointVisual::new(
            index,
            node.parent(),
            &world,
            node.length,
            &node.joint,
        ));
    }
    out
}

use crate::math::{angle_difference, signed_angle_between};
use crate::{AngleWrap, Error, Hierarchy, Joint, WorldTransform, world_transform};
use glam::Vec2;

#[derive(Clone, Debug)]
pub struct TreeJoint {
    pub name: String,
    parent: Option<usize>,
    children: Vec<usize>,
    /// Pivot in the parent's frame; for roots, the position relative to the tree origin.
    pub offset: Vec2,
    /// Segment length along local +X.
    pub length: f32,
    pub joint: Joint,
}

impl TreeJoint {
    pub fn parent(&self) -> Option<usize> {
        self.parent
    }

    pub fn children(&self) -> &[usize] {
        &self.children
    }
}

/// Outcome of [`JointTree::update_ik`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TreeSolveReport {
    pub distance: f32,
    pub iterations: u32,
    pub converged: bool,
}

/// Editable joint hierarchy driven by a single end effector.
///
/// Joints live in an arena and keep their index for as long as they exist. Indices are never
/// reused: a removed slot stays vacant, so a stale index resolves to nothing instead of to a
/// newer joint. Round-tripping through [`JointTree::save_state`] and [`JointTree::from_state`]
/// yields a compacted tree.
#[derive(Clone, Debug)]
pub struct JointTree {
    nodes: Vec<Option<TreeJoint>>,
    pub origin: Vec2,
    pub wrap: AngleWrap,
    effector: Option<usize>,
    pub effector_weight: f32,
}

impl Default for JointTree {
    fn default() -> Self {
        Self::new(Vec2::ZERO)
    }
}

impl Hierarchy for JointTree {
    fn contains(&self, joint: usize) -> bool {
        self.get(joint).is_some()
    }

    fn parent(&self, joint: usize) -> Option<usize> {
        self.get(joint).and_then(|node| node.parent)
    }

    fn pivot(&self, joint: usize) -> Vec2 {
        self.get(joint).map(|node| node.offset).unwrap_or(Vec2::ZERO)
    }
}

impl JointTree {
    pub fn new(origin: Vec2) -> Self {
        Self {
            nodes: Vec::new(),
            origin,
            wrap: AngleWrap::Signed,
            effector: None,
            effector_weight: 1.0,
        }
    }

    /// Number of live joints.
    pub fn len(&self) -> usize {
        self.nodes.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// One past the highest index ever handed out. Grows on every add, never shrinks.
    pub fn capacity(&self) -> usize {
        self.nodes.len()
    }

    pub fn get(&self, index: usize) -> Option<&TreeJoint> {
        self.nodes.get(index).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut TreeJoint> {
        self.nodes.get_mut(index).and_then(Option::as_mut)
    }

    fn node(&self, index: usize) -> Result<&TreeJoint, Error> {
        self.get(index).ok_or(Error::InvalidJointIndex { index })
    }

    fn node_mut(&mut self, index: usize) -> Result<&mut TreeJoint, Error> {
        self.get_mut(index).ok_or(Error::InvalidJointIndex { index })
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &TreeJoint)> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(index, node)| node.as_ref().map(|node| (index, node)))
    }

    pub fn find(&self, name: &str) -> Option<usize> {
        self.iter()
            .find(|(_, node)| node.name == name)
            .map(|(index, _)| index)
    }

    pub fn roots(&self) -> Vec<usize> {
        self.iter()
            .filter(|(_, node)| node.parent.is_none())
            .map(|(index, _)| index)
            .collect()
    }

    pub fn add_root(&mut self, name: impl Into<String>, position: Vec2, length: f32) -> usize {
        self.push(TreeJoint {
            name: name.into(),
            parent: None,
            children: Vec::new(),
            offset: position,
            length,
            joint: Joint::default(),
        })
    }

    pub fn add_joint(
        &mut self,
        parent: usize,
        name: impl Into<String>,
        offset: Vec2,
        length: f32,
    ) -> Result<usize, Error> {
        self.node(parent)?;
        let index = self.push(TreeJoint {
            name: name.into(),
            parent: Some(parent),
            children: Vec::new(),
            offset,
            length,
            joint: Joint::default(),
        });
        self.node_mut(parent)?.children.push(index);
        Ok(index)
    }

    /// Appends a joint at the tip of `parent` (offset `(parent.length, 0)`).
    pub fn extend(
        &mut self,
        parent: usize,
        name: impl Into<String>,
        length: f32,
    ) -> Result<usize, Error> {
        let offset = Vec2::new(self.node(parent)?.length, 0.0);
        self.add_joint(parent, name, offset, length)
    }

    fn push(&mut self, node: TreeJoint) -> usize {
        self.nodes.push(Some(node));
        self.nodes.len() - 1
    }

    /// Removes a non-root joint. Its children move to its former parent, in its place, with
    /// their pivot offsets untouched.
    pub fn remove_joint(&mut self, index: usize) -> Result<TreeJoint, Error> {
        let parent = self
            .node(index)?
            .parent
            .ok_or(Error::RootRemoval { index })?;
        let removed = self.nodes[index]
            .take()
            .ok_or(Error::InvalidJointIndex { index })?;

        for &child in &removed.children {
            if let Some(node) = self.get_mut(child) {
                node.parent = Some(parent);
            }
        }
        let siblings = &mut self.node_mut(parent)?.children;
        let slot = siblings
            .iter()
            .position(|&child| child == index)
            .unwrap_or(siblings.len());
        let end = (slot + 1).min(siblings.len());
        siblings.splice(slot..end, removed.children.iter().copied());

        if self.effector == Some(index) {
            self.effector = None;
        }
        Ok(removed)
    }

    pub fn effector(&self) -> Option<usize> {
        self.effector
    }

    pub fn set_effector(&mut self, effector: Option<usize>) -> Result<(), Error> {
        if let Some(index) = effector {
            self.node(index)?;
        }
        self.effector = effector;
        Ok(())
    }

    /// Angles indexed by joint id; vacant slots read as zero.
    pub fn angles(&self) -> Vec<f32> {
        self.nodes
            .iter()
            .map(|node| node.as_ref().map_or(0.0, |node| node.joint.angle))
            .collect()
    }

    pub fn world_transform(&self, index: usize) -> Result<WorldTransform, Error> {
        world_transform(self, index, &self.angles(), self.origin)
    }

    /// Forward-kinematics step for every joint.
    pub fn update(&mut self, delta: f32) {
        let wrap = self.wrap;
        for node in self.nodes.iter_mut().flatten() {
            node.joint.advance(delta, wrap);
        }
    }

    /// Damped CCD from the effector's parent up to the root.
    ///
    /// Each IK-enabled ancestor turns by the angle between its effector and target rays, scaled
    /// by `ik_weight * effector_weight`, clamped to its constraint and then applied only by
    /// `1 - damping`. Stops after `iterations` sweeps or once within `threshold`.
    pub fn update_ik(
        &mut self,
        target: Vec2,
        iterations: u32,
        threshold: f32,
    ) -> Result<TreeSolveReport, Error> {
        let Some(effector) = self.effector else {
            return Ok(TreeSolveReport {
                distance: f32::INFINITY,
                iterations: 0,
                converged: false,
            });
        };

        let mut ancestors = Vec::new();
        let mut current = self.node(effector)?.parent;
        while let Some(index) = current {
            ancestors.push(index);
            current = self.node(index)?.parent;
        }

        let wrap = self.wrap;
        let effector_weight = self.effector_weight;
        let mut end = self.world_transform(effector)?.position;
        let mut distance = end.distance(target);
        let mut used = 0;

        while used < iterations && distance >= threshold {
            used += 1;
            for &index in &ancestors {
                if !self.node(index)?.joint.ik_enabled {
                    continue;
                }
                let pivot = self.world_transform(index)?.position;
                let Some(delta) = signed_angle_between(end - pivot, target - pivot) else {
                    continue;
                };

                let joint = &mut self.node_mut(index)?.joint;
                let weighted = delta * joint.ik_weight * effector_weight;
                let desired = joint.constrain(joint.angle + weighted, wrap);
                let blend = 1.0 - joint.damping.clamp(0.0, 1.0);
                let next = joint.angle + angle_difference(joint.angle, desired) * blend;
                joint.set_angle(next, wrap);

                end = self.world_transform(effector)?.position;
            }
            distance = end.distance(target);
        }

        Ok(TreeSolveReport {
            distance,
            iterations: used,
            converged: distance < threshold,
        })
    }
}

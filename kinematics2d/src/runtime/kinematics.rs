use crate::math::{rotate_degrees, unit_from_degrees};
use crate::{Error, SkeletonData, Transform2};
use glam::Vec2;

/// Parent links and fixed pivot offsets of a joint hierarchy.
pub trait Hierarchy {
    fn contains(&self, joint: usize) -> bool;

    fn parent(&self, joint: usize) -> Option<usize>;

    /// Pivot offset in the parent's local frame; roots are offset from the origin.
    fn pivot(&self, joint: usize) -> Vec2;
}

impl Hierarchy for SkeletonData {
    fn contains(&self, joint: usize) -> bool {
        joint < self.joints.len()
    }

    fn parent(&self, joint: usize) -> Option<usize> {
        self.joints.get(joint).and_then(|j| j.parent)
    }

    fn pivot(&self, joint: usize) -> Vec2 {
        self.joints
            .get(joint)
            .map(|j| Vec2::new(j.x, j.y))
            .unwrap_or(Vec2::ZERO)
    }
}

/// World placement of a joint.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct WorldTransform {
    pub position: Vec2,
    /// Accumulated orientation in degrees, including the joint's own angle.
    pub rotation: f32,
    /// Accumulated orientation before the joint's own angle was added.
    pub parent_rotation: f32,
}

impl WorldTransform {
    pub fn root(origin: Vec2, pivot: Vec2, angle: f32) -> Self {
        Self {
            position: origin + pivot,
            rotation: angle,
            parent_rotation: 0.0,
        }
    }

    /// Places a child whose pivot is expressed in this joint's frame.
    pub fn child(&self, pivot: Vec2, angle: f32) -> Self {
        Self {
            position: self.position + rotate_degrees(pivot, self.rotation),
            rotation: self.rotation + angle,
            parent_rotation: self.rotation,
        }
    }

    /// World position of a point at `length` along the joint's local +X.
    pub fn tip(&self, length: f32) -> Vec2 {
        self.position + unit_from_degrees(self.rotation) * length
    }

    pub fn to_transform(&self) -> Transform2 {
        Transform2::from_rotation_translation(self.rotation, self.position)
    }
}

/// Walks the ancestor path of `joint` from its hierarchy root, accumulating position and
/// orientation. `angles` is indexed by joint id.
pub fn world_transform<H: Hierarchy + ?Sized>(
    hierarchy: &H,
    joint: usize,
    angles: &[f32],
    origin: Vec2,
) -> Result<WorldTransform, Error> {
    let path = ancestor_path(hierarchy, joint)?;
    let mut world: Option<WorldTransform> = None;
    for index in path {
        let angle = *angles
            .get(index)
            .ok_or(Error::InvalidJointIndex { index })?;
        let pivot = hierarchy.pivot(index);
        world = Some(match world {
            None => WorldTransform::root(origin, pivot, angle),
            Some(parent) => parent.child(pivot, angle),
        });
    }
    world.ok_or(Error::InvalidJointIndex { index: joint })
}

/// Joint ids from the hierarchy root down to `joint`, inclusive.
pub fn ancestor_path<H: Hierarchy + ?Sized>(
    hierarchy: &H,
    joint: usize,
) -> Result<Vec<usize>, Error> {
    if !hierarchy.contains(joint) {
        return Err(Error::InvalidJointIndex { index: joint });
    }
    let mut path = vec![joint];
    let mut current = joint;
    while let Some(parent) = hierarchy.parent(current) {
        if !hierarchy.contains(parent) {
            return Err(Error::InvalidJointIndex { index: parent });
        }
        if path.contains(&parent) {
            return Err(Error::CyclicHierarchy {
                joint: parent.to_string(),
            });
        }
        path.push(parent);
        current = parent;
    }
    path.reverse();
    Ok(path)
}

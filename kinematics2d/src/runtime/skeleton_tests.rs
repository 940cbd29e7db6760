use crate::{
    ChainData, Error, IkSettings, JointData, Skeleton, SkeletonData, SolverKind, build_joint_list,
};
use glam::Vec2;
use std::sync::Arc;

fn assert_approx(actual: f32, expected: f32, tolerance: f32) {
    let diff = (actual - expected).abs();
    assert!(
        diff <= tolerance,
        "expected {expected}, got {actual} (diff {diff})"
    );
}

const ROOT: usize = 0;
const RIGHT_SHOULDER: usize = 1;
const RIGHT_ELBOW: usize = 2;
const RIGHT_WRIST: usize = 3;
const LEFT_SHOULDER: usize = 4;
const LEFT_ELBOW: usize = 5;
const LEFT_WRIST: usize = 6;

fn body(right_solver: SolverKind) -> Arc<SkeletonData> {
    let joints = vec![
        JointData::new("root"),
        JointData::new("rightShoulder")
            .with_parent(ROOT)
            .with_offset(0.0, 10.0)
            .with_length(50.0),
        JointData::new("rightElbow")
            .with_parent(RIGHT_SHOULDER)
            .with_offset(50.0, 0.0)
            .with_length(40.0),
        JointData::new("rightWrist")
            .with_parent(RIGHT_ELBOW)
            .with_offset(40.0, 0.0),
        JointData::new("leftShoulder")
            .with_parent(ROOT)
            .with_offset(0.0, -10.0)
            .with_length(50.0),
        JointData::new("leftElbow")
            .with_parent(LEFT_SHOULDER)
            .with_offset(50.0, 0.0)
            .with_length(40.0),
        JointData::new("leftWrist")
            .with_parent(LEFT_ELBOW)
            .with_offset(40.0, 0.0),
    ];
    let chains = vec![
        ChainData::new("rightArm", vec![RIGHT_SHOULDER, RIGHT_ELBOW, RIGHT_WRIST])
            .with_solver(right_solver)
            .with_priority(1),
        ChainData::new("leftArm", vec![LEFT_SHOULDER, LEFT_ELBOW, LEFT_WRIST])
            .with_solver(SolverKind::Ccd),
    ];
    SkeletonData::new(joints, chains, IkSettings::default()).unwrap()
}

#[test]
fn rest_pose_follows_pivot_offsets() {
    let mut skeleton = Skeleton::new(body(SolverKind::Analytic));
    let wrist = skeleton.world(RIGHT_WRIST).unwrap();
    assert_approx(wrist.position.x, 90.0, 1.0e-4);
    assert_approx(wrist.position.y, 10.0, 1.0e-4);

    skeleton.x = 5.0;
    skeleton.y = -5.0;
    skeleton.joints[ROOT].angle = 90.0;
    let wrist = skeleton.world_transform(LEFT_WRIST).unwrap();
    assert_approx(wrist.position.x, 15.0, 1.0e-3);
    assert_approx(wrist.position.y, 85.0, 1.0e-3);
    assert_approx(wrist.rotation, 90.0, 1.0e-4);
}

#[test]
fn cached_world_lags_until_updated() {
    let mut skeleton = Skeleton::new(body(SolverKind::Analytic));
    skeleton.joints[RIGHT_SHOULDER].angle = 90.0;
    let stale = *skeleton.world(RIGHT_ELBOW).unwrap();
    let fresh = skeleton.world_transform(RIGHT_ELBOW).unwrap();
    assert_approx(stale.position.x, 50.0, 1.0e-4);
    assert_approx(fresh.position.x, 0.0, 1.0e-3);

    skeleton.update_world_transform();
    let cached = *skeleton.world(RIGHT_ELBOW).unwrap();
    assert_approx(cached.position.x, fresh.position.x, 1.0e-4);
    assert_approx(cached.position.y, fresh.position.y, 1.0e-4);
    assert!(skeleton.world(99).is_none());
}

#[test]
fn solve_chain_writes_angles_back() {
    let mut skeleton = Skeleton::new(body(SolverKind::Analytic));
    skeleton.joints[ROOT].angle = 30.0;
    let shoulder = skeleton.world_transform(RIGHT_SHOULDER).unwrap().position;
    let target = shoulder + Vec2::new(60.0, 30.0);
    skeleton.set_target("rightArm", target).unwrap();
    let chain = skeleton.chain_index("rightArm").unwrap();

    let solution = skeleton.solve_chain(chain).unwrap().unwrap();
    assert!(solution.converged, "{solution:?}");
    assert_approx(skeleton.joints[RIGHT_SHOULDER].angle, solution.angles[0], 1.0e-4);
    assert_approx(skeleton.joints[RIGHT_ELBOW].angle, solution.angles[1], 1.0e-4);

    let wrist = skeleton.world_transform(RIGHT_WRIST).unwrap().position;
    assert_approx(wrist.x, target.x, 1.0e-2);
    assert_approx(wrist.y, target.y, 1.0e-2);
}

#[test]
fn untargeted_and_inactive_chains_are_skipped() {
    let mut skeleton = Skeleton::new(body(SolverKind::Analytic));
    assert!(skeleton.solve_chain(0).unwrap().is_none());

    skeleton.set_target("rightArm", Vec2::new(40.0, 60.0)).unwrap();
    skeleton.chain_mut("rightArm").unwrap().active = false;
    assert!(skeleton.solve_chain(0).unwrap().is_none());
    assert!(skeleton.solve_ik().is_empty());
    assert!(skeleton.angles().iter().all(|&angle| angle == 0.0));

    skeleton.chain_mut("rightArm").unwrap().active = true;
    skeleton.clear_target("rightArm").unwrap();
    assert!(skeleton.solve_ik().is_empty());
}

#[test]
fn ik_disabled_joints_keep_their_angle() {
    let mut skeleton = Skeleton::new(body(SolverKind::Ccd));
    skeleton.joint_mut("rightElbow").unwrap().angle = 25.0;
    skeleton.joint_mut("rightElbow").unwrap().ik_enabled = false;
    skeleton.set_target("rightArm", Vec2::new(20.0, 80.0)).unwrap();
    skeleton.solve_ik();
    assert_eq!(skeleton.joints[RIGHT_ELBOW].angle, 25.0);
    assert_ne!(skeleton.joints[RIGHT_SHOULDER].angle, 0.0);
}

#[test]
fn chains_solve_in_priority_order_and_independently() {
    let mut skeleton = Skeleton::new(body(SolverKind::ConstrainedFabrik));
    skeleton.set_target("rightArm", Vec2::new(60.0, 50.0)).unwrap();
    skeleton.set_target("leftArm", Vec2::new(60.0, -50.0)).unwrap();

    let solutions = skeleton.solve_ik();
    let order: Vec<usize> = solutions.iter().map(|(index, _)| *index).collect();
    assert_eq!(order, vec![1, 0]);
    // Runtime priority decides; equal priorities keep declaration order.
    skeleton.chains[1].priority = 1;
    let order: Vec<usize> = skeleton.solve_ik().iter().map(|(index, _)| *index).collect();
    assert_eq!(order, vec![0, 1]);
    skeleton.chains[1].priority = 0;

    let right = skeleton.world_transform(RIGHT_WRIST).unwrap().position;
    let left = skeleton.world_transform(LEFT_WRIST).unwrap().position;
    assert!(right.distance(Vec2::new(60.0, 50.0)) < 0.5, "{right}");
    assert!(left.distance(Vec2::new(60.0, -50.0)) < 0.5, "{left}");

    // Retargeting one chain leaves the other untouched.
    let left_angles = [
        skeleton.joints[LEFT_SHOULDER].angle,
        skeleton.joints[LEFT_ELBOW].angle,
    ];
    skeleton.chain_mut("leftArm").unwrap().active = false;
    skeleton.set_target("rightArm", Vec2::new(30.0, 70.0)).unwrap();
    skeleton.solve_ik();
    assert_eq!(skeleton.joints[LEFT_SHOULDER].angle, left_angles[0]);
    assert_eq!(skeleton.joints[LEFT_ELBOW].angle, left_angles[1]);
}

#[test]
fn step_solves_and_refreshes_world_transforms() {
    let mut skeleton = Skeleton::new(body(SolverKind::Analytic));
    let target = Vec2::new(50.0, 60.0);
    skeleton.set_target("rightArm", target).unwrap();
    let solutions = skeleton.step(1.0 / 60.0);
    assert_eq!(solutions.len(), 1);
    let wrist = skeleton.world(RIGHT_WRIST).unwrap().position;
    assert_approx(wrist.x, target.x, 1.0e-2);
    assert_approx(wrist.y, target.y, 1.0e-2);
}

#[test]
fn seeded_skeletons_solve_identically() {
    let data = body(SolverKind::ConstrainedFabrik);
    let mut a = Skeleton::new(data.clone());
    let mut b = Skeleton::new(data);
    for skeleton in [&mut a, &mut b] {
        skeleton.set_target("rightArm", Vec2::new(-70.0, 40.0)).unwrap();
        skeleton.solve_ik();
    }
    assert_eq!(a.angles(), b.angles());
}

#[test]
fn unknown_names_and_indices_are_errors() {
    let mut skeleton = Skeleton::new(body(SolverKind::Analytic));
    assert!(matches!(
        skeleton.set_target("tail", Vec2::ZERO),
        Err(Error::UnknownChain { .. })
    ));
    assert!(matches!(
        skeleton.joint_mut("knee"),
        Err(Error::UnknownJoint { .. })
    ));
    assert!(matches!(
        skeleton.solve_chain(9),
        Err(Error::InvalidChainIndex { index: 9 })
    ));
}

#[test]
fn joint_list_mirrors_the_cached_pose() {
    let mut skeleton = Skeleton::new(body(SolverKind::Analytic));
    skeleton.joints[LEFT_ELBOW].ik_enabled = false;
    skeleton.set_target("leftArm", Vec2::new(10.0, -60.0)).unwrap();
    let list = build_joint_list(&skeleton);

    assert_eq!(list.joints.len(), 7);
    assert_eq!(list.joints[0].index, ROOT);
    assert_eq!(list.targets.len(), 1);
    assert_eq!(list.targets[0].chain, 1);

    let shoulder = list
        .joints
        .iter()
        .find(|visual| visual.index == RIGHT_SHOULDER)
        .unwrap();
    assert_eq!(shoulder.parent, Some(ROOT));
    assert_approx(shoulder.tip.x, 50.0, 1.0e-4);
    assert_approx(shoulder.tip.y, 10.0, 1.0e-4);

    let elbow = list
        .joints
        .iter()
        .find(|visual| visual.index == LEFT_ELBOW)
        .unwrap();
    assert!(!elbow.ik_enabled);
}

use crate::{AngleLimits, AngleWrap, Joint};

fn assert_approx(actual: f32, expected: f32) {
    let diff = (actual - expected).abs();
    assert!(
        diff <= 1.0e-4,
        "expected {expected}, got {actual} (diff {diff})"
    );
}

#[test]
fn advance_snaps_without_rotation_speed() {
    let mut joint = Joint::new(10.0);
    joint.target_angle = 80.0;
    joint.advance(0.016, AngleWrap::Signed);
    assert_approx(joint.angle, 80.0);
}

#[test]
fn advance_is_rate_limited_and_scaled_by_stiffness() {
    let mut joint = Joint::new(0.0);
    joint.rotation_speed = 90.0;
    joint.target_angle = 90.0;
    joint.advance(0.5, AngleWrap::Signed);
    assert_approx(joint.angle, 45.0);

    joint.stiffness = 0.5;
    joint.advance(0.5, AngleWrap::Signed);
    assert_approx(joint.angle, 67.5);

    joint.stiffness = 1.0;
    joint.advance(10.0, AngleWrap::Signed);
    assert_approx(joint.angle, 67.5);
}

#[test]
fn advance_takes_the_shortest_arc_across_the_seam() {
    let mut joint = Joint::new(170.0);
    joint.rotation_speed = 10.0;
    joint.target_angle = -170.0;
    joint.advance(1.0, AngleWrap::Signed);
    assert_approx(joint.angle, 180.0);
    joint.advance(1.0, AngleWrap::Signed);
    assert_approx(joint.angle, -170.0);
}

#[test]
fn disabled_fk_holds_the_pose() {
    let mut joint = Joint::new(5.0);
    joint.fk_enabled = false;
    joint.target_angle = 50.0;
    joint.advance(1.0, AngleWrap::Signed);
    assert_approx(joint.angle, 5.0);
}

#[test]
fn constraint_clamps_and_wins_over_wrapping() {
    let mut joint = Joint::new(0.0);
    joint.set_constraint(30.0, -45.0);
    assert_approx(joint.constraint.min_angle, -45.0);
    assert_approx(joint.constraint.max_angle, 30.0);

    joint.set_angle(100.0, AngleWrap::Positive);
    assert_approx(joint.angle, 30.0);
    joint.set_angle(-100.0, AngleWrap::Positive);
    assert_approx(joint.angle, -45.0);

    joint.clear_constraint();
    joint.set_angle(-100.0, AngleWrap::Positive);
    assert_approx(joint.angle, 260.0);
    joint.set_angle(350.0, AngleWrap::Signed);
    assert_approx(joint.angle, -10.0);
}

#[test]
fn ik_disabled_joint_is_locked_for_solvers() {
    let mut joint = Joint::new(25.0).with_limits(Some(AngleLimits::new(-90.0, 90.0)));
    assert_eq!(joint.solver_limits(), Some(AngleLimits::new(-90.0, 90.0)));
    joint.ik_enabled = false;
    assert_eq!(joint.solver_limits(), Some(AngleLimits::locked(25.0)));
}

#[test]
fn with_limits_pulls_setup_angle_into_range() {
    let joint = Joint::new(120.0).with_limits(Some(AngleLimits::new(-10.0, 10.0)));
    assert_approx(joint.angle, 10.0);
    assert_approx(joint.target_angle, 10.0);
}

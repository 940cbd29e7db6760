use crate::math::{
    angle_difference, direction_degrees, normalize_degrees, rotate_degrees, signed_angle_between,
    wrap_degrees_positive,
};
use crate::{Error, Transform2};
use glam::Vec2;

fn assert_approx(actual: f32, expected: f32) {
    let diff = (actual - expected).abs();
    assert!(
        diff <= 1.0e-4,
        "expected {expected}, got {actual} (diff {diff})"
    );
}

#[test]
fn normalize_degrees_wraps_into_half_open_signed_range() {
    assert_approx(normalize_degrees(0.0), 0.0);
    assert_approx(normalize_degrees(180.0), 180.0);
    assert_approx(normalize_degrees(-180.0), 180.0);
    assert_approx(normalize_degrees(190.0), -170.0);
    assert_approx(normalize_degrees(-190.0), 170.0);
    assert_approx(normalize_degrees(720.0 + 45.0), 45.0);
}

#[test]
fn wrap_degrees_positive_stays_below_full_turn() {
    assert_approx(wrap_degrees_positive(-90.0), 270.0);
    assert_approx(wrap_degrees_positive(360.0), 0.0);
    assert!(wrap_degrees_positive(-1.0e-9) < 360.0);
}

#[test]
fn angle_difference_takes_the_short_way_round() {
    assert_approx(angle_difference(170.0, -170.0), 20.0);
    assert_approx(angle_difference(-170.0, 170.0), -20.0);
}

#[test]
fn signed_angle_between_is_counter_clockwise_positive() {
    assert_approx(signed_angle_between(Vec2::X, Vec2::Y).unwrap(), 90.0);
    assert_approx(signed_angle_between(Vec2::Y, Vec2::X).unwrap(), -90.0);
    assert!(signed_angle_between(Vec2::ZERO, Vec2::X).is_none());
    assert!(signed_angle_between(Vec2::X, Vec2::new(1.0e-7, 0.0)).is_none());
}

#[test]
fn rotate_and_direction_agree() {
    let v = rotate_degrees(Vec2::new(2.0, 0.0), 30.0);
    assert_approx(v.length(), 2.0);
    assert_approx(direction_degrees(v), 30.0);
}

#[test]
fn transform_inverse_round_trips_points() {
    let t = Transform2::from_rotation_translation(37.0, Vec2::new(3.0, -4.0));
    let inv = t.try_inverse().unwrap();
    let p = Vec2::new(10.0, 2.5);
    let back = inv.transform_point(t.transform_point(p));
    assert_approx(back.x, p.x);
    assert_approx(back.y, p.y);

    let identity = t.mul(&inv);
    assert_approx(identity.a, 1.0);
    assert_approx(identity.b, 0.0);
    assert_approx(identity.x, 0.0);
    assert_approx(t.rotation(), 37.0);
}

#[test]
fn singular_transform_inverse_is_an_error() {
    let t = Transform2 {
        a: 1.0,
        b: 2.0,
        c: 2.0,
        d: 4.0,
        x: 0.0,
        y: 0.0,
    };
    assert!(matches!(
        t.try_inverse(),
        Err(Error::SingularTransform { .. })
    ));
}

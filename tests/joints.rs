use impulse2d::constraints::{
    ConstraintKind, DampedSpring, GearJoint, PinJoint, PivotJoint, SimpleMotor, SlideJoint,
};
use impulse2d::{Body, Constraint, Space, Vec2};

const DT: f32 = 1.0 / 60.0;

fn disc(space: &mut Space, pos: Vec2) -> impulse2d::BodyId {
    let mut body = Body::new(1.0, 1.0);
    body.set_position(pos);
    space.add_body(body).unwrap()
}

#[test]
fn pin_joint_holds_the_rod_length() {
    let mut space = Space::new();
    space.options.gravity = Vec2::new(0.0, -100.0);

    let bob = disc(&mut space, Vec2::new(10.0, 0.0));
    let pin = {
        let anchor = space.body(space.static_body()).unwrap();
        let bob_body = space.body(bob).unwrap();
        PinJoint::new(anchor, bob_body, Vec2::ZERO, Vec2::ZERO, None)
    };
    space
        .add_constraint(Constraint::new(space.static_body(), bob, ConstraintKind::Pin(pin)))
        .unwrap();

    for _ in 0..100 {
        space.step(DT).unwrap();
    }

    // Velocity-level constraint: the rod stretches a little at pendulum
    // speeds but the error stays bounded.
    let distance = space.body(bob).unwrap().position().length();
    assert!((distance - 10.0).abs() < 0.25, "rod length {distance}");
    // The pendulum actually swung.
    assert!(space.body(bob).unwrap().position().y < -1.0);
}

#[test]
fn slide_joint_limits_separation() {
    let mut space = Space::new();
    space.options.gravity = Vec2::new(0.0, -100.0);

    let weight = disc(&mut space, Vec2::new(0.0, -2.0));
    let slide = SlideJoint::new(Vec2::ZERO, Vec2::ZERO, 0.0, 10.0);
    space
        .add_constraint(Constraint::new(
            space.static_body(),
            weight,
            ConstraintKind::Slide(slide),
        ))
        .unwrap();

    let mut max_distance = 0.0_f32;
    for _ in 0..300 {
        space.step(DT).unwrap();
        max_distance = max_distance.max(space.body(weight).unwrap().position().length());
    }

    // Free fall inside the band, caught at the limit.
    assert!(max_distance > 9.0, "never reached the limit: {max_distance}");
    // One step of free fall can overshoot before the limit engages.
    assert!(max_distance < 11.0, "overshot the limit: {max_distance}");
}

#[test]
fn pivot_joint_pins_the_anchor_point() {
    let mut space = Space::new();
    space.options.gravity = Vec2::new(0.0, -100.0);

    let arm = disc(&mut space, Vec2::new(3.0, 0.0));
    let pivot = {
        let anchor = space.body(space.static_body()).unwrap();
        let arm_body = space.body(arm).unwrap();
        PivotJoint::from_world_point(anchor, arm_body, Vec2::new(3.0, 0.0))
    };
    space
        .add_constraint(Constraint::new(
            space.static_body(),
            arm,
            ConstraintKind::Pivot(pivot),
        ))
        .unwrap();

    for _ in 0..120 {
        space.step(DT).unwrap();
    }

    // The shared anchor stays put even under gravity.
    let pos = space.body(arm).unwrap().position();
    assert!((pos - Vec2::new(3.0, 0.0)).length() < 0.05, "anchor drifted to {pos:?}");
}

#[test]
fn motor_drives_relative_spin() {
    let mut space = Space::new();

    let wheel = disc(&mut space, Vec2::ZERO);
    space
        .add_constraint(Constraint::new(
            space.static_body(),
            wheel,
            ConstraintKind::Motor(SimpleMotor::new(2.0)),
        ))
        .unwrap();

    for _ in 0..30 {
        space.step(DT).unwrap();
    }

    // rate is the target of a.w - b.w, so the free wheel spins at -rate.
    let w = space.body(wheel).unwrap().angular_velocity;
    assert!((w + 2.0).abs() < 1e-3, "wheel speed {w}");
}

#[test]
fn motor_torque_respects_max_force() {
    let mut space = Space::new();

    let wheel = disc(&mut space, Vec2::ZERO);
    let mut motor = Constraint::new(
        space.static_body(),
        wheel,
        ConstraintKind::Motor(SimpleMotor::new(100.0)),
    );
    motor.max_force = 1.0;
    space.add_constraint(motor).unwrap();

    space.step(DT).unwrap();

    // One step can impart at most max_force * dt of angular impulse.
    let w = space.body(wheel).unwrap().angular_velocity.abs();
    assert!(w <= 1.0 * DT + 1e-6, "unclamped spin {w}");
}

#[test]
fn gear_joint_couples_angular_velocities() {
    let mut space = Space::new();

    let a = disc(&mut space, Vec2::new(-2.0, 0.0));
    let b = disc(&mut space, Vec2::new(2.0, 0.0));
    space.body_mut(a).unwrap().angular_velocity = 2.0;
    space
        .add_constraint(Constraint::new(a, b, ConstraintKind::Gear(GearJoint::new(0.0, 2.0))))
        .unwrap();

    for _ in 0..60 {
        space.step(DT).unwrap();
    }

    let wa = space.body(a).unwrap().angular_velocity;
    let wb = space.body(b).unwrap().angular_velocity;
    assert!((wb * 2.0 - wa).abs() < 0.05, "ratio broken: a={wa} b={wb}");
    assert!(wb > 0.1, "driven gear never moved");
}

#[test]
fn damped_spring_settles_at_rest_length() {
    let mut space = Space::new();

    let bob = disc(&mut space, Vec2::new(8.0, 0.0));
    let spring = DampedSpring::new(Vec2::ZERO, Vec2::ZERO, 5.0, 20.0, 4.0);
    space
        .add_constraint(Constraint::new(
            space.static_body(),
            bob,
            ConstraintKind::DampedSpring(spring),
        ))
        .unwrap();

    for _ in 0..1200 {
        space.step(DT).unwrap();
    }

    let distance = space.body(bob).unwrap().position().length();
    assert!((distance - 5.0).abs() < 0.1, "settled at {distance}");
    assert!(space.body(bob).unwrap().velocity.length() < 0.05);
}

#[test]
fn constrained_pair_can_opt_out_of_collisions() {
    use impulse2d::Shape;

    let mut space = Space::new();

    let a = disc(&mut space, Vec2::ZERO);
    let b = disc(&mut space, Vec2::new(1.0, 0.0));
    space.add_shape(Shape::circle(1.0, Vec2::ZERO), a).unwrap();
    space.add_shape(Shape::circle(1.0, Vec2::ZERO), b).unwrap();

    let mut joint = Constraint::new(a, b, ConstraintKind::Pivot(PivotJoint::new(Vec2::ZERO, Vec2::ZERO)));
    joint.collide_bodies = false;
    space.add_constraint(joint).unwrap();

    space.step(DT).unwrap();
    assert_eq!(space.arbiters().count(), 0);
}

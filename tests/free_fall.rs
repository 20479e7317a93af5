use impulse2d::{Body, Space, Vec2};

const DT: f32 = 1.0 / 60.0;

#[test]
fn body_accelerates_under_gravity() {
    let mut space = Space::new();
    space.options.gravity = Vec2::new(0.0, -100.0);

    let mut body = Body::new(1.0, 1.0);
    body.set_position(Vec2::new(0.0, 50.0));
    let body = space.add_body(body).unwrap();

    for _ in 0..60 {
        space.step(DT).unwrap();
    }

    let body = space.body(body).unwrap();
    assert!((body.velocity.y + 100.0).abs() < 1e-3);
    // Semi-implicit Euler lands slightly below the analytic -50.
    assert!(body.position().y < 1.0);
    assert!(body.position().y > -2.0);
}

#[test]
fn damping_bleeds_velocity() {
    let mut space = Space::new();
    space.options.damping = 0.5;

    let mut body = Body::new(1.0, 1.0);
    body.velocity = Vec2::new(64.0, 0.0);
    let body = space.add_body(body).unwrap();

    for _ in 0..3 {
        space.step(DT).unwrap();
    }

    // Halved each step: 64 -> 32 -> 16 -> 8.
    assert!((space.body(body).unwrap().velocity.x - 8.0).abs() < 1e-3);
}

#[test]
fn velocity_fn_override_suppresses_gravity() {
    fn floaty(body: &mut Body, _gravity: Vec2, damping: f32, dt: f32) {
        body.update_velocity(Vec2::ZERO, damping, dt);
    }

    let mut space = Space::new();
    space.options.gravity = Vec2::new(0.0, -100.0);

    let normal = space.add_body(Body::new(1.0, 1.0)).unwrap();
    let mut balloon = Body::new(1.0, 1.0);
    balloon.set_velocity_fn(floaty);
    let balloon = space.add_body(balloon).unwrap();

    for _ in 0..30 {
        space.step(DT).unwrap();
    }

    assert!(space.body(normal).unwrap().velocity.y < -40.0);
    assert_eq!(space.body(balloon).unwrap().velocity, Vec2::ZERO);
}

#[test]
fn kinematic_body_drifts_at_constant_velocity() {
    let mut space = Space::new();
    space.options.gravity = Vec2::new(0.0, -100.0);

    let mut body = Body::new_kinematic();
    body.velocity = Vec2::new(5.0, 0.0);
    let body = space.add_body(body).unwrap();

    for _ in 0..600 {
        space.step(DT).unwrap();
    }

    let body = space.body(body).unwrap();
    assert_eq!(body.velocity, Vec2::new(5.0, 0.0));
    assert!((body.position().x - 50.0).abs() < 1e-2);
    assert_eq!(body.position().y, 0.0);
}

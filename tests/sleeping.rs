use impulse2d::{shapes, Body, BodyId, Shape, Space, Vec2};

const DT: f32 = 1.0 / 60.0;

fn sleepy_space() -> Space {
    let mut space = Space::new();
    space.options.gravity = Vec2::new(0.0, -100.0);
    space.options.sleep_time_threshold = 0.5;

    let mut floor = Shape::segment(Vec2::new(-50.0, 0.0), Vec2::new(50.0, 0.0), 0.0);
    floor.friction = 1.0;
    space.add_shape(floor, space.static_body()).unwrap();
    space
}

fn drop_ball(space: &mut Space, x: f32, y: f32) -> BodyId {
    let mass = 1.0;
    let mut body = Body::new(mass, shapes::moment_for_circle(mass, 0.0, 1.0, Vec2::ZERO));
    body.set_position(Vec2::new(x, y));
    let body = space.add_body(body).unwrap();
    let mut shape = Shape::circle(1.0, Vec2::ZERO);
    shape.friction = 1.0;
    space.add_shape(shape, body).unwrap();
    body
}

#[test]
fn resting_ball_falls_asleep() {
    let mut space = sleepy_space();
    let ball = drop_ball(&mut space, 0.0, 3.0);

    for _ in 0..300 {
        space.step(DT).unwrap();
    }

    let body = space.body(ball).unwrap();
    assert!(body.is_sleeping(), "ball never fell asleep");
    assert_eq!(body.velocity, Vec2::ZERO);
    assert_eq!(body.angular_velocity, 0.0);

    // A sleeping body holds its pose across further steps.
    let rest = body.position();
    for _ in 0..60 {
        space.step(DT).unwrap();
    }
    assert_eq!(space.body(ball).unwrap().position(), rest);
}

#[test]
fn wake_body_restarts_simulation() {
    let mut space = sleepy_space();
    let ball = drop_ball(&mut space, 0.0, 3.0);

    for _ in 0..300 {
        space.step(DT).unwrap();
    }
    assert!(space.body(ball).unwrap().is_sleeping());

    space.wake_body(ball);
    let body = space.body(ball).unwrap();
    assert!(!body.is_sleeping());

    space.body_mut(ball).unwrap().velocity = Vec2::new(10.0, 0.0);
    space.step(DT).unwrap();
    assert!(space.body(ball).unwrap().position().x > 0.0);
}

#[test]
fn new_contact_wakes_a_sleeping_body() {
    let mut space = sleepy_space();
    let resting = drop_ball(&mut space, 0.0, 3.0);

    for _ in 0..300 {
        space.step(DT).unwrap();
    }
    assert!(space.body(resting).unwrap().is_sleeping());

    // Drop a second ball straight onto the first one.
    let incoming = drop_ball(&mut space, 0.0, 8.0);
    let mut woke = false;
    for _ in 0..120 {
        space.step(DT).unwrap();
        if !space.body(resting).unwrap().is_sleeping() {
            woke = true;
            break;
        }
    }
    assert!(woke, "impact never woke the resting ball");
    assert!(!space.body(incoming).unwrap().is_sleeping());
}

#[test]
fn touching_group_sleeps_together() {
    let mut space = sleepy_space();
    let a = drop_ball(&mut space, -0.95, 1.0);
    let b = drop_ball(&mut space, 0.95, 1.0);

    for _ in 0..400 {
        space.step(DT).unwrap();
    }

    assert!(space.body(a).unwrap().is_sleeping());
    assert!(space.body(b).unwrap().is_sleeping());

    // Waking one side of a touching pair wakes the whole group.
    space.wake_body(a);
    assert!(!space.body(b).unwrap().is_sleeping());
}

use criterion::{criterion_group, criterion_main, Criterion};
use impulse2d::{shapes, Body, Shape, Space, Vec2};

const DT: f32 = 1.0 / 60.0;

fn ball_pit() -> Space {
    let mut space = Space::new();
    space.options.gravity = Vec2::new(0.0, -100.0);

    let walls = [
        (Vec2::new(-30.0, 0.0), Vec2::new(30.0, 0.0)),
        (Vec2::new(-30.0, 0.0), Vec2::new(-30.0, 60.0)),
        (Vec2::new(30.0, 0.0), Vec2::new(30.0, 60.0)),
    ];
    for (a, b) in walls {
        let mut wall = Shape::segment(a, b, 0.5);
        wall.friction = 0.6;
        space.add_shape(wall, space.static_body()).unwrap();
    }

    for i in 0..200 {
        let x = -25.0 + 2.5 * (i % 20) as f32;
        let y = 5.0 + 2.5 * (i / 20) as f32;
        let mass = 1.0;
        let mut body = Body::new(mass, shapes::moment_for_circle(mass, 0.0, 1.0, Vec2::ZERO));
        body.set_position(Vec2::new(x, y));
        let body = space.add_body(body).unwrap();
        let mut shape = Shape::circle(1.0, Vec2::ZERO);
        shape.friction = 0.6;
        shape.elasticity = 0.2;
        space.add_shape(shape, body).unwrap();
    }
    space
}

fn bench_ball_pit_step(c: &mut Criterion) {
    let mut space = ball_pit();
    // Let the pile settle so the bench measures resting-contact solving.
    for _ in 0..120 {
        space.step(DT).unwrap();
    }
    c.bench_function("ball_pit_step", |b| b.iter(|| space.step(DT).unwrap()));
}

fn bench_box_stack_settle(c: &mut Criterion) {
    c.bench_function("box_stack_settle", |b| {
        b.iter(|| {
            let mut space = Space::new();
            space.options.gravity = Vec2::new(0.0, -100.0);
            let mut floor = Shape::segment(Vec2::new(-20.0, 0.0), Vec2::new(20.0, 0.0), 0.5);
            floor.friction = 0.8;
            space.add_shape(floor, space.static_body()).unwrap();

            for i in 0..10 {
                let mass = 1.0;
                let mut body = Body::new(mass, shapes::moment_for_box(mass, 2.0, 2.0));
                body.set_position(Vec2::new(0.0, 1.6 + 2.1 * i as f32));
                let body = space.add_body(body).unwrap();
                let mut shape = Shape::poly_box(2.0, 2.0, 0.0);
                shape.friction = 0.8;
                space.add_shape(shape, body).unwrap();
            }

            for _ in 0..60 {
                space.step(DT).unwrap();
            }
        });
    });
}

criterion_group!(benches, bench_ball_pit_step, bench_box_stack_settle);
criterion_main!(benches);

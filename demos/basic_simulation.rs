//! Basic physics simulation example
//!
//! A ball and a box fall onto the ground plane while a second box lands on a
//! fixed platform. Positions are printed twice a second.

use impulse3d::prelude::*;

fn main() -> Result<(), PhysicsError> {
    println!("impulse3d - Basic Simulation Example");
    println!("====================================\n");

    let mut world = World::default();
    world.add_plane(Plane::ground());

    // A fixed platform whose top surface is at y = 1
    world.create_body(
        RigidBodyDesc::fixed()
            .with_position(Vec3::new(4.0, 0.5, 0.0))
            .with_shape(Shape::cuboid(Vec3::new(1.5, 0.5, 1.5))),
    )?;

    let ball = world.create_body(
        RigidBodyDesc::dynamic()
            .with_position(Vec3::new(0.0, 5.0, 0.0))
            .with_shape(Shape::sphere(0.5)),
    )?;
    let crate_box = world.create_body(
        RigidBodyDesc::dynamic()
            .with_position(Vec3::new(-3.0, 4.0, 0.0))
            .with_orientation(Quat::from_axis_angle(Vec3::new(1.0, 0.0, 1.0).normalize(), 0.4))
            .with_mass(2.0)
            .with_shape(Shape::cuboid(Vec3::splat(0.5))),
    )?;
    let platform_box = world.create_body(
        RigidBodyDesc::dynamic()
            .with_position(Vec3::new(4.0, 3.0, 0.0))
            .with_shape(Shape::cuboid(Vec3::new(0.6, 0.3, 0.6))),
    )?;

    let dt = 1.0 / 60.0;
    let total_time = 4.0;
    let steps = (total_time / dt) as usize;
    println!("Simulating {total_time} seconds ({steps} steps at {:.0}Hz)...\n", 1.0 / dt);

    for i in 0..steps {
        world.start_frame();
        world.step(dt);

        if i % 30 == 0 {
            println!("t={:.2}s, {} contacts", i as f32 * dt, world.contacts().len());
            for (name, handle) in [("ball", ball), ("box", crate_box), ("platform box", platform_box)] {
                let Some(body) = world.body(handle) else {
                    continue;
                };
                let p = body.position;
                println!(
                    "  {name:>12}: position=({:.3}, {:.3}, {:.3}) awake={}",
                    p.x,
                    p.y,
                    p.z,
                    body.is_awake()
                );
            }
        }
    }

    println!("\nSimulation complete!");
    Ok(())
}

//! Particle bridge example
//!
//! A rope bridge made of particles: the deck is held together by rods and
//! cables, and hangs from fixed anchors by cables. A heavier particle walks
//! across the deck.

use impulse3d::particles::{ParticleCableConstraint, ParticleGravity};
use impulse3d::prelude::*;

const SEGMENTS: usize = 6;

fn main() -> Result<(), PhysicsError> {
    println!("impulse3d - Particle Bridge Example");
    println!("===================================\n");

    let mut world = ParticleWorld::new(SEGMENTS * 10, None);
    let gravity = world.add_force_generator(ParticleGravity::new(Vec3::new(0.0, -9.81, 0.0)));

    // Two rows of particles along x, one at z = -1 and one at z = 1
    let mut deck = Vec::new();
    for i in 0..SEGMENTS * 2 {
        let x = (i / 2) as f32 * 2.0 - SEGMENTS as f32 + 1.0;
        let z = (i % 2) as f32 * 2.0 - 1.0;
        let particle = Particle::new(Vec3::new(x, 4.0, z))
            .with_damping(0.9)?
            .with_mass(2.0)?;
        let handle = world.add_particle(particle);
        world.register_force(handle, gravity);
        deck.push(handle);
    }

    // Links along each row
    for i in 0..SEGMENTS * 2 - 2 {
        world.add_contact_generator(ParticleCable {
            particles: [deck[i], deck[i + 2]],
            max_length: 1.9,
            restitution: 0.3,
        });
    }

    // Rods across the deck
    for i in 0..SEGMENTS {
        world.add_contact_generator(ParticleRod {
            particles: [deck[i * 2], deck[i * 2 + 1]],
            length: 2.0,
        });
    }

    // Supports hanging from above
    for (i, &particle) in deck.iter().enumerate() {
        let x = (i / 2) as f32 * 2.2 - SEGMENTS as f32 * 1.1 + 1.1;
        let z = (i % 2) as f32 * 1.6 - 0.8;
        world.add_contact_generator(ParticleCableConstraint {
            particle,
            anchor: Vec3::new(x, 6.0, z),
            max_length: if i < 2 || i >= SEGMENTS * 2 - 2 { 1.7 } else { 2.2 },
            restitution: 0.5,
        });
    }
    world.add_contact_generator(GroundContacts::default());

    // The weight rests on the first deck particle, then moves along the row
    let mut weight_at = 0;
    let heavy = 10.0;

    let dt = 1.0 / 60.0;
    for frame in 0..360 {
        if frame % 60 == 0 {
            if let Some(previous) = world.particle_mut(deck[weight_at]) {
                previous.set_mass(2.0)?;
            }
            weight_at = (frame / 60 * 2).min(SEGMENTS * 2 - 2);
            if let Some(next) = world.particle_mut(deck[weight_at]) {
                next.set_mass(heavy)?;
            }
        }

        world.start_frame();
        world.run_physics(dt);

        if frame % 60 == 59 {
            let heights: Vec<String> = deck
                .iter()
                .step_by(2)
                .filter_map(|&h| world.particle(h))
                .map(|p| format!("{:.2}", p.position.y))
                .collect();
            println!(
                "t={:.1}s weight on {weight_at:>2}, {} contacts, deck heights [{}]",
                (frame + 1) as f32 * dt,
                world.contacts().len(),
                heights.join(", ")
            );
        }
    }

    Ok(())
}

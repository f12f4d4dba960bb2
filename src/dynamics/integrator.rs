use super::rigid_body::RigidBody;

/// Advances a body by `dt` using semi-implicit Euler integration.
///
/// Velocities are updated from the accumulated force and torque first, then
/// damped exponentially (`damping^dt`), then used to advance the pose. The
/// derived transform and world inertia are recomputed, the acceleration is
/// recorded for contact stabilization and the accumulators are cleared.
///
/// Sleeping and immovable bodies keep their state; only their accumulators
/// are cleared.
///
/// # Panics
///
/// Panics if `dt` is not positive.
pub fn integrate(body: &mut RigidBody, dt: f32) {
    assert!(dt > 0.0, "time step must be positive, got {dt}");
    if !body.is_awake() || !body.has_finite_mass() {
        body.clear_accumulators();
        return;
    }

    // Linear acceleration from the constant acceleration plus forces
    let linear_acceleration = body.acceleration + body.accumulated_force() * body.inverse_mass();
    let angular_acceleration = body.inverse_inertia_tensor_world() * body.accumulated_torque();

    body.velocity += linear_acceleration * dt;
    body.angular_velocity += angular_acceleration * dt;

    body.velocity *= body.linear_damping.powf(dt);
    body.angular_velocity *= body.angular_damping.powf(dt);

    // The force-driven dt^2 term is dropped
    body.position += body.velocity * dt + body.acceleration * (0.5 * dt * dt);
    body.orientation = body.orientation.add_scaled_vector(body.angular_velocity, dt);

    body.calculate_derived_data();
    body.set_last_frame_acceleration(linear_acceleration);
    body.clear_accumulators();

    body.update_sleep(dt);
}

//! Per-contact resolution: contact-space basis, closing velocities,
//! impulses and position corrections for a single [`Contact`].
//!
//! [`Contact`]: crate::collision::Contact

mod contact_constraint;

pub use contact_constraint::{PositionChange, VelocityChange};

//! The iterative contact resolver.

mod resolver;

pub use resolver::{ContactResolver, SolverConfig};

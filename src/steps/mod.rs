//! # Simulation Steps
//!
//! The pieces of one fixed-timestep update, in the order the space runs
//! them: velocity integration, contact and joint pre-steps, solver
//! iterations, position integration.

pub(crate) mod contact;
pub(crate) mod integration;
pub(crate) mod joint;

//! Floating-base multibody solver.
//!
//! A tree of revolute joints on a free-floating base, stored in flat
//! body-indexed arrays ([`Model`]) with a separate per-evaluation workspace
//! ([`Data`]). The pipeline is:
//!
//! 1. [`Data::forward_kinematics`]: body poses in the base frame
//! 2. [`Data::rne_bias`]: base bias wrench `h_B(q, v)`
//! 3. [`Data::composite_inertia`]: whole-tree inertia about the base origin
//! 4. [`Data::contact_wrench`]: external wrench from the contact input
//! 5. [`Data::base_acceleration`]: runs 1-4 and solves the base rows
//!
//! Every stage is generic over [`Real`](fbm_ad::Real), so it can be evaluated
//! on `f64` or recorded on the AD scalar. The contact Jacobians in
//! [`jacobian`] are `f64` only.

mod crba;
mod data;
mod factories;
mod forward;
pub mod jacobian;
mod kinematics;
mod model;
mod rne;

pub use data::Data;
pub use jacobian::{contact_position, contact_position_jacobian, contact_velocity, integrate_pos};
pub use model::{ContactFrame, Model, RevoluteBody};

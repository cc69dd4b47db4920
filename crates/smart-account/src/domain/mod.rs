//! # Domain Layer (Inner Hexagon)
//!
//! Pure business logic for the account.
//! NO I/O, NO async.
//!
//! - Dependencies point INWARD only (adapters depend on this, not vice versa).
//! - Signature recovery is reached through the `SignatureRecovery` port.

pub mod audit;
pub mod authorization;
pub mod data_store;
pub mod entities;
pub mod invariants;
pub mod services;
pub mod signature;
pub mod value_objects;

pub use audit::*;
pub use authorization::*;
pub use data_store::*;
pub use entities::*;
pub use invariants::*;
pub use services::*;
pub use signature::*;
pub use value_objects::*;

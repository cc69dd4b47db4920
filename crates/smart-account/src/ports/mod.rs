//! # Ports Layer (Middle Hexagon)
//!
//! Trait definitions for the account.
//!
//! - **Driving Ports (Inbound)**: `SmartAccountApi`
//! - **Driven Ports (Outbound)**: `ExecutionSubstrate`, `SignatureRecovery`
//! - No concrete implementations in this module

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;

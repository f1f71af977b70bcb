//! Data types for grading sessions.
//!
//! This crate contains the serde-serializable types exchanged between the
//! session controller and the services it talks to: the grading-lock service,
//! the content mirror, and the local roster used by the CLI.
//!
//! # Design Philosophy
//!
//! Types in this crate are:
//! * Pure data: No behavior beyond serialization and small predicates
//! * Service-shaped: Match what the lock service hands out
//! * Stable: Changes only when the service contract changes
//!
//! Lifecycle logic is built on top of these types in `grd-rs`.

pub mod action;
pub mod ids;
pub mod item;

pub use action::*;
pub use ids::*;
pub use item::*;

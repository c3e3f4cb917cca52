//! # Domain Models
//!
//! Configuration types, shared constants and the feature slice registry.
//! Only `serde` is allowed here: no I/O, networking, or business rules.

pub mod config;
pub mod constants;
pub mod registry;

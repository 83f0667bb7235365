//! API endpoint handlers.
//!
//! Collection handlers are generic over `Resource`; the router binds one
//! set per REST path.

pub mod health;
pub mod records;
pub mod stats;

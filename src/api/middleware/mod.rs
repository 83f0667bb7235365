//! API middleware stack.
//!
//! Execution order (outermost → innermost):
//! 1. Auth validator (only when a token is configured)
//! 2. Access logger

pub mod audit;
pub mod auth;

//! Foundation types for LinkPeek.
//!
//! This crate holds the platform-agnostic values shared by every LinkPeek
//! crate: the trigger mode and detection thresholds, pointer input
//! primitives, and the error type.

pub mod config;
pub mod error;
pub mod input;

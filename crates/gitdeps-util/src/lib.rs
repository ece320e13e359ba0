//! Shared utilities for gitdeps.
//!
//! This crate provides cross-cutting concerns used by all other gitdeps crates:
//! the error type, filesystem helpers, external process spawning, and terminal
//! status output.

pub mod errors;
pub mod fs;
pub mod process;
pub mod progress;

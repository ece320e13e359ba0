//! Core data types for gitdeps.
//!
//! This crate defines the version-constraint language and everything the
//! resolution engine consumes: semantic versions and comparators, the
//! constraint tree and its parser, the repository capability, package
//! identities, manifests in their supported formats, lockfiles, and global
//! configuration.
//!
//! This crate is intentionally free of async code and network I/O.

pub mod config;
pub mod constraint;
pub mod lockfile;
pub mod manifest;
pub mod package;
pub mod parser;
pub mod repository;
pub mod version;

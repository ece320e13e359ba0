//! Resolution engine: fetches every production dependency of a manifest
//! concurrently, recurses into the fetched packages, honours pinned
//! revisions, and checks that packages shared across the tree satisfy every
//! constraint placed on them.

pub mod in_flight;
pub mod resolver;

pub use resolver::Resolver;

//! Test suite for the passes crate.
//!
//! Organized into unit scenario tests and property-based tests, with shared
//! module builders in [`helpers`].

pub mod helpers;
pub mod property;

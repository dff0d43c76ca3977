//! Optimization passes for the hail compiler.
//!
//! This crate implements module-level transformation passes over
//! [`hail_ir::Module`] graphs. The current passes target collective
//! communication: merging many small collectives into fewer large ones to
//! amortize per-operation launch overhead.
//!
//! # Module Organization
//!
//! - [`combine`] - Generic key-driven instruction combining engine
//! - [`domain_map`] - Domain-equivalence classes for grouping across domains
//! - [`all_gather_combiner`] - The all-gather combining pass
//! - [`config`] - Threshold configuration with env fallbacks

pub mod all_gather_combiner;
pub mod combine;
pub mod config;
pub mod domain_map;

#[cfg(test)]
pub mod test;

// Re-export main types
pub use all_gather_combiner::AllGatherCombiner;
pub use combine::{CombinedGroup, combine_instructions_by_key};
pub use config::CombinerConfig;
pub use domain_map::{DomainClassId, DomainMap};

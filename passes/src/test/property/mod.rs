//! Property-based tests for the combining passes.
//!
//! Uses proptest to verify conservation laws and budget invariants over
//! randomly generated gather modules.

mod combiner_props;
mod generators;

//! Instruction graph model for the hail compiler passes.
//!
//! This crate defines the program representation graph passes consume and
//! mutate: computations as arenas of instructions with explicit operand/user
//! edges, modules grouping computations under an optional execution
//! schedule, and the metadata collectives carry (replica groups, shardings,
//! domain boundaries).
//!
//! # Module Organization
//!
//! - [`shape`] - Element types and array/tuple shapes with byte sizes
//! - [`op`] - Closed operation enum with per-operation attributes
//! - [`collective`] - Replica-group partitions
//! - [`sharding`] - Structural sharding annotations
//! - [`domain`] - Domain boundary metadata
//! - [`instruction`] - Instruction nodes and their arena handles
//! - [`computation`] - Instruction arenas with validated construction and
//!   in-place mutation
//! - [`module`] - Computation collections, entry point, schedule attachment
//! - [`schedule`] - Explicit total orders and their validation
//! - [`reachability`] - Transitive dependency queries
//! - [`error`] - Error types and result handling

pub mod collective;
pub mod computation;
pub mod domain;
pub mod error;
pub mod instruction;
pub mod module;
pub mod op;
pub mod prelude;
pub mod reachability;
pub mod schedule;
pub mod shape;
pub mod sharding;

// Re-exports: the whole surface stays accessible at the crate root.
pub use collective::ReplicaGroups;
pub use computation::{Computation, ComputationId};
pub use domain::DomainMetadata;
pub use error::{Error, Result};
pub use instruction::{Instruction, InstructionId};
pub use module::Module;
pub use op::{AllGatherAttrs, Op};
pub use reachability::ReachabilityMap;
pub use schedule::Schedule;
pub use shape::{ElementType, Shape};
pub use sharding::Sharding;

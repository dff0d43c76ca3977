//! Common imports for working with instruction graphs.
//!
//! ```rust,ignore
//! use hail_ir::prelude::*;
//! ```

// Graph structure
pub use crate::computation::{Computation, ComputationId};
pub use crate::instruction::{Instruction, InstructionId};
pub use crate::module::Module;
pub use crate::schedule::Schedule;

// Operations and metadata
pub use crate::collective::ReplicaGroups;
pub use crate::domain::DomainMetadata;
pub use crate::op::{AllGatherAttrs, Op};
pub use crate::shape::{ElementType, Shape};
pub use crate::sharding::Sharding;

// Analysis and errors
pub use crate::error::{Error, Result};
pub use crate::reachability::ReachabilityMap;

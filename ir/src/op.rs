//! Operation enum defining all graph operations.
//!
//! Each variant carries the attributes specific to that operation; operand
//! edges live on [`Instruction`](crate::instruction::Instruction) as arena
//! indices so the same edge storage serves every opcode. The enum is closed
//! on purpose: capability checks (`is_combinable_collective`, ...) are
//! exhaustive matches, and adding an opcode forces every switch to be
//! revisited.

use crate::collective::ReplicaGroups;
use crate::computation::ComputationId;
use crate::domain::DomainMetadata;

/// Attributes of an all-gather collective.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct AllGatherAttrs {
    /// Axis along which participant shards are concatenated.
    pub dimension: u64,

    /// Communication partition. Empty means one group of all participants.
    pub replica_groups: ReplicaGroups,

    /// Present on cross-shard collectives, absent on cross-replica ones.
    pub channel_id: Option<u64>,

    /// Replica-group ids name global devices rather than replica-local ranks.
    pub use_global_device_ids: bool,

    /// Operand layout was fixed by an earlier pass and must not be revisited.
    pub constrain_layout: bool,
}

/// Operation tag plus per-operation attributes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Op {
    /// Computation input at `index`.
    Parameter { index: usize },

    /// Collective concatenating every participant's operand along a dimension.
    /// Variadic: a combined gather takes several operands and produces a
    /// tuple with one component per operand.
    AllGather(AllGatherAttrs),

    /// Projection of one component out of a tuple-shaped operand.
    GetTupleElement { index: usize },

    /// Tuple construction from its operands.
    Tuple,

    /// Elementwise addition of two same-shape operands.
    Add,

    /// Domain boundary: passes its operand through unchanged while scoping
    /// the annotation region described by `metadata`.
    Domain { metadata: DomainMetadata },

    /// Opaque call of a fusion computation. Its body is a single kernel and
    /// is never inspected by graph passes.
    Fusion { computation: ComputationId },
}

impl Op {
    pub fn all_gather(attrs: AllGatherAttrs) -> Self {
        Self::AllGather(attrs)
    }

    /// Whether this operation is a collective the combiner may merge.
    pub const fn is_combinable_collective(&self) -> bool {
        matches!(self, Self::AllGather(_))
    }

    pub const fn is_domain(&self) -> bool {
        matches!(self, Self::Domain { .. })
    }

    pub fn as_all_gather(&self) -> Option<&AllGatherAttrs> {
        match self {
            Self::AllGather(attrs) => Some(attrs),
            _ => None,
        }
    }

    pub fn as_domain_metadata(&self) -> Option<&DomainMetadata> {
        match self {
            Self::Domain { metadata } => Some(metadata),
            _ => None,
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Parameter { .. } => "parameter",
            Self::AllGather(_) => "all-gather",
            Self::GetTupleElement { .. } => "get-tuple-element",
            Self::Tuple => "tuple",
            Self::Add => "add",
            Self::Domain { .. } => "domain",
            Self::Fusion { .. } => "fusion",
        }
    }
}

impl std::fmt::Display for Op {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

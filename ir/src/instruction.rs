//! Instruction nodes.

use smallvec::SmallVec;

use crate::op::Op;
use crate::shape::Shape;
use crate::sharding::Sharding;

/// Stable handle of an instruction inside one computation's arena.
///
/// Ids are never reused: removing an instruction tombstones its slot, so a
/// handle either resolves to the instruction it was created for or to
/// nothing at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstructionId(pub(crate) u32);

impl InstructionId {
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for InstructionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One node of the computation graph.
///
/// Operand edges are arena indices in operand order; user edges are the
/// reverse adjacency, deduplicated, in first-use order. Both are maintained
/// by [`Computation`](crate::computation::Computation); instructions never
/// mutate their own edges.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    pub(crate) op: Op,
    pub(crate) shape: Shape,
    pub(crate) operands: SmallVec<[InstructionId; 2]>,
    pub(crate) users: Vec<InstructionId>,
    pub(crate) sharding: Option<Sharding>,
}

impl Instruction {
    pub fn new(op: Op, shape: Shape, operands: impl IntoIterator<Item = InstructionId>) -> Self {
        Self { op, shape, operands: operands.into_iter().collect(), users: Vec::new(), sharding: None }
    }

    pub fn with_sharding(mut self, sharding: Sharding) -> Self {
        self.sharding = Some(sharding);
        self
    }

    pub fn op(&self) -> &Op {
        &self.op
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn operands(&self) -> &[InstructionId] {
        &self.operands
    }

    pub fn operand_count(&self) -> usize {
        self.operands.len()
    }

    /// Instructions reading this one's output, deduplicated.
    pub fn users(&self) -> &[InstructionId] {
        &self.users
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn sharding(&self) -> Option<&Sharding> {
        self.sharding.as_ref()
    }

    /// Record `user` as a reader, keeping the list duplicate-free.
    pub(crate) fn add_user(&mut self, user: InstructionId) {
        if !self.users.contains(&user) {
            self.users.push(user);
        }
    }

    pub(crate) fn remove_user(&mut self, user: InstructionId) {
        self.users.retain(|&u| u != user);
    }
}

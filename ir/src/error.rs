use snafu::Snafu;

use crate::computation::ComputationId;
use crate::instruction::InstructionId;
use crate::shape::Shape;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// Instruction id does not name a live instruction in this computation.
    #[snafu(display("unknown instruction id {id}"))]
    UnknownInstruction { id: InstructionId },

    /// Computation id does not name a computation in this module.
    #[snafu(display("unknown computation id {id}"))]
    UnknownComputation { id: ComputationId },

    /// Operation received the wrong number of operands.
    #[snafu(display("{op} expects {expected} operand(s), found {found}"))]
    OperandCountMismatch { op: &'static str, expected: usize, found: usize },

    /// Variadic operation received no operands.
    #[snafu(display("{op} requires at least one operand"))]
    MissingOperands { op: &'static str },

    /// Array shape required.
    #[snafu(display("expected an array shape, found a {found} shape"))]
    NotAnArray { found: &'static str },

    /// Tuple shape required.
    #[snafu(display("expected a tuple shape, found an {found} shape"))]
    NotATuple { found: &'static str },

    /// Tuple component index out of range.
    #[snafu(display("tuple index {index} out of range for tuple of {len} element(s)"))]
    TupleIndexOutOfRange { index: usize, len: usize },

    /// Declared shape disagrees with the shape the operands imply.
    #[snafu(display("shape mismatch in {context}: expected {expected}, found {found}"))]
    ShapeMismatch { context: &'static str, expected: Shape, found: Shape },

    /// Gather dimension does not exist in the operand shape.
    #[snafu(display("gather dimension {dimension} out of range for rank {rank}"))]
    GatherDimensionOutOfRange { dimension: u64, rank: usize },

    /// Gather output shape is not the operand shape widened along the gather dimension.
    #[snafu(display("gather output {output} is incompatible with operand {operand} along dimension {dimension}"))]
    GatherShapeIncompatible { dimension: u64, operand: Shape, output: Shape },

    /// Gather with multiple operands must produce one tuple component per operand.
    #[snafu(display("gather with {operands} operand(s) must produce a {operands}-element tuple, found {outputs}"))]
    GatherOutputArity { operands: usize, outputs: usize },

    /// Instruction still has users and cannot be detached.
    #[snafu(display("instruction {id} still has {users} user(s)"))]
    RemoveWithUsers { id: InstructionId, users: usize },

    /// The computation root cannot be detached.
    #[snafu(display("instruction {id} is the computation root"))]
    RemoveRoot { id: InstructionId },

    /// Schedule names an instruction that is not live in its computation.
    #[snafu(display("schedule for computation {computation} names unknown instruction {id}"))]
    ScheduleUnknownInstruction { computation: ComputationId, id: InstructionId },

    /// Schedule omits a live instruction.
    #[snafu(display("schedule for computation {computation} omits instruction {id}"))]
    ScheduleMissingInstruction { computation: ComputationId, id: InstructionId },

    /// Schedule lists an instruction more than once.
    #[snafu(display("schedule for computation {computation} lists instruction {id} twice"))]
    ScheduleDuplicateInstruction { computation: ComputationId, id: InstructionId },

    /// Schedule places an instruction before one of its operands.
    #[snafu(display("schedule for computation {computation} places {user} before its operand {operand}"))]
    ScheduleOrderViolation { computation: ComputationId, user: InstructionId, operand: InstructionId },

    /// Scheduled module lacks a sequence for a non-fusion computation.
    #[snafu(display("schedule has no sequence for computation {computation}"))]
    ScheduleMissingSequence { computation: ComputationId },
}

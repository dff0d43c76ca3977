//! Explicit execution schedules.
//!
//! A schedule pins one total order per non-fusion computation. Passes that
//! rewrite a scheduled module must keep its sequences in step: every live
//! instruction appears exactly once and no instruction precedes one of its
//! operands. [`Schedule::validate`] checks exactly that.

use std::collections::{HashMap, HashSet};

use snafu::ensure;

use crate::computation::ComputationId;
use crate::error::{
    Result, ScheduleDuplicateInstructionSnafu, ScheduleMissingInstructionSnafu, ScheduleMissingSequenceSnafu,
    ScheduleOrderViolationSnafu, ScheduleUnknownInstructionSnafu,
};
use crate::instruction::InstructionId;
use crate::module::Module;

/// Per-computation total orders over live instructions.
#[derive(Debug, Clone, Default)]
pub struct Schedule {
    sequences: HashMap<ComputationId, Vec<InstructionId>>,
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule every non-fusion computation in instruction creation order.
    /// Creation order is always a valid execution order because operands must
    /// exist before their users can be built.
    pub fn from_build_order(module: &Module) -> Self {
        let mut schedule = Self::new();
        for (id, computation) in module.computations() {
            if !computation.is_fusion() {
                schedule.set_sequence(id, computation.instruction_ids().collect());
            }
        }
        schedule
    }

    pub fn set_sequence(&mut self, computation: ComputationId, sequence: Vec<InstructionId>) {
        self.sequences.insert(computation, sequence);
    }

    pub fn sequence(&self, computation: ComputationId) -> Option<&[InstructionId]> {
        self.sequences.get(&computation).map(Vec::as_slice)
    }

    pub fn sequence_mut(&mut self, computation: ComputationId) -> Option<&mut Vec<InstructionId>> {
        self.sequences.get_mut(&computation)
    }

    /// Check coverage and order against the module's current graphs.
    pub fn validate(&self, module: &Module) -> Result<()> {
        for (computation_id, computation) in module.computations() {
            if computation.is_fusion() {
                continue;
            }
            let Some(sequence) = self.sequence(computation_id) else {
                return ScheduleMissingSequenceSnafu { computation: computation_id }.fail();
            };

            let mut seen = HashSet::with_capacity(sequence.len());
            for &id in sequence {
                let Some(instruction) = computation.get(id) else {
                    return ScheduleUnknownInstructionSnafu { computation: computation_id, id }.fail();
                };
                for &operand in instruction.operands() {
                    ensure!(
                        seen.contains(&operand),
                        ScheduleOrderViolationSnafu { computation: computation_id, user: id, operand }
                    );
                }
                ensure!(seen.insert(id), ScheduleDuplicateInstructionSnafu { computation: computation_id, id });
            }
            for id in computation.instruction_ids() {
                ensure!(seen.contains(&id), ScheduleMissingInstructionSnafu { computation: computation_id, id });
            }
        }
        Ok(())
    }
}

//! Computation bodies: instruction arenas with edge maintenance.
//!
//! A computation owns its instructions in an arena of tombstoned slots, so
//! [`InstructionId`]s stay stable across removals. All edge bookkeeping
//! (operand lists, reverse user lists, the root pointer) goes through the
//! mutation methods here; passes never edit edges by hand.

use snafu::ensure;

use crate::error::{
    GatherDimensionOutOfRangeSnafu, GatherOutputAritySnafu, GatherShapeIncompatibleSnafu, MissingOperandsSnafu,
    NotAnArraySnafu, OperandCountMismatchSnafu, RemoveRootSnafu, RemoveWithUsersSnafu, Result, ShapeMismatchSnafu,
    UnknownInstructionSnafu,
};
use crate::instruction::{Instruction, InstructionId};
use crate::op::Op;
use crate::shape::Shape;
use crate::sharding::Sharding;

/// Handle of a computation inside a [`Module`](crate::module::Module).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComputationId(pub(crate) u32);

impl ComputationId {
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for ComputationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One instruction graph. Directed, acyclic, mutable in place.
#[derive(Debug, Clone)]
pub struct Computation {
    name: String,
    instructions: Vec<Option<Instruction>>,
    root: Option<InstructionId>,
    fusion: bool,
}

impl Computation {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), instructions: Vec::new(), root: None, fusion: false }
    }

    /// A fusion body: an opaque single-kernel region graph passes skip.
    pub fn new_fusion(name: impl Into<String>) -> Self {
        Self { fusion: true, ..Self::new(name) }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn is_fusion(&self) -> bool {
        self.fusion
    }

    pub fn root(&self) -> Option<InstructionId> {
        self.root
    }

    // ========================================================================
    // ACCESS
    // ========================================================================

    pub fn get(&self, id: InstructionId) -> Option<&Instruction> {
        self.instructions.get(id.index()).and_then(Option::as_ref)
    }

    /// Resolve a handle that is known to be live. A dead handle here is an
    /// invariant breach, not a recoverable condition.
    pub fn instruction(&self, id: InstructionId) -> &Instruction {
        self.get(id).expect("instruction id not live in this computation")
    }

    fn instruction_mut(&mut self, id: InstructionId) -> &mut Instruction {
        self.instructions[id.index()].as_mut().expect("instruction id not live in this computation")
    }

    fn check_live(&self, id: InstructionId) -> Result<()> {
        ensure!(self.get(id).is_some(), UnknownInstructionSnafu { id });
        Ok(())
    }

    /// Live instructions in creation order.
    pub fn instructions(&self) -> impl Iterator<Item = (InstructionId, &Instruction)> {
        self.instructions
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|inst| (InstructionId(index as u32), inst)))
    }

    pub fn instruction_ids(&self) -> impl Iterator<Item = InstructionId> + '_ {
        self.instructions().map(|(id, _)| id)
    }

    pub fn instruction_count(&self) -> usize {
        self.instructions.iter().filter(|slot| slot.is_some()).count()
    }

    // ========================================================================
    // CONSTRUCTION
    // ========================================================================

    /// Validate and insert an instruction, wiring user edges on its operands.
    pub fn add_instruction(&mut self, instruction: Instruction) -> Result<InstructionId> {
        for &operand in instruction.operands() {
            self.check_live(operand)?;
        }
        self.validate(&instruction)?;

        let id = InstructionId(self.instructions.len() as u32);
        let operands: Vec<_> = instruction.operands().to_vec();
        self.instructions.push(Some(instruction));
        for operand in operands {
            self.instruction_mut(operand).add_user(id);
        }
        Ok(id)
    }

    pub fn add_parameter(&mut self, index: usize, shape: Shape) -> Result<InstructionId> {
        self.add_instruction(Instruction::new(Op::Parameter { index }, shape, []))
    }

    /// Tuple of `operands`; the output shape is derived, not declared.
    pub fn add_tuple(&mut self, operands: impl Into<Vec<InstructionId>>) -> Result<InstructionId> {
        let operands = operands.into();
        let mut elements = Vec::with_capacity(operands.len());
        for &operand in &operands {
            self.check_live(operand)?;
            elements.push(self.instruction(operand).shape().clone());
        }
        self.add_instruction(Instruction::new(Op::Tuple, Shape::Tuple(elements), operands))
    }

    /// Projection of component `index` out of a tuple-shaped `operand`.
    pub fn add_get_tuple_element(&mut self, operand: InstructionId, index: usize) -> Result<InstructionId> {
        self.check_live(operand)?;
        let shape = self.instruction(operand).shape().tuple_element(index)?.clone();
        self.add_instruction(Instruction::new(Op::GetTupleElement { index }, shape, [operand]))
    }

    pub fn add_domain(
        &mut self,
        operand: InstructionId,
        metadata: crate::domain::DomainMetadata,
    ) -> Result<InstructionId> {
        self.check_live(operand)?;
        let shape = self.instruction(operand).shape().clone();
        self.add_instruction(Instruction::new(Op::Domain { metadata }, shape, [operand]))
    }

    pub fn set_root(&mut self, id: InstructionId) -> Result<()> {
        self.check_live(id)?;
        self.root = Some(id);
        Ok(())
    }

    pub fn set_sharding(&mut self, id: InstructionId, sharding: Sharding) -> Result<()> {
        self.check_live(id)?;
        self.instruction_mut(id).sharding = Some(sharding);
        Ok(())
    }

    // ========================================================================
    // MUTATION
    // ========================================================================

    /// Redirect every reader of `old` to `new`. The use inside `new` itself
    /// (when `new` consumes `old`) is kept, so a producer can be threaded
    /// through its replacement. Hands the root over if `old` held it.
    pub fn replace_all_uses_with(&mut self, old: InstructionId, new: InstructionId) -> Result<()> {
        self.check_live(old)?;
        self.check_live(new)?;
        if old == new {
            return Ok(());
        }
        ensure!(
            self.instruction(old).shape() == self.instruction(new).shape(),
            ShapeMismatchSnafu {
                context: "replace-all-uses",
                expected: self.instruction(old).shape().clone(),
                found: self.instruction(new).shape().clone(),
            }
        );

        let users: Vec<_> = self.instruction(old).users().to_vec();
        for user in users {
            if user == new {
                continue;
            }
            let inst = self.instruction_mut(user);
            for operand in &mut inst.operands {
                if *operand == old {
                    *operand = new;
                }
            }
            self.instruction_mut(old).remove_user(user);
            self.instruction_mut(new).add_user(user);
        }
        if self.root == Some(old) {
            self.root = Some(new);
        }
        Ok(())
    }

    /// Detach a dead instruction: no users, not the root. Releases its
    /// operand edges and tombstones the slot.
    pub fn remove_instruction(&mut self, id: InstructionId) -> Result<()> {
        self.check_live(id)?;
        let users = self.instruction(id).user_count();
        ensure!(users == 0, RemoveWithUsersSnafu { id, users });
        ensure!(self.root != Some(id), RemoveRootSnafu { id });

        let operands: Vec<_> = self.instruction(id).operands().to_vec();
        for operand in operands {
            self.instruction_mut(operand).remove_user(id);
        }
        self.instructions[id.index()] = None;
        Ok(())
    }

    // ========================================================================
    // TRAVERSAL
    // ========================================================================

    /// Deterministic post order over every live instruction: operands always
    /// precede their users, unreachable islands included.
    pub fn post_order(&self) -> Vec<InstructionId> {
        let mut visited = vec![false; self.instructions.len()];
        let mut order = Vec::with_capacity(self.instruction_count());
        let mut stack: Vec<(InstructionId, usize)> = Vec::new();

        for start in self.instruction_ids() {
            if visited[start.index()] {
                continue;
            }
            visited[start.index()] = true;
            stack.push((start, 0));
            while let Some((id, cursor)) = stack.last_mut() {
                match self.instruction(*id).operands().get(*cursor) {
                    Some(&operand) => {
                        *cursor += 1;
                        if !visited[operand.index()] {
                            visited[operand.index()] = true;
                            stack.push((operand, 0));
                        }
                    }
                    None => {
                        order.push(*id);
                        stack.pop();
                    }
                }
            }
        }
        order
    }

    // ========================================================================
    // VALIDATION
    // ========================================================================

    fn validate(&self, instruction: &Instruction) -> Result<()> {
        let shape = instruction.shape();
        match instruction.op() {
            Op::Parameter { .. } => self.expect_operands(instruction, 0),
            Op::Tuple => {
                let elements: Vec<_> =
                    instruction.operands().iter().map(|&id| self.instruction(id).shape().clone()).collect();
                let expected = Shape::Tuple(elements);
                ensure!(
                    *shape == expected,
                    ShapeMismatchSnafu { context: "tuple", expected, found: shape.clone() }
                );
                Ok(())
            }
            Op::GetTupleElement { index } => {
                self.expect_operands(instruction, 1)?;
                let operand = self.instruction(instruction.operands()[0]).shape();
                let expected = operand.tuple_element(*index)?;
                ensure!(
                    shape == expected,
                    ShapeMismatchSnafu {
                        context: "get-tuple-element",
                        expected: expected.clone(),
                        found: shape.clone(),
                    }
                );
                Ok(())
            }
            Op::Add => {
                self.expect_operands(instruction, 2)?;
                for &operand in instruction.operands() {
                    let operand = self.instruction(operand).shape();
                    ensure!(
                        shape == operand,
                        ShapeMismatchSnafu { context: "add", expected: operand.clone(), found: shape.clone() }
                    );
                }
                Ok(())
            }
            Op::Domain { .. } => {
                self.expect_operands(instruction, 1)?;
                let operand = self.instruction(instruction.operands()[0]).shape();
                ensure!(
                    shape == operand,
                    ShapeMismatchSnafu { context: "domain", expected: operand.clone(), found: shape.clone() }
                );
                Ok(())
            }
            Op::AllGather(attrs) => self.validate_all_gather(instruction, attrs.dimension),
            // Fusion arity depends on the called computation, which lives at
            // module level; nothing to check against here.
            Op::Fusion { .. } => Ok(()),
        }
    }

    fn validate_all_gather(&self, instruction: &Instruction, dimension: u64) -> Result<()> {
        let operands = instruction.operands();
        ensure!(!operands.is_empty(), MissingOperandsSnafu { op: "all-gather" });

        let outputs: Vec<&Shape> = match instruction.shape() {
            shape @ Shape::Array { .. } => {
                ensure!(
                    operands.len() == 1,
                    GatherOutputAritySnafu { operands: operands.len(), outputs: 1_usize }
                );
                vec![shape]
            }
            Shape::Tuple(elements) => {
                ensure!(
                    operands.len() == elements.len(),
                    GatherOutputAritySnafu { operands: operands.len(), outputs: elements.len() }
                );
                elements.iter().collect()
            }
        };

        for (&operand, output) in operands.iter().zip(outputs) {
            let operand = self.instruction(operand).shape();
            let (
                Shape::Array { element_type: in_ty, dims: in_dims },
                Shape::Array { element_type: out_ty, dims: out_dims },
            ) = (operand, output)
            else {
                return NotAnArraySnafu { found: "tuple" }.fail();
            };
            ensure!(
                (dimension as usize) < in_dims.len(),
                GatherDimensionOutOfRangeSnafu { dimension, rank: in_dims.len() }
            );
            let dims_ok = out_dims.len() == in_dims.len()
                && in_dims.iter().zip(out_dims).enumerate().all(|(axis, (&input, &out))| {
                    if axis as u64 != dimension {
                        input == out
                    } else if input == 0 {
                        out == 0
                    } else {
                        out > 0 && out.is_multiple_of(input)
                    }
                });
            ensure!(
                in_ty == out_ty && dims_ok,
                GatherShapeIncompatibleSnafu { dimension, operand: operand.clone(), output: output.clone() }
            );
        }
        Ok(())
    }

    fn expect_operands(&self, instruction: &Instruction, expected: usize) -> Result<()> {
        let found = instruction.operand_count();
        ensure!(found == expected, OperandCountMismatchSnafu { op: instruction.op().name(), expected, found });
        Ok(())
    }
}

//! Test utilities for collective combining tests.
//!
//! This module provides helper functions to build common module patterns
//! (parallel gathers, domain-wrapped gathers, fusion calls) and assertion
//! utilities for validating combiner results.

use hail_ir::{
    AllGatherAttrs, Computation, ComputationId, ElementType, Instruction, InstructionId, Module, Op, Schedule, Shape,
};

/// Creates an f32 array shape.
pub fn f32_array(dims: impl Into<Vec<u64>>) -> Shape {
    Shape::array(ElementType::F32, dims)
}

/// Derives the output shape of gathering `input` from `shards` participants
/// along `dimension`.
pub fn gathered(input: &Shape, dimension: u64, shards: u64) -> Shape {
    let Shape::Array { element_type, dims } = input else {
        panic!("gather input must be an array, got {input}");
    };
    let mut dims = dims.clone();
    dims[dimension as usize] *= shards;
    Shape::array(*element_type, dims)
}

/// Appends an all-gather of `operand` over `shards` participants along
/// `dimension`, with default collective attributes.
pub fn add_all_gather(
    computation: &mut Computation,
    operand: InstructionId,
    dimension: u64,
    shards: u64,
) -> InstructionId {
    add_all_gather_with(computation, operand, shards, AllGatherAttrs { dimension, ..Default::default() })
}

/// Appends an all-gather of `operand` with explicit collective attributes.
/// The output shape is derived from the operand shape and `shards`.
pub fn add_all_gather_with(
    computation: &mut Computation,
    operand: InstructionId,
    shards: u64,
    attrs: AllGatherAttrs,
) -> InstructionId {
    let shape = gathered(computation.instruction(operand).shape(), attrs.dimension, shards);
    computation
        .add_instruction(Instruction::new(Op::AllGather(attrs), shape, [operand]))
        .expect("gather construction must validate")
}

/// Builds a module whose entry computation holds `count` independent
/// all-gathers over fresh `f32[input_len]` parameters, rooted in a tuple of
/// the gather results.
///
/// Generates:
/// ```text
/// entry {
///   param{i}  = f32[input_len] parameter(i)
///   gather{i} = f32[input_len * shards] all-gather(param{i}), dimension=0
///   root      = tuple(gather0, ..., gather{count-1})
/// }
/// ```
///
/// # Returns
/// The module, the entry computation id, and the gather ids in order.
pub fn parallel_gathers(count: usize, input_len: u64, shards: u64) -> (Module, ComputationId, Vec<InstructionId>) {
    let mut module = Module::new("test");
    let mut computation = Computation::new("entry");
    let mut gathers = Vec::with_capacity(count);
    for index in 0..count {
        let param = computation.add_parameter(index, f32_array([input_len])).unwrap();
        gathers.push(add_all_gather(&mut computation, param, 0, shards));
    }
    let root = computation.add_tuple(gathers.clone()).unwrap();
    computation.set_root(root).unwrap();
    let entry = module.add_entry_computation(computation);
    (module, entry, gathers)
}

/// Attaches a schedule listing every non-fusion computation in build order.
pub fn schedule_in_build_order(module: &mut Module) {
    let schedule = Schedule::from_build_order(module);
    module.set_schedule(schedule).expect("build-order schedule must validate");
}

/// Counts all-gathers across non-fusion computations.
pub fn all_gather_count(module: &Module) -> usize {
    module
        .computations()
        .filter(|(_, computation)| !computation.is_fusion())
        .map(|(_, computation)| find_all_gathers(computation).len())
        .sum()
}

/// All-gather instruction ids of one computation, in creation order.
pub fn find_all_gathers(computation: &Computation) -> Vec<InstructionId> {
    computation
        .instructions()
        .filter(|(_, instruction)| instruction.op().as_all_gather().is_some())
        .map(|(id, _)| id)
        .collect()
}

/// Tuple-shaped (already combined) all-gathers of one computation.
pub fn find_combined_gathers(computation: &Computation) -> Vec<InstructionId> {
    find_all_gathers(computation)
        .into_iter()
        .filter(|&id| computation.instruction(id).shape().is_tuple())
        .collect()
}

/// Asserts that `id` is a get-tuple-element and returns its source
/// instruction and component index.
pub fn expect_gte(computation: &Computation, id: InstructionId) -> (InstructionId, usize) {
    let instruction = computation.instruction(id);
    match instruction.op() {
        Op::GetTupleElement { index } => (instruction.operands()[0], *index),
        other => panic!("expected get-tuple-element, got {other}"),
    }
}

/// Asserts that the computation root is a tuple of get-tuple-element nodes
/// and returns for each element its source instruction and component index.
pub fn root_tuple_elements(computation: &Computation) -> Vec<(InstructionId, usize)> {
    let root = computation.root().expect("computation has no root");
    let instruction = computation.instruction(root);
    assert!(matches!(instruction.op(), Op::Tuple), "expected a tuple root, got {}", instruction.op());
    instruction.operands().iter().map(|&operand| expect_gte(computation, operand)).collect()
}

/// Asserts that `gather` is an all-gather whose operands are the computation
/// parameters with `indices`, in order.
pub fn assert_gather_of_parameters(computation: &Computation, gather: InstructionId, indices: &[usize]) {
    let instruction = computation.instruction(gather);
    assert!(instruction.op().as_all_gather().is_some(), "expected an all-gather, got {}", instruction.op());
    let found: Vec<usize> = instruction
        .operands()
        .iter()
        .map(|&operand| match computation.instruction(operand).op() {
            Op::Parameter { index } => *index,
            other => panic!("expected a parameter operand, got {other}"),
        })
        .collect();
    assert_eq!(found, indices, "combined gather reads the wrong parameters");
}

//! Property tests for the all-gather combiner.
//!
//! Combining may repack gather outputs into tuples but must never change
//! what is gathered, grow the number of collectives, overrun its budgets,
//! or corrupt a module schedule.

use hail_ir::{Module, Shape};
use proptest::prelude::*;

use super::generators::*;
use crate::AllGatherCombiner;
use crate::test::helpers::{all_gather_count, schedule_in_build_order};

/// Sorted per-position gather output shapes: combined gathers contribute one
/// entry per tuple component, plain gathers contribute their array shape.
fn output_shape_multiset(module: &Module) -> Vec<String> {
    let mut shapes = Vec::new();
    for (_, computation) in module.computations() {
        for (_, instruction) in computation.instructions() {
            if instruction.op().as_all_gather().is_none() {
                continue;
            }
            match instruction.shape() {
                Shape::Tuple(elements) => shapes.extend(elements.iter().map(ToString::to_string)),
                shape => shapes.push(shape.to_string()),
            }
        }
    }
    shapes.sort();
    shapes
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Combining repacks outputs without changing them.
    #[test]
    fn per_position_output_shapes_preserved(plan in arb_gather_plan(), scheduled in any::<bool>()) {
        let mut module = build_module(&plan);
        if scheduled {
            schedule_in_build_order(&mut module);
        }
        let before = output_shape_multiset(&module);

        AllGatherCombiner::new(1024 * 1024, 256).run(&mut module).unwrap();

        prop_assert_eq!(output_shape_multiset(&module), before);
    }

    /// The pass only ever merges gathers; their number never grows.
    #[test]
    fn gather_count_never_increases(
        plan in arb_gather_plan(),
        scheduled in any::<bool>(),
        (bytes, count) in arb_thresholds(),
    ) {
        let mut module = build_module(&plan);
        if scheduled {
            schedule_in_build_order(&mut module);
        }
        let before = all_gather_count(&module);

        AllGatherCombiner::new(bytes, count).run(&mut module).unwrap();

        prop_assert!(all_gather_count(&module) <= before);
    }

    /// A second run finds nothing left to merge.
    #[test]
    fn second_run_is_a_fixed_point(
        plan in arb_gather_plan(),
        scheduled in any::<bool>(),
        (bytes, count) in arb_thresholds(),
    ) {
        let mut module = build_module(&plan);
        if scheduled {
            schedule_in_build_order(&mut module);
        }
        let combine = AllGatherCombiner::new(bytes, count);
        combine.run(&mut module).unwrap();
        let settled = output_shape_multiset(&module);

        let changed = combine.run(&mut module).unwrap();

        prop_assert!(!changed);
        prop_assert_eq!(output_shape_multiset(&module), settled);
    }

    /// No combined gather exceeds either budget, and a surviving schedule
    /// still orders operands before users.
    #[test]
    fn budgets_and_schedule_hold(
        plan in arb_gather_plan(),
        scheduled in any::<bool>(),
        (bytes, count) in arb_thresholds(),
    ) {
        let mut module = build_module(&plan);
        if scheduled {
            schedule_in_build_order(&mut module);
        }

        AllGatherCombiner::new(bytes, count).run(&mut module).unwrap();

        for (_, computation) in module.computations() {
            for (_, instruction) in computation.instructions() {
                if instruction.op().as_all_gather().is_none() || !instruction.shape().is_tuple() {
                    continue;
                }
                prop_assert!(instruction.shape().byte_size() <= bytes);
                prop_assert!(instruction.shape().tuple_len().unwrap() as u64 <= count);
            }
        }
        if scheduled {
            module.schedule().unwrap().validate(&module).unwrap();
        }
    }
}

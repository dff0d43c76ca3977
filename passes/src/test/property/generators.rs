//! Generators for property-based combiner tests.

use hail_ir::{AllGatherAttrs, Computation, Module, ReplicaGroups};
use proptest::prelude::*;

use crate::test::helpers::{add_all_gather_with, f32_array};

/// A gather plan entry: parameter length in elements plus a small key class
/// picking one of three attribute combinations. Three classes keep the class
/// population large enough that groups actually form.
pub fn arb_gather_plan() -> impl Strategy<Value = Vec<(u64, u8)>> {
    prop::collection::vec((1u64..=64, 0u8..3), 1..12)
}

/// Budgets small enough to exercise both the skip and the split paths
/// against the 8..512 byte outputs the plans produce.
pub fn arb_thresholds() -> impl Strategy<Value = (u64, u64)> {
    (1u64..=2048, 1u64..=8)
}

/// Materializes a plan as a module of independent same-dimension gathers
/// over fresh parameters, rooted in a tuple of the results.
pub fn build_module(plan: &[(u64, u8)]) -> Module {
    let mut module = Module::new("prop");
    let mut computation = Computation::new("entry");
    let mut gathers = Vec::with_capacity(plan.len());
    for (index, &(input_len, class)) in plan.iter().enumerate() {
        let param = computation.add_parameter(index, f32_array([input_len])).unwrap();
        let attrs = match class {
            0 => AllGatherAttrs::default(),
            1 => AllGatherAttrs { channel_id: Some(1), ..Default::default() },
            _ => AllGatherAttrs { replica_groups: ReplicaGroups::from([[0, 1]]), ..Default::default() },
        };
        gathers.push(add_all_gather_with(&mut computation, param, 2, attrs));
    }
    let root = computation.add_tuple(gathers).unwrap();
    computation.set_root(root).unwrap();
    module.add_entry_computation(computation);
    module
}

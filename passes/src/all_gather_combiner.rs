//! All-gather combining.
//!
//! Merges independent small all-gathers into fewer wide ones. A collective
//! pays a fixed launch overhead plus a per-byte cost; gathering many small
//! buffers in one invocation amortizes the fixed part, which is a dominant
//! lever for distributed programs.
//!
//! Candidates bucket by everything that must agree for the merged gather to
//! mean the same thing: gather dimension, domain-equivalence class, channel
//! presence and value, device-id interpretation, and the replica-group
//! partition as a set of sets. Members must also agree on sharding presence.
//! The merged instruction gathers all member operands at once and produces a
//! tuple; per-member projections take over every original use site, reading
//! bit-identical data.
//!
//! # Example
//!
//! ```ignore
//! ag0 = f32[128] all-gather(p0), dimension=0
//! ag1 = f32[128] all-gather(p1), dimension=0
//! root = tuple(ag0, ag1)
//! ```
//!
//! becomes
//!
//! ```ignore
//! combined = (f32[128], f32[128]) all-gather(p0, p1), dimension=0
//! root = tuple(get-tuple-element(combined, 0), get-tuple-element(combined, 1))
//! ```

use hail_ir::{
    AllGatherAttrs, Computation, Instruction, InstructionId, Module, Op, Result, Shape, Sharding,
};

use crate::combine::{CombinedGroup, combine_instructions_by_key};
use crate::config::CombinerConfig;
use crate::domain_map::{DomainClassId, DomainMap};

/// Everything two gathers must share before they may ever sit in one group.
/// Sharding stays out of the key: presence compatibility is pairwise (see
/// [`sharding_compatible`]), and values are allowed to differ because the
/// rewrite concatenates them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct GroupKey {
    dimension: u64,
    domain_class: DomainClassId,
    channel_id: Option<u64>,
    use_global_device_ids: bool,
    replica_groups: Vec<Vec<u64>>,
}

fn combine_key(computation: &Computation, id: InstructionId, domain_map: &DomainMap) -> Option<GroupKey> {
    let instruction = computation.instruction(id);
    let attrs = instruction.op().as_all_gather()?;
    // Already-combined gathers carry several operands and a tuple output;
    // they are never candidates again.
    if instruction.operand_count() != 1 || !instruction.shape().is_array() {
        return None;
    }
    Some(GroupKey {
        dimension: attrs.dimension,
        domain_class: domain_map.class(id)?,
        channel_id: attrs.channel_id,
        use_global_device_ids: attrs.use_global_device_ids,
        replica_groups: attrs.replica_groups.signature(),
    })
}

/// Pairwise sharding check against the open group: presence must agree, and
/// a sharded member must carry a single per-position entry (a tuple sharding
/// has none) so the combined compound sharding is well defined.
fn sharding_compatible(computation: &Computation, member: InstructionId, candidate: InstructionId) -> bool {
    match (computation.instruction(member).sharding(), computation.instruction(candidate).sharding()) {
        (None, None) => true,
        (Some(a), Some(b)) => !a.is_tuple() && !b.is_tuple(),
        _ => false,
    }
}

/// Rewrite one finalized group: synthesize the wide gather, project each
/// member's slice back out, rewire all users, detach the originals.
///
/// Preconditions (same key, no mutual dependencies, compatible sharding) are
/// the grouping engine's responsibility; violations here are defects, not
/// recoverable conditions.
fn combine_all_gathers(computation: &mut Computation, group: &[InstructionId]) -> Result<CombinedGroup> {
    assert!(group.len() >= 2, "group must have at least two gathers");

    let front = computation
        .instruction(group[0])
        .op()
        .as_all_gather()
        .expect("group member must be an all-gather")
        .clone();
    let mut operands = Vec::with_capacity(group.len());
    let mut shapes = Vec::with_capacity(group.len());
    let mut shardings = Vec::with_capacity(group.len());
    for &member in group {
        let instruction = computation.instruction(member);
        let attrs = instruction.op().as_all_gather().expect("group member must be an all-gather");
        assert_eq!(attrs.dimension, front.dimension, "group members must share the gather dimension");
        assert_eq!(instruction.operand_count(), 1, "group members must be uncombined gathers");
        operands.push(instruction.operands()[0]);
        shapes.push(instruction.shape().clone());
        shardings.push(instruction.sharding().cloned());
    }

    let attrs = AllGatherAttrs {
        dimension: front.dimension,
        replica_groups: front.replica_groups.clone(),
        channel_id: front.channel_id,
        use_global_device_ids: front.use_global_device_ids,
        constrain_layout: false,
    };
    let mut instruction = Instruction::new(Op::AllGather(attrs), Shape::Tuple(shapes), operands);
    if shardings.iter().all(Option::is_some) {
        instruction = instruction.with_sharding(Sharding::Tuple(shardings.iter().flatten().cloned().collect()));
    }
    let combined = computation.add_instruction(instruction)?;

    let mut replacements = Vec::with_capacity(group.len());
    for (index, (&member, sharding)) in group.iter().zip(shardings).enumerate() {
        let unpack = computation.add_get_tuple_element(combined, index)?;
        if let Some(sharding) = sharding {
            computation.set_sharding(unpack, sharding)?;
        }
        computation.replace_all_uses_with(member, unpack)?;
        computation.remove_instruction(member)?;
        replacements.push(unpack);
    }
    Ok(CombinedGroup { combined, replacements })
}

fn contains_layout_constrained_gather(module: &Module) -> bool {
    module
        .computations()
        .any(|(_, c)| c.instructions().any(|(_, i)| i.op().as_all_gather().is_some_and(|a| a.constrain_layout)))
}

/// Combines small all-gathers into larger ones under byte and count budgets.
pub struct AllGatherCombiner {
    combine_threshold_bytes: u64,
    combine_threshold_count: u64,
}

impl AllGatherCombiner {
    /// Budgets are inclusive upper bounds: a group may total exactly
    /// `combine_threshold_bytes` bytes and hold exactly
    /// `combine_threshold_count` members.
    pub fn new(combine_threshold_bytes: u64, combine_threshold_count: u64) -> Self {
        Self { combine_threshold_bytes, combine_threshold_count }
    }

    /// Run over every non-fusion computation. Returns whether the module
    /// changed.
    #[tracing::instrument(skip_all, fields(
        module.name = module.name(),
        threshold.bytes = self.combine_threshold_bytes,
        threshold.count = self.combine_threshold_count,
    ))]
    pub fn run(&self, module: &mut Module) -> Result<bool> {
        if self.combine_threshold_bytes == 0 || self.combine_threshold_count == 0 {
            tracing::debug!("all-gather combining disabled by a zero threshold");
            return Ok(false);
        }
        if contains_layout_constrained_gather(module) {
            tracing::debug!("module contains a layout-constrained all-gather, skipping");
            return Ok(false);
        }

        let mut changed = false;
        for computation_id in module.non_fusion_computation_ids() {
            let domain_map = DomainMap::build(module.computation(computation_id));
            changed |= combine_instructions_by_key(
                module,
                computation_id,
                self.combine_threshold_bytes,
                self.combine_threshold_count,
                |computation, id| combine_key(computation, id, &domain_map),
                sharding_compatible,
                combine_all_gathers,
            )?;
        }
        Ok(changed)
    }
}

impl Default for AllGatherCombiner {
    fn default() -> Self {
        CombinerConfig::default().into()
    }
}

impl From<CombinerConfig> for AllGatherCombiner {
    fn from(config: CombinerConfig) -> Self {
        Self::new(config.combine_threshold_bytes, config.combine_threshold_count)
    }
}

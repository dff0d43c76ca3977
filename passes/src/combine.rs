//! Keyed instruction combining.
//!
//! The engine here is collective-agnostic: the caller supplies a key
//! function (which candidates exist and which may ever share a group), a
//! pairwise attribute check against the open group, and a combine callback
//! that performs the actual rewrite. The engine owns scan order, byte/count
//! budgets, dependency safety, and schedule maintenance.
//!
//! # Algorithm
//!
//! Candidate keys are snapshotted once; instructions created by rewrites are
//! invisible to later rounds. Each round rebuilds the dependency map, scans
//! the computation (schedule order when one exists, post order otherwise),
//! accumulates one group, erases its keys, and rewrites it if it has at
//! least two members. Rounds repeat until no keys remain. Combining one
//! group per round keeps the safety check honest: two groups that are
//! individually cycle-free can still form a cycle if both were planned
//! against the same snapshot.
//!
//! Scan rules with an open group:
//! - different key: invisible, scan continues past it;
//! - same key, alone over the byte budget: erased for good;
//! - same key, pushing the running total over the byte budget: group closes
//!   (the budget is inclusive, equality still appends);
//! - same key, failing the attribute check: closes the group under a
//!   schedule, skipped otherwise;
//! - anything that (transitively) consumes a group member: closes the group
//!   under a schedule; without one only same-key candidates are held to
//!   dependency safety;
//! - append raising the member count to the count budget: group closes.
//!
//! In scheduled mode the rewritten group is spliced back at the last
//! member's slot. Every instruction left between members provably does not
//! read any member (it would have closed the group), so that slot keeps the
//! sequence valid.

use std::collections::HashMap;
use std::hash::Hash;

use hail_ir::{Computation, ComputationId, InstructionId, Module, ReachabilityMap, Result};

/// Artifacts of one rewrite: the synthesized instruction plus the
/// per-member replacement nodes, in group order.
pub struct CombinedGroup {
    pub combined: InstructionId,
    pub replacements: Vec<InstructionId>,
}

/// Combine same-key instructions of one computation under byte and count
/// budgets. Returns whether anything was rewritten.
pub fn combine_instructions_by_key<K: Clone + Eq + Hash>(
    module: &mut Module,
    computation_id: ComputationId,
    combine_threshold_bytes: u64,
    combine_threshold_count: u64,
    key_fn: impl Fn(&Computation, InstructionId) -> Option<K>,
    attribute_compatible: impl Fn(&Computation, InstructionId, InstructionId) -> bool,
    mut combine: impl FnMut(&mut Computation, &[InstructionId]) -> Result<CombinedGroup>,
) -> Result<bool> {
    let scheduled = module.schedule().and_then(|s| s.sequence(computation_id)).is_some();

    let mut keys: HashMap<InstructionId, K> = HashMap::new();
    {
        let computation = module.computation(computation_id);
        for id in computation.instruction_ids() {
            if let Some(key) = key_fn(computation, id) {
                keys.insert(id, key);
            }
        }
    }
    tracing::trace!(
        computation.name = module.computation(computation_id).name(),
        candidates = keys.len(),
        scheduled,
        "scanning computation for combinable collectives"
    );

    let mut changed = false;
    while !keys.is_empty() {
        let group = {
            let computation = module.computation(computation_id);
            let reachability = ReachabilityMap::build(computation);
            let order: Vec<InstructionId> = match module.schedule().and_then(|s| s.sequence(computation_id)) {
                Some(sequence) => sequence.to_vec(),
                None => computation.post_order(),
            };

            let mut group: Vec<InstructionId> = Vec::new();
            let mut group_bytes = 0u64;
            let mut group_key: Option<K> = None;

            for id in order {
                let Some(key) = keys.get(&id) else {
                    // An intervening consumer pins the open group in place.
                    if scheduled && depends_on_group(&reachability, &group, id) {
                        break;
                    }
                    continue;
                };
                if let Some(open) = &group_key
                    && key != open
                {
                    if scheduled && depends_on_group(&reachability, &group, id) {
                        break;
                    }
                    continue;
                }

                let bytes = computation.instruction(id).shape().byte_size();
                if bytes > combine_threshold_bytes {
                    // Over budget alone: can never pair with anything.
                    tracing::trace!(instruction = %id, bytes, "candidate exceeds the byte budget by itself");
                    keys.remove(&id);
                    continue;
                }
                if group_bytes + bytes > combine_threshold_bytes {
                    break;
                }
                if !group.is_empty() && !attribute_compatible(computation, group[0], id) {
                    if scheduled {
                        break;
                    }
                    continue;
                }
                if depends_on_group(&reachability, &group, id) {
                    break;
                }

                if group_key.is_none() {
                    group_key = Some(key.clone());
                }
                group.push(id);
                group_bytes += bytes;
                if group.len() as u64 >= combine_threshold_count {
                    break;
                }
            }
            group
        };

        for member in &group {
            keys.remove(member);
        }
        if group.len() < 2 {
            continue;
        }

        let artifacts = combine(module.computation_mut(computation_id), &group)?;
        changed = true;
        tracing::debug!(
            computation.name = module.computation(computation_id).name(),
            members = group.len(),
            combined = %artifacts.combined,
            "combined instruction group"
        );
        if scheduled && let Some(sequence) = module.schedule_mut().and_then(|s| s.sequence_mut(computation_id)) {
            splice_sequence(sequence, &group, &artifacts);
        }
    }
    Ok(changed)
}

fn depends_on_group(reachability: &ReachabilityMap, group: &[InstructionId], id: InstructionId) -> bool {
    group.iter().any(|&member| reachability.is_reachable(member, id))
}

/// Replace the group's slots with `[combined, replacements..]` at the last
/// member's position, dropping the members.
fn splice_sequence(sequence: &mut Vec<InstructionId>, group: &[InstructionId], artifacts: &CombinedGroup) {
    let last = *group.last().expect("spliced group cannot be empty");
    let mut result = Vec::with_capacity(sequence.len() + 1);
    for &id in sequence.iter() {
        if id == last {
            result.push(artifacts.combined);
            result.extend_from_slice(&artifacts.replacements);
        } else if !group.contains(&id) {
            result.push(id);
        }
    }
    *sequence = result;
}

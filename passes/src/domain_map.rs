//! Domain-equivalence classification.
//!
//! Domain boundary instructions cut a computation into regions. Two regions
//! are interchangeable for combining purposes when the metadata on their
//! boundaries compares structurally equal, so the classifier keys every
//! region by the set of distinct boundary metadata around it and interns
//! those keys into dense class ids. Copies of one annotated boundary then
//! land in the same class even though the regions share no instructions.
//!
//! # Algorithm
//!
//! One flood fill per unassigned non-domain instruction, walking operand and
//! user edges but never through a domain instruction. The fill collects the
//! metadata of every adjacent boundary; the sorted, deduplicated metadata
//! list is the region's class key. Regions with no adjacent boundary share
//! the empty key, the "no domain" class.

use std::collections::HashMap;

use hail_ir::{Computation, DomainMetadata, InstructionId};

/// Interned class of structurally equal domain regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DomainClassId(u32);

impl std::fmt::Display for DomainClassId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Instruction to domain-equivalence class assignment for one computation.
///
/// Valid for the graph it was built from; rebuild after structural changes
/// that add or remove domain boundaries.
pub struct DomainMap {
    classes: HashMap<InstructionId, DomainClassId>,
}

impl DomainMap {
    pub fn build(computation: &Computation) -> Self {
        let mut classes = HashMap::new();
        let mut interner: HashMap<Vec<DomainMetadata>, DomainClassId> = HashMap::new();

        for (seed, instruction) in computation.instructions() {
            if instruction.op().is_domain() || classes.contains_key(&seed) {
                continue;
            }

            // Flood one region and gather its boundary metadata.
            let mut members = vec![seed];
            let mut boundary: Vec<DomainMetadata> = Vec::new();
            let mut queue = vec![seed];
            // Reserve the seed before walking so the fill never revisits it.
            classes.insert(seed, DomainClassId(u32::MAX));
            while let Some(id) = queue.pop() {
                let inst = computation.instruction(id);
                let neighbors = inst.operands().iter().chain(inst.users());
                for &neighbor in neighbors {
                    let neighbor_inst = computation.instruction(neighbor);
                    if let Some(metadata) = neighbor_inst.op().as_domain_metadata() {
                        boundary.push(metadata.clone());
                        continue;
                    }
                    if !classes.contains_key(&neighbor) {
                        classes.insert(neighbor, DomainClassId(u32::MAX));
                        members.push(neighbor);
                        queue.push(neighbor);
                    }
                }
            }

            boundary.sort();
            boundary.dedup();
            let next = DomainClassId(interner.len() as u32);
            let class = *interner.entry(boundary).or_insert(next);
            for member in members {
                classes.insert(member, class);
            }
        }

        Self { classes }
    }

    /// Class of an instruction, or `None` for domain boundary instructions,
    /// which belong to no region.
    pub fn class(&self, id: InstructionId) -> Option<DomainClassId> {
        self.classes.get(&id).copied()
    }
}

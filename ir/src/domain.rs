//! Domain boundary metadata.

use crate::sharding::Sharding;

/// Metadata carried by a domain boundary instruction.
///
/// `entry` describes the annotation on the side the operand comes from,
/// `exit` the annotation exposed to users. Two boundaries compare equal when
/// both sides are structurally equal; identity never matters, so copies of
/// one boundary scope the same equivalence class.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DomainMetadata {
    pub entry: Vec<Sharding>,
    pub exit: Sharding,
}

impl DomainMetadata {
    pub fn new(entry: impl Into<Vec<Sharding>>, exit: Sharding) -> Self {
        Self { entry: entry.into(), exit }
    }
}

impl std::fmt::Display for DomainMetadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "entry={{")?;
        for (i, sharding) in self.entry.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{sharding}")?;
        }
        write!(f, "}} exit={}", self.exit)
    }
}

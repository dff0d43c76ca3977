//! Collective-communication attributes.

use itertools::Itertools;

/// Partition of participant ids into disjoint communication groups.
///
/// Group order and the id order inside each group are semantic: they fix the
/// concatenation order of the collective's result. Comparison for combining
/// purposes goes through [`ReplicaGroups::signature`], which ignores both
/// orders, because two collectives over the same partition move the same data
/// regardless of how the partition was written down.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ReplicaGroups(Vec<Vec<u64>>);

impl ReplicaGroups {
    /// Groups as written. An empty list means one group of all participants.
    pub fn new(groups: impl Into<Vec<Vec<u64>>>) -> Self {
        Self(groups.into())
    }

    pub fn groups(&self) -> &[Vec<u64>] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Order-independent set-of-sets form: ids sorted within each group,
    /// groups sorted among themselves.
    pub fn signature(&self) -> Vec<Vec<u64>> {
        self.0.iter().map(|group| group.iter().copied().sorted().collect::<Vec<_>>()).sorted().collect()
    }
}

impl<const N: usize, const M: usize> From<[[u64; M]; N]> for ReplicaGroups {
    fn from(groups: [[u64; M]; N]) -> Self {
        Self(groups.iter().map(|group| group.to_vec()).collect())
    }
}

impl std::fmt::Display for ReplicaGroups {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        for (i, group) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{{{}}}", group.iter().join(","))?;
        }
        write!(f, "}}")
    }
}

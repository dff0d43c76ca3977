//! Sharding annotations.
//!
//! The graph model only carries shardings around and compares them
//! structurally; interpreting what a sharding means for data placement is a
//! partitioner concern and lives elsewhere.

/// How a value's data is distributed across participants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Sharding {
    /// Every participant holds the full value.
    Replicated,

    /// The full value lives on a single device.
    Maximal { device: u64 },

    /// Per-component shardings of a tuple-shaped value.
    Tuple(Vec<Sharding>),
}

impl Sharding {
    pub const fn maximal(device: u64) -> Self {
        Self::Maximal { device }
    }

    pub fn tuple(elements: impl Into<Vec<Sharding>>) -> Self {
        Self::Tuple(elements.into())
    }

    pub const fn is_tuple(&self) -> bool {
        matches!(self, Self::Tuple(_))
    }
}

impl std::fmt::Display for Sharding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Replicated => write!(f, "{{replicated}}"),
            Self::Maximal { device } => write!(f, "{{maximal device={device}}}"),
            Self::Tuple(elements) => {
                write!(f, "{{")?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{element}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

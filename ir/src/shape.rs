//! Shapes and element types.
//!
//! A shape is either an array (element type plus dimensions) or a tuple of
//! shapes. Byte sizes derived from shapes drive the combiner's grouping
//! thresholds, so they are exact, not estimates.

use snafu::ensure;

use crate::error::{NotAnArraySnafu, NotATupleSnafu, Result, TupleIndexOutOfRangeSnafu};

/// Scalar element type of an array shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElementType {
    Pred,
    S8,
    S16,
    S32,
    S64,
    U8,
    U16,
    U32,
    U64,
    F16,
    BF16,
    F32,
    F64,
}

impl ElementType {
    /// Size of one element in bytes.
    pub const fn byte_size(&self) -> u64 {
        match self {
            Self::Pred | Self::S8 | Self::U8 => 1,
            Self::S16 | Self::U16 | Self::F16 | Self::BF16 => 2,
            Self::S32 | Self::U32 | Self::F32 => 4,
            Self::S64 | Self::U64 | Self::F64 => 8,
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Pred => "pred",
            Self::S8 => "s8",
            Self::S16 => "s16",
            Self::S32 => "s32",
            Self::S64 => "s64",
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::F16 => "f16",
            Self::BF16 => "bf16",
            Self::F32 => "f32",
            Self::F64 => "f64",
        }
    }
}

/// Output shape of an instruction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Shape {
    /// Dense array of one element type. Scalars are zero-rank arrays.
    Array { element_type: ElementType, dims: Vec<u64> },

    /// Ordered product of component shapes.
    Tuple(Vec<Shape>),
}

impl Shape {
    pub fn array(element_type: ElementType, dims: impl Into<Vec<u64>>) -> Self {
        Self::Array { element_type, dims: dims.into() }
    }

    pub fn scalar(element_type: ElementType) -> Self {
        Self::Array { element_type, dims: Vec::new() }
    }

    pub fn tuple(elements: impl Into<Vec<Shape>>) -> Self {
        Self::Tuple(elements.into())
    }

    pub const fn is_array(&self) -> bool {
        matches!(self, Self::Array { .. })
    }

    pub const fn is_tuple(&self) -> bool {
        matches!(self, Self::Tuple(_))
    }

    /// Total payload size in bytes. Tuples sum their components.
    pub fn byte_size(&self) -> u64 {
        match self {
            Self::Array { element_type, dims } => dims.iter().product::<u64>() * element_type.byte_size(),
            Self::Tuple(elements) => elements.iter().map(Shape::byte_size).sum(),
        }
    }

    /// Dimensions of an array shape.
    pub fn dims(&self) -> Result<&[u64]> {
        match self {
            Self::Array { dims, .. } => Ok(dims),
            Self::Tuple(_) => NotAnArraySnafu { found: "tuple" }.fail(),
        }
    }

    /// Number of components of a tuple shape.
    pub fn tuple_len(&self) -> Result<usize> {
        match self {
            Self::Tuple(elements) => Ok(elements.len()),
            Self::Array { .. } => NotATupleSnafu { found: "array" }.fail(),
        }
    }

    /// Component shape of a tuple at `index`.
    pub fn tuple_element(&self, index: usize) -> Result<&Shape> {
        let elements = match self {
            Self::Tuple(elements) => elements,
            Self::Array { .. } => return NotATupleSnafu { found: "array" }.fail(),
        };
        ensure!(index < elements.len(), TupleIndexOutOfRangeSnafu { index, len: elements.len() });
        Ok(&elements[index])
    }
}

impl std::fmt::Display for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Array { element_type, dims } => {
                write!(f, "{}[", element_type.name())?;
                for (i, dim) in dims.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{dim}")?;
                }
                write!(f, "]")
            }
            Self::Tuple(elements) => {
                write!(f, "(")?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{element}")?;
                }
                write!(f, ")")
            }
        }
    }
}

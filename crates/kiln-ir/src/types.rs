//! Type system for the Kiln IR.

use serde::{Deserialize, Serialize};

/// The kind of a scalar element.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub enum ScalarKind {
    /// Not yet inferred; never valid at emission time.
    Unknown,
    /// No value.
    Void,
    /// Boolean.
    Bool,
    /// Signed integer.
    Int,
    /// Unsigned integer.
    UInt,
    /// IEEE floating point.
    Float,
    /// Brain floating point.
    BFloat,
    /// String constant.
    String,
}

/// Pointer qualification of a type.
#[derive(Clone, Copy, Debug, Default, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Pointer {
    /// A plain value.
    #[default]
    None,
    /// A mutable pointer to the element type.
    Mut,
    /// A const-qualified pointer to the element type.
    Const,
}

/// A (possibly vectorized, possibly pointer) element type.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct Type {
    pub kind: ScalarKind,
    /// Width of one element in bits.
    pub bits: u8,
    /// Number of SIMD lanes; 1 for scalars.
    pub lanes: u16,
    #[serde(default)]
    pub pointer: Pointer,
}

impl Type {
    pub const UNKNOWN: Self = Self::scalar(ScalarKind::Unknown, 0);
    pub const VOID: Self = Self::scalar(ScalarKind::Void, 0);
    pub const BOOL: Self = Self::scalar(ScalarKind::Bool, 1);
    pub const I8: Self = Self::scalar(ScalarKind::Int, 8);
    pub const I16: Self = Self::scalar(ScalarKind::Int, 16);
    pub const I32: Self = Self::scalar(ScalarKind::Int, 32);
    pub const I64: Self = Self::scalar(ScalarKind::Int, 64);
    pub const U8: Self = Self::scalar(ScalarKind::UInt, 8);
    pub const U16: Self = Self::scalar(ScalarKind::UInt, 16);
    pub const U32: Self = Self::scalar(ScalarKind::UInt, 32);
    pub const U64: Self = Self::scalar(ScalarKind::UInt, 64);
    pub const F16: Self = Self::scalar(ScalarKind::Float, 16);
    pub const F32: Self = Self::scalar(ScalarKind::Float, 32);
    pub const F64: Self = Self::scalar(ScalarKind::Float, 64);
    pub const BF16: Self = Self::scalar(ScalarKind::BFloat, 16);
    pub const STRING: Self = Self::scalar(ScalarKind::String, 0);

    /// A single-lane, non-pointer type.
    pub const fn scalar(kind: ScalarKind, bits: u8) -> Self {
        Self {
            kind,
            bits,
            lanes: 1,
            pointer: Pointer::None,
        }
    }

    /// The same element type with `lanes` lanes.
    pub fn with_lanes(self, lanes: u16) -> Self {
        Self { lanes, ..self }
    }

    /// A single lane of this type, with pointer qualification dropped.
    pub fn element_of(self) -> Self {
        Self {
            lanes: 1,
            pointer: Pointer::None,
            ..self
        }
    }

    /// A mutable pointer to this element type.
    pub fn pointer_to(self) -> Self {
        Self {
            pointer: Pointer::Mut,
            ..self
        }
    }

    /// A const pointer to this element type.
    pub fn const_pointer_to(self) -> Self {
        Self {
            pointer: Pointer::Const,
            ..self
        }
    }

    pub fn is_vector(self) -> bool {
        self.lanes > 1
    }

    pub fn is_pointer(self) -> bool {
        self.pointer != Pointer::None
    }

    pub fn is_bool(self) -> bool {
        self.kind == ScalarKind::Bool
    }

    /// Void values only; pointers to void are still valid handles.
    pub fn is_void(self) -> bool {
        self.kind == ScalarKind::Void && !self.is_pointer()
    }

    pub fn is_int(self) -> bool {
        matches!(self.kind, ScalarKind::Int | ScalarKind::UInt)
    }

    /// Returns `false` for types the upstream pipeline failed to infer.
    pub fn is_valid(self) -> bool {
        self.kind != ScalarKind::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_constants() {
        assert_eq!(Type::F32.kind, ScalarKind::Float);
        assert_eq!(Type::F32.bits, 32);
        assert_eq!(Type::I64.bits, 64);
        assert_eq!(Type::BOOL.lanes, 1);
        assert!(!Type::F32.is_pointer());
    }

    #[test]
    fn vector_and_element() {
        let v = Type::F32.with_lanes(4);
        assert!(v.is_vector());
        assert_eq!(v.element_of(), Type::F32);
        assert!(!Type::F32.is_vector());
    }

    #[test]
    fn pointer_qualification() {
        let p = Type::F16.pointer_to();
        assert!(p.is_pointer());
        assert_eq!(p.pointer, Pointer::Mut);
        assert_eq!(Type::F16.const_pointer_to().pointer, Pointer::Const);
        assert_eq!(p.element_of(), Type::F16);
    }

    #[test]
    fn validity() {
        assert!(!Type::UNKNOWN.is_valid());
        assert!(Type::VOID.is_valid());
        assert!(Type::VOID.is_void());
        assert!(!Type::VOID.pointer_to().is_void());
    }
}

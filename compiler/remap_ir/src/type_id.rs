//! Interned type identifier.
//!
//! - `TypeId(u32)` for O(1) equality comparison
//! - Pre-interned primitive types at fixed indices
//! - Copy, lightweight passing; usable directly as a cache key

use std::fmt;

/// Interned type identifier handed out by [`TypeRegistry`](crate::TypeRegistry).
///
/// Primitive (built-in) types are pre-interned with fixed indices so that
/// conversion tables can match on the constants without a registry lookup.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[repr(transparent)]
pub struct TypeId(u32);

impl TypeId {
    // Pre-interned primitive types
    pub const INT: TypeId = TypeId(0);
    pub const FLOAT: TypeId = TypeId(1);
    pub const BOOL: TypeId = TypeId(2);
    pub const STR: TypeId = TypeId(3);
    pub const CHAR: TypeId = TypeId(4);
    pub const BYTE: TypeId = TypeId(5);
    pub const UNIT: TypeId = TypeId(6);

    /// First ID for registered compound types.
    pub const FIRST_COMPOUND: u32 = 7;

    /// Create from a raw u32 value.
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        TypeId(raw)
    }

    /// Get the raw u32 value.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Index into the registry's type table.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Check if this is a pre-interned primitive type.
    #[inline]
    pub const fn is_primitive(self) -> bool {
        self.0 < Self::FIRST_COMPOUND
    }

    /// Name of a primitive type, `None` for compound types.
    pub const fn primitive_name(self) -> Option<&'static str> {
        match self.0 {
            0 => Some("int"),
            1 => Some("float"),
            2 => Some("bool"),
            3 => Some("str"),
            4 => Some("char"),
            5 => Some("byte"),
            6 => Some("unit"),
            _ => None,
        }
    }
}

impl fmt::Debug for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.primitive_name() {
            Some(name) => write!(f, "TypeId::{}", name.to_uppercase()),
            None => write!(f, "TypeId({})", self.0),
        }
    }
}

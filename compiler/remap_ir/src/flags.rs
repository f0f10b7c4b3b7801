//! Pre-computed type metadata flags.
//!
//! `TypeFlags` are computed once at interning time and cached, so strategy
//! capability checks are O(1) bit tests instead of matches on `TypeData`.

use bitflags::bitflags;

bitflags! {
    /// Pre-computed type properties for O(1) queries.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct TypeFlags: u32 {
        // === Category Flags ===

        /// Built-in primitive type (int, str, ...). Mapped by value.
        const BUILTIN = 1 << 0;
        /// Heap object with identity. Participates in reference tracking.
        const REFERENCE = 1 << 1;
        /// Nominal struct type with member metadata.
        const STRUCT = 1 << 2;
        /// Interface type; has no constructor of its own.
        const ABSTRACT = 1 << 3;

        // === Collection Shape Flags ===

        /// Can be iterated as a sequence of elements.
        const ENUMERABLE = 1 << 8;
        /// Elements are written by index (fixed-length arrays).
        const INDEXED = 1 << 9;
        /// Enumerates as key/value entries.
        const KEYED = 1 << 10;
        /// Last-in first-out; pop order mirrors push order reversed.
        const LIFO = 1 << 11;
        /// First-in first-out.
        const FIFO = 1 << 12;
        /// User-declared collection with explicit operations.
        const CUSTOM = 1 << 13;
    }
}

impl TypeFlags {
    /// Collection shapes: anything enumerable or keyed.
    pub const COLLECTION: Self =
        Self::from_bits_truncate(Self::ENUMERABLE.bits() | Self::KEYED.bits());

    /// Check for a built-in primitive.
    #[inline]
    pub fn is_builtin(self) -> bool {
        self.contains(Self::BUILTIN)
    }

    /// Check for any collection shape.
    #[inline]
    pub fn is_collection(self) -> bool {
        self.intersects(Self::COLLECTION)
    }

    /// Check for a non-keyed enumerable (sequence-like) shape.
    #[inline]
    pub fn is_sequence(self) -> bool {
        self.contains(Self::ENUMERABLE) && !self.contains(Self::KEYED)
    }

    /// Check for a complex object that is not a collection.
    #[inline]
    pub fn is_complex_object(self) -> bool {
        self.contains(Self::REFERENCE) && !self.is_collection()
    }
}

use std::fmt;

use remap_ir::{TypeId, TypeRegistry};

/// Identity of one mapping direction: (source type, target type).
///
/// The canonical cache key for type mappings and compiled routines.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct TypePair {
    pub source: TypeId,
    pub target: TypeId,
}

impl TypePair {
    #[inline]
    pub const fn new(source: TypeId, target: TypeId) -> Self {
        TypePair { source, target }
    }

    /// `Source -> Target` using registry display names.
    pub fn display(&self, types: &TypeRegistry) -> String {
        format!(
            "{} -> {}",
            types.display(self.source),
            types.display(self.target)
        )
    }
}

impl fmt::Debug for TypePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypePair({:?} -> {:?})", self.source, self.target)
    }
}

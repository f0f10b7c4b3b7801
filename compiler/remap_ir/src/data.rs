//! Interned type shapes and member definitions.

use crate::{TypeFlags, TypeId};

/// Structural key for interning a type.
///
/// Structs and interfaces are nominal: their key is the name, and their
/// member list lives in a [`StructDef`] registered separately. That split
/// lets a struct refer to itself (`Node { next: Node }`).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeData {
    // Primitives
    Int,
    Float,
    Bool,
    Str,
    Char,
    Byte,
    Unit,

    // Nominal types
    Struct(String),
    Interface(String),

    // Built-in collections
    /// Growable sequence with `clear` and `push`.
    List(TypeId),
    /// Fixed-length sequence written by index.
    Array(TypeId),
    /// FIFO queue with `clear` and `enqueue`.
    Queue(TypeId),
    /// LIFO stack with `clear` and `push`.
    Stack(TypeId),
    /// Dictionary with `clear` and `insert`.
    Map(TypeId, TypeId),
    /// User-declared sequence; its operations are described by [`CollectionOps`].
    Collection { name: String, elem: TypeId },
}

impl TypeData {
    /// Compute the flags for this shape.
    pub fn flags(&self) -> TypeFlags {
        match self {
            TypeData::Int
            | TypeData::Float
            | TypeData::Bool
            | TypeData::Str
            | TypeData::Char
            | TypeData::Byte
            | TypeData::Unit => TypeFlags::BUILTIN,
            TypeData::Struct(_) => TypeFlags::REFERENCE | TypeFlags::STRUCT,
            TypeData::Interface(_) => TypeFlags::REFERENCE | TypeFlags::ABSTRACT,
            TypeData::List(_) => TypeFlags::REFERENCE | TypeFlags::ENUMERABLE,
            TypeData::Array(_) => {
                TypeFlags::REFERENCE | TypeFlags::ENUMERABLE | TypeFlags::INDEXED
            }
            TypeData::Queue(_) => TypeFlags::REFERENCE | TypeFlags::ENUMERABLE | TypeFlags::FIFO,
            TypeData::Stack(_) => TypeFlags::REFERENCE | TypeFlags::ENUMERABLE | TypeFlags::LIFO,
            TypeData::Map(_, _) => {
                TypeFlags::REFERENCE | TypeFlags::ENUMERABLE | TypeFlags::KEYED
            }
            TypeData::Collection { .. } => {
                TypeFlags::REFERENCE | TypeFlags::ENUMERABLE | TypeFlags::CUSTOM
            }
        }
    }

    /// Element type of a sequence-shaped collection.
    pub fn element(&self) -> Option<TypeId> {
        match self {
            TypeData::List(elem)
            | TypeData::Array(elem)
            | TypeData::Queue(elem)
            | TypeData::Stack(elem)
            | TypeData::Collection { elem, .. } => Some(*elem),
            _ => None,
        }
    }

    /// Key and value types of a dictionary.
    pub fn entry(&self) -> Option<(TypeId, TypeId)> {
        match self {
            TypeData::Map(key, value) => Some((*key, *value)),
            _ => None,
        }
    }
}

/// Operations a collection type exposes to the mapper.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct CollectionOps {
    /// Has a clear operation.
    pub clear: bool,
    /// Has an item-insertion operation.
    pub insert: bool,
    /// Can be constructed from a sequence of its elements.
    pub from_sequence: bool,
}

impl CollectionOps {
    /// Everything available; the shape of the built-in growable collections.
    pub const FULL: CollectionOps = CollectionOps {
        clear: true,
        insert: true,
        from_sequence: true,
    };

    /// Arrays: clearable in place, written by index, no insertion method.
    pub const INDEXED: CollectionOps = CollectionOps {
        clear: true,
        insert: false,
        from_sequence: false,
    };
}

/// One declared member of a struct.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldDef {
    pub name: String,
    pub ty: TypeId,
    pub readable: bool,
    pub writable: bool,
}

impl FieldDef {
    /// A readable and writable field.
    pub fn new(name: impl Into<String>, ty: TypeId) -> Self {
        FieldDef {
            name: name.into(),
            ty,
            readable: true,
            writable: true,
        }
    }

    /// Mark the field as having no setter.
    #[must_use]
    pub fn read_only(mut self) -> Self {
        self.writable = false;
        self
    }

    /// Mark the field as having no getter.
    #[must_use]
    pub fn write_only(mut self) -> Self {
        self.readable = false;
        self
    }
}

/// Member metadata for a struct type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StructDef {
    pub name: String,
    pub fields: Vec<FieldDef>,
    /// Whether a default (parameterless) constructor exists.
    pub constructible: bool,
}

impl StructDef {
    pub fn new(name: impl Into<String>) -> Self {
        StructDef {
            name: name.into(),
            fields: Vec::new(),
            constructible: true,
        }
    }

    /// Append a readable, writable field.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, ty: TypeId) -> Self {
        self.fields.push(FieldDef::new(name, ty));
        self
    }

    /// Append a fully specified field.
    #[must_use]
    pub fn with_field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    /// Drop the default constructor; instances must come from a custom constructor.
    #[must_use]
    pub fn without_default_constructor(mut self) -> Self {
        self.constructible = false;
        self
    }

    /// Find a field index by name.
    pub fn field_index(&self, name: &str, ignore_case: bool) -> Option<usize> {
        self.fields.iter().position(|f| {
            if ignore_case {
                f.name.eq_ignore_ascii_case(name)
            } else {
                f.name == name
            }
        })
    }
}

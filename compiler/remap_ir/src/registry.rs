//! Thread-safe type registry.
//!
//! Interns [`TypeData`] into [`TypeId`] handles and stores the member
//! metadata the mapper reflects over: struct definitions, collection
//! operations and interface implementations.
//!
//! # Thread Safety
//! A single `RwLock` guards the tables. Lookups take the read lock; interning
//! takes a read-locked fast path first and double-checks under the write lock.
//! Locks are never held across calls back into the registry.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::value::{MapData, ObjRef, Object, ObjectData, Value};
use crate::{CollectionOps, StructDef, TypeData, TypeFlags, TypeId};

/// Registry shared between the configuration, the compiler and callers.
pub type SharedTypeRegistry = Arc<TypeRegistry>;

/// Error raised by registry operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("type registry exceeded {max} types")]
    Overflow { max: u32 },
    #[error("`{name}` is not a struct type")]
    NotAStruct { name: String },
    #[error("struct `{name}` is declared but has no member definition")]
    UndefinedStruct { name: String },
    #[error("`{name}` is not an interface type")]
    NotAnInterface { name: String },
    #[error("`{name}` cannot be default-constructed")]
    NotConstructible { name: String },
}

struct RegistryInner {
    /// Map from type data to index for deduplication.
    map: FxHashMap<TypeData, u32>,
    /// Storage for type data, indexed by `TypeId`.
    types: Vec<TypeData>,
    /// Flags computed at interning time, parallel to `types`.
    flags: Vec<TypeFlags>,
    structs: FxHashMap<TypeId, Arc<StructDef>>,
    /// Operations of user-declared collections.
    collections: FxHashMap<TypeId, CollectionOps>,
    /// Concrete type -> interfaces it implements.
    implements: FxHashMap<TypeId, FxHashSet<TypeId>>,
}

impl RegistryInner {
    /// Create storage with the primitives pre-interned at their fixed indices.
    fn with_primitives() -> Self {
        let mut inner = RegistryInner {
            map: FxHashMap::default(),
            types: Vec::with_capacity(64),
            flags: Vec::with_capacity(64),
            structs: FxHashMap::default(),
            collections: FxHashMap::default(),
            implements: FxHashMap::default(),
        };

        let primitives = [
            TypeData::Int,   // 0 = TypeId::INT
            TypeData::Float, // 1 = TypeId::FLOAT
            TypeData::Bool,  // 2 = TypeId::BOOL
            TypeData::Str,   // 3 = TypeId::STR
            TypeData::Char,  // 4 = TypeId::CHAR
            TypeData::Byte,  // 5 = TypeId::BYTE
            TypeData::Unit,  // 6 = TypeId::UNIT
        ];
        for data in primitives {
            inner.push(data);
        }
        debug_assert_eq!(inner.types.len(), TypeId::FIRST_COMPOUND as usize);
        inner
    }

    fn push(&mut self, data: TypeData) -> u32 {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "callers check the length against u32::MAX first"
        )]
        let index = self.types.len() as u32;
        self.flags.push(data.flags());
        self.types.push(data.clone());
        self.map.insert(data, index);
        index
    }
}

/// Interner and definition store for the reflected type model.
pub struct TypeRegistry {
    inner: RwLock<RegistryInner>,
}

impl TypeRegistry {
    /// Create a registry with pre-interned primitives.
    pub fn new() -> Self {
        TypeRegistry {
            inner: RwLock::new(RegistryInner::with_primitives()),
        }
    }

    /// Create a registry already wrapped for sharing.
    pub fn shared() -> SharedTypeRegistry {
        Arc::new(Self::new())
    }

    /// Try to intern a type, returning its `TypeId` or an error on overflow.
    pub fn try_intern(&self, data: TypeData) -> Result<TypeId, RegistryError> {
        // Fast path: check if already interned
        {
            let guard = self.inner.read();
            if let Some(&index) = guard.map.get(&data) {
                return Ok(TypeId::from_raw(index));
            }
        }

        // Slow path: need to insert
        let mut guard = self.inner.write();

        // Double-check after acquiring write lock
        if let Some(&index) = guard.map.get(&data) {
            return Ok(TypeId::from_raw(index));
        }

        if u32::try_from(guard.types.len()).is_err() {
            return Err(RegistryError::Overflow { max: u32::MAX });
        }
        Ok(TypeId::from_raw(guard.push(data)))
    }

    /// Intern a type, returning its `TypeId`.
    ///
    /// # Panics
    /// Panics if the registry exceeds `u32::MAX` types. Use `try_intern` for
    /// fallible interning.
    pub fn intern(&self, data: TypeData) -> TypeId {
        self.try_intern(data).unwrap_or_else(|e| panic!("{e}"))
    }

    /// Number of interned types, primitives included.
    pub fn len(&self) -> usize {
        self.inner.read().types.len()
    }

    /// Always false: primitives are pre-interned.
    pub fn is_empty(&self) -> bool {
        false
    }

    // Declarations

    /// Declare a struct by name. Members are attached with [`Self::define_struct`].
    pub fn declare_struct(&self, name: &str) -> TypeId {
        self.intern(TypeData::Struct(name.to_owned()))
    }

    /// Attach member metadata to a declared struct, replacing any previous definition.
    pub fn define_struct(&self, id: TypeId, def: StructDef) -> Result<(), RegistryError> {
        let mut guard = self.inner.write();
        match guard.types.get(id.index()) {
            Some(TypeData::Struct(_)) => {
                guard.structs.insert(id, Arc::new(def));
                Ok(())
            }
            _ => Err(RegistryError::NotAStruct { name: def.name }),
        }
    }

    /// Declare and define a struct in one step.
    pub fn register_struct(&self, def: StructDef) -> Result<TypeId, RegistryError> {
        let id = self.declare_struct(&def.name);
        self.define_struct(id, def)?;
        Ok(id)
    }

    /// Member metadata of a struct, if defined.
    pub fn struct_def(&self, id: TypeId) -> Option<Arc<StructDef>> {
        self.inner.read().structs.get(&id).cloned()
    }

    /// Declare an interface by name.
    pub fn declare_interface(&self, name: &str) -> TypeId {
        self.intern(TypeData::Interface(name.to_owned()))
    }

    /// Record that `concrete` implements `interface`.
    pub fn implement(&self, concrete: TypeId, interface: TypeId) -> Result<(), RegistryError> {
        if !self.flags(interface).contains(TypeFlags::ABSTRACT) {
            return Err(RegistryError::NotAnInterface {
                name: self.display(interface),
            });
        }
        self.inner
            .write()
            .implements
            .entry(concrete)
            .or_default()
            .insert(interface);
        Ok(())
    }

    /// Whether a value of `from` can be stored where `to` is declared.
    pub fn is_assignable(&self, from: TypeId, to: TypeId) -> bool {
        from == to
            || self
                .inner
                .read()
                .implements
                .get(&from)
                .is_some_and(|set| set.contains(&to))
    }

    pub fn list_of(&self, elem: TypeId) -> TypeId {
        self.intern(TypeData::List(elem))
    }

    pub fn array_of(&self, elem: TypeId) -> TypeId {
        self.intern(TypeData::Array(elem))
    }

    pub fn queue_of(&self, elem: TypeId) -> TypeId {
        self.intern(TypeData::Queue(elem))
    }

    pub fn stack_of(&self, elem: TypeId) -> TypeId {
        self.intern(TypeData::Stack(elem))
    }

    pub fn map_of(&self, key: TypeId, value: TypeId) -> TypeId {
        self.intern(TypeData::Map(key, value))
    }

    /// Declare a custom sequence type with explicit operations.
    pub fn define_collection(&self, name: &str, elem: TypeId, ops: CollectionOps) -> TypeId {
        let id = self.intern(TypeData::Collection {
            name: name.to_owned(),
            elem,
        });
        self.inner.write().collections.insert(id, ops);
        id
    }

    // Queries

    /// Shape of a type.
    pub fn data(&self, id: TypeId) -> Option<TypeData> {
        self.inner.read().types.get(id.index()).cloned()
    }

    /// Cached flags; empty for unknown ids.
    pub fn flags(&self, id: TypeId) -> TypeFlags {
        self.inner
            .read()
            .flags
            .get(id.index())
            .copied()
            .unwrap_or_default()
    }

    /// Operations exposed by a collection type, `None` for non-collections.
    pub fn collection_ops(&self, id: TypeId) -> Option<CollectionOps> {
        let guard = self.inner.read();
        match guard.types.get(id.index())? {
            TypeData::List(_) | TypeData::Queue(_) | TypeData::Stack(_) | TypeData::Map(_, _) => {
                Some(CollectionOps::FULL)
            }
            TypeData::Array(_) => Some(CollectionOps::INDEXED),
            TypeData::Collection { .. } => guard.collections.get(&id).copied(),
            _ => None,
        }
    }

    /// Element type of a sequence-shaped collection.
    pub fn element_type(&self, id: TypeId) -> Option<TypeId> {
        self.inner.read().types.get(id.index())?.element()
    }

    /// Key and value types of a dictionary.
    pub fn entry_types(&self, id: TypeId) -> Option<(TypeId, TypeId)> {
        self.inner.read().types.get(id.index())?.entry()
    }

    /// Human-readable name used in diagnostics.
    pub fn display(&self, id: TypeId) -> String {
        if let Some(name) = id.primitive_name() {
            return name.to_owned();
        }
        // Clone first: nested displays re-enter the lock.
        let Some(data) = self.data(id) else {
            return format!("<unknown type {}>", id.raw());
        };
        match data {
            TypeData::Struct(name)
            | TypeData::Interface(name)
            | TypeData::Collection { name, .. } => name,
            TypeData::List(elem) => format!("List<{}>", self.display(elem)),
            TypeData::Array(elem) => format!("{}[]", self.display(elem)),
            TypeData::Queue(elem) => format!("Queue<{}>", self.display(elem)),
            TypeData::Stack(elem) => format!("Stack<{}>", self.display(elem)),
            TypeData::Map(key, value) => {
                format!("Map<{}, {}>", self.display(key), self.display(value))
            }
            TypeData::Int
            | TypeData::Float
            | TypeData::Bool
            | TypeData::Str
            | TypeData::Char
            | TypeData::Byte
            | TypeData::Unit => format!("{data:?}").to_lowercase(),
        }
    }

    // Construction

    /// Default value stored in a fresh slot of type `ty`.
    ///
    /// Primitives get their zero value; strings and reference types start null.
    pub fn default_value(&self, ty: TypeId) -> Value {
        match ty {
            TypeId::INT => Value::Int(0),
            TypeId::FLOAT => Value::Float(0.0),
            TypeId::BOOL => Value::Bool(false),
            TypeId::CHAR => Value::Char('\0'),
            TypeId::BYTE => Value::Byte(0),
            TypeId::UNIT => Value::Unit,
            _ => Value::Null,
        }
    }

    /// Default-construct an object of type `ty`.
    ///
    /// Arrays are created empty; use [`Self::new_array`] for a sized array.
    pub fn instantiate(&self, ty: TypeId) -> Result<ObjRef, RegistryError> {
        let not_constructible = || RegistryError::NotConstructible {
            name: self.display(ty),
        };
        let data = self.data(ty).ok_or_else(not_constructible)?;
        let object_data = match data {
            TypeData::Struct(name) => {
                let def = self
                    .struct_def(ty)
                    .ok_or(RegistryError::UndefinedStruct { name })?;
                if !def.constructible {
                    return Err(not_constructible());
                }
                ObjectData::Struct(
                    def.fields
                        .iter()
                        .map(|f| self.default_value(f.ty))
                        .collect(),
                )
            }
            TypeData::List(_) | TypeData::Array(_) | TypeData::Collection { .. } => {
                ObjectData::Sequence(Vec::new())
            }
            TypeData::Queue(_) => ObjectData::Queue(std::collections::VecDeque::new()),
            TypeData::Stack(_) => ObjectData::Stack(Vec::new()),
            TypeData::Map(_, _) => ObjectData::Map(MapData::default()),
            TypeData::Interface(_)
            | TypeData::Int
            | TypeData::Float
            | TypeData::Bool
            | TypeData::Str
            | TypeData::Char
            | TypeData::Byte
            | TypeData::Unit => return Err(not_constructible()),
        };
        Ok(ObjRef::new(Object::new(ty, object_data)))
    }

    /// Allocate an array of `len` default-valued slots.
    pub fn new_array(&self, ty: TypeId, len: usize) -> Result<ObjRef, RegistryError> {
        let elem = match self.data(ty) {
            Some(TypeData::Array(elem)) => elem,
            _ => {
                return Err(RegistryError::NotConstructible {
                    name: self.display(ty),
                })
            }
        };
        let slot = self.default_value(elem);
        Ok(ObjRef::new(Object::new(
            ty,
            ObjectData::Sequence(vec![slot; len]),
        )))
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("types", &self.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]

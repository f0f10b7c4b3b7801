//! Runtime values for object graphs handled by the mapper.
//!
//! Primitives are stored inline. Everything with identity lives behind an
//! [`ObjRef`]: a shared, lock-protected heap object. Two `ObjRef`s are the
//! same object iff they point to the same allocation, which is what the
//! reference tracker keys on.
//!
//! # Thread Safety
//!
//! Objects use `Arc<RwLock<_>>`, so graphs can be mapped from several threads.
//! Accessors take the lock for a single read or write and release it before
//! returning; nothing in this module holds a lock across a call that could
//! touch another object. Mapping an object onto itself therefore cannot
//! deadlock.

mod graph;
mod map;

use std::collections::VecDeque;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

pub use graph::graph_eq;
pub use map::MapData;

use crate::TypeId;

/// Runtime value.
#[derive(Clone, Default)]
pub enum Value {
    /// Absent reference.
    #[default]
    Null,
    Int(i64),
    Float(f64),
    Bool(bool),
    Char(char),
    Byte(u8),
    Str(Arc<str>),
    Unit,
    /// Heap object with identity.
    Object(ObjRef),
}

// Factory Methods

impl Value {
    /// Create a string value.
    #[inline]
    pub fn string(s: impl AsRef<str>) -> Self {
        Value::Str(Arc::from(s.as_ref()))
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_object(&self) -> Option<&ObjRef> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Runtime type of the value; `None` for null.
    pub fn runtime_type(&self) -> Option<TypeId> {
        match self {
            Value::Null => None,
            Value::Int(_) => Some(TypeId::INT),
            Value::Float(_) => Some(TypeId::FLOAT),
            Value::Bool(_) => Some(TypeId::BOOL),
            Value::Char(_) => Some(TypeId::CHAR),
            Value::Byte(_) => Some(TypeId::BYTE),
            Value::Str(_) => Some(TypeId::STR),
            Value::Unit => Some(TypeId::UNIT),
            Value::Object(obj) => Some(obj.type_id()),
        }
    }

    /// Whether this value and `other` are the same heap object.
    pub fn same_object(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl From<ObjRef> for Value {
    fn from(obj: ObjRef) -> Self {
        Value::Object(obj)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

/// Equality for primitives is by value (floats bitwise, so values can key a
/// map); objects compare by identity. Use [`graph_eq`] for structural equality.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) | (Value::Unit, Value::Unit) => true,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Byte(a), Value::Byte(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null | Value::Unit => {}
            Value::Int(n) => n.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::Bool(b) => b.hash(state),
            Value::Char(c) => c.hash(state),
            Value::Byte(b) => b.hash(state),
            Value::Str(s) => s.hash(state),
            Value::Object(obj) => obj.addr().hash(state),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x:?}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Char(c) => write!(f, "{c:?}"),
            Value::Byte(b) => write!(f, "{b}u8"),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::Unit => write!(f, "()"),
            Value::Object(obj) => write!(f, "{obj:?}"),
        }
    }
}

/// Display form used by to-string conversions.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Char(c) => write!(f, "{c}"),
            Value::Byte(b) => write!(f, "{b}"),
            Value::Str(s) => f.write_str(s),
            Value::Unit => write!(f, "()"),
            Value::Object(obj) => write!(f, "{obj:?}"),
        }
    }
}

// Objects

/// Storage of a heap object, by shape.
#[derive(Clone, Debug)]
pub enum ObjectData {
    /// Struct fields in declaration order.
    Struct(Vec<Value>),
    /// Lists, arrays and custom collections.
    Sequence(Vec<Value>),
    /// Front of the queue first.
    Queue(VecDeque<Value>),
    /// Top of the stack last.
    Stack(Vec<Value>),
    Map(MapData),
}

/// A heap object: its runtime type plus its data.
#[derive(Clone, Debug)]
pub struct Object {
    ty: TypeId,
    data: ObjectData,
}

impl Object {
    pub fn new(ty: TypeId, data: ObjectData) -> Self {
        Object { ty, data }
    }

    #[inline]
    pub fn ty(&self) -> TypeId {
        self.ty
    }

    pub fn data(&self) -> &ObjectData {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut ObjectData {
        &mut self.data
    }

    /// Elements in iteration order: stacks yield top first, queues front first.
    pub fn items(&self) -> Vec<Value> {
        match &self.data {
            ObjectData::Struct(_) | ObjectData::Map(_) => Vec::new(),
            ObjectData::Sequence(items) => items.clone(),
            ObjectData::Queue(items) => items.iter().cloned().collect(),
            ObjectData::Stack(items) => items.iter().rev().cloned().collect(),
        }
    }

    /// Number of elements, entries or fields.
    pub fn len(&self) -> usize {
        match &self.data {
            ObjectData::Struct(fields) => fields.len(),
            ObjectData::Sequence(items) | ObjectData::Stack(items) => items.len(),
            ObjectData::Queue(items) => items.len(),
            ObjectData::Map(map) => map.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clear elements or entries. Struct fields are left alone.
    pub fn clear(&mut self) {
        match &mut self.data {
            ObjectData::Struct(_) => {}
            ObjectData::Sequence(items) | ObjectData::Stack(items) => items.clear(),
            ObjectData::Queue(items) => items.clear(),
            ObjectData::Map(map) => map.clear(),
        }
    }

    /// Insert with the collection's own insertion operation.
    ///
    /// Returns `false` for shapes without one (structs, maps).
    pub fn push(&mut self, value: Value) -> bool {
        match &mut self.data {
            ObjectData::Sequence(items) | ObjectData::Stack(items) => items.push(value),
            ObjectData::Queue(items) => items.push_back(value),
            ObjectData::Struct(_) | ObjectData::Map(_) => return false,
        }
        true
    }
}

/// Shared handle to a heap object.
#[derive(Clone)]
pub struct ObjRef(Arc<RwLock<Object>>);

impl ObjRef {
    pub fn new(object: Object) -> Self {
        ObjRef(Arc::new(RwLock::new(object)))
    }

    /// Create a struct instance from field values in declaration order.
    pub fn new_struct(ty: TypeId, fields: Vec<Value>) -> Self {
        Self::new(Object::new(ty, ObjectData::Struct(fields)))
    }

    /// Create a list, array or custom collection.
    pub fn new_sequence(ty: TypeId, items: Vec<Value>) -> Self {
        Self::new(Object::new(ty, ObjectData::Sequence(items)))
    }

    /// Create a queue; `items` are given front first.
    pub fn new_queue(ty: TypeId, items: Vec<Value>) -> Self {
        Self::new(Object::new(ty, ObjectData::Queue(items.into())))
    }

    /// Create a stack by pushing `pushed` in order (the last item is the top).
    pub fn new_stack(ty: TypeId, pushed: Vec<Value>) -> Self {
        Self::new(Object::new(ty, ObjectData::Stack(pushed)))
    }

    /// Create a map from entries in insertion order.
    pub fn new_map(ty: TypeId, entries: Vec<(Value, Value)>) -> Self {
        let mut map = MapData::default();
        for (key, value) in entries {
            map.insert(key, value);
        }
        Self::new(Object::new(ty, ObjectData::Map(map)))
    }

    /// Same allocation?
    #[inline]
    pub fn ptr_eq(&self, other: &ObjRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Allocation address; the object's identity while it is alive.
    #[inline]
    pub fn addr(&self) -> usize {
        Arc::as_ptr(&self.0).cast::<()>() as usize
    }

    pub fn type_id(&self) -> TypeId {
        self.0.read().ty
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Object> {
        self.0.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, Object> {
        self.0.write()
    }

    /// Read a struct field; null when out of range or not a struct.
    pub fn field(&self, index: usize) -> Value {
        match &self.0.read().data {
            ObjectData::Struct(fields) => fields.get(index).cloned().unwrap_or_default(),
            _ => Value::Null,
        }
    }

    /// Write a struct field. Returns `false` when there is no such slot.
    pub fn set_field(&self, index: usize, value: Value) -> bool {
        match &mut self.0.write().data {
            ObjectData::Struct(fields) => match fields.get_mut(index) {
                Some(slot) => {
                    *slot = value;
                    true
                }
                None => false,
            },
            _ => false,
        }
    }

    /// Snapshot of the elements in iteration order.
    pub fn items(&self) -> Vec<Value> {
        self.0.read().items()
    }

    /// Snapshot of the entries of a map in insertion order.
    pub fn entries(&self) -> Vec<(Value, Value)> {
        match &self.0.read().data {
            ObjectData::Map(map) => map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            _ => Vec::new(),
        }
    }

    /// Look up a map entry.
    pub fn get(&self, key: &Value) -> Option<Value> {
        match &self.0.read().data {
            ObjectData::Map(map) => map.get(key).cloned(),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pop the top of a stack.
    pub fn pop(&self) -> Option<Value> {
        match &mut self.0.write().data {
            ObjectData::Stack(items) => items.pop(),
            _ => None,
        }
    }
}

impl fmt::Debug for ObjRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Identity only: object graphs may be cyclic.
        write!(f, "ObjRef({:?}@{:#x})", self.type_id(), self.addr())
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]

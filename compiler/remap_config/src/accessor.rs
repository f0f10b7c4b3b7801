//! Member accessors: resolved field paths or user functions.

use std::fmt;
use std::sync::Arc;

use remap_ir::{MemberPath, PathError, TypeId, TypeRegistry, Value};

/// Reads a member from an instance.
pub type Getter = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

/// Writes a member into an instance.
pub type Setter = Arc<dyn Fn(&Value, Value) + Send + Sync>;

/// Custom getter/setter pair standing in for a declared member.
#[derive(Clone)]
pub struct FnAccessor {
    /// Declared type of the member the functions expose.
    pub ty: TypeId,
    /// Name used in diagnostics.
    pub label: String,
    pub getter: Option<Getter>,
    pub setter: Option<Setter>,
}

/// How a member is read from a source or written into a target.
#[derive(Clone)]
pub enum MemberAccessor {
    Path(MemberPath),
    Function(FnAccessor),
}

impl MemberAccessor {
    /// Accessor backed by a getter only.
    pub fn getter(
        label: impl Into<String>,
        ty: TypeId,
        get: impl Fn(&Value) -> Value + Send + Sync + 'static,
    ) -> Self {
        MemberAccessor::Function(FnAccessor {
            ty,
            label: label.into(),
            getter: Some(Arc::new(get)),
            setter: None,
        })
    }

    /// Accessor backed by a setter only.
    pub fn setter(
        label: impl Into<String>,
        ty: TypeId,
        set: impl Fn(&Value, Value) + Send + Sync + 'static,
    ) -> Self {
        MemberAccessor::Function(FnAccessor {
            ty,
            label: label.into(),
            getter: None,
            setter: Some(Arc::new(set)),
        })
    }

    /// Declared type of the accessed member.
    pub fn member_type(&self) -> TypeId {
        match self {
            MemberAccessor::Path(path) => path.member_type(),
            MemberAccessor::Function(f) => f.ty,
        }
    }

    /// Access-path depth; functions count as a single hop.
    pub fn depth(&self) -> usize {
        match self {
            MemberAccessor::Path(path) => path.depth(),
            MemberAccessor::Function(_) => 1,
        }
    }

    pub fn is_readable(&self) -> bool {
        match self {
            MemberAccessor::Path(path) => path.is_readable(),
            MemberAccessor::Function(f) => f.getter.is_some(),
        }
    }

    pub fn is_writable(&self) -> bool {
        match self {
            MemberAccessor::Path(path) => path.is_writable(),
            MemberAccessor::Function(f) => f.setter.is_some(),
        }
    }

    /// The resolved path, when this accessor is one.
    pub fn as_path(&self) -> Option<&MemberPath> {
        match self {
            MemberAccessor::Path(path) => Some(path),
            MemberAccessor::Function(_) => None,
        }
    }

    /// Read the member; null when unreadable or through a null hop.
    pub fn read(&self, instance: &Value) -> Value {
        match self {
            MemberAccessor::Path(path) => path.read(instance),
            MemberAccessor::Function(f) => match &f.getter {
                Some(get) if !instance.is_null() => get(instance),
                _ => Value::Null,
            },
        }
    }

    /// Write the member, creating null intermediates of multi-hop paths.
    pub fn write(
        &self,
        types: &TypeRegistry,
        instance: &Value,
        value: Value,
    ) -> Result<(), PathError> {
        match self {
            MemberAccessor::Path(path) => path.write(types, instance, value),
            MemberAccessor::Function(f) => match &f.setter {
                Some(set) => {
                    set(instance, value);
                    Ok(())
                }
                None => Err(PathError::NotWritable {
                    path: f.label.clone(),
                }),
            },
        }
    }

    /// Whether both accessors address the same member.
    pub fn same_member(&self, other: &MemberAccessor) -> bool {
        match (self, other) {
            (MemberAccessor::Path(a), MemberAccessor::Path(b)) => a == b,
            (MemberAccessor::Function(a), MemberAccessor::Function(b)) => a.label == b.label,
            _ => false,
        }
    }
}

impl From<MemberPath> for MemberAccessor {
    fn from(path: MemberPath) -> Self {
        MemberAccessor::Path(path)
    }
}

impl fmt::Display for MemberAccessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberAccessor::Path(path) => write!(f, "{path}"),
            MemberAccessor::Function(func) => f.write_str(&func.label),
        }
    }
}

impl fmt::Debug for MemberAccessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberAccessor::Path(path) => write!(f, "Path({path})"),
            MemberAccessor::Function(func) => write!(f, "Function({}: {:?})", func.label, func.ty),
        }
    }
}

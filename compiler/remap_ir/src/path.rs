//! Multi-hop member access paths.
//!
//! A `MemberPath` is resolved once against the registry into field indices,
//! so reads and writes never look up member names per instance.
//!
//! - Reads walk outer-to-inner; a null (or non-object) hop yields null.
//! - Writes walk outer-to-inner too, default-constructing null intermediates
//!   before the final assignment.

use std::fmt;

use smallvec::SmallVec;

use crate::{RegistryError, TypeFlags, TypeId, TypeRegistry, Value};

/// Error resolving or writing through a member path.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("empty member path on `{owner}`")]
    Empty { owner: String },
    #[error("`{owner}` has no member `{member}`")]
    UnknownMember { owner: String, member: String },
    #[error("cannot access `{member}` on `{owner}`: not a struct type")]
    NotAStruct { owner: String, member: String },
    #[error("member `{path}` is not writable")]
    NotWritable { path: String },
    #[error("member `{path}` is not readable")]
    NotReadable { path: String },
    #[error("cannot write `{path}`: instance is not an object")]
    NotAnObject { path: String },
    #[error("cannot create intermediate for `{path}`: {source}")]
    Intermediate {
        path: String,
        #[source]
        source: RegistryError,
    },
}

/// One resolved hop of a member path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathStep {
    /// Struct type that declares the member.
    pub owner: TypeId,
    /// Field index within the owner.
    pub index: usize,
    pub name: String,
    /// Declared type of the member.
    pub ty: TypeId,
    pub readable: bool,
    pub writable: bool,
}

/// Resolved chain of field accesses, e.g. `address.city`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemberPath {
    steps: SmallVec<[PathStep; 4]>,
}

impl MemberPath {
    /// Resolve member names starting at `root`, matching names exactly.
    pub fn resolve(types: &TypeRegistry, root: TypeId, names: &[&str]) -> Result<Self, PathError> {
        Self::resolve_with(types, root, names, false)
    }

    /// Resolve member names starting at `root`.
    pub fn resolve_with(
        types: &TypeRegistry,
        root: TypeId,
        names: &[&str],
        ignore_case: bool,
    ) -> Result<Self, PathError> {
        if names.is_empty() {
            return Err(PathError::Empty {
                owner: types.display(root),
            });
        }
        let mut steps = SmallVec::new();
        let mut owner = root;
        for &name in names {
            let def = types.struct_def(owner).ok_or_else(|| PathError::NotAStruct {
                owner: types.display(owner),
                member: name.to_owned(),
            })?;
            let index =
                def.field_index(name, ignore_case)
                    .ok_or_else(|| PathError::UnknownMember {
                        owner: types.display(owner),
                        member: name.to_owned(),
                    })?;
            let field = &def.fields[index];
            steps.push(PathStep {
                owner,
                index,
                name: field.name.clone(),
                ty: field.ty,
                readable: field.readable,
                writable: field.writable,
            });
            owner = field.ty;
        }
        Ok(MemberPath { steps })
    }

    /// Single-hop path to a known field.
    pub fn field(owner: TypeId, index: usize, field: &crate::FieldDef) -> Self {
        let mut steps = SmallVec::new();
        steps.push(PathStep {
            owner,
            index,
            name: field.name.clone(),
            ty: field.ty,
            readable: field.readable,
            writable: field.writable,
        });
        MemberPath { steps }
    }

    /// Number of hops.
    pub fn depth(&self) -> usize {
        self.steps.len()
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    /// Type of the instance the path starts from.
    pub fn root(&self) -> TypeId {
        self.steps.first().map_or(TypeId::UNIT, |s| s.owner)
    }

    /// Declared type of the final member.
    pub fn member_type(&self) -> TypeId {
        self.steps.last().map_or(TypeId::UNIT, |s| s.ty)
    }

    /// Every hop can be read.
    pub fn is_readable(&self) -> bool {
        self.steps.iter().all(|s| s.readable)
    }

    /// The final member can be written and every intermediate can be read.
    pub fn is_writable(&self) -> bool {
        match self.steps.split_last() {
            Some((last, init)) => last.writable && init.iter().all(|s| s.readable),
            None => false,
        }
    }

    /// Types of the intermediate hops that a write may have to construct.
    pub fn intermediate_types(&self) -> impl Iterator<Item = TypeId> + '_ {
        let n = self.steps.len().saturating_sub(1);
        self.steps[..n].iter().map(|s| s.ty)
    }

    /// Read the member; null when any hop is null or not an object.
    pub fn read(&self, instance: &Value) -> Value {
        let mut current = instance.clone();
        for step in &self.steps {
            let Value::Object(obj) = &current else {
                return Value::Null;
            };
            if obj.type_id() != step.owner {
                return Value::Null;
            }
            current = obj.field(step.index);
        }
        current
    }

    /// Write the member, creating null intermediates outer-to-inner.
    pub fn write(
        &self,
        types: &TypeRegistry,
        instance: &Value,
        value: Value,
    ) -> Result<(), PathError> {
        let Some((last, init)) = self.steps.split_last() else {
            return Err(PathError::Empty {
                owner: String::from("<unknown>"),
            });
        };
        let Value::Object(root) = instance else {
            return Err(PathError::NotAnObject {
                path: self.to_string(),
            });
        };

        let mut current = root.clone();
        for step in init {
            let next = match current.field(step.index) {
                Value::Object(obj) => obj,
                Value::Null => {
                    let created =
                        types
                            .instantiate(step.ty)
                            .map_err(|source| PathError::Intermediate {
                                path: self.to_string(),
                                source,
                            })?;
                    current.set_field(step.index, created.clone().into());
                    created
                }
                _ => {
                    return Err(PathError::NotAnObject {
                        path: self.to_string(),
                    })
                }
            };
            current = next;
        }

        if current.set_field(last.index, value) {
            Ok(())
        } else {
            Err(PathError::NotAnObject {
                path: self.to_string(),
            })
        }
    }

    /// Whether every intermediate hop can be default-constructed.
    pub fn intermediates_constructible(&self, types: &TypeRegistry) -> bool {
        self.intermediate_types().all(|ty| {
            types.flags(ty).contains(TypeFlags::STRUCT)
                && types.struct_def(ty).is_some_and(|d| d.constructible)
        })
    }
}

impl fmt::Display for MemberPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            f.write_str(&step.name)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]

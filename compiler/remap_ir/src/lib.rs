//! Reflected type model for the remap object mapper.
//!
//! Rust has no runtime reflection, so the graphs the mapper converts are
//! described here explicitly:
//!
//! - `TypeId`/`TypeData`: interned type handles and their shapes
//! - `TypeFlags`: pre-computed category bits used by strategy dispatch
//! - `TypeRegistry`: interner plus struct, interface and collection metadata
//! - `Value`/`ObjRef`: runtime values; heap objects carry identity
//! - `MemberPath`: resolved multi-hop member accessors

mod data;
mod flags;
mod registry;
mod type_id;

pub mod path;
pub mod value;

pub use data::{CollectionOps, FieldDef, StructDef, TypeData};
pub use flags::TypeFlags;
pub use path::{MemberPath, PathError, PathStep};
pub use registry::{RegistryError, SharedTypeRegistry, TypeRegistry};
pub use type_id::TypeId;
pub use value::{graph_eq, MapData, ObjRef, Object, ObjectData, Value};

//! Object-graph mapper.
//!
//! Maps arbitrary object graphs from a source type to a structurally
//! different target type. One conversion routine is compiled per
//! (source type, target type) pair on first use, cached, and then executed
//! against concrete instances.
//!
//! # Crates
//!
//! - `remap_ir`: reflected type model and runtime values
//! - `remap_config`: type mappings, member bindings and conventions
//! - `remap_compile`: mapping compiler, strategies and reference tracking
//!
//! # Debugging
//!
//! Enable tracing with environment variables:
//! - `RUST_LOG=remap_compile=debug` - compilation and strategy selection
//! - `RUST_LOG=remap_compile=trace` - per-step execution and tracker hits
//!
//! # Example
//!
//! ```
//! use remap::{Mapper, ObjRef, StructDef, TypeId, TypeRegistry, Value};
//!
//! let types = TypeRegistry::shared();
//! let person = types
//!     .register_struct(StructDef::new("Person").field("name", TypeId::STR))
//!     .unwrap();
//! let dto = types
//!     .register_struct(StructDef::new("PersonDto").field("name", TypeId::STR))
//!     .unwrap();
//!
//! let mapper = Mapper::new(types);
//! let source: Value = ObjRef::new_struct(person, vec![Value::string("Ada")]).into();
//! let mapped = mapper.map_to(&source, dto).unwrap();
//! assert_eq!(mapped.as_object().unwrap().field(0), Value::string("Ada"));
//! ```

mod builder;
mod mapper;

use std::sync::Once;

pub use builder::MapperBuilder;
pub use mapper::Mapper;

pub use remap_compile::{
    default_strategies, CollectionContext, CollectionRoutine, CompileCx, CompiledRoutine,
    Compiler, MapError, MapSession, MappingStrategy, RoutineBody,
};
pub use remap_config::{
    CollectionBehavior, ConfigError, Configuration, ConventionOptions, MapperOptions,
    MemberAccessor, ReferenceBehavior, TypeMapping, TypeMappingConfig, TypePair,
};
pub use remap_ir::{
    graph_eq, CollectionOps, FieldDef, MemberPath, ObjRef, PathError, RegistryError,
    SharedTypeRegistry, StructDef, TypeFlags, TypeId, TypeRegistry, Value,
};

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Call this once at startup. Safe to call multiple times.
/// Enable with `RUST_LOG=remap_compile=debug` or `RUST_LOG=remap=trace`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        // Only initialize if RUST_LOG is set
        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}

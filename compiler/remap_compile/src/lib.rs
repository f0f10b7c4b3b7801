//! Mapping compiler for the remap object mapper.
//!
//! - [`Compiler`]: turns resolved [`TypeMapping`](remap_config::TypeMapping)s
//!   into one cached [`CompiledRoutine`] per type pair
//! - [`strategy`]: ordered table of mapping strategies (built-ins, arrays,
//!   dictionaries, stacks, sequences, objects)
//! - [`ReferenceTracker`]: per-call identity cache that preserves sharing
//!   and terminates cycles
//! - [`MapSession`]: execution context of one top-level map call

mod compiler;
mod convert;
mod error;
mod routine;
mod session;
mod stack;
mod tracker;

pub mod strategy;

pub use compiler::{CompileCx, Compiler, ItemSite};
pub use convert::{builtin_conversion, Conversion};
pub use error::MapError;
pub use routine::{
    CollectionRoutine, CompiledRoutine, Creation, ItemMapper, MemberStep, ObjectRoutine,
    RoutineBody, TrackedMapper,
};
pub use session::MapSession;
pub use strategy::{default_strategies, CollectionContext, MappingStrategy};
pub use tracker::ReferenceTracker;

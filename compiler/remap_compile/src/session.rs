//! Per-call execution context.

use std::sync::Arc;

use remap_config::{CollectionBehavior, TypePair};
use remap_ir::{ObjRef, TypeId, TypeRegistry, Value};

use crate::stack::ensure_sufficient_stack;
use crate::{CompiledRoutine, Compiler, MapError, ReferenceTracker};

/// State of one top-level map call: the compiler it draws routines from and
/// a private reference tracker.
pub struct MapSession<'a> {
    compiler: &'a Compiler,
    tracker: ReferenceTracker,
    preserve_references: bool,
}

impl<'a> MapSession<'a> {
    pub fn new(compiler: &'a Compiler) -> Self {
        MapSession {
            compiler,
            tracker: ReferenceTracker::new(),
            preserve_references: compiler.config().options().preserve_references,
        }
    }

    pub fn types(&self) -> &'a TypeRegistry {
        self.compiler.types()
    }

    pub fn tracker(&self) -> &ReferenceTracker {
        &self.tracker
    }

    /// Routine for a runtime pair, compiling it on first use.
    pub fn routine(&self, pair: TypePair) -> Result<Arc<CompiledRoutine>, MapError> {
        self.compiler.routine(pair)
    }

    /// Target already created for `source` as `target_type` in this call.
    pub fn lookup(&self, source: &ObjRef, target_type: TypeId) -> Option<Value> {
        if self.preserve_references {
            self.tracker.try_get(source, target_type)
        } else {
            None
        }
    }

    /// Prepare, register and populate `target` from `source`.
    ///
    /// `tracked_as` is the requested target type the instance is registered
    /// under; the routine is chosen by the runtime types of both instances.
    /// Returns the populated instance, which differs from `target` when
    /// preparation reallocated it.
    pub fn fill(
        &mut self,
        source: &ObjRef,
        target: ObjRef,
        tracked_as: TypeId,
        behavior: CollectionBehavior,
    ) -> Result<ObjRef, MapError> {
        ensure_sufficient_stack(|| {
            let pair = TypePair::new(source.type_id(), target.type_id());
            let routine = self.routine(pair)?;
            let target = routine.prepare(self.types(), source, target)?;
            if self.preserve_references {
                self.tracker.add(source, tracked_as, target.clone().into());
            }
            routine.populate(self, source, &target, behavior)?;
            Ok(target)
        })
    }
}

impl std::fmt::Debug for MapSession<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapSession")
            .field("tracker", &self.tracker)
            .field("preserve_references", &self.preserve_references)
            .finish_non_exhaustive()
    }
}

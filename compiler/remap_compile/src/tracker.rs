//! Per-call reference tracking.
//!
//! Maps (source object identity, requested target type) to the target
//! instance already created for it in this call. Consulted before every
//! allocation of a complex member or element, and filled before recursing
//! into a new instance; that ordering is what terminates cycles.

use rustc_hash::FxHashMap;

use remap_ir::{ObjRef, TypeId, Value};

/// Identity-keyed cache scoped to one top-level map call.
#[derive(Default)]
pub struct ReferenceTracker {
    /// `(source address, target type)` -> (source, target).
    ///
    /// The source handle is held so its address cannot be reused by another
    /// allocation while the call is running.
    entries: FxHashMap<(usize, TypeId), (ObjRef, Value)>,
}

impl ReferenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Target already created for `source` as `target_type`.
    pub fn try_get(&self, source: &ObjRef, target_type: TypeId) -> Option<Value> {
        self.entries
            .get(&(source.addr(), target_type))
            .map(|(_, target)| target.clone())
    }

    /// Record `target` as the `target_type` mapping of `source`.
    ///
    /// A later `add` for the same key replaces the entry.
    pub fn add(&mut self, source: &ObjRef, target_type: TypeId, target: Value) {
        self.entries
            .insert((source.addr(), target_type), (source.clone(), target));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for ReferenceTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReferenceTracker")
            .field("entries", &self.entries.len())
            .finish()
    }
}

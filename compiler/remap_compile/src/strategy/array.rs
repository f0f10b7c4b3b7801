use remap_config::{CollectionBehavior, TypePair};
use remap_ir::{ObjRef, ObjectData, TypeFlags, TypeId, TypeRegistry};

use crate::{CollectionRoutine, CompileCx, ItemMapper, MapError, MapSession, RoutineBody};

use super::{is_sequence_source, map_items, resets, CollectionContext, MappingStrategy};

/// Fixed-length arrays, written by index.
///
/// A target shorter than the source is replaced by a new array of the
/// source's length before it is registered. Elements land in source
/// iteration order. Under `Reset` every slot is returned to its default
/// first; under `Merge` slots past the source length keep their values.
#[derive(Copy, Clone, Debug, Default)]
pub struct ArrayStrategy;

impl MappingStrategy for ArrayStrategy {
    fn name(&self) -> &'static str {
        "array"
    }

    fn can_handle(&self, types: &TypeRegistry, pair: TypePair) -> bool {
        is_sequence_source(types, pair) && types.flags(pair.target).contains(TypeFlags::INDEXED)
    }

    fn build(&self, cx: &mut CompileCx<'_>, pair: TypePair) -> Result<RoutineBody, MapError> {
        let context = CollectionContext::sequence(cx, pair)?;
        context.require_clear(cx)?;
        let item = context.element_mapper(cx, "")?;
        Ok(RoutineBody::Collection(Box::new(ArrayRoutine {
            item,
            element: context.element.target,
        })))
    }
}

struct ArrayRoutine {
    item: ItemMapper,
    element: TypeId,
}

impl CollectionRoutine for ArrayRoutine {
    fn prepare(
        &self,
        types: &TypeRegistry,
        source: &ObjRef,
        target: ObjRef,
    ) -> Result<ObjRef, MapError> {
        let needed = source.len();
        if target.len() >= needed {
            return Ok(target);
        }
        tracing::trace!(from = target.len(), to = needed, "reallocating target array");
        types
            .new_array(target.type_id(), needed)
            .map_err(MapError::from)
    }

    fn populate(
        &self,
        session: &mut MapSession<'_>,
        source: &ObjRef,
        target: &ObjRef,
        behavior: CollectionBehavior,
    ) -> Result<(), MapError> {
        let mapped = map_items(session, &self.item, &source.items())?;
        let blank = session.types().default_value(self.element);

        let mut object = target.write();
        if let ObjectData::Sequence(slots) = object.data_mut() {
            if resets(behavior) {
                slots.fill(blank);
            }
            for (slot, value) in slots.iter_mut().zip(mapped) {
                *slot = value;
            }
        }
        Ok(())
    }
}

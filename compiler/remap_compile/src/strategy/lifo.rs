use remap_config::{CollectionBehavior, TypePair};
use remap_ir::{ObjRef, TypeFlags, TypeRegistry};

use crate::{CollectionRoutine, CompileCx, ItemMapper, MapError, MapSession, RoutineBody};

use super::{is_sequence_source, map_items, resets, CollectionContext, MappingStrategy};

/// Stacks.
///
/// Pushing elements in source iteration order would reverse them, so they
/// are pushed into an intermediate stack first and then popped into the
/// target. The target's pop order then equals the source iteration order.
#[derive(Copy, Clone, Debug, Default)]
pub struct LifoStrategy;

impl MappingStrategy for LifoStrategy {
    fn name(&self) -> &'static str {
        "lifo"
    }

    fn can_handle(&self, types: &TypeRegistry, pair: TypePair) -> bool {
        is_sequence_source(types, pair) && types.flags(pair.target).contains(TypeFlags::LIFO)
    }

    fn build(&self, cx: &mut CompileCx<'_>, pair: TypePair) -> Result<RoutineBody, MapError> {
        let context = CollectionContext::sequence(cx, pair)?;
        context.require_clear(cx)?;
        context.require_insert(cx)?;
        let item = context.element_mapper(cx, "")?;
        Ok(RoutineBody::Collection(Box::new(LifoRoutine { item })))
    }
}

struct LifoRoutine {
    item: ItemMapper,
}

impl CollectionRoutine for LifoRoutine {
    fn populate(
        &self,
        session: &mut MapSession<'_>,
        source: &ObjRef,
        target: &ObjRef,
        behavior: CollectionBehavior,
    ) -> Result<(), MapError> {
        let mapped = map_items(session, &self.item, &source.items())?;

        // First wrap: pushed in source order, the last element is on top.
        let mut intermediate = mapped;

        // Second wrap: popping puts the first source element on top.
        let mut object = target.write();
        if resets(behavior) {
            object.clear();
        }
        while let Some(value) = intermediate.pop() {
            object.push(value);
        }
        Ok(())
    }
}

use remap_config::{CollectionBehavior, TypePair};
use remap_ir::{ObjRef, ObjectData, TypeFlags, TypeRegistry};

use crate::{CollectionRoutine, CompileCx, ItemMapper, MapError, MapSession, RoutineBody};

use super::{is_sequence_source, map_items, resets, CollectionContext, MappingStrategy};

/// Generic sequences: lists, queues and custom collections.
///
/// Clears the target (unless merging), then inserts mapped elements in
/// source iteration order. A custom collection without an insertion
/// operation but constructible from a sequence is rebuilt from a temporary
/// list instead.
#[derive(Copy, Clone, Debug, Default)]
pub struct SequenceStrategy;

impl MappingStrategy for SequenceStrategy {
    fn name(&self) -> &'static str {
        "sequence"
    }

    fn can_handle(&self, types: &TypeRegistry, pair: TypePair) -> bool {
        let target = types.flags(pair.target);
        is_sequence_source(types, pair)
            && target.is_sequence()
            && !target.intersects(TypeFlags::INDEXED | TypeFlags::LIFO)
    }

    fn build(&self, cx: &mut CompileCx<'_>, pair: TypePair) -> Result<RoutineBody, MapError> {
        let context = CollectionContext::sequence(cx, pair)?;
        context.require_clear(cx)?;
        let fill = if context.ops.insert {
            Fill::Insert
        } else if context.ops.from_sequence {
            Fill::Rebuild
        } else {
            return Err(context.unsupported(
                cx,
                "has neither an insertion operation nor a constructor from a sequence",
            ));
        };
        tracing::trace!(
            collection = %context.target_name,
            fill = ?fill,
            builtin_elements = context.target_element_builtin,
            "sequence routine"
        );

        let item = context.element_mapper(cx, "")?;
        Ok(RoutineBody::Collection(Box::new(SequenceRoutine { item, fill })))
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Fill {
    /// Use the collection's own insertion operation.
    Insert,
    /// Construct the contents from a temporary list.
    Rebuild,
}

struct SequenceRoutine {
    item: ItemMapper,
    fill: Fill,
}

impl CollectionRoutine for SequenceRoutine {
    fn populate(
        &self,
        session: &mut MapSession<'_>,
        source: &ObjRef,
        target: &ObjRef,
        behavior: CollectionBehavior,
    ) -> Result<(), MapError> {
        let mapped = map_items(session, &self.item, &source.items())?;

        let mut object = target.write();
        match self.fill {
            Fill::Insert => {
                if resets(behavior) {
                    object.clear();
                }
                for value in mapped {
                    object.push(value);
                }
            }
            Fill::Rebuild => {
                let mut contents = if resets(behavior) {
                    Vec::new()
                } else {
                    object.items()
                };
                contents.extend(mapped);
                *object.data_mut() = ObjectData::Sequence(contents);
            }
        }
        Ok(())
    }
}

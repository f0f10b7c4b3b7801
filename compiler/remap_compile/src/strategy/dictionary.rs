use remap_config::{CollectionBehavior, TypePair};
use remap_ir::{ObjRef, ObjectData, TypeFlags, TypeRegistry, Value};

use crate::{CollectionRoutine, CompileCx, ItemMapper, MapError, MapSession, RoutineBody};

use super::{resets, CollectionContext, MappingStrategy};

/// Dictionaries: keys and values are mapped independently through the
/// standard item protocol, so complex values are tracked like members.
#[derive(Copy, Clone, Debug, Default)]
pub struct DictionaryStrategy;

impl MappingStrategy for DictionaryStrategy {
    fn name(&self) -> &'static str {
        "dictionary"
    }

    fn can_handle(&self, types: &TypeRegistry, pair: TypePair) -> bool {
        types.flags(pair.source).contains(TypeFlags::KEYED)
            && types.flags(pair.target).contains(TypeFlags::KEYED)
    }

    fn build(&self, cx: &mut CompileCx<'_>, pair: TypePair) -> Result<RoutineBody, MapError> {
        let context = CollectionContext::dictionary(cx, pair)?;
        context.require_clear(cx)?;
        context.require_insert(cx)?;
        let Some(key) = context.key_mapper(cx)? else {
            return Err(context.unsupported(cx, "has no key type"));
        };
        let value = context.element_mapper(cx, "value")?;
        Ok(RoutineBody::Collection(Box::new(DictionaryRoutine { key, value })))
    }
}

struct DictionaryRoutine {
    key: ItemMapper,
    value: ItemMapper,
}

impl CollectionRoutine for DictionaryRoutine {
    fn populate(
        &self,
        session: &mut MapSession<'_>,
        source: &ObjRef,
        target: &ObjRef,
        behavior: CollectionBehavior,
    ) -> Result<(), MapError> {
        let entries = source.entries();
        let mut mapped = Vec::with_capacity(entries.len());
        for (key, value) in &entries {
            let key = self.key.map(session, key, Value::Null)?;
            let value = self.value.map(session, value, Value::Null)?;
            mapped.push((key, value));
        }

        let mut object = target.write();
        if let ObjectData::Map(map) = object.data_mut() {
            if resets(behavior) {
                map.clear();
            }
            for (key, value) in mapped {
                map.insert(key, value);
            }
        }
        Ok(())
    }
}

//! Mapping strategies.
//!
//! An ordered table of capability predicates; the compiler picks the first
//! strategy whose [`MappingStrategy::can_handle`] matches a pair. Order
//! matters: more specific shapes (arrays, dictionaries, stacks) come before
//! the generic sequence strategy, and user strategies are placed in front of
//! all defaults so they can override them.
//!
//! | strategy | source | target |
//! |---|---|---|
//! | `BuiltInStrategy` | built-in | built-in |
//! | `ArrayStrategy` | sequence | array |
//! | `DictionaryStrategy` | map | map |
//! | `LifoStrategy` | sequence | stack |
//! | `SequenceStrategy` | sequence | list, queue, custom collection |
//! | `ReferenceStrategy` | struct or interface | struct or interface |

mod array;
mod builtin;
mod dictionary;
mod lifo;
mod reference;
mod sequence;

use std::sync::Arc;

use remap_config::{CollectionBehavior, TypePair};
use remap_ir::{CollectionOps, TypeRegistry, Value};

use crate::{CompileCx, ItemMapper, ItemSite, MapError, MapSession, RoutineBody};

pub use array::ArrayStrategy;
pub use builtin::BuiltInStrategy;
pub use dictionary::DictionaryStrategy;
pub use lifo::LifoStrategy;
pub use reference::ReferenceStrategy;
pub use sequence::SequenceStrategy;

/// Pluggable mapping logic for one category of type pairs.
pub trait MappingStrategy: Send + Sync {
    /// Name used in logs and diagnostics.
    fn name(&self) -> &'static str;

    /// Whether this strategy maps `pair`.
    fn can_handle(&self, types: &TypeRegistry, pair: TypePair) -> bool;

    /// Whether handled values have identity and go through the reference
    /// tracker. Strategies returning `false` must build a conversion.
    fn tracks_references(&self) -> bool {
        true
    }

    /// Build the routine body for `pair`.
    ///
    /// Nested pairs are obtained through [`CompileCx::item_mapper`], which
    /// also queues them for compilation.
    fn build(&self, cx: &mut CompileCx<'_>, pair: TypePair) -> Result<RoutineBody, MapError>;
}

/// Built-in strategies in their default order.
pub fn default_strategies() -> Vec<Arc<dyn MappingStrategy>> {
    vec![
        Arc::new(BuiltInStrategy),
        Arc::new(ArrayStrategy),
        Arc::new(DictionaryStrategy),
        Arc::new(LifoStrategy),
        Arc::new(SequenceStrategy),
        Arc::new(ReferenceStrategy),
    ]
}

/// Compile-time facts about a collection pair, discarded after its routine
/// is built.
#[derive(Clone, Debug)]
pub struct CollectionContext {
    pub pair: TypePair,
    /// Display name of the target collection.
    pub target_name: String,
    /// Operations of the target collection.
    pub ops: CollectionOps,
    /// Element types; the value types for dictionaries.
    pub element: TypePair,
    /// Key types, for dictionaries only.
    pub key: Option<TypePair>,
    pub source_element_builtin: bool,
    pub target_element_builtin: bool,
}

impl CollectionContext {
    /// Context for a sequence-shaped pair.
    pub fn sequence(cx: &CompileCx<'_>, pair: TypePair) -> Result<Self, MapError> {
        let types = cx.types();
        let target_name = cx.display(pair.target);
        let (Some(source_element), Some(target_element)) =
            (types.element_type(pair.source), types.element_type(pair.target))
        else {
            return Err(cx.configuration_error(
                &target_name,
                pair,
                "both sides must be sequences with an element type",
            ));
        };
        Ok(Self::new(
            cx,
            pair,
            target_name,
            TypePair::new(source_element, target_element),
            None,
        ))
    }

    /// Context for a dictionary pair.
    pub fn dictionary(cx: &CompileCx<'_>, pair: TypePair) -> Result<Self, MapError> {
        let types = cx.types();
        let target_name = cx.display(pair.target);
        let (Some((source_key, source_value)), Some((target_key, target_value))) =
            (types.entry_types(pair.source), types.entry_types(pair.target))
        else {
            return Err(cx.configuration_error(
                &target_name,
                pair,
                "both sides must be dictionaries",
            ));
        };
        Ok(Self::new(
            cx,
            pair,
            target_name,
            TypePair::new(source_value, target_value),
            Some(TypePair::new(source_key, target_key)),
        ))
    }

    fn new(
        cx: &CompileCx<'_>,
        pair: TypePair,
        target_name: String,
        element: TypePair,
        key: Option<TypePair>,
    ) -> Self {
        let types = cx.types();
        CollectionContext {
            pair,
            target_name,
            ops: types.collection_ops(pair.target).unwrap_or(CollectionOps {
                clear: false,
                insert: false,
                from_sequence: false,
            }),
            element,
            key,
            source_element_builtin: types.flags(element.source).is_builtin(),
            target_element_builtin: types.flags(element.target).is_builtin(),
        }
    }

    /// Fail unless the target can be cleared.
    pub fn require_clear(&self, cx: &CompileCx<'_>) -> Result<(), MapError> {
        if self.ops.clear {
            Ok(())
        } else {
            Err(self.unsupported(cx, "has no clear operation"))
        }
    }

    /// Fail unless the target has an insertion operation.
    pub fn require_insert(&self, cx: &CompileCx<'_>) -> Result<(), MapError> {
        if self.ops.insert {
            Ok(())
        } else {
            Err(self.unsupported(cx, "has no insertion operation"))
        }
    }

    /// Configuration error naming the target collection and asking for an
    /// explicit strategy.
    pub fn unsupported(&self, cx: &CompileCx<'_>, what: &str) -> MapError {
        cx.configuration_error(
            &self.target_name,
            self.pair,
            format!(
                "`{}` {what}; register an explicit strategy for it",
                self.target_name
            ),
        )
    }

    /// Item mapper for elements (dictionary values).
    pub fn element_mapper(&self, cx: &mut CompileCx<'_>, label: &str) -> Result<ItemMapper, MapError> {
        let site = ItemSite::new(format!("{}[{label}]", self.target_name));
        cx.item_mapper(self.element, site)
    }

    /// Item mapper for dictionary keys.
    pub fn key_mapper(&self, cx: &mut CompileCx<'_>) -> Result<Option<ItemMapper>, MapError> {
        match self.key {
            Some(key) => {
                let site = ItemSite::new(format!("{}[key]", self.target_name));
                cx.item_mapper(key, site).map(Some)
            }
            None => Ok(None),
        }
    }
}

/// Map every element of `items` in order, before any target lock is taken.
fn map_items(
    session: &mut MapSession<'_>,
    item: &ItemMapper,
    items: &[Value],
) -> Result<Vec<Value>, MapError> {
    items
        .iter()
        .map(|value| item.map(session, value, Value::Null))
        .collect()
}

/// Whether the existing contents of a target are discarded.
fn resets(behavior: CollectionBehavior) -> bool {
    behavior == CollectionBehavior::Reset
}

/// Sources every sequence-shaped strategy accepts: lists, arrays, queues,
/// stacks and custom collections.
fn is_sequence_source(types: &TypeRegistry, pair: TypePair) -> bool {
    types.flags(pair.source).is_sequence()
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]

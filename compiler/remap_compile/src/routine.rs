//! Compiled mapping routines.
//!
//! A routine is built once per [`TypePair`] from resolved member metadata and
//! then only executed. Execution never looks at configuration or member names
//! again: everything it needs (accessors, conversions, creation policy,
//! behaviors) is captured in the routine.
//!
//! # Item protocol
//!
//! Every complex value (a member, a collection element, a dictionary value)
//! goes through [`TrackedMapper::map`]:
//!
//! 1. Null source: yield null. No allocation, no tracker access.
//! 2. Tracker hit for (source identity, target type): yield the tracked
//!    instance.
//! 3. Obtain an instance: reuse the existing one when allowed, else create it.
//! 4. Prepare it (arrays grow to the source length).
//! 5. Register it in the tracker.
//! 6. Populate it through the runtime pair's routine.

use std::fmt;
use std::sync::Arc;

use remap_config::{CollectionBehavior, Constructor, MemberAccessor, TypePair};
use remap_ir::{ObjRef, TypeId, TypeRegistry, Value};

use crate::{Conversion, MapError, MapSession};

/// Population logic for one collection-shaped pair.
pub trait CollectionRoutine: Send + Sync {
    /// Adjust an instance before it is registered, e.g. resize an array.
    ///
    /// Returns the instance to populate, which may be a new allocation.
    fn prepare(
        &self,
        _types: &TypeRegistry,
        _source: &ObjRef,
        target: ObjRef,
    ) -> Result<ObjRef, MapError> {
        Ok(target)
    }

    /// Fill `target` from the elements of `source`.
    fn populate(
        &self,
        session: &mut MapSession<'_>,
        source: &ObjRef,
        target: &ObjRef,
        behavior: CollectionBehavior,
    ) -> Result<(), MapError>;
}

/// What a compiled routine does.
pub enum RoutineBody {
    /// Value conversion; no identity, no tracking.
    Convert(Conversion),
    /// Member-wise population of a complex object.
    Object(ObjectRoutine),
    /// Collection population delegated to a strategy.
    Collection(Box<dyn CollectionRoutine>),
}

/// Cached, immutable conversion routine for one type pair.
pub struct CompiledRoutine {
    pair: TypePair,
    strategy: &'static str,
    body: RoutineBody,
    /// Behavior of the pair's type mapping when the routine was built.
    collection_behavior: CollectionBehavior,
}

impl CompiledRoutine {
    pub fn new(pair: TypePair, strategy: &'static str, body: RoutineBody) -> Self {
        CompiledRoutine {
            pair,
            strategy,
            body,
            collection_behavior: CollectionBehavior::default(),
        }
    }

    #[must_use]
    pub fn with_collection_behavior(mut self, behavior: CollectionBehavior) -> Self {
        self.collection_behavior = behavior;
        self
    }

    pub fn pair(&self) -> TypePair {
        self.pair
    }

    /// Name of the strategy that built the routine.
    pub fn strategy(&self) -> &'static str {
        self.strategy
    }

    pub fn body(&self) -> &RoutineBody {
        &self.body
    }

    /// Collection behavior for populating a top-level target of this pair.
    pub fn collection_behavior(&self) -> CollectionBehavior {
        self.collection_behavior
    }

    /// The conversion, when this pair is mapped by value.
    pub fn conversion(&self) -> Option<&Conversion> {
        match &self.body {
            RoutineBody::Convert(conversion) => Some(conversion),
            RoutineBody::Object(_) | RoutineBody::Collection(_) => None,
        }
    }

    pub(crate) fn prepare(
        &self,
        types: &TypeRegistry,
        source: &ObjRef,
        target: ObjRef,
    ) -> Result<ObjRef, MapError> {
        match &self.body {
            RoutineBody::Collection(routine) => routine.prepare(types, source, target),
            RoutineBody::Convert(_) | RoutineBody::Object(_) => Ok(target),
        }
    }

    pub(crate) fn populate(
        &self,
        session: &mut MapSession<'_>,
        source: &ObjRef,
        target: &ObjRef,
        behavior: CollectionBehavior,
    ) -> Result<(), MapError> {
        match &self.body {
            RoutineBody::Object(routine) => {
                routine.populate(session, &source.clone().into(), &target.clone().into())
            }
            RoutineBody::Collection(routine) => routine.populate(session, source, target, behavior),
            RoutineBody::Convert(_) => {
                let types = session.types();
                Err(MapError::Configuration {
                    path: types.display(self.pair.target),
                    source_type: types.display(self.pair.source),
                    target_type: types.display(self.pair.target),
                    reason: "the pair is mapped by a converter and cannot populate an existing \
                             instance"
                        .to_owned(),
                })
            }
        }
    }
}

impl fmt::Debug for CompiledRoutine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledRoutine")
            .field("pair", &self.pair)
            .field("strategy", &self.strategy)
            .field("collection_behavior", &self.collection_behavior)
            .finish_non_exhaustive()
    }
}

// Object routines

/// Ordered member steps, shallowest target path first.
pub struct ObjectRoutine {
    steps: Vec<MemberStep>,
}

impl ObjectRoutine {
    pub fn new(steps: Vec<MemberStep>) -> Self {
        ObjectRoutine { steps }
    }

    pub fn steps(&self) -> &[MemberStep] {
        &self.steps
    }

    fn populate(
        &self,
        session: &mut MapSession<'_>,
        source: &Value,
        target: &Value,
    ) -> Result<(), MapError> {
        for step in &self.steps {
            step.run(session, source, target)?;
        }
        Ok(())
    }
}

/// Read a source member, map it, write the target member.
pub struct MemberStep {
    source: MemberAccessor,
    target: MemberAccessor,
    path: String,
    item: ItemMapper,
}

impl MemberStep {
    pub fn new(
        source: MemberAccessor,
        target: MemberAccessor,
        path: String,
        item: ItemMapper,
    ) -> Self {
        MemberStep {
            source,
            target,
            path,
            item,
        }
    }

    /// Owner-qualified target path, e.g. `PersonDto.address.city`.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn item(&self) -> &ItemMapper {
        &self.item
    }

    fn run(
        &self,
        session: &mut MapSession<'_>,
        source: &Value,
        target: &Value,
    ) -> Result<(), MapError> {
        let value = self.source.read(source);
        let mapped = match &self.item {
            ItemMapper::Convert(conversion) => conversion.apply(&value),
            ItemMapper::Tracked(tracked) => {
                let existing = if tracked.reuse && !value.is_null() {
                    self.target.read(target)
                } else {
                    Value::Null
                };
                tracked.map(session, &value, existing)?
            }
        };
        tracing::trace!(member = %self.path, "member step");
        self.target.write(session.types(), target, mapped)?;
        Ok(())
    }
}

// Items

/// Maps one value of a known declared pair.
#[derive(Clone, Debug)]
pub enum ItemMapper {
    /// Built-in or converter-mapped value.
    Convert(Conversion),
    /// Complex value with identity.
    Tracked(TrackedMapper),
}

impl ItemMapper {
    /// Map `value`; `existing` is the current target value, used when reusing.
    pub fn map(
        &self,
        session: &mut MapSession<'_>,
        value: &Value,
        existing: Value,
    ) -> Result<Value, MapError> {
        match self {
            ItemMapper::Convert(conversion) => Ok(conversion.apply(value)),
            ItemMapper::Tracked(tracked) => tracked.map(session, value, existing),
        }
    }
}

/// How a fresh target instance is obtained.
#[derive(Clone)]
pub enum Creation {
    /// User constructor.
    Custom(Constructor),
    /// Default construction of the declared target type.
    Default,
    /// Interface target: instantiate the source's runtime type.
    SourceType,
}

impl Creation {
    fn create(
        &self,
        types: &TypeRegistry,
        source: &ObjRef,
        target_type: TypeId,
        path: &str,
    ) -> Result<ObjRef, MapError> {
        let allocation = |reason: String| MapError::Allocation {
            path: path.to_owned(),
            target_type: types.display(target_type),
            reason,
        };
        match self {
            Creation::Custom(constructor) => match constructor() {
                Value::Object(obj) => Ok(obj),
                other => Err(allocation(format!(
                    "custom constructor returned `{other:?}` instead of an object"
                ))),
            },
            Creation::Default => types
                .instantiate(target_type)
                .map_err(|e| allocation(e.to_string())),
            Creation::SourceType => {
                let runtime = source.type_id();
                if !types.is_assignable(runtime, target_type) {
                    return Err(allocation(format!(
                        "source type `{}` does not implement it",
                        types.display(runtime)
                    )));
                }
                types
                    .instantiate(runtime)
                    .map_err(|e| allocation(e.to_string()))
            }
        }
    }
}

impl fmt::Debug for Creation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Creation::Custom(_) => f.write_str("Custom"),
            Creation::Default => f.write_str("Default"),
            Creation::SourceType => f.write_str("SourceType"),
        }
    }
}

/// Item protocol for complex values of one declared target type.
#[derive(Clone, Debug)]
pub struct TrackedMapper {
    target_type: TypeId,
    creation: Creation,
    reuse: bool,
    collection_behavior: CollectionBehavior,
    path: Arc<str>,
}

impl TrackedMapper {
    pub fn new(
        target_type: TypeId,
        creation: Creation,
        reuse: bool,
        collection_behavior: CollectionBehavior,
        path: &str,
    ) -> Self {
        TrackedMapper {
            target_type,
            creation,
            reuse,
            collection_behavior,
            path: Arc::from(path),
        }
    }

    pub fn target_type(&self) -> TypeId {
        self.target_type
    }

    pub fn creation(&self) -> &Creation {
        &self.creation
    }

    pub fn map(
        &self,
        session: &mut MapSession<'_>,
        value: &Value,
        existing: Value,
    ) -> Result<Value, MapError> {
        let source = match value {
            Value::Null => return Ok(Value::Null),
            Value::Object(obj) => obj,
            other => {
                let types = session.types();
                return Err(MapError::Configuration {
                    path: self.path.to_string(),
                    source_type: other
                        .runtime_type()
                        .map_or_else(|| "null".to_owned(), |ty| types.display(ty)),
                    target_type: types.display(self.target_type),
                    reason: "expected an object".to_owned(),
                });
            }
        };

        if let Some(tracked) = session.lookup(source, self.target_type) {
            tracing::trace!(path = %self.path, "reference tracker hit");
            return Ok(tracked);
        }

        let types = session.types();
        let instance = match existing {
            Value::Object(obj) if types.is_assignable(obj.type_id(), self.target_type) => obj,
            _ => self
                .creation
                .create(types, source, self.target_type, &self.path)?,
        };
        let filled = session.fill(source, instance, self.target_type, self.collection_behavior)?;
        Ok(filled.into())
    }
}

//! Mapping compiler and routine cache.
//!
//! # Compilation
//!
//! Compiling a pair compiles its whole closure: every pair reachable through
//! member steps, collection elements and interface fallbacks is queued on a
//! worklist and compiled in the same batch. The queued set doubles as the
//! in-progress set, so recursive types (`Node { next: Node }`) terminate.
//! Routines refer to nested pairs by key, never by pointer, and look them up
//! at run time by the runtime types of the instances involved.
//!
//! # Thread Safety
//!
//! Compilation is single-writer: a compile guard serializes batches and the
//! cache is double-checked after the guard is taken, so a pair is compiled
//! at most once. A batch publishes atomically and only if every pair in it
//! compiled; failures are not cached and a later call retries. Readers only
//! take the cache's read lock.
//!
//! Strategies run with the compile guard held and must not call back into
//! [`Compiler::routine`] or [`Compiler::entry`].

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rustc_hash::{FxHashMap, FxHashSet};

use remap_config::{
    CollectionBehavior, Configuration, Constructor, Converter, ReferenceBehavior, TypeMapping,
    TypePair,
};
use remap_ir::{TypeFlags, TypeId, TypeRegistry};

use crate::strategy::{default_strategies, MappingStrategy};
use crate::{CompiledRoutine, Conversion, Creation, ItemMapper, MapError, RoutineBody, TrackedMapper};

/// Context a value is mapped in: a struct member, a collection element or a
/// top-level value.
#[derive(Clone, Default)]
pub struct ItemSite {
    /// Owner-qualified path used in diagnostics.
    pub path: String,
    /// Member-level converter; falls back to the pair's converter.
    pub converter: Option<Converter>,
    /// Member-level constructor; falls back to the pair's constructor.
    pub constructor: Option<Constructor>,
    /// `None` uses the item pair's own mapping.
    pub reference_behavior: Option<ReferenceBehavior>,
    /// `None` uses the item pair's own mapping.
    pub collection_behavior: Option<CollectionBehavior>,
}

impl ItemSite {
    pub fn new(path: impl Into<String>) -> Self {
        ItemSite {
            path: path.into(),
            ..ItemSite::default()
        }
    }
}

/// Compiles and caches one routine per [`TypePair`].
pub struct Compiler {
    config: Arc<Configuration>,
    strategies: Vec<Arc<dyn MappingStrategy>>,
    routines: RwLock<FxHashMap<TypePair, Arc<CompiledRoutine>>>,
    /// Top-level item mappers, including the creation policy of the target.
    entries: RwLock<FxHashMap<TypePair, ItemMapper>>,
    compile_guard: Mutex<()>,
}

impl Compiler {
    /// Create a compiler trying `strategies` in order; the first match wins.
    pub fn new(config: Arc<Configuration>, strategies: Vec<Arc<dyn MappingStrategy>>) -> Self {
        Compiler {
            config,
            strategies,
            routines: RwLock::new(FxHashMap::default()),
            entries: RwLock::new(FxHashMap::default()),
            compile_guard: Mutex::new(()),
        }
    }

    pub fn with_default_strategies(config: Arc<Configuration>) -> Self {
        Self::new(config, default_strategies())
    }

    pub fn types(&self) -> &TypeRegistry {
        self.config.types()
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    pub fn strategies(&self) -> &[Arc<dyn MappingStrategy>] {
        &self.strategies
    }

    /// Published routine for `pair`, without compiling.
    pub fn cached(&self, pair: TypePair) -> Option<Arc<CompiledRoutine>> {
        self.routines.read().get(&pair).cloned()
    }

    /// Number of published routines.
    pub fn compiled_count(&self) -> usize {
        self.routines.read().len()
    }

    /// Pairs with a published routine, in no particular order.
    pub fn compiled_pairs(&self) -> Vec<TypePair> {
        self.routines.read().keys().copied().collect()
    }

    /// Routine for `pair`, compiled with its closure on first use.
    pub fn routine(&self, pair: TypePair) -> Result<Arc<CompiledRoutine>, MapError> {
        if let Some(routine) = self.cached(pair) {
            return Ok(routine);
        }
        self.compile(pair, |cx| {
            cx.require(pair);
            Ok(())
        })?;
        self.cached(pair).ok_or_else(|| self.unpublished(pair))
    }

    /// Item mapper for top-level values of `pair`.
    ///
    /// Unlike [`Self::routine`] this also validates that a target instance
    /// can be created.
    pub fn entry(&self, pair: TypePair) -> Result<ItemMapper, MapError> {
        if let Some(entry) = self.entries.read().get(&pair) {
            return Ok(entry.clone());
        }
        let entry = self.compile(pair, |cx| {
            // Double-check under the compile guard
            if let Some(entry) = cx.compiler.entries.read().get(&pair) {
                return Ok(entry.clone());
            }
            let site = ItemSite::new(cx.display(pair.target));
            cx.item_mapper(pair, site)
        })?;
        Ok(self.entries.write().entry(pair).or_insert(entry).clone())
    }

    #[tracing::instrument(level = "debug", skip_all, fields(pair = %root.display(self.types())))]
    fn compile<T>(
        &self,
        root: TypePair,
        seed: impl FnOnce(&mut CompileCx<'_>) -> Result<T, MapError>,
    ) -> Result<T, MapError> {
        let _guard = self.compile_guard.lock();
        let mut cx = CompileCx::new(self);
        let result = seed(&mut cx).and_then(|value| cx.drain().map(|()| value));
        match result {
            Ok(value) => {
                let published = cx.publish();
                tracing::debug!(published, "compilation finished");
                Ok(value)
            }
            Err(e) => {
                tracing::debug!(error = %e, "compilation failed");
                Err(e)
            }
        }
    }

    fn unpublished(&self, pair: TypePair) -> MapError {
        let types = self.types();
        MapError::Configuration {
            path: types.display(pair.target),
            source_type: types.display(pair.source),
            target_type: types.display(pair.target),
            reason: "compilation produced no routine".to_owned(),
        }
    }
}

impl std::fmt::Debug for Compiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<_> = self.strategies.iter().map(|s| s.name()).collect();
        f.debug_struct("Compiler")
            .field("strategies", &names)
            .field("routines", &self.compiled_count())
            .finish_non_exhaustive()
    }
}

/// State of one compilation batch.
pub struct CompileCx<'a> {
    compiler: &'a Compiler,
    /// Pairs queued or compiled in this batch.
    queued: FxHashSet<TypePair>,
    pending: VecDeque<TypePair>,
    compiled: Vec<(TypePair, Arc<CompiledRoutine>)>,
}

impl<'a> CompileCx<'a> {
    fn new(compiler: &'a Compiler) -> Self {
        CompileCx {
            compiler,
            queued: FxHashSet::default(),
            pending: VecDeque::new(),
            compiled: Vec::new(),
        }
    }

    pub fn types(&self) -> &'a TypeRegistry {
        self.compiler.types()
    }

    pub fn config(&self) -> &'a Configuration {
        self.compiler.config()
    }

    pub fn type_mapping(&self, pair: TypePair) -> Arc<TypeMapping> {
        self.compiler.config.type_mapping(pair)
    }

    pub fn display(&self, ty: TypeId) -> String {
        self.types().display(ty)
    }

    /// Queue `pair` for compilation in this batch unless already known.
    pub fn require(&mut self, pair: TypePair) {
        if self.compiler.cached(pair).is_some() || !self.queued.insert(pair) {
            return;
        }
        self.pending.push_back(pair);
    }

    /// First strategy, in configured order, able to handle `pair`.
    pub fn select_strategy(&self, pair: TypePair) -> Option<&'a Arc<dyn MappingStrategy>> {
        let types = self.types();
        self.compiler
            .strategies
            .iter()
            .find(|strategy| strategy.can_handle(types, pair))
    }

    /// Configuration error for `pair` at `path`.
    pub fn configuration_error(
        &self,
        path: &str,
        pair: TypePair,
        reason: impl Into<String>,
    ) -> MapError {
        MapError::Configuration {
            path: path.to_owned(),
            source_type: self.display(pair.source),
            target_type: self.display(pair.target),
            reason: reason.into(),
        }
    }

    /// Allocation error for `ty` at `path`.
    pub fn allocation_error(&self, path: &str, ty: TypeId, reason: impl Into<String>) -> MapError {
        MapError::Allocation {
            path: path.to_owned(),
            target_type: self.display(ty),
            reason: reason.into(),
        }
    }

    /// Build the mapper for values of `pair` at `site`.
    ///
    /// Value pairs yield a conversion. Complex pairs yield the tracked item
    /// protocol with a validated creation policy, and queue the pair.
    pub fn item_mapper(&mut self, pair: TypePair, site: ItemSite) -> Result<ItemMapper, MapError> {
        let mapping = self.type_mapping(pair);

        if let Some(converter) = site.converter.or_else(|| mapping.converter.clone()) {
            tracing::debug!(path = %site.path, "custom converter");
            return Ok(ItemMapper::Convert(Conversion::Custom(converter)));
        }

        let strategy = self.select_strategy(pair).ok_or_else(|| {
            self.configuration_error(
                &site.path,
                pair,
                "no mapping strategy can handle this pair and no converter is configured",
            )
        })?;
        tracing::debug!(path = %site.path, strategy = strategy.name(), "strategy selected");

        if !strategy.tracks_references() {
            // Value strategies only know the pair; report the member instead.
            let body = strategy.build(self, pair).map_err(|e| match e {
                MapError::Configuration {
                    source_type,
                    target_type,
                    reason,
                    ..
                } => MapError::Configuration {
                    path: site.path.clone(),
                    source_type,
                    target_type,
                    reason,
                },
                other => other,
            })?;
            return match body {
                RoutineBody::Convert(conversion) => Ok(ItemMapper::Convert(conversion)),
                RoutineBody::Object(_) | RoutineBody::Collection(_) => Err(self.configuration_error(
                    &site.path,
                    pair,
                    format!(
                        "strategy `{}` does not track references but built no conversion",
                        strategy.name()
                    ),
                )),
            };
        }

        let constructor = site.constructor.or_else(|| mapping.constructor.clone());
        let creation = self.creation(pair, constructor, &site.path)?;
        self.require(pair);

        let reuse = site.reference_behavior.unwrap_or(mapping.reference_behavior)
            == ReferenceBehavior::ReuseTargetIfNotNull;
        let collection_behavior = site
            .collection_behavior
            .unwrap_or(mapping.collection_behavior);
        Ok(ItemMapper::Tracked(TrackedMapper::new(
            pair.target,
            creation,
            reuse,
            collection_behavior,
            &site.path,
        )))
    }

    /// Check that struct `ty` can be default-constructed.
    pub fn check_constructible(&self, ty: TypeId, path: &str) -> Result<(), MapError> {
        if !self.types().flags(ty).contains(TypeFlags::STRUCT) {
            return Ok(());
        }
        match self.types().struct_def(ty) {
            None => Err(self.allocation_error(path, ty, "the struct has no member definition")),
            Some(def) if !def.constructible => Err(self.allocation_error(
                path,
                ty,
                "no default constructor and no custom constructor is configured",
            )),
            Some(_) => Ok(()),
        }
    }

    /// Creation policy for targets of `pair`.
    fn creation(
        &mut self,
        pair: TypePair,
        constructor: Option<Constructor>,
        path: &str,
    ) -> Result<Creation, MapError> {
        if let Some(constructor) = constructor {
            return Ok(Creation::Custom(constructor));
        }

        let types = self.types();
        if !types.flags(pair.target).contains(TypeFlags::ABSTRACT) {
            self.check_constructible(pair.target, path)?;
            return Ok(Creation::Default);
        }

        // Interface target: the source's runtime type is instantiated. With a
        // concrete declared source that type is known now.
        if types.flags(pair.source).contains(TypeFlags::STRUCT) {
            if !types.is_assignable(pair.source, pair.target) {
                return Err(self.allocation_error(
                    path,
                    pair.target,
                    format!(
                        "`{}` does not implement it and no custom constructor is configured",
                        self.display(pair.source)
                    ),
                ));
            }
            self.check_constructible(pair.source, path)?;
            self.require(TypePair::new(pair.source, pair.source));
        }
        Ok(Creation::SourceType)
    }

    /// Compile queued pairs until the worklist is empty.
    fn drain(&mut self) -> Result<(), MapError> {
        while let Some(pair) = self.pending.pop_front() {
            let routine = self.compile_pair(pair)?;
            self.compiled.push((pair, Arc::new(routine)));
        }
        Ok(())
    }

    fn compile_pair(&mut self, pair: TypePair) -> Result<CompiledRoutine, MapError> {
        let mapping = self.type_mapping(pair);
        if let Some(converter) = &mapping.converter {
            return Ok(CompiledRoutine::new(
                pair,
                "converter",
                RoutineBody::Convert(Conversion::Custom(Arc::clone(converter))),
            ));
        }

        let strategy = self.select_strategy(pair).ok_or_else(|| {
            self.configuration_error(
                &self.display(pair.target),
                pair,
                "no mapping strategy can handle this pair and no converter is configured",
            )
        })?;
        let body = strategy.build(self, pair)?;
        tracing::debug!(
            pair = %pair.display(self.types()),
            strategy = strategy.name(),
            "routine compiled"
        );
        Ok(CompiledRoutine::new(pair, strategy.name(), body)
            .with_collection_behavior(mapping.collection_behavior))
    }

    /// Publish the batch; returns how many routines were added.
    fn publish(self) -> usize {
        let mut routines = self.compiler.routines.write();
        let mut published = 0;
        for (pair, routine) in self.compiled {
            if let std::collections::hash_map::Entry::Vacant(slot) = routines.entry(pair) {
                slot.insert(routine);
                published += 1;
            }
        }
        published
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]

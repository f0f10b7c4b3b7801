//! Explicit type mappings plus convention discovery.
//!
//! `Configuration` records what the user configured per [`TypePair`] and
//! resolves it lazily into immutable [`TypeMapping`]s:
//!
//! 1. explicit member bindings, in configured order;
//! 2. convention bindings for every remaining writable target field whose
//!    name matches a readable source field.
//!
//! Resolved mappings are cached behind a `RwLock` with a read fast path and
//! a double-checked write path. Edits are serialized by a separate mutex so
//! that concurrent `configure` calls for a pair accumulate.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;

use remap_ir::{MemberPath, SharedTypeRegistry, TypeId, TypeRegistry, Value};

use crate::{
    CollectionBehavior, ConfigError, Constructor, Converter, MapperOptions, MemberAccessor,
    MemberMapping, ReferenceBehavior, Resolution, TypeMapping, TypePair,
};

/// What the user recorded for one pair, before convention discovery.
#[derive(Clone, Default)]
struct ExplicitMapping {
    members: Vec<MemberMapping>,
    ignored: Vec<MemberPath>,
    reference_behavior: Option<ReferenceBehavior>,
    collection_behavior: Option<CollectionBehavior>,
    converter: Option<Converter>,
    constructor: Option<Constructor>,
    ignore_convention_members: bool,
}

/// Mapping configuration shared by every compile of a mapper.
pub struct Configuration {
    types: SharedTypeRegistry,
    options: MapperOptions,
    explicit: RwLock<FxHashMap<TypePair, ExplicitMapping>>,
    resolved: RwLock<FxHashMap<TypePair, Arc<TypeMapping>>>,
    /// Held across a whole `configure` edit: read, user closure, write.
    edit: Mutex<()>,
}

impl Configuration {
    pub fn new(types: SharedTypeRegistry, options: MapperOptions) -> Self {
        Configuration {
            types,
            options,
            explicit: RwLock::new(FxHashMap::default()),
            resolved: RwLock::new(FxHashMap::default()),
            edit: Mutex::new(()),
        }
    }

    pub fn types(&self) -> &SharedTypeRegistry {
        &self.types
    }

    pub fn options(&self) -> &MapperOptions {
        &self.options
    }

    /// Record explicit configuration for `source -> target`.
    ///
    /// Calls for the same pair accumulate, also when they race. The resolved
    /// mapping for the pair is dropped so the next request sees the change;
    /// routines that were already compiled from it are not affected.
    ///
    /// `f` must not call `configure` on the same configuration.
    pub fn configure<F>(&self, source: TypeId, target: TypeId, f: F) -> Result<(), ConfigError>
    where
        F: FnOnce(&mut TypeMappingConfig<'_>) -> Result<(), ConfigError>,
    {
        let pair = TypePair::new(source, target);
        let _edit = self.edit.lock();
        let mut mapping = self.explicit.read().get(&pair).cloned().unwrap_or_default();

        // User code runs under the edit mutex only; lookups stay available.
        f(&mut TypeMappingConfig {
            types: &self.types,
            pair,
            ignore_case: self.options.conventions.ignore_case,
            mapping: &mut mapping,
        })?;

        let mut explicit = self.explicit.write();
        explicit.insert(pair, mapping);
        self.resolved.write().remove(&pair);
        drop(explicit);
        tracing::debug!(pair = %pair.display(&self.types), "type mapping configured");
        Ok(())
    }

    /// Resolved mapping for `pair`, created on first request.
    pub fn type_mapping(&self, pair: TypePair) -> Arc<TypeMapping> {
        // Fast path: already resolved
        if let Some(mapping) = self.resolved.read().get(&pair) {
            return Arc::clone(mapping);
        }

        // Keep the explicit entry locked until publication, so a concurrent
        // `configure` cannot be overwritten by a mapping built before it.
        let explicit = self.explicit.read();
        let recorded = explicit.get(&pair).cloned().unwrap_or_default();
        let built = Arc::new(self.resolve(pair, recorded));

        let mut guard = self.resolved.write();
        // Double-check: another thread may have published first
        Arc::clone(guard.entry(pair).or_insert(built))
    }

    #[tracing::instrument(level = "debug", skip_all, fields(pair = %pair.display(&self.types)))]
    fn resolve(&self, pair: TypePair, explicit: ExplicitMapping) -> TypeMapping {
        let mut members = explicit.members;
        if self.options.conventions.enabled && !explicit.ignore_convention_members {
            self.discover_conventions(pair, &explicit.ignored, &mut members);
        }

        tracing::debug!(members = members.len(), "type mapping resolved");
        TypeMapping {
            pair,
            members,
            reference_behavior: explicit
                .reference_behavior
                .unwrap_or(self.options.reference_behavior),
            collection_behavior: explicit
                .collection_behavior
                .unwrap_or(self.options.collection_behavior),
            converter: explicit.converter,
            constructor: explicit.constructor,
        }
    }

    /// Append name-matched bindings for target fields not bound explicitly.
    fn discover_conventions(
        &self,
        pair: TypePair,
        ignored: &[MemberPath],
        members: &mut Vec<MemberMapping>,
    ) {
        let (Some(source_def), Some(target_def)) = (
            self.types.struct_def(pair.source),
            self.types.struct_def(pair.target),
        ) else {
            return;
        };
        let ignore_case = self.options.conventions.ignore_case;

        for (target_index, target_field) in target_def.fields.iter().enumerate() {
            if !target_field.writable {
                continue;
            }
            let target_path = MemberPath::field(pair.target, target_index, target_field);
            let target = MemberAccessor::Path(target_path.clone());
            if members.iter().any(|m| m.target.same_member(&target)) {
                continue;
            }
            let Some(source_index) = source_def.field_index(&target_field.name, ignore_case)
            else {
                continue;
            };
            let source_field = &source_def.fields[source_index];
            if !source_field.readable {
                continue;
            }

            let mut member = MemberMapping::new(
                MemberAccessor::Path(MemberPath::field(pair.source, source_index, source_field)),
                target,
                Resolution::Convention,
            );
            member.ignore = ignored.contains(&target_path);
            tracing::trace!(member = %target_field.name, ignore = member.ignore, "convention match");
            members.push(member);
        }
    }
}

impl std::fmt::Debug for Configuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Configuration")
            .field("options", &self.options)
            .field("explicit", &self.explicit.read().len())
            .field("resolved", &self.resolved.read().len())
            .finish_non_exhaustive()
    }
}

/// Editor for the explicit configuration of one type pair.
pub struct TypeMappingConfig<'a> {
    types: &'a TypeRegistry,
    pair: TypePair,
    ignore_case: bool,
    mapping: &'a mut ExplicitMapping,
}

impl TypeMappingConfig<'_> {
    pub fn pair(&self) -> TypePair {
        self.pair
    }

    /// Bind dotted source path `source` to dotted target path `target`.
    ///
    /// Replaces an earlier explicit binding of the same target member.
    pub fn map_member(
        &mut self,
        source: &str,
        target: &str,
    ) -> Result<&mut MemberMapping, ConfigError> {
        let source = self.resolve_path(self.pair.source, source)?;
        let target = self.resolve_path(self.pair.target, target)?;
        Ok(self.map_accessors(source.into(), target.into()))
    }

    /// Bind arbitrary accessors, e.g. custom getter and setter functions.
    pub fn map_accessors(
        &mut self,
        source: MemberAccessor,
        target: MemberAccessor,
    ) -> &mut MemberMapping {
        let members = &mut self.mapping.members;
        members.retain(|m| !m.target.same_member(&target));
        let index = members.len();
        members.push(MemberMapping::new(source, target, Resolution::Explicit));
        &mut members[index]
    }

    /// Leave the dotted target path `target` untouched.
    pub fn ignore_member(&mut self, target: &str) -> Result<&mut Self, ConfigError> {
        let path = self.resolve_path(self.pair.target, target)?;
        let accessor = MemberAccessor::Path(path.clone());
        for member in &mut self.mapping.members {
            if member.target.same_member(&accessor) {
                member.ignore = true;
            }
        }
        self.mapping.ignored.push(path);
        Ok(self)
    }

    /// Map only the explicitly configured members of this pair.
    pub fn ignore_convention_members(&mut self) -> &mut Self {
        self.mapping.ignore_convention_members = true;
        self
    }

    pub fn reference_behavior(&mut self, behavior: ReferenceBehavior) -> &mut Self {
        self.mapping.reference_behavior = Some(behavior);
        self
    }

    pub fn collection_behavior(&mut self, behavior: CollectionBehavior) -> &mut Self {
        self.mapping.collection_behavior = Some(behavior);
        self
    }

    /// Convert whole values of this pair with `f`.
    pub fn converter(&mut self, f: impl Fn(&Value) -> Value + Send + Sync + 'static) -> &mut Self {
        self.mapping.converter = Some(Arc::new(f));
        self
    }

    /// Create target instances of this pair with `f`.
    pub fn constructor(&mut self, f: impl Fn() -> Value + Send + Sync + 'static) -> &mut Self {
        self.mapping.constructor = Some(Arc::new(f));
        self
    }

    fn resolve_path(&self, root: TypeId, dotted: &str) -> Result<MemberPath, ConfigError> {
        let names: Vec<&str> = dotted.split('.').filter(|s| !s.is_empty()).collect();
        MemberPath::resolve_with(self.types, root, &names, self.ignore_case).map_err(|source| {
            ConfigError::Path {
                pair: self.pair.display(self.types),
                source,
            }
        })
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]

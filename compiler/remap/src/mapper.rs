//! Dispatcher: the public entry point.

use remap_compile::{Compiler, MapError, MapSession};
use remap_config::{ConfigError, Configuration, TypeMappingConfig, TypePair};
use remap_ir::{SharedTypeRegistry, TypeId, TypeRegistry, Value};

use crate::MapperBuilder;

/// Maps object graphs between types, compiling one routine per type pair.
///
/// A `Mapper` is `Send + Sync`; share it behind an `Arc` and map from any
/// number of threads. Each call gets its own reference tracker, so sharing
/// and cycles are preserved within a call and never across calls.
pub struct Mapper {
    compiler: Compiler,
}

impl Mapper {
    /// Mapper with default options and strategies.
    pub fn new(types: SharedTypeRegistry) -> Self {
        Self::builder(types).build()
    }

    pub fn builder(types: SharedTypeRegistry) -> MapperBuilder {
        MapperBuilder::new(types)
    }

    pub(crate) fn from_compiler(compiler: Compiler) -> Self {
        Mapper { compiler }
    }

    pub fn types(&self) -> &TypeRegistry {
        self.compiler.types()
    }

    pub fn config(&self) -> &Configuration {
        self.compiler.config()
    }

    pub fn compiler(&self) -> &Compiler {
        &self.compiler
    }

    /// Configure the mapping from `source` to `target`.
    ///
    /// Takes effect for pairs that have not been compiled yet; configure
    /// before the first map call that reaches the pair.
    pub fn configure<F>(&self, source: TypeId, target: TypeId, f: F) -> Result<(), ConfigError>
    where
        F: FnOnce(&mut TypeMappingConfig<'_>) -> Result<(), ConfigError>,
    {
        self.config().configure(source, target, f)
    }

    /// Number of compiled routines, for diagnostics.
    pub fn compiled_routines(&self) -> usize {
        self.compiler.compiled_count()
    }

    /// Deep copy of `source` onto a fresh instance of its own runtime type.
    pub fn map(&self, source: &Value) -> Result<Value, MapError> {
        match source.runtime_type() {
            Some(ty) => self.map_to(source, ty),
            None => Ok(Value::Null),
        }
    }

    /// Map `source` onto a fresh instance of `target_type`.
    #[tracing::instrument(level = "debug", skip_all, fields(target = %self.types().display(target_type)))]
    pub fn map_to(&self, source: &Value, target_type: TypeId) -> Result<Value, MapError> {
        let Some(source_type) = source.runtime_type() else {
            return Ok(Value::Null);
        };
        let entry = self
            .compiler
            .entry(TypePair::new(source_type, target_type))
            .inspect_err(|e| tracing::debug!(error = %e, "mapping rejected"))?;
        let mut session = MapSession::new(&self.compiler);
        entry
            .map(&mut session, source, Value::Null)
            .inspect_err(|e| tracing::debug!(error = %e, "mapping failed"))
    }

    /// Populate `target` from `source`.
    ///
    /// Returns the populated instance. That is `target` itself except for
    /// arrays shorter than the source, which are replaced by a new array.
    /// Built-in targets have no identity and are converted instead.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn map_into(&self, source: &Value, target: &Value) -> Result<Value, MapError> {
        let Some(source_type) = source.runtime_type() else {
            return Ok(Value::Null);
        };
        let (Value::Object(source), Value::Object(existing)) = (source, target) else {
            return match target.runtime_type() {
                Some(ty) => self.map_to(source, ty),
                None => Err(MapError::Configuration {
                    path: self.types().display(source_type),
                    source_type: self.types().display(source_type),
                    target_type: "null".to_owned(),
                    reason: "cannot populate a null target; use `map_to`".to_owned(),
                }),
            };
        };

        let pair = TypePair::new(source_type, existing.type_id());
        let routine = self
            .compiler
            .routine(pair)
            .inspect_err(|e| tracing::debug!(error = %e, "mapping rejected"))?;
        if let Some(conversion) = routine.conversion() {
            return Ok(conversion.apply(&Value::Object(source.clone())));
        }

        let mut session = MapSession::new(&self.compiler);
        let filled = session
            .fill(
                source,
                existing.clone(),
                pair.target,
                routine.collection_behavior(),
            )
            .inspect_err(|e| tracing::debug!(error = %e, "mapping failed"))?;
        Ok(filled.into())
    }
}

impl std::fmt::Debug for Mapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mapper")
            .field("compiler", &self.compiler)
            .finish()
    }
}


use std::sync::Arc;

use remap_compile::{default_strategies, Compiler, MappingStrategy};
use remap_config::{
    CollectionBehavior, Configuration, ConventionOptions, MapperOptions, ReferenceBehavior,
};
use remap_ir::SharedTypeRegistry;

use crate::Mapper;

/// Builder for a [`Mapper`] with custom options and strategies.
#[derive(Clone)]
pub struct MapperBuilder {
    types: SharedTypeRegistry,
    options: MapperOptions,
    strategies: Vec<Arc<dyn MappingStrategy>>,
}

impl MapperBuilder {
    pub fn new(types: SharedTypeRegistry) -> Self {
        MapperBuilder {
            types,
            options: MapperOptions::default(),
            strategies: Vec::new(),
        }
    }

    /// Replace all options at once.
    #[must_use]
    pub fn options(mut self, options: MapperOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn reference_behavior(mut self, behavior: ReferenceBehavior) -> Self {
        self.options.reference_behavior = behavior;
        self
    }

    #[must_use]
    pub fn collection_behavior(mut self, behavior: CollectionBehavior) -> Self {
        self.options.collection_behavior = behavior;
        self
    }

    #[must_use]
    pub fn conventions(mut self, conventions: ConventionOptions) -> Self {
        self.options.conventions = conventions;
        self
    }

    /// Match convention member names ASCII case-insensitively.
    #[must_use]
    pub fn ignore_case(mut self, ignore_case: bool) -> Self {
        self.options.conventions.ignore_case = ignore_case;
        self
    }

    #[must_use]
    pub fn preserve_references(mut self, preserve: bool) -> Self {
        self.options.preserve_references = preserve;
        self
    }

    /// Add a strategy. User strategies are tried in the order they were
    /// added, before all built-in strategies.
    #[must_use]
    pub fn strategy(mut self, strategy: impl MappingStrategy + 'static) -> Self {
        self.strategies.push(Arc::new(strategy));
        self
    }

    pub fn build(self) -> Mapper {
        let MapperBuilder {
            types,
            options,
            mut strategies,
        } = self;
        strategies.extend(default_strategies());
        tracing::debug!(
            strategies = strategies.len(),
            preserve_references = options.preserve_references,
            "mapper built"
        );
        let config = Arc::new(Configuration::new(types, options));
        Mapper::from_compiler(Compiler::new(config, strategies))
    }
}

impl std::fmt::Debug for MapperBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<_> = self.strategies.iter().map(|s| s.name()).collect();
        f.debug_struct("MapperBuilder")
            .field("options", &self.options)
            .field("strategies", &names)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]

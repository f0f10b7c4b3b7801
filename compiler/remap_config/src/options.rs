use crate::{CollectionBehavior, ReferenceBehavior};

/// Convention-based member discovery.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ConventionOptions {
    /// Bind same-named members automatically.
    pub enabled: bool,
    /// Match member names ASCII case-insensitively.
    pub ignore_case: bool,
}

impl Default for ConventionOptions {
    fn default() -> Self {
        ConventionOptions {
            enabled: true,
            ignore_case: false,
        }
    }
}

/// Mapper-wide defaults.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MapperOptions {
    pub reference_behavior: ReferenceBehavior,
    pub collection_behavior: CollectionBehavior,
    pub conventions: ConventionOptions,
    /// Track source identities so shared references stay shared and cycles
    /// terminate. When off every occurrence is copied; cyclic graphs then
    /// recurse without bound.
    pub preserve_references: bool,
}

impl Default for MapperOptions {
    fn default() -> Self {
        MapperOptions {
            reference_behavior: ReferenceBehavior::default(),
            collection_behavior: CollectionBehavior::default(),
            conventions: ConventionOptions::default(),
            preserve_references: true,
        }
    }
}

//! Behavior flags resolved per type mapping and overridable per member.

/// What to do with an existing non-null target instance.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum ReferenceBehavior {
    /// Always allocate a fresh target instance.
    #[default]
    CreateNewInstance,
    /// Populate the existing target instance when it is non-null.
    ReuseTargetIfNotNull,
}

/// What to do with the existing contents of a target collection.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum CollectionBehavior {
    /// Clear the target before inserting.
    #[default]
    Reset,
    /// Keep existing contents and append.
    Merge,
}

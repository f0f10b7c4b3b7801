//! Resolved mapping metadata consumed by the compiler.

use std::fmt;
use std::sync::Arc;

use remap_ir::Value;

use crate::{CollectionBehavior, MemberAccessor, ReferenceBehavior, TypePair};

/// User conversion from a source value to a target value.
pub type Converter = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

/// User factory for a target instance.
pub type Constructor = Arc<dyn Fn() -> Value + Send + Sync>;

/// How a member binding came to exist.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// Configured by the user.
    Explicit,
    /// Discovered by name matching.
    Convention,
}

/// One source member bound to one target member.
#[derive(Clone)]
pub struct MemberMapping {
    pub source: MemberAccessor,
    pub target: MemberAccessor,
    pub ignore: bool,
    pub resolution: Resolution,
    pub converter: Option<Converter>,
    pub constructor: Option<Constructor>,
    /// `None` inherits from the owning type mapping.
    pub reference_behavior: Option<ReferenceBehavior>,
    /// `None` inherits from the owning type mapping.
    pub collection_behavior: Option<CollectionBehavior>,
}

impl MemberMapping {
    pub fn new(source: MemberAccessor, target: MemberAccessor, resolution: Resolution) -> Self {
        MemberMapping {
            source,
            target,
            ignore: false,
            resolution,
            converter: None,
            constructor: None,
            reference_behavior: None,
            collection_behavior: None,
        }
    }

    /// Type pair of the bound members.
    pub fn pair(&self) -> TypePair {
        TypePair::new(self.source.member_type(), self.target.member_type())
    }

    /// Target access-path depth; steps execute in ascending order of it.
    pub fn depth(&self) -> usize {
        self.target.depth()
    }

    /// Convert the member value with `f` instead of the compiled conversion.
    pub fn converter(&mut self, f: impl Fn(&Value) -> Value + Send + Sync + 'static) -> &mut Self {
        self.converter = Some(Arc::new(f));
        self
    }

    /// Create target member instances with `f`.
    pub fn constructor(&mut self, f: impl Fn() -> Value + Send + Sync + 'static) -> &mut Self {
        self.constructor = Some(Arc::new(f));
        self
    }

    pub fn reference_behavior(&mut self, behavior: ReferenceBehavior) -> &mut Self {
        self.reference_behavior = Some(behavior);
        self
    }

    pub fn collection_behavior(&mut self, behavior: CollectionBehavior) -> &mut Self {
        self.collection_behavior = Some(behavior);
        self
    }

    /// Skip this member.
    pub fn ignore(&mut self) -> &mut Self {
        self.ignore = true;
        self
    }
}

impl fmt::Debug for MemberMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberMapping")
            .field("source", &self.source)
            .field("target", &self.target)
            .field("ignore", &self.ignore)
            .field("resolution", &self.resolution)
            .field("converter", &self.converter.is_some())
            .field("constructor", &self.constructor.is_some())
            .field("reference_behavior", &self.reference_behavior)
            .field("collection_behavior", &self.collection_behavior)
            .finish()
    }
}

/// Resolved configuration for one type pair.
#[derive(Clone)]
pub struct TypeMapping {
    pub pair: TypePair,
    /// Bindings in configured order: explicit first, then convention.
    pub members: Vec<MemberMapping>,
    pub reference_behavior: ReferenceBehavior,
    pub collection_behavior: CollectionBehavior,
    /// Replaces member-wise mapping of the whole pair.
    pub converter: Option<Converter>,
    /// Creates target instances of this pair.
    pub constructor: Option<Constructor>,
}

impl TypeMapping {
    /// Non-ignored bindings in configured order.
    pub fn active_members(&self) -> impl Iterator<Item = &MemberMapping> {
        self.members.iter().filter(|m| !m.ignore)
    }

    /// Reference behavior for `member`, falling back to this mapping's.
    pub fn reference_behavior_for(&self, member: &MemberMapping) -> ReferenceBehavior {
        member.reference_behavior.unwrap_or(self.reference_behavior)
    }

    /// Collection behavior for `member`, falling back to this mapping's.
    pub fn collection_behavior_for(&self, member: &MemberMapping) -> CollectionBehavior {
        member.collection_behavior.unwrap_or(self.collection_behavior)
    }
}

impl fmt::Debug for TypeMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeMapping")
            .field("pair", &self.pair)
            .field("members", &self.members)
            .field("reference_behavior", &self.reference_behavior)
            .field("collection_behavior", &self.collection_behavior)
            .field("converter", &self.converter.is_some())
            .field("constructor", &self.constructor.is_some())
            .finish()
    }
}

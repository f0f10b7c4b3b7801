use remap_config::TypePair;
use remap_ir::TypeRegistry;

use crate::{CompileCx, ItemSite, MapError, MemberStep, ObjectRoutine, RoutineBody};

use super::MappingStrategy;

/// Complex objects: member-wise mapping of structs and interfaces.
///
/// Steps run in ascending target access-path depth (stable, so configured
/// order is kept among equal depths): an object is assigned before anything
/// is written into its descendants.
#[derive(Copy, Clone, Debug, Default)]
pub struct ReferenceStrategy;

impl MappingStrategy for ReferenceStrategy {
    fn name(&self) -> &'static str {
        "reference"
    }

    fn can_handle(&self, types: &TypeRegistry, pair: TypePair) -> bool {
        types.flags(pair.source).is_complex_object() && types.flags(pair.target).is_complex_object()
    }

    fn build(&self, cx: &mut CompileCx<'_>, pair: TypePair) -> Result<RoutineBody, MapError> {
        let mapping = cx.type_mapping(pair);
        let owner = cx.display(pair.target);

        let mut members: Vec<_> = mapping.active_members().collect();
        members.sort_by_key(|member| member.depth());

        let mut steps = Vec::with_capacity(members.len());
        for member in members {
            let path = format!("{owner}.{}", member.target);
            let member_pair = member.pair();

            if !member.source.is_readable() {
                return Err(cx.configuration_error(&path, member_pair, "source member is not readable"));
            }
            if !member.target.is_writable() {
                return Err(cx.configuration_error(&path, member_pair, "target member is not writable"));
            }
            if let Some(target_path) = member.target.as_path() {
                for intermediate in target_path.intermediate_types() {
                    cx.check_constructible(intermediate, &path)?;
                }
            }

            let site = ItemSite {
                path: path.clone(),
                converter: member.converter.clone(),
                constructor: member.constructor.clone(),
                reference_behavior: Some(mapping.reference_behavior_for(member)),
                collection_behavior: Some(mapping.collection_behavior_for(member)),
            };
            let item = cx.item_mapper(member_pair, site)?;
            steps.push(MemberStep::new(
                member.source.clone(),
                member.target.clone(),
                path,
                item,
            ));
        }

        Ok(RoutineBody::Object(ObjectRoutine::new(steps)))
    }
}

use remap_config::TypePair;
use remap_ir::TypeRegistry;

use crate::convert::builtin_conversion;
use crate::{CompileCx, MapError, RoutineBody};

use super::MappingStrategy;

/// Built-in to built-in values: identity, widenings, to-string.
#[derive(Copy, Clone, Debug, Default)]
pub struct BuiltInStrategy;

impl MappingStrategy for BuiltInStrategy {
    fn name(&self) -> &'static str {
        "builtin"
    }

    fn can_handle(&self, types: &TypeRegistry, pair: TypePair) -> bool {
        types.flags(pair.source).is_builtin() && types.flags(pair.target).is_builtin()
    }

    fn tracks_references(&self) -> bool {
        false
    }

    fn build(&self, cx: &mut CompileCx<'_>, pair: TypePair) -> Result<RoutineBody, MapError> {
        builtin_conversion(pair.source, pair.target)
            .map(RoutineBody::Convert)
            .ok_or_else(|| {
                cx.configuration_error(
                    &cx.display(pair.target),
                    pair,
                    "no built-in conversion exists; configure a converter",
                )
            })
    }
}

//! Mapping errors.

use remap_config::ConfigError;
use remap_ir::{PathError, RegistryError};

/// Error raised while compiling or running a mapping.
///
/// `Configuration` and `Allocation` are raised at compile time, once per
/// type pair; a failed compile is not cached, so a later call retries.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MapError {
    #[error("cannot map `{path}` from `{source_type}` to `{target_type}`: {reason}")]
    Configuration {
        path: String,
        source_type: String,
        target_type: String,
        reason: String,
    },
    #[error("cannot allocate `{target_type}` for `{path}`: {reason}")]
    Allocation {
        path: String,
        target_type: String,
        reason: String,
    },
    #[error(transparent)]
    Path(#[from] PathError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

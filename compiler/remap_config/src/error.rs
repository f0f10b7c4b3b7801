use remap_ir::PathError;

/// Error raised while recording configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("in mapping `{pair}`: {source}")]
    Path {
        pair: String,
        #[source]
        source: PathError,
    },
}

//! Mapping configuration for the remap object mapper.
//!
//! Produces, for any [`TypePair`], a deterministic and stably ordered
//! [`TypeMapping`]: member bindings plus resolved behavior flags and
//! optional converter/constructor overrides.

mod accessor;
mod behavior;
mod config;
mod error;
mod mapping;
mod options;
mod pair;

pub use accessor::{FnAccessor, Getter, MemberAccessor, Setter};
pub use behavior::{CollectionBehavior, ReferenceBehavior};
pub use config::{Configuration, TypeMappingConfig};
pub use error::ConfigError;
pub use mapping::{Constructor, Converter, MemberMapping, Resolution, TypeMapping};
pub use options::{ConventionOptions, MapperOptions};
pub use pair::TypePair;

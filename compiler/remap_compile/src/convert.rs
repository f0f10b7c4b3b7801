//! Value conversions between built-in types.

use std::fmt;

use remap_config::Converter;
use remap_ir::{TypeId, Value};

/// Read-convert-write transformation of a single value.
#[derive(Clone)]
pub enum Conversion {
    /// Same type; the value is copied as is.
    Identity,
    /// Implicit conversion between built-ins.
    Builtin(fn(&Value) -> Value),
    /// User converter. Called for every value, null included.
    Custom(Converter),
}

impl Conversion {
    pub fn apply(&self, value: &Value) -> Value {
        match self {
            Conversion::Identity => value.clone(),
            Conversion::Builtin(f) => f(value),
            Conversion::Custom(f) => f(value),
        }
    }
}

impl fmt::Debug for Conversion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Conversion::Identity => f.write_str("Identity"),
            Conversion::Builtin(_) => f.write_str("Builtin"),
            Conversion::Custom(_) => f.write_str("Custom"),
        }
    }
}

/// Implicit conversion from `source` to `target`, if one exists.
///
/// Supported: identity, widenings `byte -> int`, `int -> float`,
/// `byte -> float`, and any built-in to `str` through its display form.
/// Null passes through unchanged.
pub fn builtin_conversion(source: TypeId, target: TypeId) -> Option<Conversion> {
    if source == target {
        return Some(Conversion::Identity);
    }
    let f: fn(&Value) -> Value = match (source, target) {
        (TypeId::BYTE, TypeId::INT) => byte_to_int,
        (TypeId::INT, TypeId::FLOAT) => int_to_float,
        (TypeId::BYTE, TypeId::FLOAT) => byte_to_float,
        (_, TypeId::STR) if source.is_primitive() => to_display_string,
        _ => return None,
    };
    Some(Conversion::Builtin(f))
}

fn byte_to_int(value: &Value) -> Value {
    match value {
        Value::Byte(b) => Value::Int(i64::from(*b)),
        other => other.clone(),
    }
}

#[expect(
    clippy::cast_precision_loss,
    reason = "int -> float is a widening conversion by contract"
)]
fn int_to_float(value: &Value) -> Value {
    match value {
        Value::Int(n) => Value::Float(*n as f64),
        other => other.clone(),
    }
}

fn byte_to_float(value: &Value) -> Value {
    match value {
        Value::Byte(b) => Value::Float(f64::from(*b)),
        other => other.clone(),
    }
}

fn to_display_string(value: &Value) -> Value {
    match value {
        Value::Null => Value::Null,
        Value::Str(_) => value.clone(),
        other => Value::string(other.to_string()),
    }
}

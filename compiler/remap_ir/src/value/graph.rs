//! Structural equality over possibly cyclic object graphs.

use rustc_hash::FxHashSet;

use super::{ObjRef, ObjectData, Value};

/// Deep structural equality.
///
/// Objects are equal when they have the same runtime type and pairwise equal
/// contents. A pair of objects already under comparison is assumed equal, so
/// cycles terminate and isomorphic cyclic graphs compare equal. Identity is
/// not required: a graph and its deep copy are `graph_eq`.
pub fn graph_eq(a: &Value, b: &Value) -> bool {
    let mut assumed = FxHashSet::default();
    values_eq(a, b, &mut assumed)
}

fn values_eq(a: &Value, b: &Value, assumed: &mut FxHashSet<(usize, usize)>) -> bool {
    match (a, b) {
        (Value::Object(x), Value::Object(y)) => objects_eq(x, y, assumed),
        (Value::Object(_), _) | (_, Value::Object(_)) => false,
        _ => a == b,
    }
}

fn objects_eq(x: &ObjRef, y: &ObjRef, assumed: &mut FxHashSet<(usize, usize)>) -> bool {
    if x.ptr_eq(y) || !assumed.insert((x.addr(), y.addr())) {
        return true;
    }
    // Snapshot both sides so no lock is held while recursing.
    let (x_ty, x_data) = {
        let guard = x.read();
        (guard.ty(), guard.data().clone())
    };
    let (y_ty, y_data) = {
        let guard = y.read();
        (guard.ty(), guard.data().clone())
    };
    if x_ty != y_ty {
        return false;
    }

    match (&x_data, &y_data) {
        (ObjectData::Struct(l), ObjectData::Struct(r))
        | (ObjectData::Sequence(l), ObjectData::Sequence(r))
        | (ObjectData::Stack(l), ObjectData::Stack(r)) => slices_eq(l, r, assumed),
        (ObjectData::Queue(l), ObjectData::Queue(r)) => {
            l.len() == r.len() && l.iter().zip(r).all(|(a, b)| values_eq(a, b, assumed))
        }
        (ObjectData::Map(l), ObjectData::Map(r)) => {
            l.len() == r.len()
                && l.iter().zip(r.iter()).all(|((lk, lv), (rk, rv))| {
                    values_eq(lk, rk, assumed) && values_eq(lv, rv, assumed)
                })
        }
        _ => false,
    }
}

fn slices_eq(l: &[Value], r: &[Value], assumed: &mut FxHashSet<(usize, usize)>) -> bool {
    l.len() == r.len() && l.iter().zip(r).all(|(a, b)| values_eq(a, b, assumed))
}

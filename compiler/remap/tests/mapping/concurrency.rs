//! Concurrent first use and deep graphs.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use rayon::prelude::*;

use remap::{graph_eq, Mapper, ObjRef, StructDef, TypeId, TypeRegistry, Value};

use crate::common::{get, set, tree};

#[test]
fn concurrent_first_use_compiles_once() {
    let fx = tree();
    let source = fx.node(
        "root",
        vec![
            fx.node("a", vec![fx.node("a1", Vec::new())]),
            fx.node("b", Vec::new()),
        ],
    );

    let reference = Mapper::new(fx.types.clone());
    reference.map(&source).unwrap();
    let expected_routines = reference.compiled_routines();

    let mapper = Arc::new(Mapper::new(fx.types.clone()));
    let results: Vec<Value> = (0..64)
        .into_par_iter()
        .map(|_| mapper.map(&source).unwrap())
        .collect();

    assert_eq!(mapper.compiled_routines(), expected_routines);
    for result in &results {
        assert!(graph_eq(result, &source));
    }
    for pair in results.windows(2) {
        assert!(!pair[0].same_object(&pair[1]));
    }
}

#[test]
fn concurrent_calls_with_different_pairs() {
    let fx = tree();
    let list = fx.types.list_of(TypeId::INT);
    let stack = fx.types.stack_of(TypeId::INT);
    let mapper = Mapper::new(fx.types.clone());
    let node = fx.node("n", vec![fx.node("m", Vec::new())]);
    let numbers: Value = ObjRef::new_sequence(list, vec![Value::Int(1), Value::Int(2)]).into();

    (0..32).into_par_iter().for_each(|i| {
        if i % 2 == 0 {
            let mapped = mapper.map(&node).unwrap();
            assert!(graph_eq(&mapped, &node));
        } else {
            let mapped = mapper.map_to(&numbers, stack).unwrap();
            assert_eq!(mapped.as_object().unwrap().pop(), Some(Value::Int(1)));
        }
    });
}

/// Iteratively detach `next` links so dropping a long chain does not recurse.
fn unlink(types: &TypeRegistry, head: Value) {
    let mut current = head;
    while !current.is_null() {
        let next = get(types, &current, "next");
        set(types, &current, "next", Value::Null);
        current = next;
    }
}

#[test]
fn deep_chain_does_not_overflow_the_stack() {
    const DEPTH: i64 = 20_000;

    let types = TypeRegistry::shared();
    let link = types.declare_struct("Link");
    types
        .define_struct(
            link,
            StructDef::new("Link")
                .field("value", TypeId::INT)
                .field("next", link),
        )
        .unwrap();
    let mapper = Mapper::new(types.clone());

    let mut head = Value::Null;
    for value in (0..DEPTH).rev() {
        head = ObjRef::new_struct(link, vec![Value::Int(value), head]).into();
    }

    let mapped = mapper.map(&head).unwrap();

    let mut length = 0;
    let mut current = mapped.clone();
    while !current.is_null() {
        assert_eq!(get(&types, &current, "value"), Value::Int(length));
        length += 1;
        current = get(&types, &current, "next");
    }
    assert_eq!(length, DEPTH);

    unlink(&types, head);
    unlink(&types, mapped);
}

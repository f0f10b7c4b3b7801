//! Collection-shaped members and top-level collections.

use std::sync::atomic::Ordering;

use pretty_assertions::assert_eq;

use remap::{
    graph_eq, CollectionBehavior, Mapper, ObjRef, ReferenceBehavior, StructDef, TypeId,
    TypeRegistry, Value,
};

use crate::common::{get, ints, items, people};

#[test]
fn example_b_dictionary_copy() {
    let types = TypeRegistry::shared();
    let map = types.map_of(TypeId::INT, TypeId::STR);
    let mapper = Mapper::new(types);

    let source: Value = ObjRef::new_map(
        map,
        vec![
            (Value::Int(1), Value::string("a")),
            (Value::Int(2), Value::string("b")),
        ],
    )
    .into();
    let mapped = mapper.map(&source).unwrap();

    assert!(!mapped.same_object(&source));
    assert!(graph_eq(&source, &mapped));
    let obj = mapped.as_object().unwrap();
    assert_eq!(
        obj.entries(),
        vec![
            (Value::Int(1), Value::string("a")),
            (Value::Int(2), Value::string("b")),
        ]
    );

    // No shared storage: changing the copy leaves the source alone.
    obj.write().clear();
    assert_eq!(source.as_object().unwrap().len(), 2);
}

#[test]
fn short_array_is_replaced() {
    let types = TypeRegistry::shared();
    let list = types.list_of(TypeId::INT);
    let array = types.array_of(TypeId::INT);
    let mapper = Mapper::new(types.clone());

    let source: Value = ObjRef::new_sequence(list, ints(&[1, 2, 3])).into();
    let short: Value = types.new_array(array, 1).unwrap().into();
    let result = mapper.map_into(&source, &short).unwrap();

    assert!(!result.same_object(&short));
    assert_eq!(items(&result), ints(&[1, 2, 3]));
    assert_eq!(items(&short), ints(&[0]));
}

#[test]
fn long_enough_array_is_written_in_place() {
    let types = TypeRegistry::shared();
    let list = types.list_of(TypeId::INT);
    let array = types.array_of(TypeId::INT);
    let mapper = Mapper::new(types.clone());

    let source: Value = ObjRef::new_sequence(list, ints(&[1, 2])).into();
    let target: Value = ObjRef::new_sequence(array, ints(&[9, 9, 9])).into();
    let result = mapper.map_into(&source, &target).unwrap();

    assert!(result.same_object(&target));
    assert_eq!(items(&target), ints(&[1, 2, 0]));
}

#[test]
fn array_member_is_sized_to_the_source() {
    let types = TypeRegistry::shared();
    let array = types.array_of(TypeId::STR);
    let list = types.list_of(TypeId::STR);
    let source_ty = types
        .register_struct(StructDef::new("Tagged").field("tags", list))
        .unwrap();
    let target_ty = types
        .register_struct(StructDef::new("TaggedDto").field("tags", array))
        .unwrap();
    let mapper = Mapper::new(types.clone());

    let tags = ObjRef::new_sequence(list, vec![Value::string("a"), Value::string("b")]);
    let source: Value = ObjRef::new_struct(source_ty, vec![tags.into()]).into();
    let mapped = mapper.map_to(&source, target_ty).unwrap();

    let tags = get(&types, &mapped, "tags");
    assert_eq!(tags.runtime_type(), Some(array));
    assert_eq!(items(&tags), vec![Value::string("a"), Value::string("b")]);
}

#[test]
fn lifo_order_is_preserved() {
    let types = TypeRegistry::shared();
    let stack = types.stack_of(TypeId::INT);
    let list = types.list_of(TypeId::INT);
    let mapper = Mapper::new(types);

    // Pushed 1, 2, 3: pops 3, 2, 1.
    let source: Value = ObjRef::new_stack(stack, ints(&[1, 2, 3])).into();
    let mapped = mapper.map(&source).unwrap();
    let target = mapped.as_object().unwrap();
    let popped: Vec<_> = std::iter::from_fn(|| target.pop()).collect();
    assert_eq!(popped, ints(&[3, 2, 1]));

    // A list iterating 3, 2, 1 also pops 3, 2, 1.
    let source: Value = ObjRef::new_sequence(list, ints(&[3, 2, 1])).into();
    let mapped = mapper.map_to(&source, stack).unwrap();
    let target = mapped.as_object().unwrap();
    let popped: Vec<_> = std::iter::from_fn(|| target.pop()).collect();
    assert_eq!(popped, ints(&[3, 2, 1]));
}

#[test]
fn queue_from_stack_keeps_pop_order() {
    let types = TypeRegistry::shared();
    let stack = types.stack_of(TypeId::INT);
    let queue = types.queue_of(TypeId::INT);
    let mapper = Mapper::new(types);

    let source: Value = ObjRef::new_stack(stack, ints(&[1, 2, 3])).into();
    let mapped = mapper.map_to(&source, queue).unwrap();
    assert_eq!(items(&mapped), ints(&[3, 2, 1]));
}

#[test]
fn merge_appends_and_reset_replaces() {
    let types = TypeRegistry::shared();
    let list = types.list_of(TypeId::INT);
    let source: Value = ObjRef::new_sequence(list, ints(&[1, 2])).into();

    let reset = Mapper::new(types.clone());
    let target: Value = ObjRef::new_sequence(list, ints(&[0])).into();
    reset.map_into(&source, &target).unwrap();
    assert_eq!(items(&target), ints(&[1, 2]));

    let merge = Mapper::builder(types.clone())
        .collection_behavior(CollectionBehavior::Merge)
        .build();
    let target: Value = ObjRef::new_sequence(list, ints(&[0])).into();
    merge.map_into(&source, &target).unwrap();
    assert_eq!(items(&target), ints(&[0, 1, 2]));
}

#[test]
fn member_collections_merge_into_reused_instances() {
    let types = TypeRegistry::shared();
    let list = types.list_of(TypeId::INT);
    let bag = types
        .register_struct(StructDef::new("Bag").field("items", list))
        .unwrap();
    let mapper = Mapper::new(types.clone());
    mapper
        .configure(bag, bag, |m| {
            m.reference_behavior(ReferenceBehavior::ReuseTargetIfNotNull)
                .collection_behavior(CollectionBehavior::Merge);
            Ok(())
        })
        .unwrap();

    let source: Value =
        ObjRef::new_struct(bag, vec![ObjRef::new_sequence(list, ints(&[2, 3])).into()]).into();
    let existing_items = ObjRef::new_sequence(list, ints(&[1]));
    let target: Value = ObjRef::new_struct(bag, vec![existing_items.clone().into()]).into();

    mapper.map_into(&source, &target).unwrap();

    let merged = get(&types, &target, "items");
    assert!(merged.same_object(&existing_items.into()));
    assert_eq!(items(&merged), ints(&[1, 2, 3]));
}

#[test]
fn shared_elements_map_to_one_instance() {
    let fx = people();
    let people_list = fx.types.list_of(fx.person);
    let mapper = Mapper::new(fx.types.clone());

    let ada = fx.person("Ada", fx.address("Paris"));
    let source: Value =
        ObjRef::new_sequence(people_list, vec![ada.clone(), Value::Null, ada.clone()]).into();
    let mapped = items(&mapper.map(&source).unwrap());

    assert_eq!(mapped.len(), 3);
    assert!(mapped[0].same_object(&mapped[2]));
    assert!(!mapped[0].same_object(&ada));
    assert_eq!(mapped[1], Value::Null);
    assert_eq!(get(&fx.types, &mapped[0], "name"), Value::string("Ada"));
}

#[test]
fn dictionary_with_object_values() {
    let fx = people();
    let directory = fx.types.map_of(TypeId::STR, fx.person);
    let mapper = Mapper::new(fx.types.clone());

    let home = fx.address("Paris");
    let source: Value = ObjRef::new_map(
        directory,
        vec![
            (Value::string("ada"), fx.person("Ada", home.clone())),
            (Value::string("bob"), fx.person("Bob", home)),
        ],
    )
    .into();
    let mapped = mapper.map(&source).unwrap();
    let obj = mapped.as_object().unwrap();

    let ada = obj.get(&Value::string("ada")).unwrap();
    let bob = obj.get(&Value::string("bob")).unwrap();
    assert_eq!(get(&fx.types, &bob, "name"), Value::string("Bob"));
    // Both people share one address in the source; so do their copies.
    assert!(get(&fx.types, &ada, "address").same_object(&get(&fx.types, &bob, "address")));
}

#[test]
fn null_elements_stay_null_without_allocation() {
    let fx = people();
    let list = fx.types.list_of(fx.address);
    let mapper = Mapper::new(fx.types.clone());
    let created = fx.count_addresses(&mapper);

    let source: Value = ObjRef::new_sequence(
        list,
        vec![Value::Null, fx.address("Rome"), Value::Null],
    )
    .into();
    let mapped = mapper.map(&source).unwrap();

    let mapped = items(&mapped);
    assert_eq!(mapped.len(), 3);
    assert!(mapped[0].is_null());
    assert_eq!(get(&fx.types, &mapped[1], "city"), Value::string("Rome"));
    assert!(mapped[2].is_null());
    assert_eq!(created.load(Ordering::SeqCst), 1);
}

//! Member-wise mapping of structs.

use std::sync::atomic::Ordering;

use pretty_assertions::assert_eq;

use remap::{
    graph_eq, FieldDef, Mapper, MemberAccessor, ObjRef, ReferenceBehavior, StructDef, TypeId,
    TypeRegistry, Value,
};

use crate::common::{get, items, people, set, tree};

#[test]
fn example_a_children_are_new_instances() {
    let fx = tree();
    let mapper = Mapper::new(fx.types.clone());
    let source = fx.node(
        "A",
        vec![fx.node("B", Vec::new()), fx.node("C", Vec::new())],
    );

    let mapped = mapper.map(&source).unwrap();

    assert!(graph_eq(&source, &mapped));
    assert_eq!(get(&fx.types, &mapped, "name"), Value::string("A"));
    let source_children = items(&get(&fx.types, &source, "children"));
    let children = items(&get(&fx.types, &mapped, "children"));
    assert_eq!(children.len(), 2);
    assert_eq!(get(&fx.types, &children[0], "name"), Value::string("B"));
    assert_eq!(get(&fx.types, &children[1], "name"), Value::string("C"));
    for (mapped_child, source_child) in children.iter().zip(&source_children) {
        assert!(!mapped_child.same_object(source_child));
        assert_eq!(mapped_child.runtime_type(), Some(fx.node));
    }
    assert!(!get(&fx.types, &mapped, "children").same_object(&get(&fx.types, &source, "children")));
}

#[test]
fn conventions_bind_same_named_members() {
    let types = TypeRegistry::shared();
    let person = types
        .register_struct(
            StructDef::new("Person")
                .field("name", TypeId::STR)
                .field("age", TypeId::INT)
                .field("secret", TypeId::STR),
        )
        .unwrap();
    let dto = types
        .register_struct(
            StructDef::new("PersonDto")
                .field("name", TypeId::STR)
                .field("age", TypeId::FLOAT)
                .field("email", TypeId::STR),
        )
        .unwrap();
    let mapper = Mapper::new(types.clone());

    let source: Value = ObjRef::new_struct(
        person,
        vec![Value::string("Ada"), Value::Int(36), Value::string("x")],
    )
    .into();
    let mapped = mapper.map_to(&source, dto).unwrap();

    assert_eq!(get(&types, &mapped, "name"), Value::string("Ada"));
    assert_eq!(get(&types, &mapped, "age"), Value::Float(36.0));
    assert_eq!(get(&types, &mapped, "email"), Value::Null);
}

#[test]
fn ignore_case_conventions() {
    let types = TypeRegistry::shared();
    let source_ty = types
        .register_struct(StructDef::new("Row").field("UserName", TypeId::STR))
        .unwrap();
    let target_ty = types
        .register_struct(StructDef::new("User").field("username", TypeId::STR))
        .unwrap();
    let source: Value = ObjRef::new_struct(source_ty, vec![Value::string("ada")]).into();

    let exact = Mapper::new(types.clone());
    let mapped = exact.map_to(&source, target_ty).unwrap();
    assert_eq!(get(&types, &mapped, "username"), Value::Null);

    let relaxed = Mapper::builder(types.clone()).ignore_case(true).build();
    let mapped = relaxed.map_to(&source, target_ty).unwrap();
    assert_eq!(get(&types, &mapped, "username"), Value::string("ada"));
}

#[test]
fn multi_hop_target_creates_intermediates() {
    let fx = people();
    let flat = fx
        .types
        .register_struct(
            StructDef::new("Flat")
                .field("name", TypeId::STR)
                .field("city", TypeId::STR),
        )
        .unwrap();
    let mapper = Mapper::new(fx.types.clone());
    mapper
        .configure(flat, fx.person, |m| {
            m.map_member("city", "address.city")?;
            Ok(())
        })
        .unwrap();

    let source: Value =
        ObjRef::new_struct(flat, vec![Value::string("Ada"), Value::string("Paris")]).into();
    let mapped = mapper.map_to(&source, fx.person).unwrap();

    let address = get(&fx.types, &mapped, "address");
    assert_eq!(address.runtime_type(), Some(fx.address));
    assert_eq!(get(&fx.types, &address, "city"), Value::string("Paris"));
    assert_eq!(get(&fx.types, &mapped, "name"), Value::string("Ada"));
}

#[test]
fn multi_hop_source_through_null_reads_null() {
    let fx = people();
    let flat = fx
        .types
        .register_struct(StructDef::new("Flat").field("city", TypeId::STR))
        .unwrap();
    let mapper = Mapper::new(fx.types.clone());
    mapper
        .configure(fx.person, flat, |m| {
            m.map_member("address.city", "city")?;
            Ok(())
        })
        .unwrap();

    let with_address = fx.person("Ada", fx.address("Paris"));
    let mapped = mapper.map_to(&with_address, flat).unwrap();
    assert_eq!(get(&fx.types, &mapped, "city"), Value::string("Paris"));

    let without = fx.person("Bob", Value::Null);
    let mapped = mapper.map_to(&without, flat).unwrap();
    assert_eq!(get(&fx.types, &mapped, "city"), Value::Null);
}

#[test]
fn null_members_stay_null() {
    let fx = people();
    let mapper = Mapper::new(fx.types.clone());

    let created = fx.count_addresses(&mapper);

    let mapped = mapper.map(&fx.person("Ada", Value::Null)).unwrap();
    assert_eq!(get(&fx.types, &mapped, "address"), Value::Null);
    assert_eq!(get(&fx.types, &mapped, "name"), Value::string("Ada"));
    assert_eq!(created.load(Ordering::SeqCst), 0);

    mapper.map(&fx.person("Bob", fx.address("Oslo"))).unwrap();
    assert_eq!(created.load(Ordering::SeqCst), 1);
}

#[test]
fn member_converter_and_type_converter() {
    let types = TypeRegistry::shared();
    let money = types
        .register_struct(
            StructDef::new("Money")
                .field("cents", TypeId::INT)
                .field("currency", TypeId::STR),
        )
        .unwrap();
    let order = types
        .register_struct(
            StructDef::new("Order")
                .field("total", money)
                .field("quantity", TypeId::STR),
        )
        .unwrap();
    let dto = types
        .register_struct(
            StructDef::new("OrderDto")
                .field("total", TypeId::STR)
                .field("quantity", TypeId::INT),
        )
        .unwrap();
    let mapper = Mapper::new(types.clone());
    mapper
        .configure(money, TypeId::STR, |m| {
            m.converter(|v| match v.as_object() {
                Some(obj) => Value::string(format!("{} {}", obj.field(0), obj.field(1))),
                None => Value::Null,
            });
            Ok(())
        })
        .unwrap();
    mapper
        .configure(order, dto, |m| {
            m.map_member("quantity", "quantity")?.converter(|v| {
                Value::Int(v.as_str().and_then(|s| s.parse().ok()).unwrap_or_default())
            });
            Ok(())
        })
        .unwrap();

    let total = ObjRef::new_struct(money, vec![Value::Int(1250), Value::string("EUR")]);
    let source: Value = ObjRef::new_struct(order, vec![total.into(), Value::string("3")]).into();
    let mapped = mapper.map_to(&source, dto).unwrap();

    assert_eq!(get(&types, &mapped, "total"), Value::string("1250 EUR"));
    assert_eq!(get(&types, &mapped, "quantity"), Value::Int(3));
}

#[test]
fn custom_constructor_is_used() {
    let types = TypeRegistry::shared();
    let source_ty = types
        .register_struct(StructDef::new("Input").field("name", TypeId::STR))
        .unwrap();
    let target_ty = types
        .register_struct(
            StructDef::new("Output")
                .field("name", TypeId::STR)
                .field("origin", TypeId::STR)
                .without_default_constructor(),
        )
        .unwrap();
    let mapper = Mapper::new(types.clone());
    mapper
        .configure(source_ty, target_ty, |m| {
            m.constructor(move || {
                ObjRef::new_struct(target_ty, vec![Value::Null, Value::string("factory")]).into()
            });
            Ok(())
        })
        .unwrap();

    let source: Value = ObjRef::new_struct(source_ty, vec![Value::string("Ada")]).into();
    let mapped = mapper.map_to(&source, target_ty).unwrap();
    assert_eq!(get(&types, &mapped, "name"), Value::string("Ada"));
    assert_eq!(get(&types, &mapped, "origin"), Value::string("factory"));
}

#[test]
fn function_accessors() {
    let types = TypeRegistry::shared();
    let person = types
        .register_struct(
            StructDef::new("Person")
                .field("first", TypeId::STR)
                .field("last", TypeId::STR),
        )
        .unwrap();
    let card = types
        .register_struct(StructDef::new("Card").field("label", TypeId::STR))
        .unwrap();
    let mapper = Mapper::builder(types.clone())
        .conventions(remap::ConventionOptions {
            enabled: false,
            ignore_case: false,
        })
        .build();
    mapper
        .configure(person, card, |m| {
            let full_name = MemberAccessor::getter("full_name", TypeId::STR, |v| {
                let obj = v.as_object().expect("person");
                Value::string(format!("{} {}", obj.field(0), obj.field(1)))
            });
            let shout = MemberAccessor::setter("shout", TypeId::STR, |target, value| {
                let upper = value.as_str().map(str::to_uppercase);
                if let (Some(obj), Some(upper)) = (target.as_object(), upper) {
                    obj.set_field(0, Value::string(upper));
                }
            });
            m.map_accessors(full_name, shout);
            Ok(())
        })
        .unwrap();

    let source: Value =
        ObjRef::new_struct(person, vec![Value::string("Ada"), Value::string("Lovelace")]).into();
    let mapped = mapper.map_to(&source, card).unwrap();
    assert_eq!(get(&types, &mapped, "label"), Value::string("ADA LOVELACE"));
}

#[test]
fn ignored_and_read_only_members_are_untouched() {
    let types = TypeRegistry::shared();
    let source_ty = types
        .register_struct(
            StructDef::new("Src")
                .field("id", TypeId::INT)
                .field("name", TypeId::STR)
                .field("note", TypeId::STR),
        )
        .unwrap();
    let target_ty = types
        .register_struct(
            StructDef::new("Dst")
                .with_field(FieldDef::new("id", TypeId::INT).read_only())
                .field("name", TypeId::STR)
                .field("note", TypeId::STR),
        )
        .unwrap();
    let mapper = Mapper::new(types.clone());
    mapper
        .configure(source_ty, target_ty, |m| {
            m.ignore_member("note")?;
            Ok(())
        })
        .unwrap();

    let source: Value = ObjRef::new_struct(
        source_ty,
        vec![Value::Int(7), Value::string("n"), Value::string("x")],
    )
    .into();
    let mapped = mapper.map_to(&source, target_ty).unwrap();
    assert_eq!(get(&types, &mapped, "id"), Value::Int(0));
    assert_eq!(get(&types, &mapped, "name"), Value::string("n"));
    assert_eq!(get(&types, &mapped, "note"), Value::Null);
}

#[test]
fn map_into_populates_the_given_instance() {
    let fx = people();
    let mapper = Mapper::new(fx.types.clone());
    let source = fx.person("Ada", fx.address("Paris"));
    let target = fx.person("old", fx.address("Rome"));
    let old_address = get(&fx.types, &target, "address");

    let result = mapper.map_into(&source, &target).unwrap();

    assert!(result.same_object(&target));
    assert_eq!(get(&fx.types, &target, "name"), Value::string("Ada"));
    // Default behavior: nested objects are replaced.
    let address = get(&fx.types, &target, "address");
    assert!(!address.same_object(&old_address));
    assert_eq!(get(&fx.types, &address, "city"), Value::string("Paris"));
    assert_eq!(get(&fx.types, &old_address, "city"), Value::string("Rome"));
}

#[test]
fn reuse_keeps_existing_nested_instances() {
    let fx = people();
    let mapper = Mapper::builder(fx.types.clone())
        .reference_behavior(ReferenceBehavior::ReuseTargetIfNotNull)
        .build();
    let source = fx.person("Ada", fx.address("Paris"));
    let target = fx.person("old", fx.address("Rome"));
    let old_address = get(&fx.types, &target, "address");

    mapper.map_into(&source, &target).unwrap();

    let address = get(&fx.types, &target, "address");
    assert!(address.same_object(&old_address));
    assert_eq!(get(&fx.types, &address, "city"), Value::string("Paris"));

    // A null source member still nulls the target member.
    mapper
        .map_into(&fx.person("Ada", Value::Null), &target)
        .unwrap();
    assert_eq!(get(&fx.types, &target, "address"), Value::Null);

    // Nothing to reuse: a fresh instance is created.
    set(&fx.types, &target, "address", Value::Null);
    mapper.map_into(&source, &target).unwrap();
    let address = get(&fx.types, &target, "address");
    assert!(!address.is_null());
    assert!(!address.same_object(&old_address));
}

#[test]
fn built_in_values_convert_directly() {
    let mapper = Mapper::new(TypeRegistry::shared());
    assert_eq!(mapper.map(&Value::Int(5)).unwrap(), Value::Int(5));
    assert_eq!(
        mapper.map_to(&Value::Int(5), TypeId::FLOAT).unwrap(),
        Value::Float(5.0)
    );
    assert_eq!(
        mapper.map_to(&Value::Int(5), TypeId::STR).unwrap(),
        Value::string("5")
    );
    assert_eq!(
        mapper.map_into(&Value::Byte(2), &Value::Int(0)).unwrap(),
        Value::Int(2)
    );
    assert_eq!(mapper.map(&Value::Null).unwrap(), Value::Null);
    assert_eq!(mapper.map_to(&Value::Null, TypeId::INT).unwrap(), Value::Null);
}

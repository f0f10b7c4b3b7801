//! Configuration errors surface at compile time, with the member path.

use pretty_assertions::assert_eq;

use remap::{MapError, Mapper, ObjRef, StructDef, TypeId, TypeRegistry, Value};

use crate::common::{get, people};

fn age_types() -> (remap::SharedTypeRegistry, TypeId, TypeId) {
    let types = TypeRegistry::shared();
    let source = types
        .register_struct(StructDef::new("Form").field("age", TypeId::STR))
        .unwrap();
    let target = types
        .register_struct(StructDef::new("Record").field("age", TypeId::INT))
        .unwrap();
    (types, source, target)
}

#[test]
fn unsupported_member_conversion_names_path_and_types() {
    let (types, source_ty, target_ty) = age_types();
    let mapper = Mapper::new(types);
    let source: Value = ObjRef::new_struct(source_ty, vec![Value::string("36")]).into();

    let err = mapper.map_to(&source, target_ty).unwrap_err();
    assert_eq!(
        err.to_string(),
        "cannot map `Record.age` from `str` to `int`: no built-in conversion exists; \
         configure a converter"
    );
    assert_eq!(mapper.compiled_routines(), 0);
}

#[test]
fn failed_compile_is_retried_after_a_fix() {
    let (types, source_ty, target_ty) = age_types();
    let mapper = Mapper::new(types.clone());
    let source: Value = ObjRef::new_struct(source_ty, vec![Value::string("36")]).into();

    assert!(mapper.map_to(&source, target_ty).is_err());
    // Still failing: nothing was cached, the pair is compiled again.
    assert!(mapper.map_to(&source, target_ty).is_err());

    mapper
        .configure(TypeId::STR, TypeId::INT, |m| {
            m.converter(|v| {
                v.as_str()
                    .and_then(|s| s.parse().ok())
                    .map_or(Value::Null, Value::Int)
            });
            Ok(())
        })
        .unwrap();

    let mapped = mapper.map_to(&source, target_ty).unwrap();
    assert_eq!(get(&types, &mapped, "age"), Value::Int(36));
}

#[test]
fn unknown_member_is_a_configuration_error() {
    let fx = people();
    let mapper = Mapper::new(fx.types.clone());

    let err = mapper
        .configure(fx.person, fx.person, |m| {
            m.map_member("nickname", "name")?;
            Ok(())
        })
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "in mapping `Person -> Person`: `Person` has no member `nickname`"
    );
}

#[test]
fn no_strategy_for_pair() {
    let fx = people();
    let list = fx.types.list_of(TypeId::INT);
    let mapper = Mapper::new(fx.types.clone());

    let err = mapper
        .map_to(&fx.person("Ada", Value::Null), list)
        .unwrap_err();
    assert!(matches!(
        err,
        MapError::Configuration { ref source_type, ref target_type, .. }
            if source_type == "Person" && target_type == "List<int>"
    ));
}

#[test]
fn unconstructible_member_type_is_reported() {
    let types = TypeRegistry::shared();
    let handle = types
        .register_struct(
            StructDef::new("Handle")
                .field("id", TypeId::INT)
                .without_default_constructor(),
        )
        .unwrap();
    let owner = types
        .register_struct(StructDef::new("Owner").field("handle", handle))
        .unwrap();
    let mapper = Mapper::new(types);

    let source: Value = ObjRef::new_struct(owner, vec![Value::Null]).into();
    let err = mapper.map(&source).unwrap_err();
    assert_eq!(
        err,
        MapError::Allocation {
            path: "Owner.handle".into(),
            target_type: "Handle".into(),
            reason: "no default constructor and no custom constructor is configured".into(),
        }
    );
}

#[test]
fn null_target_cannot_be_populated() {
    let fx = people();
    let mapper = Mapper::new(fx.types.clone());

    let err = mapper
        .map_into(&fx.person("Ada", Value::Null), &Value::Null)
        .unwrap_err();
    assert!(matches!(err, MapError::Configuration { .. }));
    assert_eq!(
        mapper.map_into(&Value::Null, &Value::Null).unwrap(),
        Value::Null
    );
}

/// Collects formatted log output in memory.
#[derive(Clone, Default)]
struct LogBuffer(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

impl std::io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[test]
fn runtime_failures_are_logged_before_returning() {
    let fx = people();
    let mapper = Mapper::new(fx.types.clone());
    mapper
        .configure(fx.address, fx.address, |m| {
            m.constructor(|| Value::Null);
            Ok(())
        })
        .unwrap();

    let logs = LogBuffer::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();

    let err = tracing::subscriber::with_default(subscriber, || {
        let existing = fx.person("Bob", Value::Null);
        mapper
            .map_into(&fx.person("Ada", fx.address("Oslo")), &existing)
            .unwrap_err()
    });

    assert!(matches!(err, MapError::Allocation { ref path, .. } if path == "Person.address"));
    let logs = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
    assert!(logs.contains("mapping failed"), "{logs}");
}

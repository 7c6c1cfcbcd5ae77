use super::*;
use crate::fixtures::shop;
use rayon::prelude::*;
use tyrel_model::ObjectRef;

#[test]
fn test_typed_getters() {
    let s = shop();
    let customer = s.customer_value("Ann");

    let name = s.resolver.build_accessor(s.customer, "Name").expect("builds");
    assert_eq!(name.value_type(), TypeId::STRING);
    assert!(name.can_read() && name.can_write());
    let get_name = name.getter::<String>().expect("string getter");
    assert_eq!(get_name(&customer).expect("reads"), "Ann");

    let count = s.resolver.build_accessor(s.customer, "Orders.Count").expect("builds");
    assert_eq!(count.getter::<i64>().expect("long getter")(&customer), Ok(2));

    let total = s.resolver.build_accessor(s.customer, "Orders[1].Total").expect("builds");
    assert_eq!(total.getter::<f64>().expect("double getter")(&customer), Ok(20.0));

    let city = s.resolver.build_accessor(s.customer, "Address.Format").expect("builds");
    assert_eq!(city.getter::<String>().expect("method getter")(&customer).expect("reads"), "Oslo 150");

    let address = s.resolver.build_accessor(s.customer, "Address").expect("builds");
    let get_address = address.getter::<ObjectRef>().expect("object getter");
    assert_eq!(get_address(&customer).expect("reads").type_id(), s.address);
}

#[test]
fn test_erased_getter_reads_weak_items() {
    let s = shop();
    let customer = s.customer_value("Ann");
    let item = s.resolver.build_accessor(s.customer, "Misc[1]").expect("builds");
    let get = item.erased_getter().expect("erased getter");
    assert!(matches!(get(&customer), Ok(Value::Str(ref x)) if &**x == "x"));

    // A weakly typed slot only converts at read time.
    let as_long = item.getter::<i64>().expect("object slot accepts any type");
    assert!(matches!(as_long(&customer), Err(AccessError::TypeMismatch { .. })));
}

#[test]
fn test_getter_type_is_checked_at_build() {
    let s = shop();
    let name = s.resolver.build_accessor(s.customer, "Name").expect("builds");
    assert!(matches!(
        name.getter::<i64>(),
        Err(AccessError::TypeMismatch { ref actual, .. }) if actual == "string"
    ));
    let id = s.resolver.build_accessor(s.customer, "Id").expect("builds");
    assert!(matches!(id.getter::<bool>(), Err(AccessError::TypeMismatch { .. })));
    let tags = s.resolver.build_accessor(s.customer, "Tags").expect("builds");
    assert!(matches!(tags.getter::<ObjectRef>(), Err(AccessError::TypeMismatch { .. })));
}

#[test]
fn test_setters() {
    let s = shop();
    let customer = s.customer_value("Ann");

    let name = s.resolver.build_accessor(s.customer, "Name").expect("builds");
    name.setter::<String>().expect("string setter")(&customer, "Bo".to_string()).expect("writes");
    assert_eq!(name.getter::<String>().expect("getter")(&customer).expect("reads"), "Bo");

    let tag = s.resolver.build_accessor(s.customer, "Tags[0]").expect("builds");
    tag.setter::<String>().expect("array setter")(&customer, "old".to_string()).expect("writes");
    assert_eq!(tag.getter::<String>().expect("getter")(&customer).expect("reads"), "old");

    let total = s.resolver.build_accessor(s.customer, "Orders[0].Total").expect("builds");
    total.setter::<f64>().expect("double setter")(&customer, 99.5).expect("writes");
    assert_eq!(total.getter::<f64>().expect("getter")(&customer), Ok(99.5));

    let zip = s.resolver.build_accessor(s.customer, "Address.Zip").expect("builds");
    zip.setter::<i64>().expect("property setter")(&customer, 4000).expect("writes");
    assert_eq!(zip.getter::<i64>().expect("getter")(&customer), Ok(4000));
}

#[test]
fn test_setter_rejections() {
    let s = shop();
    let id = s.resolver.build_accessor(s.customer, "Id").expect("builds");
    assert!(!id.can_write());
    assert!(matches!(id.setter::<i64>(), Err(AccessError::NotWritable(_))));

    let count = s.resolver.build_accessor(s.customer, "Orders.Count").expect("builds");
    assert!(matches!(count.setter::<i64>(), Err(AccessError::NotWritable(_))));

    let name = s.resolver.build_accessor(s.customer, "Name").expect("builds");
    assert!(matches!(name.setter::<i64>(), Err(AccessError::TypeMismatch { .. })));

    let zip = s.resolver.build_accessor(s.customer, "Address.Zip").expect("builds");
    assert!(matches!(zip.setter::<f64>(), Err(AccessError::TypeMismatch { .. })));
}

#[test]
fn test_erased_setter_does_not_check_values() {
    let s = shop();
    let customer = s.customer_value("Ann");
    let name = s.resolver.build_accessor(s.customer, "Name").expect("builds");
    name.erased_setter().expect("erased setter")(&customer, Value::Int(3)).expect("writes");
    assert!(matches!(name.erased_getter().expect("getter")(&customer), Ok(Value::Int(3))));
}

#[test]
fn test_write_only_property() {
    let s = shop();
    let customer = s.customer_value("Ann");
    let secret = s.resolver.build_accessor(s.customer, "Secret").expect("builds");
    assert!(!secret.can_read());
    assert!(secret.can_write());
    assert!(matches!(secret.getter::<String>(), Err(AccessError::NotReadable(_))));

    secret.setter::<String>().expect("setter")(&customer, "pw".to_string()).expect("writes");
    let stored = customer.as_object().expect("object").field("secret");
    assert!(matches!(stored, Value::Str(ref s) if &**s == "pw"));
}

#[test]
fn test_optional_getter_reads_null_as_none() {
    let s = shop();
    let customer = s.customer_value("Ann");
    let label = s.resolver.build_accessor(s.customer, "Address.Label").expect("builds");
    assert_eq!(label.getter::<Option<String>>().expect("getter")(&customer), Ok(None));
    let name = s.resolver.build_accessor(s.customer, "Name").expect("builds");
    assert_eq!(
        name.getter::<Option<String>>().expect("getter")(&customer),
        Ok(Some("Ann".to_string()))
    );
}

#[test]
fn test_static_accessors() {
    let s = shop();
    let count = s.resolver.build_static_accessor(s.customer, "Count").expect("builds");
    let get = count.static_getter::<i64>().expect("static getter");
    assert_eq!(get(), Ok(0));
    count.static_setter::<i64>().expect("static setter")(5).expect("writes");
    assert_eq!(get(), Ok(5));
    assert!(matches!(count.erased_static_getter().expect("erased")(), Ok(Value::Int(5))));

    let default_name = s.resolver.build_static_accessor(s.customer, "Default.Name").expect("builds");
    assert_eq!(
        default_name.static_getter::<String>().expect("getter")().expect("reads"),
        "Default"
    );
    default_name.erased_static_setter().expect("setter")(Value::from("Renamed")).expect("writes");
    assert!(matches!(s.default_customer.field("Name"), Value::Str(ref n) if &**n == "Renamed"));

    let default = s.resolver.build_static_accessor(s.customer, "Default").expect("builds");
    assert!(matches!(default.static_setter::<ObjectRef>(), Err(AccessError::NotWritable(_))));
}

#[test]
fn test_accessor_form_must_match_path() {
    let s = shop();
    let instance = s.resolver.build_accessor(s.customer, "Name").expect("builds");
    assert!(matches!(instance.static_getter::<String>(), Err(AccessError::InvalidPath { .. })));
    assert!(matches!(instance.static_setter::<String>(), Err(AccessError::InvalidPath { .. })));

    let stat = s.resolver.build_static_accessor(s.customer, "Count").expect("builds");
    assert!(matches!(stat.getter::<i64>(), Err(AccessError::InvalidPath { .. })));
    assert!(matches!(stat.setter::<i64>(), Err(AccessError::InvalidPath { .. })));
}

#[test]
fn test_getters_are_shared_across_threads() {
    let s = shop();
    let customers: Vec<Value> = (0..64).map(|i| s.customer_value(&format!("c{i}"))).collect();
    let get = s
        .resolver
        .build_accessor(s.customer, "Name")
        .expect("builds")
        .getter::<String>()
        .expect("getter");

    let names: Vec<String> = customers
        .par_iter()
        .map(|c| get(c).expect("reads"))
        .collect();
    let expected: Vec<String> = (0..64).map(|i| format!("c{i}")).collect();
    assert_eq!(names, expected);
}

use super::*;
use crate::fixtures::shop;
use tyrel_model::{HostObject, TypeDecl};

fn kinds(path: &ResolvedPath) -> Vec<StepKind> {
    path.steps().iter().map(AccessStep::kind).collect()
}

#[test]
fn test_resolve_member_chain() {
    let s = shop();
    let path = s.resolver.resolve(s.customer, "Address.City").expect("resolves");

    assert_eq!(path.root(), s.customer);
    assert_eq!(path.text(), "Address.City");
    assert_eq!(kinds(&path), vec![StepKind::Member, StepKind::Member]);
    assert_eq!(path.steps()[0].output_type(), s.address);
    assert_eq!(path.value_type(), TypeId::STRING);
    assert!(path.is_readable());
    assert!(path.is_writable());
}

#[test]
fn test_generic_members_are_rewritten() {
    let s = shop();

    let indexed = s.resolver.resolve(s.customer, "Orders[1].Total").expect("resolves");
    assert_eq!(kinds(&indexed), vec![StepKind::Member, StepKind::StrongIndex, StepKind::Member]);
    assert_eq!(indexed.steps()[0].output_type(), s.list_of_orders);
    assert_eq!(indexed.steps()[1].output_type(), s.order);
    assert_eq!(indexed.steps()[1].index(), Some(1));
    assert_eq!(indexed.value_type(), TypeId::DOUBLE);

    // Declared on List<T>, reached through a plain subclass of List<Order>.
    let first = s.resolver.resolve(s.customer, "Recent.First").expect("resolves");
    assert_eq!(first.value_type(), s.order);
    let element = s.resolver.resolve(s.order_list, "[0]").expect("resolves");
    assert_eq!(kinds(&element), vec![StepKind::StrongIndex]);
    assert_eq!(element.value_type(), s.order);

    let count = s.resolver.resolve(s.customer, "Recent.Count").expect("resolves");
    assert_eq!(count.value_type(), TypeId::LONG);
}

#[test]
fn test_weak_and_array_indexing() {
    let s = shop();
    let weak = s.resolver.resolve(s.customer, "Misc[0]").expect("resolves");
    assert_eq!(kinds(&weak), vec![StepKind::Member, StepKind::WeakIndex]);
    assert_eq!(weak.value_type(), TypeId::OBJECT);

    let array = s.resolver.resolve(s.customer, "Tags[1]").expect("resolves");
    assert_eq!(array.steps()[0].output_type(), s.string_array);
    assert_eq!(kinds(&array), vec![StepKind::Member, StepKind::StrongIndex]);
    assert_eq!(array.value_type(), TypeId::STRING);
}

#[test]
fn test_resolution_errors() {
    let s = shop();
    let cases: Vec<(&str, fn(&AccessError) -> bool)> = vec![
        ("Missing", |e| matches!(e, AccessError::MemberNotFound { .. })),
        ("Address.Missing", |e| matches!(e, AccessError::MemberNotFound { .. })),
        ("Name[0]", |e| matches!(e, AccessError::NotIndexable(_))),
        ("Address[0]", |e| matches!(e, AccessError::NotIndexable(_))),
        ("Count", |e| matches!(e, AccessError::MemberNotFound { .. })),
        ("Secret.Length", |e| matches!(e, AccessError::NotReadable(_))),
        ("Greet.Length", |e| matches!(e, AccessError::NotReadable(_))),
        ("Orders..Count", |e| matches!(e, AccessError::InvalidPath { .. })),
    ];
    for (path, check) in cases {
        let err = s.resolver.resolve(s.customer, path).unwrap_err();
        assert!(check(&err), "{path}: {err}");
    }
    assert_eq!(s.resolver.cached_paths(), 0);
}

#[test]
fn test_static_resolution() {
    let s = shop();
    let count = s.resolver.resolve_static(s.customer, "Count").expect("resolves");
    assert!(count.is_static());
    assert!(count.steps()[0].is_static());
    assert_eq!(count.value_type(), TypeId::LONG);

    let name = s.resolver.resolve_static(s.customer, "Default.Address.City").expect("resolves");
    assert_eq!(name.value_type(), TypeId::STRING);

    assert!(matches!(
        s.resolver.resolve_static(s.customer, "Name"),
        Err(AccessError::MemberNotFound { kind: "static", .. })
    ));
    assert!(matches!(
        s.resolver.resolve_static(s.list_of_orders, "[0]"),
        Err(AccessError::InvalidPath { .. })
    ));
}

#[test]
fn test_paths_are_cached_until_generation_moves() {
    let s = shop();
    let first = s.resolver.resolve(s.customer, "Address.City").expect("resolves");
    let second = s.resolver.resolve(s.customer, "Address.City").expect("resolves");
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(s.resolver.cached_paths(), 1);

    // Static and instance resolutions of the same text are distinct entries.
    s.resolver.resolve_static(s.customer, "Count").expect("resolves");
    assert_eq!(s.resolver.cached_paths(), 2);

    s.store.declare(TypeDecl::class("Invoice"));
    let third = s.resolver.resolve(s.customer, "Address.City").expect("resolves");
    assert!(!Arc::ptr_eq(&first, &third));
    assert_eq!(s.resolver.cached_paths(), 1);

    s.resolver.clear_cache();
    assert_eq!(s.resolver.cached_paths(), 0);
}

#[test]
fn test_steps_compile_on_first_use() {
    let s = shop();
    let customer = s.customer_value("Ann");
    let path = s.resolver.resolve(s.customer, "Orders[1].Total").expect("resolves");
    assert!(path.steps().iter().all(|step| !step.is_compiled()));

    let total = path.get(Some(&customer)).expect("reads");
    assert!(matches!(total, Value::Float(t) if t == 20.0));
    assert!(path.steps().iter().all(AccessStep::is_compiled));

    let again = path.get(Some(&customer)).expect("reads");
    assert!(again.same_as(&total));
}

#[test]
fn test_evaluation_failures() {
    let s = shop();
    let bare = Value::Object(HostObject::new(s.customer));

    let city = s.resolver.resolve(s.customer, "Address.City").expect("resolves");
    assert!(matches!(city.get(Some(&bare)), Err(AccessError::NullTarget(_))));
    assert!(matches!(city.get(None), Err(AccessError::NullTarget(_))));

    let customer = s.customer_value("Ann");
    let missing = s.resolver.resolve(s.customer, "Orders[5].Total").expect("resolves");
    assert_eq!(
        missing.get(Some(&customer)).unwrap_err(),
        AccessError::IndexOutOfRange { index: 5, len: 2 }
    );
    let tag = s.resolver.resolve(s.customer, "Tags[2]").expect("resolves");
    assert_eq!(
        tag.get(Some(&customer)).unwrap_err(),
        AccessError::IndexOutOfRange { index: 2, len: 2 }
    );
}

#[test]
fn test_set_through_path() {
    let s = shop();
    let customer = s.customer_value("Ann");
    let zip = s.resolver.resolve(s.customer, "Address.Zip").expect("resolves");
    zip.set(Some(&customer), Value::Int(9000)).expect("writes");
    assert!(matches!(zip.get(Some(&customer)), Ok(Value::Int(9000))));

    let id = s.resolver.resolve(s.customer, "Id").expect("resolves");
    assert!(!id.is_writable());
    assert!(matches!(
        id.set(Some(&customer), Value::Int(1)),
        Err(AccessError::NotWritable(_))
    ));
}

use super::*;
use crate::fixtures::universe;
use tyrel_model::{SpecialConstraints, TypeDecl};

#[test]
fn test_collect_parameters_depth_first_distinct() {
    let u = universe();
    let map = u.store.declare(TypeDecl::class("Map").with_params(&["K", "V"]));
    let k = u.param(map, 0);
    let v = u.param(map, 1);
    let list_k = u.make(u.list, &[k]);
    let open = u.make(u.pair, &[u.array(v, 1), list_k]);

    let mut params = IndexSet::new();
    collect_generic_parameters(u.factory.model(), open, &mut params);
    assert_eq!(params.into_iter().collect::<Vec<_>>(), vec![v, k]);

    let twice = u.make(u.pair, &[k, list_k]);
    let mut params = IndexSet::new();
    collect_generic_parameters(u.factory.model(), twice, &mut params);
    assert_eq!(params.len(), 1);
}

#[test]
fn test_parameter_paths() {
    let u = universe();
    let map = u.store.declare(TypeDecl::class("Map").with_params(&["K", "V"]));
    let k = u.param(map, 0);
    let v = u.param(map, 1);
    let open = u.make(u.pair, &[u.array(v, 1), u.make(u.list, &[k])]);
    let model = u.factory.model();

    let k_paths = parameter_paths(model, open, k);
    assert_eq!(k_paths.len(), 1);
    assert_eq!(k_paths[0].constraint, open);
    assert_eq!(
        k_paths[0].steps.as_slice(),
        &[PathStep::Argument(1), PathStep::Argument(0)]
    );

    let v_paths = parameter_paths(model, open, v);
    assert_eq!(v_paths[0].steps.as_slice(), &[PathStep::Argument(0), PathStep::Element]);

    let self_path = parameter_paths(model, k, k);
    assert_eq!(self_path.len(), 1);
    assert!(self_path[0].steps.is_empty());
}

#[test]
fn test_parameter_paths_multiple_occurrences() {
    let u = universe();
    let map = u.store.declare(TypeDecl::class("Map").with_params(&["K"]));
    let k = u.param(map, 0);
    let open = u.make(u.pair, &[k, u.make(u.list, &[k])]);

    let paths = parameter_paths(u.factory.model(), open, k);
    assert_eq!(paths.len(), 2);
    assert_eq!(paths[0].steps.as_slice(), &[PathStep::Argument(0)]);
    assert_eq!(
        paths[1].steps.as_slice(),
        &[PathStep::Argument(1), PathStep::Argument(0)]
    );
}

#[test]
fn test_sibling_references_exclude_self_and_foreign() {
    let u = universe();
    let sorted = u.store.declare(TypeDecl::class("Sorted").with_params(&["T", "U"]));
    let t = u.param(sorted, 0);
    let uu = u.param(sorted, 1);
    let foreign = u.param(u.list, 0);
    let constraints = vec![
        u.make(u.icomparable, &[t]),
        u.make(u.icontainer, &[uu]),
        u.make(u.ienumerable, &[foreign]),
    ];
    u.store
        .set_constraints(t, SpecialConstraints::empty(), constraints.clone())
        .expect("constraints");

    let refs = sibling_references(u.factory.model(), t, sorted, &constraints);
    assert_eq!(refs.into_iter().collect::<Vec<_>>(), vec![uu]);
}

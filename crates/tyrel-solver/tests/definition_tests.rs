use super::*;
use crate::fixtures::{Universe, universe};
use tyrel_common::AnalyzerOptions;
use tyrel_model::TypeDecl;

/// `Chain<A, B, C> where B : IContainer<A>, C : IContainer<B>`
fn chain(u: &Universe) -> TypeId {
    let chain = u.store.declare(TypeDecl::class("Chain").with_params(&["A", "B", "C"]));
    let a = u.param(chain, 0);
    let b = u.param(chain, 1);
    let c = u.param(chain, 2);
    u.store
        .set_constraints(b, SpecialConstraints::empty(), vec![u.make(u.icontainer, &[a])])
        .expect("constraints");
    u.store
        .set_constraints(c, SpecialConstraints::empty(), vec![u.make(u.icontainer, &[b])])
        .expect("constraints");
    chain
}

#[test]
fn test_parameter_accessors() {
    let u = universe();
    let pair = u.factory.definition_analyzer(u.pair).expect("analyzer");

    assert_eq!(pair.definition(), u.pair);
    assert_eq!(pair.arity(), 2);
    assert_eq!(pair.parameter_types(), vec![u.param(u.pair, 0), u.param(u.pair, 1)]);
    assert_eq!(pair.parameter_by_name("TValue").map(|p| p.position()), Some(1));
    assert!(pair.parameter_by_name("TMissing").is_none());
    assert!(pair.parameter(2).is_none());
    assert_eq!(
        pair.parameters().map(|p| p.name().to_string()).collect::<Vec<_>>(),
        vec!["TKey", "TValue"]
    );
}

#[test]
fn test_non_definition_is_rejected() {
    let u = universe();
    let list_int = u.make(u.list, &[TypeId::INT]);
    assert!(matches!(
        u.factory.definition_analyzer(list_int),
        Err(AnalysisError::InvalidArgument(_))
    ));
}

#[test]
fn test_validate_type_arguments() {
    let u = universe();
    let pair = u.factory.definition_analyzer(u.pair).expect("analyzer");
    let list_int = u.make(u.list, &[TypeId::INT]);
    let list_string = u.make(u.list, &[TypeId::STRING]);

    assert_eq!(pair.validate_type_arguments(&[TypeId::INT, list_int]), Ok(true));
    assert_eq!(pair.validate_type_arguments(&[TypeId::INT, u.int_list]), Ok(true));
    assert_eq!(pair.validate_type_arguments(&[TypeId::INT, list_string]), Ok(false));
    assert_eq!(pair.validate_type_arguments(&[TypeId::STRING, u.dog]), Ok(false));
    assert!(matches!(
        pair.validate_type_arguments(&[TypeId::INT]),
        Err(AnalysisError::InvalidArgument(_))
    ));

    // The definition's own parameters satisfy its constraints.
    assert_eq!(pair.validate_type_arguments(&pair.parameter_types()), Ok(true));

    assert!(pair.satisfies_constraints_for_construction(&[TypeId::INT, list_int]));
    assert!(!pair.satisfies_constraints_for_construction(&[TypeId::INT]));
}

#[test]
fn test_make_generic_type_validates() {
    let u = universe();
    let pair = u.factory.definition_analyzer(u.pair).expect("analyzer");
    let list_int = u.make(u.list, &[TypeId::INT]);

    let built = pair.make_generic_type(&[TypeId::INT, list_int]).expect("valid");
    assert_eq!(built, u.make(u.pair, &[TypeId::INT, list_int]));
    assert_eq!(u.name(built), "Pair<int, List<int>>");

    let err = pair.make_generic_type(&[TypeId::INT, u.dog]).unwrap_err();
    assert_eq!(
        err,
        AnalysisError::ConstraintViolation {
            parameter: "TValue".to_string(),
            candidate: "Dog".to_string(),
        }
    );
}

#[test]
fn test_make_generic_type_without_validation() {
    let u = universe();
    let factory = AnalyzerFactory::with_options(
        u.store.clone(),
        AnalyzerOptions::default().with_validate_on_construct(false),
    );
    let pair = factory.definition_analyzer(u.pair).expect("analyzer");
    let built = pair.make_generic_type(&[TypeId::INT, u.dog]).expect("unchecked");
    assert_eq!(u.name(built), "Pair<int, Dog>");
}

#[test]
fn test_infer_pair_key_from_value() {
    let u = universe();
    let pair = u.factory.definition_analyzer(u.pair).expect("analyzer");
    let tkey = u.param(u.pair, 0);
    let tvalue = u.param(u.pair, 1);
    let lc_int = u.make(u.list_container, &[TypeId::INT]);

    let outcome = pair.try_infer_type_arguments(&[tkey, lc_int]).expect("inference");
    assert!(outcome.changed);
    assert_eq!(outcome.arguments.types().as_slice(), &[TypeId::INT, lc_int]);
    assert!(outcome.arguments.is_fully_bound());

    // Nothing flows from TKey to TValue.
    let outcome = pair.try_infer_type_arguments(&[TypeId::INT, tvalue]).expect("inference");
    assert!(!outcome.changed);
    assert_eq!(outcome.arguments.unbound_parameters().as_slice(), &[tvalue]);

    let outcome = pair.try_infer_type_arguments(&[tkey, tvalue]).expect("inference");
    assert!(!outcome.changed);
    assert!(outcome.arguments.is_fully_unbound());
}

#[test]
fn test_infer_fully_bound_is_unchanged() {
    let u = universe();
    let pair = u.factory.definition_analyzer(u.pair).expect("analyzer");
    let list_int = u.make(u.list, &[TypeId::INT]);

    let outcome = pair.try_infer_type_arguments(&[TypeId::INT, list_int]).expect("inference");
    assert!(!outcome.changed);
    assert_eq!(outcome.arguments.types().as_slice(), &[TypeId::INT, list_int]);
    assert!(pair.try_infer_type_arguments(&[TypeId::INT]).is_err());
}

#[test]
fn test_infer_chain_across_passes() {
    let u = universe();
    let chain_def = chain(&u);
    let [a, b, _] = [0, 1, 2].map(|i| u.param(chain_def, i));
    let list_int = u.make(u.list, &[TypeId::INT]);
    let nested = u.make(u.list, &[list_int]);

    let chain = u.factory.definition_analyzer(chain_def).expect("analyzer");
    let outcome = chain.try_infer_type_arguments(&[a, b, nested]).expect("inference");
    assert!(outcome.changed);
    assert_eq!(outcome.arguments.types().as_slice(), &[TypeId::INT, list_int, nested]);

    let again = chain
        .try_infer_type_arguments(&outcome.arguments.types())
        .expect("inference");
    assert!(!again.changed);
    assert_eq!(again.arguments, outcome.arguments);
}

#[test]
fn test_infer_respects_pass_limit() {
    let u = universe();
    let chain_def = chain(&u);
    let [a, b, _] = [0, 1, 2].map(|i| u.param(chain_def, i));
    let list_int = u.make(u.list, &[TypeId::INT]);
    let nested = u.make(u.list, &[list_int]);

    let factory = AnalyzerFactory::with_options(
        u.store.clone(),
        AnalyzerOptions::default().with_max_inference_passes(1),
    );
    let chain = factory.definition_analyzer(chain_def).expect("analyzer");
    let outcome = chain.try_infer_type_arguments(&[a, b, nested]).expect("inference");
    assert!(outcome.changed);
    assert_eq!(outcome.arguments.types().as_slice(), &[a, list_int, nested]);
}

#[test]
fn test_mutual_dependency_terminates_unbound() {
    let u = universe();
    let cyc = u.store.declare(TypeDecl::class("Cyc").with_params(&["T", "U"]));
    let t = u.param(cyc, 0);
    let uu = u.param(cyc, 1);
    u.store
        .set_constraints(t, SpecialConstraints::empty(), vec![u.make(u.icontainer, &[uu])])
        .expect("constraints");
    u.store
        .set_constraints(uu, SpecialConstraints::empty(), vec![u.make(u.icontainer, &[t])])
        .expect("constraints");

    let analyzer = u.factory.definition_analyzer(cyc).expect("analyzer");
    let outcome = analyzer.try_infer_type_arguments(&[t, uu]).expect("inference");
    assert!(!outcome.changed);
    assert!(outcome.arguments.is_fully_unbound());

    let list_int = u.make(u.list, &[TypeId::INT]);
    let nested = u.make(u.list, &[list_int]);
    let outcome = analyzer.try_infer_type_arguments(&[t, nested]).expect("inference");
    assert_eq!(outcome.arguments.types().as_slice(), &[list_int, nested]);
}

#[test]
fn test_dependency_graph_serializes() {
    let u = universe();
    let pair = u.factory.definition_analyzer(u.pair).expect("analyzer");
    let graph = serde_json::to_value(pair.dependency_graph()).expect("json");

    assert_eq!(graph["definition"], "Pair<TKey, TValue>");
    assert_eq!(graph["parameters"][0]["name"], "TKey");
    assert_eq!(graph["parameters"][0]["referenced_by"], serde_json::json!(["TValue"]));
    assert_eq!(graph["parameters"][1]["position"], 1);
    assert_eq!(graph["parameters"][1]["constraints"], serde_json::json!(["IContainer<TKey>"]));
    assert_eq!(graph["parameters"][1]["references"], serde_json::json!(["TKey"]));
}

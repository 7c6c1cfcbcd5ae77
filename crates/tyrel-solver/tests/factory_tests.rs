use super::*;
use crate::fixtures::universe;
use crate::hierarchy::generic_arguments_relative_to;
use tyrel_model::TypeDecl;

#[test]
fn test_get_analyzer_dispatch() {
    let u = universe();
    let tkey = u.param(u.pair, 0);
    let list_int = u.make(u.list, &[TypeId::INT]);

    let cases = [
        (tkey, AnalyzerKind::Parameter),
        (u.pair, AnalyzerKind::Definition),
        (list_int, AnalyzerKind::OpenType),
        (u.int_list, AnalyzerKind::OpenType),
        (u.array(tkey, 1), AnalyzerKind::OpenType),
    ];
    for (ty, kind) in cases {
        let analyzer = u.factory.get_analyzer(ty).expect("classifies");
        assert_eq!(analyzer.kind(), kind, "{}", u.name(ty));
        assert_eq!(analyzer.analyzed_type(), ty);
    }

    let analyzer = u.factory.get_analyzer(u.pair).expect("definition");
    assert!(analyzer.as_definition().is_some());
    assert!(analyzer.as_parameter().is_none());
    assert!(analyzer.as_open_type().is_none());

    for ty in [u.dog, TypeId::INT, u.array(TypeId::INT, 1)] {
        assert!(
            matches!(u.factory.get_analyzer(ty), Err(AnalysisError::InvalidArgument(_))),
            "{}",
            u.name(ty)
        );
    }
}

#[test]
fn test_descriptors_are_cached() {
    let u = universe();
    let tkey = u.param(u.pair, 0);

    let first = u.factory.parameter_analyzer(tkey).expect("analyzer");
    let second = u.factory.parameter_analyzer(tkey).expect("analyzer");
    assert!(std::ptr::eq(first.descriptor(), second.descriptor()));

    // The definition reuses the parameter descriptors already cached.
    let pair = u.factory.definition_analyzer(u.pair).expect("analyzer");
    let from_definition = pair.parameter(0).expect("TKey");
    assert!(std::ptr::eq(first.descriptor(), from_definition.descriptor()));

    let stats = u.factory.cache_stats();
    assert_eq!(stats.parameters, 2);
    assert_eq!(stats.definitions, 1);
    assert!(stats.hits >= 2, "{stats:?}");
    assert!(stats.misses >= 3, "{stats:?}");
}

#[test]
fn test_refresh_clears_caches() {
    let u = universe();
    u.factory.get_analyzer(u.pair).expect("definition");
    u.factory.get_analyzer(u.int_list).expect("open type");
    let stats = u.factory.cache_stats();
    assert_eq!(stats.definitions, 1);
    assert_eq!(stats.open_types, 1);

    u.factory.refresh();
    let stats = u.factory.cache_stats();
    assert_eq!((stats.parameters, stats.definitions, stats.open_types), (0, 0, 0));
}

#[test]
fn test_generation_change_invalidates() {
    let u = universe();
    let tkey = u.param(u.pair, 0);
    let before = u.factory.parameter_analyzer(tkey).expect("analyzer");

    u.store.declare(TypeDecl::class("LateArrival"));
    let after = u.factory.parameter_analyzer(tkey).expect("analyzer");

    assert!(!std::ptr::eq(before.descriptor(), after.descriptor()));
    assert_eq!(u.factory.cache_stats().generation, u.store.generation());
    assert_eq!(u.factory.cache_stats().parameters, 1);
}

#[test]
fn test_generation_tracking_can_be_disabled() {
    let u = universe();
    let factory = AnalyzerFactory::with_options(
        u.store.clone(),
        AnalyzerOptions::default().with_track_generation(false),
    );
    let tkey = u.param(u.pair, 0);
    let before = factory.parameter_analyzer(tkey).expect("analyzer");

    u.store.declare(TypeDecl::class("LateArrival"));
    let after = factory.parameter_analyzer(tkey).expect("analyzer");
    assert!(std::ptr::eq(before.descriptor(), after.descriptor()));
}

#[test]
fn test_cache_stats_serialize() {
    let u = universe();
    u.factory.get_analyzer(u.pair).expect("definition");
    let json = serde_json::to_value(u.factory.cache_stats()).expect("json");
    assert_eq!(json["definitions"], 1);
    assert_eq!(json["parameters"], 2);
}

#[test]
fn test_queries_unchanged_under_query_trace_subscriber() {
    let u = universe();
    let list_int = u.make(u.list, &[TypeId::INT]);
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("tyrel::query_json=trace"))
        .with_test_writer()
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        assert_eq!(
            u.factory.get_analyzer(list_int).map(|analyzer| analyzer.kind()),
            Ok(AnalyzerKind::OpenType)
        );
        let open = u.factory.open_type_analyzer(list_int).expect("analyzer");
        assert!(open.is_implements_generic_definition(u.icontainer));
        assert_eq!(
            open.get_completed_generic_arguments(list_int, false)
                .map(|args| args.to_vec()),
            Ok(Vec::new())
        );
        assert!(matches!(
            u.factory.get_analyzer(TypeId::STRING),
            Err(AnalysisError::InvalidArgument(_))
        ));
    });
}

#[test]
fn test_closed_arrays_are_not_open_types() {
    let u = universe();
    let string_array = u.array(TypeId::STRING, 1);

    assert!(matches!(
        u.factory.get_analyzer(string_array),
        Err(AnalysisError::InvalidArgument(_))
    ));
    assert_eq!(
        generic_arguments_relative_to(u.factory.model(), string_array, u.ienumerable)
            .map(|args| args.to_vec()),
        Ok(vec![TypeId::STRING])
    );
}

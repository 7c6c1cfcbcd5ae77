use super::*;
use crate::fixtures::universe;

#[test]
fn test_classify_kinds() {
    let u = universe();
    let model = u.factory.model();
    let t = u.param(u.list, 0);
    let list_int = u.make(u.list, &[TypeId::INT]);

    assert_eq!(classify(model, t), Some(AnalyzerKind::Parameter));
    assert_eq!(classify(model, u.pair), Some(AnalyzerKind::Definition));
    assert_eq!(classify(model, list_int), Some(AnalyzerKind::OpenType));
    assert_eq!(classify(model, u.int_list), Some(AnalyzerKind::OpenType));
    assert_eq!(classify(model, u.array(t, 1)), Some(AnalyzerKind::OpenType));
    assert_eq!(classify(model, u.array(list_int, 1)), Some(AnalyzerKind::OpenType));
    assert_eq!(classify(model, u.dog), None);
    assert_eq!(classify(model, TypeId::INT), None);
    assert_eq!(classify(model, u.array(TypeId::INT, 1)), None);
}

#[test]
fn test_open_shapes() {
    let u = universe();
    let model = u.factory.model();
    let t = u.param(u.list, 0);
    let list_int = u.make(u.list, &[TypeId::INT]);

    assert_eq!(open_shape(model, t), Some(OpenShape::Parameter(t)));
    assert_eq!(
        open_shape(model, list_int),
        Some(OpenShape::Generic {
            definition: u.list,
            effective: list_int
        })
    );
    assert_eq!(
        open_shape(model, u.int_list),
        Some(OpenShape::Generic {
            definition: u.list,
            effective: list_int
        })
    );
    assert_eq!(
        open_shape(model, u.array(t, 2)),
        Some(OpenShape::Array { element: t, rank: 2 })
    );
    assert_eq!(
        open_shape(model, u.list),
        Some(OpenShape::Generic {
            definition: u.list,
            effective: u.list
        })
    );
}

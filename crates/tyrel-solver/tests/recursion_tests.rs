use super::*;

#[test]
fn test_enter_leave_tracks_depth() {
    let mut guard: RecursionGuard<u32> = RecursionGuard::new(4, 100);
    assert_eq!(guard.enter(1), RecursionResult::Entered);
    assert_eq!(guard.enter(2), RecursionResult::Entered);
    assert_eq!(guard.depth(), 2);
    assert!(guard.is_visiting(&1));

    guard.leave(2);
    guard.leave(1);
    assert_eq!(guard.depth(), 0);
    assert_eq!(guard.iterations(), 2);
    assert!(!guard.is_exceeded());
}

#[test]
fn test_cycle_detected() {
    let mut guard: RecursionGuard<u32> = RecursionGuard::new(4, 100);
    assert!(guard.enter(7).is_entered());
    assert!(guard.enter(7).is_cycle());
    guard.leave(7);
    // A cycle is not a limit violation.
    assert!(!guard.is_exceeded());
}

#[test]
fn test_depth_exceeded_is_sticky() {
    let mut guard: RecursionGuard<u32> = RecursionGuard::new(2, 100);
    assert!(guard.enter(1).is_entered());
    assert!(guard.enter(2).is_entered());
    assert_eq!(guard.enter(3), RecursionResult::DepthExceeded);
    guard.leave(2);
    guard.leave(1);
    assert!(guard.is_exceeded());
}

#[test]
fn test_iteration_limit() {
    let mut guard: RecursionGuard<u32> = RecursionGuard::new(10, 3);
    for key in 0..3 {
        assert!(guard.enter(key).is_entered());
        guard.leave(key);
    }
    assert!(guard.enter(99).is_exceeded());
}

#[test]
fn test_scope_returns_value_and_leaves() {
    let mut guard: RecursionGuard<u32> = RecursionGuard::with_profile(RecursionProfile::TypeTree);
    let result = guard.scope(1, |guard| {
        assert!(guard.enter(1).is_cycle());
        guard.depth()
    });
    assert_eq!(result, Ok(1));
    assert_eq!(guard.depth(), 0);
}

#[test]
fn test_profiles_use_shared_limits() {
    use tyrel_common::limits::{MAX_CONSTRAINT_DEPTH, MAX_HIERARCHY_DEPTH};
    assert_eq!(RecursionProfile::Assignability.max_depth(), MAX_CONSTRAINT_DEPTH);
    assert_eq!(RecursionProfile::TypeTree.max_depth(), MAX_HIERARCHY_DEPTH);
    let custom = RecursionProfile::Custom {
        max_depth: 3,
        max_iterations: 9,
    };
    assert_eq!((custom.max_depth(), custom.max_iterations()), (3, 9));
}

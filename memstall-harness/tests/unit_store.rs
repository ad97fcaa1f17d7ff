use memstall_harness::store::{AnchorRegistry, EphemeralStore};

#[test]
fn test_grow_adds_batch() {
    let mut store = EphemeralStore::new();
    let mut registry = AnchorRegistry::new();
    store.grow(&mut registry, 10);
    assert_eq!(store.len(), 10);
    assert_eq!(registry.len(), 10);
}

#[test]
fn test_growth_is_monotonic_and_additive() {
    let mut store = EphemeralStore::new();
    let mut registry = AnchorRegistry::new();
    for k in 1..=3 {
        store.grow(&mut registry, 5);
        assert_eq!(store.len(), k * 5);
    }
    assert_eq!(registry.len(), 15);
}

#[test]
fn test_grow_zero_is_a_no_op() {
    let mut store = EphemeralStore::new();
    let mut registry = AnchorRegistry::new();
    store.grow(&mut registry, 0);
    assert!(store.is_empty());
    assert!(registry.is_empty());
}

#[test]
fn test_companions_die_with_their_anchors() {
    let mut store = EphemeralStore::new();
    let mut keep = AnchorRegistry::new();
    store.grow(&mut keep, 3);

    {
        let mut transient = AnchorRegistry::new();
        store.grow(&mut transient, 2);
        assert_eq!(store.len(), 5);
        // every anchor is still reachable through a registry
        assert_eq!(store.sweep(), 0);
        assert_eq!(store.len(), 5);
    }

    // the transient registry released its anchors; only their entries go
    assert_eq!(store.sweep(), 2);
    assert_eq!(store.len(), 3);
}

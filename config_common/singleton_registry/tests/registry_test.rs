use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Barrier};
use std::thread;

use singleton_registry::{global, SingletonRegistry};

#[derive(Debug)]
struct Settings {
    name: String,
}

#[derive(Debug)]
struct Other(u8);

/// Test that repeated requests without a reset return the same instance
#[test]
fn test_get_or_create_reuses_instance() {
    let registry = SingletonRegistry::new();
    let first = registry.get_or_create(|| Settings { name: "first".to_string() });
    let second = registry.get_or_create(|| Settings { name: "second".to_string() });

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(second.name, "first");
    assert_eq!(registry.len(), 1);
}

/// Test that the factory only runs for an absent slot
#[test]
fn test_factory_runs_once() {
    let registry = SingletonRegistry::new();
    let calls = AtomicUsize::new(0);
    for _ in 0..5 {
        registry.get_or_create(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            Other(7)
        });
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

/// Test that different types occupy different slots
#[test]
fn test_types_have_independent_slots() {
    let registry = SingletonRegistry::new();
    registry.get_or_create(|| Settings { name: "a".to_string() });
    registry.get_or_create(|| Other(1));

    assert!(registry.contains::<Settings>());
    assert!(registry.contains::<Other>());
    assert!(!registry.contains::<String>());
    assert_eq!(registry.len(), 2);
}

/// Test that reset_all clears every slot and the next request builds a new instance
#[test]
fn test_reset_all_builds_fresh_instance() {
    let registry = SingletonRegistry::new();
    let old = registry.get_or_create(|| Settings { name: "old".to_string() });
    registry.get_or_create(|| Other(1));

    registry.reset_all();
    assert!(registry.is_empty());

    let new = registry.get_or_create(|| Settings { name: "new".to_string() });
    assert!(!Arc::ptr_eq(&old, &new));
    // The previous holder keeps its instance
    assert_eq!(old.name, "old");
    assert_eq!(new.name, "new");
}

/// Test that reset only clears the requested type
#[test]
fn test_reset_single_type() {
    let registry = SingletonRegistry::new();
    registry.get_or_create(|| Settings { name: "a".to_string() });
    let other = registry.get_or_create(|| Other(3));

    assert!(registry.reset::<Settings>());
    assert!(!registry.reset::<Settings>());
    assert!(!registry.contains::<Settings>());

    let same_other = registry.get::<Other>().unwrap();
    assert!(Arc::ptr_eq(&other, &same_other));
}

/// Test that a failing factory leaves the slot absent and propagates its error unchanged
#[test]
fn test_try_create_propagates_factory_error() {
    let registry = SingletonRegistry::new();
    let result = registry.get_or_try_create::<Settings, String, _>(|| Err("boom".to_string()));
    assert_eq!(result.unwrap_err(), "boom");
    assert!(!registry.contains::<Settings>());

    let created = registry
        .get_or_try_create::<Settings, String, _>(|| Ok(Settings { name: "ok".to_string() }))
        .unwrap();
    assert_eq!(created.name, "ok");
}

/// Test that get never constructs
#[test]
fn test_get_does_not_construct() {
    let registry = SingletonRegistry::new();
    assert!(registry.get::<Settings>().is_none());
    assert!(registry.is_empty());
}

/// Test that concurrent first requests agree on one instance
#[test]
fn test_concurrent_construction_yields_one_instance() {
    let registry = Arc::new(SingletonRegistry::new());
    let calls = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let registry = Arc::clone(&registry);
            let calls = Arc::clone(&calls);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                registry.get_or_create(|| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Settings { name: format!("thread-{}", i) }
                })
            })
        })
        .collect();

    let instances: Vec<Arc<Settings>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(instances.iter().all(|instance| Arc::ptr_eq(instance, &instances[0])));
}

/// Test that a factory can request a singleton of another type
#[test]
fn test_factory_may_request_other_type() {
    let registry = SingletonRegistry::new();
    let settings = registry.get_or_create(|| {
        let other = registry.get_or_create(|| Other(9));
        Settings { name: format!("other-{}", other.0) }
    });

    assert_eq!(settings.name, "other-9");
    assert_eq!(registry.len(), 2);
}

/// Test that a factory still running does not block requests for other types
#[test]
fn test_slow_factory_does_not_block_other_types() {
    let registry = Arc::new(SingletonRegistry::new());
    let (started_tx, started_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel::<()>();

    let slow = {
        let registry = Arc::clone(&registry);
        thread::spawn(move || {
            registry.get_or_create(|| {
                started_tx.send(()).unwrap();
                release_rx.recv().unwrap();
                Settings { name: "slow".to_string() }
            })
        })
    };

    started_rx.recv().unwrap();
    let other = registry.get_or_create(|| Other(4));
    assert_eq!(other.0, 4);
    assert!(!registry.contains::<Settings>());

    release_tx.send(()).unwrap();
    let settings = slow.join().unwrap();
    assert_eq!(settings.name, "slow");
    assert!(Arc::ptr_eq(&settings, &registry.get::<Settings>().unwrap()));
}

/// Test the process-wide registry with a type private to this test
#[test]
fn test_global_registry_identity() {
    struct GlobalOnly;

    let first = global().get_or_create(|| GlobalOnly);
    let second = global().get_or_create(|| GlobalOnly);
    assert!(Arc::ptr_eq(&first, &second));

    assert!(global().reset::<GlobalOnly>());
    let third = global().get_or_create(|| GlobalOnly);
    assert!(!Arc::ptr_eq(&first, &third));
}

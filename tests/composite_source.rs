//! Composite endpoint data source: ordering, caching and change propagation.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Mutex};
use std::thread;
use std::time::Duration;

use endpoint_routing::{
    on_change, ChangeToken, ChangeTokenSource, CompositeEndpointDataSource, DefaultEndpointDataSource,
    DynamicEndpointDataSource, EndpointDataSource, EndpointSnapshot,
};

mod common;
use common::{endpoint, names, ManualSource};

#[test]
fn test_empty_composite_yields_no_endpoints() {
    let composite = CompositeEndpointDataSource::new();
    assert!(composite.endpoints().unwrap().is_empty());
}

#[test]
fn test_single_source_preserves_identity() {
    let e1 = endpoint("e1");
    let composite = CompositeEndpointDataSource::with_sources([
        Arc::new(DefaultEndpointDataSource::new([e1.clone()])) as Arc<dyn EndpointDataSource>,
    ]);

    let endpoints = composite.endpoints().unwrap();
    assert_eq!(endpoints.len(), 1);
    assert!(Arc::ptr_eq(&endpoints[0], &e1));
}

#[test]
fn test_concatenation_follows_registration_order() {
    let composite = CompositeEndpointDataSource::new();
    composite.add_source(ManualSource::new("s1", vec![endpoint("a")]));
    composite.add_source(ManualSource::new("s2", vec![endpoint("b")]));
    assert_eq!(names(&composite.endpoints().unwrap()), vec!["a", "b"]);

    let reversed = CompositeEndpointDataSource::new();
    reversed.add_source(ManualSource::new("s2", vec![endpoint("b")]));
    reversed.add_source(ManualSource::new("s1", vec![endpoint("a")]));
    assert_eq!(names(&reversed.endpoints().unwrap()), vec!["b", "a"]);
}

#[test]
fn test_mutation_is_invisible_until_fired() {
    let s1 = ManualSource::new("s1", vec![endpoint("a")]);
    let s2 = ManualSource::new("s2", vec![endpoint("b")]);
    let composite = CompositeEndpointDataSource::new();
    composite.add_source(s1.clone());
    composite.add_source(s2.clone());
    assert_eq!(names(&composite.endpoints().unwrap()), vec!["a", "b"]);

    let outward = composite.change_token();
    s1.set_endpoints(vec![endpoint("a"), endpoint("a2")]);
    assert_eq!(names(&composite.endpoints().unwrap()), vec!["a", "b"]);
    assert!(!outward.has_changed());

    s1.fire();
    assert!(outward.has_changed());
    assert_eq!(names(&composite.endpoints().unwrap()), vec!["a", "a2", "b"]);
}

#[test]
fn test_keeps_observing_after_each_fire() {
    let s1 = ManualSource::new("s1", vec![]);
    let composite = CompositeEndpointDataSource::new();
    composite.add_source(s1.clone());

    for round in 1..=5 {
        let outward = composite.change_token();
        s1.set_endpoints((0..round).map(|i| endpoint(&format!("e{i}"))).collect());
        s1.fire();
        assert!(outward.has_changed(), "round {round} was not observed");
        assert_eq!(composite.endpoints().unwrap().len(), round);
    }
}

#[test]
fn test_outward_token_fires_once_per_generation() {
    let s1 = ManualSource::new("s1", vec![]);
    let composite = CompositeEndpointDataSource::new();
    composite.add_source(s1.clone());

    let fired = Arc::new(AtomicUsize::new(0));
    let counter = fired.clone();
    let _registration = composite.change_token().register_callback(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    s1.fire();
    s1.fire();
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

#[test]
fn test_add_and_remove_notify_observers() {
    let composite = CompositeEndpointDataSource::new();
    let fired = Arc::new(AtomicUsize::new(0));
    let counter = fired.clone();
    let watched = composite.clone();
    let _subscription = on_change(
        move || watched.change_token(),
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
        },
    );

    let module = Arc::new(DynamicEndpointDataSource::new("module"));
    composite.add_source(module.clone());
    assert_eq!(fired.load(Ordering::SeqCst), 1);

    module.push(endpoint("m"));
    assert_eq!(fired.load(Ordering::SeqCst), 2);
    assert_eq!(names(&composite.endpoints().unwrap()), vec!["m"]);

    assert!(composite.remove_source(&module));
    assert_eq!(fired.load(Ordering::SeqCst), 3);
    assert!(composite.endpoints().unwrap().is_empty());
}

#[test]
fn test_nested_composites_propagate() {
    let inner_source = Arc::new(DynamicEndpointDataSource::new("inner"));
    let inner = CompositeEndpointDataSource::named("inner");
    inner.add_source(inner_source.clone());

    let outer = CompositeEndpointDataSource::named("outer");
    outer.add_source(Arc::new(DefaultEndpointDataSource::new([endpoint("first")])));
    outer.add_source(Arc::new(inner.clone()));
    assert_eq!(names(&outer.endpoints().unwrap()), vec!["first"]);

    let token = outer.change_token();
    inner_source.push(endpoint("nested"));
    assert!(token.has_changed());
    assert_eq!(names(&outer.endpoints().unwrap()), vec!["first", "nested"]);
}

/// Publishes a new list and fires its token from inside its first `endpoints()` call,
/// i.e. while the composite is in the middle of a rebuild.
struct ChangesDuringRead {
    reads: AtomicUsize,
    endpoints: Mutex<EndpointSnapshot>,
    token: Mutex<ChangeTokenSource>,
}

impl EndpointDataSource for ChangesDuringRead {
    fn endpoints(&self) -> endpoint_routing::Result<EndpointSnapshot> {
        let current = self.endpoints.lock().unwrap().clone();
        if self.reads.fetch_add(1, Ordering::SeqCst) == 0 {
            *self.endpoints.lock().unwrap() = Arc::new(vec![endpoint("new")]);
            let previous = std::mem::take(&mut *self.token.lock().unwrap());
            previous.trigger();
        }
        Ok(current)
    }

    fn change_token(&self) -> ChangeToken {
        self.token.lock().unwrap().token()
    }
}

#[test]
fn test_rebuild_raced_by_invalidation_is_not_cached() {
    let source = Arc::new(ChangesDuringRead {
        reads: AtomicUsize::new(0),
        endpoints: Mutex::new(Arc::new(vec![endpoint("old")])),
        token: Mutex::new(ChangeTokenSource::new()),
    });
    let composite = CompositeEndpointDataSource::new();
    composite.add_source(source.clone());
    let outward = composite.change_token();

    let first = composite.endpoints().unwrap();
    assert_eq!(names(&first), vec!["new"]);
    assert!(outward.has_changed());
    assert_eq!(source.reads.load(Ordering::SeqCst), 2);

    let second = composite.endpoints().unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(source.reads.load(Ordering::SeqCst), 2);
}

#[test]
fn test_concurrent_fires_coalesce_and_settle() {
    const SOURCES: usize = 8;
    const ROUNDS: usize = 50;

    let sources: Vec<Arc<DynamicEndpointDataSource>> = (0..SOURCES)
        .map(|i| Arc::new(DynamicEndpointDataSource::new(format!("s{i}"))))
        .collect();
    let composite = CompositeEndpointDataSource::new();
    for source in &sources {
        composite.add_source(source.clone());
    }

    let barrier = Arc::new(Barrier::new(SOURCES + 1));
    let writers: Vec<_> = sources
        .iter()
        .enumerate()
        .map(|(i, source)| {
            let (source, barrier) = (source.clone(), barrier.clone());
            thread::spawn(move || {
                barrier.wait();
                for round in 0..ROUNDS {
                    source.push(endpoint(&format!("s{i}-{round}")));
                }
            })
        })
        .collect();

    let reader = {
        let composite = composite.clone();
        let barrier = barrier.clone();
        thread::spawn(move || {
            barrier.wait();
            for _ in 0..200 {
                let snapshot = composite.endpoints().unwrap();
                assert!(snapshot.len() <= SOURCES * ROUNDS);
                thread::sleep(Duration::from_micros(50));
            }
        })
    };

    for writer in writers {
        writer.join().unwrap();
    }
    reader.join().unwrap();

    let snapshot = composite.endpoints().unwrap();
    assert_eq!(snapshot.len(), SOURCES * ROUNDS);

    // Per-source order survives and sources stay in registration order.
    let expected: Vec<String> = (0..SOURCES)
        .flat_map(|i| (0..ROUNDS).map(move |round| format!("s{i}-{round}")))
        .collect();
    assert_eq!(names(&snapshot), expected);

    // Every source is still observed after the burst.
    let token = composite.change_token();
    sources[3].push(endpoint("after"));
    assert!(token.has_changed());
    assert_eq!(composite.endpoints().unwrap().len(), SOURCES * ROUNDS + 1);
}

#[test]
fn test_failing_constituent_propagates_and_recovers() {
    struct Flaky {
        healthy: std::sync::atomic::AtomicBool,
        token: Mutex<ChangeTokenSource>,
    }

    impl EndpointDataSource for Flaky {
        fn endpoints(&self) -> endpoint_routing::Result<EndpointSnapshot> {
            if self.healthy.load(Ordering::SeqCst) {
                Ok(Arc::new(vec![endpoint("recovered")]))
            } else {
                Err(endpoint_routing::RoutingError::data_source("flaky", "not ready"))
            }
        }

        fn change_token(&self) -> ChangeToken {
            self.token.lock().unwrap().token()
        }
    }

    let flaky = Arc::new(Flaky {
        healthy: std::sync::atomic::AtomicBool::new(false),
        token: Mutex::new(Default::default()),
    });
    let composite = CompositeEndpointDataSource::new();
    composite.add_source(flaky.clone());

    assert!(composite.endpoints().is_err());
    assert!(composite.endpoints().is_err());

    flaky.healthy.store(true, Ordering::SeqCst);
    let previous = std::mem::take(&mut *flaky.token.lock().unwrap());
    previous.trigger();
    assert_eq!(names(&composite.endpoints().unwrap()), vec!["recovered"]);
}

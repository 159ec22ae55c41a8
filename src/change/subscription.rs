//! Re-subscribing change loops.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::change::token::{ChangeRegistration, ChangeToken};

trait Dispose: Send + Sync {
    fn dispose(&self);
}

struct ChangeLoop<P, C> {
    producer: P,
    consumer: C,
    disposed: AtomicBool,
    epoch: AtomicU64,
    /// Registration on the newest token armed so far, tagged with its epoch.
    armed: Mutex<(u64, Option<ChangeRegistration>)>,
}

impl<P, C> ChangeLoop<P, C>
where
    P: Fn() -> ChangeToken + Send + Sync + 'static,
    C: Fn() + Send + Sync + 'static,
{
    fn arm(self: &Arc<Self>) {
        if self.disposed.load(Ordering::Acquire) {
            return;
        }
        let epoch = self.epoch.fetch_add(1, Ordering::AcqRel) + 1;
        let token = (self.producer)();
        let weak = Arc::downgrade(self);
        let registration = token.register_callback(move || {
            if let Some(state) = weak.upgrade() {
                state.fire();
            }
        });

        // A fire on another thread (or an already-fired token) may have armed a newer
        // epoch while we were registering; only the newest registration is kept.
        let stale = {
            let mut armed = self.armed.lock().unwrap_or_else(PoisonError::into_inner);
            if armed.0 < epoch {
                std::mem::replace(&mut *armed, (epoch, Some(registration))).1
            } else {
                Some(registration)
            }
        };
        drop(stale);
    }

    fn fire(self: &Arc<Self>) {
        if self.disposed.load(Ordering::Acquire) {
            return;
        }
        (self.consumer)();
        self.arm();
    }
}

impl<P, C> Dispose for ChangeLoop<P, C>
where
    P: Send + Sync,
    C: Send + Sync,
{
    fn dispose(&self) {
        self.disposed.store(true, Ordering::Release);
        let registration = self
            .armed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .1
            .take();
        drop(registration);
    }
}

/// Keeps an [`on_change`] loop alive. Dropping it stops the loop.
#[must_use = "dropping the subscription stops change notifications"]
pub struct ChangeSubscription {
    inner: Option<Arc<dyn Dispose>>,
}

impl ChangeSubscription {
    pub fn dispose(mut self) {
        if let Some(inner) = self.inner.take() {
            inner.dispose();
        }
    }
}

impl Drop for ChangeSubscription {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.take() {
            inner.dispose();
        }
    }
}

impl std::fmt::Debug for ChangeSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeSubscription")
            .field("active", &self.inner.is_some())
            .finish()
    }
}

/// Call `consumer` every time the token produced by `producer` fires.
///
/// After each fire the loop asks `producer` for the next generation's token and
/// registers again.
pub fn on_change<P, C>(producer: P, consumer: C) -> ChangeSubscription
where
    P: Fn() -> ChangeToken + Send + Sync + 'static,
    C: Fn() + Send + Sync + 'static,
{
    let state = Arc::new(ChangeLoop {
        producer,
        consumer,
        disposed: AtomicBool::new(false),
        epoch: AtomicU64::new(0),
        armed: Mutex::new((0, None)),
    });
    state.arm();
    ChangeSubscription {
        inner: Some(state as Arc<dyn Dispose>),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::token::ChangeTokenSource;
    use std::sync::atomic::AtomicUsize;

    /// Rotating producer: firing swaps in a fresh generation.
    #[derive(Clone, Default)]
    struct Rotating {
        current: Arc<Mutex<Arc<ChangeTokenSource>>>,
    }

    impl Rotating {
        fn token(&self) -> ChangeToken {
            self.current.lock().unwrap().token()
        }

        fn fire(&self) {
            let old = std::mem::take(&mut *self.current.lock().unwrap());
            old.trigger();
        }
    }

    #[test]
    fn test_follows_generations() {
        let producer = Rotating::default();
        let count = Arc::new(AtomicUsize::new(0));

        let p = producer.clone();
        let c = count.clone();
        let _subscription = on_change(move || p.token(), move || {
            c.fetch_add(1, Ordering::SeqCst);
        });

        producer.fire();
        producer.fire();
        producer.fire();
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_dispose_stops_loop() {
        let producer = Rotating::default();
        let count = Arc::new(AtomicUsize::new(0));

        let p = producer.clone();
        let c = count.clone();
        let subscription = on_change(move || p.token(), move || {
            c.fetch_add(1, Ordering::SeqCst);
        });

        producer.fire();
        subscription.dispose();
        producer.fire();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_concurrent_fires_keep_loop_armed() {
        let producer = Rotating::default();
        let count = Arc::new(AtomicUsize::new(0));

        let p = producer.clone();
        let c = count.clone();
        let _subscription = on_change(move || p.token(), move || {
            c.fetch_add(1, Ordering::SeqCst);
        });

        let threads: Vec<_> = (0..8)
            .map(|_| {
                let producer = producer.clone();
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        producer.fire();
                    }
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }

        let before = count.load(Ordering::SeqCst);
        assert!(before >= 1);
        producer.fire();
        assert!(count.load(Ordering::SeqCst) > before, "loop must still be armed");
    }
}

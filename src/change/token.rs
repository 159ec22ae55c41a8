//! Consume-once change tokens.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use tokio::sync::Notify;

type Callback = Box<dyn FnOnce() + Send>;

struct Signal {
    fired: AtomicBool,
    /// `None` once the signal has fired.
    callbacks: Mutex<Option<Vec<(u64, Callback)>>>,
    next_id: AtomicU64,
    notify: Notify,
}

impl Signal {
    fn new() -> Self {
        Self {
            fired: AtomicBool::new(false),
            callbacks: Mutex::new(Some(Vec::new())),
            next_id: AtomicU64::new(1),
            notify: Notify::new(),
        }
    }

    fn fire(&self) -> bool {
        if self.fired.swap(true, Ordering::AcqRel) {
            return false;
        }
        let callbacks = self
            .callbacks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .unwrap_or_default();
        self.notify.notify_waiters();
        for (_, callback) in callbacks {
            callback();
        }
        true
    }

    fn unregister(&self, id: u64) {
        let mut callbacks = self.callbacks.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(list) = callbacks.as_mut() {
            list.retain(|(registered, _)| *registered != id);
        }
    }
}

/// Read side of one change generation.
///
/// A token fires at most once. Observers that want the next change must fetch a
/// fresh token from whoever produced this one.
#[derive(Clone)]
pub struct ChangeToken {
    signal: Option<Arc<Signal>>,
}

impl ChangeToken {
    /// A token that never fires.
    pub fn never() -> Self {
        Self { signal: None }
    }

    pub fn has_changed(&self) -> bool {
        self.signal
            .as_ref()
            .is_some_and(|s| s.fired.load(Ordering::Acquire))
    }

    /// Whether this token can ever fire.
    pub fn is_active(&self) -> bool {
        self.signal.is_some()
    }

    /// Run `callback` once when the token fires, or immediately if it already has.
    pub fn register_callback<F>(&self, callback: F) -> ChangeRegistration
    where
        F: FnOnce() + Send + 'static,
    {
        let Some(signal) = &self.signal else {
            return ChangeRegistration::empty();
        };

        let mut slot = signal.callbacks.lock().unwrap_or_else(PoisonError::into_inner);
        match slot.as_mut() {
            Some(list) => {
                let id = signal.next_id.fetch_add(1, Ordering::Relaxed);
                list.push((id, Box::new(callback)));
                ChangeRegistration {
                    signal: Arc::downgrade(signal),
                    id,
                }
            }
            None => {
                drop(slot);
                callback();
                ChangeRegistration::empty()
            }
        }
    }

    /// Resolve once the token has fired. Pending forever for [`ChangeToken::never`].
    pub async fn changed(&self) {
        let Some(signal) = &self.signal else {
            return std::future::pending().await;
        };
        loop {
            let notified = signal.notify.notified();
            if signal.fired.load(Ordering::Acquire) {
                return;
            }
            notified.await;
        }
    }

    /// True when both tokens belong to the same generation.
    pub fn same_generation(&self, other: &ChangeToken) -> bool {
        match (&self.signal, &other.signal) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl fmt::Debug for ChangeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeToken")
            .field("active", &self.is_active())
            .field("changed", &self.has_changed())
            .finish()
    }
}

/// Write side of one change generation.
pub struct ChangeTokenSource {
    signal: Arc<Signal>,
}

impl ChangeTokenSource {
    pub fn new() -> Self {
        Self {
            signal: Arc::new(Signal::new()),
        }
    }

    pub fn token(&self) -> ChangeToken {
        ChangeToken {
            signal: Some(self.signal.clone()),
        }
    }

    /// Fire the generation. Returns false if it had already fired.
    pub fn trigger(&self) -> bool {
        self.signal.fire()
    }

    pub fn has_fired(&self) -> bool {
        self.signal.fired.load(Ordering::Acquire)
    }
}

impl Default for ChangeTokenSource {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ChangeTokenSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeTokenSource")
            .field("fired", &self.has_fired())
            .finish()
    }
}

/// Handle to a registered callback. Dropping it removes the callback if it has not run.
#[must_use = "dropping the registration unregisters the callback"]
pub struct ChangeRegistration {
    signal: Weak<Signal>,
    id: u64,
}

impl ChangeRegistration {
    fn empty() -> Self {
        Self {
            signal: Weak::new(),
            id: 0,
        }
    }

    pub fn unregister(self) {}
}

impl Drop for ChangeRegistration {
    fn drop(&mut self) {
        if self.id == 0 {
            return;
        }
        if let Some(signal) = self.signal.upgrade() {
            signal.unregister(self.id);
        }
    }
}

impl fmt::Debug for ChangeRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeRegistration").field("id", &self.id).finish()
    }
}

//! Subscription handle returned to callers.

use std::cell::Cell;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    /// Subscription whose callback is running on this thread, 0 if none.
    static DELIVERING: Cell<u64> = const { Cell::new(0) };
}

/// Open/closed switch serialising callbacks against unsubscribe.
///
/// A callback only runs while the gate is open, and closing waits for a
/// callback already in flight on another thread.
#[derive(Debug)]
pub(crate) struct CallbackGate {
    open: AtomicBool,
    delivering: Mutex<()>,
}

impl CallbackGate {
    pub(crate) fn new() -> Self {
        Self {
            open: AtomicBool::new(true),
            delivering: Mutex::new(()),
        }
    }

    pub(crate) fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    /// Run `callback` unless the gate is closed. Returns whether it ran.
    pub(crate) fn deliver(&self, subscription_id: u64, callback: impl FnOnce()) -> bool {
        let _held = self.delivering.lock().unwrap_or_else(|e| e.into_inner());
        if !self.is_open() {
            return false;
        }
        let _marker = DeliveringMarker::set(subscription_id);
        callback();
        true
    }

    /// Close the gate. Returns whether it was open.
    ///
    /// Called from inside this subscription's own callback it returns
    /// without waiting.
    pub(crate) fn close(&self, subscription_id: u64) -> bool {
        let was_open = self.open.swap(false, Ordering::SeqCst);
        if DELIVERING.with(Cell::get) != subscription_id {
            drop(self.delivering.lock().unwrap_or_else(|e| e.into_inner()));
        }
        was_open
    }
}

struct DeliveringMarker {
    previous: u64,
}

impl DeliveringMarker {
    fn set(subscription_id: u64) -> Self {
        Self {
            previous: DELIVERING.with(|d| d.replace(subscription_id)),
        }
    }
}

impl Drop for DeliveringMarker {
    fn drop(&mut self) {
        DELIVERING.with(|d| d.set(self.previous));
    }
}

/// A live roster subscription.
///
/// Dropping the handle unsubscribes. `unsubscribe` may be called any
/// number of times; once it returns, the callback is not running and is
/// not invoked again. Unsubscribing from inside the callback lets the
/// current invocation finish.
#[derive(Debug)]
pub struct Subscription {
    /// Process-unique subscription number, for logs.
    id: u64,
    /// Gate every callback passes through.
    gate: Arc<CallbackGate>,
    /// Stops the listener task.
    cancel: CancellationToken,
    /// Listener task.
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    pub(crate) fn new(gate: Arc<CallbackGate>, cancel: CancellationToken) -> Self {
        Self {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            gate,
            cancel,
            task: None,
        }
    }

    pub(crate) fn attach(&mut self, task: JoinHandle<()>) {
        self.task = Some(task);
    }

    /// Subscription number.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Whether callbacks are still being delivered.
    pub fn is_active(&self) -> bool {
        self.gate.is_open()
    }

    /// Stop callbacks, waiting for one already running elsewhere.
    /// Idempotent.
    pub fn unsubscribe(&self) {
        if self.gate.close(self.id) {
            self.cancel.cancel();
            debug!(subscription = self.id, "Roster subscription cancelled");
        }
    }

    /// Unsubscribe and wait for the listener task to finish.
    pub async fn close(mut self) {
        self.unsubscribe();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// Last-value-caching broadcast cell.
///
/// Holds the current value and fans every update out, in order, to all live
/// subscribers. A new subscriber receives the current value immediately,
/// then every subsequent update — never a default, never a skipped
/// transition. This is the shared state primitive behind both session state
/// machines and the aggregator's derived view.
///
/// Cloning the cell is cheap; all clones share the same value and
/// subscriber list.
pub struct StateCell<T> {
    inner: Arc<Mutex<CellInner<T>>>,
}

struct CellInner<T> {
    current: T,
    subscribers: Vec<mpsc::UnboundedSender<T>>,
}

impl<T: Clone> StateCell<T> {
    pub fn new(initial: T) -> Self {
        Self {
            inner: Arc::new(Mutex::new(CellInner {
                current: initial,
                subscribers: Vec::new(),
            })),
        }
    }

    /// Snapshot of the current value.
    pub fn get(&self) -> T {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.current.clone()
    }

    /// Publish a new value: update the cache, then deliver to every
    /// subscriber in registration order. Closed subscribers are pruned.
    pub fn set(&self, value: T) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.current = value.clone();
        inner
            .subscribers
            .retain(|tx| tx.send(value.clone()).is_ok());
    }

    /// Subscribe to the value stream. The current value is delivered
    /// synchronously into the channel before any future update.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<T> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        // Replay-then-register under the same lock so no update can slot
        // in between the replayed value and the first live one.
        let _ = tx.send(inner.current.clone());
        inner.subscribers.push(tx);
        rx
    }
}

impl<T> Clone for StateCell<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

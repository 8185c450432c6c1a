//! Request coalescing: at most one in-flight load per key.
//!
//! When several callers miss on the same key at once, only the first (the
//! leader) executes the load; the rest wait on the leader's completion latch
//! and receive a clone of the same result. The map lock is held only while
//! inserting or removing a record, never across the load itself.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, PoisonError};

use tokio::sync::watch;

use super::byteview::ByteView;
use crate::error::{CacheError, Result};

type FlightResult = Result<ByteView>;
type FlightReceiver = watch::Receiver<Option<FlightResult>>;

/// Coalesces concurrent loads of the same key into one execution.
pub struct FlightGroup {
    calls: Mutex<HashMap<String, FlightReceiver>>,
}

impl FlightGroup {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(HashMap::new()),
        }
    }

    /// Runs `work` for `key`, unless another call for the same key is already
    /// in flight, in which case the caller waits for that call's result.
    ///
    /// Every caller whose window overlaps the leader's execution receives a
    /// clone of the one `(value, error)` pair the leader produced. Calls that
    /// do not overlap run `work` again; nothing is cached here.
    pub async fn run<F, Fut>(&self, key: &str, work: F) -> FlightResult
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = FlightResult>,
    {
        let tx = {
            let mut calls = self.calls.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(rx) = calls.get(key) {
                let mut rx = rx.clone();
                drop(calls);
                return match rx.wait_for(|slot| slot.is_some()).await {
                    Ok(slot) => (*slot).clone().unwrap_or(Err(CacheError::FlightAborted)),
                    // The leader was dropped without publishing a result.
                    Err(_) => Err(CacheError::FlightAborted),
                };
            }
            let (tx, rx) = watch::channel(None);
            calls.insert(key.to_string(), rx);
            tx
        };

        // The guard removes the record on every exit path, including a leader
        // that is cancelled mid-load, so followers cannot wait on a corpse.
        let _guard = FlightGuard {
            group: self,
            key: key.to_string(),
        };

        let result = work().await;
        let _ = tx.send(Some(result.clone()));
        result
    }

    #[cfg(test)]
    pub(crate) fn in_flight(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Default for FlightGroup {
    fn default() -> Self {
        Self::new()
    }
}

struct FlightGuard<'a> {
    group: &'a FlightGroup,
    key: String,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.group
            .calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}

//! Per-key cache entry state.
//!
//! An [`Entry`] is the single slot holding the last known result of one
//! logical read operation. It is only ever replaced wholesale, never
//! patched in place, and it carries the in-flight marker that lets
//! duplicate requests attach to a pending fetch instead of issuing their
//! own round trip.

use parking_lot::Mutex;
use tokio::sync::watch;

/// A point-in-time view of one cache entry.
///
/// `value` is the last successful result, which may be stale; `fresh`
/// says whether it reflects the latest known server state. `error` holds
/// the message of the most recent failed fetch, if any. A failure never
/// clears a previously cached value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot<T> {
    /// Last successful result; `None` until the first fetch resolves.
    pub value: Option<T>,
    /// Whether the value reflects the latest known server state.
    pub fresh: bool,
    /// Whether a fetch is currently in flight.
    pub pending: bool,
    /// Message of the most recent failed fetch, cleared on success.
    pub error: Option<String>,
}

impl<T> Snapshot<T> {
    /// A snapshot with no data, as reported before the first fetch.
    pub fn empty() -> Self {
        Self {
            value: None,
            fresh: false,
            pending: false,
            error: None,
        }
    }
}

pub(crate) struct Entry<T> {
    state: Mutex<EntryState<T>>,
}

struct EntryState<T> {
    value: Option<T>,
    fresh: bool,
    error: Option<String>,
    inflight: Option<watch::Receiver<bool>>,
}

/// What a caller should do to satisfy a query against this entry.
pub(crate) enum FetchPlan<T> {
    /// The entry is fresh; use the cached value, no round trip.
    Fresh(T),
    /// A fetch is already in flight; wait for it to settle.
    Attach(watch::Receiver<bool>),
    /// This caller leads the fetch and must call [`Entry::complete`].
    Lead(FetchLead),
}

/// Token held by the caller that leads an in-flight fetch.
pub(crate) struct FetchLead {
    tx: watch::Sender<bool>,
}

impl<T: Clone> Entry<T> {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(EntryState {
                value: None,
                fresh: false,
                error: None,
                inflight: None,
            }),
        }
    }

    /// Decide how a query against this entry should proceed.
    ///
    /// At most one fetch per entry is in flight at a time: late arrivals
    /// attach to the pending one. A dangling in-flight marker whose leader
    /// was dropped mid-fetch is taken over rather than waited on.
    pub(crate) fn plan(&self) -> FetchPlan<T> {
        let mut state = self.state.lock();
        if state.fresh {
            if let Some(value) = &state.value {
                return FetchPlan::Fresh(value.clone());
            }
        }
        if let Some(rx) = &state.inflight {
            if rx.has_changed().is_ok() {
                return FetchPlan::Attach(rx.clone());
            }
            state.inflight = None;
        }
        let (tx, rx) = watch::channel(false);
        state.inflight = Some(rx);
        FetchPlan::Lead(FetchLead { tx })
    }

    /// Settle the in-flight fetch this caller led.
    ///
    /// With `accept` false the result is discarded without touching the
    /// entry: the fetch was superseded by a full-cache invalidation while
    /// it was in flight. A failed fetch records its error but keeps the
    /// previously cached value. Waiters attached to the fetch are woken
    /// either way.
    pub(crate) fn complete(
        &self,
        lead: FetchLead,
        outcome: Result<T, String>,
        accept: bool,
    ) {
        {
            let mut state = self.state.lock();
            state.inflight = None;
            if accept {
                match outcome {
                    Ok(value) => {
                        state.value = Some(value);
                        state.fresh = true;
                        state.error = None;
                    },
                    Err(message) => {
                        state.error = Some(message);
                    },
                }
            }
        }
        let _ = lead.tx.send(true);
    }

    /// Mark the entry stale. The value stays readable until a re-fetch
    /// replaces it.
    pub(crate) fn mark_stale(&self) {
        self.state.lock().fresh = false;
    }

    /// Reset the entry to "no data", as on an identity transition.
    pub(crate) fn reset(&self) {
        let mut state = self.state.lock();
        state.value = None;
        state.fresh = false;
        state.error = None;
    }

    pub(crate) fn snapshot(&self) -> Snapshot<T> {
        let state = self.state.lock();
        Snapshot {
            value: state.value.clone(),
            fresh: state.fresh,
            pending: state
                .inflight
                .as_ref()
                .is_some_and(|rx| rx.has_changed().is_ok()),
            error: state.error.clone(),
        }
    }
}

/// Wait until an in-flight fetch settles (or its leader disappears).
pub(crate) async fn wait_settled(mut rx: watch::Receiver<bool>) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            return;
        }
    }
}

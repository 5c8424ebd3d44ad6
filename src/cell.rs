//! The shared state behind every [`Promise`](crate::Promise) handle.
//!
//! A cell moves from `Pending` to exactly one of `Fulfilled` or `Rejected`
//! and never back. While pending it holds at most one continuation pair.
//! The lock is always released before a continuation runs, so a
//! continuation may freely attach to or settle other cells, including this
//! one.

use parking_lot::Mutex;
use tracing::{trace, warn};

use crate::{Error, Rejection};

type OnFulfill<V> = Box<dyn FnOnce(V) + Send + 'static>;
type OnReject = Box<dyn FnOnce(Rejection) + Send + 'static>;

/// The fulfillment/rejection handler pair attached to a cell.
pub(crate) struct Continuation<V> {
    on_fulfill: OnFulfill<V>,
    on_reject: OnReject,
}

impl<V> Continuation<V> {
    pub(crate) fn new<F, R>(on_fulfill: F, on_reject: R) -> Self
    where
        F: FnOnce(V) + Send + 'static,
        R: FnOnce(Rejection) + Send + 'static,
    {
        Self {
            on_fulfill: Box::new(on_fulfill),
            on_reject: Box::new(on_reject),
        }
    }
}

enum State<V> {
    Pending(Option<Continuation<V>>),
    // The payloads are `None` once handed to a continuation.
    Fulfilled(Option<V>),
    Rejected(Option<Rejection>),
}

/// Where a cell is in its `Pending -> Fulfilled | Rejected` lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Status {
    Pending,
    Fulfilled,
    Rejected,
}

impl Status {
    fn as_str(self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::Fulfilled => "fulfilled",
            Status::Rejected => "rejected",
        }
    }
}

impl<V> State<V> {
    fn status(&self) -> Status {
        match self {
            State::Pending(_) => Status::Pending,
            State::Fulfilled(_) => Status::Fulfilled,
            State::Rejected(_) => Status::Rejected,
        }
    }

    /// Takes the attached continuation of a pending cell.
    ///
    /// # Panics
    ///
    /// Panics if the cell is already settled: a cell is settled at most once.
    fn take_pending(&mut self, settling: &str) -> Option<Continuation<V>> {
        match self {
            State::Pending(slot) => slot.take(),
            settled => panic!(
                "promise {} after it was already {}",
                settling,
                settled.status().as_str()
            ),
        }
    }
}

pub(crate) struct Cell<V> {
    state: Mutex<State<V>>,
}

impl<V> Cell<V> {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(State::Pending(None)),
        }
    }

    pub(crate) fn fulfill(&self, value: V) {
        let on_fulfill = {
            let mut state = self.state.lock();
            match state.take_pending("fulfilled") {
                Some(continuation) => {
                    *state = State::Fulfilled(None);
                    continuation.on_fulfill
                }
                None => {
                    *state = State::Fulfilled(Some(value));
                    trace!("promise fulfilled, value stored");
                    return;
                }
            }
        };
        trace!("promise fulfilled, running continuation");
        on_fulfill(value);
    }

    pub(crate) fn reject(&self, error: Rejection) {
        let on_reject = {
            let mut state = self.state.lock();
            match state.take_pending("rejected") {
                Some(continuation) => {
                    *state = State::Rejected(None);
                    continuation.on_reject
                }
                None => {
                    trace!(%error, "promise rejected, error stored");
                    *state = State::Rejected(Some(error));
                    return;
                }
            }
        };
        trace!(%error, "promise rejected, running continuation");
        on_reject(error);
    }

    /// Attaches a continuation, running it right away if the cell already
    /// holds an outcome.
    pub(crate) fn attach(&self, continuation: Continuation<V>) {
        let settled = {
            let mut state = self.state.lock();
            match &mut *state {
                State::Pending(slot) => {
                    if slot.replace(continuation).is_some() {
                        warn!("replaced a continuation that never ran");
                    }
                    return;
                }
                State::Fulfilled(value) => value.take().map(Ok),
                State::Rejected(error) => error.take().map(Err),
            }
        };
        match settled {
            Some(Ok(value)) => {
                trace!("promise already fulfilled, running continuation");
                (continuation.on_fulfill)(value);
            }
            Some(Err(error)) => {
                trace!(%error, "promise already rejected, running continuation");
                (continuation.on_reject)(error);
            }
            None => {
                warn!("promise outcome was already delivered, rejecting continuation");
                (continuation.on_reject)(Rejection::new(Error::Consumed));
            }
        }
    }

    pub(crate) fn status(&self) -> Status {
        self.state.lock().status()
    }
}

use std::fmt;
use std::future::Future;
use std::mem;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, Waker};

use parking_lot::Mutex;
use tracing::debug;

use crate::{Error, Promise, Rejection};

/// A `std::future::Future` resolving to a promise's outcome.
///
/// The waiter is the promise's continuation: it parks the outcome until the
/// waiter is polled. If that continuation is dropped without ever running,
/// because every handle to the pending promise was dropped or another
/// continuation replaced it, the waiter yields [`Error::Abandoned`].
///
/// # Examples
///
/// ```
/// use promise_chain::Promise;
/// use futures::executor::block_on;
/// use std::thread;
///
/// let promise = Promise::<(String,)>::new();
/// let waiter = promise.waiter();
///
/// let task1 = thread::spawn(move || block_on(async {
///     println!("Received {:?}", waiter.await);
/// }));
/// promise.fulfill("Hi".into());
/// task1.join().expect("The task1 thread has panicked.");
/// ```
pub struct Waiter<V> {
    inner: Arc<Mutex<Inner<V>>>,
}

enum WakerState {
    Fresh,
    Tainted,
}

struct Inner<V> {
    value: Option<Result<V, Rejection>>,
    waker: Result<Waker, WakerState>,
}

/// The end of a waiter held by the promise's continuation.
struct Notifier<V> {
    inner: Arc<Mutex<Inner<V>>>,
}

impl<V> Notifier<V> {
    fn deliver(&self, outcome: Result<V, Rejection>) {
        let waker = {
            let mut inner = self.inner.lock();
            inner.value = Some(outcome);
            mem::replace(&mut inner.waker, Err(WakerState::Tainted))
        };
        if let Ok(waker) = waker {
            waker.wake();
        }
    }
}

impl<V> Drop for Notifier<V> {
    /// If the continuation never ran, wake the waiter with an error.
    fn drop(&mut self) {
        let waker = mem::replace(&mut self.inner.lock().waker, Err(WakerState::Tainted));
        if let Ok(waker) = waker {
            debug!("promise continuation dropped before it ran, waking waiter");
            waker.wake();
        }
    }
}

impl<V: Send + 'static> Waiter<V> {
    pub(crate) fn new(promise: &Promise<V>) -> Self {
        let inner = Arc::new(Mutex::new(Inner {
            value: None,
            waker: Err(WakerState::Fresh),
        }));
        let fulfilled = Arc::new(Notifier {
            inner: Arc::clone(&inner),
        });
        let rejected = Arc::clone(&fulfilled);
        promise.attach(
            move |values| fulfilled.deliver(Ok(values)),
            move |error| rejected.deliver(Err(error)),
        );
        Self { inner }
    }
}

impl<V> Future for Waiter<V> {
    type Output = Result<V, Rejection>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut inner = self.inner.lock();
        match inner.value.take() {
            Some(outcome) => Poll::Ready(outcome),
            None => match mem::replace(&mut inner.waker, Ok(cx.waker().clone())) {
                Err(WakerState::Tainted) => Poll::Ready(Err(Rejection::new(Error::Abandoned))),
                _ => Poll::Pending,
            },
        }
    }
}

impl<V> fmt::Debug for Waiter<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Waiter").finish_non_exhaustive()
    }
}

use std::error::Error as StdError;
use std::fmt;
use std::future::IntoFuture;
use std::sync::Arc;

use crate::cell::{Cell, Continuation, Status};
use crate::{Outcome, Ready, Rejection, Waiter};

/// A shared handle to a write-once value that is fulfilled or rejected
/// exactly once, possibly from another thread.
///
/// `V` is the tuple of values the promise carries: `Promise<()>` carries
/// none, `Promise<(String,)>` one, `Promise<(u32, String)>` two. Cloning a
/// promise clones the handle, not the value; any clone may settle it.
///
/// Continuations are attached with [`then`](Promise::then) and run on the
/// thread that settles the promise, or immediately on the attaching thread
/// if the promise is already settled. Each promise delivers its outcome to
/// one continuation: attaching again to a pending promise replaces the
/// continuation that has not run yet, and a continuation attached after the
/// outcome was taken is rejected with [`Error::Consumed`](crate::Error::Consumed).
///
/// # Examples
///
/// ```
/// use promise_chain::Promise;
/// use futures::executor::block_on;
/// use std::thread;
///
/// let greeting = Promise::<(String,)>::new();
/// let length = greeting.map(|s| s.len()).map(|n| n * 2);
///
/// let producer = greeting.clone();
/// thread::spawn(move || producer.fulfill("hello".into()))
///     .join()
///     .expect("The producer thread has panicked");
///
/// assert_eq!(block_on(length.waiter()).unwrap(), (10,));
/// ```
pub struct Promise<V> {
    cell: Arc<Cell<V>>,
}

impl<V> Clone for Promise<V> {
    fn clone(&self) -> Self {
        Self {
            cell: Arc::clone(&self.cell),
        }
    }
}

impl<V: Send + 'static> Default for Promise<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> fmt::Debug for Promise<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Promise")
            .field("status", &self.cell.status())
            .finish()
    }
}

impl<V: Send + 'static> Promise<V> {
    pub fn new() -> Self {
        Self {
            cell: Arc::new(Cell::new()),
        }
    }

    /// A promise that is already fulfilled with `values`.
    pub fn fulfilled(values: V) -> Self {
        let promise = Self::new();
        promise.resolve(values);
        promise
    }

    /// A promise that is already rejected with `error`.
    pub fn rejected(error: impl Into<Rejection>) -> Self {
        let promise = Self::new();
        promise.reject(error);
        promise
    }

    /// Fulfills the promise with its whole value tuple.
    ///
    /// # Panics
    ///
    /// Panics if the promise is already fulfilled or rejected.
    pub fn resolve(&self, values: V) {
        self.cell.fulfill(values);
    }

    /// Rejects the promise.
    ///
    /// # Panics
    ///
    /// Panics if the promise is already fulfilled or rejected.
    pub fn reject(&self, error: impl Into<Rejection>) {
        self.cell.reject(error.into());
    }

    pub fn is_pending(&self) -> bool {
        self.cell.status() == Status::Pending
    }

    pub fn is_fulfilled(&self) -> bool {
        self.cell.status() == Status::Fulfilled
    }

    pub fn is_rejected(&self) -> bool {
        self.cell.status() == Status::Rejected
    }

    /// Handles rejections whose error is an `E`.
    ///
    /// The error kind comes from the handler's parameter type. A matching
    /// rejection is passed to `handler`, whose [`Outcome`] settles the
    /// returned promise; returning `Err` rejects it again. Any other
    /// rejection, and every fulfillment, passes through unchanged.
    ///
    /// ```
    /// use promise_chain::Promise;
    /// use futures::executor::block_on;
    /// use thiserror::Error;
    ///
    /// #[derive(Debug, Error)]
    /// #[error("logic error")]
    /// struct LogicError;
    ///
    /// #[derive(Debug, Error)]
    /// #[error("system error")]
    /// struct SystemError;
    ///
    /// let failed = Promise::<()>::rejected(SystemError);
    /// let recovered = failed
    ///     .error(|_: LogicError| ())
    ///     .error(|_: SystemError| ());
    ///
    /// assert!(block_on(recovered.waiter()).is_ok());
    /// ```
    pub fn error<E, F, O>(&self, handler: F) -> Promise<V>
    where
        E: StdError + Send + Sync + 'static,
        F: FnOnce(E) -> O + Send + 'static,
        O: Outcome<Values = V>,
    {
        self.recover(move |rejection| match rejection.downcast::<E>() {
            Ok(error) => Ok(handler(error)),
            Err(rejection) => Err(rejection),
        })
    }

    /// Handles every rejection.
    pub fn recover<F, O>(&self, handler: F) -> Promise<V>
    where
        F: FnOnce(Rejection) -> O + Send + 'static,
        O: Outcome<Values = V>,
    {
        let downstream = Promise::new();
        let fulfilled = downstream.clone();
        let rejected = downstream.clone();
        self.attach(
            move |values| fulfilled.resolve(values),
            move |error| handler(error).settle(&rejected),
        );
        downstream
    }

    /// Returns a future that completes with this promise's outcome.
    ///
    /// This attaches the promise's continuation.
    pub fn waiter(&self) -> Waiter<V> {
        Waiter::new(self)
    }

    /// Runs `continuation` on the fulfilled values and settles the returned
    /// promise from its [`Outcome`]; rejections skip it.
    pub(crate) fn chain<F, O>(&self, continuation: F) -> Promise<O::Values>
    where
        F: FnOnce(V) -> O + Send + 'static,
        O: Outcome,
    {
        let downstream = Promise::new();
        let fulfilled = downstream.clone();
        let rejected = downstream.clone();
        self.attach(
            move |values| continuation(values).settle(&fulfilled),
            move |error| rejected.reject(error),
        );
        downstream
    }

    /// Settles `downstream` with whatever this promise settles with.
    pub(crate) fn forward(&self, downstream: &Promise<V>) {
        let fulfilled = downstream.clone();
        let rejected = downstream.clone();
        self.attach(
            move |values| fulfilled.resolve(values),
            move |error| rejected.reject(error),
        );
    }

    pub(crate) fn attach<F, R>(&self, on_fulfill: F, on_reject: R)
    where
        F: FnOnce(V) + Send + 'static,
        R: FnOnce(Rejection) + Send + 'static,
    {
        self.cell.attach(Continuation::new(on_fulfill, on_reject));
    }
}

impl<V: Send + 'static> IntoFuture for Promise<V> {
    type Output = Result<V, Rejection>;
    type IntoFuture = Waiter<V>;

    fn into_future(self) -> Waiter<V> {
        self.waiter()
    }
}

macro_rules! arity {
    ($($value:ident: $ty:ident),*) => {
        impl<$($ty: Send + 'static),*> Promise<($($ty,)*)> {
            /// Fulfills the promise, one argument per carried value.
            ///
            /// # Panics
            ///
            /// Panics if the promise is already fulfilled or rejected.
            pub fn fulfill(&self, $($value: $ty),*) {
                self.resolve(($($value,)*));
            }

            /// Attaches `continuation` and returns the promise of its result.
            ///
            /// The shape of the continuation's return value picks the
            /// downstream type, see [`Outcome`]. A rejection skips the
            /// continuation and rejects the returned promise.
            pub fn then<F, O>(&self, continuation: F) -> Promise<O::Values>
            where
                F: FnOnce($($ty),*) -> O + Send + 'static,
                O: Outcome,
            {
                self.chain(move |($($value,)*)| continuation($($value),*))
            }

            /// Attaches a continuation returning a plain value.
            pub fn map<F, U>(&self, transform: F) -> Promise<(U,)>
            where
                F: FnOnce($($ty),*) -> U + Send + 'static,
                U: Send + 'static,
            {
                self.then(move |$($value),*| Ready(transform($($value),*)))
            }
        }
    };
}

arity!();
arity!(a: T1);
arity!(a: T1, b: T2);
arity!(a: T1, b: T2, c: T3);
arity!(a: T1, b: T2, c: T3, d: T4);
arity!(a: T1, b: T2, c: T3, d: T4, e: T5);
arity!(a: T1, b: T2, c: T3, d: T4, e: T5, f: T6);
arity!(a: T1, b: T2, c: T3, d: T4, e: T5, f: T6, g: T7);
arity!(a: T1, b: T2, c: T3, d: T4, e: T5, f: T6, g: T7, h: T8);

#[cfg(test)]
mod tests {
    use super::Promise;
    use crate::{ready, Rejection};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use thiserror::Error;

    #[derive(Debug, Error)]
    #[error("logic error: {0}")]
    struct LogicError(&'static str);

    #[derive(Debug, Error)]
    #[error("system error")]
    struct SystemError;

    fn capture<V: Send + 'static>(promise: &Promise<V>) -> Arc<Mutex<Option<Result<V, String>>>> {
        let seen = Arc::new(Mutex::new(None));
        let fulfilled = Arc::clone(&seen);
        let rejected = Arc::clone(&seen);
        promise.attach(
            move |values| *fulfilled.lock().unwrap() = Some(Ok(values)),
            move |error: Rejection| *rejected.lock().unwrap() = Some(Err(error.to_string())),
        );
        seen
    }

    #[test]
    fn test_then_on_settled_promise_runs_before_returning() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counted = Arc::clone(&runs);
        let source = Promise::fulfilled(("x".to_string(),));
        let _next = source.then(move |_| {
            counted.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_then_on_pending_promise_runs_on_fulfill() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counted = Arc::clone(&runs);
        let source = Promise::<(u8,)>::new();
        let next = source.then(move |_| {
            counted.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(runs.load(Ordering::SeqCst), 0);
        assert!(next.is_pending());

        source.fulfill(1);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert!(next.is_fulfilled());
    }

    #[test]
    fn test_plain_values_chain() {
        let source = Promise::<(String,)>::new();
        let doubled = source.then(|_| ready(5)).then(|n| ready(n * 2));
        let mapped = doubled.map(|n| n + 1);
        let seen = capture(&mapped);

        source.fulfill("x".into());
        assert_eq!(*seen.lock().unwrap(), Some(Ok((11,))));
    }

    #[test]
    fn test_nested_promise_is_flattened() {
        let inner = Promise::<(u8, &'static str)>::new();
        let nested = inner.clone();
        let outer = Promise::fulfilled(()).then(move || nested);
        let seen = capture(&outer);
        assert_eq!(*seen.lock().unwrap(), None);

        inner.fulfill(2, "y");
        assert_eq!(*seen.lock().unwrap(), Some(Ok((2, "y"))));
    }

    #[test]
    fn test_nested_rejection_flows_downstream() {
        let inner = Promise::<()>::new();
        let nested = inner.clone();
        let outer = Promise::fulfilled(()).then(move || nested);
        let seen = capture(&outer);

        inner.reject(SystemError);
        assert_eq!(*seen.lock().unwrap(), Some(Err("system error".to_string())));
    }

    #[test]
    fn test_err_from_continuation_rejects_downstream() {
        let next = Promise::fulfilled((1u8,)).then(|n| {
            if n > 0 {
                return Err(LogicError("positive"));
            }
            Ok(ready(n))
        });
        let seen = capture(&next);
        assert_eq!(*seen.lock().unwrap(), Some(Err("logic error: positive".to_string())));
    }

    #[test]
    fn test_rejection_skips_then_stages() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counted = Arc::clone(&runs);
        let tail = Promise::<(u8,)>::rejected(SystemError)
            .then(move |n| {
                counted.fetch_add(1, Ordering::SeqCst);
                ready(n)
            })
            .map(|n| n + 1);
        let seen = capture(&tail);
        assert_eq!(runs.load(Ordering::SeqCst), 0);
        assert_eq!(*seen.lock().unwrap(), Some(Err("system error".to_string())));
    }

    #[test]
    fn test_error_dispatches_on_kind() {
        let handled = Arc::new(Mutex::new(vec![]));
        let logic = Arc::clone(&handled);
        let system = Arc::clone(&handled);

        let source = Promise::<(String,)>::new();
        let tail = source
            .then(|_| Err::<(), _>(LogicError("bad")))
            .error(move |_: SystemError| system.lock().unwrap().push("system"))
            .error(move |e: LogicError| logic.lock().unwrap().push(e.0));
        let seen = capture(&tail);

        source.fulfill("x".into());
        assert_eq!(*handled.lock().unwrap(), vec!["bad"]);
        assert_eq!(*seen.lock().unwrap(), Some(Ok(())));
    }

    #[test]
    fn test_error_passes_fulfillment_through() {
        let tail = Promise::fulfilled((3u8,)).error(|_: SystemError| ready(0u8));
        let seen = capture(&tail);
        assert_eq!(*seen.lock().unwrap(), Some(Ok((3,))));
    }

    #[test]
    fn test_error_handler_may_reject_again() {
        let tail = Promise::<()>::rejected(LogicError("first"))
            .error(|_: LogicError| Err::<(), _>(SystemError));
        let seen = capture(&tail);
        assert_eq!(*seen.lock().unwrap(), Some(Err("system error".to_string())));
    }

    #[test]
    fn test_recover_catches_any_kind() {
        let tail = Promise::<(u8,)>::rejected(Rejection::msg("anything"))
            .error(|_: LogicError| ready(1u8))
            .recover(|rejection| ready(rejection.to_string().len() as u8));
        let seen = capture(&tail);
        assert_eq!(*seen.lock().unwrap(), Some(Ok((8,))));
    }

    #[test]
    fn test_second_continuation_rejects_once_value_is_taken() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counted = Arc::clone(&runs);
        let source = Promise::fulfilled((1u8,));
        let first = source.map(|n| n + 1);
        let second = source.then(move |n| {
            counted.fetch_add(1, Ordering::SeqCst);
            ready(n)
        });

        assert!(first.is_fulfilled());
        assert!(second.is_rejected());
        assert_eq!(runs.load(Ordering::SeqCst), 0);
        let taken = second.recover(|rejection| {
            assert!(matches!(
                rejection.downcast_ref::<crate::Error>(),
                Some(crate::Error::Consumed)
            ));
            ready(0u8)
        });
        assert!(taken.is_fulfilled());
    }

    #[test]
    fn test_error_after_fulfillment_was_taken_settles() {
        let source = Promise::<(u8,)>::new();
        let _doubled = source.map(|n| n * 2);
        source.fulfill(3);
        let fallback = source.error(|_: crate::Error| ready(0u8));
        let seen = capture(&fallback);
        assert_eq!(*seen.lock().unwrap(), Some(Ok((0,))));
    }

    #[test]
    #[should_panic(expected = "promise fulfilled after it was already rejected")]
    fn test_fulfill_after_reject_panics() {
        let promise = Promise::<()>::new();
        promise.reject(SystemError);
        promise.fulfill();
    }

    #[test]
    fn test_debug_shows_status() {
        let promise = Promise::<()>::new();
        assert_eq!(format!("{promise:?}"), "Promise { status: Pending }");
    }
}

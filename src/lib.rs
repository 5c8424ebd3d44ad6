//! Write-once promises whose continuations run on whichever thread settles
//! them.
//!
//! A [`Promise`] is fulfilled or rejected exactly once by some producer,
//! typically on another thread. Consumers chain continuations with
//! [`then`](Promise::then); each call returns the promise of the
//! continuation's result. What the continuation returns decides what that
//! promise carries:
//!
//! - nothing, or a plain [`Ready`] value;
//! - another promise, which is flattened into the chain;
//! - a tuple of promises and ready values, which is fanned in: the
//!   downstream promise is fulfilled with every value in tuple order once
//!   all of them are in, and rejected as soon as one of them is rejected.
//!
//! Rejections skip every `then` until an [`error`](Promise::error) stage
//! for their kind, or a [`recover`](Promise::recover) stage, handles them.
//!
//! Nothing here blocks or spawns. A [`Waiter`] bridges a promise into
//! `async` code or, through an executor's `block_on`, into a blocking call.
//!
//! # Examples
//!
//! ```
//! use promise_chain::{ready, Promise};
//! use futures::executor::block_on;
//! use std::thread;
//!
//! fn send(text: &'static str) -> Promise<(String,)> {
//!     let promise = Promise::<(String,)>::new();
//!     let producer = promise.clone();
//!     thread::spawn(move || producer.fulfill(text.to_string()));
//!     promise
//! }
//!
//! let joined = send("first")
//!     .then(|first| (send("second"), ready(first.len())))
//!     .then(|second, len| ready(format!("{second}:{len}")));
//!
//! assert_eq!(block_on(joined.waiter()).unwrap(), ("second:5".to_string(),));
//! ```

mod cell;
mod fan_in;
mod outcome;
mod promise;
mod rejection;
mod shape;
mod waiter;

pub use fan_in::Branch;
pub use outcome::{ready, Outcome, Ready};
pub use promise::Promise;
pub use rejection::Rejection;
pub use shape::{Flatten, Keep, Shape, Skip, Values};
pub use waiter::Waiter;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The promise's continuation was dropped before the promise settled.
    #[error("promise was dropped before it settled")]
    Abandoned,
    /// The promise's outcome was already handed to another continuation.
    #[error("promise outcome was already taken by another continuation")]
    Consumed,
    /// An ad hoc rejection built from a message.
    #[error("{0}")]
    Message(String),
}

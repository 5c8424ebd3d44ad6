//! What a continuation may hand back, and how each shape settles the
//! promise returned by [`then`](crate::Promise::then).

use crate::{Promise, Rejection};

/// The return shape of a continuation.
///
/// | returned value            | downstream promise        |
/// |---------------------------|---------------------------|
/// | `()`                      | `Promise<()>`             |
/// | [`Ready<T>`]              | `Promise<(T,)>`           |
/// | `Promise<V>`              | `Promise<V>`, flattened   |
/// | a tuple of [`Branch`]es   | fanned in, see [`Branch`] |
/// | `Result<O, E>`            | `O`'s promise, rejected on `Err` |
///
/// [`Branch`]: crate::Branch
pub trait Outcome {
    type Values: Send + 'static;

    /// Resolves `downstream` from this value, now or once it is known.
    fn settle(self, downstream: &Promise<Self::Values>);
}

/// A plain value returned from a continuation or placed in a fan-in tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ready<T>(pub T);

/// Wraps a plain value so it can be returned from a continuation.
pub fn ready<T>(value: T) -> Ready<T> {
    Ready(value)
}

impl Outcome for () {
    type Values = ();

    fn settle(self, downstream: &Promise<()>) {
        downstream.resolve(());
    }
}

impl<T: Send + 'static> Outcome for Ready<T> {
    type Values = (T,);

    fn settle(self, downstream: &Promise<(T,)>) {
        downstream.resolve((self.0,));
    }
}

impl<V: Send + 'static> Outcome for Promise<V> {
    type Values = V;

    fn settle(self, downstream: &Promise<V>) {
        self.forward(downstream);
    }
}

impl<O, E> Outcome for Result<O, E>
where
    O: Outcome,
    E: Into<Rejection>,
{
    type Values = O::Values;

    fn settle(self, downstream: &Promise<O::Values>) {
        match self {
            Ok(outcome) => outcome.settle(downstream),
            Err(error) => downstream.reject(error),
        }
    }
}

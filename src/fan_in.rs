//! Fan-in of several branches returned together from one continuation.
//!
//! A continuation may return a tuple such as `(promise_a, ready(2), promise_b)`.
//! Every branch is awaited independently; once all of them are fulfilled the
//! downstream promise is fulfilled with their values in tuple order, whatever
//! order they completed in. Branches carrying no value (`Promise<()>`) are
//! awaited but leave no slot in the result.
//!
//! The first branch to reject rejects the downstream promise. The other
//! branches are not cancelled: they keep running and whatever they settle
//! with afterwards is discarded.

use std::mem;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::shape::{Flatten, Keep, Shape, Values};
use crate::{Outcome, Promise, Ready, Rejection};

/// One element of a fan-in tuple.
pub trait Branch: Send + 'static {
    /// The value stored in this branch's slot.
    type Output: Send + 'static;
    /// Whether the branch takes a slot in the aggregated result.
    type Slot: Shape<Self::Output>;

    /// Calls `on_value` or `on_error` once the branch settles.
    fn join<F, R>(self, on_value: F, on_error: R)
    where
        F: FnOnce(Self::Output) + Send + 'static,
        R: FnOnce(Rejection) + Send + 'static;
}

impl<T: Send + 'static> Branch for Ready<T> {
    type Output = T;
    type Slot = Keep;

    fn join<F, R>(self, on_value: F, _on_error: R)
    where
        F: FnOnce(Self::Output) + Send + 'static,
        R: FnOnce(Rejection) + Send + 'static,
    {
        on_value(self.0);
    }
}

impl<V: Values> Branch for Promise<V> {
    type Output = V::Packed;
    type Slot = V::Slot;

    fn join<F, R>(self, on_value: F, on_error: R)
    where
        F: FnOnce(Self::Output) + Send + 'static,
        R: FnOnce(Rejection) + Send + 'static,
    {
        self.attach(move |values: V| on_value(values.pack()), on_error);
    }
}

struct Tally<S> {
    slots: S,
    pending: usize,
    failed: bool,
}

/// Shared state of one fan-in: the slots filled so far and the promise to
/// settle once they are all in.
struct Gather<S, V> {
    tally: Mutex<Tally<S>>,
    downstream: Promise<V>,
    assemble: fn(S) -> V,
}

impl<S: Default, V: Send + 'static> Gather<S, V> {
    fn new(downstream: Promise<V>, pending: usize, assemble: fn(S) -> V) -> Self {
        Self {
            tally: Mutex::new(Tally {
                slots: S::default(),
                pending,
                failed: false,
            }),
            downstream,
            assemble,
        }
    }

    fn fill(&self, store: impl FnOnce(&mut S)) {
        let slots = {
            let mut tally = self.tally.lock();
            if tally.failed {
                debug!("fan-in already rejected, discarding branch value");
                return;
            }
            store(&mut tally.slots);
            tally.pending -= 1;
            if tally.pending > 0 {
                return;
            }
            mem::take(&mut tally.slots)
        };
        trace!("every fan-in branch fulfilled");
        self.downstream.resolve((self.assemble)(slots));
    }

    fn fail(&self, error: Rejection) {
        let already_failed = mem::replace(&mut self.tally.lock().failed, true);
        if already_failed {
            debug!(%error, "fan-in already rejected, discarding branch rejection");
            return;
        }
        debug!(%error, "fan-in branch rejected");
        self.downstream.reject(error);
    }
}

/// The cons list a tuple of branches aggregates into, before flattening.
macro_rules! slots {
    () => { () };
    ($head:ident $(, $tail:ident)*) => {
        <<$head as Branch>::Slot as Shape<<$head as Branch>::Output>>::Cons<slots!($($tail),*)>
    };
}

macro_rules! cons {
    () => { () };
    ($head:ident $value:ident $(, $tail:ident $rest:ident)*) => {
        <<$head as Branch>::Slot as Shape<<$head as Branch>::Output>>::cons(
            $value,
            cons!($($tail $rest),*),
        )
    };
}

macro_rules! count {
    () => { 0 };
    ($head:ident $($tail:ident)*) => { 1 + count!($($tail)*) };
}

macro_rules! fan_in {
    ($($branch:ident $value:ident $index:tt),+) => {
        impl<$($branch: Branch),+> Outcome for ($($branch,)+)
        where
            slots!($($branch),+): Flatten,
        {
            type Values = <slots!($($branch),+) as Flatten>::Tuple;

            fn settle(self, downstream: &Promise<Self::Values>) {
                let assemble: fn(($(Option<$branch::Output>,)+)) -> Self::Values = |slots| match slots {
                    ($(Some($value),)+) => Flatten::flatten(cons!($($branch $value),+)),
                    _ => unreachable!("fan-in completed with an empty slot"),
                };
                let gather = Arc::new(Gather::new(
                    downstream.clone(),
                    count!($($branch)+),
                    assemble,
                ));
                let ($($value,)+) = self;
                $(
                    $value.join(
                        {
                            let gather = Arc::clone(&gather);
                            move |value| gather.fill(|slots| slots.$index = Some(value))
                        },
                        {
                            let gather = Arc::clone(&gather);
                            move |error| gather.fail(error)
                        },
                    );
                )+
            }
        }
    };
}

fan_in!(B1 b1 0);
fan_in!(B1 b1 0, B2 b2 1);
fan_in!(B1 b1 0, B2 b2 1, B3 b3 2);
fan_in!(B1 b1 0, B2 b2 1, B3 b3 2, B4 b4 3);
fan_in!(B1 b1 0, B2 b2 1, B3 b3 2, B4 b4 3, B5 b5 4);
fan_in!(B1 b1 0, B2 b2 1, B3 b3 2, B4 b4 3, B5 b5 4, B6 b6 5);
fan_in!(B1 b1 0, B2 b2 1, B3 b3 2, B4 b4 3, B5 b5 4, B6 b6 5, B7 b7 6);
fan_in!(B1 b1 0, B2 b2 1, B3 b3 2, B4 b4 3, B5 b5 4, B6 b6 5, B7 b7 6, B8 b8 7);

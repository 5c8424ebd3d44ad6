//! Type-level description of the values a promise carries.
//!
//! A promise's value list is a tuple: `()` for no value, `(A,)` for one,
//! `(A, B)` for two and so on. When promises are fanned in, each branch
//! contributes one slot to the aggregated result, except branches that carry
//! no value at all, which contribute nothing. That filtering happens here,
//! in the types: every branch names a [`Shape`] (`Keep` or `Skip`), the
//! shapes build a cons list `(A, (B, ()))` right to left, and [`Flatten`]
//! turns the list back into the tuple `(A, B)`.

/// A tuple usable as a promise's value list.
pub trait Values: Send + 'static {
    /// What the list contributes as one fan-in slot: `A` for `(A,)`,
    /// the whole tuple for two or more values, `()` for none.
    type Packed: Send + 'static;
    /// Whether the list occupies a fan-in slot at all.
    type Slot: Shape<Self::Packed>;

    fn pack(self) -> Self::Packed;
}

/// Prepends (or not) one value to a cons list.
pub trait Shape<T> {
    type Cons<L>;

    fn cons<L>(value: T, rest: L) -> Self::Cons<L>;
}

/// The value takes a slot in the aggregated result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keep {}

/// The value is dropped from the aggregated result. Only `()` can be
/// skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Skip {}

impl<T> Shape<T> for Keep {
    type Cons<L> = (T, L);

    fn cons<L>(value: T, rest: L) -> Self::Cons<L> {
        (value, rest)
    }
}

impl Shape<()> for Skip {
    type Cons<L> = L;

    fn cons<L>(_: (), rest: L) -> Self::Cons<L> {
        rest
    }
}

/// A cons list `(A, (B, ... ()))` that flattens into the tuple `(A, B, ...)`.
pub trait Flatten {
    type Tuple: Values;

    fn flatten(self) -> Self::Tuple;
}

macro_rules! cons_type {
    () => { () };
    ($head:ident $(, $tail:ident)*) => { ($head, cons_type!($($tail),*)) };
}

macro_rules! cons_pattern {
    () => { () };
    ($head:ident $(, $tail:ident)*) => { ($head, cons_pattern!($($tail),*)) };
}

impl Values for () {
    type Packed = ();
    type Slot = Skip;

    fn pack(self) {}
}

impl<A: Send + 'static> Values for (A,) {
    type Packed = A;
    type Slot = Keep;

    fn pack(self) -> A {
        self.0
    }
}

macro_rules! values {
    ($($ty:ident),+) => {
        impl<$($ty: Send + 'static),+> Values for ($($ty,)+) {
            type Packed = Self;
            type Slot = Keep;

            fn pack(self) -> Self {
                self
            }
        }
    };
}

values!(A, B);
values!(A, B, C);
values!(A, B, C, D);
values!(A, B, C, D, E);
values!(A, B, C, D, E, F);
values!(A, B, C, D, E, F, G);
values!(A, B, C, D, E, F, G, H);

macro_rules! flatten {
    ($($value:ident: $ty:ident),*) => {
        impl<$($ty: Send + 'static),*> Flatten for cons_type!($($ty),*) {
            type Tuple = ($($ty,)*);

            #[allow(clippy::unused_unit)]
            fn flatten(self) -> Self::Tuple {
                let cons_pattern!($($value),*) = self;
                ($($value,)*)
            }
        }
    };
}

flatten!();
flatten!(a: A);
flatten!(a: A, b: B);
flatten!(a: A, b: B, c: C);
flatten!(a: A, b: B, c: C, d: D);
flatten!(a: A, b: B, c: C, d: D, e: E);
flatten!(a: A, b: B, c: C, d: D, e: E, f: F);
flatten!(a: A, b: B, c: C, d: D, e: E, f: F, g: G);
flatten!(a: A, b: B, c: C, d: D, e: E, f: F, g: G, h: H);

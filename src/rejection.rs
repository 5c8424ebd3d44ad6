use std::error::Error as StdError;
use std::fmt;

use crate::Error;

type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// The opaque error carried by a rejected [`Promise`](crate::Promise).
///
/// Any `std::error::Error + Send + Sync + 'static` converts into a
/// `Rejection`, so `?` and `Into` work from continuations returning
/// `Result`. The concrete kind is recovered with [`Rejection::downcast`],
/// which is how [`Promise::error`](crate::Promise::error) decides whether a
/// handler matches.
///
/// # Examples
///
/// ```
/// use promise_chain::Rejection;
/// use std::fmt;
///
/// #[derive(Debug)]
/// struct Timeout;
///
/// impl fmt::Display for Timeout {
///     fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
///         f.write_str("timed out")
///     }
/// }
///
/// impl std::error::Error for Timeout {}
///
/// let rejection = Rejection::from(Timeout);
/// assert!(rejection.is::<Timeout>());
/// assert_eq!(rejection.to_string(), "timed out");
/// ```
pub struct Rejection {
    error: BoxError,
}

impl Rejection {
    pub fn new<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self {
            error: Box::new(error),
        }
    }

    /// Builds a rejection from a bare message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::new(Error::Message(message.into()))
    }

    pub fn is<E>(&self) -> bool
    where
        E: StdError + 'static,
    {
        self.error.is::<E>()
    }

    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: StdError + 'static,
    {
        self.error.downcast_ref::<E>()
    }

    /// Takes the error out if it is an `E`, or hands the rejection back
    /// untouched so it can keep travelling down the chain.
    pub fn downcast<E>(self) -> Result<E, Self>
    where
        E: StdError + 'static,
    {
        self.error
            .downcast::<E>()
            .map(|error| *error)
            .map_err(|error| Self { error })
    }

    pub fn into_inner(self) -> BoxError {
        self.error
    }
}

impl<E> From<E> for Rejection
where
    E: StdError + Send + Sync + 'static,
{
    fn from(error: E) -> Self {
        Self::new(error)
    }
}

impl fmt::Debug for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.error, f)
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.error, f)
    }
}

//! Step results and chain outcomes.
//!
//! A step reports what happened through [`Flow`]: it either produced an
//! output and the chain goes on, or it asked the chain to stop. The chain
//! itself resolves to an [`Outcome`], which additionally covers the case
//! where no step produced anything.

use crate::{Error, Result};

/// What a successful step hands back to the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flow<O> {
    /// Store the value as the chain's current output and keep going.
    Continue(O),
    /// Stop the chain now. No later step runs, catchers included.
    Abort,
}

impl<O> Flow<O> {
    /// Returns `true` if this is [`Flow::Abort`].
    pub fn is_abort(&self) -> bool {
        matches!(self, Flow::Abort)
    }
}

impl<O> From<O> for Flow<O> {
    fn from(value: O) -> Self {
        Flow::Continue(value)
    }
}

/// The final (or in-flight) output of a chain invocation.
///
/// # Example
///
/// ```rust
/// use middleware_chain::{Error, Outcome};
///
/// assert_eq!(Outcome::Value(3).into_value().unwrap(), 3);
/// assert!(matches!(Outcome::<i32>::Aborted.into_value(), Err(Error::Aborted)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Outcome<O> {
    /// No step has produced output.
    #[default]
    Empty,
    /// The most recent successful step output.
    Value(O),
    /// A step returned [`Flow::Abort`].
    Aborted,
}

impl<O> Outcome<O> {
    /// Returns `true` if no output was produced.
    pub fn is_empty(&self) -> bool {
        matches!(self, Outcome::Empty)
    }

    /// Returns `true` if the chain was aborted.
    pub fn is_aborted(&self) -> bool {
        matches!(self, Outcome::Aborted)
    }

    /// Borrow the output value, if there is one.
    pub fn value(&self) -> Option<&O> {
        match self {
            Outcome::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Convert into the output value, failing for empty or aborted outcomes.
    pub fn into_value(self) -> Result<O> {
        match self {
            Outcome::Value(v) => Ok(v),
            Outcome::Empty => Err(Error::NoOutput),
            Outcome::Aborted => Err(Error::Aborted),
        }
    }

    /// Convert into an `Option`, discarding the distinction between empty and aborted.
    pub fn ok(self) -> Option<O> {
        match self {
            Outcome::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Transform the output value, leaving empty and aborted outcomes untouched.
    pub fn map<U, F: FnOnce(O) -> U>(self, f: F) -> Outcome<U> {
        match self {
            Outcome::Value(v) => Outcome::Value(f(v)),
            Outcome::Empty => Outcome::Empty,
            Outcome::Aborted => Outcome::Aborted,
        }
    }
}

impl<O> From<Flow<O>> for Outcome<O> {
    fn from(flow: Flow<O>) -> Self {
        match flow {
            Flow::Continue(v) => Outcome::Value(v),
            Flow::Abort => Outcome::Aborted,
        }
    }
}

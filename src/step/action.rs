//! The callables a step wraps.
//!
//! A normal step wraps an [`Action`], which receives the chain's arguments.
//! A catcher step wraps a [`Catcher`], which receives the pending error
//! followed by the same arguments. Closures become actions through
//! [`LambdaAction`] / [`LambdaCatcher`] (async) or [`SyncAction`] /
//! [`SyncCatcher`] (plain functions).

use async_trait::async_trait;
use std::future::Future;
use std::marker::PhantomData;

use crate::Flow;

/// The unit of work behind a normal step.
///
/// `A` is the argument value every step of a chain receives, `O` the output
/// type and `E` the error type. Returning `Err` switches the chain onto the
/// error lane.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use middleware_chain::{Action, Flow};
///
/// struct Double;
///
/// #[async_trait]
/// impl Action<i32, i32, middleware_chain::Error> for Double {
///     async fn call(&self, x: i32) -> Result<Flow<i32>, middleware_chain::Error> {
///         Ok(Flow::Continue(x * 2))
///     }
/// }
/// ```
#[async_trait]
pub trait Action<A, O, E>: Send + Sync {
    /// Run the action with a copy of the chain's arguments.
    async fn call(&self, args: A) -> Result<Flow<O>, E>;
}

/// The unit of work behind a catcher step.
///
/// Only invoked while an error is pending. The error is moved in, so the
/// catcher owns it; returning `Ok` resumes the normal lane, returning `Err`
/// leaves a new error pending for the next catcher.
#[async_trait]
pub trait Catcher<A, O, E>: Send + Sync {
    /// Handle `error`, given a copy of the chain's arguments.
    async fn catch(&self, error: E, args: A) -> Result<Flow<O>, E>;
}

/// A type-erased [`Action`].
pub type BoxAction<A, O, E> = Box<dyn Action<A, O, E>>;

/// A type-erased [`Catcher`].
pub type BoxCatcher<A, O, E> = Box<dyn Catcher<A, O, E>>;

/// An action constructed from an async closure.
///
/// # Example
///
/// ```rust
/// use middleware_chain::{Action, Flow, LambdaAction};
///
/// # tokio_test::block_on(async {
/// let add = LambdaAction::new(|(a, b): (i32, i32)| async move {
///     Ok::<_, middleware_chain::Error>(Flow::Continue(a + b))
/// });
/// assert_eq!(add.call((2, 3)).await.unwrap(), Flow::Continue(5));
/// # });
/// ```
pub struct LambdaAction<A, O, E, F> {
    f: F,
    _phantom: PhantomData<fn(A) -> (O, E)>,
}

impl<A, O, E, F, Fut> LambdaAction<A, O, E, F>
where
    F: Fn(A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Flow<O>, E>> + Send + 'static,
{
    /// Create a new `LambdaAction` from the given closure.
    pub fn new(f: F) -> Self {
        Self {
            f,
            _phantom: PhantomData,
        }
    }
}

#[async_trait]
impl<A, O, E, F, Fut> Action<A, O, E> for LambdaAction<A, O, E, F>
where
    F: Fn(A) -> Fut + Send + Sync + 'static,
    A: Send + 'static,
    O: Send + 'static,
    E: Send + 'static,
    Fut: Future<Output = Result<Flow<O>, E>> + Send + 'static,
{
    async fn call(&self, args: A) -> Result<Flow<O>, E> {
        (self.f)(args).await
    }
}

/// A catcher constructed from an async closure taking `(error, args)`.
pub struct LambdaCatcher<A, O, E, F> {
    f: F,
    _phantom: PhantomData<fn(E, A) -> O>,
}

impl<A, O, E, F, Fut> LambdaCatcher<A, O, E, F>
where
    F: Fn(E, A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Flow<O>, E>> + Send + 'static,
{
    /// Create a new `LambdaCatcher` from the given closure.
    pub fn new(f: F) -> Self {
        Self {
            f,
            _phantom: PhantomData,
        }
    }
}

#[async_trait]
impl<A, O, E, F, Fut> Catcher<A, O, E> for LambdaCatcher<A, O, E, F>
where
    F: Fn(E, A) -> Fut + Send + Sync + 'static,
    A: Send + 'static,
    O: Send + 'static,
    E: Send + 'static,
    Fut: Future<Output = Result<Flow<O>, E>> + Send + 'static,
{
    async fn catch(&self, error: E, args: A) -> Result<Flow<O>, E> {
        (self.f)(error, args).await
    }
}

/// An action constructed from a synchronous closure.
///
/// A returned `Err` is captured exactly like an async failure.
pub struct SyncAction<A, O, E, F> {
    f: F,
    _phantom: PhantomData<fn(A) -> (O, E)>,
}

impl<A, O, E, F> SyncAction<A, O, E, F>
where
    F: Fn(A) -> Result<Flow<O>, E> + Send + Sync + 'static,
{
    /// Create a new `SyncAction` from the given closure.
    pub fn new(f: F) -> Self {
        Self {
            f,
            _phantom: PhantomData,
        }
    }
}

#[async_trait]
impl<A, O, E, F> Action<A, O, E> for SyncAction<A, O, E, F>
where
    F: Fn(A) -> Result<Flow<O>, E> + Send + Sync + 'static,
    A: Send + 'static,
    O: Send + 'static,
    E: Send + 'static,
{
    async fn call(&self, args: A) -> Result<Flow<O>, E> {
        (self.f)(args)
    }
}

/// A catcher constructed from a synchronous closure taking `(error, args)`.
pub struct SyncCatcher<A, O, E, F> {
    f: F,
    _phantom: PhantomData<fn(E, A) -> O>,
}

impl<A, O, E, F> SyncCatcher<A, O, E, F>
where
    F: Fn(E, A) -> Result<Flow<O>, E> + Send + Sync + 'static,
{
    /// Create a new `SyncCatcher` from the given closure.
    pub fn new(f: F) -> Self {
        Self {
            f,
            _phantom: PhantomData,
        }
    }
}

#[async_trait]
impl<A, O, E, F> Catcher<A, O, E> for SyncCatcher<A, O, E, F>
where
    F: Fn(E, A) -> Result<Flow<O>, E> + Send + Sync + 'static,
    A: Send + 'static,
    O: Send + 'static,
    E: Send + 'static,
{
    async fn catch(&self, error: E, args: A) -> Result<Flow<O>, E> {
        (self.f)(error, args)
    }
}

// Boxed actions and catchers are themselves usable wherever one is expected.
#[async_trait]
impl<A, O, E> Action<A, O, E> for BoxAction<A, O, E>
where
    A: Send + 'static,
    O: Send + 'static,
    E: Send + 'static,
{
    async fn call(&self, args: A) -> Result<Flow<O>, E> {
        (**self).call(args).await
    }
}

#[async_trait]
impl<A, O, E> Catcher<A, O, E> for BoxCatcher<A, O, E>
where
    A: Send + 'static,
    O: Send + 'static,
    E: Send + 'static,
{
    async fn catch(&self, error: E, args: A) -> Result<Flow<O>, E> {
        (**self).catch(error, args).await
    }
}

/// Extension trait for erasing the concrete type of an [`Action`].
pub trait ActionExt<A, O, E>: Action<A, O, E> + Sized {
    /// Erase the concrete action type, returning a trait object.
    ///
    /// Useful for registering differently-typed closures in one
    /// [`Chain::use_all`](crate::Chain::use_all) call.
    fn boxed(self) -> BoxAction<A, O, E>
    where
        Self: 'static,
    {
        Box::new(self)
    }
}

impl<A, O, E, T: Action<A, O, E> + Sized> ActionExt<A, O, E> for T {}

/// Extension trait for erasing the concrete type of a [`Catcher`].
pub trait CatcherExt<A, O, E>: Catcher<A, O, E> + Sized {
    /// Erase the concrete catcher type, returning a trait object.
    fn boxed(self) -> BoxCatcher<A, O, E>
    where
        Self: 'static,
    {
        Box::new(self)
    }
}

impl<A, O, E, T: Catcher<A, O, E> + Sized> CatcherExt<A, O, E> for T {}

#[cfg(test)]
mod tests {
    use super::*;

    type Res = Result<Flow<String>, String>;

    #[tokio::test]
    async fn test_sync_action_forwards_result() {
        let ok = SyncAction::new(|n: u32| -> Res { Ok(Flow::Continue(n.to_string())) });
        assert_eq!(ok.call(4).await, Ok(Flow::Continue("4".to_string())));

        let err = SyncAction::new(|_: u32| -> Res { Err("sync failure".to_string()) });
        assert_eq!(err.call(4).await, Err("sync failure".to_string()));
    }

    #[tokio::test]
    async fn test_catcher_receives_error_then_args() {
        let catcher = LambdaCatcher::new(|e: String, n: u32| async move {
            Ok::<_, String>(Flow::Continue(format!("{e}:{n}")))
        });
        assert_eq!(
            catcher.catch("oops".to_string(), 9).await,
            Ok(Flow::Continue("oops:9".to_string()))
        );
    }

    #[tokio::test]
    async fn test_boxed_action_delegates() {
        let boxed: BoxAction<u32, u32, String> =
            LambdaAction::new(|n: u32| async move { Ok::<_, String>(Flow::Continue(n + 1)) })
                .boxed();
        assert_eq!(boxed.call(1).await, Ok(Flow::Continue(2)));

        let boxed: BoxCatcher<u32, u32, String> =
            SyncCatcher::new(|_: String, _: u32| -> Result<Flow<u32>, String> { Ok(Flow::Abort) })
                .boxed();
        assert_eq!(boxed.catch("x".to_string(), 0).await, Ok(Flow::Abort));
    }
}

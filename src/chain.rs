//! The chain: an ordered registry of steps and the function that runs them.

use futures::future::{BoxFuture, FutureExt};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::step::{Action, Catcher, LambdaAction, LambdaCatcher, Step, SyncAction, SyncCatcher};
use crate::{Error, ExecutionContext, ExecutionReport, Flow, Outcome};

/// An append-only sequence of normal and catcher steps.
///
/// Steps run in registration order against a fresh [`ExecutionContext`] per
/// invocation. A failing step switches the chain onto the error lane: normal
/// steps are bypassed until a catcher registered *after* the failure takes the
/// error. A step returning [`Flow::Abort`] stops the chain immediately.
///
/// `A` is the argument value handed (as a clone) to every step, `O` the
/// output type and `E` the error type, defaulting to [`Error`].
///
/// # Example
///
/// ```rust
/// use middleware_chain::{Chain, Flow, Outcome};
///
/// # tokio_test::block_on(async {
/// let mut chain: Chain<(i32, i32), String, String> = Chain::new().with_name("divide");
/// chain
///     .use_fn(|(a, b)| async move {
///         if b == 0 {
///             return Err("division by zero".to_string());
///         }
///         Ok(Flow::Continue((a / b).to_string()))
///     })
///     .catch_fn(|err, (a, _)| async move {
///         Ok::<_, String>(Flow::Continue(format!("{a} (recovered: {err})")))
///     });
///
/// assert_eq!(chain.run((6, 3)).await, Ok(Outcome::Value("2".to_string())));
/// assert_eq!(
///     chain.run((6, 0)).await,
///     Ok(Outcome::Value("6 (recovered: division by zero)".to_string()))
/// );
/// # });
/// ```
pub struct Chain<A, O, E = Error> {
    steps: Vec<Step<A, O, E>>,
    name: String,
    tracing: bool,
}

impl<A, O, E> Default for Chain<A, O, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A, O, E> fmt::Debug for Chain<A, O, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain")
            .field("name", &self.name)
            .field("tracing", &self.tracing)
            .field("steps", &self.steps)
            .finish()
    }
}

impl<A, O, E> Chain<A, O, E> {
    /// Returned by a step to stop the chain. Same value as [`Flow::Abort`].
    pub const NO_NEXT: Flow<O> = Flow::Abort;

    /// Create an empty chain named `"chain"` with tracing enabled.
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            name: "chain".to_string(),
            tracing: true,
        }
    }

    /// Set a human-readable name for this chain.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Enable or disable trace recording. Metrics are collected either way.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.tracing = enabled;
        self
    }

    /// Returns the name of this chain.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of registered steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns `true` if no step has been registered.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// The registered steps, in execution order.
    pub fn steps(&self) -> &[Step<A, O, E>] {
        &self.steps
    }

    /// Append a normal step.
    pub fn use_step(&mut self, action: impl Action<A, O, E> + 'static) -> &mut Self {
        let index = self.steps.len();
        self.steps.push(Step::normal(index, action));
        self
    }

    /// Append several normal steps, in iteration order.
    ///
    /// Differently-typed actions can be registered together by boxing them
    /// with [`ActionExt::boxed`](crate::ActionExt::boxed).
    pub fn use_all<I>(&mut self, actions: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Action<A, O, E> + 'static,
    {
        for action in actions {
            self.use_step(action);
        }
        self
    }

    /// Append a catcher step.
    pub fn catch(&mut self, catcher: impl Catcher<A, O, E> + 'static) -> &mut Self {
        let index = self.steps.len();
        self.steps.push(Step::catcher(index, catcher));
        self
    }

    /// Append several catcher steps, in iteration order.
    pub fn catch_all<I>(&mut self, catchers: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Catcher<A, O, E> + 'static,
    {
        for catcher in catchers {
            self.catch(catcher);
        }
        self
    }
}

impl<A, O, E> Chain<A, O, E>
where
    A: Clone + Send + Sync + 'static,
    O: Send + 'static,
    E: fmt::Display + Send + 'static,
{
    /// Append a normal step from an async closure.
    pub fn use_fn<F, Fut>(&mut self, f: F) -> &mut Self
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Flow<O>, E>> + Send + 'static,
    {
        self.use_step(LambdaAction::new(f))
    }

    /// Append a normal step from a synchronous closure.
    pub fn use_sync<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(A) -> Result<Flow<O>, E> + Send + Sync + 'static,
    {
        self.use_step(SyncAction::new(f))
    }

    /// Append a catcher step from an async closure taking `(error, args)`.
    pub fn catch_fn<F, Fut>(&mut self, f: F) -> &mut Self
    where
        F: Fn(E, A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Flow<O>, E>> + Send + 'static,
    {
        self.catch(LambdaCatcher::new(f))
    }

    /// Append a catcher step from a synchronous closure taking `(error, args)`.
    pub fn catch_sync<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(E, A) -> Result<Flow<O>, E> + Send + Sync + 'static,
    {
        self.catch(SyncCatcher::new(f))
    }

    /// Run every step against a fresh context.
    ///
    /// Returns `Err` with the pending error if one is left after the last
    /// step, otherwise the final [`Outcome`]. An aborted chain resolves to
    /// `Ok(Outcome::Aborted)`; a chain where nothing ran resolves to
    /// `Ok(Outcome::Empty)`.
    pub async fn run(&self, args: A) -> Result<Outcome<O>, E> {
        self.execute(args).await.into_result()
    }

    /// Run the chain, returning the result along with the execution report.
    pub async fn run_with_report(&self, args: A) -> (Result<Outcome<O>, E>, ExecutionReport) {
        let (result, metrics, traces) = self.execute(args).await.into_parts();
        let report = ExecutionReport {
            chain_name: self.name.clone(),
            metrics,
            traces,
        };
        (result, report)
    }

    /// Consume the chain, returning it as a single async function.
    ///
    /// The function is cheap to clone and may be called concurrently; every
    /// call runs with its own context.
    ///
    /// ```rust
    /// use middleware_chain::{Chain, Flow, Outcome};
    ///
    /// # tokio_test::block_on(async {
    /// let mut chain: Chain<u32, u32> = Chain::new();
    /// chain.use_sync(|n| Ok(Flow::Continue(n + 1)));
    ///
    /// let run = chain.into_fn();
    /// assert_eq!(run(41).await.unwrap(), Outcome::Value(42));
    /// # });
    /// ```
    pub fn into_fn(
        self,
    ) -> impl Fn(A) -> BoxFuture<'static, Result<Outcome<O>, E>> + Clone + Send + Sync {
        let chain = Arc::new(self);
        move |args| {
            let chain = Arc::clone(&chain);
            async move { chain.run(args).await }.boxed()
        }
    }

    #[instrument(
        name = "Chain::run",
        skip_all,
        fields(chain = %self.name, steps = self.steps.len())
    )]
    async fn execute(&self, args: A) -> ExecutionContext<O, E> {
        let mut ctx = ExecutionContext::new().with_tracing(self.tracing);

        for step in &self.steps {
            ctx = step.evaluate(ctx, &args).await;
            if ctx.is_aborted() {
                debug!(step = step.index(), "chain aborted, remaining steps not run");
                break;
            }
        }

        if let Some(error) = ctx.error() {
            debug!(error = %error, "chain finished with an unhandled error");
        }
        ctx
    }
}

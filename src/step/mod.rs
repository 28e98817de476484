//! Steps and the routing rules that decide whether they run.
//!
//! A [`Step`] wraps one [`Action`] or [`Catcher`]. Whether it runs for a
//! given context is decided by [`route`], a pure function of the context's
//! lane and the step's [`StepKind`]:
//!
//! | lane                   | normal step      | catcher          |
//! |------------------------|------------------|------------------|
//! | `Ok(Outcome::Aborted)` | skip             | skip             |
//! | other `Ok(_)`          | run              | skip             |
//! | `Err(_)`               | skip             | run, taking error|

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;
use tracing::{debug, trace, warn};

use crate::events::ChainEvent;
use crate::{ExecutionContext, Flow, Outcome};

pub mod action;

pub use action::{
    Action, ActionExt, BoxAction, BoxCatcher, Catcher, CatcherExt, LambdaAction, LambdaCatcher,
    SyncAction, SyncCatcher,
};

/// Whether a step belongs to the normal lane or the error lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    /// Runs while no error is pending.
    Normal,
    /// Runs only while an error is pending, and consumes it.
    Catcher,
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepKind::Normal => f.write_str("normal"),
            StepKind::Catcher => f.write_str("catcher"),
        }
    }
}

/// Why a step was bypassed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// An earlier step aborted the chain.
    Aborted,
    /// The step is a catcher but no error is pending.
    NothingToCatch,
    /// The step is a normal step and an error is pending.
    ErrorPending,
}

/// The routing decision for one step against one context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Invoke the step's callable.
    Run,
    /// Leave the context untouched.
    Skip(SkipReason),
}

/// Decide whether a step of `kind` runs against `lane`.
///
/// Rules are checked in order and the first match wins; an aborted lane
/// stops every step, catchers included.
pub fn route<O, E>(lane: &Result<Outcome<O>, E>, kind: StepKind) -> Route {
    match (lane, kind) {
        (Ok(Outcome::Aborted), _) => Route::Skip(SkipReason::Aborted),
        (Ok(_), StepKind::Catcher) => Route::Skip(SkipReason::NothingToCatch),
        (Err(_), StepKind::Normal) => Route::Skip(SkipReason::ErrorPending),
        (Err(_), StepKind::Catcher) | (Ok(_), StepKind::Normal) => Route::Run,
    }
}

enum StepAction<A, O, E> {
    Normal(BoxAction<A, O, E>),
    Catcher(BoxCatcher<A, O, E>),
}

/// One registered unit of work in a chain.
///
/// The step's kind is fixed when it is created. Its index is its position in
/// the owning chain and is only used to label logs and trace events.
pub struct Step<A, O, E> {
    index: usize,
    action: StepAction<A, O, E>,
}

impl<A, O, E> Step<A, O, E> {
    /// Returned by a step to stop the chain. Same value as [`Flow::Abort`].
    pub const NO_NEXT: Flow<O> = Flow::Abort;

    /// Wrap `action` as a normal step at position `index`.
    pub fn normal(index: usize, action: impl Action<A, O, E> + 'static) -> Self {
        Self {
            index,
            action: StepAction::Normal(Box::new(action)),
        }
    }

    /// Wrap `catcher` as a catcher step at position `index`.
    pub fn catcher(index: usize, catcher: impl Catcher<A, O, E> + 'static) -> Self {
        Self {
            index,
            action: StepAction::Catcher(Box::new(catcher)),
        }
    }

    /// Position of this step in its chain.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Whether this is a normal step or a catcher.
    pub fn kind(&self) -> StepKind {
        match self.action {
            StepAction::Normal(_) => StepKind::Normal,
            StepAction::Catcher(_) => StepKind::Catcher,
        }
    }

    /// Returns `true` for catcher steps.
    pub fn is_catcher(&self) -> bool {
        self.kind() == StepKind::Catcher
    }
}

impl<A, O, E> fmt::Debug for Step<A, O, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step")
            .field("index", &self.index)
            .field("kind", &self.kind())
            .finish()
    }
}

impl<A, O, E> Step<A, O, E>
where
    A: Clone + Send + Sync + 'static,
    O: Send + 'static,
    E: fmt::Display + Send + 'static,
{
    /// Evaluate this step against `ctx`, returning the updated context.
    ///
    /// A skipped step returns the context unchanged apart from metrics and
    /// trace entries. A catcher takes the pending error out of the context
    /// before it runs and receives it as its first argument; whatever it
    /// returns becomes the new lane. Action failures are stored verbatim.
    pub async fn evaluate(
        &self,
        mut ctx: ExecutionContext<O, E>,
        args: &A,
    ) -> ExecutionContext<O, E> {
        let kind = self.kind();
        let step = self.index;

        if let Route::Skip(reason) = route(ctx.lane(), kind) {
            trace!(step, %kind, ?reason, "step skipped");
            ctx.metrics_mut().record_skip();
            ctx.emit(ChainEvent::StepSkipped { step, kind, reason });
            return ctx;
        }

        let pending = match &self.action {
            StepAction::Normal(action) => action.as_ref().call(args.clone()),
            StepAction::Catcher(catcher) => {
                let Some(error) = ctx.take_error() else {
                    return ctx;
                };
                let message = error.to_string();
                debug!(step, error = %message, "catching pending error");
                ctx.metrics_mut().record_catch();
                ctx.emit(ChainEvent::ErrorCaught { step, message });
                catcher.as_ref().catch(error, args.clone())
            }
        };

        debug!(step, %kind, "running step");
        ctx.metrics_mut().record_run();
        ctx.emit(ChainEvent::StepStart { step, kind });

        let start = Instant::now();
        let result = pending.await;
        let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        match result {
            Ok(Flow::Continue(output)) => {
                ctx.emit(ChainEvent::StepEnd {
                    step,
                    kind,
                    duration_ms,
                });
                ctx.set_outcome(Outcome::Value(output));
            }
            Ok(Flow::Abort) => {
                debug!(step, "step aborted the chain");
                ctx.emit(ChainEvent::StepEnd {
                    step,
                    kind,
                    duration_ms,
                });
                ctx.emit(ChainEvent::ChainAborted { step });
                ctx.metrics_mut().record_abort(step);
                ctx.set_outcome(Outcome::Aborted);
            }
            Err(error) => {
                let message = error.to_string();
                warn!(step, %kind, error = %message, "step failed");
                ctx.metrics_mut().record_failure(message.clone());
                ctx.emit(ChainEvent::StepFailed {
                    step,
                    kind,
                    message,
                    duration_ms,
                });
                ctx.fail(error);
            }
        }

        ctx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, PartialEq)]
    struct Boom(&'static str);

    impl fmt::Display for Boom {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "boom: {}", self.0)
        }
    }

    type Args = (&'static str, i32, bool);
    type Ctx = ExecutionContext<&'static str, Boom>;
    type Calls<T> = Arc<Mutex<Vec<T>>>;

    fn new_log<T>() -> Calls<T> {
        Arc::new(Mutex::new(Vec::new()))
    }

    const ARGS: Args = ("a", 1, true);

    fn recording_step(
        calls: &Calls<Args>,
        result: Result<Flow<&'static str>, Boom>,
    ) -> Step<Args, &'static str, Boom> {
        let calls = Arc::clone(calls);
        Step::normal(
            0,
            LambdaAction::new(move |args: Args| {
                calls.lock().unwrap().push(args);
                let result = result.clone();
                async move { result }
            }),
        )
    }

    fn recording_catcher(
        calls: &Calls<(Boom, Args)>,
        result: Result<Flow<&'static str>, Boom>,
    ) -> Step<Args, &'static str, Boom> {
        let calls = Arc::clone(calls);
        Step::catcher(
            0,
            LambdaCatcher::new(move |error: Boom, args: Args| {
                calls.lock().unwrap().push((error, args));
                let result = result.clone();
                async move { result }
            }),
        )
    }

    #[test]
    fn test_route_table() {
        let empty: Result<Outcome<u8>, Boom> = Ok(Outcome::Empty);
        let value: Result<Outcome<u8>, Boom> = Ok(Outcome::Value(1));
        let aborted: Result<Outcome<u8>, Boom> = Ok(Outcome::Aborted);
        let failed: Result<Outcome<u8>, Boom> = Err(Boom("x"));

        assert_eq!(route(&empty, StepKind::Normal), Route::Run);
        assert_eq!(route(&value, StepKind::Normal), Route::Run);
        assert_eq!(route(&empty, StepKind::Catcher), Route::Skip(SkipReason::NothingToCatch));
        assert_eq!(route(&value, StepKind::Catcher), Route::Skip(SkipReason::NothingToCatch));
        assert_eq!(route(&failed, StepKind::Normal), Route::Skip(SkipReason::ErrorPending));
        assert_eq!(route(&failed, StepKind::Catcher), Route::Run);
        assert_eq!(route(&aborted, StepKind::Normal), Route::Skip(SkipReason::Aborted));
        assert_eq!(route(&aborted, StepKind::Catcher), Route::Skip(SkipReason::Aborted));
    }

    #[test]
    fn test_kind_is_fixed_at_creation() {
        let calls = new_log();
        let step = recording_step(&calls, Ok(Flow::Continue("x")));
        assert_eq!(step.kind(), StepKind::Normal);
        assert!(!step.is_catcher());

        let calls = new_log();
        let catcher = recording_catcher(&calls, Ok(Flow::Continue("x")));
        assert!(catcher.is_catcher());
        assert_eq!(Step::<Args, &str, Boom>::NO_NEXT, Flow::Abort);
    }

    #[tokio::test]
    async fn test_calls_wrapped_action_with_args() {
        let calls = new_log();
        let step = recording_step(&calls, Ok(Flow::Continue("out")));

        step.evaluate(Ctx::new(), &ARGS).await;

        assert_eq!(*calls.lock().unwrap(), vec![ARGS]);
    }

    #[tokio::test]
    async fn test_captures_output() {
        let calls = new_log();
        let step = recording_step(&calls, Ok(Flow::Continue("test output")));

        let ctx = step.evaluate(Ctx::new().with_output("previous"), &ARGS).await;

        assert_eq!(ctx.output(), Some(&Outcome::Value("test output")));
        assert_eq!(ctx.metrics().steps_run, 1);
    }

    #[tokio::test]
    async fn test_captures_error() {
        let calls = new_log();
        let step = recording_step(&calls, Err(Boom("test error")));

        let ctx = step.evaluate(Ctx::new(), &ARGS).await;

        assert_eq!(ctx.error(), Some(&Boom("test error")));
        assert_eq!(ctx.metrics().failures, vec!["boom: test error".to_string()]);
    }

    #[tokio::test]
    async fn test_nothing_runs_once_aborted() {
        let calls = new_log();
        let step = recording_step(&calls, Ok(Flow::Continue("x")));
        let caught = new_log();
        let catcher = recording_catcher(&caught, Ok(Flow::Continue("x")));

        let ctx = step.evaluate(Ctx::new().aborted(), &ARGS).await;
        let ctx = catcher.evaluate(ctx, &ARGS).await;

        assert!(calls.lock().unwrap().is_empty());
        assert!(caught.lock().unwrap().is_empty());
        assert!(ctx.is_aborted());
        assert_eq!(ctx.metrics().steps_skipped, 2);
    }

    #[tokio::test]
    async fn test_normal_step_skipped_while_error_pending() {
        let calls = new_log();
        let step = recording_step(&calls, Ok(Flow::Continue("test output")));

        let ctx = step.evaluate(Ctx::new().with_error(Boom("test error")), &ARGS).await;

        assert!(calls.lock().unwrap().is_empty());
        assert_eq!(ctx.error(), Some(&Boom("test error")));
        assert_eq!(ctx.output(), None);
    }

    #[tokio::test]
    async fn test_catcher_receives_error_and_clears_it() {
        let caught = new_log();
        let catcher = recording_catcher(&caught, Ok(Flow::Continue("test output")));

        let ctx = catcher.evaluate(Ctx::new().with_error(Boom("test error")), &ARGS).await;

        assert_eq!(*caught.lock().unwrap(), vec![(Boom("test error"), ARGS)]);
        assert_eq!(ctx.output(), Some(&Outcome::Value("test output")));
        assert!(!ctx.has_error());
        assert_eq!(ctx.metrics().errors_caught, 1);
    }

    #[tokio::test]
    async fn test_catcher_skipped_without_error() {
        let caught = new_log();
        let catcher = recording_catcher(&caught, Ok(Flow::Continue("test output")));

        let ctx = catcher.evaluate(Ctx::new(), &ARGS).await;

        assert!(caught.lock().unwrap().is_empty());
        assert_eq!(ctx.output(), Some(&Outcome::Empty));
        assert!(!ctx.has_error());
    }

    #[tokio::test]
    async fn test_failing_catcher_replaces_error() {
        let caught = new_log();
        let catcher = recording_catcher(&caught, Err(Boom("second")));

        let ctx = catcher.evaluate(Ctx::new().with_error(Boom("first")), &ARGS).await;

        assert_eq!(caught.lock().unwrap()[0].0, Boom("first"));
        assert_eq!(ctx.error(), Some(&Boom("second")));
    }

    #[tokio::test]
    async fn test_abort_marks_context() {
        let calls = new_log();
        let step = recording_step(&calls, Ok(Step::<Args, &str, Boom>::NO_NEXT));

        let ctx = step.evaluate(Ctx::new().with_output("earlier"), &ARGS).await;

        assert!(ctx.is_aborted());
        assert_eq!(ctx.metrics().aborted_at, Some(0));
        assert!(matches!(
            ctx.traces().last().map(|t| &t.event),
            Some(ChainEvent::ChainAborted { step: 0 })
        ));
    }
}

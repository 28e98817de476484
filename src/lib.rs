//! # middleware-chain
//!
//! Sequential, async middleware chains with order-dependent error catchers.
//!
//! A [`Chain`] runs its steps one after another against a fresh
//! [`ExecutionContext`]. Every step receives a clone of the same argument
//! value. The context is on one of two lanes at a time:
//!
//! - **output lane**: normal steps run and each successful result replaces
//!   the current output;
//! - **error lane**: a step failed, so normal steps are bypassed until the
//!   next catcher takes the error, receiving it ahead of the arguments.
//!
//! A step can end the chain early by returning [`Flow::Abort`]. When the
//! chain finishes, a still-pending error is returned as `Err`; otherwise the
//! final [`Outcome`] is returned.
//!
//! ## Core Concepts
//!
//! - **Chain**: append-only registry of steps plus the composed function
//! - **Step**: one normal or catcher unit, with the routing rules in [`route`]
//! - **Action / Catcher**: the callables a step wraps
//! - **Flow / Outcome**: what a step returns and what a chain resolves to
//! - **ExecutionContext**: per-invocation lane, metrics and trace log
//! - **ExecutionReport**: serializable metrics and trace of one invocation
//!
//! ## Example: Recovering From a Failure
//!
//! ```rust
//! use middleware_chain::{Chain, Flow, Outcome};
//!
//! # tokio_test::block_on(async {
//! let mut chain: Chain<&'static str, usize, String> = Chain::new().with_name("parse");
//! chain
//!     .use_sync(|input| input.parse::<usize>().map(Flow::Continue).map_err(|e| e.to_string()))
//!     .use_sync(|input| Ok(Flow::Continue(input.len())))
//!     .catch_sync(|_err, _input| Ok(Flow::Continue(0)));
//!
//! // "12" parses, then the second step replaces the output with the length.
//! assert_eq!(chain.run("12").await, Ok(Outcome::Value(2)));
//! // "x" fails, the second step is bypassed and the catcher recovers.
//! assert_eq!(chain.run("x").await, Ok(Outcome::Value(0)));
//! # });
//! ```

pub mod chain;
pub mod context;
pub mod error;
pub mod events;
pub mod flow;
pub mod metrics;
pub mod report;
pub mod step;

pub use chain::Chain;
pub use context::ExecutionContext;
pub use error::{Error, Result};
pub use events::{ChainEvent, TraceEntry};
pub use flow::{Flow, Outcome};
pub use metrics::ChainMetrics;
pub use report::ExecutionReport;

// Re-export step types
pub use step::{
    route, Action, ActionExt, BoxAction, BoxCatcher, Catcher, CatcherExt, LambdaAction,
    LambdaCatcher, Route, SkipReason, Step, StepKind, SyncAction, SyncCatcher,
};

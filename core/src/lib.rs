// zahroflow/src/lib.rs

//! zahroflow: the staged-workflow engine behind the zahroshop service.
//!
//! A [`Flow`] is an ordered list of named stages. Each stage may carry
//! `before`, `on` and `after` handlers, a skip condition, and may be marked
//! optional (allowed to have no handlers) or best-effort (handler failures are
//! logged and the run moves on). Handlers are async functions over a shared
//! [`FlowContext`] and steer the run with [`FlowControl`].
//!
//! Flows are registered in a [`FlowRegistry`], keyed by their context data
//! type, and dispatched from request handlers. [`KeyedLocks`] provides the
//! per-entity single-writer sections the shop runs its flows under.

pub mod core;
pub mod error;
pub mod flow;
pub mod keyed_lock;
pub mod registry;

pub use crate::core::context_data::FlowContext;
pub use crate::core::control::{FlowControl, FlowOutcome};
pub use crate::core::handler::{Handler, HandlerFuture};
pub use crate::core::stage::{SkipCondition, StageDef};

pub use crate::flow::Flow;

pub use crate::error::{FlowError, FlowResult};

pub use crate::keyed_lock::{KeyedGuard, KeyedLocks};
pub use crate::registry::FlowRegistry;

pub mod context_data;
pub mod control;
pub mod handler;
pub mod stage;

pub use context_data::FlowContext;
pub use control::{FlowControl, FlowOutcome};
pub use handler::Handler;
pub use stage::{SkipCondition, StageDef};

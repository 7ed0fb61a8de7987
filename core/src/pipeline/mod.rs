pub mod guard;
pub mod runner;

pub use guard::{InFlightGuard, PanelState, Ticket};
pub use runner::{dispatch_batch, dispatch_single, Dispatch, Outcome, Pipeline, PreparedBatch, PreparedSingle};

//! Threshold alerting: a periodic evaluator counts matching log documents
//! per rule and drives a two-state machine whose edges emit bus events.

pub mod evaluator;
pub mod models;
pub mod state;

pub use evaluator::Evaluator;
pub use models::AlertEvent;
pub use state::{next_state, transition_event, AlertState, EventState};

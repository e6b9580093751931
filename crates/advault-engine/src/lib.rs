//! The deal orchestration core: state machine (F), requirement evaluator
//! (G), and creative pipeline (H).

pub mod creative;
pub mod error;
pub mod evaluator;
pub mod state_machine;

pub use creative::{CreativePayload, CreativePipeline, CreativeView};
pub use error::EngineError;
pub use evaluator::{EvaluationResult, RequirementEvaluator, RequirementOutcome, WaiveResult};
pub use state_machine::{allowed_transitions, DealEngine};

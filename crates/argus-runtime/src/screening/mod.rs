//! Sanctions and watchlist screening
//!
//! Query preprocessing, external collaborators and the concurrent check
//! orchestrator.

pub mod collaborators;
mod evaluator;
pub mod pipeline;
mod types;

pub use collaborators::{
    DisabledRecognizer, EntityRecognizer, MemoryWhitelist, NoWhitelist, RecognizedEntity,
    ScreeningProvider, WhitelistRepository,
};
pub use evaluator::{ScreeningEvaluator, ScreeningOutcome};
pub use pipeline::{PreprocessingPipeline, PreprocessingStage, StageInput};
pub use types::{
    ScreeningExecution, ScreeningMatch, ScreeningQuery, ScreeningRequest, ScreeningStatus,
    SUBJECT_FIELD,
};

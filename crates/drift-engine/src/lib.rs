mod classify;
mod correlate;
mod engine;
mod error;

pub use classify::AnalysisMode;
pub use correlate::{correlate, Correlation};
pub use engine::{analyze, AnalysisOutcome, AnalysisRequest};
pub use error::EngineError;

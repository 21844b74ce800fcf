//! Image-enhancement orchestration.
//!
//! One [`EnhancementPipeline::run`] call turns an uploaded image into a stored,
//! charged, recorded artifact:
//!
//! 1. [`gate`] -- identity, maintenance switch, credit balance (read only).
//! 2. Configuration resolution over the invocation's settings snapshot.
//! 3. Signed source URL from object storage.
//! 4. [`invoke`] -- enhancement provider call and failure policy.
//! 5. [`background`] -- optional concurrent background replacement.
//! 6. [`settle`] -- upload, atomic credit decrement, result row.
//! 7. Response assembly.

pub mod background;
pub mod error;
pub mod gate;
pub mod invoke;
pub mod options;
pub mod pipeline;
pub mod request;
pub mod settle;

pub use error::PipelineError;
pub use options::{CompositeMode, FailurePolicy, PipelineOptions};
pub use pipeline::{Collaborators, EnhancementPipeline};
pub use request::{ProcessRequest, ProcessResponse};

mod plan;
mod types;

pub use plan::invalidation_patterns;
pub use types::{InvalidationError, InvalidationOutcome, InvalidationStage};

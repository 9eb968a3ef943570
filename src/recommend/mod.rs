pub mod collected;
pub mod session;
pub mod verify;

pub use collected::{Collected, SkipReason};
pub use session::{RecommendationSession, SessionBuilder, SessionOutcome, sample_seed};
pub use verify::verify;

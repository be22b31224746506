pub mod session;
pub mod synthetic;

pub use session::{SessionMetadata, SessionRecList, DEFAULT_HIT_RATE_K};
pub use synthetic::{SyntheticConfig, SyntheticSessions};

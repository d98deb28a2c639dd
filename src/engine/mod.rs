pub mod client;
pub mod context;
pub mod endpoint;
pub mod error;
pub mod events;
pub mod latency;
pub mod metadata;
pub mod payload;
pub mod quality;
pub mod selector;
pub mod session;
pub mod store;
pub mod transfer;
pub mod trials;
pub mod types;
pub mod units;

pub use endpoint::Endpoint;
pub use error::SpeedTestError;
pub use session::SpeedTest;
pub use types::{SessionEvent, SessionOutcome, SessionReport, SessionState, SpeedTestConfig};

#[cfg(test)]
pub(crate) mod test_support;

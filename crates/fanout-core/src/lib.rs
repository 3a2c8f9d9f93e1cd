pub mod clock;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod pool;
pub mod record;
pub mod worker;

pub use error::{FanoutError, Result, WorkerError};
pub use orchestrator::Orchestrator;
pub use record::{ResultRecord, TimeSnapshot};

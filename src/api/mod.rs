//! This mod holds the library's client-facing API.
mod client;
mod options;
mod replicated_log;
mod wiring;
mod write_handle;

pub use client::ReplicatedLogClient;
pub use options::ReplicatedLogOptions;
pub use replicated_log::ReplicatedLog;
pub use wiring::start_replicated_log;
pub use wiring::ReplicatedLogConfig;
pub use wiring::StartupError;
pub use write_handle::WriteError;
pub use write_handle::WriteHandle;
pub use write_handle::WriteOutcome;
pub use write_handle::WriteResult;

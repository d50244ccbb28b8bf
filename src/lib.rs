// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod activity;
pub mod app_dirs;
pub mod config;
pub mod error;
pub mod events;
pub mod export;
pub mod monitor;
pub mod quiz;
pub mod replay;
pub mod risk;
pub mod runtime;
pub mod session;
pub mod stats;

pub use error::VigilError;
pub use events::{EventKind, EventRecorder, InteractionEvent, Signal};
pub use session::{ProctorSession, SubmissionReport};

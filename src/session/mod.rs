//! One end-to-end run: validate, acquire, launch, probe, bootstrap, run, tear down.
pub mod command;
pub mod env;
pub mod launch;
mod orchestrator;
pub mod paths;
mod types;

pub use orchestrator::Orchestrator;
pub use types::{Session, SessionInput};

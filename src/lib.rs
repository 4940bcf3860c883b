//! Run a command against a disposable, freshly licensed Posit Connect container.
//!
//! A session pulls (or reuses) the server image, starts it with a one-time
//! bootstrap secret, waits for it to come up, trades the secret for an API key,
//! hands that key to the user's command, and stops the container afterward.

pub mod acquire;
pub mod bootstrap;
pub mod cli;
pub mod config;
pub mod docker;
pub mod error;
pub mod readiness;
pub mod session;
pub mod tag;

pub use error::{ProbePhase, SessionError};

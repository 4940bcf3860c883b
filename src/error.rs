use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::bootstrap::BootstrapError;

/// Result type alias for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;

/// Which readiness phase ran out of time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbePhase {
    Network,
    Log,
}

impl std::fmt::Display for ProbePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Network => f.write_str("a TCP connection"),
            Self::Log => f.write_str("the HTTP server start message"),
        }
    }
}

/// Fatal orchestration failures. Each maps to exit code 1.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("License file does not exist: {}", .0.display())]
    LicenseNotFound(PathBuf),

    #[error("Config file does not exist: {}", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("no usable image for {image}")]
    Acquisition {
        image: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    #[error("failed to start container from {image}")]
    Launch {
        image: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    #[error("Posit Connect did not start within {}s: timed out waiting for {phase} on port {port}", .timeout.as_secs())]
    StartupTimeout {
        phase: ProbePhase,
        port: u16,
        timeout: Duration,
    },

    #[error("Posit Connect rejected the license: unable to obtain a valid license")]
    LicenseRejected,

    #[error("bootstrap failed")]
    Bootstrap(#[from] BootstrapError),
}

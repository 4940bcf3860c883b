use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::readiness::ProbeSettings;

/// Connect's fixed in-container HTTP port.
pub const CONTAINER_PORT: u16 = 3939;

/// Project defaults read from `.with-connect.yaml`. Every field is optional in
/// the file; command-line flags take precedence over it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub image: String,
    pub version: String,
    pub license: String,
    /// Host port published to the server's HTTP port.
    pub port: u16,
    pub platform: Option<String>,
    pub privileged: bool,
    /// Seconds allowed for each readiness phase.
    pub startup_timeout: u64,
    /// Seconds between readiness polls. Values below one are raised to one.
    pub poll_interval: u64,
    /// Seconds allowed for any single docker call other than pull.
    pub docker_timeout: u64,
    pub pull_timeout: u64,
    pub bootstrap_timeout: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            image: "rstudio/rstudio-connect".to_string(),
            version: "2025.09.0".to_string(),
            license: "./rstudio-connect.lic".to_string(),
            port: CONTAINER_PORT,
            platform: Some("linux/amd64".to_string()),
            privileged: true,
            startup_timeout: 60,
            poll_interval: 2,
            docker_timeout: 60,
            pull_timeout: 600,
            bootstrap_timeout: 30,
        }
    }
}

impl Config {
    pub fn probe_settings(&self) -> ProbeSettings {
        ProbeSettings {
            network_timeout: Duration::from_secs(self.startup_timeout),
            log_timeout: Duration::from_secs(self.startup_timeout),
            poll_interval: Duration::from_secs(self.poll_interval.max(1)),
        }
    }

    pub fn docker_timeout(&self) -> Duration {
        Duration::from_secs(self.docker_timeout)
    }

    pub fn pull_timeout(&self) -> Duration {
        Duration::from_secs(self.pull_timeout)
    }

    pub fn bootstrap_timeout(&self) -> Duration {
        Duration::from_secs(self.bootstrap_timeout)
    }
}

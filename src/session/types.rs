use std::path::PathBuf;

use secrecy::SecretString;

use crate::bootstrap::BootstrapSecret;
use crate::readiness::ProbeSettings;
use crate::tag::resolve_tag;

/// Everything a session needs, already merged from flags and the project file.
#[derive(Debug, Clone)]
pub struct SessionInput {
    pub image: String,
    pub version: String,
    /// Absolute license path.
    pub license: PathBuf,
    /// Absolute path of a `rstudio-connect.gcfg` to mount, if any.
    pub config: Option<PathBuf>,
    /// `KEY=VALUE` pairs for the container, in command-line order.
    pub env_overrides: Vec<(String, String)>,
    pub quiet: bool,
    pub port: u16,
    pub platform: Option<String>,
    pub privileged: bool,
    pub probe: ProbeSettings,
    /// Trailing command; empty when none was given.
    pub command: Vec<String>,
}

/// State of one run, filled in as the phases progress.
#[derive(Debug)]
pub struct Session {
    pub license_path: PathBuf,
    pub config_path: Option<PathBuf>,
    pub version: String,
    pub tag: String,
    pub secret: BootstrapSecret,
    pub port: u16,
    pub api_key: Option<SecretString>,
    pub exit_code: i32,
}

impl Session {
    /// New session with a fresh bootstrap secret.
    pub fn new(input: &SessionInput) -> Self {
        Self {
            license_path: input.license.clone(),
            config_path: input.config.clone(),
            version: input.version.clone(),
            tag: resolve_tag(&input.version),
            secret: BootstrapSecret::generate(),
            port: input.port,
            api_key: None,
            exit_code: 0,
        }
    }

    pub fn server_url(&self) -> String {
        format!("http://localhost:{}", self.port)
    }
}

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Describes a single `docker` invocation.
///
/// `env` is set on the docker client process itself, which lets `docker run -e KEY`
/// forward values without putting them on the command line.
#[derive(Debug, Clone)]
pub struct DockerCommand {
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    pub timeout: Duration,
}

impl DockerCommand {
    pub fn new<I, S>(args: I, timeout: Duration) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
            env: Vec::new(),
            timeout,
        }
    }
}

/// Outcome of a finished docker invocation.
#[derive(Debug)]
pub struct CommandOutput {
    pub success: bool,
    /// Combined stdout/stderr in arrival order.
    pub log: String,
    /// Stdout only.
    pub stdout: String,
    pub timed_out: bool,
}

/// Streamed output from a running docker process.
#[derive(Debug)]
pub enum OutputLine {
    Stdout(String),
    Stderr(String),
    Done(CommandOutput),
}

/// Whether an image reference is available in the local store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImagePresence {
    Found,
    NotFound,
}

/// Opaque reference to a running container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerHandle {
    pub id: String,
}

impl ContainerHandle {
    /// Abbreviated id for log output.
    pub fn short_id(&self) -> &str {
        &self.id[..self.id.len().min(12)]
    }
}

/// Read-only bind mount of a host file into the container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mount {
    pub source: PathBuf,
    pub target: String,
}

/// Host port published to a container port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortMapping {
    pub host: u16,
    pub container: u16,
}

/// Everything needed to start a detached container.
#[derive(Debug, Clone, Default)]
pub struct RunSpec {
    pub image: String,
    pub env: BTreeMap<String, String>,
    pub mounts: Vec<Mount>,
    pub ports: Vec<PortMapping>,
    pub platform: Option<String>,
    pub privileged: bool,
}

// Docker integration: engine trait, CLI-backed implementation, bounded subprocess runner.

pub mod engine;
pub mod run;
pub mod types;

pub use engine::{ContainerEngine, DockerCli, run_command};
pub use types::{
    CommandOutput, ContainerHandle, DockerCommand, ImagePresence, Mount, OutputLine, PortMapping,
    RunSpec,
};

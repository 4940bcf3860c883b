use std::time::Duration;

use anyhow::{Result, bail};

use super::run::{run_to_end, run_with_lines};
use super::types::{ContainerHandle, DockerCommand, ImagePresence, RunSpec};

/// The narrow slice of a container runtime a session needs.
pub trait ContainerEngine {
    fn image_presence(&self, reference: &str) -> Result<ImagePresence>;

    /// Pull `name:tag`, calling `progress` for each progress event the
    /// runtime reports.
    fn pull(
        &self,
        name: &str,
        tag: &str,
        platform: Option<&str>,
        progress: &mut dyn FnMut(&str),
    ) -> Result<()>;

    /// Start a detached container.
    fn run(&self, spec: &RunSpec) -> Result<ContainerHandle>;

    /// Full log buffer accumulated so far.
    fn logs(&self, handle: &ContainerHandle) -> Result<String>;

    fn stop(&self, handle: &ContainerHandle) -> Result<()>;

    /// Delete a stopped container along with its anonymous volumes.
    fn remove(&self, handle: &ContainerHandle) -> Result<()>;
}

/// [`ContainerEngine`] backed by the `docker` CLI.
#[derive(Debug, Clone)]
pub struct DockerCli {
    pub timeout: Duration,
    pub pull_timeout: Duration,
}

impl DockerCli {
    pub fn new(timeout: Duration, pull_timeout: Duration) -> Self {
        Self {
            timeout,
            pull_timeout,
        }
    }
}

impl ContainerEngine for DockerCli {
    fn image_presence(&self, reference: &str) -> Result<ImagePresence> {
        let cmd = DockerCommand::new(
            ["image", "inspect", "--format", "{{.Id}}", reference],
            self.timeout,
        );
        let output = run_to_end(cmd)?;
        if output.timed_out {
            bail!("`docker image inspect {reference}` timed out");
        }
        Ok(if output.success {
            ImagePresence::Found
        } else {
            ImagePresence::NotFound
        })
    }

    fn pull(
        &self,
        name: &str,
        tag: &str,
        platform: Option<&str>,
        progress: &mut dyn FnMut(&str),
    ) -> Result<()> {
        let reference = format!("{name}:{tag}");
        let mut args = vec!["pull".to_string()];
        if let Some(platform) = platform {
            args.extend(["--platform".to_string(), platform.to_string()]);
        }
        args.push(reference.clone());

        let output = run_with_lines(DockerCommand::new(args, self.pull_timeout), |line| {
            progress(line)
        })?;
        if output.timed_out {
            bail!("pulling {reference} timed out after {:?}", self.pull_timeout);
        }
        if !output.success {
            bail!("pulling {reference} failed: {}", output.log.trim());
        }
        Ok(())
    }

    fn run(&self, spec: &RunSpec) -> Result<ContainerHandle> {
        let cmd = run_command(spec, self.timeout);
        let output = run_to_end(cmd)?;
        if !output.success {
            bail!("`docker run {}` failed: {}", spec.image, output.log.trim());
        }

        let id = output.stdout.trim().to_string();
        if id.is_empty() {
            bail!("`docker run {}` did not report a container id", spec.image);
        }
        Ok(ContainerHandle { id })
    }

    fn logs(&self, handle: &ContainerHandle) -> Result<String> {
        let output = run_to_end(DockerCommand::new(["logs", handle.id.as_str()], self.timeout))?;
        if !output.success {
            bail!("`docker logs {}` failed: {}", handle.short_id(), output.log.trim());
        }
        Ok(output.log)
    }

    fn stop(&self, handle: &ContainerHandle) -> Result<()> {
        let output = run_to_end(DockerCommand::new(["stop", handle.id.as_str()], self.timeout))?;
        if !output.success {
            bail!("`docker stop {}` failed: {}", handle.short_id(), output.log.trim());
        }
        Ok(())
    }

    fn remove(&self, handle: &ContainerHandle) -> Result<()> {
        let output = run_to_end(DockerCommand::new(
            ["rm", "--force", "--volumes", handle.id.as_str()],
            self.timeout,
        ))?;
        if !output.success {
            bail!("`docker rm {}` failed: {}", handle.short_id(), output.log.trim());
        }
        Ok(())
    }
}

/// Build the `docker run` invocation for `spec`.
///
/// Environment values travel on the docker client's own environment and are
/// referenced by name only, so they never show up in the process list.
///
/// The container outlives its main process so its logs stay readable after a
/// failed start. [`ContainerEngine::remove`] deletes it.
pub fn run_command(spec: &RunSpec, timeout: Duration) -> DockerCommand {
    let mut args: Vec<String> = vec!["run".into(), "--detach".into()];

    if let Some(platform) = &spec.platform {
        args.extend(["--platform".into(), platform.clone()]);
    }
    if spec.privileged {
        args.push("--privileged".into());
    }
    for port in &spec.ports {
        args.extend([
            "--publish".into(),
            format!("{}:{}/tcp", port.host, port.container),
        ]);
    }
    for mount in &spec.mounts {
        args.extend([
            "--mount".into(),
            format!(
                "type=bind,source={},target={},readonly",
                mount.source.display(),
                mount.target
            ),
        ]);
    }
    for key in spec.env.keys() {
        args.extend(["--env".into(), key.clone()]);
    }
    args.push(spec.image.clone());

    DockerCommand {
        args,
        env: spec
            .env
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
        timeout,
    }
}

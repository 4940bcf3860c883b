use std::ffi::OsString;

use tracing::{info, warn};

use crate::acquire::ensure_image;
use crate::bootstrap::{self, BootstrapClient};
use crate::config::CONTAINER_PORT;
use crate::docker::{ContainerEngine, ContainerHandle};
use crate::error::{ProbePhase, Result, SessionError};
use crate::readiness::{Clock, Readiness, ReadinessProber};

use super::command;
use super::env::child_env;
use super::launch::run_spec;
use super::paths::{require_config, require_license};
use super::types::{Session, SessionInput};

/// Drives one session from validation to teardown.
pub struct Orchestrator<'a> {
    engine: &'a dyn ContainerEngine,
    bootstrap: &'a dyn BootstrapClient,
    clock: &'a dyn Clock,
    /// Environment snapshot the trailing command starts from.
    base_env: Vec<(OsString, OsString)>,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        engine: &'a dyn ContainerEngine,
        bootstrap: &'a dyn BootstrapClient,
        clock: &'a dyn Clock,
        base_env: Vec<(OsString, OsString)>,
    ) -> Self {
        Self {
            engine,
            bootstrap,
            clock,
            base_env,
        }
    }

    /// Run the full session. The container, once started, is stopped before
    /// this returns on every path.
    pub fn run(&self, input: &SessionInput) -> Result<Session> {
        let mut session = Session::new(input);

        require_license(&session.license_path)?;
        if let Some(config) = &session.config_path {
            require_config(config)?;
        }

        ensure_image(
            self.engine,
            &input.image,
            &session.tag,
            &session.version,
            input.platform.as_deref(),
            input.quiet,
        )?;

        let spec = run_spec(input, &session);
        info!("Starting container from {}", spec.image);
        let handle = self
            .engine
            .run(&spec)
            .map_err(|err| SessionError::Launch {
                image: spec.image.clone(),
                source: err.into(),
            })?;
        let container = ContainerGuard {
            engine: self.engine,
            handle,
        };

        self.drive(input, &mut session, &container.handle)?;
        Ok(session)
    }

    /// Readiness, bootstrap and the trailing command, against a running container.
    fn drive(
        &self,
        input: &SessionInput,
        session: &mut Session,
        handle: &ContainerHandle,
    ) -> Result<()> {
        let prober = ReadinessProber::new(self.engine, self.clock, input.probe);

        info!("Waiting for port {} to open...", session.port);
        if !prober.wait_for_port("localhost", session.port) {
            self.dump_logs(handle);
            return Err(SessionError::StartupTimeout {
                phase: ProbePhase::Network,
                port: session.port,
                timeout: input.probe.network_timeout,
            });
        }

        info!("Waiting for HTTP server to start...");
        match prober.wait_for_http_server(handle, CONTAINER_PORT) {
            Readiness::Ready { .. } => info!("Posit Connect is ready at {}", session.server_url()),
            Readiness::LicenseRejected => {
                self.dump_logs(handle);
                return Err(SessionError::LicenseRejected);
            }
            Readiness::TimedOut => {
                self.dump_logs(handle);
                return Err(SessionError::StartupTimeout {
                    phase: ProbePhase::Log,
                    port: CONTAINER_PORT,
                    timeout: input.probe.log_timeout,
                });
            }
        }

        let server_url = session.server_url();
        let api_key = bootstrap::exchange(self.bootstrap, &session.secret, &server_url)
            .inspect_err(|_| self.dump_logs(handle))?;
        info!("Obtained bootstrap API key");

        if !input.command.is_empty() {
            let env = child_env(self.base_env.iter().cloned(), &api_key, &server_url);
            session.exit_code = command::run(&input.command, &env);
        }
        session.api_key = Some(api_key);
        Ok(())
    }

    /// Copy the container's logs to stderr for diagnosis.
    fn dump_logs(&self, handle: &ContainerHandle) {
        match self.engine.logs(handle) {
            Ok(logs) => {
                eprintln!("----- container logs ({}) -----", handle.short_id());
                eprint!("{logs}");
                if !logs.ends_with('\n') {
                    eprintln!();
                }
                eprintln!("----- end of container logs -----");
            }
            Err(err) => warn!("Could not read container logs: {err:#}"),
        }
    }
}

/// Stops and removes the container when dropped.
struct ContainerGuard<'a> {
    engine: &'a dyn ContainerEngine,
    handle: ContainerHandle,
}

impl Drop for ContainerGuard<'_> {
    fn drop(&mut self) {
        info!("Stopping container {}", self.handle.short_id());
        if let Err(err) = self.engine.stop(&self.handle) {
            warn!("Failed to stop container {}: {err:#}", self.handle.short_id());
        }
        // `rm --force` still cleans up after a failed stop.
        if let Err(err) = self.engine.remove(&self.handle) {
            warn!("Failed to remove container {}: {err:#}", self.handle.short_id());
        }
    }
}

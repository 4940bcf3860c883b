use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::{debug, info};

use super::poll::{Clock, PollOutcome, poll_until};
use super::scan::scan_logs;
use crate::docker::{ContainerEngine, ContainerHandle};

/// Timing knobs for both readiness phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeSettings {
    pub network_timeout: Duration,
    pub log_timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            network_timeout: Duration::from_secs(60),
            log_timeout: Duration::from_secs(60),
            poll_interval: Duration::from_secs(2),
        }
    }
}

/// Outcome of the log phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    Ready { version: Option<String> },
    TimedOut,
    LicenseRejected,
}

/// Waits for a launched container to become usable.
pub struct ReadinessProber<'a> {
    engine: &'a dyn ContainerEngine,
    clock: &'a dyn Clock,
    settings: ProbeSettings,
}

impl<'a> ReadinessProber<'a> {
    pub fn new(engine: &'a dyn ContainerEngine, clock: &'a dyn Clock, settings: ProbeSettings) -> Self {
        Self {
            engine,
            clock,
            settings,
        }
    }

    /// Phase 1: wait until `host:port` accepts a TCP connection.
    pub fn wait_for_port(&self, host: &str, port: u16) -> bool {
        let outcome = poll_until(
            self.clock,
            self.settings.network_timeout,
            self.settings.poll_interval,
            |remaining| try_connect(self.clock, host, port, remaining).then_some(()),
        );
        matches!(outcome, PollOutcome::Done(()))
    }

    /// Phase 2: wait until the server logs that its HTTP listener on `port`
    /// is up, or that it rejected its license.
    pub fn wait_for_http_server(&self, handle: &ContainerHandle, port: u16) -> Readiness {
        let mut announced: Option<String> = None;

        let outcome = poll_until(
            self.clock,
            self.settings.log_timeout,
            self.settings.poll_interval,
            |_| {
                let logs = match self.engine.logs(handle) {
                    Ok(logs) => logs,
                    Err(err) => {
                        debug!("reading container logs failed: {err:#}");
                        return None;
                    }
                };

                let scan = scan_logs(&logs, port);
                if announced.is_none()
                    && let Some(version) = scan.version
                {
                    info!("Posit Connect v{version} is starting");
                    announced = Some(version);
                }

                if scan.license_failed {
                    Some(Readiness::LicenseRejected)
                } else if scan.http_started {
                    Some(Readiness::Ready {
                        version: announced.clone(),
                    })
                } else {
                    None
                }
            },
        );

        match outcome {
            PollOutcome::Done(readiness) => readiness,
            PollOutcome::TimedOut => Readiness::TimedOut,
        }
    }
}

/// Single connection attempt bounded by `budget`.
fn try_connect(clock: &dyn Clock, host: &str, port: u16, budget: Duration) -> bool {
    let Ok(addrs) = (host, port).to_socket_addrs() else {
        return false;
    };
    let addrs: Vec<SocketAddr> = addrs.collect();
    connect_any(clock, &addrs, budget, |addr, timeout| {
        TcpStream::connect_timeout(addr, timeout).is_ok()
    })
}

/// Try each address in order until one connects. Every address gets an equal
/// share of whatever is left of `budget`, so all attempts together finish
/// within it.
fn connect_any(
    clock: &dyn Clock,
    addrs: &[SocketAddr],
    budget: Duration,
    mut connect: impl FnMut(&SocketAddr, Duration) -> bool,
) -> bool {
    let deadline = clock.now() + budget;
    for (i, addr) in addrs.iter().enumerate() {
        let remaining = deadline.saturating_duration_since(clock.now());
        if i > 0 && remaining.is_zero() {
            return false;
        }
        let left = u32::try_from(addrs.len() - i).unwrap_or(u32::MAX);
        // connect_timeout rejects a zero duration.
        let share = (remaining / left).max(Duration::from_millis(1));
        if connect(addr, share) {
            return true;
        }
    }
    false
}

//! Two-phase readiness: TCP reachability, then the server's own log signal.
mod poll;
mod probe;
mod scan;

pub use poll::{Clock, PollOutcome, SystemClock, poll_until};
pub use probe::{ProbeSettings, Readiness, ReadinessProber};
pub use scan::{LICENSE_FAILURE, LogScan, scan_logs};

#[cfg(test)]
pub(crate) use poll::fake::FakeClock;

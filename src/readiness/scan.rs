use std::sync::LazyLock;

use regex::Regex;

/// Phrase Connect logs when it cannot activate its license.
pub const LICENSE_FAILURE: &str = "Unable to obtain a valid license";

static VERSION_ANNOUNCEMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Starting (?:[A-Za-z]+ )*?Connect v(\d+(?:\.\d+)+(?:[-+][0-9A-Za-z.+-]+)?)")
        .expect("version pattern is valid")
});

static HTTP_STARTED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Starting HTTP server on \S*:(\d+)").expect("http pattern is valid")
});

/// What a single pass over the accumulated log text found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogScan {
    /// Server version from the startup banner.
    pub version: Option<String>,
    pub license_failed: bool,
    /// An HTTP listener was started on the expected port.
    pub http_started: bool,
}

/// Scan the full log buffer for readiness signals.
///
/// Pure over its input; rescanning the same text yields the same result.
pub fn scan_logs(logs: &str, port: u16) -> LogScan {
    let version = VERSION_ANNOUNCEMENT
        .captures(logs)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string());

    let http_started = HTTP_STARTED
        .captures_iter(logs)
        .filter_map(|c| c.get(1))
        .any(|m| m.as_str().parse::<u16>() == Ok(port));

    LogScan {
        version,
        license_failed: logs.contains(LICENSE_FAILURE),
        http_started,
    }
}

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::process::Command;

use tracing::{error, info, warn};

/// Exit code reported when the command cannot be started at all.
pub const SPAWN_FAILURE_EXIT: i32 = 127;

/// Run `argv` with exactly `env` and return its exit code.
///
/// Failure to start and non-zero exits are reported through the returned
/// code, never as errors.
pub fn run(argv: &[String], env: &BTreeMap<OsString, OsString>) -> i32 {
    let Some((program, args)) = argv.split_first() else {
        return 0;
    };

    info!("Running: {}", shell_words::join(argv));
    let status = Command::new(program)
        .args(args)
        .env_clear()
        .envs(env)
        .status();

    match status {
        Ok(status) => match status.code() {
            Some(code) => {
                if code != 0 {
                    warn!("Command exited with status {code}");
                }
                code
            }
            None => {
                warn!("Command was terminated by a signal ({status})");
                signal_exit_code(&status)
            }
        },
        Err(err) => {
            error!("Failed to start `{program}`: {err}");
            SPAWN_FAILURE_EXIT
        }
    }
}

#[cfg(unix)]
fn signal_exit_code(status: &std::process::ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status.signal().map_or(1, |signal| 128 + signal)
}

#[cfg(not(unix))]
fn signal_exit_code(_status: &std::process::ExitStatus) -> i32 {
    1
}

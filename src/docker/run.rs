use std::io::{BufRead, ErrorKind};
use std::process::{Child, ChildStderr, ChildStdout, Command, Stdio};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};

use super::types::{CommandOutput, DockerCommand, OutputLine};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Spawn `docker` and return a channel that streams its output.
///
/// The caller receives [`OutputLine::Stdout`]/[`OutputLine::Stderr`] as they
/// arrive, followed by exactly one [`OutputLine::Done`] carrying the final result.
/// The process is killed once `cmd.timeout` elapses.
pub fn spawn(cmd: DockerCommand) -> Result<Receiver<OutputLine>> {
    let mut child = Command::new("docker")
        .args(&cmd.args)
        .envs(cmd.env.iter().map(|(k, v)| (k, v)))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .context("failed to invoke `docker`. Is it installed and on PATH?")?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow!("docker stdout was not captured"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| anyhow!("docker stderr was not captured"))?;

    let (tx, rx) = mpsc::channel();

    std::thread::spawn(move || {
        supervise(child, stdout, stderr, tx, cmd.timeout);
    });

    Ok(rx)
}

/// Run `docker` to completion, discarding the streamed lines.
pub fn run_to_end(cmd: DockerCommand) -> Result<CommandOutput> {
    run_with_lines(cmd, |_| {})
}

/// Run `docker` to completion, handing every stdout line to `on_line`.
pub fn run_with_lines(cmd: DockerCommand, mut on_line: impl FnMut(&str)) -> Result<CommandOutput> {
    let rx = spawn(cmd)?;
    for line in rx {
        match line {
            OutputLine::Stdout(l) => on_line(&l),
            OutputLine::Stderr(_) => {}
            OutputLine::Done(output) => return Ok(output),
        }
    }
    Err(anyhow!("docker exited without reporting a result"))
}

fn supervise(
    mut child: Child,
    stdout: ChildStdout,
    stderr: ChildStderr,
    tx: Sender<OutputLine>,
    timeout: Duration,
) {
    let log_buf = Arc::new(Mutex::new(String::new()));
    let out_buf = Arc::new(Mutex::new(String::new()));

    // --- reader threads ---------------------------------------------------
    let tx_out = tx.clone();
    let log_out = log_buf.clone();
    let out_only = out_buf.clone();
    let stdout_handle = std::thread::spawn(move || {
        read_lossy_lines(std::io::BufReader::new(stdout), |l| {
            if let Ok(mut buf) = log_out.lock() {
                buf.push_str(&l);
                buf.push('\n');
            }
            if let Ok(mut buf) = out_only.lock() {
                buf.push_str(&l);
                buf.push('\n');
            }
            // Receiver may be dropped; ignore send errors.
            let _ = tx_out.send(OutputLine::Stdout(l));
        });
    });

    let tx_err = tx.clone();
    let log_err = log_buf.clone();
    let stderr_handle = std::thread::spawn(move || {
        read_lossy_lines(std::io::BufReader::new(stderr), |l| {
            if let Ok(mut buf) = log_err.lock() {
                buf.push_str(&l);
                buf.push('\n');
            }
            let _ = tx_err.send(OutputLine::Stderr(l));
        });
    });

    // --- poll loop ---------------------------------------------------------
    let start = Instant::now();
    let mut timed_out = false;

    let exit_status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break Some(status),
            Ok(None) => {}
            Err(_) => break None,
        }

        if start.elapsed() > timeout {
            timed_out = true;
            let _ = child.kill();
            let _ = child.wait();
            break None;
        }

        std::thread::sleep(POLL_INTERVAL);
    };

    // --- finalize ----------------------------------------------------------
    let _ = stdout_handle.join();
    let _ = stderr_handle.join();

    let log = log_buf.lock().map(|b| b.clone()).unwrap_or_default();
    let stdout = out_buf.lock().map(|b| b.clone()).unwrap_or_default();

    let _ = tx.send(OutputLine::Done(CommandOutput {
        success: exit_status.is_some_and(|s| s.success()),
        log,
        stdout,
        timed_out,
    }));
}

/// Hand each line of `reader` to `on_line` without its terminator.
///
/// Bytes that are not valid UTF-8 are replaced, and reading continues until
/// end of stream.
fn read_lossy_lines(mut reader: impl BufRead, mut on_line: impl FnMut(String)) {
    let mut raw = Vec::new();
    loop {
        raw.clear();
        match reader.read_until(b'\n', &mut raw) {
            Ok(0) => break,
            Ok(_) => {
                if raw.last() == Some(&b'\n') {
                    raw.pop();
                    if raw.last() == Some(&b'\r') {
                        raw.pop();
                    }
                }
                on_line(String::from_utf8_lossy(&raw).into_owned());
            }
            Err(err) if err.kind() == ErrorKind::Interrupted => {}
            Err(_) => break,
        }
    }
}

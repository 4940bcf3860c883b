use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use with_connect::bootstrap::ConnectBootstrapClient;
use with_connect::cli::Cli;
use with_connect::config::{self, Config};
use with_connect::docker::DockerCli;
use with_connect::readiness::SystemClock;
use with_connect::session::Orchestrator;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    match run(cli) {
        Ok(code) => exit_code(code),
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(cli: &Cli) {
    let filter = if cli.debug {
        "with_connect=debug"
    } else if cli.quiet {
        "with_connect=warn"
    } else {
        "with_connect=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn run(cli: Cli) -> Result<i32> {
    let cwd = std::env::current_dir()?;
    let cfg: Config = config::load(&cwd)?;
    let input = cli.into_input(&cfg);

    let engine = DockerCli::new(cfg.docker_timeout(), cfg.pull_timeout());
    let bootstrap = ConnectBootstrapClient::new(cfg.bootstrap_timeout())?;
    let clock = SystemClock;

    let orchestrator = Orchestrator::new(&engine, &bootstrap, &clock, std::env::vars_os().collect());
    let session = orchestrator.run(&input)?;
    Ok(session.exit_code)
}

/// Map a child exit status onto the byte a process can return.
fn exit_code(code: i32) -> ExitCode {
    match u8::try_from(code) {
        Ok(byte) => ExitCode::from(byte),
        Err(_) => ExitCode::FAILURE,
    }
}

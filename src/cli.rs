use clap::Parser;

use crate::config::Config;
use crate::session::env::parse_override;
use crate::session::{SessionInput, paths};

/// Run Posit Connect in a throwaway container, optionally executing a command
/// against it.
///
/// Everything after `--` is run once the server is up, with CONNECT_API_KEY
/// and CONNECT_SERVER set.
#[derive(Debug, Parser)]
#[command(name = "with-connect")]
pub struct Cli {
    /// Container image to run, without tag.
    #[arg(long)]
    pub image: Option<String>,

    /// Posit Connect version, or `latest`/`release`.
    #[arg(long)]
    pub version: Option<String>,

    /// Path to the Posit Connect license file.
    #[arg(long)]
    pub license: Option<String>,

    /// Path to an rstudio-connect.gcfg configuration file.
    #[arg(long)]
    pub config: Option<String>,

    /// Extra container environment variable (KEY=VALUE). Repeatable.
    #[arg(short = 'e', long = "env", value_name = "KEY=VALUE", value_parser = parse_override)]
    pub env: Vec<(String, String)>,

    /// Suppress pull progress and informational output.
    #[arg(short, long)]
    pub quiet: bool,

    /// Host port to publish Connect on.
    #[arg(long)]
    pub port: Option<u16>,

    /// Image platform passed to docker (e.g. linux/amd64).
    #[arg(long)]
    pub platform: Option<String>,

    /// Enable debug logging.
    #[arg(long)]
    pub debug: bool,

    /// Command to run once Connect is ready.
    #[arg(last = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}

impl Cli {
    /// Merge flags over the project file and resolve paths.
    pub fn into_input(self, cfg: &Config) -> SessionInput {
        SessionInput {
            image: self.image.unwrap_or_else(|| cfg.image.clone()),
            version: self.version.unwrap_or_else(|| cfg.version.clone()),
            license: paths::resolve(self.license.as_deref().unwrap_or(&cfg.license)),
            config: self.config.as_deref().map(paths::resolve),
            env_overrides: self.env,
            quiet: self.quiet,
            port: self.port.unwrap_or(cfg.port),
            platform: self.platform.or_else(|| cfg.platform.clone()),
            privileged: cfg.privileged,
            probe: cfg.probe_settings(),
            command: self.command,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("with-connect").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults_come_from_config() {
        let input = parse(&[]).into_input(&Config::default());
        assert_eq!(input.image, "rstudio/rstudio-connect");
        assert_eq!(input.version, "2025.09.0");
        assert_eq!(input.port, 3939);
        assert!(input.license.is_absolute());
        assert!(input.license.ends_with("rstudio-connect.lic"));
        assert!(input.command.is_empty());
    }

    #[test]
    fn flags_override_config() {
        let cfg = Config {
            version: "2024.01.0".into(),
            ..Config::default()
        };
        let input = parse(&["--version", "latest", "--port", "4000", "--image", "me/connect"])
            .into_input(&cfg);
        assert_eq!(input.version, "latest");
        assert_eq!(input.port, 4000);
        assert_eq!(input.image, "me/connect");
    }

    #[test]
    fn trailing_command_is_verbatim() {
        let cli = parse(&["--quiet", "--", "rsconnect", "deploy", "--name", "x", "-e", "A=B"]);
        assert!(cli.quiet);
        assert!(cli.env.is_empty());
        assert_eq!(cli.command, ["rsconnect", "deploy", "--name", "x", "-e", "A=B"]);
    }

    #[test]
    fn env_overrides_are_repeatable_and_ordered() {
        let cli = parse(&["-e", "A=1", "--env", "B=2", "-e", "A=3"]);
        assert_eq!(
            cli.env,
            vec![
                ("A".to_string(), "1".to_string()),
                ("B".to_string(), "2".to_string()),
                ("A".to_string(), "3".to_string()),
            ]
        );
    }

    #[test]
    fn malformed_env_override_is_rejected() {
        let result = Cli::try_parse_from(["with-connect", "-e", "NOVALUE"]);
        assert!(result.is_err());
    }

    #[test]
    fn config_path_is_resolved() {
        let input = parse(&["--config", "/etc/custom.gcfg"]).into_input(&Config::default());
        assert_eq!(input.config, Some(std::path::PathBuf::from("/etc/custom.gcfg")));
    }
}

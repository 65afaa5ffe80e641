use clap::{ArgAction, Parser, Subcommand};
use tracing::Level;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Sync {
        config_path: String,
        download_workers: Option<usize>,
        request_timeout_secs: Option<u64>,
    },
}

pub struct Args {
    pub command: Command,
    pub log_level: Level,
}

#[derive(Debug, Parser)]
#[command(
    name = "aptmirror",
    version,
    author = "Nick Guletskii",
    about = "Mirror APT repositories to local storage with integrity verification"
)]
struct Cli {
    #[arg(
        short = 'v',
        long = "verbose",
        help = "Sets the level of verbosity",
        action = ArgAction::Count,
        global = true
    )]
    verbose: u8,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// Download the indices and packages of every enabled repository
    Sync {
        #[arg(
            short = 'c',
            long = "config",
            value_name = "FILE",
            help = "Sets a custom config file",
            default_value = "config.toml"
        )]
        config: String,

        #[arg(
            long = "download-workers",
            value_name = "N",
            help = "Overrides the number of simultaneous package downloads"
        )]
        download_workers: Option<usize>,

        #[arg(
            long = "request-timeout",
            value_name = "SECONDS",
            help = "Aborts any single HTTP request that takes longer than this"
        )]
        request_timeout_secs: Option<u64>,
    },
}

impl Cli {
    fn log_level(&self) -> Level {
        match self.verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }

    fn into_command(self) -> Command {
        match self.command {
            CliCommand::Sync {
                config,
                download_workers,
                request_timeout_secs,
            } => Command::Sync {
                config_path: config,
                download_workers,
                request_timeout_secs,
            },
        }
    }
}

pub fn parse_args() -> Args {
    let cli = Cli::parse();
    let log_level = cli.log_level();

    let mut env_filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive(log_level.into())
        .from_env_lossy();
    // Connection pool chatter drowns out per-file logging at debug level.
    if let Ok(directive) = "hyper_util=info".parse() {
        env_filter = env_filter.add_directive(directive);
    }

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_env_filter(env_filter)
        .init();

    Args {
        command: cli.into_command(),
        log_level,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_sync_defaults() {
        let cli = Cli::try_parse_from(["aptmirror", "sync"]).unwrap();
        assert_eq!(cli.log_level(), Level::INFO);
        assert_eq!(
            cli.into_command(),
            Command::Sync {
                config_path: "config.toml".to_string(),
                download_workers: None,
                request_timeout_secs: None,
            }
        );
    }

    #[test]
    fn test_sync_overrides_and_verbosity() {
        let cli = Cli::try_parse_from([
            "aptmirror",
            "-vv",
            "sync",
            "-c",
            "mirror.yaml",
            "--download-workers",
            "4",
            "--request-timeout",
            "120",
        ])
        .unwrap();
        assert_eq!(cli.log_level(), Level::TRACE);
        assert_eq!(
            cli.into_command(),
            Command::Sync {
                config_path: "mirror.yaml".to_string(),
                download_workers: Some(4),
                request_timeout_secs: Some(120),
            }
        );
    }

    #[test]
    fn test_single_verbose_flag_is_debug() {
        let cli = Cli::try_parse_from(["aptmirror", "sync", "-v"]).unwrap();
        assert_eq!(cli.log_level(), Level::DEBUG);
    }
}

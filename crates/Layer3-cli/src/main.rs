//! skiff CLI - Main entry point

mod logs;
mod ps;
mod sandbox;
mod session;
mod signal;

use clap::{Parser, Subcommand};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// skiff - logs and status of your sandbox services
#[derive(Parser, Debug)]
#[command(name = "skiff")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Docker endpoint of the sandbox (overrides login and config)
    #[arg(long, global = true)]
    host: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the logs of one or more services
    Logs {
        /// Services to show logs for
        #[arg(value_name = "SERVICE")]
        services: Vec<String>,

        /// Specify if the logs should be streamed
        #[arg(short, long)]
        follow: bool,

        /// Print the logs for the previous instance of a service if it crashed
        #[arg(short, long)]
        previous: bool,
    },
    /// Show the status of every service
    Ps,
    /// Store the sandbox token (and endpoint, with --host)
    Login {
        /// Sandbox auth token
        #[arg(long)]
        token: String,
    },
    /// Forget stored credentials
    Logout,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.debug);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let host = args.host.as_deref();
    match args.command {
        Command::Logs {
            services,
            follow,
            previous,
        } => logs::run(services, follow, previous, host).await,
        Command::Ps => ps::run(host).await,
        Command::Login { token } => session::login(&token, args.host.clone()),
        Command::Logout => session::logout(),
    }
}

/// Diagnostics go to stderr; stdout carries the logs themselves
fn init_logging(debug: bool) {
    let log_level = if debug { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_logs_flags() {
        let args = Args::try_parse_from(["skiff", "logs", "-f", "web", "db"]).unwrap();
        match args.command {
            Command::Logs {
                services,
                follow,
                previous,
            } => {
                assert_eq!(services, vec!["web", "db"]);
                assert!(follow);
                assert!(!previous);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args =
            Args::try_parse_from(["skiff", "ps", "--debug", "--host", "tcp://10.0.0.5:2375"])
                .unwrap();
        assert!(args.debug);
        assert_eq!(args.host.as_deref(), Some("tcp://10.0.0.5:2375"));
        assert!(matches!(args.command, Command::Ps));
    }

    #[test]
    fn test_previous_short_flag() {
        let args = Args::try_parse_from(["skiff", "logs", "-p", "web"]).unwrap();
        assert!(matches!(args.command, Command::Logs { previous: true, .. }));
    }
}

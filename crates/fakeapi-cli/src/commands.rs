//! CLI command definitions using clap

use crate::config::{Overrides, Verbosity};
use clap::{Parser, Subcommand, ValueEnum};
use daydream_fakeapi::FixtureKind;
use std::path::PathBuf;

/// fakeapi: fake Matrix homeserver for daydream end-to-end tests
#[derive(Parser, Debug)]
#[command(name = "fakeapi")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// YAML configuration file
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Verbosity selected by `-q` and `-v`
    #[must_use]
    pub const fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.verbose)
    }
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the fake homeserver
    Serve(ServeArgs),

    /// Print a fixture body
    Fixture(FixtureArgs),

    /// Print the effective configuration as YAML
    Config,
}

/// Arguments for the serve command
#[derive(Parser, Debug, Default)]
pub struct ServeArgs {
    /// HTTP port to listen on [default: 8448]
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Directory holding the wasm asset
    #[arg(short, long, value_name = "DIR")]
    pub assets: Option<PathBuf>,

    /// Homeserver base URL the application logs in against
    #[arg(long, value_name = "URL")]
    pub homeserver: Option<String>,

    /// Sync response delay in milliseconds
    #[arg(long, value_name = "MS")]
    pub delay_ms: Option<u64>,
}

impl ServeArgs {
    /// Flags as config overrides
    #[must_use]
    pub fn overrides(&self) -> Overrides {
        Overrides {
            homeserver: self.homeserver.clone(),
            delay_ms: self.delay_ms,
            port: self.port,
            assets: self.assets.clone(),
        }
    }
}

/// Arguments for the fixture command
#[derive(Parser, Debug)]
pub struct FixtureArgs {
    /// Which fixture to print
    #[arg(value_enum)]
    pub kind: FixtureArg,
}

/// Fixture selector
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum FixtureArg {
    /// Login response
    Login,
    /// Initial sync response
    Sync,
}

impl From<FixtureArg> for FixtureKind {
    fn from(arg: FixtureArg) -> Self {
        match arg {
            FixtureArg::Login => Self::Login,
            FixtureArg::Sync => Self::Sync,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod cli_tests {
        use super::*;

        #[test]
        fn test_parse_serve_defaults() {
            let cli = Cli::parse_from(["fakeapi", "serve"]);
            let Commands::Serve(args) = cli.command else {
                panic!("expected Serve command");
            };
            assert!(args.port.is_none());
            assert!(args.assets.is_none());
        }

        #[test]
        fn test_parse_serve_flags() {
            let cli = Cli::parse_from([
                "fakeapi",
                "serve",
                "--port",
                "9000",
                "--assets",
                "pkg",
                "--delay-ms",
                "0",
            ]);
            let Commands::Serve(args) = cli.command else {
                panic!("expected Serve command");
            };
            let overrides = args.overrides();
            assert_eq!(overrides.port, Some(9000));
            assert_eq!(overrides.assets, Some(PathBuf::from("pkg")));
            assert_eq!(overrides.delay_ms, Some(0));
        }

        #[test]
        fn test_parse_fixture() {
            let cli = Cli::parse_from(["fakeapi", "fixture", "sync"]);
            let Commands::Fixture(args) = cli.command else {
                panic!("expected Fixture command");
            };
            assert_eq!(FixtureKind::from(args.kind), FixtureKind::Sync);
        }

        #[test]
        fn test_global_flags() {
            let cli = Cli::parse_from(["fakeapi", "config", "-vv", "--config", "f.yaml"]);
            assert_eq!(cli.verbosity(), Verbosity::Debug);
            assert_eq!(cli.config, Some(PathBuf::from("f.yaml")));

            let cli = Cli::parse_from(["fakeapi", "-q", "config"]);
            assert_eq!(cli.verbosity(), Verbosity::Quiet);
        }

        #[test]
        fn test_unknown_fixture_rejected() {
            assert!(Cli::try_parse_from(["fakeapi", "fixture", "rooms"]).is_err());
        }
    }
}

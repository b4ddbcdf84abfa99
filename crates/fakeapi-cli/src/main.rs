//! fakeapi: fake Matrix homeserver for daydream
//!
//! ## Usage
//!
//! ```bash
//! fakeapi serve --assets pkg/         # Serve on :8448
//! fakeapi serve --delay-ms 0          # No loading window
//! fakeapi fixture sync                # Print the sync body
//! fakeapi --config fakeapi.yaml config
//! ```

use clap::Parser;
use daydream_fakeapi::{FixtureKind, MockResponder, OfflineNetwork};
use daydream_fakeapi_cli::{
    logging, Cli, CliError, CliResult, Commands, DirectoryFetch, FakeHomeserver, FileConfig,
    Overrides, ServeArgs, DEFAULT_PORT,
};
use std::process::ExitCode;
use tracing::info;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    logging::init(cli.verbosity());

    let file_config = FileConfig::load_optional(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve(args) => run_serve(file_config, &args),
        Commands::Fixture(args) => {
            let config = file_config.with_overrides(Overrides::default())?;
            let kind: FixtureKind = args.kind.into();
            let url = match kind {
                FixtureKind::Login => config.responder.login_endpoint(),
                FixtureKind::Sync => config.responder.sync_endpoint(),
            };
            let response = kind.build(&url)?;
            println!("{}", response.body_string());
            Ok(())
        }
        Commands::Config => {
            let config = file_config.with_overrides(Overrides::default())?;
            print!("{}", config.to_yaml()?);
            Ok(())
        }
    }
}

fn run_serve(file_config: FileConfig, args: &ServeArgs) -> CliResult<()> {
    let config = file_config.with_overrides(args.overrides())?;
    let port = config.port.unwrap_or(DEFAULT_PORT);

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::server(format!("Failed to create runtime: {e}")))?;

    match config.assets {
        Some(dir) => {
            info!(assets = %dir.display(), "serving asset from directory");
            let responder = MockResponder::new(DirectoryFetch::new(dir), config.responder)?;
            rt.block_on(FakeHomeserver::new(responder, port).run())
        }
        None => {
            info!("no asset directory; asset requests will fail");
            let responder = MockResponder::new(OfflineNetwork, config.responder)?;
            rt.block_on(FakeHomeserver::new(responder, port).run())
        }
    }
}

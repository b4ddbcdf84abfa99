//! fakeapi CLI Library
//!
//! Fake Matrix homeserver for driving daydream in a browser: login is
//! answered at once, the initial sync after a delay, and the compiled
//! module is served from a local directory.

#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod assets;
mod commands;
mod config;
mod error;
pub mod logging;
pub mod server;

pub use assets::{get_mime_type, DirectoryFetch};
pub use commands::{Cli, Commands, FixtureArg, FixtureArgs, ServeArgs};
pub use config::{FileConfig, Overrides, Verbosity};
pub use error::{CliError, CliResult};
pub use server::{descriptor_for, router, FakeHomeserver, DEFAULT_PORT};

//! Chutney CLI library
//!
//! The `chutney` binary is a thin wrapper around this crate so that command
//! handlers can be exercised from integration tests.
//!
//! # Module Structure
//!
//! - [`cli`]: clap argument definitions (declarative, no I/O)
//! - [`commands`]: one handler per subcommand
//! - [`error`]: `CliError` and exit code mapping
//! - [`logging`]: tracing subscriber initialization
//! - [`output`]: text / JSON rendering
//! - [`query`]: `k=v&..` query string parsing and formatting

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod output;
pub mod query;

//! Binary crate wiring the booking engine to its CLI, HTTP server, and demo.

mod cli;
mod demo;
mod infra;
mod routes;
mod server;

use workline::error::AppError;

/// Parse the command line and dispatch to the selected subcommand.
pub async fn run() -> Result<(), AppError> {
    cli::run().await
}

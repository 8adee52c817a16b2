//! Command-line entry points for the internship seat allocation service:
//! the HTTP server, a one-shot allocation pass over CSV exports, and a
//! seeded end-to-end demo.

mod cli;
mod demo;
mod infra;
mod routes;
mod server;

use internmatch::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}

mod cli;
mod infra;
mod report;
mod routes;
mod server;

use mariner_qhse::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}

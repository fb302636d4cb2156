mod cli;
mod infra;
mod routes;
mod server;
mod verify;

use regproc_citizenship::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}

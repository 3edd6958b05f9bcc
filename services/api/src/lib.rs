mod cli;
mod infra;
mod render;
mod routes;
mod screening;
mod server;

use fair_tenant::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}

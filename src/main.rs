use anyhow::Result;
use modelverse::cli;

#[tokio::main]
async fn main() -> Result<()> {
    cli::run().await
}

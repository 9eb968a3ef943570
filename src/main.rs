use anyhow::Result;
use mixtape::cli;

#[tokio::main]
async fn main() -> Result<()> {
    cli::run().await
}

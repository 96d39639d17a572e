//! urlcheck - check URLs against local and remote threat intelligence

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    urlinfo_cli::run().await
}

//! Orchard server binary
//!
//! Loads configuration, connects to the backing PostgreSQL server, and
//! serves the HTTPS API until shutdown.

use orchard::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Pick up a local .env if present
    dotenvy::dotenv().ok();

    // Load configuration
    let config = ServerConfig::load()?;

    // Start server
    orchard::start_server(config).await?;

    Ok(())
}

use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use lens_client::LensClient;
use lenspeer_agent::outreach::OutreachAgent;
use lenspeer_agent::scorer::HeuristicModel;
use lenspeer_common::Config;
use lenspeer_store::ContactStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("lenspeer=info".parse()?))
        .init();

    info!("Lenspeer outreach agent starting...");

    // Load config
    let config = Config::from_env();
    config.log_redacted();

    // Open the database and run migrations
    let store = ContactStore::connect(&config.database_url).await?;

    let client = LensClient::new(config.api_url.clone(), config.auth_token.clone());

    // Refresh wallet reference data. Best-effort: downstream features read
    // it, the outreach cycle does not.
    match client.fetch_wallets().await {
        Ok(wallets) => {
            if let Err(e) = store.upsert_wallets(&wallets).await {
                warn!(error = %e, "Failed to store wallet reference data");
            }
        }
        Err(e) => warn!(error = %e, "Wallet refresh failed, continuing without it"),
    }

    // Create and run the agent
    let agent = OutreachAgent::new(
        Box::new(client.clone()),
        Box::new(HeuristicModel),
        Box::new(client),
        store,
        config,
    );

    agent.run().await;
    Ok(())
}

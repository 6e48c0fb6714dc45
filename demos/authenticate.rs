//! Interactive authentication example.
//!
//! Restores a stored session or opens the browser for the OAuth grant,
//! arms the keep-alive loop and lists the accounts it can see.
//!
//! Run with: cargo run --example authenticate

use saxo_rs::auth::{KeepAliveOptions, SessionConfig, SessionManager, TokenStore};
use saxo_rs::{Environment, SaxoClient};

#[tokio::main]
async fn main() -> saxo_rs::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Get credentials from environment variables
    let app_key = std::env::var("SAXO_APP_KEY")
        .expect("SAXO_APP_KEY environment variable required");
    let app_secret = std::env::var("SAXO_APP_SECRET")
        .expect("SAXO_APP_SECRET environment variable required");

    println!("Connecting to the Saxo simulation environment...");

    let config = SessionConfig::new(app_key, app_secret, Environment::Sim);
    let manager = SessionManager::new(config, TokenStore::new("saxo-tokens.json"));
    manager.authenticate().await?;
    println!("Successfully authenticated!");

    // Keep the session fresh for as long as this process runs
    let keep_alive = manager.keep_alive(KeepAliveOptions::default()).await?;

    let client = SaxoClient::new(manager)?;
    let accounts = client.portfolio().accounts().await?;
    println!("\nFound {} account(s):", accounts.len());

    for account in &accounts {
        println!(
            "  - {} ({})",
            account.account_id,
            account.currency.as_deref().unwrap_or("no currency")
        );

        let balance = client
            .portfolio()
            .balance(&account.client_key, Some(&account.account_key))
            .await?;
        println!("    Cash Balance: {}", balance.cash_balance);
        println!("    Total Value: {}", balance.total_value);
    }

    keep_alive.stop();
    println!("\nDone!");
    Ok(())
}

//! Search instrument reference data.
//!
//! Run with: cargo run --example instrument_search -- "apple"

use saxo_rs::api::InstrumentsQuery;
use saxo_rs::auth::{SessionConfig, SessionManager, TokenStore};
use saxo_rs::{Environment, FetchOptions, SaxoClient};

#[tokio::main]
async fn main() -> saxo_rs::Result<()> {
    tracing_subscriber::fmt::init();

    let app_key = std::env::var("SAXO_APP_KEY").expect("SAXO_APP_KEY required");
    let app_secret = std::env::var("SAXO_APP_SECRET").expect("SAXO_APP_SECRET required");
    let keywords = std::env::args().nth(1).unwrap_or_else(|| "apple".to_string());

    let config = SessionConfig::new(app_key, app_secret, Environment::Sim);
    let manager = SessionManager::new(config, TokenStore::new("saxo-tokens.json"));
    manager.authenticate().await?;

    let client = SaxoClient::new(manager)?;

    println!("Searching instruments for {keywords:?}...\n");
    let query = InstrumentsQuery::keywords(&keywords).with_asset_types(["Stock", "FxSpot"]);
    let hits = client
        .reference()
        .instruments(&query, FetchOptions::limited(10))
        .await?;

    for hit in &hits {
        println!(
            "  {:>8}  {:<10} {}",
            hit.identifier,
            hit.symbol.as_deref().unwrap_or("-"),
            hit.description.as_deref().unwrap_or("")
        );
    }

    if let Some(first) = hits.first() {
        let details = client
            .reference()
            .instrument_details(first.identifier, &first.asset_type)
            .await?;
        println!(
            "\nFirst hit: tradable={}, order types {:?}",
            details.is_tradable, details.supported_order_types
        );
    }

    Ok(())
}

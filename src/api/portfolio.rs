//! Portfolio service for account, position and balance operations.

use std::sync::Arc;

use url::form_urlencoded;

use crate::client::fetch::{fetch_all, FetchOptions};
use crate::client::ClientInner;
use crate::models::{Account, AccountKey, AccountUpdate, Balance, ClientKey, Position};
use crate::Result;

/// Service for portfolio operations.
///
/// # Example
///
/// ```no_run
/// use saxo_rs::client::FetchOptions;
///
/// # async fn example(client: saxo_rs::SaxoClient) -> saxo_rs::Result<()> {
/// let accounts = client.portfolio().accounts().await?;
/// for account in &accounts {
///     println!("{}: active={}", account.account_id, account.active);
/// }
///
/// if let Some(account) = accounts.first() {
///     let positions = client
///         .portfolio()
///         .positions(&account.client_key, FetchOptions::all())
///         .await?;
///     println!("{} positions", positions.len());
/// }
/// # Ok(())
/// # }
/// ```
pub struct PortfolioService {
    inner: Arc<ClientInner>,
}

impl PortfolioService {
    pub(crate) fn new(inner: Arc<ClientInner>) -> Self {
        Self { inner }
    }

    /// List all accounts the authenticated user can see.
    pub async fn accounts(&self) -> Result<Vec<Account>> {
        fetch_all(&*self.inner, "/port/v1/accounts/me", FetchOptions::all()).await
    }

    /// List positions under a client, including their live valuation view.
    pub async fn positions(
        &self,
        client_key: &ClientKey,
        options: FetchOptions,
    ) -> Result<Vec<Position>> {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("ClientKey", client_key.as_str())
            .append_pair("FieldGroups", "PositionBase,PositionView")
            .finish();
        fetch_all(
            &*self.inner,
            &format!("/port/v1/positions/?{query}"),
            options,
        )
        .await
    }

    /// Get the balance snapshot for a client, or one account under it.
    pub async fn balance(
        &self,
        client_key: &ClientKey,
        account_key: Option<&AccountKey>,
    ) -> Result<Balance> {
        let mut query = form_urlencoded::Serializer::new(String::new());
        query.append_pair("ClientKey", client_key.as_str());
        if let Some(account_key) = account_key {
            query.append_pair("AccountKey", account_key.as_str());
        }
        self.inner
            .get(&format!("/port/v1/balances/?{}", query.finish()))
            .await
    }

    /// Update mutable account settings.
    pub async fn update_account(
        &self,
        account_key: &AccountKey,
        update: &AccountUpdate,
    ) -> Result<()> {
        self.inner
            .put(&format!("/port/v1/accounts/{}", account_key.as_str()), update)
            .await
    }
}

//! Application context: one owner for every state-engine component.
//!
//! All components are built once with an explicit store and notifier and
//! torn down together, so there is no process-global state to leak between
//! runs.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;
use vbea::{
    Favorites, HttpClient, JsonRpcProvider, ListingsClient, LocalStore, Notifier, PriceFeed,
    SessionManager, TracingNotifier, VbeaConfig, VoteSync, WalletBinding,
};

use crate::error::Result;

pub struct AppContext {
    pub store: Arc<LocalStore>,
    pub notifier: Arc<dyn Notifier>,
    /// Client for the auth/voting backend, shared with session and voting.
    pub api: HttpClient,
    pub session: SessionManager,
    pub wallet: WalletBinding<JsonRpcProvider>,
    pub favorites: Favorites,
    pub voting: VoteSync,
    pub prices: PriceFeed,
    pub listings: ListingsClient,
}

impl AppContext {
    /// Wire up every component against one store and notifier.
    pub fn init(config: &VbeaConfig, store_path: Option<PathBuf>) -> Result<Self> {
        let store = Arc::new(match store_path {
            Some(path) => LocalStore::open(path)?,
            None => LocalStore::in_memory(),
        });
        let notifier: Arc<dyn Notifier> = Arc::new(TracingNotifier);

        let api_http = HttpClient::new(&config.api_base_url);
        let session = SessionManager::new(
            api_http.clone(),
            store.clone(),
            notifier.clone(),
            config.siwe.clone(),
        );
        let provider = JsonRpcProvider::new(&config.rpc_url, &config.premium.token_address);
        let wallet = WalletBinding::new(
            provider,
            store.clone(),
            notifier.clone(),
            config.premium.clone(),
        );
        let favorites = Favorites::new(store.clone());
        let voting = VoteSync::new(api_http.clone(), store.clone(), notifier.clone());
        let prices = PriceFeed::new(HttpClient::new(&config.price_base_url), store.clone());
        let listings = ListingsClient::new(HttpClient::new(&config.listings_base_url), store.clone());

        Ok(Self {
            store,
            notifier,
            api: api_http,
            session,
            wallet,
            favorites,
            voting,
            prices,
            listings,
        })
    }

    /// Drop the context. The store flushes on every mutation, so there is
    /// nothing left to persist here.
    pub fn teardown(self) {
        debug!("app context torn down");
    }
}

//! Wallet binding: connected account, chain, and derived premium tier.
//!
//! Premium is never set directly; it is recomputed from an on-chain token
//! balance whenever the account or chain changes. Capacity for the
//! favorites store follows the persisted `walletPremium` sentinel, so a
//! tier change takes effect on the next add without evicting anything.

use std::sync::Arc;

use alloy_primitives::U256;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::config::PremiumConfig;
use crate::error::{Result, VbeaError};
use crate::notify::{Notifier, Severity};
use crate::session::SessionManager;
use crate::store::{LocalStore, KEY_WALLET_PREMIUM};

/// `balanceOf(address)` selector.
const SELECTOR_BALANCE_OF: &str = "0x70a08231";
/// `decimals()` selector.
const SELECTOR_DECIMALS: &str = "0x313ce567";

/// Read-only chain access needed to derive premium eligibility.
pub trait BalanceProvider: Send + Sync {
    /// Chain ID the wallet is currently connected to.
    async fn chain_id(&self) -> Result<u64>;

    /// Premium-token balance of `account`, in whole tokens.
    async fn token_balance(&self, account: &str) -> Result<f64>;
}

/// [`BalanceProvider`] over raw JSON-RPC (`eth_chainId` / `eth_call`).
#[derive(Debug, Clone)]
pub struct JsonRpcProvider {
    client: reqwest::Client,
    url: String,
    token_address: String,
}

impl JsonRpcProvider {
    pub fn new(url: &str, token_address: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.to_string(),
            token_address: token_address.to_string(),
        }
    }

    async fn rpc(&self, method: &str, params: Value) -> Result<Value> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });
        let resp = self.client.post(&self.url).json(&body).send().await?;
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            return Err(VbeaError::Http { status, message });
        }
        let envelope: Value = resp.json().await?;
        if let Some(err) = envelope.get("error") {
            return Err(VbeaError::Rpc(err.to_string()));
        }
        Ok(envelope.get("result").cloned().unwrap_or(Value::Null))
    }

    async fn eth_call(&self, data: String) -> Result<String> {
        let result = self
            .rpc(
                "eth_call",
                json!([{"to": self.token_address, "data": data}, "latest"]),
            )
            .await?;
        result
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| VbeaError::Rpc("eth_call returned no data".into()))
    }
}

fn parse_hex_u64(s: &str) -> Result<u64> {
    let stripped = s.strip_prefix("0x").unwrap_or(s);
    u64::from_str_radix(stripped, 16).map_err(|e| VbeaError::Rpc(format!("invalid hex: {e}")))
}

fn parse_hex_u256(s: &str) -> Result<U256> {
    let stripped = s.strip_prefix("0x").unwrap_or(s);
    U256::from_str_radix(stripped, 16).map_err(|e| VbeaError::Rpc(format!("invalid hex: {e}")))
}

/// ABI-encode a single address argument after a 4-byte selector.
fn encode_address_arg(selector: &str, address: &str) -> Result<String> {
    let stripped = address.strip_prefix("0x").unwrap_or(address);
    if stripped.len() != 40 || !stripped.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(VbeaError::Validation(format!("invalid address: {address}")));
    }
    Ok(format!("{selector}{:0>64}", stripped.to_lowercase()))
}

impl BalanceProvider for JsonRpcProvider {
    async fn chain_id(&self) -> Result<u64> {
        let result = self.rpc("eth_chainId", json!([])).await?;
        let hex = result
            .as_str()
            .ok_or_else(|| VbeaError::Rpc("eth_chainId returned no data".into()))?;
        parse_hex_u64(hex)
    }

    async fn token_balance(&self, account: &str) -> Result<f64> {
        let decimals_hex = self.eth_call(SELECTOR_DECIMALS.to_string()).await?;
        let decimals = parse_hex_u64(&decimals_hex)? as i32;

        let data = encode_address_arg(SELECTOR_BALANCE_OF, account)?;
        let balance_hex = self.eth_call(data).await?;
        let raw = parse_hex_u256(&balance_hex)?;

        // Lossy above 2^53 token units; premium thresholds are far below.
        let units: f64 = raw.to_string().parse().unwrap_or(0.0);
        Ok(units / 10f64.powi(decimals))
    }
}

/// Outcome of a premium eligibility check, with the demotion reason kept
/// distinct for UI messaging.
#[derive(Debug, Clone, PartialEq)]
pub enum PremiumStatus {
    Premium,
    InsufficientBalance { balance: f64, remaining: f64 },
    WrongNetwork,
    Disconnected,
}

/// Tracks the live wallet account/chain and derives premium eligibility.
pub struct WalletBinding<P: BalanceProvider> {
    provider: P,
    store: Arc<LocalStore>,
    notifier: Arc<dyn Notifier>,
    premium_cfg: PremiumConfig,
    account: Option<String>,
    chain_id: Option<u64>,
    is_premium: bool,
}

impl<P: BalanceProvider> WalletBinding<P> {
    pub fn new(
        provider: P,
        store: Arc<LocalStore>,
        notifier: Arc<dyn Notifier>,
        premium_cfg: PremiumConfig,
    ) -> Self {
        Self {
            provider,
            store,
            notifier,
            premium_cfg,
            account: None,
            chain_id: None,
            is_premium: false,
        }
    }

    pub fn account(&self) -> Option<&str> {
        self.account.as_deref()
    }

    pub fn chain_id(&self) -> Option<u64> {
        self.chain_id
    }

    pub fn is_premium(&self) -> bool {
        self.is_premium
    }

    /// Bind an account, reading the chain from the provider.
    pub async fn connect(&mut self, account: &str) -> PremiumStatus {
        self.account = Some(account.to_string());
        self.chain_id = self.provider.chain_id().await.ok();
        let status = self.check_premium_status().await;
        self.notifier.refresh_ui();
        status
    }

    /// Account-change notification from the wallet provider.
    ///
    /// An empty account list means the wallet disconnected at the provider
    /// level and tears the session down.
    pub async fn on_accounts_changed(
        &mut self,
        accounts: &[String],
        session: &mut SessionManager,
    ) {
        match accounts.first() {
            None => {
                self.disconnect(session).await;
                self.notifier.toast(Severity::Info, "Wallet disconnected");
            }
            Some(account) => {
                self.account = Some(account.clone());
                session.ensure_bound_account(Some(account));
                self.check_premium_status().await;
                self.notifier.refresh_ui();
                self.notifier.toast(Severity::Success, "Account changed");
            }
        }
    }

    /// Chain-change notification from the wallet provider.
    pub async fn on_chain_changed(&mut self, chain_id: u64) {
        self.chain_id = Some(chain_id);
        self.check_premium_status().await;
        self.notifier.refresh_ui();
        self.notifier.toast(Severity::Success, "Network changed");
    }

    /// Disconnect notification from the wallet provider.
    pub async fn on_disconnect(&mut self, session: &mut SessionManager) {
        self.disconnect(session).await;
        self.notifier.toast(Severity::Info, "Wallet disconnected");
    }

    async fn disconnect(&mut self, session: &mut SessionManager) {
        session.sign_out().await;
        self.account = None;
        self.chain_id = None;
        self.demote();
        self.notifier.refresh_ui();
    }

    /// Recompute premium eligibility from the on-chain balance.
    ///
    /// Crossing the threshold upward emits a one-time celebratory toast;
    /// crossing downward is silent. Any non-premium result clears the
    /// persisted sentinel, including one left behind by an earlier run.
    /// Balance-read failures demote.
    pub async fn check_premium_status(&mut self) -> PremiumStatus {
        let Some(account) = self.account.clone() else {
            self.demote();
            return PremiumStatus::Disconnected;
        };
        if self.chain_id != Some(self.premium_cfg.chain_id) {
            self.demote();
            return PremiumStatus::WrongNetwork;
        }

        let balance = match self.provider.token_balance(&account).await {
            Ok(b) => b,
            Err(e) => {
                warn!(error = %e, "balance read failed, demoting");
                self.demote();
                return PremiumStatus::InsufficientBalance {
                    balance: 0.0,
                    remaining: self.premium_cfg.threshold,
                };
            }
        };

        let was_premium = self.is_premium;
        self.is_premium = balance >= self.premium_cfg.threshold;

        if self.is_premium && !was_premium {
            if let Err(e) = self.store.set_str(KEY_WALLET_PREMIUM, "true") {
                warn!(error = %e, "failed to persist premium flag");
            }
            self.notifier.toast(
                Severity::Success,
                "Premium features activated! Thank you for your support! \u{1f31f}",
            );
        } else if !self.is_premium {
            // Unconditional: also clears a sentinel persisted by an earlier
            // run whose balance has since dropped below the threshold.
            let _ = self.store.remove(KEY_WALLET_PREMIUM);
        }

        debug!(balance, premium = self.is_premium, "premium status checked");
        if self.is_premium {
            PremiumStatus::Premium
        } else {
            PremiumStatus::InsufficientBalance {
                balance,
                remaining: self.premium_cfg.threshold - balance,
            }
        }
    }

    fn demote(&mut self) {
        self.is_premium = false;
        let _ = self.store.remove(KEY_WALLET_PREMIUM);
    }
}

//! Session manager: wallet challenge/response sign-in, introspection,
//! sign-out.
//!
//! The token is exchanged for a signed SIWE-style message and stored under
//! `auth_token`. A token implies a prior successful signature verification;
//! if the bound account ever diverges from the connected wallet account the
//! session is stale and gets dropped.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;
use chrono::{SecondsFormat, Utc};
use tracing::{debug, warn};

use crate::config::SiweConfig;
use crate::error::{Result, VbeaError};
use crate::notify::{Notifier, Severity};
use crate::rest::HttpClient;
use crate::store::{LocalStore, KEY_AUTH_TOKEN};
use crate::types::VerifyRequest;

/// Signing function trait object type.
///
/// Takes the full sign-in message and resolves to a `0x`-prefixed hex
/// signature. Hosts back this with whatever wallet they have.
pub type SignFn =
    dyn Fn(&str) -> Pin<Box<dyn Future<Output = Result<String>> + Send>> + Send + Sync;

/// Build a signer from a hex-encoded private key.
///
/// Returns the checksummed address and a [`SignFn`] producing EIP-191
/// personal-sign signatures over the message bytes.
pub fn local_wallet(private_key: &str) -> Result<(String, Box<SignFn>)> {
    let signer: PrivateKeySigner = private_key
        .trim()
        .parse()
        .map_err(|e| VbeaError::Signing(format!("invalid private key: {e}")))?;
    let address = signer.address().to_string();

    let sign: Box<SignFn> = Box::new(move |message: &str| {
        let signer = signer.clone();
        let message = message.to_string();
        Box::pin(async move {
            let signature = signer
                .sign_message_sync(message.as_bytes())
                .map_err(|e| VbeaError::Signing(e.to_string()))?;
            Ok(format!("0x{}", hex::encode(signature.as_bytes())))
        })
    });

    Ok((address, sign))
}

/// Render the sign-in message for `address` with a fresh nonce.
pub fn siwe_message(cfg: &SiweConfig, address: &str, nonce: &str, issued_at: &str) -> String {
    let mut message = format!(
        "{domain} wants you to sign in with your Ethereum account:\n\
         {address}\n\n\
         {statement}\n\n\
         URI: {origin}\n\
         Version: 1\n\
         Chain ID: {chain_id}\n\
         Nonce: {nonce}\n\
         Issued At: {issued_at}",
        domain = cfg.domain,
        statement = cfg.statement,
        origin = cfg.origin,
        chain_id = cfg.chain_id,
    );
    if !cfg.resources.is_empty() {
        message.push_str("\nResources:");
        for resource in &cfg.resources {
            message.push_str("\n- ");
            message.push_str(resource);
        }
    }
    message
}

/// Owns the auth token lifecycle.
pub struct SessionManager {
    http: HttpClient,
    store: Arc<LocalStore>,
    notifier: Arc<dyn Notifier>,
    siwe: SiweConfig,
    token: Option<String>,
    account: Option<String>,
    busy: AtomicBool,
}

impl SessionManager {
    /// Create a manager, resuming any token persisted from a prior run.
    pub fn new(
        http: HttpClient,
        store: Arc<LocalStore>,
        notifier: Arc<dyn Notifier>,
        siwe: SiweConfig,
    ) -> Self {
        let token = store.get_str(KEY_AUTH_TOKEN);
        Self {
            http,
            store,
            notifier,
            siwe,
            token,
            account: None,
            busy: AtomicBool::new(false),
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn account(&self) -> Option<&str> {
        self.account.as_deref()
    }

    pub fn is_signed_in(&self) -> bool {
        self.token.is_some()
    }

    /// Exchange a signed challenge for a session token.
    ///
    /// On any failure all partially-set session state is rolled back before
    /// the error propagates; this is the one operation that re-throws so the
    /// caller can decide whether to retry. A second call while one is in
    /// flight is rejected with [`VbeaError::Busy`].
    pub async fn sign_in(&mut self, account: &str, sign: &SignFn) -> Result<String> {
        if self.busy.swap(true, Ordering::SeqCst) {
            return Err(VbeaError::Busy);
        }
        let result = self.sign_in_inner(account, sign).await;
        self.busy.store(false, Ordering::SeqCst);

        match result {
            Ok(token) => {
                self.notifier
                    .toast(Severity::Success, "Successfully signed in");
                self.notifier.refresh_ui();
                Ok(token)
            }
            Err(e) => {
                self.clear_session_state();
                self.notifier.toast(Severity::Error, &e.to_string());
                self.notifier.refresh_ui();
                Err(e)
            }
        }
    }

    async fn sign_in_inner(&mut self, account: &str, sign: &SignFn) -> Result<String> {
        let nonce = self.http.get_nonce().await?.nonce;
        let issued_at = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let message = siwe_message(&self.siwe, account, &nonce, &issued_at);
        let signature = sign(&message).await?;

        let response = self
            .http
            .post_verify(&VerifyRequest {
                message,
                signature,
                address: account.to_string(),
                nonce,
            })
            .await
            .map_err(|e| match e {
                VbeaError::Http { status, message } if (400..500).contains(&status) => {
                    VbeaError::Verification(if message.is_empty() {
                        "signature rejected by server".to_string()
                    } else {
                        message
                    })
                }
                other => other,
            })?;

        let token = response
            .token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| VbeaError::Verification("no token received from server".into()))?;

        self.store.set_str(KEY_AUTH_TOKEN, &token)?;
        self.token = Some(token.clone());
        self.account = Some(account.to_string());
        debug!(account, "session established");
        Ok(token)
    }

    /// Validate the stored token against the backend.
    ///
    /// No token short-circuits to `false` without a network call. Any
    /// non-success (including transport failure) drops the stored token.
    pub async fn check_session(&mut self) -> bool {
        let Some(token) = self.token.clone() else {
            return false;
        };
        match self.http.get_session(&token).await {
            Ok(()) => true,
            Err(e) => {
                debug!(error = %e, "session introspection failed, dropping token");
                self.clear_session_state();
                false
            }
        }
    }

    /// Sign out: best-effort backend notification, unconditional local clear.
    ///
    /// A concurrent call while one is pending is a no-op.
    pub async fn sign_out(&mut self) {
        if self.busy.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(token) = self.token.clone() {
            if let Err(e) = self.http.post_signout(&token).await {
                warn!(error = %e, "sign-out notification failed, clearing locally");
            }
        }
        self.clear_session_state();
        self.busy.store(false, Ordering::SeqCst);

        self.notifier.toast(Severity::Info, "Signed out");
        self.notifier.refresh_ui();
    }

    /// Local teardown without the backend call.
    ///
    /// Used when a 401 from an authenticated endpoint proves the token dead.
    pub fn handle_unauthenticated(&mut self) {
        self.clear_session_state();
        self.notifier
            .toast(Severity::Error, "Please connect your wallet");
        self.notifier.refresh_ui();
    }

    /// Drop the session if its bound account diverges from the connected one.
    pub fn ensure_bound_account(&mut self, connected: Option<&str>) {
        if self.token.is_some() && self.account.is_some() && self.account.as_deref() != connected {
            debug!("bound account diverged from wallet, dropping stale session");
            self.clear_session_state();
            self.notifier.refresh_ui();
        }
    }

    fn clear_session_state(&mut self) {
        self.token = None;
        self.account = None;
        if let Err(e) = self.store.remove(KEY_AUTH_TOKEN) {
            warn!(error = %e, "failed to clear persisted token");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_siwe_message_layout() {
        let cfg = SiweConfig {
            domain: "app.virtubeauty.fun".into(),
            origin: "https://app.virtubeauty.fun".into(),
            statement: "Sign in with Ethereum to VirtuBeauty".into(),
            chain_id: 8453,
            resources: vec!["https://app.virtubeauty.fun/".into()],
        };
        let message = siwe_message(
            &cfg,
            "0x00000000000000000000000000000000DeaDBeef",
            "abc123",
            "2025-01-01T00:00:00.000Z",
        );
        assert_eq!(
            message,
            "app.virtubeauty.fun wants you to sign in with your Ethereum account:\n\
             0x00000000000000000000000000000000DeaDBeef\n\n\
             Sign in with Ethereum to VirtuBeauty\n\n\
             URI: https://app.virtubeauty.fun\n\
             Version: 1\n\
             Chain ID: 8453\n\
             Nonce: abc123\n\
             Issued At: 2025-01-01T00:00:00.000Z\n\
             Resources:\n\
             - https://app.virtubeauty.fun/"
        );
    }

    #[test]
    fn test_siwe_message_without_resources() {
        let cfg = SiweConfig {
            resources: vec![],
            ..SiweConfig::default()
        };
        let message = siwe_message(&cfg, "0xabc", "n", "t");
        assert!(!message.contains("Resources:"));
        assert!(message.ends_with("Issued At: t"));
    }

    #[tokio::test]
    async fn test_local_wallet_signs_deterministically() {
        // Fixed key so the derived address is stable.
        let (address, sign) =
            local_wallet("0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318")
                .unwrap();
        assert!(address.starts_with("0x"));
        assert_eq!(address.len(), 42);

        let sig1 = sign("hello").await.unwrap();
        let sig2 = sign("hello").await.unwrap();
        assert_eq!(sig1, sig2);
        // 65-byte signature, 0x-prefixed hex.
        assert_eq!(sig1.len(), 2 + 65 * 2);
    }

    #[test]
    fn test_local_wallet_rejects_garbage() {
        assert!(local_wallet("not-a-key").is_err());
    }
}

/// Configuration for the VirtuBeauty client.
#[derive(Debug, Clone)]
pub struct VbeaConfig {
    /// Base URL for the auth + voting backend.
    pub api_base_url: String,
    /// Base URL for the listings API.
    pub listings_base_url: String,
    /// Base URL for the price API.
    pub price_base_url: String,
    /// JSON-RPC URL for the expected chain.
    pub rpc_url: String,
    /// Sign-in message parameters.
    pub siwe: SiweConfig,
    /// Premium tier parameters.
    pub premium: PremiumConfig,
}

/// Parameters embedded in the sign-in message.
#[derive(Debug, Clone)]
pub struct SiweConfig {
    pub domain: String,
    pub origin: String,
    pub statement: String,
    pub chain_id: u64,
    pub resources: Vec<String>,
}

/// Premium tier eligibility parameters.
#[derive(Debug, Clone)]
pub struct PremiumConfig {
    /// ERC-20 contract whose balance grants premium.
    pub token_address: String,
    /// Minimum balance (in whole tokens) for premium.
    pub threshold: f64,
    /// Chain the balance must be read on.
    pub chain_id: u64,
}

impl Default for VbeaConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.virtubeauty.fun".into(),
            listings_base_url: "https://api.virtuals.io".into(),
            price_base_url: "https://api.coingecko.com".into(),
            rpc_url: "https://mainnet.base.org".into(),
            siwe: SiweConfig::default(),
            premium: PremiumConfig::default(),
        }
    }
}

impl Default for SiweConfig {
    fn default() -> Self {
        Self {
            domain: "app.virtubeauty.fun".into(),
            origin: "https://app.virtubeauty.fun".into(),
            statement: "Sign in with Ethereum to VirtuBeauty".into(),
            chain_id: 8453,
            resources: vec!["https://app.virtubeauty.fun/".into()],
        }
    }
}

impl Default for PremiumConfig {
    fn default() -> Self {
        Self {
            token_address: "0x414562C94223A5C4Df9F278422F03228F35b8f7d".into(),
            threshold: 100_000.0,
            chain_id: 8453,
        }
    }
}

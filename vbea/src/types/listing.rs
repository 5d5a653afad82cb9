use serde::{Deserialize, Serialize};

/// Dashboard view driving the listing query and refresh cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Prototype,
    Latest,
    Sentient,
    Favorites,
}

impl Tab {
    /// Storage string under the `currentTab` key.
    pub fn as_str(&self) -> &'static str {
        match self {
            Tab::Prototype => "prototype",
            Tab::Latest => "latest",
            Tab::Sentient => "sentient",
            Tab::Favorites => "favorites",
        }
    }

    /// Parse the stored tab string; unknown values fall back to the default.
    pub fn parse(s: &str) -> Tab {
        match s {
            "latest" => Tab::Latest,
            "sentient" => Tab::Sentient,
            "favorites" => Tab::Favorites,
            _ => Tab::Prototype,
        }
    }
}

/// Strict parse for user input; unknown values are an error rather than a
/// silent fallback.
impl std::str::FromStr for Tab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "prototype" => Ok(Tab::Prototype),
            "latest" => Ok(Tab::Latest),
            "sentient" => Ok(Tab::Sentient),
            "favorites" => Ok(Tab::Favorites),
            _ => Err(format!("unknown tab: {s}")),
        }
    }
}

impl std::fmt::Display for Tab {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional listing filters applied on top of the per-tab query.
#[derive(Debug, Clone, Default)]
pub struct ListingFilters {
    pub holder_count_min: Option<u64>,
    pub holder_count_max: Option<u64>,
    /// USD value bounds; converted to API units with the live protocol price.
    pub value_min_usd: Option<f64>,
    pub value_max_usd: Option<f64>,
    /// RFC 3339 lower bound on creation time.
    pub created_after: Option<String>,
    pub role: Option<String>,
}

/// One listed agent token. Only the fields the state engine needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub holder_count: Option<u64>,
    #[serde(default)]
    pub virtual_token_value: Option<f64>,
}

/// One page of listings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListingsPage {
    #[serde(default)]
    pub data: Vec<Listing>,
    #[serde(default)]
    pub meta: PaginationMeta,
}

impl ListingsPage {
    /// Item IDs of this page, string-normalized for the voting caches.
    pub fn item_ids(&self) -> Vec<String> {
        self.data.iter().map(|l| l.id.to_string()).collect()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaginationMeta {
    #[serde(default)]
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub page_count: u32,
    #[serde(default)]
    pub total: u64,
}

//! Listings API client.
//!
//! Builds the per-tab query the dashboard renders from and fetches one page
//! at a time. Read failures degrade to an empty page so a listings outage
//! never aborts a refresh tick.

use std::sync::Arc;

use tracing::warn;

use crate::rest::HttpClient;
use crate::store::{LocalStore, KEY_CURRENT_TAB};
use crate::types::{ListingFilters, ListingsPage, Tab};

/// Page size on the three browse tabs.
pub const BROWSE_PAGE_SIZE: u32 = 30;

/// Page size on the favorites tab.
pub const FAVORITES_PAGE_SIZE: u32 = 20;

/// Page size for search results.
pub const SEARCH_PAGE_SIZE: u32 = 10;

/// Typed access to the listings API.
#[derive(Clone)]
pub struct ListingsClient {
    http: HttpClient,
    store: Arc<LocalStore>,
}

impl ListingsClient {
    pub fn new(http: HttpClient, store: Arc<LocalStore>) -> Self {
        Self { http, store }
    }

    /// The persisted tab selection; unknown or missing values mean the default.
    pub fn current_tab(&self) -> Tab {
        self.store
            .get_str(KEY_CURRENT_TAB)
            .map(|s| Tab::parse(&s))
            .unwrap_or_default()
    }

    /// Persist a tab switch.
    pub fn set_current_tab(&self, tab: Tab) -> crate::error::Result<()> {
        self.store.set_str(KEY_CURRENT_TAB, tab.as_str())
    }

    /// Fetch one page for a tab.
    ///
    /// `favorites` is the current favorite ID set, consulted only on the
    /// favorites tab: an empty set short-circuits to an empty page with no
    /// network call. `protocol_price` converts the USD value filters into
    /// API units. Fetch or decode failures degrade to an empty page.
    pub async fn fetch_page(
        &self,
        tab: Tab,
        page: u32,
        favorites: &[String],
        filters: &ListingFilters,
        protocol_price: f64,
    ) -> ListingsPage {
        if tab == Tab::Favorites && favorites.is_empty() {
            return ListingsPage::default();
        }

        let params = build_query(tab, page, favorites, filters, protocol_price);
        let query: Vec<(&str, &str)> = params
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();

        match self.http.get::<ListingsPage>("/api/virtuals", &query).await {
            Ok(page) => page,
            Err(e) => {
                warn!(%tab, error = %e, "listings fetch failed");
                ListingsPage::default()
            }
        }
    }

    /// Search listings by name, symbol, or token address across every
    /// listed status.
    ///
    /// A blank term short-circuits to an empty page with no network call;
    /// fetch failures degrade the same way.
    pub async fn search(&self, term: &str) -> ListingsPage {
        let term = term.trim();
        if term.is_empty() {
            return ListingsPage::default();
        }

        let params = search_params(term);
        let query: Vec<(&str, &str)> = params
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();

        match self.http.get::<ListingsPage>("/api/virtuals", &query).await {
            Ok(page) => page,
            Err(e) => {
                warn!(term, error = %e, "search fetch failed");
                ListingsPage::default()
            }
        }
    }
}

/// First page of results matching the term against name, symbol, and both
/// token addresses.
fn search_params(term: &str) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = Vec::new();
    let mut push = |k: &str, v: &str| params.push((k.to_string(), v.to_string()));

    push("filters[status][$in][0]", "AVAILABLE");
    push("filters[status][$in][1]", "ACTIVATING");
    push("filters[status][$in][2]", "UNDERGRAD");
    push("filters[priority][$ne]", "-1");
    push("filters[$or][0][name][$contains]", term);
    push("filters[$or][1][symbol][$contains]", term);
    push("filters[$or][2][tokenAddress][$contains]", term);
    push("filters[$or][3][preToken][$contains]", term);
    push("sort[0]", "totalValueLocked:desc");
    push("sort[1]", "createdAt:desc");
    push("populate[0]", "image");
    push("pagination[page]", "1");
    push("pagination[pageSize]", &SEARCH_PAGE_SIZE.to_string());

    params
}

/// Full query for one page: per-tab base, pagination, favorite IDs, filters.
fn build_query(
    tab: Tab,
    page: u32,
    favorites: &[String],
    filters: &ListingFilters,
    protocol_price: f64,
) -> Vec<(String, String)> {
    let mut params = base_params(tab);
    params.push(("pagination[page]".into(), page.to_string()));

    if tab == Tab::Favorites {
        for id in favorites {
            params.push(("filters[id][$in]".into(), id.clone()));
        }
    }

    if let Some(min) = filters.holder_count_min {
        params.push(("filters[holderCount][$gte]".into(), min.to_string()));
    }
    if let Some(max) = filters.holder_count_max {
        params.push(("filters[holderCount][$lte]".into(), max.to_string()));
    }
    // Value bounds arrive in USD; the API filters in protocol units.
    if protocol_price > 0.0 {
        if let Some(min) = filters.value_min_usd {
            params.push((
                "filters[virtualTokenValue][$gte]".into(),
                (min / protocol_price).to_string(),
            ));
        }
        if let Some(max) = filters.value_max_usd {
            params.push((
                "filters[virtualTokenValue][$lte]".into(),
                (max / protocol_price).to_string(),
            ));
        }
    }
    if let Some(created_after) = &filters.created_after {
        params.push(("filters[createdAt][$gte]".into(), created_after.clone()));
    }
    if let Some(role) = &filters.role {
        params.push(("filters[role]".into(), role.clone()));
    }

    params
}

fn base_params(tab: Tab) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = Vec::new();
    let mut push = |k: &str, v: &str| params.push((k.to_string(), v.to_string()));

    match tab {
        Tab::Prototype => {
            push("filters[status]", "UNDERGRAD");
            push("filters[priority][$ne]", "-1");
            push("sort[0]", "virtualTokenValue:desc");
            push("sort[1]", "createdAt:desc");
        }
        Tab::Latest => {
            push("filters[status]", "UNDERGRAD");
            push("filters[priority][$ne]", "-1");
            push("sort[0]", "createdAt:desc");
            push("sort[1]", "createdAt:desc");
        }
        Tab::Sentient => {
            push("filters[status][$in][0]", "AVAILABLE");
            push("filters[status][$in][1]", "ACTIVATING");
            push("filters[priority][$ne]", "-1");
            push("sort[0]", "totalValueLocked:desc");
            push("sort[1]", "createdAt:desc");
        }
        Tab::Favorites => {
            push("filters[priority][$ne]", "-1");
            push("sort[0]", "totalValueLocked:desc");
            push("sort[1]", "createdAt:desc");
        }
    }
    push("populate[0]", "image");
    let page_size = match tab {
        Tab::Favorites => FAVORITES_PAGE_SIZE,
        _ => BROWSE_PAGE_SIZE,
    };
    push("pagination[pageSize]", &page_size.to_string());

    params
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(params: &[(String, String)], key: &str) -> Option<String> {
        params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }

    #[test]
    fn test_browse_tabs_page_size_30() {
        for tab in [Tab::Prototype, Tab::Latest, Tab::Sentient] {
            let params = base_params(tab);
            assert_eq!(
                value(&params, "pagination[pageSize]").as_deref(),
                Some("30")
            );
        }
    }

    #[test]
    fn test_favorites_tab_page_size_20_and_id_filter() {
        let favorites = vec!["12".to_string(), "7".to_string()];
        let params = build_query(
            Tab::Favorites,
            1,
            &favorites,
            &ListingFilters::default(),
            4.25,
        );
        assert_eq!(
            value(&params, "pagination[pageSize]").as_deref(),
            Some("20")
        );
        let ids: Vec<&str> = params
            .iter()
            .filter(|(k, _)| k == "filters[id][$in]")
            .map(|(_, v)| v.as_str())
            .collect();
        assert_eq!(ids, vec!["12", "7"]);
    }

    #[test]
    fn test_sentient_status_set() {
        let params = base_params(Tab::Sentient);
        assert_eq!(
            value(&params, "filters[status][$in][0]").as_deref(),
            Some("AVAILABLE")
        );
        assert_eq!(
            value(&params, "filters[status][$in][1]").as_deref(),
            Some("ACTIVATING")
        );
        assert_eq!(
            value(&params, "sort[0]").as_deref(),
            Some("totalValueLocked:desc")
        );
    }

    #[test]
    fn test_usd_bounds_convert_with_protocol_price() {
        let filters = ListingFilters {
            value_min_usd: Some(8.5),
            value_max_usd: Some(17.0),
            ..Default::default()
        };
        let params = build_query(Tab::Prototype, 1, &[], &filters, 4.25);
        assert_eq!(
            value(&params, "filters[virtualTokenValue][$gte]").as_deref(),
            Some("2")
        );
        assert_eq!(
            value(&params, "filters[virtualTokenValue][$lte]").as_deref(),
            Some("4")
        );
    }

    #[test]
    fn test_usd_bounds_skipped_without_price() {
        let filters = ListingFilters {
            value_min_usd: Some(10.0),
            ..Default::default()
        };
        let params = build_query(Tab::Prototype, 1, &[], &filters, 0.0);
        assert!(value(&params, "filters[virtualTokenValue][$gte]").is_none());
    }

    #[test]
    fn test_pagination_page_included() {
        let params = build_query(Tab::Latest, 3, &[], &ListingFilters::default(), 4.25);
        assert_eq!(value(&params, "pagination[page]").as_deref(), Some("3"));
    }

    #[test]
    fn test_search_query_matches_all_columns() {
        let params = search_params("luna");
        for key in [
            "filters[$or][0][name][$contains]",
            "filters[$or][1][symbol][$contains]",
            "filters[$or][2][tokenAddress][$contains]",
            "filters[$or][3][preToken][$contains]",
        ] {
            assert_eq!(value(&params, key).as_deref(), Some("luna"));
        }
        assert_eq!(
            value(&params, "filters[status][$in][2]").as_deref(),
            Some("UNDERGRAD")
        );
        assert_eq!(
            value(&params, "pagination[pageSize]").as_deref(),
            Some("10")
        );
        assert_eq!(value(&params, "pagination[page]").as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn test_blank_search_term_short_circuits() {
        let client = ListingsClient::new(
            HttpClient::new("http://127.0.0.1:9"),
            Arc::new(crate::store::LocalStore::in_memory()),
        );
        let page = client.search("   ").await;
        assert!(page.data.is_empty());
    }

    #[tokio::test]
    async fn test_empty_favorites_short_circuits() {
        // Unroutable base URL: any network attempt would error, and the
        // degraded path would still be an empty page, but the short-circuit
        // must not even build a request.
        let client = ListingsClient::new(
            HttpClient::new("http://127.0.0.1:9"),
            Arc::new(crate::store::LocalStore::in_memory()),
        );
        let page = client
            .fetch_page(
                Tab::Favorites,
                1,
                &[],
                &ListingFilters::default(),
                4.25,
            )
            .await;
        assert!(page.data.is_empty());
        assert_eq!(page.meta.pagination.total, 0);
    }
}

//! Tab/refresh controller.
//!
//! One recurring timer drives the dashboard: every tick fetches prices,
//! then the current listings page (its valuation needs the fresh prices),
//! then the batched flag and vote counts for the rendered items. The
//! favorites tab refreshes every 7 seconds, every other tab every 60.
//! Switching tabs restarts the timer so at most one cycle is ever live,
//! and going hidden stops ticking entirely until the view returns.
//!
//! Fetches run on a spawned task stamped with the activation generation;
//! a tab or page switch bumps the generation, so a response that completes
//! afterwards is dropped instead of applied.

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use vbea::{
    FlagCountEntry, HttpClient, ListingFilters, ListingsClient, ListingsPage, PriceFeed,
    PriceSnapshot, Tab, VoteSummaryEntry,
};

use crate::app::AppContext;

/// Tick period on the favorites tab.
pub const FAVORITES_REFRESH_INTERVAL: Duration = Duration::from_secs(7);

/// Tick period everywhere else.
pub const REGULAR_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// External stimuli the controller reacts to between ticks.
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshEvent {
    TabChanged(Tab),
    PageChanged(u32),
    VisibilityChanged(bool),
    /// One-shot search overlay; does not disturb the refresh cycle.
    Search(String),
}

/// Everything one tick fetched, stamped with the generation it was
/// started under.
struct TickOutcome {
    generation: u64,
    prices: PriceSnapshot,
    page: ListingsPage,
    flag_entries: Vec<FlagCountEntry>,
    vote_entries: Vec<VoteSummaryEntry>,
}

pub fn period(tab: Tab) -> Duration {
    match tab {
        Tab::Favorites => FAVORITES_REFRESH_INTERVAL,
        _ => REGULAR_REFRESH_INTERVAL,
    }
}

/// Run the refresh loop until cancelled.
pub async fn run(
    ctx: &mut AppContext,
    start_tab: Option<Tab>,
    start_page: u32,
    filters: ListingFilters,
    mut events: mpsc::Receiver<RefreshEvent>,
    cancel: CancellationToken,
) {
    let mut tab = start_tab.unwrap_or_else(|| ctx.listings.current_tab());
    if let Err(e) = ctx.listings.set_current_tab(tab) {
        warn!(error = %e, "failed to persist tab selection");
    }
    let mut page = start_page.max(1);
    let mut visible = true;
    let mut generation: u64 = 0;
    let mut in_flight: Option<JoinHandle<TickOutcome>> = None;

    let mut timer = new_timer(tab);
    info!(%tab, page, "dashboard refresh loop starting");

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,

            Some(event) = events.recv() => match event {
                RefreshEvent::TabChanged(new_tab) => {
                    if new_tab != tab {
                        tab = new_tab;
                        page = 1;
                        if let Err(e) = ctx.listings.set_current_tab(tab) {
                            warn!(error = %e, "failed to persist tab selection");
                        }
                        generation += 1;
                        if visible {
                            // Fresh interval: first tick fires immediately.
                            timer = new_timer(tab);
                        }
                        info!(%tab, "tab switched");
                    }
                }
                RefreshEvent::PageChanged(new_page) => {
                    let new_page = new_page.max(1);
                    if new_page != page {
                        page = new_page;
                        generation += 1;
                        if visible {
                            timer = new_timer(tab);
                        }
                        info!(page, "page changed");
                    }
                }
                RefreshEvent::Search(term) => {
                    let results = ctx.listings.search(&term).await;
                    let item_ids = results.item_ids();
                    ctx.voting.batch_flag_counts(&item_ids).await;
                    ctx.voting.batch_vote_counts(&item_ids).await;
                    render_search(ctx, &term, &results);
                }
                RefreshEvent::VisibilityChanged(now_visible) => {
                    if now_visible && !visible {
                        visible = true;
                        timer = new_timer(tab);
                        info!("view visible, refresh resumed");
                    } else if !now_visible && visible {
                        visible = false;
                        generation += 1;
                        info!("view hidden, refresh paused");
                    }
                }
            },

            _ = timer.tick(), if visible && in_flight.is_none() => {
                in_flight = Some(spawn_tick(ctx, generation, tab, page, &filters));
            }

            outcome = join_in_flight(&mut in_flight), if in_flight.is_some() => {
                in_flight = None;
                match outcome {
                    Ok(outcome) if outcome.generation == generation => {
                        apply(ctx, tab, page, outcome);
                    }
                    Ok(outcome) => {
                        debug!(
                            stale = outcome.generation,
                            current = generation,
                            "dropping refresh results from a previous activation"
                        );
                    }
                    Err(e) => warn!(error = %e, "refresh task failed"),
                }
            }
        }
    }

    if let Some(handle) = in_flight {
        handle.abort();
    }
    info!("dashboard refresh loop stopped");
}

fn new_timer(tab: Tab) -> time::Interval {
    let mut timer = time::interval(period(tab));
    timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
    timer
}

async fn join_in_flight(
    in_flight: &mut Option<JoinHandle<TickOutcome>>,
) -> std::result::Result<TickOutcome, tokio::task::JoinError> {
    match in_flight {
        Some(handle) => handle.await,
        // Guarded by `in_flight.is_some()` in the select arm.
        None => std::future::pending().await,
    }
}

/// Fetch one tick's worth of data off the loop: prices, the listings page,
/// then the batch counts for its items.
fn spawn_tick(
    ctx: &AppContext,
    generation: u64,
    tab: Tab,
    page: u32,
    filters: &ListingFilters,
) -> JoinHandle<TickOutcome> {
    let prices: PriceFeed = ctx.prices.clone();
    let listings: ListingsClient = ctx.listings.clone();
    let api: HttpClient = ctx.api.clone();
    let favorite_ids = ctx.favorites.list();
    let filters = filters.clone();

    tokio::spawn(async move {
        let snapshot = prices.fetch().await;
        let protocol_price = snapshot.price("virtual-protocol");
        let page_data = listings
            .fetch_page(tab, page, &favorite_ids, &filters, protocol_price)
            .await;

        let item_ids = page_data.item_ids();
        let (flag_entries, vote_entries) = if item_ids.is_empty() {
            (Vec::new(), Vec::new())
        } else {
            let flags = match api.get_batch_flag_counts(&item_ids).await {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(error = %e, "batch flag count fetch failed");
                    Vec::new()
                }
            };
            let votes = match api.get_batch_vote_counts(&item_ids).await {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(error = %e, "batch vote count fetch failed");
                    Vec::new()
                }
            };
            (flags, votes)
        };

        TickOutcome {
            generation,
            prices: snapshot,
            page: page_data,
            flag_entries,
            vote_entries,
        }
    })
}

/// Apply a current-generation tick: merge the batch counts into the voting
/// caches, then render the page to the log.
fn apply(ctx: &mut AppContext, tab: Tab, page: u32, outcome: TickOutcome) {
    let item_ids = outcome.page.item_ids();
    ctx.voting.apply_flag_counts(&item_ids, outcome.flag_entries);
    ctx.voting.apply_vote_counts(&item_ids, outcome.vote_entries);

    let protocol_price = outcome.prices.price("virtual-protocol");
    let pagination = &outcome.page.meta.pagination;
    info!(
        %tab,
        page,
        page_count = pagination.page_count,
        total = pagination.total,
        favorites = ctx.favorites.count(),
        protocol_price,
        eth_price = outcome.prices.price("ethereum"),
        "refresh tick"
    );

    for listing in &outcome.page.data {
        let id = listing.id.to_string();
        let summary = ctx.voting.cached_summary(&id).cloned().unwrap_or_default();
        let value_usd = listing.virtual_token_value.unwrap_or(0.0) * protocol_price;
        info!(
            id = listing.id,
            name = listing.name.as_deref().unwrap_or("-"),
            symbol = listing.symbol.as_deref().unwrap_or("-"),
            holders = listing.holder_count.unwrap_or(0),
            value_usd,
            favorited = ctx.favorites.is_favorited(&id),
            upvotes = summary.upvote_count,
            downvotes = summary.downvote_count,
            flags = ctx.voting.cached_flag_count(&id).unwrap_or(0),
        );
    }
    ctx.notifier.refresh_ui();
}

/// Render search results to the log with their vote and flag counts.
fn render_search(ctx: &AppContext, term: &str, results: &ListingsPage) {
    if results.data.is_empty() {
        info!(term, "no results found");
        return;
    }
    info!(term, total = results.meta.pagination.total, "search results");
    for listing in &results.data {
        let id = listing.id.to_string();
        let summary = ctx.voting.cached_summary(&id).cloned().unwrap_or_default();
        info!(
            id = listing.id,
            name = listing.name.as_deref().unwrap_or("-"),
            symbol = listing.symbol.as_deref().unwrap_or("-"),
            upvotes = summary.upvote_count,
            downvotes = summary.downvote_count,
            flags = ctx.voting.cached_flag_count(&id).unwrap_or(0),
        );
    }
}

/// Translate stdin lines into refresh events.
///
/// Commands: `tab <name>`, `page <n>`, `search <term>`, `hide`, `show`,
/// `quit`.
pub fn spawn_stdin_events(cancel: CancellationToken) -> mpsc::Receiver<RefreshEvent> {
    let (tx, rx) = mpsc::channel(16);

    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            match parse_command(&line) {
                Some(StdinCommand::Event(event)) => {
                    if tx.send(event).await.is_err() {
                        break;
                    }
                }
                Some(StdinCommand::Quit) => {
                    cancel.cancel();
                    break;
                }
                None => {
                    if !line.trim().is_empty() {
                        warn!(input = %line, "unrecognized command");
                    }
                }
            }
        }
    });

    rx
}

enum StdinCommand {
    Event(RefreshEvent),
    Quit,
}

fn parse_command(line: &str) -> Option<StdinCommand> {
    let mut parts = line.split_whitespace();
    match parts.next()? {
        "tab" => Some(StdinCommand::Event(RefreshEvent::TabChanged(Tab::parse(
            parts.next()?,
        )))),
        "page" => {
            let page = parts.next()?.parse().ok()?;
            Some(StdinCommand::Event(RefreshEvent::PageChanged(page)))
        }
        "search" => {
            let term = line.trim().strip_prefix("search")?.trim();
            if term.is_empty() {
                return None;
            }
            Some(StdinCommand::Event(RefreshEvent::Search(term.to_string())))
        }
        "hide" => Some(StdinCommand::Event(RefreshEvent::VisibilityChanged(false))),
        "show" => Some(StdinCommand::Event(RefreshEvent::VisibilityChanged(true))),
        "quit" | "exit" => Some(StdinCommand::Quit),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_by_tab() {
        assert_eq!(period(Tab::Favorites), Duration::from_secs(7));
        assert_eq!(period(Tab::Prototype), Duration::from_secs(60));
        assert_eq!(period(Tab::Latest), Duration::from_secs(60));
        assert_eq!(period(Tab::Sentient), Duration::from_secs(60));
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            match parse_command("tab favorites") {
                Some(StdinCommand::Event(e)) => Some(e),
                _ => None,
            },
            Some(RefreshEvent::TabChanged(Tab::Favorites))
        );
        assert_eq!(
            match parse_command("page 3") {
                Some(StdinCommand::Event(e)) => Some(e),
                _ => None,
            },
            Some(RefreshEvent::PageChanged(3))
        );
        assert_eq!(
            match parse_command("search luna ai") {
                Some(StdinCommand::Event(e)) => Some(e),
                _ => None,
            },
            Some(RefreshEvent::Search("luna ai".to_string()))
        );
        assert!(parse_command("search   ").is_none());
        assert!(matches!(parse_command("quit"), Some(StdinCommand::Quit)));
        assert!(parse_command("bogus").is_none());
        assert!(parse_command("").is_none());
    }

    #[tokio::test]
    async fn test_superseded_tick_results_are_dropped() {
        use vbea::VbeaConfig;
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        // Listings respond slowly with one item, so the first tick is still
        // in flight when the tab switches out from under it.
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/virtuals"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({
                        "data": [{"id": 7, "name": "slowpoke"}],
                        "meta": {"pagination": {"page": 1, "pageCount": 1, "total": 1}}
                    }))
                    .set_delay(Duration::from_millis(800)),
            )
            .mount(&server)
            .await;

        let mut config = VbeaConfig::default();
        config.listings_base_url = server.uri();
        // Unroutable: price and count fetches degrade immediately.
        config.api_base_url = "http://127.0.0.1:9".into();
        config.price_base_url = "http://127.0.0.1:9".into();
        config.rpc_url = "http://127.0.0.1:9".into();

        let mut ctx = AppContext::init(&config, None).unwrap();
        let (tx, rx) = mpsc::channel(16);
        let cancel = CancellationToken::new();

        let driver = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                // Supersede the first tick before its delayed response lands.
                // The favorites tab has no favorites, so the follow-up tick
                // completes without touching the listings endpoint.
                time::sleep(Duration::from_millis(150)).await;
                let _ = tx.send(RefreshEvent::TabChanged(Tab::Favorites)).await;
                time::sleep(Duration::from_millis(1500)).await;
                cancel.cancel();
            })
        };

        run(
            &mut ctx,
            Some(Tab::Prototype),
            1,
            ListingFilters::default(),
            rx,
            cancel,
        )
        .await;
        driver.await.unwrap();

        // The superseded tick carried item 7; its counts must never reach
        // the voting caches.
        assert!(ctx.voting.cached_flag_count("7").is_none());
        assert!(ctx.voting.cached_summary("7").is_none());
        assert_eq!(ctx.listings.current_tab(), Tab::Favorites);
    }
}

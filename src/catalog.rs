//! Trading-card catalog.
//!
//! The catalog is a static JSON list of cards shipped with the application
//! (`catalog.path`). It is read once per process on first use and then only
//! filtered locally. [`sync_catalog`] rebuilds that file from the TCG API.

use crate::config::TcgConfig;
use crate::error::{AppError, Result};
use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::OnceCell;

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct TradingCard {
    pub id: String,
    pub name: String,
    pub rarity: Option<String>,
    #[serde(default)]
    pub images: CardImages,
    #[serde(default)]
    pub set: CardSet,
    pub tcgplayer: Option<TcgPlayer>,
    pub cardmarket: Option<CardMarket>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct CardImages {
    pub small: Option<String>,
    pub large: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct CardSet {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// "YYYY/MM/DD" as published by the TCG API.
    pub release_date: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct TcgPlayer {
    #[serde(default)]
    pub prices: TcgPlayerPrices,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct TcgPlayerPrices {
    pub holofoil: Option<MarketPrice>,
    pub reverse_holofoil: Option<MarketPrice>,
    pub normal: Option<MarketPrice>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct MarketPrice {
    pub market: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct CardMarket {
    #[serde(default)]
    pub prices: CardMarketPrices,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct CardMarketPrices {
    pub average_sell_price: Option<f64>,
    pub avg30: Option<f64>,
    pub avg7: Option<f64>,
}

impl TradingCard {
    /// First positive market price, tcgplayer before cardmarket; 0 when none.
    pub fn price(&self) -> f64 {
        let tcg = self.tcgplayer.as_ref().map(|t| &t.prices);
        let market = self.cardmarket.as_ref().map(|c| &c.prices);

        let candidates = [
            tcg.and_then(|p| p.holofoil.as_ref()).and_then(|m| m.market),
            tcg.and_then(|p| p.reverse_holofoil.as_ref()).and_then(|m| m.market),
            tcg.and_then(|p| p.normal.as_ref()).and_then(|m| m.market),
            market.and_then(|p| p.average_sell_price),
            market.and_then(|p| p.avg30),
            market.and_then(|p| p.avg7),
        ];
        candidates
            .into_iter()
            .flatten()
            .find(|price| *price > 0.0)
            .unwrap_or(0.0)
    }

    pub fn release_date(&self) -> Option<NaiveDate> {
        let raw = self.set.release_date.as_deref()?;
        NaiveDate::parse_from_str(raw, "%Y/%m/%d")
            .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
            .ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum CardSort {
    #[default]
    PriceHigh,
    PriceLow,
    DateNew,
    DateOld,
}

/// Orders cards in place. Cards without a release date sort last for both
/// date orders.
pub fn sort_cards(cards: &mut [TradingCard], order: CardSort) {
    match order {
        CardSort::PriceHigh => cards.sort_by(|a, b| b.price().total_cmp(&a.price())),
        CardSort::PriceLow => cards.sort_by(|a, b| a.price().total_cmp(&b.price())),
        CardSort::DateNew => cards.sort_by(|a, b| match (a.release_date(), b.release_date()) {
            (Some(x), Some(y)) => y.cmp(&x),
            (x, y) => y.is_some().cmp(&x.is_some()),
        }),
        CardSort::DateOld => cards.sort_by(|a, b| match (a.release_date(), b.release_date()) {
            (Some(x), Some(y)) => x.cmp(&y),
            (x, y) => y.is_some().cmp(&x.is_some()),
        }),
    }
}

/// Lazily loaded, never invalidated card list.
pub struct CardCatalog {
    path: PathBuf,
    cards: OnceCell<Vec<TradingCard>>,
}

impl CardCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cards: OnceCell::new(),
        }
    }

    pub fn from_cards(cards: Vec<TradingCard>) -> Self {
        Self {
            path: PathBuf::new(),
            cards: OnceCell::new_with(Some(cards)),
        }
    }

    #[cfg(test)]
    fn is_loaded(&self) -> bool {
        self.cards.initialized()
    }

    pub async fn cards(&self) -> Result<&[TradingCard]> {
        let cards = self
            .cards
            .get_or_try_init(|| load_cards(&self.path))
            .await?;
        Ok(cards.as_slice())
    }

    /// Cards whose name contains `name`, ignoring case, ordered by price
    /// (highest first).
    pub async fn matching(&self, name: &str) -> Result<Vec<TradingCard>> {
        let needle = name.to_lowercase();
        let mut found: Vec<TradingCard> = self
            .cards()
            .await?
            .iter()
            .filter(|card| card.name.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        sort_cards(&mut found, CardSort::PriceHigh);
        tracing::debug!("Matched {} cards for {}", found.len(), name);
        Ok(found)
    }
}

async fn load_cards(path: &Path) -> Result<Vec<TradingCard>> {
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(
                "Card catalog {} not found; continuing without cards (run `pokedex sync-cards`)",
                path.display()
            );
            return Ok(Vec::new());
        }
        Err(e) => return Err(AppError::Io(e)),
    };

    let cards: Vec<TradingCard> = serde_json::from_str(&raw).map_err(|e| {
        tracing::error!("Card catalog {} is not a card list: {}", path.display(), e);
        AppError::Malformed(format!("{}: {}", path.display(), e))
    })?;
    tracing::info!("Loaded {} cards from {}", cards.len(), path.display());
    Ok(cards)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CardPage {
    #[serde(default)]
    data: Vec<serde_json::Value>,
    total_count: Option<u64>,
}

/// Pages downloaded so far, kept next to the output until the sync completes.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SyncProgress {
    total_count: u64,
    page_size: u32,
    pages: BTreeMap<u32, Vec<serde_json::Value>>,
}

const RETRY_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];
const RETRY_DELAY_SECS: u64 = 2;

enum PageError {
    Retry(Duration, String),
    Fatal(AppError),
}

/// Where an unfinished sync of `output` keeps its pages (`cards.json.tmp`).
pub fn progress_path(output: &Path) -> PathBuf {
    suffixed(output, ".tmp")
}

fn suffixed(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// Downloads the complete card list from the TCG API into `output`.
///
/// Every finished page is recorded in [`progress_path`], and a later run
/// against the same listing only requests the pages still missing. Pages
/// that fail after `max_retries` attempts are skipped; the output is written
/// either way and the number of cards in it is returned.
pub async fn sync_catalog(config: &TcgConfig, output: &Path) -> Result<usize> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout.max(1) as u64))
        .build()
        .map_err(|e| AppError::Config(format!("cannot build HTTP client: {}", e)))?;

    let first = fetch_page(&client, config, 1, 1).await?;
    let total = first
        .total_count
        .ok_or_else(|| AppError::Malformed("no totalCount in card listing".to_string()))?;
    let page_size = config.page_size.max(1);
    let pages = u32::try_from(total.div_ceil(u64::from(page_size))).map_err(|_| {
        AppError::Malformed(format!("totalCount {} is too large to page through", total))
    })?;
    tracing::info!("Total cards: {}, pages: {}", total, pages);

    let progress_file = progress_path(output);
    let mut progress = load_progress(&progress_file, total, page_size).await;
    let pending: Vec<u32> = (1..=pages)
        .filter(|page| !progress.pages.contains_key(page))
        .collect();

    let mut fetched = stream::iter(pending)
        .map(|page| {
            let client = &client;
            async move { (page, fetch_page(client, config, page, page_size).await) }
        })
        .buffer_unordered(config.max_workers.max(1));

    while let Some((page, outcome)) = fetched.next().await {
        match outcome {
            Ok(body) => {
                tracing::debug!("Page {} done ({} cards)", page, body.data.len());
                progress.pages.insert(page, body.data);
                write_atomically(&progress_file, &serde_json::to_vec(&progress)?).await?;
            }
            Err(e) => tracing::warn!("Skipping page {}: {}", page, e),
        }
    }

    let cards: Vec<&serde_json::Value> = progress.pages.values().flatten().collect();
    write_atomically(output, &serde_json::to_vec_pretty(&cards)?).await?;
    tracing::info!("Saved {} cards to {}", cards.len(), output.display());

    let missing = (pages as usize).saturating_sub(progress.pages.len());
    if missing == 0 {
        match tokio::fs::remove_file(&progress_file).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("Cannot remove {}: {}", progress_file.display(), e),
        }
    } else {
        tracing::warn!(
            "{} pages missing; run the sync again to fetch only those",
            missing
        );
    }
    Ok(cards.len())
}

/// Reads the progress of an earlier run. Anything unreadable, or recorded
/// for a different listing, starts over.
async fn load_progress(path: &Path, total_count: u64, page_size: u32) -> SyncProgress {
    let fresh = SyncProgress {
        total_count,
        page_size,
        pages: BTreeMap::new(),
    };

    let raw = match tokio::fs::read(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return fresh,
        Err(e) => {
            tracing::warn!("Cannot read {}: {}; starting over", path.display(), e);
            return fresh;
        }
    };
    let progress: SyncProgress = match serde_json::from_slice(&raw) {
        Ok(progress) => progress,
        Err(e) => {
            tracing::warn!("Ignoring unreadable progress file {}: {}", path.display(), e);
            return fresh;
        }
    };
    if progress.total_count != total_count || progress.page_size != page_size {
        tracing::warn!(
            "Card listing changed since the last run ({} cards in pages of {}); starting over",
            progress.total_count,
            progress.page_size
        );
        return fresh;
    }

    tracing::info!(
        "Resuming sync with {} pages from {}",
        progress.pages.len(),
        path.display()
    );
    progress
}

async fn fetch_page(
    client: &reqwest::Client,
    config: &TcgConfig,
    page: u32,
    page_size: u32,
) -> Result<CardPage> {
    let url = format!(
        "{}/cards?page={}&pageSize={}",
        config.api_url.trim_end_matches('/'),
        page,
        page_size
    );

    let attempts = config.max_retries.max(1);
    let mut last_failure = String::new();
    for attempt in 0..attempts {
        match try_fetch_page(client, config, &url, attempt).await {
            Ok(body) => return Ok(body),
            Err(PageError::Fatal(e)) => return Err(e),
            Err(PageError::Retry(delay, reason)) => {
                if attempt + 1 < attempts {
                    tracing::debug!(
                        "Page {} attempt {} failed ({}); retrying in {:.1}s",
                        page,
                        attempt + 1,
                        reason,
                        delay.as_secs_f64()
                    );
                    tokio::time::sleep(delay).await;
                }
                last_failure = reason;
            }
        }
    }
    Err(AppError::Unavailable(format!(
        "page {} failed after {} attempts ({})",
        page, attempts, last_failure
    )))
}

async fn try_fetch_page(
    client: &reqwest::Client,
    config: &TcgConfig,
    url: &str,
    attempt: u32,
) -> std::result::Result<CardPage, PageError> {
    let mut request = client.get(url);
    if !config.api_key.is_empty() {
        request = request.header("X-Api-Key", &config.api_key);
    }

    let response = match request.send().await {
        Ok(response) => response,
        Err(e) => {
            let delay = Duration::from_secs(RETRY_DELAY_SECS * u64::from(attempt + 1));
            return Err(PageError::Retry(delay, e.to_string()));
        }
    };

    let status = response.status();
    if RETRY_STATUSES.contains(&status.as_u16()) {
        return Err(PageError::Retry(backoff(attempt), format!("HTTP {}", status)));
    }
    if !status.is_success() {
        return Err(PageError::Fatal(AppError::Unavailable(format!(
            "{} answered with status {}",
            url, status
        ))));
    }

    response
        .json::<CardPage>()
        .await
        .map_err(|e| PageError::Fatal(AppError::Malformed(format!("{}: {}", url, e))))
}

fn backoff(attempt: u32) -> Duration {
    let base = 2f64.powi(attempt.min(10) as i32);
    Duration::from_secs_f64(base + rand::random_range(0.0..1.0))
}

/// Writes `bytes` next to `target` and renames the result over it.
async fn write_atomically(target: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let part = suffixed(target, ".part");
    tokio::fs::write(&part, bytes).await?;
    tokio::fs::rename(&part, target).await?;
    Ok(())
}

use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::config::CatalogConfig;
use crate::models::CardReading;

/// One printing of a card
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CardRecord {
    pub name: String,
    pub set: String,
    pub collector_number: String,
    #[serde(default)]
    pub prints_search_uri: Option<String>,
}

pub trait CardCatalog {
    /// Exact printing by set code and collector number
    fn card_by_number(&self, set_code: &str, collector_number: &str) -> Result<Option<CardRecord>>;

    /// Best card for an approximate name
    fn card_by_fuzzy_name(&self, title: &str) -> Result<Option<CardRecord>>;

    /// Every printing of `card`
    fn printings(&self, card: &CardRecord) -> Result<Vec<CardRecord>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardMatch {
    /// Set and collector number lookup agreed with the title
    Exact(CardRecord),
    /// Fuzzy title, with a printing in the observed set
    ConfirmedPrinting(CardRecord),
    /// Fuzzy title only
    FuzzyTitle { name: String },
    /// Nothing matched; carries the title as read
    Unmatched { title: String },
}

impl CardMatch {
    pub fn tier(&self) -> &'static str {
        match self {
            CardMatch::Exact(_) => "exact",
            CardMatch::ConfirmedPrinting(_) => "fuzzy-title-confirmed",
            CardMatch::FuzzyTitle { .. } => "fuzzy-title",
            CardMatch::Unmatched { .. } => "no-match",
        }
    }

    pub fn is_matched(&self) -> bool {
        !matches!(self, CardMatch::Unmatched { .. })
    }

    /// `Name (set) number` when the printing is known, else just the name
    pub fn decklist_line(&self) -> String {
        match self {
            CardMatch::Exact(card) | CardMatch::ConfirmedPrinting(card) => {
                format!("{} ({}) {}", card.name, card.set, card.collector_number)
            }
            CardMatch::FuzzyTitle { name } => name.clone(),
            CardMatch::Unmatched { title } => title.clone(),
        }
    }
}

/// Works down from the most confident lookup to the least: set and collector
/// number confirmed by title, then a fuzzy title cross-referenced against the
/// observed set, then the fuzzy title alone. A failing lookup falls through to
/// the next one.
pub fn canonicalize(catalog: &dyn CardCatalog, reading: &CardReading) -> CardMatch {
    let title = reading.title.as_str();
    let set_code = reading.set_code.as_deref().map(|s| s.split('/').next().unwrap_or(s));

    if let (Some(set_code), Some(number)) = (set_code, reading.collector_number.as_deref()) {
        if is_plausible_set_code(set_code) && is_plausible_collector_number(number) {
            match catalog.card_by_number(set_code, number) {
                Ok(Some(card)) if card.name == title => return CardMatch::Exact(card),
                Ok(Some(card)) => {
                    tracing::debug!("{set_code}/{number} is {:?}, read {title:?}", card.name);
                }
                Ok(None) => tracing::debug!("no card at {set_code}/{number}"),
                Err(e) => tracing::warn!("set/number lookup failed: {e:#}"),
            }
        }
    }

    let card = match catalog.card_by_fuzzy_name(title) {
        Ok(Some(card)) => card,
        Ok(None) => return CardMatch::Unmatched { title: title.to_string() },
        Err(e) => {
            tracing::warn!("fuzzy title lookup failed: {e:#}");
            return CardMatch::Unmatched { title: title.to_string() };
        }
    };

    let Some(set_code) = set_code else {
        return CardMatch::FuzzyTitle { name: card.name };
    };

    let printings = match catalog.printings(&card) {
        Ok(printings) => printings,
        Err(e) => {
            tracing::warn!("printings lookup failed: {e:#}");
            return CardMatch::FuzzyTitle { name: card.name };
        }
    };

    let in_set: Vec<&CardRecord> = printings.iter().filter(|p| p.set == set_code).collect();
    let chosen = in_set
        .iter()
        .find(|p| Some(p.collector_number.as_str()) == reading.collector_number.as_deref())
        .or_else(|| in_set.first());
    match chosen {
        Some(printing) => CardMatch::ConfirmedPrinting((*printing).clone()),
        None => CardMatch::FuzzyTitle { name: card.name },
    }
}

fn is_plausible_set_code(code: &str) -> bool {
    (1..=3).contains(&code.len()) && code.chars().all(|c| c.is_ascii_alphanumeric())
}

fn is_plausible_collector_number(number: &str) -> bool {
    (1..=3).contains(&number.len()) && number.chars().all(|c| c.is_ascii_digit())
}

/// The Scryfall REST API
pub struct ScryfallCatalog {
    client: Client,
    base_url: String,
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

#[derive(Debug, Deserialize)]
struct CardList {
    data: Vec<CardRecord>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    next_page: Option<String>,
}

impl ScryfallCatalog {
    pub fn new(config: &CatalogConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(10))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            min_interval: Duration::from_millis(config.min_interval_ms),
            last_request: Mutex::new(None),
        })
    }

    /// Waits until `min_interval` has passed since the previous request.
    /// Requests are serialised while the returned guard is held.
    fn throttle(&self) -> MutexGuard<'_, Option<Instant>> {
        let mut last = self.last_request.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                std::thread::sleep(self.min_interval - elapsed);
            }
        }
        *last = Some(Instant::now());
        last
    }

    fn get<T: for<'de> Deserialize<'de>>(&self, url: &str, query: &[(&str, &str)]) -> Result<Option<T>> {
        let _turn = self.throttle();
        tracing::debug!("GET {url}");
        let response = self.client.get(url).query(query).send()?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            anyhow::bail!("{url} returned {status}");
        }
        let body = response.json().with_context(|| format!("unexpected response from {url}"))?;
        Ok(Some(body))
    }
}

impl CardCatalog for ScryfallCatalog {
    fn card_by_number(&self, set_code: &str, collector_number: &str) -> Result<Option<CardRecord>> {
        let url = format!("{}/cards/{}/{}", self.base_url, set_code, collector_number);
        self.get(&url, &[])
    }

    fn card_by_fuzzy_name(&self, title: &str) -> Result<Option<CardRecord>> {
        if title.trim().is_empty() {
            return Ok(None);
        }
        let url = format!("{}/cards/named", self.base_url);
        self.get(&url, &[("fuzzy", title)])
    }

    fn printings(&self, card: &CardRecord) -> Result<Vec<CardRecord>> {
        let Some(mut next) = card.prints_search_uri.clone() else {
            return Ok(Vec::new());
        };

        let mut printings = Vec::new();
        loop {
            let Some(page) = self.get::<CardList>(&next, &[])? else {
                break;
            };
            printings.extend(page.data);
            match page.next_page {
                Some(url) if page.has_more => next = url,
                _ => break,
            }
        }
        Ok(printings)
    }
}

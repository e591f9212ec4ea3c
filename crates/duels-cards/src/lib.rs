//! Card reference data: the resolver contract and the in-memory card database.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use duels_core::CardMetadata;
use duels_storage::HttpFetcher;
use thiserror::Error;
use tracing::info;

pub const CRATE_NAME: &str = "duels-cards";

/// Card that every complete reference database contains; used as the init self-check.
pub const SENTINEL_CARD_ID: &str = "REV_375";

pub const DEFAULT_CARDS_URL: &str =
    "https://static.zerotoheroes.com/hearthstone/jsoncards/cards.json";

#[derive(Debug, Error)]
pub enum ResolverError {
    #[error("cards not initialized: sentinel {sentinel} missing ({loaded} cards loaded)")]
    NotInitialized { sentinel: String, loaded: usize },
}

/// Read-only lookup over card reference data.
pub trait CardResolver: Send + Sync {
    fn card(&self, id: &str) -> Option<&CardMetadata>;

    fn card_by_dbf_id(&self, dbf_id: i64) -> Option<&CardMetadata>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn health_check(&self) -> Result<(), ResolverError> {
        match self.card(SENTINEL_CARD_ID) {
            Some(card) if !card.id.is_empty() => Ok(()),
            _ => Err(ResolverError::NotInitialized {
                sentinel: SENTINEL_CARD_ID.to_string(),
                loaded: self.len(),
            }),
        }
    }
}

/// Where the raw card list comes from.
#[async_trait]
pub trait CardSource: Send + Sync {
    fn describe(&self) -> String;

    async fn load_cards(&self) -> Result<Vec<CardMetadata>>;
}

#[derive(Debug, Clone)]
pub struct FileCardSource {
    path: PathBuf,
}

impl FileCardSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CardSource for FileCardSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn load_cards(&self) -> Result<Vec<CardMetadata>> {
        read_cards_file(&self.path)
    }
}

pub struct HttpCardSource {
    http: HttpFetcher,
    url: String,
}

impl HttpCardSource {
    pub fn new(http: HttpFetcher, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }
}

#[async_trait]
impl CardSource for HttpCardSource {
    fn describe(&self) -> String {
        self.url.clone()
    }

    async fn load_cards(&self) -> Result<Vec<CardMetadata>> {
        let response = self
            .http
            .fetch_bytes(&self.url)
            .await
            .with_context(|| format!("downloading card database {}", self.url))?;
        parse_cards(&response.body).with_context(|| format!("parsing card database {}", self.url))
    }
}

pub fn read_cards_file(path: impl AsRef<Path>) -> Result<Vec<CardMetadata>> {
    let path = path.as_ref();
    let data = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    parse_cards(&data).with_context(|| format!("parsing {}", path.display()))
}

pub fn parse_cards(bytes: &[u8]) -> Result<Vec<CardMetadata>> {
    Ok(serde_json::from_slice(bytes)?)
}

/// In-memory card database indexed by symbolic id and by dbf id.
#[derive(Debug, Clone, Default)]
pub struct CardDatabase {
    cards: Vec<CardMetadata>,
    by_id: HashMap<String, usize>,
    by_dbf_id: HashMap<i64, usize>,
}

impl CardDatabase {
    pub fn from_cards(cards: Vec<CardMetadata>) -> Self {
        let mut by_id = HashMap::with_capacity(cards.len());
        let mut by_dbf_id = HashMap::with_capacity(cards.len());
        for (idx, card) in cards.iter().enumerate() {
            if !card.id.is_empty() {
                by_id.entry(card.id.clone()).or_insert(idx);
            }
            if card.dbf_id > 0 {
                by_dbf_id.entry(card.dbf_id).or_insert(idx);
            }
        }
        Self {
            cards,
            by_id,
            by_dbf_id,
        }
    }

    /// Load the full card list from `source`. Callers run `health_check` before use.
    pub async fn initialize(source: &dyn CardSource) -> Result<Self> {
        let cards = source
            .load_cards()
            .await
            .with_context(|| format!("initializing card database from {}", source.describe()))?;
        let db = Self::from_cards(cards);
        info!(cards = db.len(), source = %source.describe(), "card database loaded");
        Ok(db)
    }
}

impl CardResolver for CardDatabase {
    fn card(&self, id: &str) -> Option<&CardMetadata> {
        self.by_id.get(id).map(|&idx| &self.cards[idx])
    }

    fn card_by_dbf_id(&self, dbf_id: i64) -> Option<&CardMetadata> {
        self.by_dbf_id.get(&dbf_id).map(|&idx| &self.cards[idx])
    }

    fn len(&self) -> usize {
        self.cards.len()
    }
}

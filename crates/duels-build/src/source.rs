//! Where loot offer rows come from.

use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use duels_core::RawOfferRow;
use sqlx::mysql::MySqlRow;
use sqlx::{Connection, MySqlConnection, Row};
use tokio::fs;
use tracing::info;

#[async_trait]
pub trait OfferSource: Send + Sync {
    fn describe(&self) -> String;

    async fn fetch_rows(&self) -> Result<Vec<RawOfferRow>>;
}

const LOOT_QUERY: &str = r#"
    SELECT option1, option1Contents, option2, option2Contents, option3, option3Contents
      FROM dungeon_run_loot_info
       USE INDEX (ix_buildBuckets)
     WHERE creationDate > DATE_SUB(NOW(), INTERVAL ? DAY)
       AND bundleType = 'loot'
       AND adventureType IN ('duels', 'paid-duels')
     ORDER BY id DESC
"#;

/// Recent Duels loot offers from the run tracker's MySQL database.
#[derive(Debug, Clone)]
pub struct SqlOfferSource {
    database_url: String,
    lookback_days: u32,
}

impl SqlOfferSource {
    pub fn new(database_url: impl Into<String>, lookback_days: u32) -> Self {
        Self {
            database_url: database_url.into(),
            lookback_days,
        }
    }
}

#[async_trait]
impl OfferSource for SqlOfferSource {
    fn describe(&self) -> String {
        format!("dungeon_run_loot_info (last {} days)", self.lookback_days)
    }

    async fn fetch_rows(&self) -> Result<Vec<RawOfferRow>> {
        let mut conn = MySqlConnection::connect(&self.database_url)
            .await
            .context("connecting to offers database")?;
        info!(lookback_days = self.lookback_days, "running loot query");
        let rows = sqlx::query(LOOT_QUERY)
            .bind(self.lookback_days)
            .fetch_all(&mut conn)
            .await
            .context("querying dungeon_run_loot_info")?;
        conn.close().await.context("closing offers connection")?;
        info!(rows = rows.len(), "connection closed");

        rows.iter().map(offer_from_row).collect()
    }
}

fn offer_from_row(row: &MySqlRow) -> Result<RawOfferRow> {
    let text = |column: &str| -> Result<String> {
        let value: Option<String> = row
            .try_get(column)
            .with_context(|| format!("reading column {column}"))?;
        Ok(value.unwrap_or_default())
    };
    Ok(RawOfferRow {
        option1: text("option1")?,
        option1_contents: text("option1Contents")?,
        option2: text("option2")?,
        option2_contents: text("option2Contents")?,
        option3: text("option3")?,
        option3_contents: text("option3Contents")?,
    })
}

/// Offer rows captured as a JSON array, for offline runs and tests.
#[derive(Debug, Clone)]
pub struct FixtureOfferSource {
    path: PathBuf,
}

impl FixtureOfferSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl OfferSource for FixtureOfferSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn fetch_rows(&self) -> Result<Vec<RawOfferRow>> {
        let text = fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("reading {}", self.path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing {}", self.path.display()))
    }
}

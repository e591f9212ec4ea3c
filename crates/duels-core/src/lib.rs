//! Core domain model for the Duels buckets builder.

use serde::{Deserialize, Deserializer, Serialize};

pub const CRATE_NAME: &str = "duels-core";

pub const CLASS_NEUTRAL: &str = "NEUTRAL";
pub const CLASS_DEATHKNIGHT: &str = "DEATHKNIGHT";
pub const CLASS_HUNTER: &str = "HUNTER";

/// One loot offer as stored by the run tracker: three option slots, each with a
/// bucket id and the comma-separated card ids drawn from that bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawOfferRow {
    #[serde(deserialize_with = "null_as_empty")]
    pub option1: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub option1_contents: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub option2: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub option2_contents: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub option3: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub option3_contents: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl RawOfferRow {
    /// The three `(bucket id, contents)` slots in column order.
    pub fn slots(&self) -> [(&str, &str); 3] {
        [
            (&self.option1, &self.option1_contents),
            (&self.option2, &self.option2_contents),
            (&self.option3, &self.option3_contents),
        ]
    }
}

/// A single observation of a bucket: the cards it offered in one slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketMap {
    pub bucket_id: String,
    pub card_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketCard {
    pub card_id: String,
    pub card_name: String,
    pub total_offered: usize,
}

/// Published summary of a bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketInfo {
    pub bucket_id: String,
    pub bucket_name: String,
    pub bucket_classes: Vec<String>,
    pub cards: Vec<BucketCard>,
}

/// Reference data for a card, as found in the card database JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CardMetadata {
    pub id: String,
    pub dbf_id: i64,
    pub name: String,
    pub card_class: Option<String>,
    pub classes: Vec<String>,
    pub deck_duplicate_dbf_id: Option<i64>,
}

impl CardMetadata {
    /// Cards tagged with several classes (dual-class cards).
    pub fn is_multi_class(&self) -> bool {
        !self.classes.is_empty()
    }

    /// True when the card has an alternate deck-building id for the same print.
    pub fn has_duplicate_variant(&self) -> bool {
        self.deck_duplicate_dbf_id.is_some_and(|id| id != 0)
    }
}

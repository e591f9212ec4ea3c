//! Expansion, grouping and normalization of loot offers into bucket summaries.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use anyhow::{Context, Result};
use duels_cards::CardResolver;
use duels_core::{
    BucketCard, BucketInfo, BucketMap, CardMetadata, RawOfferRow, CLASS_DEATHKNIGHT,
    CLASS_HUNTER, CLASS_NEUTRAL,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// The Traps and Trappers tavern brawl token. Its cards span several classes
/// but the bucket is always offered to hunters.
pub const TRAPS_AND_TRAPPERS_BUCKET_ID: &str = "PVPDR_TrapsAndTrappersToken";

/// Something odd seen while normalizing a bucket. The run still publishes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Anomaly {
    UnresolvedDbfId { bucket_id: String, dbf_id: i64 },
    MissingCard { bucket_id: String, card_id: String },
    AmbiguousClasses { bucket_id: String, classes: Vec<String> },
}

impl Anomaly {
    pub fn bucket_id(&self) -> &str {
        match self {
            Anomaly::UnresolvedDbfId { bucket_id, .. }
            | Anomaly::MissingCard { bucket_id, .. }
            | Anomaly::AmbiguousClasses { bucket_id, .. } => bucket_id,
        }
    }

    pub fn log(&self) {
        match self {
            Anomaly::UnresolvedDbfId { bucket_id, dbf_id } => {
                warn!(%bucket_id, dbf_id, "card dbf id did not resolve");
            }
            Anomaly::MissingCard { bucket_id, card_id } => {
                warn!(%bucket_id, %card_id, "missing card");
            }
            Anomaly::AmbiguousClasses { bucket_id, classes } => {
                warn!(%bucket_id, ?classes, "incorrect bucket class");
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassOverride {
    pub bucket_id: String,
    pub classes: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ClassOverridesFile {
    #[allow(dead_code)]
    version: u32,
    #[serde(default)]
    overrides: Vec<ClassOverride>,
}

/// Manual bucket class assignments that win over inferred classes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassOverrides {
    rules: Vec<ClassOverride>,
}

impl Default for ClassOverrides {
    fn default() -> Self {
        Self {
            rules: vec![ClassOverride {
                bucket_id: TRAPS_AND_TRAPPERS_BUCKET_ID.to_string(),
                classes: vec![CLASS_HUNTER.to_string()],
            }],
        }
    }
}

impl ClassOverrides {
    pub fn new(rules: Vec<ClassOverride>) -> Self {
        Self { rules }
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let file: ClassOverridesFile = serde_yaml::from_str(text)?;
        Ok(Self::new(file.overrides))
    }

    pub fn from_yaml_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::from_yaml_str(&text).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn classes_for(&self, bucket_id: &str) -> Option<&[String]> {
        self.rules
            .iter()
            .find(|rule| rule.bucket_id == bucket_id)
            .map(|rule| rule.classes.as_slice())
    }
}

/// Every offer row yields one observation per option slot, empty slots included.
pub fn expand_offers(rows: &[RawOfferRow]) -> Vec<BucketMap> {
    rows.iter()
        .flat_map(|row| row.slots())
        .map(|(bucket_id, contents)| BucketMap {
            bucket_id: bucket_id.to_string(),
            card_ids: split_card_ids(contents),
        })
        .collect()
}

fn split_card_ids(contents: &str) -> Vec<String> {
    contents
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Bucket maps grouped by bucket id. Keys keep first-occurrence order and each
/// group keeps input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupedBuckets {
    groups: Vec<(String, Vec<BucketMap>)>,
}

impl GroupedBuckets {
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn bucket_ids(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|(id, _)| id.as_str())
    }

    pub fn get(&self, bucket_id: &str) -> Option<&[BucketMap]> {
        self.groups
            .iter()
            .find(|(id, _)| id == bucket_id)
            .map(|(_, maps)| maps.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[BucketMap])> {
        self.groups
            .iter()
            .map(|(id, maps)| (id.as_str(), maps.as_slice()))
    }
}

pub fn group_by_bucket(maps: Vec<BucketMap>) -> GroupedBuckets {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<BucketMap>)> = Vec::new();
    for map in maps {
        let slot = *index.entry(map.bucket_id.clone()).or_insert_with(|| {
            groups.push((map.bucket_id.clone(), Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(map);
    }
    GroupedBuckets { groups }
}

/// A card id after numeric ids have been looked up. Unresolved numeric ids are
/// kept under their decimal form and sort by the id they are published with.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ResolvedId {
    Canonical(String),
    Unresolved { dbf_id: i64, card_id: String },
}

impl ResolvedId {
    fn unresolved(dbf_id: i64) -> Self {
        ResolvedId::Unresolved {
            dbf_id,
            card_id: dbf_id.to_string(),
        }
    }

    fn card_id(&self) -> &str {
        match self {
            ResolvedId::Canonical(id) => id,
            ResolvedId::Unresolved { card_id, .. } => card_id,
        }
    }

    fn is_unresolved(&self) -> bool {
        matches!(self, ResolvedId::Unresolved { .. })
    }
}

impl Ord for ResolvedId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.card_id()
            .cmp(other.card_id())
            .then_with(|| self.is_unresolved().cmp(&other.is_unresolved()))
    }
}

impl PartialOrd for ResolvedId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedBucket {
    pub info: BucketInfo,
    pub anomalies: Vec<Anomaly>,
}

pub struct BucketNormalizer<'a> {
    resolver: &'a dyn CardResolver,
    overrides: &'a ClassOverrides,
}

impl<'a> BucketNormalizer<'a> {
    pub fn new(resolver: &'a dyn CardResolver, overrides: &'a ClassOverrides) -> Self {
        Self {
            resolver,
            overrides,
        }
    }

    /// Normalize every group in key order.
    pub fn normalize_all(&self, grouped: &GroupedBuckets) -> (Vec<BucketInfo>, Vec<Anomaly>) {
        let mut infos = Vec::with_capacity(grouped.len());
        let mut anomalies = Vec::new();
        for (bucket_id, maps) in grouped.iter() {
            let normalized = self.normalize(bucket_id, maps);
            infos.push(normalized.info);
            anomalies.extend(normalized.anomalies);
        }
        (infos, anomalies)
    }

    pub fn normalize(&self, bucket_id: &str, maps: &[BucketMap]) -> NormalizedBucket {
        let mut anomalies = Vec::new();

        // Occurrence counts keyed by resolved id; key order is the sorted distinct set.
        let mut offered: BTreeMap<ResolvedId, usize> = BTreeMap::new();
        for raw in maps.iter().flat_map(|m| m.card_ids.iter()) {
            *offered.entry(self.resolve_id(raw)).or_default() += 1;
        }

        // Bucket ids resolve like card ids; overrides match the symbolic id.
        let bucket_card = self.resolve_card(bucket_id);
        let override_key = bucket_card.map_or(bucket_id, |card| card.id.as_str());

        let bucket_classes =
            self.infer_classes(bucket_id, override_key, offered.keys(), &mut anomalies);
        let cards = self.count_cards(bucket_id, &offered, &mut anomalies);
        let cards = self.merge_by_name(cards);

        let bucket_name = bucket_card
            .map(|card| card.name.clone())
            .unwrap_or_default();

        NormalizedBucket {
            info: BucketInfo {
                bucket_id: bucket_id.to_string(),
                bucket_name,
                bucket_classes,
                cards,
            },
            anomalies,
        }
    }

    fn resolve_id(&self, raw: &str) -> ResolvedId {
        match raw.parse::<i64>() {
            Ok(dbf_id) => match self.resolver.card_by_dbf_id(dbf_id) {
                Some(card) if !card.id.is_empty() => ResolvedId::Canonical(card.id.clone()),
                _ => ResolvedId::unresolved(dbf_id),
            },
            Err(_) => ResolvedId::Canonical(raw.to_string()),
        }
    }

    fn resolve_card(&self, raw: &str) -> Option<&'a CardMetadata> {
        match raw.parse::<i64>() {
            Ok(dbf_id) => self.resolver.card_by_dbf_id(dbf_id),
            Err(_) => self.resolver.card(raw),
        }
        .filter(|card| !card.id.is_empty())
    }

    fn infer_classes<'k>(
        &self,
        bucket_id: &str,
        override_key: &str,
        ids: impl Iterator<Item = &'k ResolvedId>,
        anomalies: &mut Vec<Anomaly>,
    ) -> Vec<String> {
        let mut classes: BTreeSet<String> = ids
            .filter_map(|id| match id {
                ResolvedId::Canonical(card_id) => self.resolver.card(card_id),
                ResolvedId::Unresolved { .. } => None,
            })
            .filter(|card| !card.is_multi_class())
            .filter_map(|card| card.card_class.as_deref())
            .filter(|class| !class.is_empty())
            .map(|class| {
                if class == CLASS_DEATHKNIGHT {
                    CLASS_NEUTRAL.to_string()
                } else {
                    class.to_string()
                }
            })
            .collect();

        if let Some(forced) = self.overrides.classes_for(override_key) {
            classes = forced.iter().cloned().collect();
        }

        if classes.len() > 1 {
            classes.remove(CLASS_NEUTRAL);
        }
        let classes: Vec<String> = classes.into_iter().collect();
        if classes.len() != 1 {
            anomalies.push(Anomaly::AmbiguousClasses {
                bucket_id: bucket_id.to_string(),
                classes: classes.clone(),
            });
        }
        classes
    }

    fn count_cards(
        &self,
        bucket_id: &str,
        offered: &BTreeMap<ResolvedId, usize>,
        anomalies: &mut Vec<Anomaly>,
    ) -> Vec<BucketCard> {
        offered
            .iter()
            .map(|(id, &total_offered)| {
                let card_name = match id {
                    ResolvedId::Canonical(card_id) => match self.resolver.card(card_id) {
                        Some(card) => card.name.clone(),
                        None => {
                            anomalies.push(Anomaly::MissingCard {
                                bucket_id: bucket_id.to_string(),
                                card_id: card_id.clone(),
                            });
                            String::new()
                        }
                    },
                    ResolvedId::Unresolved { dbf_id, .. } => {
                        anomalies.push(Anomaly::UnresolvedDbfId {
                            bucket_id: bucket_id.to_string(),
                            dbf_id: *dbf_id,
                        });
                        String::new()
                    }
                };
                BucketCard {
                    card_id: id.card_id().to_string(),
                    card_name,
                    total_offered,
                }
            })
            .collect()
    }

    /// Collapse reprints sharing a display name. Groups keep the order of their
    /// first member; the representative is the first member without a
    /// duplicate-deck variant, else the first member.
    fn merge_by_name(&self, cards: Vec<BucketCard>) -> Vec<BucketCard> {
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut groups: Vec<Vec<BucketCard>> = Vec::new();
        for card in cards {
            let slot = *index.entry(card.card_name.clone()).or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
            groups[slot].push(card);
        }

        groups
            .into_iter()
            .filter_map(|group| {
                let first = group.first()?;
                let representative = group
                    .iter()
                    .find(|card| !self.has_duplicate_variant(&card.card_id))
                    .unwrap_or(first);
                Some(BucketCard {
                    card_id: representative.card_id.clone(),
                    card_name: first.card_name.clone(),
                    total_offered: group.iter().map(|card| card.total_offered).sum(),
                })
            })
            .collect()
    }

    fn has_duplicate_variant(&self, card_id: &str) -> bool {
        self.resolver
            .card(card_id)
            .is_some_and(|card| card.has_duplicate_variant())
    }
}

/// Buckets whose id is not a known card have no display name and are not published.
pub fn publishable(infos: Vec<BucketInfo>) -> Vec<BucketInfo> {
    infos
        .into_iter()
        .filter(|info| !info.bucket_name.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use duels_cards::CardDatabase;
    use duels_core::CardMetadata;

    fn card(id: &str, dbf_id: i64, name: &str, class: &str) -> CardMetadata {
        CardMetadata {
            id: id.to_string(),
            dbf_id,
            name: name.to_string(),
            card_class: Some(class.to_string()),
            ..Default::default()
        }
    }

    fn row(option1: &str, contents1: &str) -> RawOfferRow {
        RawOfferRow {
            option1: option1.to_string(),
            option1_contents: contents1.to_string(),
            ..Default::default()
        }
    }

    fn map(bucket_id: &str, ids: &[&str]) -> BucketMap {
        BucketMap {
            bucket_id: bucket_id.to_string(),
            card_ids: ids.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn database() -> CardDatabase {
        let mut reprint = card("CORE_X", 102, "X", "WARRIOR");
        reprint.deck_duplicate_dbf_id = Some(101);
        let mut dual = card("DUAL_1", 500, "Dual", "ROGUE");
        dual.classes = vec!["ROGUE".into(), "DEMONHUNTER".into()];
        CardDatabase::from_cards(vec![
            card("B1", 1, "Warrior Bucket", "WARRIOR"),
            card("B2", 2, "Mixed Bucket", "NEUTRAL"),
            card(TRAPS_AND_TRAPPERS_BUCKET_ID, 3, "Traps and Trappers", "HUNTER"),
            card("X_101", 101, "X", "WARRIOR"),
            card("X_102", 112, "X", "WARRIOR"),
            reprint,
            card("W1", 201, "Shield Slam", "WARRIOR"),
            card("N1", 202, "Wisp", "NEUTRAL"),
            card("DK1", 203, "Plagued Grain", "DEATHKNIGHT"),
            card("P1", 204, "Holy Nova", "PRIEST"),
            card("M1", 205, "Fireball", "MAGE"),
            dual,
        ])
    }

    fn normalize(db: &CardDatabase, bucket_id: &str, maps: &[BucketMap]) -> NormalizedBucket {
        let overrides = ClassOverrides::default();
        BucketNormalizer::new(db, &overrides).normalize(bucket_id, maps)
    }

    #[test]
    fn expander_emits_three_maps_per_row_in_order() {
        let rows = vec![
            RawOfferRow {
                option1: "A".into(),
                option1_contents: "1,2".into(),
                option2: "B".into(),
                option2_contents: String::new(),
                option3: "C".into(),
                option3_contents: " X , Y ".into(),
            },
            row("D", "3"),
        ];
        let maps = expand_offers(&rows);
        assert_eq!(maps.len(), 6);
        let ids: Vec<_> = maps.iter().map(|m| m.bucket_id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B", "C", "D", "", ""]);
        assert_eq!(maps[0].card_ids, vec!["1", "2"]);
        assert!(maps[1].card_ids.is_empty());
        assert_eq!(maps[2].card_ids, vec!["X", "Y"]);
        assert!(maps[5].card_ids.is_empty());
    }

    #[test]
    fn grouper_keeps_first_occurrence_and_input_order() {
        let grouped = group_by_bucket(vec![
            map("B", &["1"]),
            map("A", &["2"]),
            map("B", &["3"]),
            map("A", &["2"]),
        ]);
        assert_eq!(grouped.bucket_ids().collect::<Vec<_>>(), vec!["B", "A"]);
        let b = grouped.get("B").expect("group B");
        assert_eq!(b, &[map("B", &["1"]), map("B", &["3"])]);
        assert_eq!(grouped.get("A").map(|g| g.len()), Some(2));
    }

    #[test]
    fn reprints_with_same_name_merge_into_one_card() {
        let db = database();
        let grouped = group_by_bucket(expand_offers(&[row("B1", "101,112,101")]));
        let normalized = normalize(&db, "B1", grouped.get("B1").expect("B1"));

        assert_eq!(normalized.info.bucket_name, "Warrior Bucket");
        assert_eq!(normalized.info.bucket_classes, vec!["WARRIOR"]);
        assert_eq!(
            normalized.info.cards,
            vec![BucketCard {
                card_id: "X_101".into(),
                card_name: "X".into(),
                total_offered: 3,
            }]
        );
        assert!(normalized.anomalies.is_empty());
    }

    #[test]
    fn representative_skips_duplicate_deck_variant() {
        let db = database();
        // CORE_X sorts first but carries a duplicate-deck variant id.
        let normalized = normalize(&db, "B1", &[map("B1", &["102", "X_102", "102"])]);
        assert_eq!(normalized.info.cards.len(), 1);
        assert_eq!(normalized.info.cards[0].card_id, "X_102");
        assert_eq!(normalized.info.cards[0].total_offered, 3);

        let only_variant = normalize(&db, "B1", &[map("B1", &["CORE_X"])]);
        assert_eq!(only_variant.info.cards[0].card_id, "CORE_X");
    }

    #[test]
    fn cards_are_sorted_and_counts_cover_every_offer() {
        let db = database();
        let maps = [
            map("B1", &["W1", "N1", "201"]),
            map("B1", &["N1", "M1"]),
        ];
        let normalized = normalize(&db, "B1", &maps);
        let ids: Vec<_> = normalized
            .info
            .cards
            .iter()
            .map(|c| (c.card_id.as_str(), c.total_offered))
            .collect();
        assert_eq!(ids, vec![("M1", 1), ("N1", 2), ("W1", 2)]);
        let total: usize = normalized.info.cards.iter().map(|c| c.total_offered).sum();
        assert_eq!(total, 5);
    }

    #[test]
    fn neutral_gives_way_to_a_real_class() {
        let db = database();
        let normalized = normalize(&db, "B2", &[map("B2", &["W1", "N1", "DK1"])]);
        assert_eq!(normalized.info.bucket_classes, vec!["WARRIOR"]);
        assert!(normalized.anomalies.is_empty());
    }

    #[test]
    fn death_knight_counts_as_neutral() {
        let db = database();
        let normalized = normalize(&db, "B2", &[map("B2", &["DK1", "N1"])]);
        assert_eq!(normalized.info.bucket_classes, vec!["NEUTRAL"]);
    }

    #[test]
    fn conflicting_classes_are_published_and_reported() {
        let db = database();
        let normalized = normalize(&db, "B2", &[map("B2", &["W1", "P1", "N1"])]);
        assert_eq!(normalized.info.bucket_classes, vec!["PRIEST", "WARRIOR"]);
        assert_eq!(
            normalized.anomalies,
            vec![Anomaly::AmbiguousClasses {
                bucket_id: "B2".into(),
                classes: vec!["PRIEST".into(), "WARRIOR".into()],
            }]
        );
    }

    #[test]
    fn multi_class_cards_do_not_vote() {
        let db = database();
        let normalized = normalize(&db, "B1", &[map("B1", &["DUAL_1", "W1"])]);
        assert_eq!(normalized.info.bucket_classes, vec!["WARRIOR"]);

        let only_dual = normalize(&db, "B1", &[map("B1", &["DUAL_1"])]);
        assert!(only_dual.info.bucket_classes.is_empty());
        assert!(matches!(
            only_dual.anomalies.as_slice(),
            [Anomaly::AmbiguousClasses { classes, .. }] if classes.is_empty()
        ));
    }

    #[test]
    fn token_bucket_is_always_hunter() {
        let db = database();
        let normalized = normalize(
            &db,
            TRAPS_AND_TRAPPERS_BUCKET_ID,
            &[map(TRAPS_AND_TRAPPERS_BUCKET_ID, &["M1", "P1", "W1"])],
        );
        assert_eq!(normalized.info.bucket_classes, vec!["HUNTER"]);
        assert!(normalized.anomalies.is_empty());
    }

    #[test]
    fn overrides_load_from_yaml() {
        let overrides = ClassOverrides::from_yaml_str(
            "version: 1\noverrides:\n  - bucket_id: B2\n    classes: [PALADIN]\n",
        )
        .expect("yaml");
        assert_eq!(overrides.classes_for("B2"), Some(&["PALADIN".to_string()][..]));
        assert!(overrides.classes_for(TRAPS_AND_TRAPPERS_BUCKET_ID).is_none());

        let db = database();
        let normalized =
            BucketNormalizer::new(&db, &overrides).normalize("B2", &[map("B2", &["W1"])]);
        assert_eq!(normalized.info.bucket_classes, vec!["PALADIN"]);
    }

    #[test]
    fn unknown_cards_are_kept_and_reported() {
        let db = database();
        let normalized = normalize(&db, "B1", &[map("B1", &["W1", "999999", "GHOST", "999999"])]);
        let cards: Vec<_> = normalized
            .info
            .cards
            .iter()
            .map(|c| (c.card_id.as_str(), c.card_name.as_str(), c.total_offered))
            .collect();
        // Both unknowns share the empty name and merge; the first member represents them.
        assert_eq!(cards, vec![("999999", "", 3), ("W1", "Shield Slam", 1)]);
        assert_eq!(
            normalized.anomalies,
            vec![
                Anomaly::UnresolvedDbfId {
                    bucket_id: "B1".into(),
                    dbf_id: 999999,
                },
                Anomaly::MissingCard {
                    bucket_id: "B1".into(),
                    card_id: "GHOST".into(),
                },
            ]
        );
    }

    #[test]
    fn unresolved_ids_sort_by_published_card_id() {
        let db = database();
        let normalized = normalize(&db, "B1", &[map("B1", &["W1", "888888", "N1", "M1"])]);
        let ids: Vec<_> = normalized
            .info
            .cards
            .iter()
            .map(|c| c.card_id.as_str())
            .collect();
        assert_eq!(ids, vec!["888888", "M1", "N1", "W1"]);
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn numeric_bucket_ids_resolve_through_dbf_id() {
        let db = database();
        let normalized = normalize(&db, "1", &[map("1", &["201"])]);
        assert_eq!(normalized.info.bucket_id, "1");
        assert_eq!(normalized.info.bucket_name, "Warrior Bucket");
        assert_eq!(normalized.info.bucket_classes, vec!["WARRIOR"]);
        assert_eq!(normalized.info.cards[0].card_id, "W1");
        assert_eq!(publishable(vec![normalized.info]).len(), 1);

        // Overrides match the symbolic id the numeric bucket id resolves to.
        let token = normalize(&db, "3", &[map("3", &["M1", "P1"])]);
        assert_eq!(token.info.bucket_name, "Traps and Trappers");
        assert_eq!(token.info.bucket_classes, vec!["HUNTER"]);
        assert!(token.anomalies.is_empty());

        let unknown = normalize(&db, "424242", &[map("424242", &["W1"])]);
        assert!(unknown.info.bucket_name.is_empty());
    }

    #[test]
    fn unknown_bucket_ids_are_filtered_after_normalization() {
        let db = database();
        let grouped = group_by_bucket(vec![map("NOPE", &["W1"]), map("B1", &["W1"])]);
        let overrides = ClassOverrides::default();
        let (infos, _) = BucketNormalizer::new(&db, &overrides).normalize_all(&grouped);
        assert_eq!(infos.len(), 2);
        assert_eq!(infos[0].bucket_id, "NOPE");
        assert!(infos[0].bucket_name.is_empty());

        let published = publishable(infos);
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].bucket_id, "B1");
    }

    #[test]
    fn normalization_is_deterministic() {
        let db = database();
        let grouped = group_by_bucket(expand_offers(&[
            row("B1", "W1,N1,101,112"),
            row("B2", "P1,W1,DK1"),
            row("B1", "M1,W1"),
        ]));
        let overrides = ClassOverrides::default();
        let normalizer = BucketNormalizer::new(&db, &overrides);
        let first = normalizer.normalize_all(&grouped);
        let second = normalizer.normalize_all(&grouped);
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first.0).expect("json"),
            serde_json::to_string(&second.0).expect("json")
        );
    }
}

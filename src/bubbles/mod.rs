use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

use eframe::egui::{Color32, Pos2, TextureHandle, Vec2};
use indexmap::IndexMap;
use tracing::debug;

use crate::analytics::{AssetInfo, AssetMeta, DeltaRecord, SeriesFields, SeriesRecord};

mod derivation;
mod physics;

pub use derivation::{Derivation, Derived, Mode, Metric};
pub use physics::{Simulation, StepInput, layout_rect, unit_for};

const POOL_PALETTE: [Color32; 8] = [
    Color32::from_rgb(0xcc, 0x66, 0xff),
    Color32::from_rgb(0x66, 0xcc, 0xff),
    Color32::from_rgb(0x00, 0xcc, 0x99),
    Color32::from_rgb(0x66, 0xcc, 0xff),
    Color32::from_rgb(0x00, 0xcc, 0x99),
    Color32::from_rgb(0xff, 0xcc, 0x00),
    Color32::from_rgb(0x33, 0x99, 0xff),
    Color32::from_rgb(0x99, 0xff, 0x66),
];

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BubbleKey {
    pub pool_id: String,
    pub code: String,
    pub issuer: String,
}

impl BubbleKey {
    pub fn new(pool_id: &str, asset: &AssetInfo) -> Self {
        Self {
            pool_id: pool_id.to_owned(),
            code: asset.code.clone(),
            issuer: asset.issuer.clone(),
        }
    }
}

impl fmt::Display for BubbleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.pool_id, self.code, self.issuer)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StalePolicy {
    #[default]
    Keep,
    Evict,
}

pub struct Bubble {
    pub key: BubbleKey,
    pub position: Vec2,
    pub velocity: Vec2,
    pub radius: f32,
    pub target_radius: f32,
    pub scale: f32,
    pub border: f32,
    pub hover: bool,
    pub initialized: bool,
    pub value: f64,
    pub sign: bool,
    pub display_label: String,
    pub pool_color: Option<Color32>,
    pub data: DeltaRecord,
    pub series: Option<SeriesFields>,
    pub asset_meta: Option<AssetMeta>,
    pub icon_texture: Option<TextureHandle>,
}

impl Bubble {
    fn new(key: BubbleKey, data: DeltaRecord) -> Self {
        Self {
            key,
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            radius: 0.0,
            target_radius: 0.0,
            scale: 0.0,
            border: 0.0,
            hover: false,
            initialized: false,
            value: 0.0,
            sign: true,
            display_label: String::new(),
            pool_color: None,
            data,
            series: None,
            asset_meta: None,
            icon_texture: None,
        }
    }

    pub fn center(&self) -> Pos2 {
        self.position.to_pos2()
    }
}

#[derive(Default)]
pub struct Registry {
    bubbles: IndexMap<BubbleKey, Bubble>,
    pool_colors: HashMap<String, Color32>,
    policy: StalePolicy,
    epoch: u64,
}

impl Registry {
    pub fn new(policy: StalePolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.bubbles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bubbles.is_empty()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn get(&self, key: &BubbleKey) -> Option<&Bubble> {
        self.bubbles.get(key)
    }

    pub fn get_mut(&mut self, key: &BubbleKey) -> Option<&mut Bubble> {
        self.bubbles.get_mut(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bubble> {
        self.bubbles.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Bubble> {
        self.bubbles.values_mut()
    }

    pub fn reconcile(&mut self, records: Vec<DeltaRecord>) -> Vec<BubbleKey> {
        let pool_ids = records
            .iter()
            .map(|record| record.pool_id.as_str())
            .collect::<BTreeSet<_>>();
        self.pool_colors = pool_ids
            .into_iter()
            .enumerate()
            .map(|(index, pool_id)| (pool_id.to_owned(), POOL_PALETTE[index % POOL_PALETTE.len()]))
            .collect();

        let mut seen = HashSet::with_capacity(records.len());
        let mut created = Vec::new();
        for record in records {
            let key = BubbleKey::new(&record.pool_id, &record.asset);
            seen.insert(key.clone());

            if let Some(bubble) = self.bubbles.get_mut(&key) {
                bubble.data = record;
                continue;
            }

            created.push(key.clone());
            self.bubbles.insert(key.clone(), Bubble::new(key, record));
        }

        if self.policy == StalePolicy::Evict {
            let before = self.bubbles.len();
            self.bubbles.retain(|key, _| seen.contains(key));
            let evicted = before - self.bubbles.len();
            if evicted > 0 {
                debug!(evicted, "evicted bubbles missing from latest fetch");
            }
        }

        created
    }

    pub fn apply_series(&mut self, records: Vec<SeriesRecord>) -> usize {
        let mut updated = 0;
        for record in records {
            let key = BubbleKey::new(&record.pool_id, &record.asset);
            let (Some(bubble), Some(series)) = (self.bubbles.get_mut(&key), record.series) else {
                continue;
            };
            bubble.series = Some(series);
            updated += 1;
        }
        updated
    }

    pub fn apply_asset_meta(&mut self, key: &BubbleKey, meta: AssetMeta) -> bool {
        match self.bubbles.get_mut(key) {
            Some(bubble) => {
                bubble.asset_meta = Some(meta);
                bubble.icon_texture = None;
                true
            }
            None => false,
        }
    }

    pub fn reset(&mut self) {
        self.bubbles.clear();
        self.pool_colors.clear();
        self.epoch += 1;
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use eframe::egui::vec2;

    use super::*;
    use crate::analytics::{FieldValues, SeriesPoint};

    pub(crate) fn record(pool_id: &str, code: &str, start_supply: f64, delta_supply: f64) -> DeltaRecord {
        DeltaRecord {
            pool_id: pool_id.to_owned(),
            pool_name: format!("{pool_id} pool"),
            asset: AssetInfo {
                code: code.to_owned(),
                issuer: format!("G{code}"),
                symbol: code.to_owned(),
                ..AssetInfo::default()
            },
            start: FieldValues {
                supply: Some(start_supply),
                ..FieldValues::default()
            },
            delta: FieldValues {
                supply: Some(delta_supply),
                ..FieldValues::default()
            },
            ..DeltaRecord::default()
        }
    }

    #[test]
    fn reconcile_preserves_kinematics_of_known_identity() {
        let mut registry = Registry::default();
        let created = registry.reconcile(vec![record("P1", "USDC", 100.0, 5.0)]);
        assert_eq!(created.len(), 1);

        let key = created[0].clone();
        {
            let bubble = registry.get_mut(&key).expect("bubble exists");
            bubble.position = vec2(12.0, 34.0);
            bubble.velocity = vec2(-1.5, 2.5);
            bubble.radius = 18.0;
            bubble.initialized = true;
        }

        let created = registry.reconcile(vec![record("P1", "USDC", 100.0, -7.0)]);

        assert!(created.is_empty());
        assert_eq!(registry.len(), 1);
        let bubble = registry.get(&key).expect("bubble kept");
        assert_eq!(bubble.position, vec2(12.0, 34.0));
        assert_eq!(bubble.velocity, vec2(-1.5, 2.5));
        assert_eq!(bubble.radius, 18.0);
        assert_eq!(bubble.data.delta.supply, Some(-7.0));
    }

    #[test]
    fn keep_policy_leaves_missing_identities_in_place() {
        let mut registry = Registry::new(StalePolicy::Keep);
        registry.reconcile(vec![record("P1", "USDC", 1.0, 1.0), record("P1", "XLM", 1.0, 1.0)]);

        registry.reconcile(vec![record("P1", "USDC", 1.0, 2.0)]);

        assert_eq!(registry.len(), 2);
        let stale = registry
            .iter()
            .find(|bubble| bubble.key.code == "XLM")
            .expect("stale bubble kept");
        assert_eq!(stale.data.delta.supply, Some(1.0));
    }

    #[test]
    fn evict_policy_drops_missing_identities() {
        let mut registry = Registry::new(StalePolicy::Evict);
        registry.reconcile(vec![record("P1", "USDC", 1.0, 1.0), record("P2", "USDC", 1.0, 1.0)]);

        registry.reconcile(vec![record("P2", "USDC", 1.0, 1.0)]);

        assert_eq!(registry.len(), 1);
        assert!(registry.iter().all(|bubble| bubble.key.pool_id == "P2"));
    }

    #[test]
    fn identity_includes_issuer() {
        let mut registry = Registry::default();
        let mut other_issuer = record("P1", "USDC", 1.0, 1.0);
        other_issuer.asset.issuer = "GSOMEONE".to_owned();

        let created = registry.reconcile(vec![record("P1", "USDC", 1.0, 1.0), other_issuer]);

        assert_eq!(created.len(), 2);
    }

    #[test]
    fn pool_colors_follow_sorted_pool_ids() {
        let mut registry = Registry::default();
        registry.reconcile(vec![record("B", "USDC", 1.0, 1.0), record("A", "USDC", 1.0, 1.0)]);

        assert_eq!(registry.pool_colors.get("A"), Some(&POOL_PALETTE[0]));
        assert_eq!(registry.pool_colors.get("B"), Some(&POOL_PALETTE[1]));
        assert_eq!(registry.pool_colors.get("C"), None);
    }

    #[test]
    fn series_only_updates_registered_bubbles() {
        let mut registry = Registry::default();
        registry.reconcile(vec![record("P1", "USDC", 1.0, 1.0)]);
        let matching = SeriesRecord {
            pool_id: "P1".to_owned(),
            asset: registry.iter().next().expect("bubble").data.asset.clone(),
            series: Some(SeriesFields {
                supply: vec![SeriesPoint {
                    timestamp: 10,
                    value: 3.0,
                }],
                ..SeriesFields::default()
            }),
            ..SeriesRecord::default()
        };
        let unknown = SeriesRecord {
            pool_id: "P9".to_owned(),
            series: Some(SeriesFields::default()),
            ..SeriesRecord::default()
        };

        let updated = registry.apply_series(vec![matching, unknown]);

        assert_eq!(updated, 1);
        let bubble = registry.iter().next().expect("bubble");
        assert_eq!(bubble.series.as_ref().map(|series| series.supply.len()), Some(1));
    }

    #[test]
    fn reset_clears_and_advances_epoch() {
        let mut registry = Registry::default();
        registry.reconcile(vec![record("P1", "USDC", 1.0, 1.0)]);

        registry.reset();

        assert!(registry.is_empty());
        assert_eq!(registry.epoch(), 1);
    }
}

//! Weighted evolution effect selection.
//!
//! The pool filters the catalog down to the entries a skill may receive at a
//! given level, weights them (optionally decaying the weight of entries the
//! skill already picked) and samples distinct options without replacement.

use std::collections::BTreeMap;

use rand::Rng;
use strum::IntoEnumIterator;
use tracing::{debug, trace};

use super::catalog::{EvolutionEffectEntry, Rarity};
use crate::config::EvolutionPoolConfig;
use crate::types::{EvolutionEffectId, TagSet};

/// Remaining weight below which sampling stops.
const WEIGHT_EPSILON: f64 = 1e-9;

/// Aggregate view of a catalog.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PoolStatistics {
    pub total: usize,
    pub per_rarity: BTreeMap<Rarity, usize>,
    pub total_base_weight: f32,
}

#[derive(Clone, Debug, Default)]
pub struct EvolutionEffectPool {
    entries: Vec<EvolutionEffectEntry>,
    config: EvolutionPoolConfig,
}

impl EvolutionEffectPool {
    pub fn new(entries: Vec<EvolutionEffectEntry>, config: EvolutionPoolConfig) -> Self {
        Self { entries, config }
    }

    pub fn entries(&self) -> &[EvolutionEffectEntry] {
        &self.entries
    }

    pub fn config(&self) -> &EvolutionPoolConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Draws up to `option_count` distinct eligible entries.
    ///
    /// Returns an empty list when nothing is eligible; that is a normal
    /// outcome, not an error.
    pub fn get_options<R: Rng>(
        &self,
        tags: &TagSet,
        target_level: u32,
        already_chosen: &[EvolutionEffectId],
        rng: &mut R,
    ) -> Vec<&EvolutionEffectEntry> {
        let mut candidates: Vec<(&EvolutionEffectEntry, f64)> = self
            .entries
            .iter()
            .filter_map(|entry| {
                let times = times_chosen(&entry.id, already_chosen);
                if !entry.is_eligible(tags, target_level, times) {
                    return None;
                }
                let weight = self.dynamic_weight(entry, times);
                (weight > 0.0).then_some((entry, weight))
            })
            .collect();

        let mut options = Vec::with_capacity(self.config.option_count.min(candidates.len()));
        while options.len() < self.config.option_count && !candidates.is_empty() {
            let total: f64 = candidates.iter().map(|(_, weight)| weight).sum();
            if total <= WEIGHT_EPSILON {
                break;
            }

            let draw = rng.random_range(0.0..total);
            let index = pick_index(&candidates, draw);
            let (entry, weight) = candidates.remove(index);
            trace!(
                target: "skill::evolution",
                effect = %entry.id,
                weight,
                total,
                "evolution option drawn"
            );
            options.push(entry);
        }

        debug!(
            target: "skill::evolution",
            level = target_level,
            offered = options.len(),
            "evolution options selected"
        );
        options
    }

    /// Selection weight of `entry` after `times` previous picks.
    pub fn dynamic_weight(&self, entry: &EvolutionEffectEntry, times: u32) -> f64 {
        let base = f64::from(entry.base_weight);
        if !self.config.dynamic_weighting {
            return base;
        }
        let exponent = i32::try_from(times).unwrap_or(i32::MAX);
        base * f64::from(self.config.decay_factor).powi(exponent)
    }

    pub fn is_eligible(
        &self,
        entry: &EvolutionEffectEntry,
        tags: &TagSet,
        target_level: u32,
        already_chosen: &[EvolutionEffectId],
    ) -> bool {
        entry.is_eligible(tags, target_level, times_chosen(&entry.id, already_chosen))
    }

    /// Number of entries that pass the eligibility filter, ignoring weights.
    pub fn eligible_count(
        &self,
        tags: &TagSet,
        target_level: u32,
        already_chosen: &[EvolutionEffectId],
    ) -> usize {
        self.entries
            .iter()
            .filter(|entry| self.is_eligible(entry, tags, target_level, already_chosen))
            .count()
    }

    pub fn get_effect_by_id(&self, id: &EvolutionEffectId) -> Option<&EvolutionEffectEntry> {
        self.entries.iter().find(|entry| &entry.id == id)
    }

    pub fn get_effects_by_rarity(&self, rarity: Rarity) -> Vec<&EvolutionEffectEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.rarity == rarity)
            .collect()
    }

    pub fn stats(&self) -> PoolStatistics {
        let per_rarity = Rarity::iter()
            .map(|rarity| (rarity, self.get_effects_by_rarity(rarity).len()))
            .collect();
        PoolStatistics {
            total: self.entries.len(),
            per_rarity,
            total_base_weight: self.entries.iter().map(|entry| entry.base_weight).sum(),
        }
    }
}

fn times_chosen(id: &EvolutionEffectId, already_chosen: &[EvolutionEffectId]) -> u32 {
    already_chosen.iter().filter(|chosen| *chosen == id).count() as u32
}

/// Index of the candidate whose cumulative span contains `draw`.
fn pick_index(candidates: &[(&EvolutionEffectEntry, f64)], draw: f64) -> usize {
    let mut cumulative = 0.0;
    for (index, (_, weight)) in candidates.iter().enumerate() {
        cumulative += weight;
        if draw < cumulative {
            return index;
        }
    }
    // Rounding can leave `draw` just past the last span.
    candidates.len() - 1
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    use super::*;
    use crate::modifier::ModifierSpec;

    fn entry(id: &str, weight: f32) -> EvolutionEffectEntry {
        EvolutionEffectEntry::new(id, Rarity::Common, ModifierSpec::new(id)).with_weight(weight)
    }

    fn ids(options: &[&EvolutionEffectEntry]) -> Vec<String> {
        options.iter().map(|e| e.id.to_string()).collect()
    }

    #[test]
    fn first_pick_follows_weights() {
        let pool = EvolutionEffectPool::new(
            vec![entry("a", 1.0), entry("b", 1.0), entry("c", 2.0)],
            EvolutionPoolConfig::new().with_option_count(1),
        );
        let mut rng = Pcg32::seed_from_u64(7);
        let trials = 8_000;
        let mut counts = BTreeMap::new();

        for _ in 0..trials {
            let options = pool.get_options(&TagSet::new(), 1, &[], &mut rng);
            *counts.entry(options[0].id.to_string()).or_insert(0u32) += 1;
        }

        let share = |id: &str| f64::from(counts[id]) / f64::from(trials);
        assert!((share("a") - 0.25).abs() < 0.03, "a: {}", share("a"));
        assert!((share("b") - 0.25).abs() < 0.03, "b: {}", share("b"));
        assert!((share("c") - 0.50).abs() < 0.03, "c: {}", share("c"));
    }

    #[test]
    fn options_are_distinct() {
        let pool = EvolutionEffectPool::new(
            vec![entry("a", 1.0), entry("b", 1.0), entry("c", 2.0), entry("d", 0.5)],
            EvolutionPoolConfig::new(),
        );
        let mut rng = Pcg32::seed_from_u64(11);

        for _ in 0..500 {
            let mut picked = ids(&pool.get_options(&TagSet::new(), 1, &[], &mut rng));
            assert_eq!(picked.len(), 3);
            picked.sort();
            picked.dedup();
            assert_eq!(picked.len(), 3);
        }
    }

    #[test]
    fn small_pool_returns_everything_once() {
        let pool = EvolutionEffectPool::new(
            vec![entry("a", 1.0), entry("b", 3.0)],
            EvolutionPoolConfig::new().with_option_count(5),
        );
        let mut rng = Pcg32::seed_from_u64(3);

        let mut picked = ids(&pool.get_options(&TagSet::new(), 1, &[], &mut rng));
        picked.sort();
        assert_eq!(picked, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn empty_or_ineligible_catalog_yields_no_options() {
        let mut rng = Pcg32::seed_from_u64(1);
        let empty = EvolutionEffectPool::default();
        assert!(empty.get_options(&TagSet::new(), 1, &[], &mut rng).is_empty());

        let legendary_only = EvolutionEffectPool::new(
            vec![EvolutionEffectEntry::new("meteor", Rarity::Legendary, ModifierSpec::new("meteor"))],
            EvolutionPoolConfig::new(),
        );
        assert!(legendary_only.get_options(&TagSet::new(), 2, &[], &mut rng).is_empty());
        assert_eq!(legendary_only.eligible_count(&TagSet::new(), 5, &[]), 1);
    }

    #[test]
    fn zero_weight_entries_are_never_offered() {
        let pool = EvolutionEffectPool::new(
            vec![entry("dead", 0.0), entry("live", 1.0)],
            EvolutionPoolConfig::new(),
        );
        let mut rng = Pcg32::seed_from_u64(5);

        for _ in 0..100 {
            assert_eq!(ids(&pool.get_options(&TagSet::new(), 1, &[], &mut rng)), vec!["live"]);
        }
    }

    #[test]
    fn exhausted_stacks_are_filtered() {
        let pool = EvolutionEffectPool::new(
            vec![entry("a", 1.0).with_max_stacks(1), entry("b", 1.0)],
            EvolutionPoolConfig::new(),
        );
        let chosen = [EvolutionEffectId::new("a")];
        let mut rng = Pcg32::seed_from_u64(9);

        assert_eq!(pool.eligible_count(&TagSet::new(), 1, &chosen), 1);
        assert_eq!(ids(&pool.get_options(&TagSet::new(), 1, &chosen, &mut rng)), vec!["b"]);
    }

    #[test]
    fn repeated_picks_decay_weight() {
        let decaying = EvolutionEffectPool::new(vec![entry("a", 4.0)], EvolutionPoolConfig::new());
        let flat = EvolutionEffectPool::new(
            vec![entry("a", 4.0)],
            EvolutionPoolConfig::new().without_decay(),
        );
        let a = &decaying.entries()[0];

        assert_eq!(decaying.dynamic_weight(a, 0), 4.0);
        assert_eq!(decaying.dynamic_weight(a, 2), 1.0);
        assert_eq!(flat.dynamic_weight(a, 2), 4.0);
    }

    #[test]
    fn stats_count_by_rarity() {
        let pool = EvolutionEffectPool::new(
            vec![
                entry("a", 1.0),
                entry("b", 2.0),
                EvolutionEffectEntry::new("c", Rarity::Rare, ModifierSpec::new("c")),
            ],
            EvolutionPoolConfig::new(),
        );
        let stats = pool.stats();

        assert_eq!(stats.total, 3);
        assert_eq!(stats.per_rarity[&Rarity::Common], 2);
        assert_eq!(stats.per_rarity[&Rarity::Rare], 1);
        assert_eq!(stats.per_rarity[&Rarity::Legendary], 0);
        assert_eq!(stats.total_base_weight, 4.0);
        assert_eq!(pool.get_effects_by_rarity(Rarity::Rare).len(), 1);
        assert!(pool.get_effect_by_id(&EvolutionEffectId::new("c")).is_some());
    }
}

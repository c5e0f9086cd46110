//! Evolution effect catalog entries.

use crate::modifier::ModifierSpec;
use crate::types::{EvolutionEffectId, TagSet};

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    strum::Display,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum Rarity {
    Common,
    Rare,
    Legendary,
}

impl Rarity {
    /// Lowest level at which entries of this rarity are offered by default.
    pub const fn min_level(self) -> u32 {
        match self {
            Self::Common => 1,
            Self::Rare => 3,
            Self::Legendary => 5,
        }
    }
}

/// One selectable evolution effect.
///
/// Catalog entries are immutable configuration: selection never mutates them.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EvolutionEffectEntry {
    pub id: EvolutionEffectId,
    pub rarity: Rarity,
    pub modifier: ModifierSpec,
    #[cfg_attr(feature = "serde", serde(default))]
    pub required_tags: TagSet,
    #[cfg_attr(feature = "serde", serde(default))]
    pub excluded_tags: TagSet,
    pub base_weight: f32,
    pub min_level: u32,
    /// `0` means no upper bound.
    #[cfg_attr(feature = "serde", serde(default))]
    pub max_level: u32,
    /// `0` means unlimited.
    #[cfg_attr(feature = "serde", serde(default))]
    pub max_stacks: u32,
}

impl EvolutionEffectEntry {
    pub const DEFAULT_WEIGHT: f32 = 1.0;

    pub fn new(id: impl Into<EvolutionEffectId>, rarity: Rarity, modifier: ModifierSpec) -> Self {
        Self {
            id: id.into(),
            rarity,
            modifier,
            required_tags: TagSet::new(),
            excluded_tags: TagSet::new(),
            base_weight: Self::DEFAULT_WEIGHT,
            min_level: rarity.min_level(),
            max_level: 0,
            max_stacks: 0,
        }
    }

    pub fn with_weight(mut self, base_weight: f32) -> Self {
        self.base_weight = base_weight;
        self
    }

    pub fn with_required_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn with_excluded_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn with_level_range(mut self, min_level: u32, max_level: u32) -> Self {
        self.min_level = min_level;
        self.max_level = max_level;
        self
    }

    pub fn with_max_stacks(mut self, max_stacks: u32) -> Self {
        self.max_stacks = max_stacks;
        self
    }

    pub fn accepts_level(&self, level: u32) -> bool {
        level >= self.min_level && (self.max_level == 0 || level <= self.max_level)
    }

    pub fn accepts_tags(&self, tags: &TagSet) -> bool {
        let required = self.required_tags.is_empty()
            || self.required_tags.iter().any(|tag| tags.contains(tag));
        let excluded = self.excluded_tags.iter().any(|tag| tags.contains(tag));
        required && !excluded
    }

    pub fn has_stacks_left(&self, times_chosen: u32) -> bool {
        self.max_stacks == 0 || times_chosen < self.max_stacks
    }

    /// Whether the entry may be offered to a skill with `tags` reaching
    /// `level` that already picked it `times_chosen` times.
    pub fn is_eligible(&self, tags: &TagSet, level: u32, times_chosen: u32) -> bool {
        self.accepts_level(level) && self.accepts_tags(tags) && self.has_stacks_left(times_chosen)
    }
}

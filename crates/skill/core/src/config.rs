/// Tunables of the evolution effect selector.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EvolutionPoolConfig {
    /// Number of options offered per level-up.
    pub option_count: usize,
    /// When enabled, entries already chosen for a skill are weighted down.
    pub dynamic_weighting: bool,
    /// Weight multiplier applied once per previous pick of the same entry.
    pub decay_factor: f32,
}

impl EvolutionPoolConfig {
    pub const DEFAULT_OPTION_COUNT: usize = 3;
    pub const DEFAULT_DECAY_FACTOR: f32 = 0.5;

    pub fn new() -> Self {
        Self {
            option_count: Self::DEFAULT_OPTION_COUNT,
            dynamic_weighting: true,
            decay_factor: Self::DEFAULT_DECAY_FACTOR,
        }
    }

    pub fn with_option_count(mut self, option_count: usize) -> Self {
        self.option_count = option_count;
        self
    }

    pub fn with_decay(mut self, decay_factor: f32) -> Self {
        self.dynamic_weighting = true;
        self.decay_factor = decay_factor;
        self
    }

    pub fn without_decay(mut self) -> Self {
        self.dynamic_weighting = false;
        self
    }
}

impl Default for EvolutionPoolConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Skill system configuration constants and tunable parameters.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SkillConfig {
    /// Number of input slots a caster can bind skills to.
    pub slot_count: usize,
    pub evolution: EvolutionPoolConfig,
}

impl SkillConfig {
    // ===== compile-time constants =====
    /// Upper bound on slots; slot indices are stored as `u8`.
    pub const MAX_SLOTS: usize = 16;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_SLOT_COUNT: usize = 4;

    pub fn new() -> Self {
        Self {
            slot_count: Self::DEFAULT_SLOT_COUNT,
            evolution: EvolutionPoolConfig::default(),
        }
    }

    /// Slot count clamped to `1..=MAX_SLOTS`.
    pub fn effective_slot_count(&self) -> usize {
        self.slot_count.clamp(1, Self::MAX_SLOTS)
    }
}

impl Default for SkillConfig {
    fn default() -> Self {
        Self::new()
    }
}

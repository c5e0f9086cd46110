//! Static skill definitions.
//!
//! Definitions are immutable configuration loaded from content data. A
//! [`crate::SkillRuntimeState`] holds a shared reference to its definition and
//! layers modifiers on top of it; nothing in a cast mutates a definition.

use std::time::Duration;

use crate::types::{CueRef, EffectId, SkillId, TagSet};

/// Seconds from content or modifiers as a duration. Negative and NaN become
/// zero; values too large for a `Duration` saturate.
pub(crate) fn secs_to_duration(secs: f32) -> Duration {
    Duration::try_from_secs_f32(secs.max(0.0)).unwrap_or(Duration::MAX)
}

/// Charge resource requirement of a skill.
///
/// Skills with a charge spec accumulate energy on their owning instance (for
/// example per kill) and can only be cast once `threshold` is reached.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChargeSpec {
    /// Energy required to cast; also the base cost debited by a cast.
    pub threshold: i32,
    /// Energy granted to the instance per kill. Informational for the core.
    #[cfg_attr(feature = "serde", serde(default))]
    pub energy_per_kill: i32,
}

/// Base targeting parameters and the names of the collaborators that
/// implement them.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TargetingSpec {
    /// Registered name of the target acquisition strategy.
    pub strategy: Option<String>,
    /// Registered names of target filters; all must accept a target.
    pub filters: Vec<String>,
    pub range: f32,
    /// Maximum number of targets; `0` means unlimited.
    pub max_count: i32,
    pub radius: f32,
}

/// Animation and VFX cues played around a cast.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SkillCues {
    /// Played on the caster when the cast is issued.
    pub cast: Option<CueRef>,
    /// Played when targets are acquired.
    pub targeting: Option<CueRef>,
    /// Played at the caster position once targeting succeeded.
    pub impact: Option<CueRef>,
}

/// Behavior of a status effect once attached to a target.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EffectKind {
    /// One-shot damage.
    Damage { amount: f32 },
    /// Damage over time.
    Burn { damage_per_second: f32 },
    /// Movement speed reduction in percent.
    Slow { percent: f32 },
    /// Prevents the target from acting.
    Stun,
    /// Pushes the target away from the caster.
    Knockback { force: f32 },
    /// Absorbs incoming damage.
    Shield { amount: f32 },
}

/// Definition of one status effect a skill applies to each target.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EffectDefinition {
    pub id: EffectId,
    pub kind: EffectKind,
    #[cfg_attr(feature = "serde", serde(default))]
    pub duration_secs: f32,
}

impl EffectDefinition {
    pub fn new(id: impl Into<EffectId>, kind: EffectKind) -> Self {
        Self {
            id: id.into(),
            kind,
            duration_secs: 0.0,
        }
    }

    pub fn with_duration(mut self, secs: f32) -> Self {
        self.duration_secs = secs;
        self
    }

    pub fn duration(&self) -> Duration {
        secs_to_duration(self.duration_secs)
    }
}

/// Static definition of an active skill.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SkillDefinition {
    pub id: SkillId,
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub tags: TagSet,
    #[cfg_attr(feature = "serde", serde(default))]
    pub charge: Option<ChargeSpec>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub base_damage: f32,
    /// Whether casts start out as true damage.
    #[cfg_attr(feature = "serde", serde(default))]
    pub true_damage: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    pub targeting: TargetingSpec,
    #[cfg_attr(feature = "serde", serde(default))]
    pub effects: Vec<EffectDefinition>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub cues: SkillCues,
    /// Telegraph delay between issuing the cast and running the pipeline.
    #[cfg_attr(feature = "serde", serde(default))]
    pub detection_delay_secs: f32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub cooldown_secs: f32,
}

impl SkillDefinition {
    pub fn new(id: impl Into<SkillId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            tags: TagSet::new(),
            charge: None,
            base_damage: 0.0,
            true_damage: false,
            targeting: TargetingSpec::default(),
            effects: Vec::new(),
            cues: SkillCues::default(),
            detection_delay_secs: 0.0,
            cooldown_secs: 0.0,
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_charge(mut self, threshold: i32, energy_per_kill: i32) -> Self {
        self.charge = Some(ChargeSpec {
            threshold,
            energy_per_kill,
        });
        self
    }

    pub fn with_damage(mut self, base_damage: f32) -> Self {
        self.base_damage = base_damage;
        self
    }

    pub fn with_targeting(mut self, targeting: TargetingSpec) -> Self {
        self.targeting = targeting;
        self
    }

    pub fn with_effect(mut self, effect: EffectDefinition) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_cues(mut self, cues: SkillCues) -> Self {
        self.cues = cues;
        self
    }

    pub fn with_detection_delay(mut self, secs: f32) -> Self {
        self.detection_delay_secs = secs;
        self
    }

    pub fn with_cooldown(mut self, secs: f32) -> Self {
        self.cooldown_secs = secs;
        self
    }

    /// True if casting consumes the instance's charge resource.
    pub fn requires_charge(&self) -> bool {
        self.charge.is_some()
    }

    /// Base cost before cost modifiers; the charge threshold or zero.
    pub fn base_cost(&self) -> i32 {
        self.charge.as_ref().map_or(0, |charge| charge.threshold)
    }

    pub fn detection_delay(&self) -> Duration {
        secs_to_duration(self.detection_delay_secs)
    }
}

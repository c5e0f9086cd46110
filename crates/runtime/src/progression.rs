//! Level-up offers and commits.
//!
//! A level-up is a two-step exchange with the player: [`Progression::offer`]
//! draws the evolution options for the level being reached, and
//! [`Progression::commit`] applies the chosen branch and optional catalog
//! effect. Commits validate everything before touching the state so a
//! rejected choice leaves the skill unchanged.

use std::collections::HashMap;

use parking_lot::Mutex;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use tracing::info;

use skill_core::{
    BranchChoice, BranchId, EvolutionEffectEntry, EvolutionEffectId, EvolutionEffectPool,
    EvolutionError, EvolutionNode, EvolutionTree, ModifierId, SkillId, SkillRuntimeState,
};

/// What a skill may pick when it reaches its next level.
#[derive(Clone, Debug, PartialEq)]
pub struct LevelUpOffer {
    pub skill: SkillId,
    /// Level the skill reaches once the offer is committed.
    pub reaching: u32,
    /// Branch node unlocked at `reaching`; `None` once the tree is exhausted.
    pub node: Option<EvolutionNode>,
    /// Catalog entries drawn for this level, possibly empty.
    pub effects: Vec<EvolutionEffectEntry>,
}

impl LevelUpOffer {
    /// True when the skill cannot level up any further.
    pub fn is_max_level(&self) -> bool {
        self.node.is_none()
    }

    pub fn offers_effect(&self, effect: &EvolutionEffectId) -> bool {
        self.effects.iter().any(|entry| &entry.id == effect)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LevelUpChoice {
    pub branch: BranchChoice,
    pub effect: Option<EvolutionEffectId>,
}

impl LevelUpChoice {
    pub fn branch(branch: BranchChoice) -> Self {
        Self {
            branch,
            effect: None,
        }
    }

    pub fn with_effect(mut self, effect: impl Into<EvolutionEffectId>) -> Self {
        self.effect = Some(effect.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LevelUpOutcome {
    pub level: u32,
    pub branch: BranchId,
    /// Identity the catalog effect's modifier was added under.
    pub modifier: Option<ModifierId>,
}

/// Evolution trees, the effect catalog and the RNG that samples it.
pub struct Progression {
    pool: EvolutionEffectPool,
    trees: HashMap<SkillId, EvolutionTree>,
    rng: Mutex<Pcg32>,
}

impl Progression {
    /// A seed makes option draws reproducible; without one the generator is
    /// seeded from the thread RNG.
    pub fn new(
        pool: EvolutionEffectPool,
        trees: impl IntoIterator<Item = EvolutionTree>,
        seed: Option<u64>,
    ) -> Self {
        let rng = match seed {
            Some(seed) => Pcg32::seed_from_u64(seed),
            None => Pcg32::from_rng(&mut rand::rng()),
        };
        Self {
            pool,
            trees: trees
                .into_iter()
                .map(|tree| (tree.skill.clone(), tree))
                .collect(),
            rng: Mutex::new(rng),
        }
    }

    pub fn pool(&self) -> &EvolutionEffectPool {
        &self.pool
    }

    pub fn tree(&self, skill: &SkillId) -> Option<&EvolutionTree> {
        self.trees.get(skill)
    }

    /// Options for the next level of `state`.
    pub fn offer(&self, state: &SkillRuntimeState) -> LevelUpOffer {
        let level = state.level();
        let reaching = level + 1;
        let node = self
            .tree(state.skill_id())
            .and_then(|tree| tree.next_node(level))
            .cloned();

        let tags = state.tags();
        let effects = {
            let mut rng = self.rng.lock();
            self.pool
                .get_options(&tags, reaching, state.effect_history(), &mut *rng)
                .into_iter()
                .cloned()
                .collect()
        };

        LevelUpOffer {
            skill: state.skill_id().clone(),
            reaching,
            node,
            effects,
        }
    }

    /// Applies `choice` to `state`.
    ///
    /// The offer must have been made for the state's current level, and the
    /// chosen effect must be one of the offered ones.
    pub fn commit(
        &self,
        state: &mut SkillRuntimeState,
        offer: &LevelUpOffer,
        choice: &LevelUpChoice,
    ) -> Result<LevelUpOutcome, EvolutionError> {
        if offer.skill != *state.skill_id() || offer.reaching != state.level() + 1 {
            return Err(EvolutionError::InconsistentProgress(
                "level-up offer does not match the skill's current level",
            ));
        }
        let node = offer
            .node
            .as_ref()
            .ok_or_else(|| EvolutionError::NoNodeForLevel {
                skill: offer.skill.clone(),
                level: offer.reaching,
            })?;

        let entry = match &choice.effect {
            Some(effect) => {
                let entry = offer
                    .effects
                    .iter()
                    .find(|entry| &entry.id == effect)
                    .ok_or_else(|| EvolutionError::Ineligible {
                        effect: effect.clone(),
                        level: offer.reaching,
                    })?;
                if !entry.has_stacks_left(state.times_chosen(&entry.id)) {
                    return Err(EvolutionError::StackLimitReached {
                        effect: entry.id.clone(),
                        max_stacks: entry.max_stacks,
                    });
                }
                Some(entry)
            }
            None => None,
        };

        let branch = state.set_evolution_node(node, choice.branch)?;
        let modifier = entry
            .map(|entry| state.apply_evolution_effect(entry))
            .transpose()?;

        info!(
            target: "skill::evolution",
            skill = %state.skill_id(),
            level = state.level(),
            %branch,
            modifier = ?modifier,
            "level-up committed"
        );
        Ok(LevelUpOutcome {
            level: state.level(),
            branch,
            modifier,
        })
    }
}

impl std::fmt::Debug for Progression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Progression")
            .field("pool", &self.pool.len())
            .field("trees", &self.trees.len())
            .finish_non_exhaustive()
    }
}

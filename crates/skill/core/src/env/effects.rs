use std::time::Duration;

use crate::definition::{EffectDefinition, EffectKind};
use crate::types::{EffectId, EntityId};

use super::HookError;

/// A concrete status effect ready to be attached to one target.
#[derive(Clone, Debug, PartialEq)]
pub struct EffectInstance {
    pub effect: EffectId,
    pub kind: EffectKind,
    pub caster: EntityId,
    pub duration: Duration,
    /// Final damage of the cast, stamped by the pipeline.
    pub damage: f32,
    /// Stamped by the pipeline from the cast's damage result.
    pub is_true_damage: bool,
}

/// Turns effect definitions into attachable instances.
pub trait EffectFactory: Send + Sync {
    fn create_instance(
        &self,
        definition: &EffectDefinition,
        caster: EntityId,
    ) -> Result<EffectInstance, HookError>;
}

/// Receives effect instances for a target entity.
///
/// Called while the host holds the casting skill's state, so `attach` must
/// not call back into the host's cast or level-up entry points for the same
/// skill. Queue such work instead.
pub trait StatusEffectSink: Send + Sync {
    fn attach(&self, entity: EntityId, instance: EffectInstance);
}

/// Factory that copies the definition verbatim.
#[derive(Clone, Copy, Debug, Default)]
pub struct StandardEffectFactory;

impl EffectFactory for StandardEffectFactory {
    fn create_instance(
        &self,
        definition: &EffectDefinition,
        caster: EntityId,
    ) -> Result<EffectInstance, HookError> {
        Ok(EffectInstance {
            effect: definition.id.clone(),
            kind: definition.kind.clone(),
            caster,
            duration: definition.duration(),
            damage: 0.0,
            is_true_damage: false,
        })
    }
}

//! Skill slots: which runtime state and pipeline each input slot is bound to.

use std::sync::Arc;

use parking_lot::Mutex;

use skill_core::{
    CastError, InstanceId, SkillDefinition, SkillPipeline, SkillRuntimeState, SlotIndex,
};

/// One equipped skill.
///
/// The pipeline is built once at equip time and shared by every cast. The
/// runtime state sits behind a mutex that is only held while the pipeline
/// runs synchronously, never across the pre-pipeline delay.
#[derive(Clone)]
pub struct EquippedSkill {
    pub state: Arc<Mutex<SkillRuntimeState>>,
    pub pipeline: Arc<SkillPipeline>,
    pub definition: Arc<SkillDefinition>,
    pub instance: InstanceId,
}

impl EquippedSkill {
    pub fn new(state: SkillRuntimeState, pipeline: SkillPipeline) -> Self {
        let definition = Arc::clone(state.definition());
        let instance = state.instance_id();
        Self {
            state: Arc::new(Mutex::new(state)),
            pipeline: Arc::new(pipeline),
            definition,
            instance,
        }
    }
}

impl std::fmt::Debug for EquippedSkill {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EquippedSkill")
            .field("skill", &self.definition.id)
            .field("instance", &self.instance)
            .field("pipeline", &self.pipeline)
            .finish()
    }
}

/// Fixed set of input slots.
#[derive(Debug, Default)]
pub struct SkillSlots {
    slots: Vec<Option<EquippedSkill>>,
}

impl SkillSlots {
    pub fn new(count: usize) -> Self {
        Self {
            slots: vec![None; count],
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// The skill bound to `slot`.
    pub fn get(&self, slot: SlotIndex) -> Result<&EquippedSkill, CastError> {
        self.slots
            .get(usize::from(slot.0))
            .ok_or(CastError::UnknownSlot(slot))?
            .as_ref()
            .ok_or(CastError::EmptySlot(slot))
    }

    /// Binds `skill` to `slot`, returning whatever was bound before.
    pub fn equip(
        &mut self,
        slot: SlotIndex,
        skill: EquippedSkill,
    ) -> Result<Option<EquippedSkill>, CastError> {
        let entry = self
            .slots
            .get_mut(usize::from(slot.0))
            .ok_or(CastError::UnknownSlot(slot))?;
        Ok(entry.replace(skill))
    }

    pub fn unequip(&mut self, slot: SlotIndex) -> Result<Option<EquippedSkill>, CastError> {
        let entry = self
            .slots
            .get_mut(usize::from(slot.0))
            .ok_or(CastError::UnknownSlot(slot))?;
        Ok(entry.take())
    }

    /// Occupied slots in index order.
    pub fn occupied(&self) -> impl Iterator<Item = (SlotIndex, &EquippedSkill)> {
        self.slots.iter().enumerate().filter_map(|(index, entry)| {
            let index = u8::try_from(index).ok()?;
            entry.as_ref().map(|skill| (SlotIndex(index), skill))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skill_core::SkillPipeline;

    fn equipped(id: &str, instance: u64) -> EquippedSkill {
        let definition = Arc::new(SkillDefinition::new(id, id));
        let state = SkillRuntimeState::new(definition, InstanceId(instance));
        EquippedSkill::new(state, SkillPipeline::new(Vec::new()))
    }

    #[test]
    fn lookup_distinguishes_unknown_and_empty_slots() {
        let mut slots = SkillSlots::new(2);
        slots.equip(SlotIndex(0), equipped("spark", 1)).unwrap();

        assert_eq!(slots.get(SlotIndex(0)).unwrap().instance, InstanceId(1));
        assert_eq!(
            slots.get(SlotIndex(1)).unwrap_err(),
            CastError::EmptySlot(SlotIndex(1))
        );
        assert_eq!(
            slots.get(SlotIndex(5)).unwrap_err(),
            CastError::UnknownSlot(SlotIndex(5))
        );
    }

    #[test]
    fn equip_returns_previous_binding() {
        let mut slots = SkillSlots::new(1);
        assert!(slots.equip(SlotIndex(0), equipped("a", 1)).unwrap().is_none());
        let previous = slots.equip(SlotIndex(0), equipped("b", 2)).unwrap();
        assert_eq!(previous.unwrap().instance, InstanceId(1));

        let removed = slots.unequip(SlotIndex(0)).unwrap();
        assert_eq!(removed.unwrap().instance, InstanceId(2));
        assert_eq!(slots.occupied().count(), 0);
    }
}

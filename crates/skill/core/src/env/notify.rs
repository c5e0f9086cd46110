use crate::types::{EntityId, SkillId, SlotIndex};

/// Published once a cast has committed its resource cost.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CastOccurred {
    pub player_id: EntityId,
    pub slot: SlotIndex,
    pub skill: SkillId,
}

/// Fire-and-forget notification channel.
pub trait NotificationBus: Send + Sync {
    fn publish(&self, event: CastOccurred);
}

use crate::types::{InstanceId, SlotIndex};

/// Owner of the charge resource of every skill instance.
///
/// Debit and credit are atomic from the pipeline's point of view: a debit
/// either removes the full amount or nothing.
pub trait ResourceInventory: Send + Sync {
    /// Removes `amount` from the instance's pool. Returns false (and removes
    /// nothing) if the pool holds less than `amount`.
    fn debit(&self, instance: InstanceId, amount: i32) -> bool;

    /// Adds `amount` back to the instance's pool.
    fn credit(&self, instance: InstanceId, amount: i32);

    fn current_amount(&self, instance: InstanceId) -> i32;

    /// Called when the instance is bound to a slot.
    fn on_equip(&self, _instance: InstanceId, _slot: SlotIndex) {}

    /// Called when the instance is removed from its slot.
    fn on_unequip(&self, _instance: InstanceId, _slot: SlotIndex) {}
}

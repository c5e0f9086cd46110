mod common;

use glam::Vec3;

use common::{Fixture, caster, drain};
use skill_core::{
    BranchChoice, BranchId, EvolutionError, NodeId, ResourceInventory, SlotIndex, StageOutcome,
};
use skill_runtime::{Event, LevelUpChoice, ProgressionEvent, RuntimeError, Topic};

const FIREBALL: SlotIndex = SlotIndex(0);

#[tokio::test(start_paused = true)]
async fn test_level_up_offer_matches_tree_and_catalog() {
    let fx = Fixture::new();
    fx.equip(0, "fireball", 100);

    let offer = fx.runtime.offer_level_up(FIREBALL).unwrap();
    assert_eq!(offer.reaching, 2);
    assert_eq!(
        offer.node.as_ref().map(|node| node.id.clone()),
        Some(NodeId::new("fireball-2"))
    );
    // Four common entries accept a level-2 fire projectile; three are drawn.
    assert_eq!(offer.effects.len(), 3);
    let common = ["sharpened", "efficient", "quickened", "wide_reach"];
    for (index, entry) in offer.effects.iter().enumerate() {
        assert!(common.contains(&entry.id.as_str()));
        assert!(!offer.effects[..index].iter().any(|other| other.id == entry.id));
    }
}

/// The focus branch cuts the cost to 75 and scales damage by 1.25.
#[tokio::test(start_paused = true)]
async fn test_branch_modifiers_apply_to_next_cast() {
    let fx = Fixture::new();
    let instance = fx.equip(0, "fireball", 100);
    fx.enemy(10, Vec3::new(0.0, 0.0, 8.0));
    let mut progression = fx.runtime.subscribe(Topic::Progression);

    let offer = fx.runtime.offer_level_up(FIREBALL).unwrap();
    let outcome = fx
        .runtime
        .choose_level_up(FIREBALL, &offer, &LevelUpChoice::branch(BranchChoice::B))
        .unwrap();
    assert_eq!(outcome.level, 2);
    assert_eq!(outcome.branch, BranchId::new("fireball-focus"));
    assert_eq!(outcome.modifier, None);

    let events = drain(&mut progression);
    assert_eq!(events.len(), 1);
    assert!(matches!(
        &events[0],
        Event::Progression(ProgressionEvent::LevelUp { level: 2, .. })
    ));

    let report = fx
        .runtime
        .cast(FIREBALL, caster(), Vec3::new(0.0, 0.0, 8.0))
        .unwrap()
        .finish()
        .await
        .unwrap()
        .unwrap();
    assert_eq!(report.outcome, StageOutcome::Continue);
    assert_eq!(report.spent, 75);
    assert_eq!(fx.inventory.current_amount(instance), 25);
    assert_eq!(report.damage.map(|d| d.final_damage), Some(75.0));
}

#[tokio::test(start_paused = true)]
async fn test_chosen_effect_is_recorded_and_announced() {
    let fx = Fixture::new();
    fx.equip(0, "fireball", 100);
    let mut progression = fx.runtime.subscribe(Topic::Progression);

    let offer = fx.runtime.offer_level_up(FIREBALL).unwrap();
    let effect = offer.effects[0].id.clone();
    let choice = LevelUpChoice::branch(BranchChoice::A).with_effect(effect.clone());
    let outcome = fx.runtime.choose_level_up(FIREBALL, &offer, &choice).unwrap();
    assert!(outcome.modifier.is_some());

    let events = drain(&mut progression);
    assert_eq!(events.len(), 2);
    assert!(matches!(
        &events[1],
        Event::Progression(ProgressionEvent::EffectChosen { effect: chosen, .. }) if *chosen == effect
    ));

    let progress = fx.runtime.save_progress(FIREBALL).unwrap();
    assert_eq!(progress.level, 2);
    assert_eq!(progress.branch_history, vec![BranchId::new("fireball-inferno")]);
    assert_eq!(progress.effect_history, vec![effect]);
}

#[tokio::test(start_paused = true)]
async fn test_progress_survives_save_and_restore() {
    let fx = Fixture::new();
    fx.equip(0, "fireball", 100);

    for choice in [BranchChoice::B, BranchChoice::A] {
        let offer = fx.runtime.offer_level_up(FIREBALL).unwrap();
        let effect = offer.effects.first().map(|entry| entry.id.clone());
        let choice = LevelUpChoice {
            branch: choice,
            effect,
        };
        fx.runtime.choose_level_up(FIREBALL, &offer, &choice).unwrap();
    }
    let saved = fx.runtime.save_progress(FIREBALL).unwrap();
    assert_eq!(saved.level, 3);
    let bytes = fx.runtime.progress_bytes(FIREBALL).unwrap();
    let modifiers = fx
        .runtime
        .orchestrator()
        .skill(FIREBALL)
        .unwrap()
        .state
        .lock()
        .modifiers()
        .len();

    fx.runtime.unequip(FIREBALL).unwrap();
    let restored_slot = SlotIndex(2);
    let instance = fx.runtime.equip_from_bytes(restored_slot, &bytes).unwrap();

    assert_eq!(instance, saved.instance);
    assert_eq!(fx.runtime.save_progress(restored_slot).unwrap(), saved);
    let restored = fx.runtime.orchestrator().skill(restored_slot).unwrap();
    assert_eq!(restored.state.lock().modifiers().len(), modifiers);
}

#[tokio::test(start_paused = true)]
async fn test_stale_offer_is_rejected() {
    let fx = Fixture::new();
    fx.equip(0, "fireball", 100);

    let offer = fx.runtime.offer_level_up(FIREBALL).unwrap();
    let choice = LevelUpChoice::branch(BranchChoice::A);
    fx.runtime.choose_level_up(FIREBALL, &offer, &choice).unwrap();

    let err = fx
        .runtime
        .choose_level_up(FIREBALL, &offer, &choice)
        .unwrap_err();
    assert!(matches!(
        err,
        RuntimeError::Evolution(EvolutionError::InconsistentProgress(_))
    ));
    assert_eq!(fx.runtime.save_progress(FIREBALL).unwrap().level, 2);
}

#[tokio::test(start_paused = true)]
async fn test_skill_without_tree_cannot_level() {
    let fx = Fixture::new();
    fx.equip(3, "shield_bash", 0);
    let slot = SlotIndex(3);

    let offer = fx.runtime.offer_level_up(slot).unwrap();
    assert!(offer.is_max_level());

    let err = fx
        .runtime
        .choose_level_up(slot, &offer, &LevelUpChoice::branch(BranchChoice::A))
        .unwrap_err();
    assert!(matches!(
        err,
        RuntimeError::Evolution(EvolutionError::NoNodeForLevel { level: 2, .. })
    ));
}

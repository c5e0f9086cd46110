//! Per-cast controller around the stage pipeline.
//!
//! A cast runs in two phases. [`CastOrchestrator::begin_cast`] checks the
//! preconditions, registers an [`ExecutionToken`] for the slot, plays the
//! cast cue and returns a [`PendingCast`]. [`CastOrchestrator::resume_cast`]
//! runs the pipeline synchronously and reconciles the resource spend. The
//! skill's detection delay sits between the two; [`CastOrchestrator::execute`]
//! drives it with a tokio timer.
//!
//! Refunds follow the spend record on the runtime state only: a cancelled
//! cast gets back exactly what the resource stage debited, a failed cast gets
//! nothing back.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use glam::Vec3;
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tracing::{debug, info};

use skill_core::{
    CancelReason, CastContext, CastError, CastRequest, ExecutionToken, InstanceId, SkillEnv,
    SkillPipeline, SkillRuntimeState, SlotIndex, StageOutcome, TargetingBinding, refund_spent,
};

use crate::api::{CastDispatch, CastReport, CasterInfo, InterruptTarget, Result, RuntimeError};
use crate::events::{CastEvent, Event, EventBus};
use crate::slots::{EquippedSkill, SkillSlots};

/// A cast that passed its preconditions and waits for its delay.
#[derive(Debug)]
pub struct PendingCast {
    skill: EquippedSkill,
    request: CastRequest,
    token: ExecutionToken,
    delay: Duration,
}

impl PendingCast {
    pub fn slot(&self) -> SlotIndex {
        self.request.slot
    }

    pub fn token(&self) -> &ExecutionToken {
        &self.token
    }

    /// How long to wait before [`CastOrchestrator::resume_cast`].
    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn request(&self) -> &CastRequest {
        &self.request
    }
}

struct Inner {
    env: SkillEnv,
    events: EventBus,
    slots: Mutex<SkillSlots>,
    tokens: Mutex<HashMap<SlotIndex, ExecutionToken>>,
}

/// Owns the slots and the in-flight tokens of one caster.
///
/// Cloning is cheap and every clone drives the same slots.
#[derive(Clone)]
pub struct CastOrchestrator {
    inner: Arc<Inner>,
}

impl CastOrchestrator {
    pub fn new(env: SkillEnv, events: EventBus, slot_count: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                env,
                events,
                slots: Mutex::new(SkillSlots::new(slot_count)),
                tokens: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn env(&self) -> &SkillEnv {
        &self.inner.env
    }

    pub fn events(&self) -> &EventBus {
        &self.inner.events
    }

    pub fn slot_count(&self) -> usize {
        self.inner.slots.lock().len()
    }

    /// The skill bound to `slot`.
    pub fn skill(&self, slot: SlotIndex) -> std::result::Result<EquippedSkill, CastError> {
        self.inner.slots.lock().get(slot).cloned()
    }

    /// Binds `state` to `slot` with a freshly built standard pipeline.
    ///
    /// Any cast still in flight on the slot is cancelled. Returns the
    /// instance that was bound before.
    pub fn equip(
        &self,
        slot: SlotIndex,
        state: SkillRuntimeState,
        binding: TargetingBinding,
    ) -> std::result::Result<Option<InstanceId>, CastError> {
        let pipeline = SkillPipeline::standard(&self.inner.env, binding);
        let skill = EquippedSkill::new(state, pipeline);
        let instance = skill.instance;
        let skill_id = skill.definition.id.clone();

        let previous = self.inner.slots.lock().equip(slot, skill)?;
        self.cancel_in_flight(slot);

        let inventory = &self.inner.env.inventory;
        if let Some(previous) = &previous {
            inventory.on_unequip(previous.instance, slot);
        }
        inventory.on_equip(instance, slot);

        info!(
            target: "runtime::cast",
            %slot,
            skill = %skill_id,
            %instance,
            "skill equipped"
        );
        Ok(previous.map(|skill| skill.instance))
    }

    pub fn unequip(&self, slot: SlotIndex) -> std::result::Result<Option<InstanceId>, CastError> {
        let previous = self.inner.slots.lock().unequip(slot)?;
        self.cancel_in_flight(slot);
        if let Some(previous) = &previous {
            self.inner.env.inventory.on_unequip(previous.instance, slot);
            info!(target: "runtime::cast", %slot, skill = %previous.definition.id, "skill unequipped");
        }
        Ok(previous.map(|skill| skill.instance))
    }

    /// Checks whether `slot` could be cast right now.
    pub fn check(&self, slot: SlotIndex) -> std::result::Result<(), CastError> {
        let skill = self.skill(slot)?;
        self.check_skill(&skill)
    }

    pub fn can_execute(&self, slot: SlotIndex) -> bool {
        self.check(slot).is_ok()
    }

    fn check_skill(&self, skill: &EquippedSkill) -> std::result::Result<(), CastError> {
        if let Some(charge) = &skill.definition.charge {
            let current = self.inner.env.inventory.current_amount(skill.instance);
            if current < charge.threshold {
                return Err(CastError::InsufficientResource {
                    current,
                    required: charge.threshold,
                });
            }
        }

        let now = self.inner.env.clock.now();
        if skill.state.lock().is_on_cooldown(now) {
            return Err(CastError::OnCooldown {
                skill: skill.definition.id.clone(),
            });
        }
        Ok(())
    }

    /// First phase of a cast.
    ///
    /// Registers a new token for the slot; a cast still in flight on the same
    /// slot is cancelled with [`CancelReason::NewSkill`].
    pub fn begin_cast(
        &self,
        slot: SlotIndex,
        caster: CasterInfo,
        aim_point: Vec3,
    ) -> std::result::Result<PendingCast, CastError> {
        let skill = self.skill(slot)?;
        self.check_skill(&skill)?;

        let env = &self.inner.env;
        let request = CastRequest::new(caster.entity, caster.team, caster.position, aim_point)
            .in_slot(slot)
            .at(env.clock.now());

        let token = ExecutionToken::new();
        let superseded = self.inner.tokens.lock().insert(slot, token.clone());
        if let Some(previous) = superseded {
            if previous.cancel(CancelReason::NewSkill) {
                debug!(target: "runtime::cast", %slot, "previous cast superseded");
            }
        }

        if let Some(cue) = &skill.definition.cues.cast {
            env.cues.play_cue(cue, caster.position, Some(caster.entity));
        }

        self.inner.events.publish(Event::Cast(CastEvent::Started {
            slot,
            skill: skill.definition.id.clone(),
            caster: caster.entity,
        }));

        let delay = skill.definition.detection_delay();
        debug!(
            target: "runtime::cast",
            %slot,
            skill = %skill.definition.id,
            delay_ms = delay.as_millis() as u64,
            "cast started"
        );
        Ok(PendingCast {
            skill,
            request,
            token,
            delay,
        })
    }

    /// Second phase of a cast: runs the pipeline unless the token was
    /// cancelled during the delay, then reconciles the spend record.
    pub fn resume_cast(&self, pending: PendingCast) -> CastReport {
        let PendingCast {
            skill,
            request,
            token,
            ..
        } = pending;
        let slot = request.slot;
        let skill_id = skill.definition.id.clone();
        let env = &self.inner.env;

        // Held across every collaborator call of the pipeline; hooks must not
        // re-enter this orchestrator for the same slot.
        let mut state = skill.state.lock();
        let pipeline_ran = !token.is_cancelled();
        let mut targets = Vec::new();
        let mut damage = None;

        let outcome = if pipeline_ran {
            let mut ctx = CastContext::new(&request, env.clock.now(), &mut state);
            let outcome = skill.pipeline.execute(&mut ctx, &token);
            targets = std::mem::take(&mut ctx.targets);
            if outcome.is_success() {
                damage = Some(ctx.damage);
            }
            outcome
        } else {
            debug!(target: "runtime::cast", %slot, skill = %skill_id, "cancelled during delay");
            StageOutcome::Cancel
        };

        let (spent, refunded) = match outcome {
            StageOutcome::Cancel => (0, refund_spent(&mut state, env.inventory.as_ref())),
            _ => (state.take_spent().unwrap_or(0), 0),
        };
        drop(state);

        {
            let mut tokens = self.inner.tokens.lock();
            if tokens.get(&slot).is_some_and(|current| current.same_as(&token)) {
                tokens.remove(&slot);
            }
        }

        let cancel_reason = match outcome {
            StageOutcome::Cancel => Some(token.reason().unwrap_or(CancelReason::Unknown)),
            _ => None,
        };

        let event = match outcome {
            StageOutcome::Continue => CastEvent::Completed {
                slot,
                skill: skill_id.clone(),
                targets: targets.len(),
                damage: damage.map_or(0.0, |damage| damage.final_damage),
            },
            StageOutcome::Fail => CastEvent::Failed {
                slot,
                skill: skill_id.clone(),
                spent,
            },
            StageOutcome::Cancel => CastEvent::Cancelled {
                slot,
                skill: skill_id.clone(),
                reason: cancel_reason.unwrap_or(CancelReason::Unknown),
                refunded,
            },
        };
        self.inner.events.publish(Event::Cast(event));

        info!(
            target: "runtime::cast",
            %slot,
            skill = %skill_id,
            %outcome,
            spent,
            refunded,
            targets = targets.len(),
            "cast resolved"
        );

        CastReport {
            slot,
            skill: skill_id,
            outcome,
            cancel_reason,
            pipeline_ran,
            spent,
            refunded,
            targets,
            damage,
        }
    }

    /// Starts a cast and drives it to completion.
    ///
    /// Skills without a detection delay resolve immediately. Delayed skills
    /// are resumed on a tokio task after the delay, which requires a tokio
    /// runtime on the calling thread.
    pub fn execute(&self, slot: SlotIndex, caster: CasterInfo, aim_point: Vec3) -> Result<CastDispatch> {
        let delay = match self.skill(slot) {
            Ok(skill) => skill.definition.detection_delay(),
            Err(err) => return Ok(self.rejected(slot, err)),
        };
        let runtime = if delay.is_zero() {
            None
        } else {
            Some(Handle::try_current().map_err(|_| RuntimeError::NoAsyncRuntime)?)
        };

        let pending = match self.begin_cast(slot, caster, aim_point) {
            Ok(pending) => pending,
            Err(err) => return Ok(self.rejected(slot, err)),
        };

        match runtime {
            None => Ok(CastDispatch::Resolved(self.resume_cast(pending))),
            Some(runtime) => {
                let orchestrator = self.clone();
                let handle = runtime.spawn(async move {
                    tokio::time::sleep(pending.delay()).await;
                    orchestrator.resume_cast(pending)
                });
                Ok(CastDispatch::Scheduled(handle))
            }
        }
    }

    fn rejected(&self, slot: SlotIndex, err: CastError) -> CastDispatch {
        debug!(target: "runtime::cast", %slot, error = %err, "cast rejected");
        CastDispatch::Rejected(err)
    }

    /// Cancels matching in-flight casts with [`CancelReason::ManualInterrupt`].
    ///
    /// `refund_intent` is advisory: whatever the resource stage debited is
    /// refunded on cancellation either way.
    pub fn interrupt(&self, target: InterruptTarget, refund_intent: bool) -> usize {
        debug!(target: "runtime::cast", ?target, refund_intent, "manual interrupt");
        self.interrupt_with(target, CancelReason::ManualInterrupt)
    }

    /// Cancels matching in-flight casts with `reason`. Returns how many
    /// tokens this call cancelled.
    pub fn interrupt_with(&self, target: InterruptTarget, reason: CancelReason) -> usize {
        let tokens = self.inner.tokens.lock();
        let cancelled = tokens
            .iter()
            .filter(|(slot, _)| target.matches(**slot))
            .filter(|(_, token)| token.cancel(reason))
            .count();
        if cancelled > 0 {
            info!(target: "runtime::cast", ?target, %reason, cancelled, "casts interrupted");
        }
        cancelled
    }

    /// True while a cast on `slot` has not resolved yet.
    pub fn in_flight(&self, slot: SlotIndex) -> bool {
        self.inner.tokens.lock().contains_key(&slot)
    }

    fn cancel_in_flight(&self, slot: SlotIndex) {
        if let Some(token) = self.inner.tokens.lock().get(&slot) {
            token.cancel(CancelReason::Unknown);
        }
    }
}

impl std::fmt::Debug for CastOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CastOrchestrator")
            .field("slots", &*self.inner.slots.lock())
            .field("in_flight", &self.inner.tokens.lock().len())
            .finish()
    }
}

//! Applies effects to devices and restores them when effects expire.

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, error, info, warn};

use crate::command::{CommandKind, LightCommand};
use crate::device::SavedState;
use crate::effect::{Effect, EffectId, EffectRegistry};
use crate::errors::Error;
use crate::event::GameEvent;
use crate::manager::{FanOut, LightManager};
use crate::runtime::Instant;
use crate::timer::RestoreTimers;

type Result<T> = std::result::Result<T, Error>;

/// What happened to each device while dispatching one event.
#[derive(Debug, Default)]
pub struct DispatchReport {
    pub event_type: String,
    /// The effect that was selected, if any matched.
    pub effect: Option<EffectId>,
    /// Devices the command reached.
    pub applied: Vec<String>,
    /// Devices whose command failed.
    pub failed: Vec<(String, Error)>,
    /// Restorations scheduled by this event.
    pub scheduled: Vec<(String, Instant)>,
    /// Adapters that failed to list devices or to receive the event.
    pub adapter_errors: Vec<(String, Error)>,
}

impl DispatchReport {
    fn new(event_type: &str) -> Self {
        DispatchReport {
            event_type: event_type.to_string(),
            ..Default::default()
        }
    }

    /// `true` when no effect was selected for the event.
    pub fn is_noop(&self) -> bool {
        self.effect.is_none()
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.adapter_errors.is_empty()
    }

    fn absorb<T>(&mut self, out: FanOut<T>) {
        self.adapter_errors.extend(out.failed);
    }
}

/// Result of restoring one device.
#[derive(Debug)]
pub struct RestoreOutcome {
    pub device_id: String,
    /// The snapshot that was restored.
    pub state: SavedState,
    /// Commands that failed; the snapshot is dropped regardless.
    pub failed: Vec<(CommandKind, Error)>,
}

impl RestoreOutcome {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Owns the effect registry, device snapshots and restoration deadlines.
///
/// Each device is either idle or running one timed effect. Applying another
/// effect to a running device cancels its deadline without restoring; the
/// snapshot taken before the first effect is kept, so the eventual
/// restoration returns the device to where it was before any effect.
///
/// Time is passed in explicitly: [`EffectDispatcher::handle_event_at`]
/// schedules against `now` and [`EffectDispatcher::fire_due`] restores
/// whatever expired by `now`. The [`crate::Engine`] drives both from the
/// runtime clock.
pub struct EffectDispatcher {
    manager: Arc<LightManager>,
    registry: EffectRegistry,
    saved: HashMap<String, SavedState>,
    timers: RestoreTimers,
}

impl EffectDispatcher {
    pub fn new(manager: Arc<LightManager>) -> Self {
        Self::with_registry(manager, EffectRegistry::new())
    }

    pub fn with_registry(manager: Arc<LightManager>, registry: EffectRegistry) -> Self {
        EffectDispatcher {
            manager,
            registry,
            saved: HashMap::new(),
            timers: RestoreTimers::new(),
        }
    }

    pub fn manager(&self) -> &Arc<LightManager> {
        &self.manager
    }

    pub fn registry(&self) -> &EffectRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut EffectRegistry {
        &mut self.registry
    }

    pub fn add_effect(&mut self, effect: Effect) -> EffectId {
        self.registry.add_effect(effect)
    }

    /// Removes an effect. Restorations it already scheduled still fire.
    pub fn remove_effect(&mut self, id: EffectId) -> Result<Effect> {
        self.registry.remove_effect(id)
    }

    /// Initializes every adapter behind the manager.
    pub async fn initialize(&self) -> FanOut<()> {
        self.manager.initialize().await
    }

    pub async fn handle_event(&mut self, event: &GameEvent) -> DispatchReport {
        self.handle_event_at(event, Instant::now()).await
    }

    /// Applies the best matching effect to every known device.
    ///
    /// Devices are handled one at a time; a failing device is recorded in the
    /// report and the rest still receive the command.
    pub async fn handle_event_at(&mut self, event: &GameEvent, now: Instant) -> DispatchReport {
        let mut report = DispatchReport::new(&event.event_type);

        let selected = self
            .registry
            .select(event)
            .map(|(id, effect)| (id, effect.clone()));

        if let Some((effect_id, effect)) = selected {
            report.effect = Some(effect_id);
            self.apply(&effect, now, &mut report).await;
        } else {
            debug!("no effect for {}", event.event_type);
        }

        let forwarded = self.manager.handle_event(event).await;
        report.absorb(forwarded);
        report
    }

    /// Restores every device whose deadline is at or before `now`.
    pub async fn fire_due(&mut self, now: Instant) -> Vec<RestoreOutcome> {
        let mut outcomes = Vec::new();
        for device_id in self.timers.pop_due(now) {
            let state = self.saved.remove(&device_id).unwrap_or_default();
            outcomes.push(self.restore(device_id, state).await);
        }
        outcomes
    }

    /// The earliest pending restoration.
    pub fn next_deadline(&mut self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    pub fn pending_restorations(&self) -> usize {
        self.timers.len()
    }

    pub fn restoration_deadline(&self, device_id: &str) -> Option<Instant> {
        self.timers.deadline_for(device_id)
    }

    /// The snapshot held for a device, if an effect is active on it.
    pub fn saved_state(&self, device_id: &str) -> Option<&SavedState> {
        self.saved.get(device_id)
    }

    /// Cancels every pending restoration and forgets all snapshots.
    pub fn dispose(&mut self) {
        let pending = self.timers.len();
        self.timers.cancel_all();
        self.saved.clear();
        info!("dispatcher disposed, {} restorations cancelled", pending);
    }

    async fn apply(&mut self, effect: &Effect, now: Instant, report: &mut DispatchReport) {
        let listing = self.manager.get_devices().await;
        let devices = listing.devices();
        report.absorb(listing);

        let restore_after = effect
            .duration
            .filter(|d| effect.restore_previous_state && !d.is_zero());

        for device in devices {
            if effect.restore_previous_state && !self.saved.contains_key(&device.id) {
                self.saved.insert(device.id.clone(), device.snapshot());
            }
            if self.timers.cancel(&device.id) {
                debug!("replaced active effect on {}", device.id);
            }

            let cmd = effect.command.for_device(&device.id);
            match self.manager.execute_command(&cmd).await {
                Ok(()) => report.applied.push(device.id.clone()),
                Err(e) => {
                    warn!("effect for {} failed on {}: {}", effect.event_type, device.id, e);
                    report.failed.push((device.id.clone(), e));
                }
            }

            if let Some(duration) = restore_after {
                let deadline = now + duration;
                self.timers.schedule(&device.id, deadline);
                report.scheduled.push((device.id.clone(), deadline));
            }
        }
    }

    async fn restore(&self, device_id: String, state: SavedState) -> RestoreOutcome {
        let mut failed = Vec::new();
        for kind in state.restore_commands() {
            let cmd = LightCommand::new(&device_id, kind.clone());
            if let Err(e) = self.manager.execute_command(&cmd).await {
                error!("failed to restore {} on {}: {}", kind.type_name(), device_id, e);
                failed.push((kind, e));
            }
        }
        debug!("restored {}", device_id);
        RestoreOutcome {
            device_id,
            state,
            failed,
        }
    }
}

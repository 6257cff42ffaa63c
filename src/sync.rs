//! Keeps lights in line with the user's ambient profile.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures::channel::mpsc;
use futures::future::{self, Either};
use futures::StreamExt;
use log::{debug, info, warn};

use crate::engine::EventListener;
use crate::errors::Error;
use crate::event::{EventKind, GameEvent};
use crate::manager::LightManager;
use crate::profile::{EnvironmentProfile, LightingProfile};
use crate::runtime::{self, Instant, Mutex};
use crate::types::{Brightness, Color};

type Result<T> = std::result::Result<T, Error>;

/// Where profiles come from, e.g. a user settings service.
#[async_trait]
pub trait ProfileSource: Send + Sync {
    /// The user's current profile, or `None` if they have none.
    async fn fetch_profile(&self) -> Result<Option<EnvironmentProfile>>;
}

/// Timing and lighting used by [`ProfileSync`].
#[derive(Debug, Clone, PartialEq)]
pub struct SyncSettings {
    pub interval: Duration,
    pub celebration_duration: Duration,
    /// Applied to every device on `match:start`.
    pub game_lighting: LightingProfile,
    pub victory_color: Color,
    pub defeat_color: Color,
}

impl Default for SyncSettings {
    fn default() -> Self {
        SyncSettings {
            interval: Duration::from_millis(30_000),
            celebration_duration: Duration::from_millis(5000),
            game_lighting: LightingProfile::new(Color::rgb(0x30, 0x50, 0xFF), Brightness::clamped(70)),
            victory_color: Color::rgb(0x00, 0xFF, 0x00),
            defeat_color: Color::rgb(0xFF, 0x00, 0x00),
        }
    }
}

/// Per-device results of pushing lighting to every known device.
#[derive(Debug, Default)]
pub struct BroadcastReport {
    pub applied: Vec<String>,
    pub failed: Vec<(String, Error)>,
    /// Adapters that could not list their devices.
    pub adapter_errors: Vec<(String, Error)>,
}

impl BroadcastReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.adapter_errors.is_empty()
    }
}

#[derive(Debug)]
pub enum SyncOutcome {
    /// Another tick was still running.
    Skipped,
    /// No profile, or nothing newer than the current one.
    Unchanged,
    /// A newer profile was stored but not applied because a match or a
    /// celebration owns the lights.
    Deferred { profile_id: String },
    Applied {
        profile_id: String,
        report: BroadcastReport,
    },
    Failed(Error),
}

#[derive(Debug, Default)]
struct SyncState {
    profile: Option<EnvironmentProfile>,
    match_running: bool,
    celebration: Option<Instant>,
}

impl SyncState {
    fn lights_busy(&self) -> bool {
        self.match_running || self.celebration.is_some()
    }

    /// What the lights go back to when a celebration ends.
    fn revert_lighting(&self, settings: &SyncSettings) -> Option<Lighting> {
        if self.match_running {
            Some(Lighting::Uniform(settings.game_lighting.clone()))
        } else {
            self.profile.clone().map(Lighting::Profile)
        }
    }
}

enum Lighting {
    Profile(EnvironmentProfile),
    Uniform(LightingProfile),
}

impl Lighting {
    fn for_device(&self, device_id: &str) -> &LightingProfile {
        match self {
            Lighting::Profile(profile) => profile.lighting_for(device_id),
            Lighting::Uniform(lighting) => lighting,
        }
    }
}

/// Clears the in-progress flag when a tick ends, however it ends.
struct TickGuard<'a>(&'a AtomicBool);

impl<'a> TickGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| TickGuard(flag))
    }
}

impl Drop for TickGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Periodically pulls the ambient profile and applies it, stepping aside
/// while a match is running.
///
/// Register it as an [`EventListener`] on the engine to react to match
/// lifecycle events:
///
/// - `match:start` applies the game lighting
/// - `match:end` re-applies the synced profile
/// - `match:victory` / `match:defeat` flash a celebration color, then return
///   to the game lighting if the match is still running, else the profile
pub struct ProfileSync {
    manager: Arc<LightManager>,
    source: Arc<dyn ProfileSource>,
    settings: SyncSettings,
    state: Mutex<SyncState>,
    ticking: AtomicBool,
    wake_tx: mpsc::UnboundedSender<()>,
    wake_rx: Mutex<mpsc::UnboundedReceiver<()>>,
}

impl ProfileSync {
    pub fn new(
        manager: Arc<LightManager>,
        source: Arc<dyn ProfileSource>,
        settings: SyncSettings,
    ) -> Self {
        let (wake_tx, wake_rx) = mpsc::unbounded();
        ProfileSync {
            manager,
            source,
            settings,
            state: Mutex::new(SyncState::default()),
            ticking: AtomicBool::new(false),
            wake_tx,
            wake_rx: Mutex::new(wake_rx),
        }
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    pub async fn current_profile(&self) -> Option<EnvironmentProfile> {
        self.state.lock().await.profile.clone()
    }

    pub async fn is_match_running(&self) -> bool {
        self.state.lock().await.match_running
    }

    pub async fn celebration_deadline(&self) -> Option<Instant> {
        self.state.lock().await.celebration
    }

    /// Fetches the profile once and applies it if it changed.
    ///
    /// Returns [`SyncOutcome::Skipped`] right away when a previous tick is
    /// still in flight.
    pub async fn tick(&self) -> SyncOutcome {
        let Some(_guard) = TickGuard::acquire(&self.ticking) else {
            debug!("profile sync already running, skipping tick");
            return SyncOutcome::Skipped;
        };

        let fetched = match self.source.fetch_profile().await {
            Ok(fetched) => fetched,
            Err(e) => {
                warn!("failed to fetch profile: {}", e);
                return SyncOutcome::Failed(e);
            }
        };
        let Some(profile) = fetched else {
            return SyncOutcome::Unchanged;
        };

        let profile_id = profile.id.clone();
        let lighting = {
            let mut state = self.state.lock().await;
            if state
                .profile
                .as_ref()
                .is_some_and(|current| !profile.supersedes(current))
            {
                return SyncOutcome::Unchanged;
            }

            let busy = state.lights_busy();
            state.profile = Some(profile.clone());
            if busy {
                info!("stored profile {} until the match is over", profile_id);
                return SyncOutcome::Deferred { profile_id };
            }
            Lighting::Profile(profile)
        };

        let report = self.broadcast(&lighting).await;
        info!(
            "applied profile {} to {} devices",
            profile_id,
            report.applied.len()
        );
        SyncOutcome::Applied { profile_id, report }
    }

    /// Reacts to match lifecycle events; `now` anchors celebration deadlines.
    ///
    /// Returns `None` for events that do not touch the lights.
    pub async fn handle_lifecycle_at(
        &self,
        event: &GameEvent,
        now: Instant,
    ) -> Option<BroadcastReport> {
        let lighting = {
            let mut state = self.state.lock().await;
            match event.kind()? {
                EventKind::MatchStart => {
                    state.match_running = true;
                    state.celebration = None;
                    Lighting::Uniform(self.settings.game_lighting.clone())
                }
                EventKind::MatchEnd => {
                    state.match_running = false;
                    if state.celebration.is_some() {
                        return None;
                    }
                    Lighting::Profile(state.profile.clone()?)
                }
                kind @ (EventKind::MatchVictory | EventKind::MatchDefeat) => {
                    let color = if kind == EventKind::MatchVictory {
                        self.settings.victory_color
                    } else {
                        self.settings.defeat_color
                    };
                    state.celebration = Some(now + self.settings.celebration_duration);
                    // `run` may be asleep until the next tick.
                    let _ = self.wake_tx.unbounded_send(());
                    Lighting::Uniform(LightingProfile::new(color, Brightness::new()))
                }
                _ => return None,
            }
        };
        Some(self.broadcast(&lighting).await)
    }

    /// Ends a celebration whose deadline passed and reverts the lights.
    pub async fn expire_celebration(&self, now: Instant) -> Option<BroadcastReport> {
        let lighting = {
            let mut state = self.state.lock().await;
            if state.celebration.is_none_or(|deadline| deadline > now) {
                return None;
            }
            state.celebration = None;
            state.revert_lighting(&self.settings)?
        };
        Some(self.broadcast(&lighting).await)
    }

    /// Ticks every `interval` and ends celebrations on time until `shutdown`
    /// resolves.
    ///
    /// A celebration started while the loop sleeps wakes it so the
    /// celebration's own deadline is honored.
    pub async fn run<S>(&self, shutdown: S)
    where
        S: Future<Output = ()>,
    {
        let mut wake = self.wake_rx.lock().await;
        let mut shutdown = Box::pin(shutdown);
        let mut next_tick = Instant::now();
        loop {
            let now = Instant::now();
            if now >= next_tick {
                if let SyncOutcome::Failed(e) = self.tick().await {
                    debug!("sync tick failed, retrying in {:?}: {}", self.settings.interval, e);
                }
                next_tick = now + self.settings.interval;
            }
            self.expire_celebration(now).await;

            let wake_at = match self.celebration_deadline().await {
                Some(deadline) if deadline < next_tick => deadline,
                _ => next_tick,
            };
            let sleep = Box::pin(runtime::sleep_until(wake_at));
            let woken = future::select(sleep, wake.next());
            if let Either::Left(_) = future::select(shutdown.as_mut(), woken).await {
                break;
            }
        }
        info!("profile sync stopped");
    }

    async fn broadcast(&self, lighting: &Lighting) -> BroadcastReport {
        let listing = self.manager.get_devices().await;
        let mut report = BroadcastReport::default();

        for device in listing.devices() {
            let mut outcome = Ok(());
            for cmd in lighting.for_device(&device.id).commands_for(&device.id) {
                outcome = self.manager.execute_command(&cmd).await;
                if outcome.is_err() {
                    break;
                }
            }
            match outcome {
                Ok(()) => report.applied.push(device.id),
                Err(e) => {
                    warn!("failed to apply lighting to {}: {}", device.id, e);
                    report.failed.push((device.id, e));
                }
            }
        }

        report.adapter_errors = listing.failed;
        report
    }
}

#[async_trait]
impl EventListener for ProfileSync {
    async fn on_event(&self, event: &GameEvent) -> Result<()> {
        if let Some(report) = self.handle_lifecycle_at(event, Instant::now()).await {
            debug!(
                "{} updated {} devices, {} failed",
                event.event_type,
                report.applied.len(),
                report.failed.len()
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex as StdMutex;

    use chrono::{TimeZone, Utc};
    use futures::channel::oneshot;

    use super::*;
    use crate::adapter::{DeviceAdapter, VirtualAdapter};
    use crate::command::LightCommand;
    use crate::device::{Brand, Device};
    use crate::dispatcher::EffectDispatcher;
    use crate::engine::Engine;
    use crate::profile::MoodProfile;

    fn profile(id: &str, updated_secs: i64, color: Color) -> EnvironmentProfile {
        let at = Utc.timestamp_opt(updated_secs, 0).unwrap();
        EnvironmentProfile {
            id: id.to_string(),
            user_id: "u1".into(),
            name: id.to_string(),
            active: true,
            lighting: LightingProfile::new(color, Brightness::clamped(40)),
            sound: None,
            mood: MoodProfile {
                primary: "calm".into(),
                secondary: None,
                intensity: 0.3,
                timestamp: None,
            },
            active_ritual: None,
            device_overrides: None,
            created_at: at,
            updated_at: at,
        }
    }

    #[derive(Default)]
    struct FixedSource {
        profile: StdMutex<Option<EnvironmentProfile>>,
        fail: AtomicBool,
    }

    impl FixedSource {
        fn set(&self, profile: EnvironmentProfile) {
            *self.profile.lock().unwrap() = Some(profile);
        }
    }

    #[async_trait]
    impl ProfileSource for FixedSource {
        async fn fetch_profile(&self) -> Result<Option<EnvironmentProfile>> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(Error::ProfileSync("service unavailable".into()));
            }
            Ok(self.profile.lock().unwrap().clone())
        }
    }

    struct GatedSource {
        gate: Mutex<Option<oneshot::Receiver<()>>>,
        profile: EnvironmentProfile,
    }

    #[async_trait]
    impl ProfileSource for GatedSource {
        async fn fetch_profile(&self) -> Result<Option<EnvironmentProfile>> {
            let gate = self.gate.lock().await.take();
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            Ok(Some(self.profile.clone()))
        }
    }

    /// Holds the first command until the gate opens.
    struct StallingAdapter {
        gate: Mutex<Option<oneshot::Receiver<()>>>,
    }

    #[async_trait]
    impl DeviceAdapter for StallingAdapter {
        fn adapter_type(&self) -> &str {
            "stalling"
        }

        fn instance_id(&self) -> &str {
            "0"
        }

        async fn initialize(&self) -> Result<()> {
            Ok(())
        }

        async fn get_devices(&self) -> Result<Vec<Device>> {
            Ok(vec![Device::new("a", "A", Brand::Virtual)])
        }

        async fn get_device(&self, id: &str) -> Result<Option<Device>> {
            Ok((id == "a").then(|| Device::new("a", "A", Brand::Virtual)))
        }

        async fn execute_command(&self, _cmd: &LightCommand) -> Result<()> {
            let gate = self.gate.lock().await.take();
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            Ok(())
        }
    }

    async fn setup(source: Arc<dyn ProfileSource>) -> (Arc<VirtualAdapter>, ProfileSync) {
        let adapter = Arc::new(
            VirtualAdapter::new("room")
                .with_device(Device::new("a", "A", Brand::Virtual))
                .with_device(Device::new("b", "B", Brand::Virtual)),
        );
        let mut manager = LightManager::new();
        manager.add_shared_adapter(adapter.clone());
        manager.initialize().await;
        let sync = ProfileSync::new(Arc::new(manager), source, SyncSettings::default());
        (adapter, sync)
    }

    async fn color_of(adapter: &VirtualAdapter, id: &str) -> Option<Color> {
        adapter.get_device(id).await.unwrap().unwrap().color
    }

    #[tokio::test]
    async fn test_applies_new_profile_once() {
        let source = Arc::new(FixedSource::default());
        source.set(profile("p1", 10, Color::rgb(1, 2, 3)));
        let (adapter, sync) = setup(source.clone()).await;

        match sync.tick().await {
            SyncOutcome::Applied { profile_id, report } => {
                assert_eq!(profile_id, "p1");
                assert_eq!(report.applied, vec!["a", "b"]);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(color_of(&adapter, "b").await, Some(Color::rgb(1, 2, 3)));
        assert!(matches!(sync.tick().await, SyncOutcome::Unchanged));

        source.set(profile("p1", 11, Color::rgb(4, 5, 6)));
        assert!(matches!(sync.tick().await, SyncOutcome::Applied { .. }));
        assert_eq!(color_of(&adapter, "a").await, Some(Color::rgb(4, 5, 6)));
    }

    #[tokio::test]
    async fn test_device_overrides() {
        let source = Arc::new(FixedSource::default());
        let mut p = profile("p1", 10, Color::rgb(1, 2, 3));
        p.device_overrides = Some(
            [(
                "b".to_string(),
                LightingProfile::new(Color::rgb(9, 9, 9), Brightness::clamped(90)),
            )]
            .into_iter()
            .collect(),
        );
        source.set(p);
        let (adapter, sync) = setup(source).await;
        sync.tick().await;
        assert_eq!(color_of(&adapter, "a").await, Some(Color::rgb(1, 2, 3)));
        assert_eq!(color_of(&adapter, "b").await, Some(Color::rgb(9, 9, 9)));
    }

    #[tokio::test]
    async fn test_fetch_failure() {
        let source = Arc::new(FixedSource::default());
        source.fail.store(true, Ordering::SeqCst);
        let (_, sync) = setup(source).await;
        assert!(matches!(
            sync.tick().await,
            SyncOutcome::Failed(Error::ProfileSync(_))
        ));
        assert!(matches!(sync.tick().await, SyncOutcome::Failed(_)));
    }

    #[tokio::test]
    async fn test_overlapping_tick_is_skipped() {
        let (open, gate) = oneshot::channel();
        let source = Arc::new(GatedSource {
            gate: Mutex::new(Some(gate)),
            profile: profile("p1", 10, Color::rgb(1, 2, 3)),
        });
        let (_, sync) = setup(source).await;
        let sync = &sync;

        let first = sync.tick();
        let second = async move {
            let outcome = sync.tick().await;
            let _ = open.send(());
            outcome
        };
        let (first, second) = futures::join!(first, second);
        assert!(matches!(second, SyncOutcome::Skipped));
        assert!(matches!(first, SyncOutcome::Applied { .. }));
        assert!(matches!(sync.tick().await, SyncOutcome::Unchanged));
    }

    #[tokio::test]
    async fn test_match_defers_profile() {
        let source = Arc::new(FixedSource::default());
        let (adapter, sync) = setup(source.clone()).await;
        let t0 = Instant::now();
        let game = sync.settings().game_lighting.color;

        sync.handle_lifecycle_at(&GameEvent::of(EventKind::MatchStart), t0)
            .await
            .unwrap();
        assert_eq!(color_of(&adapter, "a").await, Some(game));

        source.set(profile("p1", 10, Color::rgb(1, 2, 3)));
        assert!(matches!(sync.tick().await, SyncOutcome::Deferred { .. }));
        assert_eq!(color_of(&adapter, "a").await, Some(game));

        sync.handle_lifecycle_at(&GameEvent::of(EventKind::MatchEnd), t0)
            .await
            .unwrap();
        assert_eq!(color_of(&adapter, "a").await, Some(Color::rgb(1, 2, 3)));
        assert!(!sync.is_match_running().await);
    }

    #[tokio::test]
    async fn test_celebration_reverts_to_game_lighting() {
        let source = Arc::new(FixedSource::default());
        let (adapter, sync) = setup(source).await;
        let t0 = Instant::now();
        let settings = sync.settings().clone();

        sync.handle_lifecycle_at(&GameEvent::of(EventKind::MatchStart), t0)
            .await;
        sync.handle_lifecycle_at(&GameEvent::of(EventKind::MatchVictory), t0)
            .await;
        assert_eq!(color_of(&adapter, "a").await, Some(settings.victory_color));

        let almost = t0 + (settings.celebration_duration - Duration::from_millis(1));
        assert!(sync.expire_celebration(almost).await.is_none());
        let end = t0 + settings.celebration_duration;
        assert!(sync.expire_celebration(end).await.is_some());
        assert_eq!(color_of(&adapter, "a").await, Some(settings.game_lighting.color));
        assert!(sync.celebration_deadline().await.is_none());
    }

    #[tokio::test]
    async fn test_celebration_after_match_reverts_to_profile() {
        let source = Arc::new(FixedSource::default());
        source.set(profile("p1", 10, Color::rgb(1, 2, 3)));
        let (adapter, sync) = setup(source).await;
        sync.tick().await;
        let t0 = Instant::now();

        sync.handle_lifecycle_at(&GameEvent::of(EventKind::MatchStart), t0)
            .await;
        sync.handle_lifecycle_at(&GameEvent::of(EventKind::MatchDefeat), t0)
            .await;
        assert!(sync
            .handle_lifecycle_at(&GameEvent::of(EventKind::MatchEnd), t0)
            .await
            .is_none());
        assert_eq!(color_of(&adapter, "a").await, Some(sync.settings().defeat_color));

        sync.expire_celebration(t0 + Duration::from_secs(60)).await;
        assert_eq!(color_of(&adapter, "a").await, Some(Color::rgb(1, 2, 3)));
    }

    #[tokio::test]
    async fn test_other_events_leave_lights_alone() {
        let (adapter, sync) = setup(Arc::new(FixedSource::default())).await;
        sync.on_event(&GameEvent::of(EventKind::PlayerKill)).await.unwrap();
        assert!(adapter.history().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_ticks_until_shutdown() {
        let source = Arc::new(FixedSource::default());
        source.set(profile("p1", 10, Color::rgb(1, 2, 3)));
        let (adapter, sync) = setup(source.clone()).await;
        let (stop, stopped) = oneshot::channel::<()>();

        let driver = async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            assert_eq!(color_of(&adapter, "a").await, Some(Color::rgb(1, 2, 3)));

            source.set(profile("p2", 5, Color::rgb(7, 7, 7)));
            tokio::time::sleep(sync.settings().interval).await;
            assert_eq!(color_of(&adapter, "a").await, Some(Color::rgb(7, 7, 7)));
            let _ = stop.send(());
        };
        futures::join!(
            sync.run(async {
                let _ = stopped.await;
            }),
            driver
        );
    }

    #[tokio::test]
    async fn test_lifecycle_not_blocked_by_sync_broadcast() {
        let (open, gate) = oneshot::channel();
        let mut manager = LightManager::new();
        manager.add_adapter(StallingAdapter {
            gate: Mutex::new(Some(gate)),
        });
        manager.initialize().await;
        let source = Arc::new(FixedSource::default());
        source.set(profile("p1", 10, Color::rgb(1, 2, 3)));
        let sync = ProfileSync::new(Arc::new(manager), source, SyncSettings::default());
        let sync = &sync;

        let driver = async move {
            let started = tokio::time::timeout(
                Duration::from_millis(500),
                sync.handle_lifecycle_at(&GameEvent::of(EventKind::MatchStart), Instant::now()),
            )
            .await;
            let _ = open.send(());
            started
        };
        let (outcome, started) = futures::join!(sync.tick(), driver);
        let report = started.expect("lifecycle event waited on the sync broadcast");
        assert_eq!(report.unwrap().applied, vec!["a"]);
        assert!(matches!(outcome, SyncOutcome::Applied { .. }));
        assert!(sync.is_match_running().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_ends_celebration_started_mid_sleep() {
        let source = Arc::new(FixedSource::default());
        source.set(profile("p1", 10, Color::rgb(1, 2, 3)));
        let (adapter, sync) = setup(source).await;
        let (stop, stopped) = oneshot::channel::<()>();
        let celebration = sync.settings().celebration_duration;

        let driver = async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            sync.on_event(&GameEvent::of(EventKind::MatchVictory))
                .await
                .unwrap();
            assert_eq!(color_of(&adapter, "a").await, Some(sync.settings().victory_color));

            tokio::time::sleep(celebration + Duration::from_millis(1000)).await;
            assert!(sync.celebration_deadline().await.is_none());
            assert_eq!(color_of(&adapter, "a").await, Some(Color::rgb(1, 2, 3)));
            let _ = stop.send(());
        };
        futures::join!(
            sync.run(async {
                let _ = stopped.await;
            }),
            driver
        );
    }

    #[tokio::test]
    async fn test_lifecycle_through_engine_listener() {
        let adapter =
            Arc::new(VirtualAdapter::new("room").with_device(Device::new("a", "A", Brand::Virtual)));
        let mut manager = LightManager::new();
        manager.add_shared_adapter(adapter.clone());
        let manager = Arc::new(manager);

        let source = Arc::new(FixedSource::default());
        source.set(profile("p1", 10, Color::rgb(1, 2, 3)));
        let sync = Arc::new(ProfileSync::new(manager.clone(), source, SyncSettings::default()));
        let settings = sync.settings().clone();

        let engine = Engine::spawn(EffectDispatcher::new(manager));
        engine.initialize().await.unwrap();
        engine.add_listener(sync.clone()).await.unwrap();
        assert!(matches!(sync.tick().await, SyncOutcome::Applied { .. }));

        engine.handle_event(GameEvent::of(EventKind::MatchStart)).await.unwrap();
        assert!(sync.is_match_running().await);
        assert_eq!(color_of(&adapter, "a").await, Some(settings.game_lighting.color));

        engine.handle_event(GameEvent::of(EventKind::MatchVictory)).await.unwrap();
        assert_eq!(color_of(&adapter, "a").await, Some(settings.victory_color));

        engine.handle_event(GameEvent::of(EventKind::MatchEnd)).await.unwrap();
        assert_eq!(color_of(&adapter, "a").await, Some(settings.victory_color));

        sync.expire_celebration(Instant::now() + settings.celebration_duration)
            .await
            .unwrap();
        assert_eq!(color_of(&adapter, "a").await, Some(Color::rgb(1, 2, 3)));
        engine.shutdown().await.unwrap();
    }
}

//! A single task that owns the dispatcher.
//!
//! Events, registry edits and restoration deadlines all go through one
//! queue, so dispatch state is never shared. The task sleeps until the
//! earliest restoration deadline or the next message, whichever comes first.

use std::sync::Arc;

use async_trait::async_trait;
use futures::channel::{mpsc, oneshot};
use futures::future::{self, Either};
use futures::StreamExt;
use log::{debug, info, warn};

use crate::dispatcher::{DispatchReport, EffectDispatcher};
use crate::effect::{Effect, EffectId};
use crate::errors::Error;
use crate::event::GameEvent;
use crate::manager::FanOut;
use crate::runtime::{self, Instant};

type Result<T> = std::result::Result<T, Error>;

/// Notified of every event after its effects were dispatched.
#[async_trait]
pub trait EventListener: Send + Sync {
    async fn on_event(&self, event: &GameEvent) -> Result<()>;
}

enum Message {
    Event(GameEvent, oneshot::Sender<DispatchReport>),
    AddEffect(Effect, oneshot::Sender<EffectId>),
    RemoveEffect(EffectId, oneshot::Sender<Result<Effect>>),
    AddListener(Arc<dyn EventListener>, oneshot::Sender<()>),
    Initialize(oneshot::Sender<FanOut<()>>),
    PendingRestorations(oneshot::Sender<usize>),
    Dispose(oneshot::Sender<()>),
    Shutdown(oneshot::Sender<()>),
}

enum Wake {
    Deadline,
    Message(Option<Message>),
}

/// The engine task. Usually started with [`Engine::spawn`].
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use std::time::Duration;
/// use lumen_bridge::{
///     Brand, Color, CommandKind, Device, Effect, EffectDispatcher, Engine, GameEvent,
///     LightManager, VirtualAdapter,
/// };
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), lumen_bridge::Error> {
/// let mut manager = LightManager::new();
/// manager.add_adapter(VirtualAdapter::new("home").with_device(Device::new("desk", "Desk", Brand::Virtual)));
///
/// let engine = Engine::spawn(EffectDispatcher::new(Arc::new(manager)));
/// engine.initialize().await?;
/// engine
///     .add_effect(
///         Effect::new("match:victory", CommandKind::SetColor(Color::rgb(0, 255, 0)))
///             .with_duration(Duration::from_millis(5000))
///             .restoring(),
///     )
///     .await?;
///
/// let report = engine.handle_event(GameEvent::new("match:victory")).await?;
/// assert_eq!(report.applied, vec!["desk"]);
/// engine.shutdown().await?;
/// # Ok(())
/// # }
/// ```
pub struct Engine {
    dispatcher: EffectDispatcher,
    listeners: Vec<Arc<dyn EventListener>>,
    rx: mpsc::UnboundedReceiver<Message>,
}

impl Engine {
    /// Creates the engine and a handle to it without starting it.
    pub fn new(dispatcher: EffectDispatcher) -> (Engine, EngineHandle) {
        let (tx, rx) = mpsc::unbounded();
        let engine = Engine {
            dispatcher,
            listeners: Vec::new(),
            rx,
        };
        (engine, EngineHandle { tx })
    }

    /// Starts the engine on the selected runtime.
    pub fn spawn(dispatcher: EffectDispatcher) -> EngineHandle {
        let (engine, handle) = Self::new(dispatcher);
        // Detached; the task ends on shutdown or when every handle is dropped.
        drop(runtime::spawn(engine.run()));
        handle
    }

    /// Processes messages and deadlines until shut down.
    pub async fn run(mut self) {
        loop {
            match self.wait().await {
                Wake::Deadline => {
                    let outcomes = self.dispatcher.fire_due(Instant::now()).await;
                    debug!("restored {} devices", outcomes.len());
                }
                Wake::Message(Some(msg)) => {
                    if !self.process(msg).await {
                        info!("engine stopped");
                        return;
                    }
                }
                Wake::Message(None) => break,
            }
        }
        self.dispatcher.dispose();
        info!("engine stopped, all handles dropped");
    }

    async fn wait(&mut self) -> Wake {
        let Some(deadline) = self.dispatcher.next_deadline() else {
            return Wake::Message(self.rx.next().await);
        };
        let sleep = Box::pin(runtime::sleep_until(deadline));
        match future::select(sleep, self.rx.next()).await {
            Either::Left(((), _)) => Wake::Deadline,
            Either::Right((msg, _)) => Wake::Message(msg),
        }
    }

    /// Handles one message; returns `false` once the engine should stop.
    async fn process(&mut self, msg: Message) -> bool {
        match msg {
            Message::Event(event, reply) => {
                let report = self.dispatcher.handle_event(&event).await;
                for listener in &self.listeners {
                    if let Err(e) = listener.on_event(&event).await {
                        warn!("listener failed on {}: {}", event.event_type, e);
                    }
                }
                let _ = reply.send(report);
            }
            Message::AddEffect(effect, reply) => {
                let _ = reply.send(self.dispatcher.add_effect(effect));
            }
            Message::RemoveEffect(id, reply) => {
                let _ = reply.send(self.dispatcher.remove_effect(id));
            }
            Message::AddListener(listener, reply) => {
                self.listeners.push(listener);
                let _ = reply.send(());
            }
            Message::Initialize(reply) => {
                let _ = reply.send(self.dispatcher.initialize().await);
            }
            Message::PendingRestorations(reply) => {
                let _ = reply.send(self.dispatcher.pending_restorations());
            }
            Message::Dispose(reply) => {
                self.dispatcher.dispose();
                self.listeners.clear();
                let _ = reply.send(());
            }
            Message::Shutdown(reply) => {
                self.dispatcher.dispose();
                let _ = reply.send(());
                return false;
            }
        }
        true
    }
}

/// Cloneable handle to a running [`Engine`].
///
/// Every call fails with [`Error::EngineStopped`] once the engine is gone.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::UnboundedSender<Message>,
}

impl EngineHandle {
    /// Dispatches an event and waits until it and every listener are done.
    pub async fn handle_event(&self, event: GameEvent) -> Result<DispatchReport> {
        self.request(|reply| Message::Event(event, reply)).await
    }

    pub async fn add_effect(&self, effect: Effect) -> Result<EffectId> {
        self.request(|reply| Message::AddEffect(effect, reply)).await
    }

    pub async fn remove_effect(&self, id: EffectId) -> Result<Effect> {
        self.request(|reply| Message::RemoveEffect(id, reply)).await?
    }

    pub async fn add_listener(&self, listener: Arc<dyn EventListener>) -> Result<()> {
        self.request(|reply| Message::AddListener(listener, reply)).await
    }

    pub async fn initialize(&self) -> Result<FanOut<()>> {
        self.request(Message::Initialize).await
    }

    pub async fn pending_restorations(&self) -> Result<usize> {
        self.request(Message::PendingRestorations).await
    }

    /// Cancels pending restorations and drops all listeners.
    pub async fn dispose(&self) -> Result<()> {
        self.request(Message::Dispose).await
    }

    /// Stops the engine. Pending restorations are cancelled.
    pub async fn shutdown(&self) -> Result<()> {
        self.request(Message::Shutdown).await
    }

    pub fn is_running(&self) -> bool {
        !self.tx.is_closed()
    }

    async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Message) -> Result<T> {
        let (reply, response) = oneshot::channel();
        self.tx
            .unbounded_send(make(reply))
            .map_err(|_| Error::EngineStopped)?;
        response.await.map_err(|_| Error::EngineStopped)
    }
}

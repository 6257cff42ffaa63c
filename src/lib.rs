//! # lumen_bridge
//!
//! An async Rust library for driving smart lights from game and application
//! events.
//!
//! Lights from different vendors sit behind one [`DeviceAdapter`] contract and
//! are reached through a [`LightManager`]. On top of that, an effect layer maps
//! events such as `match:victory` to prioritized, optionally timed lighting
//! commands, and puts every device back the way it was once a timed effect
//! expires.
//!
//! ## Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use lumen_bridge::{
//!     Brand, Brightness, Color, CommandKind, Device, DeviceAdapter, Effect, EffectDispatcher,
//!     GameEvent, LightManager, VirtualAdapter,
//! };
//!
//! # #[tokio::main]
//! # async fn main() {
//! let lamp = Arc::new(VirtualAdapter::new("desk").with_device(
//!     Device::new("lamp", "Desk Lamp", Brand::Govee)
//!         .with_color(Color::rgb(255, 255, 255))
//!         .with_brightness(Brightness::clamped(80)),
//! ));
//! let mut manager = LightManager::new();
//! manager.add_shared_adapter(lamp.clone());
//!
//! let mut dispatcher = EffectDispatcher::new(Arc::new(manager));
//! dispatcher.initialize().await;
//! dispatcher.add_effect(
//!     Effect::new("match:victory", CommandKind::SetColor(Color::rgb(0, 255, 0)))
//!         .with_priority(10)
//!         .with_duration(Duration::from_millis(5000))
//!         .restoring(),
//! );
//!
//! dispatcher.handle_event(&GameEvent::new("match:victory")).await;
//! let device = lamp.get_device("lamp").await.unwrap().unwrap();
//! assert_eq!(device.color, Some(Color::rgb(0, 255, 0)));
//! # }
//! ```
//!
//! In an application, hand the dispatcher to an [`Engine`] so restorations
//! fire on time without further calls.
//!
//! ## Features
//!
//! - **Runtime Agnostic**: Works with tokio, async-std, or smol async runtimes
//! - **One Device Contract**: Vendor adapters implement [`DeviceAdapter`]; [`VirtualAdapter`] keeps devices in memory
//! - **Partial Results**: Fan-out calls report per-adapter failures with [`FanOut`]
//! - **Effects**: Priorities, [`Condition`]s and timed restoration with [`Effect`] and [`EffectRegistry`]
//! - **Engine**: A single task owning all dispatch state, see [`Engine`]
//! - **Ambient Profiles**: Periodic sync of an [`EnvironmentProfile`] with [`ProfileSync`]
//! - **Configuration**: Effects and timings from JSON with [`EngineConfig`]
//!
//! ## Runtime Selection
//!
//! This library is runtime-agnostic. Select your preferred runtime using feature flags:
//!
//! ### Using tokio (default)
//!
//! ```toml
//! [dependencies]
//! lumen-bridge = "0.1"
//! tokio = { version = "1", features = ["rt-multi-thread", "macros"] }
//! ```
//!
//! ### Using async-std
//!
//! ```toml
//! [dependencies]
//! lumen-bridge = { version = "0.1", default-features = false, features = ["runtime-async-std"] }
//! async-std = { version = "1.12", features = ["attributes"] }
//! ```
//!
//! ### Using smol
//!
//! ```toml
//! [dependencies]
//! lumen-bridge = { version = "0.1", default-features = false, features = ["runtime-smol"] }
//! smol = "2"
//! ```
//!
//! ## Feature Flags
//!
//! - `runtime-tokio` (default): Use the tokio async runtime
//! - `runtime-async-std`: Use the async-std runtime
//! - `runtime-smol`: Use the smol runtime

pub mod adapter;
mod command;
mod config;
mod device;
mod dispatcher;
pub mod effect;
mod engine;
mod errors;
mod event;
mod history;
mod manager;
mod profile;
pub mod runtime;
mod sync;
mod timer;
mod types;

// Re-export public API
pub use adapter::{DeviceAdapter, VirtualAdapter};
pub use command::{CommandKind, CommandTemplate, LightCommand};
pub use config::{EffectConfig, EngineConfig};
pub use device::{Brand, Device, DeviceType, SavedState};
pub use dispatcher::{DispatchReport, EffectDispatcher, RestoreOutcome};
pub use effect::{Condition, Effect, EffectId, EffectRegistry, Predicate};
pub use engine::{Engine, EngineHandle, EventListener};
pub use errors::Error;
pub use event::{EventKind, GameEvent};
pub use history::{CommandHistory, CommandOutcome, HistoryEntry, HistorySummary};
pub use manager::{FanOut, LightManager};
pub use profile::{EnvironmentProfile, LightingProfile, MoodProfile, SoundProfile};
pub use sync::{BroadcastReport, ProfileSource, ProfileSync, SyncOutcome, SyncSettings};
pub use timer::{RestoreTimers, TimerToken};
pub use types::{Brightness, Color, PowerMode};

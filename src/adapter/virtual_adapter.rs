//! An in-process adapter standing in for vendor integrations.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info};

use super::DeviceAdapter;
use crate::command::{CommandKind, LightCommand};
use crate::device::Device;
use crate::errors::Error;
use crate::event::GameEvent;
use crate::history::{CommandHistory, CommandOutcome};
use crate::runtime::{self, Mutex};

type Result<T> = std::result::Result<T, Error>;

/// Holds devices in memory and behaves like a vendor adapter.
///
/// Brightness above 100 is clamped rather than rejected, matching what the
/// Govee cloud accepts. The adapter can be taken offline or told to reject
/// commands for a device, and it records every command it receives.
///
/// # Example
///
/// ```
/// use lumen_bridge::{Brand, Device, VirtualAdapter, DeviceAdapter};
///
/// let adapter = VirtualAdapter::new("desk")
///     .with_device(Device::new("lamp", "Lamp", Brand::Govee));
/// assert_eq!(adapter.key(), "virtual:desk");
/// ```
pub struct VirtualAdapter {
    instance_id: String,
    latency: Option<Duration>,
    state: Mutex<VirtualState>,
}

#[derive(Default)]
struct VirtualState {
    initialized: bool,
    offline: bool,
    devices: Vec<Device>,
    failing: HashSet<String>,
    history: CommandHistory,
    events: Vec<GameEvent>,
}

impl VirtualAdapter {
    pub const TYPE: &'static str = "virtual";

    pub fn new(instance_id: &str) -> Self {
        VirtualAdapter {
            instance_id: instance_id.to_string(),
            latency: None,
            state: Mutex::new(VirtualState::default()),
        }
    }

    /// Adds a device known to the simulated vendor.
    pub fn with_device(mut self, device: Device) -> Self {
        self.state.get_mut().devices.push(device);
        self
    }

    /// Delays every call, to exercise timeouts.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Simulates losing connectivity to the vendor.
    pub async fn set_offline(&self, offline: bool) {
        self.state.lock().await.offline = offline;
    }

    /// Makes the vendor reject every command for this device.
    pub async fn fail_commands_for(&self, device_id: &str) {
        self.state.lock().await.failing.insert(device_id.to_string());
    }

    pub async fn clear_failures(&self) {
        self.state.lock().await.failing.clear();
    }

    pub async fn is_initialized(&self) -> bool {
        self.state.lock().await.initialized
    }

    pub async fn history(&self) -> CommandHistory {
        self.state.lock().await.history.clone()
    }

    pub async fn clear_history(&self) {
        self.state.lock().await.history.clear();
    }

    /// Events passed through [`DeviceAdapter::handle_event`].
    pub async fn events(&self) -> Vec<GameEvent> {
        self.state.lock().await.events.clone()
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            runtime::sleep(latency).await;
        }
    }
}

#[async_trait]
impl DeviceAdapter for VirtualAdapter {
    fn adapter_type(&self) -> &str {
        Self::TYPE
    }

    fn instance_id(&self) -> &str {
        &self.instance_id
    }

    async fn initialize(&self) -> Result<()> {
        self.simulate_latency().await;
        let mut state = self.state.lock().await;
        if state.offline {
            return Err(Error::initialization_failed(
                &self.key(),
                Error::device_fetch_failed(&self.key(), "vendor unreachable"),
            ));
        }
        state.initialized = true;
        info!("{} initialized with {} devices", self.key(), state.devices.len());
        Ok(())
    }

    async fn get_devices(&self) -> Result<Vec<Device>> {
        self.simulate_latency().await;
        let state = self.state.lock().await;
        if state.offline {
            return Err(Error::device_fetch_failed(&self.key(), "vendor unreachable"));
        }
        Ok(state.devices.clone())
    }

    async fn get_device(&self, id: &str) -> Result<Option<Device>> {
        self.simulate_latency().await;
        let state = self.state.lock().await;
        if state.offline {
            return Err(Error::device_fetch_failed(&self.key(), "vendor unreachable"));
        }
        Ok(state.devices.iter().find(|d| d.id == id).cloned())
    }

    async fn execute_command(&self, cmd: &LightCommand) -> Result<()> {
        self.simulate_latency().await;
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        if !state.initialized {
            return Err(Error::NotInitialized(self.key()));
        }
        if state.offline {
            state.history.record_error("vendor unreachable");
            return Err(Error::command_send_failed(cmd.device_id(), "vendor unreachable"));
        }

        let Some(device) = state.devices.iter_mut().find(|d| d.id == cmd.device_id()) else {
            return Err(Error::DeviceNotFound(cmd.device_id().to_string()));
        };

        if state.failing.contains(cmd.device_id()) {
            state.history.record(CommandOutcome::Rejected, cmd);
            state.history.record_error("device rejected command");
            return Err(Error::command_failed(
                cmd.device_id(),
                "device rejected command",
            ));
        }

        if !device.apply(cmd.kind()) {
            match cmd.kind() {
                CommandKind::Custom { name, .. } if name == "toggle" => {
                    device.is_on = !device.is_on;
                }
                CommandKind::Custom { name, .. } => {
                    state.history.record(CommandOutcome::Rejected, cmd);
                    return Err(Error::UnsupportedCommand(name.clone()));
                }
                _ => unreachable!("only custom commands are left to the adapter"),
            }
        }

        debug!("{} executed {} on {}", self.key(), cmd.kind().type_name(), cmd.device_id());
        state.history.record(CommandOutcome::Executed, cmd);
        Ok(())
    }

    async fn handle_event(&self, event: &GameEvent) -> Result<()> {
        self.state.lock().await.events.push(event.clone());
        Ok(())
    }
}

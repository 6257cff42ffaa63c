//! Aggregation of device adapters.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};

use crate::adapter::DeviceAdapter;
use crate::command::LightCommand;
use crate::device::Device;
use crate::errors::Error;
use crate::event::GameEvent;
use crate::runtime;

type Result<T> = std::result::Result<T, Error>;

/// Per-adapter results of a best-effort fan-out.
///
/// Callers choose how strict to be: [`FanOut::into_result`] fails on the
/// first adapter error, while the fields expose every partial outcome.
#[derive(Debug)]
pub struct FanOut<T> {
    pub succeeded: Vec<(String, T)>,
    pub failed: Vec<(String, Error)>,
}

impl<T> Default for FanOut<T> {
    fn default() -> Self {
        FanOut {
            succeeded: Vec::new(),
            failed: Vec::new(),
        }
    }
}

impl<T> FanOut<T> {
    /// `true` when no adapter failed.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// Strict view: the successful values, or the first failure.
    pub fn into_result(self) -> Result<Vec<(String, T)>> {
        match self.failed.into_iter().next() {
            Some((_, err)) => Err(err),
            None => Ok(self.succeeded),
        }
    }

    fn push(&mut self, key: String, result: Result<T>) {
        match result {
            Ok(value) => self.succeeded.push((key, value)),
            Err(err) => {
                warn!("adapter {} failed: {}", key, err);
                self.failed.push((key, err));
            }
        }
    }
}

impl FanOut<Vec<Device>> {
    /// All devices from the adapters that answered, first adapter winning on
    /// duplicate ids.
    pub fn devices(&self) -> Vec<Device> {
        let mut seen = HashSet::new();
        let mut devices = Vec::new();
        for (key, list) in &self.succeeded {
            for device in list {
                if seen.insert(device.id.clone()) {
                    devices.push(device.clone());
                } else {
                    warn!("device id {} from {} shadowed by an earlier adapter", device.id, key);
                }
            }
        }
        devices
    }
}

/// Routes commands and queries to the adapter that owns a device.
///
/// Adapters are kept in registration order and consulted in that order, so
/// resolving a device costs one probe per adapter.
///
/// # Example
///
/// ```
/// use lumen_bridge::{Brand, Device, LightManager, VirtualAdapter};
///
/// let mut manager = LightManager::new();
/// manager.add_adapter(VirtualAdapter::new("a").with_device(Device::new("x", "X", Brand::Virtual)));
/// assert_eq!(manager.adapter_keys(), vec!["virtual:a".to_string()]);
/// ```
pub struct LightManager {
    adapters: Vec<(String, Arc<dyn DeviceAdapter>)>,
    call_timeout: Duration,
}

impl Default for LightManager {
    fn default() -> Self {
        Self::new()
    }
}

impl LightManager {
    pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

    pub fn new() -> Self {
        LightManager {
            adapters: Vec::new(),
            call_timeout: Duration::from_millis(Self::DEFAULT_TIMEOUT_MS),
        }
    }

    /// Sets the timeout applied to every adapter call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Registers an adapter under `{type}:{instance}`.
    ///
    /// An adapter with the same key is replaced in place.
    pub fn add_adapter<A: DeviceAdapter + 'static>(&mut self, adapter: A) -> String {
        self.add_shared_adapter(Arc::new(adapter))
    }

    /// Registers an adapter the caller keeps a handle to.
    pub fn add_shared_adapter(&mut self, adapter: Arc<dyn DeviceAdapter>) -> String {
        let key = adapter.key();
        match self.adapters.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = adapter,
            None => self.adapters.push((key.clone(), adapter)),
        }
        key
    }

    pub fn remove_adapter(&mut self, key: &str) -> bool {
        let before = self.adapters.len();
        self.adapters.retain(|(k, _)| k != key);
        self.adapters.len() != before
    }

    pub fn adapter(&self, key: &str) -> Option<&Arc<dyn DeviceAdapter>> {
        self.adapters.iter().find(|(k, _)| k == key).map(|(_, a)| a)
    }

    pub fn adapter_keys(&self) -> Vec<String> {
        self.adapters.iter().map(|(k, _)| k.clone()).collect()
    }

    /// Initializes every adapter; failures do not stop the others.
    pub async fn initialize(&self) -> FanOut<()> {
        let mut out = FanOut::default();
        for (key, adapter) in &self.adapters {
            let result = runtime::timeout(self.call_timeout, adapter.initialize())
                .await
                .unwrap_or_else(|_| {
                    Err(Error::initialization_failed(
                        key,
                        Error::device_fetch_failed(key, "timed out"),
                    ))
                });
            out.push(key.clone(), result);
        }
        info!(
            "initialized {} of {} adapters",
            out.succeeded.len(),
            self.adapters.len()
        );
        out
    }

    /// Collects devices from every adapter.
    pub async fn get_devices(&self) -> FanOut<Vec<Device>> {
        let mut out = FanOut::default();
        for (key, adapter) in &self.adapters {
            let result = runtime::timeout(self.call_timeout, adapter.get_devices())
                .await
                .unwrap_or_else(|_| Err(Error::device_fetch_failed(key, "timed out")));
            out.push(key.clone(), result);
        }
        out
    }

    /// Finds a device in the first adapter that reports it.
    ///
    /// Fails only when every adapter failed to answer.
    pub async fn get_device(&self, id: &str) -> Result<Option<Device>> {
        let mut answered = false;
        let mut last_error = None;
        for (key, adapter) in &self.adapters {
            match self.probe(key, adapter.as_ref(), id).await {
                Ok(Some(device)) => return Ok(Some(device)),
                Ok(None) => answered = true,
                Err(e) => {
                    warn!("adapter {} failed looking up {}: {}", key, id, e);
                    last_error = Some(e);
                }
            }
        }
        match last_error {
            Some(e) if !answered => Err(e),
            _ => Ok(None),
        }
    }

    /// Sends a command to the adapter that owns the device.
    ///
    /// Adapters are asked in order whether they know the device; errors from
    /// one adapter are logged and the next one is tried. Fails with
    /// [`Error::DeviceNotFound`] when no adapter knows the device, or
    /// [`Error::NoAdapterHandled`] when every owner failed.
    pub async fn execute_command(&self, cmd: &LightCommand) -> Result<()> {
        let device_id = cmd.device_id();
        let mut last_error = None;

        for (key, adapter) in &self.adapters {
            match self.probe(key, adapter.as_ref(), device_id).await {
                Ok(Some(_)) => {}
                Ok(None) => continue,
                Err(e) => {
                    warn!("adapter {} failed looking up {}: {}", key, device_id, e);
                    last_error = Some(e);
                    continue;
                }
            }

            let result = runtime::timeout(self.call_timeout, adapter.execute_command(cmd))
                .await
                .unwrap_or_else(|_| Err(Error::command_send_failed(device_id, "timed out")));
            match result {
                Ok(()) => {
                    debug!("{} handled {} for {}", key, cmd.kind().type_name(), device_id);
                    return Ok(());
                }
                Err(e) => {
                    warn!("adapter {} failed to execute command for {}: {}", key, device_id, e);
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) => Err(Error::no_adapter_handled(device_id, e)),
            None => Err(Error::DeviceNotFound(device_id.to_string())),
        }
    }

    /// Passes an event to every adapter.
    pub async fn handle_event(&self, event: &GameEvent) -> FanOut<()> {
        let mut out = FanOut::default();
        for (key, adapter) in &self.adapters {
            let result = runtime::timeout(self.call_timeout, adapter.handle_event(event))
                .await
                .unwrap_or_else(|_| Err(Error::command_send_failed(key, "timed out")));
            out.push(key.clone(), result);
        }
        out
    }

    async fn probe(
        &self,
        key: &str,
        adapter: &dyn DeviceAdapter,
        id: &str,
    ) -> Result<Option<Device>> {
        runtime::timeout(self.call_timeout, adapter.get_device(id))
            .await
            .unwrap_or_else(|_| Err(Error::device_fetch_failed(key, "timed out")))
    }
}

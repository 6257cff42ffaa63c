//! The uniform device-adapter contract.
//!
//! Every vendor integration (Govee, Hue, platform bridges) sits behind
//! [`DeviceAdapter`]. The [`crate::LightManager`] only ever talks to this
//! trait, so vendor protocols stay out of the effect engine.

mod virtual_adapter;

pub use virtual_adapter::VirtualAdapter;

use async_trait::async_trait;

use crate::command::LightCommand;
use crate::device::Device;
use crate::errors::Error;
use crate::event::GameEvent;

type Result<T> = std::result::Result<T, Error>;

/// A vendor-specific client that exposes devices through one contract.
///
/// Methods take `&self`; implementations guard their device cache with
/// [`crate::runtime::Mutex`] so adapters can be shared between the effect
/// engine and the profile sync loop.
#[async_trait]
pub trait DeviceAdapter: Send + Sync {
    /// Vendor or platform name, e.g. `govee`.
    fn adapter_type(&self) -> &str;

    /// Distinguishes several adapters of the same type.
    fn instance_id(&self) -> &str;

    /// Registry key in the form `{type}:{instance}`.
    fn key(&self) -> String {
        format!("{}:{}", self.adapter_type(), self.instance_id())
    }

    /// Checks connectivity and populates the device cache.
    ///
    /// Fails with [`Error::InitializationFailed`] wrapping the root cause.
    async fn initialize(&self) -> Result<()>;

    /// Refreshes and returns all devices. Fails with [`Error::DeviceFetchFailed`].
    async fn get_devices(&self) -> Result<Vec<Device>>;

    /// Returns the device, or `None` when the vendor does not know it.
    async fn get_device(&self, id: &str) -> Result<Option<Device>>;

    /// Translates and sends a command, then updates the cache optimistically.
    async fn execute_command(&self, cmd: &LightCommand) -> Result<()>;

    /// Passthrough for events the adapter may care about.
    async fn handle_event(&self, _event: &GameEvent) -> Result<()> {
        Ok(())
    }
}

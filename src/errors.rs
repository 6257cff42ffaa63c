use uuid::Uuid;

/// All error types that can occur when driving lights through the bridge.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An adapter failed its connectivity or authentication check.
    #[error("adapter {adapter} failed to initialize: {source}")]
    InitializationFailed {
        adapter: String,
        #[source]
        source: Box<Error>,
    },

    /// An adapter could not fetch its device list or a single device.
    #[error("adapter {adapter} failed to fetch devices: {reason}")]
    DeviceFetchFailed { adapter: String, reason: String },

    /// No device with this id is known.
    #[error("device not found {0}")]
    DeviceNotFound(String),

    /// A command was sent to an adapter before [`crate::DeviceAdapter::initialize`].
    #[error("adapter {0} is not initialized")]
    NotInitialized(String),

    /// A command or configuration value was malformed.
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    /// The vendor rejected a command.
    #[error("command for device {device_id} failed: {message}")]
    CommandExecutionFailed { device_id: String, message: String },

    /// A command could not be delivered to the vendor (transport error or timeout).
    #[error("failed to send command to device {device_id}: {reason}")]
    CommandSendFailed { device_id: String, reason: String },

    /// The adapter does not know how to execute this command.
    #[error("unsupported command {0}")]
    UnsupportedCommand(String),

    /// Every adapter that knows the device failed to execute the command.
    #[error("no adapter could handle the command for device {device_id}: {last}")]
    NoAdapterHandled {
        device_id: String,
        #[source]
        last: Box<Error>,
    },

    /// The effect handle does not refer to a registered effect.
    #[error("effect not found {0}")]
    EffectNotFound(Uuid),

    /// Failed to parse a [`crate::Color`] from a string.
    #[error("invalid color string: {0}")]
    InvalidColorString(String),

    /// The ambient profile source failed.
    #[error("profile sync failed: {0}")]
    ProfileSync(String),

    /// The engine task is no longer running.
    #[error("effect engine stopped")]
    EngineStopped,

    /// Configuration could not be loaded.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Failed to serialize data to JSON.
    #[error("failed to dump json: {0:?}")]
    JsonDump(serde_json::Error),

    /// Failed to deserialize JSON data.
    #[error("failed to load json: {0:?}")]
    JsonLoad(serde_json::Error),
}

impl Error {
    /// Wrap a root cause as an initialization failure
    pub fn initialization_failed(adapter: &str, cause: Error) -> Self {
        Error::InitializationFailed {
            adapter: adapter.to_string(),
            source: Box::new(cause),
        }
    }

    /// Create a new device fetch error
    pub fn device_fetch_failed(adapter: &str, reason: impl ToString) -> Self {
        Error::DeviceFetchFailed {
            adapter: adapter.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a new invalid parameter error
    pub fn invalid_parameter(name: &str, reason: impl ToString) -> Self {
        Error::InvalidParameter {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a new command execution error carrying the vendor message
    pub fn command_failed(device_id: &str, message: impl ToString) -> Self {
        Error::CommandExecutionFailed {
            device_id: device_id.to_string(),
            message: message.to_string(),
        }
    }

    /// Create a new command send error
    pub fn command_send_failed(device_id: &str, reason: impl ToString) -> Self {
        Error::CommandSendFailed {
            device_id: device_id.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a new error for a command no adapter could execute
    pub fn no_adapter_handled(device_id: &str, last: Error) -> Self {
        Error::NoAdapterHandled {
            device_id: device_id.to_string(),
            last: Box::new(last),
        }
    }
}

/// Hacky implementation of PartialEq for testing
#[cfg(test)]
impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.to_string() == other.to_string()
    }
}

//! Vendor-neutral lighting commands.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::errors::Error;
use crate::types::{Color, PowerMode};

type Result<T> = std::result::Result<T, Error>;

/// What a command asks the device to do, with its parameters.
///
/// Brightness is kept as the raw requested percentage; adapters clamp it to
/// what the hardware accepts.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandKind {
    TurnOn,
    TurnOff,
    SetColor(Color),
    SetBrightness(i64),
    Custom { name: String, params: Value },
}

impl CommandKind {
    /// Wire name of the command type.
    pub fn type_name(&self) -> &str {
        match self {
            CommandKind::TurnOn => "turnOn",
            CommandKind::TurnOff => "turnOff",
            CommandKind::SetColor(_) => "setColor",
            CommandKind::SetBrightness(_) => "setBrightness",
            CommandKind::Custom { .. } => "custom",
        }
    }

    /// Build a command from its wire type and params object.
    ///
    /// # Examples
    ///
    /// ```
    /// use serde_json::json;
    /// use lumen_bridge::{Color, CommandKind};
    ///
    /// let kind = CommandKind::from_parts("setColor", &json!({"color": "#00FF00"})).unwrap();
    /// assert_eq!(kind, CommandKind::SetColor(Color::rgb(0, 255, 0)));
    ///
    /// assert!(CommandKind::from_parts("setBrightness", &json!({"brightness": "high"})).is_err());
    /// assert!(CommandKind::from_parts("strobe", &json!({})).is_err());
    /// ```
    pub fn from_parts(type_name: &str, params: &Value) -> Result<Self> {
        match type_name {
            "turnOn" => Ok(CommandKind::TurnOn),
            "turnOff" => Ok(CommandKind::TurnOff),
            "setColor" => {
                let color = params
                    .get("color")
                    .and_then(Value::as_str)
                    .ok_or_else(|| Error::invalid_parameter("color", "expected a hex string"))?;
                Ok(CommandKind::SetColor(Color::from_str(color)?))
            }
            "setBrightness" => params
                .get("brightness")
                .and_then(Value::as_i64)
                .map(CommandKind::SetBrightness)
                .ok_or_else(|| Error::invalid_parameter("brightness", "expected an integer")),
            "custom" => {
                let name = params
                    .get("name")
                    .and_then(Value::as_str)
                    .ok_or_else(|| Error::invalid_parameter("name", "custom command needs a name"))?;
                Ok(CommandKind::Custom {
                    name: name.to_string(),
                    params: params.get("params").cloned().unwrap_or(Value::Null),
                })
            }
            other => Err(Error::UnsupportedCommand(other.to_string())),
        }
    }

    /// The params object matching [`CommandKind::type_name`].
    pub fn params(&self) -> Value {
        match self {
            CommandKind::TurnOn | CommandKind::TurnOff => json!({}),
            CommandKind::SetColor(color) => json!({ "color": color.to_string() }),
            CommandKind::SetBrightness(brightness) => json!({ "brightness": brightness }),
            CommandKind::Custom { name, params } => json!({ "name": name, "params": params }),
        }
    }
}

impl From<PowerMode> for CommandKind {
    fn from(power: PowerMode) -> Self {
        match power {
            PowerMode::On => CommandKind::TurnOn,
            PowerMode::Off => CommandKind::TurnOff,
        }
    }
}

/// A command addressed to one device.
///
/// Serialized as `{"type": .., "deviceId": .., "params": {..}}`.
///
/// # Example
///
/// ```
/// use lumen_bridge::{CommandKind, LightCommand};
///
/// let cmd: LightCommand = serde_json::from_str(
///     r#"{"type": "setBrightness", "deviceId": "X", "params": {"brightness": 150}}"#,
/// ).unwrap();
/// assert_eq!(cmd.device_id(), "X");
/// assert_eq!(cmd.kind(), &CommandKind::SetBrightness(150));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCommand", into = "RawCommand")]
pub struct LightCommand {
    kind: CommandKind,
    device_id: String,
    timestamp: Option<DateTime<Utc>>,
    metadata: Option<Map<String, Value>>,
}

impl LightCommand {
    pub fn new(device_id: &str, kind: CommandKind) -> Self {
        LightCommand {
            kind,
            device_id: device_id.to_string(),
            timestamp: None,
            metadata: None,
        }
    }

    pub fn turn_on(device_id: &str) -> Self {
        Self::new(device_id, CommandKind::TurnOn)
    }

    pub fn turn_off(device_id: &str) -> Self {
        Self::new(device_id, CommandKind::TurnOff)
    }

    pub fn set_color(device_id: &str, color: Color) -> Self {
        Self::new(device_id, CommandKind::SetColor(color))
    }

    pub fn set_brightness(device_id: &str, brightness: i64) -> Self {
        Self::new(device_id, CommandKind::SetBrightness(brightness))
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn kind(&self) -> &CommandKind {
        &self.kind
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn timestamp(&self) -> Option<&DateTime<Utc>> {
        self.timestamp.as_ref()
    }

    pub fn metadata(&self) -> Option<&Map<String, Value>> {
        self.metadata.as_ref()
    }
}

/// A command without a target device, as carried by an effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTemplate", into = "RawTemplate")]
pub struct CommandTemplate {
    kind: CommandKind,
    metadata: Option<Map<String, Value>>,
}

impl CommandTemplate {
    pub fn new(kind: CommandKind) -> Self {
        CommandTemplate {
            kind,
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn kind(&self) -> &CommandKind {
        &self.kind
    }

    /// Address this command to a device.
    pub fn for_device(&self, device_id: &str) -> LightCommand {
        LightCommand {
            kind: self.kind.clone(),
            device_id: device_id.to_string(),
            timestamp: Some(Utc::now()),
            metadata: self.metadata.clone(),
        }
    }
}

impl From<CommandKind> for CommandTemplate {
    fn from(kind: CommandKind) -> Self {
        CommandTemplate::new(kind)
    }
}

#[serde_with::skip_serializing_none]
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCommand {
    #[serde(rename = "type")]
    type_name: String,
    device_id: String,
    #[serde(default)]
    params: Value,
    timestamp: Option<DateTime<Utc>>,
    metadata: Option<Map<String, Value>>,
}

impl TryFrom<RawCommand> for LightCommand {
    type Error = Error;

    fn try_from(raw: RawCommand) -> Result<Self> {
        Ok(LightCommand {
            kind: CommandKind::from_parts(&raw.type_name, &raw.params)?,
            device_id: raw.device_id,
            timestamp: raw.timestamp,
            metadata: raw.metadata,
        })
    }
}

impl From<LightCommand> for RawCommand {
    fn from(cmd: LightCommand) -> Self {
        RawCommand {
            type_name: cmd.kind.type_name().to_string(),
            params: cmd.kind.params(),
            device_id: cmd.device_id,
            timestamp: cmd.timestamp,
            metadata: cmd.metadata,
        }
    }
}

#[serde_with::skip_serializing_none]
#[derive(Serialize, Deserialize)]
struct RawTemplate {
    #[serde(rename = "type")]
    type_name: String,
    #[serde(default)]
    params: Value,
    metadata: Option<Map<String, Value>>,
}

impl TryFrom<RawTemplate> for CommandTemplate {
    type Error = Error;

    fn try_from(raw: RawTemplate) -> Result<Self> {
        Ok(CommandTemplate {
            kind: CommandKind::from_parts(&raw.type_name, &raw.params)?,
            metadata: raw.metadata,
        })
    }
}

impl From<CommandTemplate> for RawTemplate {
    fn from(template: CommandTemplate) -> Self {
        RawTemplate {
            type_name: template.kind.type_name().to_string(),
            params: template.kind.params(),
            metadata: template.metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_light_command() {
        let cmd = LightCommand::set_color("lamp", Color::rgb(0, 255, 0));
        let value = serde_json::to_value(&cmd).unwrap();
        assert_eq!(
            value,
            json!({"type": "setColor", "deviceId": "lamp", "params": {"color": "#00FF00"}})
        );
    }

    #[test]
    fn test_template_rejects_bad_params() {
        let err = serde_json::from_value::<CommandTemplate>(
            json!({"type": "setColor", "params": {"color": "green"}}),
        );
        assert!(err.is_err());
    }

    #[test]
    fn test_template_targets_device() {
        let template: CommandTemplate =
            serde_json::from_value(json!({"type": "turnOff"})).unwrap();
        let cmd = template.for_device("strip");
        assert_eq!(cmd.device_id(), "strip");
        assert_eq!(cmd.kind(), &CommandKind::TurnOff);
        assert!(cmd.timestamp().is_some());
    }

    #[test]
    fn test_custom_command_params() {
        let kind = CommandKind::from_parts(
            "custom",
            &json!({"name": "scene", "params": {"id": 4}}),
        )
        .unwrap();
        assert_eq!(
            kind,
            CommandKind::Custom {
                name: "scene".into(),
                params: json!({"id": 4}),
            }
        );
        assert_eq!(CommandKind::from_parts(kind.type_name(), &kind.params()).unwrap(), kind);
    }
}

//! Devices as seen through an adapter.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum_macros::{Display, EnumIter, EnumString};

use crate::command::CommandKind;
use crate::types::{Brightness, Color, PowerMode};

/// Kind of hardware behind a device.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DeviceType {
    Light,
    Bulb,
    Strip,
    Switch,
    Plug,
    Other,
}

/// Vendor that manufactures a device.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Brand {
    Govee,
    PhilipsHue,
    Lifx,
    Wiz,
    Virtual,
    Other,
}

/// A controllable device as reported by the adapter that discovered it.
///
/// `id` is unique within the owning adapter. Brightness is a percentage and
/// color a `#RRGGBB` value; both are absent when the vendor did not report
/// them.
///
/// # Example
///
/// ```
/// use lumen_bridge::{Brand, Brightness, Color, Device};
///
/// let device = Device::new("desk", "Desk Lamp", Brand::Govee)
///     .with_color(Color::rgb(255, 255, 255))
///     .with_brightness(Brightness::clamped(80));
/// assert_eq!(device.snapshot().brightness.unwrap().value(), 80);
/// ```
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub device_type: DeviceType,
    pub brand: Brand,
    #[serde(default)]
    pub model: String,
    pub address: Option<String>,
    #[serde(default)]
    pub is_on: bool,
    pub brightness: Option<Brightness>,
    pub color: Option<Color>,
    #[serde(default = "default_reachable")]
    pub is_reachable: bool,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

fn default_reachable() -> bool {
    true
}

impl Device {
    pub fn new(id: &str, name: &str, brand: Brand) -> Self {
        Device {
            id: id.to_string(),
            name: name.to_string(),
            device_type: DeviceType::Light,
            brand,
            model: String::new(),
            address: None,
            is_on: false,
            brightness: None,
            color: None,
            is_reachable: true,
            metadata: Map::new(),
        }
    }

    pub fn with_type(mut self, device_type: DeviceType) -> Self {
        self.device_type = device_type;
        self
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn with_address(mut self, address: &str) -> Self {
        self.address = Some(address.to_string());
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_brightness(mut self, brightness: Brightness) -> Self {
        self.brightness = Some(brightness);
        self
    }

    pub fn with_power(mut self, on: bool) -> Self {
        self.is_on = on;
        self
    }

    pub fn power(&self) -> PowerMode {
        PowerMode::from(self.is_on)
    }

    /// Captures the restorable part of the device state.
    pub fn snapshot(&self) -> SavedState {
        SavedState {
            color: self.color,
            brightness: self.brightness,
        }
    }

    /// Optimistically folds a command into the cached state.
    ///
    /// Returns `false` for custom commands, which only the adapter understands.
    pub(crate) fn apply(&mut self, kind: &CommandKind) -> bool {
        match kind {
            CommandKind::TurnOn => self.is_on = true,
            CommandKind::TurnOff => self.is_on = false,
            CommandKind::SetColor(color) => {
                self.color = Some(*color);
                self.is_on = true;
            }
            CommandKind::SetBrightness(raw) => {
                self.brightness = Some(Brightness::clamped(*raw));
                self.is_on = true;
            }
            CommandKind::Custom { .. } => return false,
        }
        true
    }
}

/// The pre-effect state of a device, restored when an effect expires.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedState {
    pub color: Option<Color>,
    pub brightness: Option<Brightness>,
}

impl SavedState {
    pub fn is_empty(&self) -> bool {
        self.color.is_none() && self.brightness.is_none()
    }

    /// Commands that bring a device back to this state, one per field present.
    pub fn restore_commands(&self) -> Vec<CommandKind> {
        let mut commands = Vec::new();
        if let Some(color) = self.color {
            commands.push(CommandKind::SetColor(color));
        }
        if let Some(brightness) = self.brightness {
            commands.push(CommandKind::SetBrightness(i64::from(brightness.value())));
        }
        commands
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use serde_json::json;
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn test_apply_updates_cache() {
        let mut device = Device::new("a", "A", Brand::Virtual);
        assert!(device.apply(&CommandKind::SetBrightness(150)));
        assert_eq!(device.brightness, Some(Brightness::clamped(100)));
        assert!(device.is_on);

        assert!(device.apply(&CommandKind::from(PowerMode::Off)));
        assert_eq!(device.power(), PowerMode::Off);

        let custom = CommandKind::Custom {
            name: "scene".into(),
            params: Value::Null,
        };
        assert!(!device.apply(&custom));
    }

    #[test]
    fn test_restore_commands_only_present_fields() {
        let state = SavedState {
            color: Some(Color::rgb(255, 255, 255)),
            brightness: None,
        };
        assert_eq!(
            state.restore_commands(),
            vec![CommandKind::SetColor(Color::rgb(255, 255, 255))]
        );
        assert!(SavedState::default().restore_commands().is_empty());
    }

    #[test]
    fn test_device_json_shape() {
        let device = Device::new("h1", "Hall", Brand::PhilipsHue)
            .with_type(DeviceType::Bulb)
            .with_color(Color::rgb(0, 0, 255));
        let value = serde_json::to_value(&device).unwrap();
        assert_eq!(value["type"], json!("bulb"));
        assert_eq!(value["brand"], json!("philips_hue"));
        assert_eq!(value["color"], json!("#0000FF"));
        assert_eq!(value["isReachable"], json!(true));
        assert!(value.get("brightness").is_none());
    }

    #[test]
    fn test_brand_names_round_trip() {
        for brand in Brand::iter() {
            assert_eq!(Brand::from_str(&brand.to_string()).unwrap(), brand);
        }
    }
}

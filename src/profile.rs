//! Ambient environment profiles synced from an external source.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::command::{CommandKind, LightCommand};
use crate::types::{Brightness, Color};

/// Target lighting for a room or a single device.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LightingProfile {
    pub color: Color,
    pub brightness: Brightness,
    /// Vendor effect name, e.g. `breathe`.
    pub effect: Option<String>,
    pub effect_speed: Option<u8>,
    /// Transition time in milliseconds.
    pub transition: Option<u32>,
}

impl LightingProfile {
    pub fn new(color: Color, brightness: Brightness) -> Self {
        LightingProfile {
            color,
            brightness,
            effect: None,
            effect_speed: None,
            transition: None,
        }
    }

    /// The commands that put a device into this lighting.
    pub fn commands_for(&self, device_id: &str) -> Vec<LightCommand> {
        vec![
            LightCommand::new(device_id, CommandKind::SetColor(self.color)),
            LightCommand::new(
                device_id,
                CommandKind::SetBrightness(i64::from(self.brightness.value())),
            ),
        ]
    }
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoundProfile {
    pub volume: u8,
    pub ambient_track: Option<String>,
    #[serde(default)]
    pub spatial: bool,
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoodProfile {
    pub primary: String,
    pub secondary: Option<String>,
    pub intensity: f64,
    pub timestamp: Option<DateTime<Utc>>,
}

/// A user's ambient target state: lighting, sound and mood.
///
/// Profiles are replaced wholesale on each sync; see [`EnvironmentProfile::supersedes`].
///
/// # Example
///
/// ```
/// use lumen_bridge::EnvironmentProfile;
///
/// let profile: EnvironmentProfile = serde_json::from_str(r##"{
///     "id": "p1", "userId": "u1", "name": "Evening", "active": true,
///     "lighting": {"color": "#FF8800", "brightness": 40},
///     "mood": {"primary": "calm", "intensity": 0.4},
///     "deviceOverrides": {"desk": {"color": "#FFFFFF", "brightness": 90}},
///     "createdAt": "2024-05-01T18:00:00Z", "updatedAt": "2024-05-01T18:00:00Z"
/// }"##).unwrap();
///
/// assert_eq!(profile.lighting_for("desk").brightness.value(), 90);
/// assert_eq!(profile.lighting_for("shelf").brightness.value(), 40);
/// ```
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentProfile {
    pub id: String,
    pub user_id: String,
    pub name: String,
    #[serde(default)]
    pub active: bool,
    pub lighting: LightingProfile,
    pub sound: Option<SoundProfile>,
    pub mood: MoodProfile,
    pub active_ritual: Option<String>,
    pub device_overrides: Option<HashMap<String, LightingProfile>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EnvironmentProfile {
    /// Lighting for one device, honoring per-device overrides.
    pub fn lighting_for(&self, device_id: &str) -> &LightingProfile {
        self.device_overrides
            .as_ref()
            .and_then(|overrides| overrides.get(device_id))
            .unwrap_or(&self.lighting)
    }

    /// `true` when this profile should replace `current`: it is a different
    /// profile, or a newer revision of the same one.
    pub fn supersedes(&self, current: &EnvironmentProfile) -> bool {
        self.id != current.id || self.updated_at > current.updated_at
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    fn profile(id: &str, updated_secs: i64) -> EnvironmentProfile {
        let at = Utc.timestamp_opt(updated_secs, 0).unwrap();
        EnvironmentProfile {
            id: id.to_string(),
            user_id: "u1".into(),
            name: "Test".into(),
            active: true,
            lighting: LightingProfile::new(Color::rgb(10, 20, 30), Brightness::clamped(50)),
            sound: None,
            mood: MoodProfile {
                primary: "focused".into(),
                secondary: None,
                intensity: 0.5,
                timestamp: None,
            },
            active_ritual: None,
            device_overrides: None,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn test_supersedes() {
        let current = profile("a", 100);
        assert!(!profile("a", 100).supersedes(&current));
        assert!(!profile("a", 50).supersedes(&current));
        assert!(profile("a", 101).supersedes(&current));
        assert!(profile("b", 50).supersedes(&current));
    }

    #[test]
    fn test_commands_for_device() {
        let lighting = LightingProfile::new(Color::rgb(255, 136, 0), Brightness::clamped(40));
        let kinds: Vec<_> = lighting
            .commands_for("x")
            .into_iter()
            .map(|c| c.kind().clone())
            .collect();
        assert_eq!(
            kinds,
            vec![
                CommandKind::SetColor(Color::rgb(255, 136, 0)),
                CommandKind::SetBrightness(40)
            ]
        );
    }

    #[test]
    fn test_serializes_camel_case() {
        let mut p = profile("a", 0);
        p.sound = Some(SoundProfile {
            volume: 30,
            ambient_track: Some("rain".into()),
            spatial: true,
        });
        let value = serde_json::to_value(&p).unwrap();
        assert_eq!(value["userId"], json!("u1"));
        assert_eq!(value["lighting"]["color"], json!("#0A141E"));
        assert_eq!(value["sound"]["ambientTrack"], json!("rain"));
        assert!(value.get("deviceOverrides").is_none());
    }
}

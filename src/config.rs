//! Engine configuration loaded from JSON.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::command::CommandTemplate;
use crate::effect::{Condition, Effect};
use crate::errors::Error;
use crate::manager::LightManager;
use crate::profile::LightingProfile;
use crate::sync::SyncSettings;
use crate::types::Color;

type Result<T> = std::result::Result<T, Error>;

/// An effect as written in configuration.
///
/// `durationMs` (or `duration`) is in milliseconds; absent or zero makes the
/// effect permanent.
#[serde_with::skip_serializing_none]
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct EffectConfig {
    pub event_type: String,
    pub command: CommandTemplate,
    #[serde(default)]
    pub priority: i32,
    #[serde(default, alias = "duration")]
    pub duration_ms: Option<u64>,
    #[serde(default)]
    pub restore_previous_state: bool,
    #[serde(default)]
    pub condition: Option<Condition>,
}

impl From<EffectConfig> for Effect {
    fn from(config: EffectConfig) -> Self {
        Effect {
            event_type: config.event_type,
            command: config.command,
            condition: config.condition,
            priority: config.priority,
            duration: config.duration_ms.map(Duration::from_millis),
            restore_previous_state: config.restore_previous_state,
        }
    }
}

/// Everything needed to assemble a manager, engine and profile sync.
///
/// Missing fields take their defaults.
///
/// # Example
///
/// ```
/// use lumen_bridge::EngineConfig;
///
/// let config = EngineConfig::from_json_str(r##"{
///     "commandTimeoutMs": 2000,
///     "effects": [{
///         "eventType": "match:victory",
///         "command": {"type": "setColor", "params": {"color": "#00FF00"}},
///         "duration": 5000,
///         "priority": 10,
///         "restorePreviousState": true
///     }]
/// }"##).unwrap();
///
/// assert_eq!(config.sync_interval_ms, 30000);
/// assert_eq!(config.effects()[0].priority, 10);
/// ```
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    pub command_timeout_ms: u64,
    pub sync_interval_ms: u64,
    pub celebration_duration_ms: u64,
    pub game_lighting: LightingProfile,
    pub victory_color: Color,
    pub defeat_color: Color,
    pub effects: Vec<EffectConfig>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let sync = SyncSettings::default();
        EngineConfig {
            command_timeout_ms: LightManager::DEFAULT_TIMEOUT_MS,
            sync_interval_ms: sync.interval.as_millis() as u64,
            celebration_duration_ms: sync.celebration_duration.as_millis() as u64,
            game_lighting: sync.game_lighting,
            victory_color: sync.victory_color,
            defeat_color: sync.defeat_color,
            effects: Vec::new(),
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: EngineConfig =
            serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_value(value: Value) -> Result<Self> {
        let config: EngineConfig =
            serde_json::from_value(value).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(Error::JsonDump)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }

    pub fn sync_settings(&self) -> SyncSettings {
        SyncSettings {
            interval: Duration::from_millis(self.sync_interval_ms),
            celebration_duration: Duration::from_millis(self.celebration_duration_ms),
            game_lighting: self.game_lighting.clone(),
            victory_color: self.victory_color,
            defeat_color: self.defeat_color,
        }
    }

    /// The configured effects, ready to register.
    pub fn effects(&self) -> Vec<Effect> {
        self.effects.iter().cloned().map(Effect::from).collect()
    }

    /// An empty manager using the configured command timeout.
    pub fn light_manager(&self) -> LightManager {
        LightManager::new().with_timeout(self.command_timeout())
    }

    fn validate(&self) -> Result<()> {
        if self.command_timeout_ms == 0 {
            return Err(Error::Config("commandTimeoutMs must be positive".into()));
        }
        if self.sync_interval_ms == 0 {
            return Err(Error::Config("syncIntervalMs must be positive".into()));
        }
        if let Some(pos) = self.effects.iter().position(|e| e.event_type.is_empty()) {
            return Err(Error::Config(format!("effects[{}] has an empty eventType", pos)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::command::CommandKind;
    use crate::event::GameEvent;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::from_json_str("{}").unwrap();
        assert_eq!(config.command_timeout_ms, 5000);
        assert_eq!(config.sync_interval_ms, 30000);
        assert_eq!(config.celebration_duration_ms, 5000);
        assert_eq!(config.victory_color, Color::rgb(0, 255, 0));
        assert_eq!(config.defeat_color, Color::rgb(255, 0, 0));
        assert!(config.effects.is_empty());
    }

    #[test]
    fn test_effect_with_condition() {
        let config = EngineConfig::from_json_value(json!({
            "effects": [{
                "eventType": "player:kill",
                "command": {"type": "setBrightness", "params": {"brightness": 100}},
                "durationMs": 1500,
                "condition": {"kind": "dataEquals", "pointer": "/streak", "value": 5}
            }]
        }))
        .unwrap();

        let effect = config.effects().remove(0);
        assert_eq!(effect.command.kind(), &CommandKind::SetBrightness(100));
        assert_eq!(effect.duration, Some(Duration::from_millis(1500)));
        assert!(!effect.restore_previous_state);
        assert!(effect.applies_to(&GameEvent::new("player:kill").with_data(json!({"streak": 5}))));
        assert!(!effect.applies_to(&GameEvent::new("player:kill")));
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            EngineConfig::from_json_str(r#"{"commandTimeoutMs": 0}"#),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            EngineConfig::from_json_str(r#"{"victoryColor": "green"}"#),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            EngineConfig::from_json_value(json!({
                "effects": [{"eventType": "", "command": {"type": "turnOn"}}]
            })),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            EngineConfig::from_json_value(json!({
                "gameLighting": {"color": "#101010", "brightness": 150}
            })),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_sync_settings() {
        let config = EngineConfig::from_json_value(json!({
            "syncIntervalMs": 1000,
            "gameLighting": {"color": "#101010", "brightness": 20}
        }))
        .unwrap();
        let settings = config.sync_settings();
        assert_eq!(settings.interval, Duration::from_secs(1));
        assert_eq!(settings.game_lighting.color, Color::rgb(16, 16, 16));
        assert!(config.to_json_string().unwrap().contains("\"syncIntervalMs\": 1000"));
    }
}

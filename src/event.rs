//! Game and application events that drive lighting effects.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use crate::errors::Error;

type Result<T> = std::result::Result<T, Error>;

/// Event types the bridge knows by name.
///
/// Effects may be registered for any event type string; these are the ones
/// the profile sync loop reacts to, plus the common player events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, EnumIter)]
pub enum EventKind {
    #[strum(serialize = "match:start")]
    MatchStart,
    #[strum(serialize = "match:end")]
    MatchEnd,
    #[strum(serialize = "match:victory")]
    MatchVictory,
    #[strum(serialize = "match:defeat")]
    MatchDefeat,
    #[strum(serialize = "player:join")]
    PlayerJoin,
    #[strum(serialize = "player:leave")]
    PlayerLeave,
    #[strum(serialize = "player:kill")]
    PlayerKill,
    #[strum(serialize = "player:death")]
    PlayerDeath,
}

/// An external event, e.g. from a game server.
///
/// # Example
///
/// ```
/// use lumen_bridge::{EventKind, GameEvent};
///
/// let event: GameEvent = serde_json::from_str(
///     r#"{"type": "match:victory", "playerId": "p1", "timestamp": "2024-05-01T12:00:00Z"}"#,
/// ).unwrap();
/// assert_eq!(event.kind(), Some(EventKind::MatchVictory));
/// assert_eq!(event.player_id.as_deref(), Some("p1"));
/// ```
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub player_id: Option<String>,
    pub match_id: Option<String>,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    pub data: Option<Value>,
}

impl GameEvent {
    pub fn new(event_type: &str) -> Self {
        GameEvent {
            event_type: event_type.to_string(),
            player_id: None,
            match_id: None,
            timestamp: Utc::now(),
            data: None,
        }
    }

    pub fn of(kind: EventKind) -> Self {
        Self::new(kind.as_ref())
    }

    pub fn with_player(mut self, player_id: &str) -> Self {
        self.player_id = Some(player_id.to_string());
        self
    }

    pub fn with_match(mut self, match_id: &str) -> Self {
        self.match_id = Some(match_id.to_string());
        self
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// The well-known kind of this event, if it is one.
    pub fn kind(&self) -> Option<EventKind> {
        EventKind::from_str(&self.event_type).ok()
    }

    /// Looks up a value inside `data` by JSON pointer (e.g. `/streak`).
    pub fn data_at(&self, pointer: &str) -> Option<&Value> {
        self.data.as_ref()?.pointer(pointer)
    }

    /// Parses an event from its JSON form.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(Error::JsonLoad)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(Error::JsonDump)
    }
}

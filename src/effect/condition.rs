//! Predicates deciding whether an effect applies to an event.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::event::GameEvent;

/// A caller-supplied predicate over events.
pub type Predicate = Arc<dyn Fn(&GameEvent) -> bool + Send + Sync>;

/// When an effect should fire for a matching event type.
///
/// Declarative variants can be loaded from configuration; [`Condition::Custom`]
/// wraps arbitrary code and is never serialized.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use lumen_bridge::{Condition, GameEvent};
///
/// let cond: Condition = serde_json::from_value(json!({
///     "kind": "all",
///     "conditions": [
///         {"kind": "playerIs", "playerId": "p1"},
///         {"kind": "dataEquals", "pointer": "/streak", "value": 3}
///     ]
/// })).unwrap();
///
/// let event = GameEvent::new("player:kill").with_player("p1").with_data(json!({"streak": 3}));
/// assert!(cond.matches(&event));
/// assert!(!cond.matches(&GameEvent::new("player:kill").with_player("p2")));
/// ```
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Condition {
    Always,
    PlayerIs { player_id: String },
    MatchIs { match_id: String },
    DataEquals { pointer: String, value: Value },
    DataExists { pointer: String },
    All { conditions: Vec<Condition> },
    Any { conditions: Vec<Condition> },
    Not { condition: Box<Condition> },
    #[serde(skip)]
    Custom(Predicate),
}

impl Condition {
    pub fn custom<F>(predicate: F) -> Self
    where
        F: Fn(&GameEvent) -> bool + Send + Sync + 'static,
    {
        Condition::Custom(Arc::new(predicate))
    }

    pub fn matches(&self, event: &GameEvent) -> bool {
        match self {
            Condition::Always => true,
            Condition::PlayerIs { player_id } => event.player_id.as_ref() == Some(player_id),
            Condition::MatchIs { match_id } => event.match_id.as_ref() == Some(match_id),
            Condition::DataEquals { pointer, value } => event.data_at(pointer) == Some(value),
            Condition::DataExists { pointer } => event.data_at(pointer).is_some(),
            Condition::All { conditions } => conditions.iter().all(|c| c.matches(event)),
            Condition::Any { conditions } => conditions.iter().any(|c| c.matches(event)),
            Condition::Not { condition } => !condition.matches(event),
            Condition::Custom(predicate) => predicate(event),
        }
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Always => write!(f, "Always"),
            Condition::PlayerIs { player_id } => write!(f, "PlayerIs({player_id})"),
            Condition::MatchIs { match_id } => write!(f, "MatchIs({match_id})"),
            Condition::DataEquals { pointer, value } => write!(f, "DataEquals({pointer} == {value})"),
            Condition::DataExists { pointer } => write!(f, "DataExists({pointer})"),
            Condition::All { conditions } => f.debug_tuple("All").field(conditions).finish(),
            Condition::Any { conditions } => f.debug_tuple("Any").field(conditions).finish(),
            Condition::Not { condition } => f.debug_tuple("Not").field(condition).finish(),
            Condition::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

//! Declarative lighting effects triggered by events.

mod condition;
mod registry;

pub use condition::{Condition, Predicate};
pub use registry::{EffectId, EffectRegistry};

use std::time::Duration;

use crate::command::CommandTemplate;
use crate::event::GameEvent;

/// Maps an event type to a lighting command.
///
/// Higher `priority` wins when several effects match the same event. A
/// `duration` of `None` or zero makes the effect permanent; otherwise, with
/// `restore_previous_state`, the device returns to its pre-effect color and
/// brightness once the duration elapses.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use lumen_bridge::{Color, CommandKind, Effect};
///
/// let effect = Effect::new("match:victory", CommandKind::SetColor(Color::rgb(0, 255, 0)))
///     .with_priority(10)
///     .with_duration(Duration::from_millis(5000))
///     .restoring();
/// assert!(effect.is_timed());
/// ```
#[derive(Debug, Clone)]
pub struct Effect {
    pub event_type: String,
    pub command: CommandTemplate,
    pub condition: Option<Condition>,
    pub priority: i32,
    pub duration: Option<Duration>,
    pub restore_previous_state: bool,
}

impl Effect {
    pub fn new(event_type: &str, command: impl Into<CommandTemplate>) -> Self {
        Effect {
            event_type: event_type.to_string(),
            command: command.into(),
            condition: None,
            priority: 0,
            duration: None,
            restore_previous_state: false,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn when(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    /// Restore the pre-effect state once the duration elapses.
    pub fn restoring(mut self) -> Self {
        self.restore_previous_state = true;
        self
    }

    /// `true` when the effect has a non-zero duration.
    pub fn is_timed(&self) -> bool {
        self.duration.is_some_and(|d| !d.is_zero())
    }

    /// `true` when the condition is absent or holds for the event.
    pub fn applies_to(&self, event: &GameEvent) -> bool {
        self.condition.as_ref().is_none_or(|c| c.matches(event))
    }
}

//! Effects keyed by event type, ordered by priority.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Effect;
use crate::errors::Error;
use crate::event::GameEvent;

type Result<T> = std::result::Result<T, Error>;

/// Opaque handle returned by [`EffectRegistry::add_effect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EffectId(Uuid);

impl EffectId {
    fn new() -> Self {
        EffectId(Uuid::new_v4())
    }
}

impl fmt::Display for EffectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone)]
struct RegisteredEffect {
    id: EffectId,
    effect: Effect,
}

/// Event type → effects, each list sorted by descending priority.
///
/// Sorting is stable, so effects of equal priority keep their registration
/// order.
///
/// # Example
///
/// ```
/// use lumen_bridge::{Color, CommandKind, Effect, EffectRegistry, GameEvent};
///
/// let mut registry = EffectRegistry::new();
/// let low = registry.add_effect(Effect::new("player:join", CommandKind::TurnOn));
/// let high = registry.add_effect(
///     Effect::new("player:join", CommandKind::SetColor(Color::rgb(0, 0, 255))).with_priority(5),
/// );
///
/// let (selected, _) = registry.select(&GameEvent::new("player:join")).unwrap();
/// assert_eq!(selected, high);
///
/// registry.remove_effect(high).unwrap();
/// assert_eq!(registry.select(&GameEvent::new("player:join")).unwrap().0, low);
/// ```
#[derive(Debug, Clone, Default)]
pub struct EffectRegistry {
    effects: HashMap<String, Vec<RegisteredEffect>>,
}

impl EffectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an effect and returns its handle.
    pub fn add_effect(&mut self, effect: Effect) -> EffectId {
        let id = EffectId::new();
        let list = self.effects.entry(effect.event_type.clone()).or_default();
        list.push(RegisteredEffect { id, effect });
        list.sort_by(|a, b| b.effect.priority.cmp(&a.effect.priority));
        id
    }

    /// Removes an effect by handle.
    pub fn remove_effect(&mut self, id: EffectId) -> Result<Effect> {
        let found = self.effects.iter().find_map(|(event_type, list)| {
            list.iter()
                .position(|r| r.id == id)
                .map(|pos| (event_type.clone(), pos))
        });
        found
            .and_then(|(event_type, pos)| self.remove_from(&event_type, pos))
            .map(|r| r.effect)
            .ok_or(Error::EffectNotFound(id.0))
    }

    /// Removes whatever sits at `index` in the current sorted list for
    /// `event_type`.
    ///
    /// Indices shift whenever effects are added; prefer
    /// [`EffectRegistry::remove_effect`].
    pub fn remove_effect_at(
        &mut self,
        event_type: &str,
        index: usize,
    ) -> Option<(EffectId, Effect)> {
        self.remove_from(event_type, index).map(|r| (r.id, r.effect))
    }

    pub fn get(&self, id: EffectId) -> Option<&Effect> {
        self.effects
            .values()
            .flatten()
            .find(|r| r.id == id)
            .map(|r| &r.effect)
    }

    /// Effects for an event type in selection order.
    pub fn effects_for(&self, event_type: &str) -> Vec<(EffectId, &Effect)> {
        self.effects
            .get(event_type)
            .map(|list| list.iter().map(|r| (r.id, &r.effect)).collect())
            .unwrap_or_default()
    }

    /// The first effect, by priority, whose condition holds for the event.
    pub fn select(&self, event: &GameEvent) -> Option<(EffectId, &Effect)> {
        self.effects
            .get(&event.event_type)?
            .iter()
            .find(|r| r.effect.applies_to(event))
            .map(|r| (r.id, &r.effect))
    }

    pub fn has_effects_for(&self, event_type: &str) -> bool {
        self.effects.contains_key(event_type)
    }

    pub fn event_types(&self) -> Vec<&str> {
        self.effects.keys().map(String::as_str).collect()
    }

    /// Total number of registered effects.
    pub fn len(&self) -> usize {
        self.effects.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    pub fn clear(&mut self) {
        self.effects.clear();
    }

    fn remove_from(&mut self, event_type: &str, index: usize) -> Option<RegisteredEffect> {
        let list = self.effects.get_mut(event_type)?;
        if index >= list.len() {
            return None;
        }
        let removed = list.remove(index);
        if list.is_empty() {
            self.effects.remove(event_type);
        }
        Some(removed)
    }
}

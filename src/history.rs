//! Command history tracking for debugging and diagnostics.

use std::collections::HashMap;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::command::LightCommand;

/// What happened to a recorded command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandOutcome {
    Executed,
    Rejected,
}

/// A recorded command in the history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub outcome: CommandOutcome,
    pub command: LightCommand,
    /// Seconds since history creation
    pub timestamp: f64,
}

/// Tracks the commands an adapter has received.
#[derive(Debug, Clone)]
pub struct CommandHistory {
    last_by_type: HashMap<CommandOutcome, HashMap<String, LightCommand>>,
    last_error: Option<String>,
    start_time: Instant,
    entries: Vec<HistoryEntry>,
    max_entries: usize,
}

impl Default for CommandHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandHistory {
    pub const DEFAULT_MAX_ENTRIES: usize = 100;

    pub fn new() -> Self {
        Self {
            last_by_type: HashMap::from([
                (CommandOutcome::Executed, HashMap::new()),
                (CommandOutcome::Rejected, HashMap::new()),
            ]),
            last_error: None,
            start_time: Instant::now(),
            entries: Vec::new(),
            max_entries: Self::DEFAULT_MAX_ENTRIES,
        }
    }

    pub fn with_max_entries(max_entries: usize) -> Self {
        Self {
            max_entries,
            ..Self::new()
        }
    }

    pub fn record(&mut self, outcome: CommandOutcome, command: &LightCommand) {
        let type_name = command.kind().type_name().to_string();
        if let Some(type_map) = self.last_by_type.get_mut(&outcome) {
            type_map.insert(type_name, command.clone());
        }

        self.entries.push(HistoryEntry {
            outcome,
            command: command.clone(),
            timestamp: self.start_time.elapsed().as_secs_f64(),
        });

        if self.entries.len() > self.max_entries {
            self.entries.remove(0);
        }
    }

    pub fn record_error(&mut self, error: &str) {
        self.last_error = Some(error.to_string());
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Commands that were executed, oldest first.
    pub fn executed(&self) -> impl Iterator<Item = &LightCommand> {
        self.entries
            .iter()
            .filter(|e| e.outcome == CommandOutcome::Executed)
            .map(|e| &e.command)
    }

    /// The most recent command of the given wire type with the given outcome.
    pub fn last_of_type(&self, outcome: CommandOutcome, type_name: &str) -> Option<&LightCommand> {
        self.last_by_type.get(&outcome)?.get(type_name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.last_by_type.values_mut().for_each(|m| m.clear());
        self.entries.clear();
        self.last_error = None;
    }

    pub fn summary(&self) -> HistorySummary {
        let count = |o: CommandOutcome| self.entries.iter().filter(|e| e.outcome == o).count();
        HistorySummary {
            executed_count: count(CommandOutcome::Executed),
            rejected_count: count(CommandOutcome::Rejected),
            total_entries: self.entries.len(),
            last_error: self.last_error.clone(),
        }
    }
}

/// Summary of command history for diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistorySummary {
    pub executed_count: usize,
    pub rejected_count: usize,
    pub total_entries: usize,
    pub last_error: Option<String>,
}

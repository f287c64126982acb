//! Records owned by the game state: quests, history, chronicle, statuses,
//! custom rules and memories.

use serde::{Deserialize, Serialize};

/// Quest lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum QuestStatus {
    #[default]
    Active,
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Objective {
    pub description: String,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: QuestStatus,
    #[serde(default)]
    pub objectives: Vec<Objective>,
}

impl Quest {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            status: QuestStatus::Active,
            objectives: Vec::new(),
        }
    }

    pub fn with_objective(mut self, description: impl Into<String>, completed: bool) -> Self {
        self.objectives.push(Objective {
            description: description.into(),
            completed,
        });
        self
    }

    pub fn with_status(mut self, status: QuestStatus) -> Self {
        self.status = status;
        self
    }

    pub fn is_active(&self) -> bool {
        self.status == QuestStatus::Active
    }

    pub fn open_objectives(&self) -> impl Iterator<Item = &Objective> {
        self.objectives.iter().filter(|o| !o.completed)
    }
}

/// Who produced a history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[serde(alias = "user")]
    Player,
    #[serde(alias = "assistant")]
    Model,
}

/// One turn of conversation history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: Role,
    pub text: String,
}

impl HistoryEntry {
    pub fn player(text: impl Into<String>) -> Self {
        Self {
            role: Role::Player,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            text: text.into(),
        }
    }
}

/// A single chronicle record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChronicleEntry {
    /// Turn the record was written at.
    #[serde(default)]
    pub turn: u32,
    pub text: String,
}

impl ChronicleEntry {
    pub fn new(turn: u32, text: impl Into<String>) -> Self {
        Self {
            turn,
            text: text.into(),
        }
    }
}

/// Bookkeeping for chronicle compression.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChronicleStats {
    /// How many times turn records have been compressed.
    pub compression_count: u32,
    /// Turn number of the latest compression.
    pub last_compression_turn: Option<u32>,
}

/// Three-tier long-term memory: memoir > chapter > turn.
///
/// Append-only from the assembler's point of view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Chronicle {
    pub memoir: Vec<ChronicleEntry>,
    pub chapter: Vec<ChronicleEntry>,
    pub turn: Vec<ChronicleEntry>,
    pub stats: ChronicleStats,
}

impl Chronicle {
    /// The last `count` memoir entries, oldest first.
    pub fn latest_memoirs(&self, count: usize) -> &[ChronicleEntry] {
        tail(&self.memoir, count)
    }

    /// The last `count` chapter entries, oldest first.
    pub fn latest_chapters(&self, count: usize) -> &[ChronicleEntry] {
        tail(&self.chapter, count)
    }

    pub fn is_empty(&self) -> bool {
        self.memoir.is_empty() && self.chapter.is_empty() && self.turn.is_empty()
    }
}

fn tail<T>(items: &[T], count: usize) -> &[T] {
    &items[items.len().saturating_sub(count)..]
}

/// A status effect currently applied to a named entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveStatus {
    pub name: String,
    /// Name of the affected entity.
    pub owner: String,
    #[serde(default)]
    pub description: String,
    /// `None` = until removed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining_turns: Option<u32>,
}

impl ActiveStatus {
    pub fn new(name: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            owner: owner.into(),
            description: String::new(),
            remaining_turns: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.remaining_turns != Some(0)
    }
}

/// A player-authored world rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomRule {
    pub text: String,
    #[serde(default = "default_true")]
    pub active: bool,
}

impl CustomRule {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            active: true,
        }
    }
}

/// A long-term memory note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Memory {
    pub text: String,
    #[serde(default)]
    pub pinned: bool,
}

impl Memory {
    pub fn pinned(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            pinned: true,
        }
    }
}

fn default_true() -> bool {
    true
}

//! Character details shared by player characters, NPCs and companions.

use serde::{Deserialize, Serialize};

/// Everything a character carries beyond the shared entity base.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CharacterDetails {
    /// Name of the location the character is currently at.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skills: Vec<String>,

    /// Current relationship to the player character.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relationship: Option<String>,

    /// Power tier / cultivation realm label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub realm: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub motivation: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub personality: Option<String>,
}

impl CharacterDetails {
    /// The first `count` skills, in their stored order.
    pub fn top_skills(&self, count: usize) -> &[String] {
        &self.skills[..self.skills.len().min(count)]
    }

    /// Personality cut to at most `max_chars` characters.
    pub fn personality_snippet(&self, max_chars: usize) -> Option<String> {
        let personality = self.personality.as_deref()?.trim();
        if personality.is_empty() {
            return None;
        }
        if personality.chars().count() <= max_chars {
            return Some(personality.to_string());
        }
        let cut: String = personality.chars().take(max_chars).collect();
        Some(format!("{}…", cut.trim_end()))
    }
}

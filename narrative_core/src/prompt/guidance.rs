//! Choice guidance and output instructions appended after the player action.

use world_model::GameState;

use crate::config::PromptConfig;
use crate::intent::{ActionIntent, IntentKind};

pub const GUIDANCE_HEADER: &str = "## CHOICE GUIDANCE";
pub const OUTPUT_HEADER: &str = "## OUTPUT FORMAT";

/// Recent choices listed as "do not repeat".
const RECENT_CHOICES: usize = 5;

/// Guidance for the choices the model offers at the end of its turn.
pub fn choice_guidance(state: &GameState, intent: &ActionIntent, config: &PromptConfig) -> String {
    let mut lines = vec![
        GUIDANCE_HEADER.to_string(),
        format!(
            "Offer {} distinct choices for what the player does next.",
            config.choice_count
        ),
    ];

    let recent = &state.recent_choices[state.recent_choices.len().saturating_sub(RECENT_CHOICES)..];
    if !recent.is_empty() {
        lines.push("Do not repeat or closely rephrase these recent choices:".to_string());
        lines.extend(recent.iter().map(|choice| format!("- {}", choice.trim())));
    }

    lines.push(situational(intent.kind).to_string());
    if !intent.targets.is_empty() {
        lines.push(format!("Keep the focus on: {}.", intent.targets.join(", ")));
    }

    let player = state.player_character();
    let companions: Vec<&str> = state
        .party_members()
        .filter(|member| player.map_or(true, |pc| pc.name != member.name))
        .map(|member| member.name.as_str())
        .collect();
    if !companions.is_empty() {
        lines.push(format!(
            "Include at least one choice involving {}.",
            companions.join(", ")
        ));
    }

    if let Some(motivation) = player
        .and_then(|pc| pc.details.motivation())
        .map(str::trim)
        .filter(|m| !m.is_empty())
    {
        lines.push(format!(
            "At least one choice should move the player toward their goal: {motivation}"
        ));
    }

    lines.join("\n")
}

fn situational(kind: IntentKind) -> &'static str {
    match kind {
        IntentKind::Combat => {
            "The scene is a fight: offer a direct attack, a tactical or defensive move, and a way out."
        }
        IntentKind::SkillUse => "Offer choices that build on the skill just used or deal with its cost.",
        IntentKind::ItemUse => "Offer at least one choice that uses the item's effect in a new way.",
        IntentKind::Social => "Offer replies in different tones: friendly, cautious and deceptive.",
        IntentKind::Movement => {
            "Offer a choice to explore the new surroundings and one to keep travelling."
        }
        IntentKind::General => "Mix action, dialogue and exploration.",
    }
}

/// Fixed output-format and language instructions.
pub fn output_instructions(config: &PromptConfig) -> String {
    [
        OUTPUT_HEADER.to_string(),
        format!("Write the whole response in {}.", config.language),
        "Continue the story from the player's action. Do not restate the context above.".to_string(),
        format!(
            "End with exactly {} numbered choices, one per line.",
            config.choice_count
        ),
    ]
    .join("\n")
}

//! Prompt Builder - the single entry point from a player action to prompt text.
//!
//! Layout, top to bottom: rule changes, critical context, supplementary
//! retrieval, important context, background, world rules, the player action,
//! any extra instruction, choice guidance, output format. The result is then
//! checked against the soft and hard token limits.

mod guidance;
mod limits;

pub use guidance::*;
pub use limits::*;

use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};
use world_model::GameState;

use crate::config::PromptConfig;
use crate::context_assembler::ContextAssembler;
use crate::intent::IntentKind;
use crate::token::estimate_tokens;

pub const ACTION_HEADER: &str = "## PLAYER ACTION";
pub const RULE_CHANGE_HEADER: &str = "## RULE CHANGES";
pub const SUPPLEMENTARY_HEADER: &str = "## RETRIEVED CONTEXT";
pub const INSTRUCTION_HEADER: &str = "## ADDITIONAL INSTRUCTION";
pub const PLAYER_HEADER: &str = "## PLAYER CHARACTER";

/// Inputs for one prompt besides the game state.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptRequest<'r> {
    pub action: &'r str,
    /// Notes about rules the player changed since the last turn.
    pub rule_change_context: Option<&'r str>,
    pub extra_instruction: Option<&'r str>,
    /// Context retrieved by the caller, placed right after the critical tier.
    pub supplementary_context: Option<&'r str>,
}

impl<'r> PromptRequest<'r> {
    pub fn new(action: &'r str) -> Self {
        Self {
            action,
            ..Self::default()
        }
    }

    pub fn with_rule_change_context(mut self, context: &'r str) -> Self {
        self.rule_change_context = Some(context);
        self
    }

    pub fn with_extra_instruction(mut self, instruction: &'r str) -> Self {
        self.extra_instruction = Some(instruction);
        self
    }

    pub fn with_supplementary_context(mut self, context: &'r str) -> Self {
        self.supplementary_context = Some(context);
        self
    }
}

/// A finished prompt and how it was produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptOutput {
    pub prompt: String,
    pub status: LimitStatus,
    pub estimated_tokens: usize,
    /// `None` for the fallback prompt.
    pub intent: Option<IntentKind>,
}

impl PromptOutput {
    pub fn is_fallback(&self) -> bool {
        self.intent.is_none()
    }
}

/// Builds prompts with a fixed configuration.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    assembler: ContextAssembler,
}

impl PromptBuilder {
    pub fn new(config: PromptConfig) -> Self {
        Self {
            assembler: ContextAssembler::new(config),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(PromptConfig::default())
    }

    pub fn config(&self) -> &PromptConfig {
        self.assembler.config()
    }

    /// Build the prompt for `request`. A missing state yields the minimal
    /// fallback prompt.
    pub fn build(&self, request: &PromptRequest<'_>, state: Option<&GameState>) -> PromptOutput {
        let Some(state) = state else {
            warn!("no game state available; using fallback prompt");
            let prompt = self.fallback(request.action, None);
            return PromptOutput {
                estimated_tokens: estimate_tokens(&prompt),
                prompt,
                status: LimitStatus::WithinBudget,
                intent: None,
            };
        };

        let config = self.config();
        let supplementary = non_empty(request.supplementary_context);
        let supplementary_tokens = supplementary.map(estimate_tokens).unwrap_or(0);
        let context = self.assembler.assemble(request.action, state, supplementary_tokens);

        let mut blocks: Vec<String> = Vec::new();
        if let Some(rules) = non_empty(request.rule_change_context) {
            blocks.push(format!("{RULE_CHANGE_HEADER}\n{rules}"));
        }
        blocks.push(context.sections.critical.clone());
        if let Some(retrieved) = supplementary {
            blocks.push(format!("{SUPPLEMENTARY_HEADER}\n{retrieved}"));
        }
        blocks.push(context.sections.important.clone());
        blocks.push(context.sections.contextual.clone());
        blocks.push(context.sections.supplemental.clone());
        blocks.push(format!("{ACTION_HEADER}\n{}", request.action));
        if let Some(instruction) = non_empty(request.extra_instruction) {
            blocks.push(format!("{INSTRUCTION_HEADER}\n{instruction}"));
        }
        blocks.push(choice_guidance(state, &context.intent, config));
        blocks.push(output_instructions(config));

        let prompt = join_blocks(&blocks);
        let (prompt, status) = enforce_limits(prompt, request.action, config);
        let estimated_tokens = estimate_tokens(&prompt);

        info!(
            turn = state.turn,
            intent = context.intent.kind.label(),
            entities = context.relevance.len(),
            tokens = estimated_tokens,
            status = ?status,
            "built prompt"
        );

        PromptOutput {
            prompt,
            status,
            estimated_tokens,
            intent: Some(context.intent.kind),
        }
    }

    /// Minimal fixed-shape prompt: player character name, location, turn and
    /// the action.
    pub fn fallback(&self, action: &str, state: Option<&GameState>) -> String {
        let player = state.and_then(GameState::player_character);
        let name = player.map(|pc| pc.name.as_str()).unwrap_or("Unknown");
        let location = player
            .and_then(|pc| pc.details.location())
            .unwrap_or("Unknown");
        let turn = state.map(|s| s.turn).unwrap_or(0);

        join_blocks(&[
            format!("{PLAYER_HEADER}\nName: {name}\nLocation: {location}\nTurn: {turn}"),
            format!("{ACTION_HEADER}\n{action}"),
            output_instructions(self.config()),
        ])
    }
}

/// Build a prompt with the default configuration.
///
/// Never fails: without a state the minimal fallback prompt is returned.
pub fn build_prompt(
    action: &str,
    state: Option<&GameState>,
    rule_change_context: Option<&str>,
    extra_instruction: Option<&str>,
) -> String {
    let request = PromptRequest {
        action,
        rule_change_context,
        extra_instruction,
        supplementary_context: None,
    };
    PromptBuilder::with_defaults().build(&request, state).prompt
}

/// Build a prompt from a serialized game state.
///
/// The state is decoded leniently; if it cannot be read at all the fallback
/// prompt is returned.
pub fn build_prompt_from_json(
    action: &str,
    state_json: &str,
    rule_change_context: Option<&str>,
    extra_instruction: Option<&str>,
) -> String {
    match GameState::from_json_str_lenient(state_json) {
        Ok(state) => build_prompt(action, Some(&state), rule_change_context, extra_instruction),
        Err(e) => {
            warn!(error = %e, "unreadable game state; using fallback prompt");
            build_prompt(action, None, rule_change_context, extra_instruction)
        }
    }
}

/// Build a prompt from a game state the caller already holds as JSON.
pub fn build_prompt_from_value(
    action: &str,
    state: &Value,
    rule_change_context: Option<&str>,
    extra_instruction: Option<&str>,
) -> String {
    match GameState::from_json_lenient(state) {
        Ok(state) => build_prompt(action, Some(&state), rule_change_context, extra_instruction),
        Err(e) => {
            warn!(error = %e, "unusable game state; using fallback prompt");
            build_prompt(action, None, rule_change_context, extra_instruction)
        }
    }
}

fn non_empty(text: Option<&str>) -> Option<&str> {
    text.map(str::trim).filter(|t| !t.is_empty())
}

fn join_blocks(blocks: &[String]) -> String {
    blocks
        .iter()
        .map(|block| block.trim_end())
        .filter(|block| !block.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context_assembler::CRITICAL_HEADER;
    use world_model::{Entity, EntityKind};

    fn sample_state() -> GameState {
        let mut state = GameState::new();
        state.turn = 12;
        state.entities.insert(
            Entity::new("Lâm Phong", EntityKind::PlayerCharacter).with_location("Thanh Vân Trấn"),
        );
        state.entities.insert(Entity::new("Tiểu Bạch", EntityKind::Companion));
        state.party = vec!["Lâm Phong".into(), "Tiểu Bạch".into()];
        state
    }

    #[test]
    fn test_block_order() {
        let state = sample_state();
        let request = PromptRequest::new("đi dạo")
            .with_rule_change_context("Luật mới: không bay")
            .with_supplementary_context("Tư liệu tra cứu")
            .with_extra_instruction("Viết ngắn gọn");
        let output = PromptBuilder::with_defaults().build(&request, Some(&state));
        let prompt = &output.prompt;

        let order = [
            RULE_CHANGE_HEADER,
            CRITICAL_HEADER,
            SUPPLEMENTARY_HEADER,
            ACTION_HEADER,
            INSTRUCTION_HEADER,
            GUIDANCE_HEADER,
            OUTPUT_HEADER,
        ]
        .map(|header| prompt.find(header).unwrap());
        assert!(order.windows(2).all(|w| w[0] < w[1]), "{prompt}");
        assert_eq!(output.status, LimitStatus::WithinBudget);
        assert_eq!(output.intent, Some(IntentKind::Movement));
    }

    #[test]
    fn test_blank_optional_blocks_are_omitted() {
        let state = sample_state();
        let request = PromptRequest::new("ngắm trăng").with_rule_change_context("   ");
        let output = PromptBuilder::with_defaults().build(&request, Some(&state));

        assert!(!output.prompt.contains(RULE_CHANGE_HEADER));
        assert!(!output.prompt.contains(SUPPLEMENTARY_HEADER));
        assert!(!output.prompt.contains(INSTRUCTION_HEADER));
    }

    #[test]
    fn test_fallback_without_state() {
        let prompt = build_prompt("tấn công", None, None, None);
        assert!(prompt.contains("tấn công"));
        assert!(prompt.contains("Name: Unknown"));
        assert!(prompt.starts_with(PLAYER_HEADER));
    }

    #[test]
    fn test_builder_reports_fallback() {
        let builder = PromptBuilder::with_defaults();
        let output = builder.build(&PromptRequest::new("tấn công"), None);
        assert!(output.is_fallback());
        assert_eq!(output.status, LimitStatus::WithinBudget);

        let state = sample_state();
        assert!(!builder.build(&PromptRequest::new("tấn công"), Some(&state)).is_fallback());
    }

    #[test]
    fn test_fallback_uses_state_when_given() {
        let state = sample_state();
        let prompt = PromptBuilder::with_defaults().fallback("đi", Some(&state));
        assert!(prompt.contains("Name: Lâm Phong"));
        assert!(prompt.contains("Location: Thanh Vân Trấn"));
        assert!(prompt.contains("Turn: 12"));
    }

    #[test]
    fn test_from_json_falls_back_on_garbage() {
        let prompt = build_prompt_from_json("tấn công", "không phải json", None, None);
        assert!(prompt.starts_with(PLAYER_HEADER));
        assert!(prompt.contains("tấn công"));
    }

    #[test]
    fn test_from_value_falls_back_on_non_object() {
        let prompt = build_prompt_from_value("tấn công", &serde_json::json!(null), None, None);
        assert!(prompt.starts_with(PLAYER_HEADER));
        assert!(prompt.contains("tấn công"));
    }

    #[test]
    fn test_from_json_uses_decoded_state() {
        let json = r#"{
            "turn": 3,
            "party": ["Lâm Phong"],
            "entities": {"Lâm Phong": {"name": "Lâm Phong", "type": "pc"}}
        }"#;
        let prompt = build_prompt_from_json("ngắm trăng", json, None, None);
        assert!(prompt.contains("★ Lâm Phong"));
    }
}

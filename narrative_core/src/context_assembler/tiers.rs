//! Rendering of the four context tiers.
//!
//! Each builder writes into a [`Section`] that refuses lines once the tier
//! budget is spent, so a tier can never overrun its allocation.

use world_model::{Entity, EntityKind, GameState};

use super::EntityRelevance;
use crate::config::PromptConfig;
use crate::intent::{contains_phrase, tokenize};
use crate::token::{clip_chars, estimate_tokens, truncate_to_budget};

pub const CRITICAL_HEADER: &str = "## CRITICAL CONTEXT";
pub const IMPORTANT_HEADER: &str = "## IMPORTANT CONTEXT";
pub const CONTEXTUAL_HEADER: &str = "## BACKGROUND";
pub const SUPPLEMENTAL_HEADER: &str = "## WORLD RULES";

/// Characters kept from a companion's personality.
const PERSONALITY_SNIPPET: usize = 80;
/// Characters kept per entity in the important tier.
const BRIEF_SNIPPET: usize = 100;
/// Characters kept from the last player action and its outcome.
const EVENT_SNIPPET: usize = 200;
const TOP_SKILLS: usize = 3;

/// Words that make a custom rule apply regardless of who is in the scene.
const UNIVERSAL_RULE_WORDS: &[&str] = &["tất cả", "mọi", "phải", "always", "every", "must"];

/// Words marking a sentence as a significant event worth summarizing.
const EVENT_WORDS: &[&str] = &[
    "chết", "bị thương", "thắng", "thua", "phát hiện", "xuất hiện", "biến mất", "đột phá",
    "nhận được", "mất", "bỏ chạy", "died", "killed", "wounded", "won", "lost", "discovered",
    "appeared", "obtained", "fled",
];

/// Everything the tier builders read.
#[derive(Debug, Clone, Copy)]
pub struct TierInput<'s, 'a> {
    pub state: &'a GameState,
    pub relevance: &'s [EntityRelevance<'a>],
    pub config: &'s PromptConfig,
}

/// A budgeted block of prompt text.
struct Section {
    text: String,
    used: usize,
    budget: usize,
    items: usize,
}

impl Section {
    fn new(header: &str, budget: usize) -> Self {
        let text = format!("{header}\n");
        Self {
            used: estimate_tokens(&text),
            text,
            budget,
            items: 0,
        }
    }

    fn remaining(&self) -> usize {
        self.budget.saturating_sub(self.used)
    }

    /// Line cost including its newline.
    fn cost(line: &str) -> usize {
        estimate_tokens(line) + 2
    }

    fn push(&mut self, line: &str) -> bool {
        let cost = Self::cost(line);
        if line.is_empty() || self.used + cost > self.budget {
            return false;
        }
        self.text.push_str(line);
        self.text.push('\n');
        self.used += cost;
        self.items += 1;
        true
    }

    /// Push `line`, truncated to at most `cap` tokens and to what is left.
    fn push_within(&mut self, line: &str, cap: usize) -> bool {
        let limit = cap.min(self.remaining()).saturating_sub(2);
        let fitted = truncate_to_budget(line, limit);
        self.push(&fitted)
    }

    /// Push lines under a `### title`; the title only appears if at least
    /// one line fits with it. Lines that do not fit are skipped.
    fn push_group(&mut self, title: &str, lines: impl IntoIterator<Item = String>) {
        let title = format!("### {title}");
        let mut titled = false;
        for line in lines {
            if !titled {
                if self.used + Self::cost(&title) + Self::cost(&line) > self.budget {
                    continue;
                }
                self.push_title(&title);
                titled = true;
            }
            self.push(&line);
        }
    }

    /// Push `line` under a `### title`, truncated to what the title leaves.
    /// Neither is written unless the line fits.
    fn push_titled(&mut self, title: &str, line: &str) -> bool {
        let title = format!("### {title}");
        let title_cost = Self::cost(&title);
        let limit = self.remaining().saturating_sub(title_cost + 2);
        let fitted = truncate_to_budget(line, limit);
        if fitted.is_empty() || self.used + title_cost + Self::cost(&fitted) > self.budget {
            return false;
        }
        self.push_title(&title);
        self.push(&fitted)
    }

    fn push_title(&mut self, title: &str) {
        self.text.push_str(title);
        self.text.push('\n');
        self.used += Self::cost(title);
    }

    fn finish(self) -> String {
        if self.items == 0 {
            String::new()
        } else {
            self.text
        }
    }
}

/// Critical tier: time, the party with full detail, then the highest-scoring
/// other entities sharing what is left of the budget evenly.
pub fn critical_tier(input: &TierInput<'_, '_>, budget: usize) -> String {
    let TierInput { state, relevance, config } = *input;
    let mut section = Section::new(CRITICAL_HEADER, budget);

    section.push(&format!("Time: {} | Turn {}", state.time, state.turn));

    let player = state.player_character();
    let mut party: Vec<String> = Vec::new();
    if let Some(pc) = player {
        party.push(render_player(pc, state));
    }
    party.extend(
        state
            .party_members()
            .filter(|member| player.map_or(true, |pc| pc.name != member.name))
            .map(|member| render_companion(member, state)),
    );
    section.push_group("Party", party);

    let key: Vec<&EntityRelevance<'_>> = relevance
        .iter()
        .filter(|r| !r.party_member && r.score >= config.critical_score)
        .filter(|r| player.map_or(true, |pc| pc.name != r.entity.name))
        .collect();
    if !key.is_empty() {
        let title = "### Key Entities";
        let share = section.remaining().saturating_sub(Section::cost(title)) / key.len();
        let lines = key
            .iter()
            .map(|r| truncate_to_budget(&render_detailed(r.entity, state, config), share.saturating_sub(2)).into_owned())
            .filter(|line| !line.is_empty());
        section.push_group("Key Entities", lines);
    }

    section.finish()
}

/// Important tier: active quests, a summary of the last exchange, and brief
/// entries for moderately relevant entities.
pub fn important_tier(input: &TierInput<'_, '_>, budget: usize) -> String {
    let TierInput { state, relevance, config } = *input;
    let mut section = Section::new(IMPORTANT_HEADER, budget);

    let quests = state.active_quests().map(|quest| {
        let open: Vec<&str> = quest.open_objectives().map(|o| o.description.as_str()).collect();
        if !open.is_empty() {
            format!("- {}: {}", quest.title, open.join("; "))
        } else if !quest.description.is_empty() {
            format!("- {}: {}", quest.title, quest.description)
        } else {
            format!("- {}", quest.title)
        }
    });
    section.push_group("Active Quests", quests);

    let mut events = Vec::new();
    if let Some(entry) = state.last_entry(world_model::Role::Player) {
        events.push(format!("Last action: {}", clip_chars(entry.text.trim(), EVENT_SNIPPET)));
    }
    if let Some(summary) = state
        .last_entry(world_model::Role::Model)
        .and_then(|entry| summarize_turn(&entry.text))
    {
        events.push(format!("Outcome: {summary}"));
    }
    section.push_group("Recent Events", events);

    let related = relevance
        .iter()
        .filter(|r| !r.party_member)
        .filter(|r| r.score >= config.important_score && r.score < config.critical_score)
        .map(|r| render_brief(r.entity));
    section.push_group("Related", related);

    section.finish()
}

/// Contextual tier: world premise, chronicle excerpts and the pinned memory.
pub fn contextual_tier(input: &TierInput<'_, '_>, budget: usize) -> String {
    let TierInput { state, config, .. } = *input;
    let mut section = Section::new(CONTEXTUAL_HEADER, budget);

    let world = &state.world;
    if !world.name.is_empty() || !world.description.is_empty() {
        let line = match (world.name.is_empty(), world.description.is_empty()) {
            (false, false) => format!("World: {}: {}", world.name, world.description),
            (false, true) => format!("World: {}", world.name),
            _ => format!("World: {}", world.description),
        };
        section.push_within(&line, budget / 3);
    }

    let chronicle = &state.chronicle;
    let mut excerpts: Vec<String> = chronicle
        .latest_memoirs(config.memoir_excerpt)
        .iter()
        .map(|m| format!("[Memoir, turn {}] {}", m.turn, m.text.trim()))
        .chain(
            chronicle
                .latest_chapters(config.chapter_excerpt)
                .iter()
                .map(|c| format!("[Chapter, turn {}] {}", c.turn, c.text.trim())),
        )
        .collect();
    let stats = chronicle.stats;
    if stats.compression_count > 0 {
        let latest = stats
            .last_compression_turn
            .map(|turn| format!(", latest at turn {turn}"))
            .unwrap_or_default();
        excerpts.push(format!("(compressed {} times{latest})", stats.compression_count));
    }
    section.push_group("Chronicle", excerpts);

    if let Some(memory) = state.pinned_memory() {
        section.push_titled("Pinned Memory", &format!("- {}", memory.text.trim()));
    }

    section.finish()
}

/// Supplemental tier: custom rules that concern the scene, or that are
/// phrased as universal.
pub fn supplemental_tier(input: &TierInput<'_, '_>, budget: usize) -> String {
    let TierInput { state, relevance, .. } = *input;
    let mut section = Section::new(SUPPLEMENTAL_HEADER, budget);

    let names: Vec<String> = relevance.iter().map(|r| r.entity.name.to_lowercase()).collect();
    for rule in state.active_rules() {
        if rule_applies(&rule.text, &names) {
            section.push(&format!("- {}", rule.text.trim()));
        }
    }

    section.finish()
}

/// Whether a custom rule should be shown given the relevant entity names
/// (lowercased).
pub fn rule_applies(rule: &str, relevant_names: &[String]) -> bool {
    let lower = rule.to_lowercase();
    if relevant_names.iter().any(|name| !name.is_empty() && lower.contains(name.as_str())) {
        return true;
    }
    let words = tokenize(rule);
    UNIVERSAL_RULE_WORDS.iter().any(|w| contains_phrase(&words, w))
}

/// One sentence standing for a whole model turn, preferring one that
/// reports a significant event.
pub fn summarize_turn(text: &str) -> Option<String> {
    let sentences: Vec<&str> = text
        .split_inclusive(|c: char| matches!(c, '.' | '!' | '?' | '…' | '\n'))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    let significant = sentences.iter().find(|sentence| {
        let words = tokenize(sentence);
        EVENT_WORDS.iter().any(|w| contains_phrase(&words, w))
    });

    significant
        .or(sentences.first())
        .map(|sentence| clip_chars(sentence, EVENT_SNIPPET).into_owned())
}

fn statuses(entity: &Entity, state: &GameState) -> Option<String> {
    let names: Vec<&str> = state.statuses_of(&entity.name).map(|s| s.name.as_str()).collect();
    (!names.is_empty()).then(|| names.join(", "))
}

fn push_field(parts: &mut Vec<String>, label: &str, value: Option<&str>) {
    if let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) {
        parts.push(format!("{label}: {value}"));
    }
}

fn render_player(pc: &Entity, state: &GameState) -> String {
    let details = &pc.details;
    let mut parts = vec![format!("★ {} [{}]", pc.name, pc.kind())];
    push_field(&mut parts, "Realm", details.realm());
    push_field(&mut parts, "Location", details.location());
    if !details.skills().is_empty() {
        parts.push(format!("Skills: {}", details.skills().join(", ")));
    }
    push_field(&mut parts, "Status", statuses(pc, state).as_deref());

    let mut text = parts.join(" | ");
    if let Some(motivation) = details.motivation().filter(|m| !m.trim().is_empty()) {
        text.push_str(&format!("\n  MOTIVATION: {}", motivation.trim()));
    }
    if let Some(personality) = details.personality().filter(|p| !p.trim().is_empty()) {
        text.push_str(&format!("\n  Personality: {}", personality.trim()));
    }
    text
}

fn render_companion(member: &Entity, state: &GameState) -> String {
    let details = &member.details;
    let mut parts = vec![format!("- {} [{}]", member.name, member.kind())];
    push_field(&mut parts, "Relationship", details.relationship());
    push_field(&mut parts, "Realm", details.realm());
    if let Some(character) = details.character() {
        let top = character.top_skills(TOP_SKILLS);
        if !top.is_empty() {
            parts.push(format!("Skills: {}", top.join(", ")));
        }
        push_field(
            &mut parts,
            "Personality",
            character.personality_snippet(PERSONALITY_SNIPPET).as_deref(),
        );
    }
    push_field(&mut parts, "Status", statuses(member, state).as_deref());
    parts.join(" | ")
}

fn render_detailed(entity: &Entity, state: &GameState, config: &PromptConfig) -> String {
    let details = &entity.details;
    let mut parts = vec![format!("- {} [{}]", entity.name, entity.kind())];
    push_field(&mut parts, "Location", details.location());
    push_field(&mut parts, "Owner", details.owner());
    push_field(&mut parts, "Realm", details.realm());
    push_field(&mut parts, "Relationship", details.relationship());
    let top = &details.skills()[..details.skills().len().min(TOP_SKILLS)];
    if !top.is_empty() {
        parts.push(format!("Skills: {}", top.join(", ")));
    }
    push_field(&mut parts, "Status", statuses(entity, state).as_deref());

    let mut text = parts.join(" | ");
    let description = entity.description.trim();
    if !description.is_empty() {
        text.push_str(&format!("\n  {}", clip_chars(description, config.description_cap)));
    }
    text
}

fn render_brief(entity: &Entity) -> String {
    let description = entity.description.trim();
    let summary = if !description.is_empty() {
        clip_chars(description, BRIEF_SNIPPET).into_owned()
    } else if let Some(location) = entity.details.location() {
        format!("at {location}")
    } else if entity.kind() == EntityKind::Concept {
        String::new()
    } else {
        entity.kind().label().to_lowercase()
    };
    if summary.is_empty() {
        format!("- {} [{}]", entity.name, entity.kind())
    } else {
        format!("- {} [{}]: {summary}", entity.name, entity.kind())
    }
}

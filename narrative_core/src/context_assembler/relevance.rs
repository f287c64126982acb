//! Relevance scoring: how much each entity matters to the current action.

use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

use world_model::{Entity, EntityKind, GameState};

use crate::config::PromptConfig;
use crate::entity_graph::EntityGraph;
use crate::intent::{ActionIntent, IntentKind};

/// Points for each scoring signal.
const DIRECT_MENTION: u32 = 50;
const HISTORY_MENTION: u32 = 10;
const HISTORY_MENTION_CAP: u32 = 30;
const SAME_LOCATION: u32 = 20;
const SKILL_NAMED_IN_ACTION: u32 = 30;
const SKILL_MATCHES_INTENT: u32 = 15;
const ACTIVE_STATUS: u32 = 10;
const GRAPH_NEIGHBOR: u32 = 15;

/// Neighbors scoring above this pull their connections up.
const HOT_NEIGHBOR: u32 = 50;

const COMBAT_SKILL_WORDS: &[&str] = &[
    "kiếm", "đao", "quyền", "chưởng", "chỉ", "thương", "tiễn", "lôi", "hỏa", "lửa", "băng", "độc",
    "sword", "blade", "fist", "strike", "fire", "ice", "lightning", "poison",
];

const SOCIAL_SKILL_WORDS: &[&str] = &[
    "mị", "thuyết", "giao tiếp", "đàm phán", "ca", "hát", "nhiếp hồn",
    "charm", "persuade", "diplomacy", "negotiat", "song",
];

const EXPLORATION_SKILL_WORDS: &[&str] = &[
    "khinh công", "độn", "tốc", "ẩn", "dò", "truy", "thám", "thần thức",
    "speed", "stealth", "track", "scout", "sense",
];

/// One entity with its score and the signals that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityRelevance<'a> {
    pub entity: &'a Entity,
    pub score: u32,
    pub reasons: Vec<String>,
    pub party_member: bool,
}

impl<'a> EntityRelevance<'a> {
    fn new(entity: &'a Entity) -> Self {
        Self {
            entity,
            score: 0,
            reasons: Vec::new(),
            party_member: false,
        }
    }

    fn add(&mut self, points: u32, reason: impl Into<String>) {
        self.score += points;
        self.reasons.push(reason.into());
    }

    pub fn name(&self) -> &'a str {
        self.entity.name.as_str()
    }
}

/// Scores entities against a player action.
#[derive(Debug, Clone)]
pub struct RelevanceScorer {
    min_score: u32,
    party_score: u32,
    history_window: usize,
}

impl RelevanceScorer {
    pub fn new(config: &PromptConfig) -> Self {
        Self {
            min_score: config.min_relevance_score,
            party_score: config.party_score,
            history_window: config.history_window,
        }
    }

    /// Score every entity in `state` and return those worth including,
    /// highest score first.
    ///
    /// Party members always get the fixed party score and are never dropped.
    /// Everyone else is scored from the action text, recent history, the
    /// player's location, the action intent, skills, statuses and finally
    /// graph proximity to already-relevant entities.
    pub fn score<'a>(
        &self,
        action: &str,
        intent: &ActionIntent,
        state: &'a GameState,
        graph: &EntityGraph,
    ) -> Vec<EntityRelevance<'a>> {
        let action_lower = action.to_lowercase();
        let recent: Vec<String> = state
            .recent_history(self.history_window)
            .iter()
            .map(|entry| entry.text.to_lowercase())
            .collect();
        let player = state.player_character();
        let player_location = player
            .and_then(|pc| pc.details.location())
            .map(|loc| loc.trim().to_lowercase());

        let mut scored: Vec<EntityRelevance<'a>> = state
            .entities
            .iter()
            .filter(|entity| !entity.name.trim().is_empty())
            .map(|entity| {
                if state.is_party_member(&entity.name) {
                    return EntityRelevance {
                        entity,
                        score: self.party_score,
                        reasons: vec!["party member".to_string()],
                        party_member: true,
                    };
                }

                let mut relevance = EntityRelevance::new(entity);
                let name = entity.name.trim().to_lowercase();

                if action_lower.contains(&name) {
                    relevance.add(DIRECT_MENTION, "named in action");
                }

                let mentions: u32 = recent
                    .iter()
                    .map(|text| text.matches(name.as_str()).count() as u32)
                    .sum();
                if mentions > 0 {
                    relevance.add(
                        (mentions * HISTORY_MENTION).min(HISTORY_MENTION_CAP),
                        format!("mentioned {mentions}x recently"),
                    );
                }

                if let Some(here) = &player_location {
                    let is_player = player.is_some_and(|pc| pc.name == entity.name);
                    let located_here = entity
                        .details
                        .location()
                        .is_some_and(|loc| loc.trim().to_lowercase() == *here);
                    if !is_player && (located_here || name == *here) {
                        relevance.add(SAME_LOCATION, "at player's location");
                    }
                }

                let bonus = type_bonus(intent.kind, entity.kind());
                if bonus > 0 {
                    relevance.add(bonus, format!("{} fits {} action", entity.kind(), intent.kind.label()));
                }

                if entity.kind() == EntityKind::Companion {
                    score_companion_skills(&mut relevance, &action_lower, intent.kind);
                }

                if state.statuses_of(&entity.name).next().is_some() {
                    relevance.add(ACTIVE_STATUS, "under active status");
                }

                relevance
            })
            .collect();

        let hot: HashSet<&'a str> = scored
            .iter()
            .filter(|r| r.score > HOT_NEIGHBOR)
            .map(|r| r.name())
            .collect();
        for relevance in scored.iter_mut().filter(|r| !r.party_member) {
            let own = relevance.name();
            if let Some(neighbor) = graph.neighbors(own).find(|n| *n != own && hot.contains(*n)) {
                relevance.add(GRAPH_NEIGHBOR, format!("connected to {neighbor}"));
            }
        }

        let before = scored.len();
        scored.retain(|r| r.party_member || (r.score > 0 && r.score >= self.min_score));
        scored.sort_by(|a, b| b.score.cmp(&a.score));

        debug!(
            action_kind = intent.kind.label(),
            scored = before,
            kept = scored.len(),
            "scored entity relevance"
        );
        scored
    }
}

/// Bonus for an entity kind given the action intent.
pub fn type_bonus(intent: IntentKind, kind: EntityKind) -> u32 {
    use EntityKind::*;

    match (intent, kind) {
        (IntentKind::Combat, Companion) => 35,
        (IntentKind::Combat, Npc) => 20,
        (IntentKind::Combat, Item) => 15,
        (IntentKind::Combat, Skill) => 25,
        (IntentKind::Combat, StatusEffect) => 10,
        (IntentKind::Combat, Location) => 5,

        (IntentKind::Social, Companion) => 40,
        (IntentKind::Social, Npc) => 30,
        (IntentKind::Social, Faction) => 20,
        (IntentKind::Social, Location) => 5,

        (IntentKind::ItemUse, Item) => 40,
        (IntentKind::ItemUse, Skill) => 10,
        (IntentKind::ItemUse, Companion) => 10,

        (IntentKind::Movement, Location) => 40,
        (IntentKind::Movement, Companion) => 15,
        (IntentKind::Movement, Npc) => 10,
        (IntentKind::Movement, Faction) => 5,

        (IntentKind::SkillUse, Skill) => 40,
        (IntentKind::SkillUse, Companion) => 20,
        (IntentKind::SkillUse, StatusEffect) => 15,
        (IntentKind::SkillUse, Item) => 10,

        (IntentKind::General, Companion) => 8,
        (IntentKind::General, Npc) => 5,
        (IntentKind::General, Location) => 5,
        (IntentKind::General, Item) => 5,

        _ => 0,
    }
}

/// Companion skills: a skill named in the action is worth more than one that
/// merely suits the kind of action.
fn score_companion_skills(relevance: &mut EntityRelevance<'_>, action_lower: &str, intent: IntentKind) {
    let entity = relevance.entity;
    let skills = entity.details.skills();

    if let Some(skill) = skills.iter().find(|s| {
        let s = s.trim().to_lowercase();
        s.chars().count() >= 2 && action_lower.contains(&s)
    }) {
        let reason = format!("skill {skill} named in action");
        relevance.add(SKILL_NAMED_IN_ACTION, reason);
        return;
    }

    let words = match intent {
        IntentKind::Combat | IntentKind::SkillUse => COMBAT_SKILL_WORDS,
        IntentKind::Social => SOCIAL_SKILL_WORDS,
        IntentKind::Movement => EXPLORATION_SKILL_WORDS,
        IntentKind::ItemUse | IntentKind::General => return,
    };
    if let Some(skill) = skills.iter().find(|s| {
        let s = s.to_lowercase();
        words.iter().any(|w| s.contains(w))
    }) {
        let reason = format!("skill {skill} suits {} action", intent.label());
        relevance.add(SKILL_MATCHES_INTENT, reason);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::classify;
    use world_model::{ActiveStatus, HistoryEntry};

    fn sample_state() -> GameState {
        let mut state = GameState::new();
        for entity in [
            Entity::new("Lâm Phong", EntityKind::PlayerCharacter).with_location("Thanh Vân Trấn"),
            Entity::new("Tiểu Bạch", EntityKind::Companion)
                .with_location("Thanh Vân Trấn")
                .with_skills(["Hồ Hỏa", "Mị Thuật"]),
            Entity::new("Thanh Vân Trấn", EntityKind::Location),
            Entity::new("Rồng Lửa", EntityKind::Npc).with_location("Hỏa Diệm Sơn"),
            Entity::new("Hỏa Diệm Sơn", EntityKind::Location),
            Entity::new("Lão Ăn Mày", EntityKind::Npc).with_location("Vô Danh Cốc"),
            Entity::new("Bí Kíp Cũ", EntityKind::Concept),
        ] {
            state.entities.insert(entity);
        }
        state.party = vec!["Lâm Phong".into(), "Tiểu Bạch".into()];
        state
    }

    fn score<'a>(action: &str, state: &'a GameState) -> Vec<EntityRelevance<'a>> {
        let scorer = RelevanceScorer::new(&PromptConfig::default());
        let graph = EntityGraph::build(&state.entities);
        scorer.score(action, &classify(action), state, &graph)
    }

    fn find<'s, 'a>(scored: &'s [EntityRelevance<'a>], name: &str) -> Option<&'s EntityRelevance<'a>> {
        scored.iter().find(|r| r.name() == name)
    }

    #[test]
    fn test_party_members_fixed_score() {
        let state = sample_state();
        let scored = score("ngắm trăng", &state);

        for name in ["Lâm Phong", "Tiểu Bạch"] {
            let relevance = find(&scored, name).unwrap();
            assert_eq!(relevance.score, 100);
            assert!(relevance.party_member);
        }
    }

    #[test]
    fn test_direct_mention() {
        let state = sample_state();
        let scored = score("Tấn công Rồng Lửa", &state);

        let dragon = find(&scored, "Rồng Lửa").unwrap();
        assert!(dragon.score >= DIRECT_MENTION);
        assert!(dragon.reasons.iter().any(|r| r == "named in action"));
    }

    #[test]
    fn test_graph_neighbor_of_hot_entity() {
        let state = sample_state();
        let scored = score("Tấn công Rồng Lửa", &state);

        // Rồng Lửa: mention 50 + combat npc 20 = 70, so its location is pulled in.
        let lair = find(&scored, "Hỏa Diệm Sơn").unwrap();
        assert!(lair.reasons.iter().any(|r| r.contains("Rồng Lửa")));
        assert_eq!(lair.score, 5 + GRAPH_NEIGHBOR);
    }

    #[test]
    fn test_same_location_bonus() {
        let state = sample_state();
        let scored = score("ngắm trăng", &state);

        let town = find(&scored, "Thanh Vân Trấn").unwrap();
        // general location 5 + same location 20 + neighbor of party 15
        assert_eq!(town.score, 40);
    }

    #[test]
    fn test_nameless_entity_is_never_scored() {
        let mut state = sample_state();
        state.entities.insert(Entity::new("", EntityKind::Npc));
        state.entities.insert(Entity::new("   ", EntityKind::Npc));
        state.history.push(HistoryEntry::model("Trăng sáng vằng vặc."));

        let scored = score("ngắm trăng", &state);
        assert!(scored.iter().all(|r| !r.name().trim().is_empty()));
    }

    #[test]
    fn test_below_minimum_is_dropped() {
        let state = sample_state();
        let scored = score("ngắm trăng", &state);

        // general npc 5 < 10
        assert!(find(&scored, "Lão Ăn Mày").is_none());
        // concept scores nothing
        assert!(find(&scored, "Bí Kíp Cũ").is_none());
    }

    #[test]
    fn test_recent_mentions_capped() {
        let mut state = sample_state();
        state.history = vec![
            HistoryEntry::model("Lão Ăn Mày cười. Lão Ăn Mày ho."),
            HistoryEntry::player("hỏi Lão Ăn Mày"),
            HistoryEntry::model("Lão Ăn Mày im lặng."),
        ];
        let scored = score("ngắm trăng", &state);

        let beggar = find(&scored, "Lão Ăn Mày").unwrap();
        assert_eq!(beggar.score, HISTORY_MENTION_CAP + 5);
    }

    #[test]
    fn test_history_outside_window_ignored() {
        let mut state = sample_state();
        state.history = vec![
            HistoryEntry::model("Lão Ăn Mày đi qua."),
            HistoryEntry::player("a"),
            HistoryEntry::model("b"),
            HistoryEntry::player("c"),
        ];
        let scored = score("ngắm trăng", &state);
        assert!(find(&scored, "Lão Ăn Mày").is_none());
    }

    #[test]
    fn test_status_bonus() {
        let mut state = sample_state();
        state.statuses.push(ActiveStatus::new("Trúng Độc", "Lão Ăn Mày"));
        let scored = score("ngắm trăng", &state);

        assert_eq!(find(&scored, "Lão Ăn Mày").unwrap().score, 5 + ACTIVE_STATUS);
    }

    #[test]
    fn test_companion_skill_named_in_action_beats_keyword_match() {
        let state = sample_state();
        let entity = state.entities.get("Tiểu Bạch").unwrap();

        let mut named = EntityRelevance::new(entity);
        score_companion_skills(&mut named, "bảo tiểu bạch dùng hồ hỏa", IntentKind::Combat);
        assert_eq!(named.score, SKILL_NAMED_IN_ACTION);

        let mut suited = EntityRelevance::new(entity);
        score_companion_skills(&mut suited, "thuyết phục lính gác", IntentKind::Social);
        assert_eq!(suited.score, SKILL_MATCHES_INTENT);

        let mut none = EntityRelevance::new(entity);
        score_companion_skills(&mut none, "uống trà", IntentKind::ItemUse);
        assert_eq!(none.score, 0);
    }

    #[test]
    fn test_sorted_descending() {
        let state = sample_state();
        let scored = score("Tấn công Rồng Lửa", &state);
        assert!(scored.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_type_bonus_table() {
        assert_eq!(type_bonus(IntentKind::Combat, EntityKind::Companion), 35);
        assert_eq!(type_bonus(IntentKind::Social, EntityKind::Companion), 40);
        assert_eq!(type_bonus(IntentKind::Movement, EntityKind::Location), 40);
        assert_eq!(type_bonus(IntentKind::ItemUse, EntityKind::Item), 40);
        assert_eq!(type_bonus(IntentKind::SkillUse, EntityKind::Skill), 40);
        assert_eq!(type_bonus(IntentKind::General, EntityKind::Faction), 0);
    }
}

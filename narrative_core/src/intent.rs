//! Player action classification.
//!
//! Actions arrive as free text, mostly Vietnamese with the odd English
//! phrase. Matching is on whole words, so "đá" does not fire inside "đánh".
//! Compounds that only look like an action verb ("đánh giá", "đánh thức")
//! are masked out before the categories are tested.

use serde::Serialize;

/// The dominant kind of a player action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    Combat,
    SkillUse,
    ItemUse,
    Social,
    Movement,
    #[default]
    General,
}

impl IntentKind {
    pub fn label(&self) -> &'static str {
        match self {
            IntentKind::Combat => "combat",
            IntentKind::SkillUse => "skill use",
            IntentKind::ItemUse => "item use",
            IntentKind::Social => "social",
            IntentKind::Movement => "movement",
            IntentKind::General => "general",
        }
    }
}

/// Result of classifying one action.
///
/// Several flags can be set at once ("rút kiếm tấn công" is both item use and
/// combat); `kind` is the one that wins by priority.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ActionIntent {
    pub kind: IntentKind,
    pub is_combat: bool,
    pub is_skill_use: bool,
    pub is_item_use: bool,
    pub is_social: bool,
    pub is_movement: bool,
    /// Candidate target names: quoted spans and capitalized word runs.
    pub targets: Vec<String>,
    /// Lowercased content words, stop words removed.
    pub keywords: Vec<String>,
}

const COMBAT_PHRASES: &[&str] = &[
    "tấn công", "đánh", "chém", "đâm", "giết", "chiến đấu", "giao chiến", "phản công",
    "bắn", "đấm", "đá", "đỡ", "né", "phòng thủ", "xuất chiêu", "ám sát",
    "attack", "fight", "strike", "kill", "slash", "shoot", "defend", "dodge",
];

const SKILL_PHRASES: &[&str] = &[
    "sử dụng kỹ năng", "dùng kỹ năng", "thi triển", "vận công", "vận khí", "tu luyện",
    "niệm chú", "phóng", "triệu hồi", "bế quan", "đột phá",
    "cast", "use skill", "channel", "summon", "cultivate",
];

const ITEM_PHRASES: &[&str] = &[
    "dùng", "sử dụng", "uống", "ăn", "trang bị", "mặc", "rút", "nhặt", "lấy",
    "mở túi", "luyện đan", "đưa", "tặng",
    "use", "drink", "eat", "equip", "pick up", "give",
];

const SOCIAL_PHRASES: &[&str] = &[
    "nói", "hỏi", "trò chuyện", "nói chuyện", "thuyết phục", "thương lượng", "đàm phán",
    "chào", "cảm ơn", "xin", "an ủi", "dọa", "kể", "hứa", "cầu xin", "mời",
    "talk", "ask", "persuade", "negotiate", "greet", "convince", "threaten",
];

const MOVEMENT_PHRASES: &[&str] = &[
    "đi", "đến", "tới", "chạy", "rời", "rời khỏi", "quay về", "trở về", "tiến vào",
    "bước vào", "leo", "bay", "khám phá", "di chuyển", "lên đường", "vào",
    "go", "walk", "travel", "run", "enter", "leave", "explore", "climb",
];

/// Compounds whose first word is an action verb but whose meaning is not.
const NEUTRAL_PHRASES: &[&str] = &[
    "đánh giá", "đánh thức", "đánh dấu", "đánh rơi", "đánh mất", "đánh cược",
    "bắn tin", "đi kèm", "ăn mặc",
];

const STOP_WORDS: &[&str] = &[
    "và", "với", "của", "là", "thì", "mà", "cho", "để", "các", "những", "một", "này",
    "kia", "đó", "ta", "tôi", "mình", "hắn", "nó", "về", "vào", "ra", "lên", "xuống",
    "the", "a", "an", "and", "to", "of", "with", "at", "in", "on", "for", "my",
];

/// Classify a raw player action.
///
/// Priority when several categories match: combat, skill use, item use,
/// social, then movement. Nothing matching means [`IntentKind::General`].
pub fn classify(action: &str) -> ActionIntent {
    let words = tokenize(action);
    let verbs = mask_phrases(&words, NEUTRAL_PHRASES);

    let is_combat = matches_any(&verbs, COMBAT_PHRASES);
    let is_skill_use = matches_any(&verbs, SKILL_PHRASES);
    let is_item_use = matches_any(&verbs, ITEM_PHRASES);
    let is_social = matches_any(&verbs, SOCIAL_PHRASES);
    let is_movement = matches_any(&verbs, MOVEMENT_PHRASES);

    let kind = [
        (is_combat, IntentKind::Combat),
        (is_skill_use, IntentKind::SkillUse),
        (is_item_use, IntentKind::ItemUse),
        (is_social, IntentKind::Social),
        (is_movement, IntentKind::Movement),
    ]
    .into_iter()
    .find_map(|(hit, kind)| hit.then_some(kind))
    .unwrap_or_default();

    ActionIntent {
        kind,
        is_combat,
        is_skill_use,
        is_item_use,
        is_social,
        is_movement,
        targets: extract_targets(action),
        keywords: extract_keywords(&words),
    }
}

/// Lowercase `text` and split it into words on anything that is not a letter
/// or digit.
pub(crate) fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Whether `phrase` occurs in `words` as a run of whole words.
pub(crate) fn contains_phrase(words: &[String], phrase: &str) -> bool {
    let parts: Vec<&str> = phrase.split_whitespace().collect();
    if parts.is_empty() || parts.len() > words.len() {
        return false;
    }
    words
        .windows(parts.len())
        .any(|window| window.iter().zip(&parts).all(|(w, p)| w == p))
}

/// Blank out every word covered by one of `phrases`.
fn mask_phrases(words: &[String], phrases: &[&str]) -> Vec<String> {
    let mut masked = words.to_vec();
    for phrase in phrases {
        let parts: Vec<&str> = phrase.split_whitespace().collect();
        if parts.is_empty() || parts.len() > words.len() {
            continue;
        }
        for start in 0..=words.len() - parts.len() {
            let window = &words[start..start + parts.len()];
            if window.iter().zip(&parts).all(|(w, p)| w == p) {
                for word in &mut masked[start..start + parts.len()] {
                    word.clear();
                }
            }
        }
    }
    masked
}

fn matches_any(words: &[String], phrases: &[&str]) -> bool {
    phrases.iter().any(|phrase| contains_phrase(words, phrase))
}

fn extract_keywords(words: &[String]) -> Vec<String> {
    let mut keywords: Vec<String> = Vec::new();
    for word in words {
        if word.chars().count() < 2 || STOP_WORDS.contains(&word.as_str()) {
            continue;
        }
        if !keywords.contains(word) {
            keywords.push(word.clone());
        }
    }
    keywords
}

fn extract_targets(action: &str) -> Vec<String> {
    let mut targets = Vec::new();
    let mut push = |candidate: String| {
        if !candidate.is_empty() && !targets.contains(&candidate) {
            targets.push(candidate);
        }
    };

    for quoted in quoted_spans(action) {
        push(quoted);
    }

    for (run, sentence_start) in capitalized_runs(action) {
        if sentence_start {
            // The first word may just be a capitalized verb.
            if run.len() > 1 {
                push(run.join(" "));
                push(run[1..].join(" "));
            }
        } else {
            push(run.join(" "));
        }
    }

    targets
}

fn quoted_spans(text: &str) -> Vec<String> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut spans = Vec::new();
    let mut open: Option<(char, usize)> = None;

    for (pos, &(i, c)) in chars.iter().enumerate() {
        match open {
            None => {
                let opens = match c {
                    '"' | '“' | '«' | '‘' => true,
                    // Not an apostrophe: nothing word-like right before it.
                    '\'' => pos == 0 || !chars[pos - 1].1.is_alphanumeric(),
                    _ => false,
                };
                if opens {
                    open = Some((c, i + c.len_utf8()));
                }
            }
            Some((opener, start)) => {
                let closes = match (opener, c) {
                    ('"', '"') | ('“', '”') | ('«', '»') | ('‘', '’') => true,
                    ('\'', '\'') => chars.get(pos + 1).map_or(true, |&(_, next)| !next.is_alphanumeric()),
                    _ => false,
                };
                if closes {
                    let span = text[start..i].trim();
                    if !span.is_empty() {
                        spans.push(span.to_string());
                    }
                    open = None;
                }
            }
        }
    }
    spans
}

/// Runs of consecutive capitalized words, each flagged with whether it
/// begins a sentence.
fn capitalized_runs(text: &str) -> Vec<(Vec<String>, bool)> {
    let mut runs = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut current_starts_sentence = false;
    let mut at_sentence_start = true;

    for raw in text.split_whitespace() {
        let word = raw.trim_matches(|c: char| !c.is_alphanumeric());
        let capitalized = word.chars().next().is_some_and(char::is_uppercase);

        if capitalized {
            if current.is_empty() {
                current_starts_sentence = at_sentence_start;
            }
            current.push(word.to_string());
        } else if !current.is_empty() {
            runs.push((std::mem::take(&mut current), current_starts_sentence));
        }

        // Punctuation after a word ends both the run and, for terminators, the sentence.
        let trailing = raw.chars().last().filter(|c| !c.is_alphanumeric());
        if trailing.is_some() && !current.is_empty() {
            runs.push((std::mem::take(&mut current), current_starts_sentence));
        }
        at_sentence_start =
            matches!(trailing, Some('.' | '!' | '?' | '…')) || (word.is_empty() && at_sentence_start);
    }

    if !current.is_empty() {
        runs.push((current, current_starts_sentence));
    }
    runs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combat_with_target() {
        let intent = classify("Tấn công Rồng Lửa");
        assert_eq!(intent.kind, IntentKind::Combat);
        assert!(intent.is_combat);
        assert!(intent.targets.contains(&"Rồng Lửa".to_string()));
    }

    #[test]
    fn test_combat_outranks_item_use() {
        let intent = classify("rút kiếm tấn công tên cướp");
        assert!(intent.is_item_use);
        assert!(intent.is_combat);
        assert_eq!(intent.kind, IntentKind::Combat);
    }

    #[test]
    fn test_skill_outranks_item_and_social() {
        let intent = classify("thi triển Thiên Lôi Chưởng rồi nói với hắn");
        assert_eq!(intent.kind, IntentKind::SkillUse);
        assert!(intent.is_social);
        assert!(intent.targets.contains(&"Thiên Lôi Chưởng".to_string()));
    }

    #[test]
    fn test_social() {
        let intent = classify("hỏi Tiểu Bạch về ngọn núi");
        assert_eq!(intent.kind, IntentKind::Social);
        assert_eq!(intent.targets, vec!["Tiểu Bạch".to_string()]);
    }

    #[test]
    fn test_movement() {
        let intent = classify("đi đến Thanh Vân Trấn");
        assert_eq!(intent.kind, IntentKind::Movement);
        assert!(intent.is_movement);
        assert!(!intent.is_combat);
    }

    #[test]
    fn test_general_when_nothing_matches() {
        let intent = classify("ngắm trăng");
        assert_eq!(intent.kind, IntentKind::General);
        assert_eq!(intent.keywords, vec!["ngắm", "trăng"]);
    }

    #[test]
    fn test_whole_word_matching() {
        let words = tokenize("đánh giá tình hình");
        assert!(!contains_phrase(&words, "đá"));
        assert!(contains_phrase(&words, "đánh"));
        assert!(contains_phrase(&words, "tình hình"));
    }

    #[test]
    fn test_neutral_compounds_are_not_combat() {
        let intent = classify("đánh giá tình hình");
        assert!(!intent.is_combat);
        assert_eq!(intent.kind, IntentKind::General);
        assert!(intent.keywords.contains(&"đánh".to_string()));

        assert_eq!(classify("đánh thức Tiểu Bạch").kind, IntentKind::General);
        assert_eq!(classify("đánh giá rồi đánh tên cướp").kind, IntentKind::Combat);
    }

    #[test]
    fn test_english_phrases() {
        assert_eq!(classify("Attack the goblin").kind, IntentKind::Combat);
        assert_eq!(classify("walk to the gate").kind, IntentKind::Movement);
    }

    #[test]
    fn test_quoted_target() {
        let intent = classify("nói với \"lão già\" bán thuốc");
        assert!(intent.targets.contains(&"lão già".to_string()));
    }

    #[test]
    fn test_single_quoted_target() {
        let intent = classify("hỏi về 'thanh kiếm gãy' và ‘ngọn tháp’");
        assert!(intent.targets.contains(&"thanh kiếm gãy".to_string()));
        assert!(intent.targets.contains(&"ngọn tháp".to_string()));
    }

    #[test]
    fn test_apostrophes_do_not_open_quotes() {
        let intent = classify("ask the guard's captain about the king's sword");
        assert!(intent.targets.is_empty());
    }

    #[test]
    fn test_sentence_initial_name_kept_as_candidate() {
        let intent = classify("Tiểu Bạch tấn công");
        assert!(intent.targets.contains(&"Tiểu Bạch".to_string()));
    }

    #[test]
    fn test_lone_initial_capital_is_not_a_target() {
        assert!(classify("Chạy đi").targets.is_empty());
    }

    #[test]
    fn test_keywords_skip_stop_words() {
        let intent = classify("đi vào rừng với Tiểu Bạch");
        assert!(intent.keywords.contains(&"rừng".to_string()));
        assert!(!intent.keywords.contains(&"với".to_string()));
    }
}

//! Final size enforcement for assembled prompts.

use serde::Serialize;
use tracing::{error, warn};

use super::ACTION_HEADER;
use crate::config::PromptConfig;
use crate::context_assembler::CRITICAL_HEADER;
use crate::token::estimate_tokens;

/// How a prompt fared against the soft and hard limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitStatus {
    /// At or under the soft limit.
    WithinBudget,
    /// Over the soft limit but under the hard limit; sent as is.
    SoftOverflow,
    /// Over the hard limit; cut down to the core context and the action.
    EmergencyTruncated,
    /// Still over the hard limit after emergency truncation.
    Catastrophic,
}

/// Check `prompt` against the configured limits, truncating if needed.
pub fn enforce_limits(prompt: String, action: &str, config: &PromptConfig) -> (String, LimitStatus) {
    let tokens = estimate_tokens(&prompt);
    let soft_limit = config.base_limit();

    if tokens <= soft_limit {
        return (prompt, LimitStatus::WithinBudget);
    }
    if tokens <= config.hard_limit {
        warn!(tokens, soft_limit, "prompt over soft limit");
        return (prompt, LimitStatus::SoftOverflow);
    }

    let truncated = emergency_truncate(&prompt, action, config.hard_limit);
    let remaining = estimate_tokens(&truncated);
    if remaining > config.hard_limit {
        error!(
            tokens,
            remaining,
            hard_limit = config.hard_limit,
            "prompt still over hard limit after emergency truncation; token budgets are misconfigured"
        );
        return (truncated, LimitStatus::Catastrophic);
    }

    warn!(
        tokens,
        remaining,
        hard_limit = config.hard_limit,
        "prompt over hard limit; emergency truncation applied"
    );
    (truncated, LimitStatus::EmergencyTruncated)
}

/// Keep only the lines from the critical section up to the action marker,
/// stopping once `hard_limit` would be passed, then re-append the action.
///
/// Without a critical section the scan starts at the first line.
pub fn emergency_truncate(prompt: &str, action: &str, hard_limit: usize) -> String {
    let tail = format!("{ACTION_HEADER}\n{action}");
    let has_critical = prompt.lines().any(|line| line.starts_with(CRITICAL_HEADER));

    let mut kept = String::new();
    let mut used = estimate_tokens(&tail);
    let mut inside = !has_critical;

    for line in prompt.lines() {
        if line.starts_with(ACTION_HEADER) {
            break;
        }
        if line.starts_with(CRITICAL_HEADER) {
            inside = true;
        }
        if !inside {
            continue;
        }
        let cost = estimate_tokens(line) + 2;
        if used + cost > hard_limit {
            break;
        }
        kept.push_str(line);
        kept.push('\n');
        used += cost;
    }

    kept.push_str(&tail);
    kept
}

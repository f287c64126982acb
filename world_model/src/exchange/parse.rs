//! Payload parsers, tried in order until one succeeds.
//!
//! Saves and model output do not always arrive as clean JSON: they may be
//! wrapped in a fenced code block or surrounded by prose. Each parser is a
//! pure function; the first `Ok` wins.

use serde_json::Value;

use crate::error::ParseError;

/// A single parsing strategy.
pub type PayloadParser = fn(&str) -> Result<Value, ParseError>;

/// Strategies in the order they are attempted.
pub const PAYLOAD_PARSERS: &[(&str, PayloadParser)] = &[
    ("strict", parse_strict),
    ("fenced", parse_fenced_block),
    ("embedded", parse_embedded_object),
];

/// Run every parser in order and return the first success.
pub fn parse_payload(input: &str) -> Result<Value, ParseError> {
    if input.trim().is_empty() {
        return Err(ParseError::Empty);
    }

    let mut last = ParseError::Empty;
    for (_, parser) in PAYLOAD_PARSERS {
        match parser(input) {
            Ok(value) => return Ok(value),
            Err(e) => last = e,
        }
    }

    Err(ParseError::Exhausted {
        attempts: PAYLOAD_PARSERS.len(),
        last: Box::new(last),
    })
}

/// The whole input is JSON.
pub fn parse_strict(input: &str) -> Result<Value, ParseError> {
    serde_json::from_str(input.trim()).map_err(|e| ParseError::InvalidJson(e.to_string()))
}

/// The first ```-fenced block is JSON. A language tag after the fence is skipped.
pub fn parse_fenced_block(input: &str) -> Result<Value, ParseError> {
    let start = input.find("```").ok_or(ParseError::NoFencedBlock)?;
    let after_fence = &input[start + 3..];
    let body_start = after_fence.find('\n').map(|i| i + 1).unwrap_or(0);
    let body = &after_fence[body_start..];
    let end = body.find("```").ok_or(ParseError::NoFencedBlock)?;
    parse_strict(&body[..end])
}

/// The span from the first `{` to the last `}` is JSON.
pub fn parse_embedded_object(input: &str) -> Result<Value, ParseError> {
    let start = input.find('{').ok_or(ParseError::NoObject)?;
    let end = input.rfind('}').ok_or(ParseError::NoObject)?;
    if end < start {
        return Err(ParseError::NoObject);
    }
    parse_strict(&input[start..=end])
}

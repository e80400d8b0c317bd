//! Line-oriented parser for the Prometheus text exposition format.
//!
//! Two entry points cover the two consumers:
//!
//! - [`extract_counter`] scans for one named counter and returns its
//!   integer value. This is the hot path of the progress check.
//! - [`parse_samples`] converts the whole document into structured
//!   [`MetricSample`] values, preserving line order.
//!
//! Comment lines (`#` prefix) and blank lines are skipped. Sample values
//! and label values are parsed as JSON literals, so quoted label strings
//! lose their quotes and numeric labels stay numbers. Label values may
//! contain commas, braces, and escaped quotes; splitting only happens
//! outside quoted sections.

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Number, Value};

/// One parsed metric sample: name, numeric value, and label set.
///
/// `labels` preserves the order in which labels appeared on the line and
/// is empty for samples without a label set.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MetricSample {
    pub name: String,
    pub value: Number,
    pub labels: Map<String, Value>,
}

/// Errors produced while parsing metrics text.
#[derive(Clone, Debug, PartialEq)]
pub enum ParseError {
    /// The metrics text was absent or blank.
    EmptyInput,
    /// The requested counter does not appear in the document.
    CounterNotFound(String),
    /// A sample line could not be interpreted.
    InvalidLine { line: String, reason: String },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::EmptyInput => write!(f, "metrics text is empty"),
            ParseError::CounterNotFound(name) => {
                write!(f, "could not find `{name}` metric")
            }
            ParseError::InvalidLine { line, reason } => {
                write!(f, "invalid metric line `{line}`: {reason}")
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// Extracts the integer value of `counter_name` from raw metrics text.
///
/// Comment lines are skipped. The first sample line whose name matches
/// wins; later occurrences are never inspected. Fails with
/// [`ParseError::EmptyInput`] when `text` is blank and with
/// [`ParseError::CounterNotFound`] when no line matches.
pub fn extract_counter(text: &str, counter_name: &str) -> Result<u64, ParseError> {
    if text.trim().is_empty() {
        return Err(ParseError::EmptyInput);
    }

    for line in text.lines() {
        if line.starts_with('#') {
            continue;
        }

        let mut parts = line.split_whitespace();
        let Some(name) = parts.next() else {
            continue;
        };
        if name != counter_name {
            continue;
        }

        // e.g. "aptos_consensus_last_committed_version 8299"
        let value = parts
            .next()
            .ok_or_else(|| invalid(line, "missing value after counter name"))?;
        return value.parse::<u64>().map_err(|e| {
            invalid(line, &format!("counter value `{value}` is not an integer: {e}"))
        });
    }

    Err(ParseError::CounterNotFound(counter_name.to_string()))
}

/// Parses every sample line of `text` into [`MetricSample`]s.
///
/// Samples come back in their original line order. Empty input yields an
/// empty list; only [`extract_counter`] treats emptiness as an error.
pub fn parse_samples(text: &str) -> Result<Vec<MetricSample>, ParseError> {
    let mut samples = Vec::new();
    for line in text.lines() {
        if line.starts_with('#') || line.trim().is_empty() {
            continue;
        }
        samples.push(parse_sample_line(line)?);
    }
    Ok(samples)
}

/// Parses one exposition line.
///
/// Input: `aptos_core_mempool_index_size{index="priority"} 254`
/// Output: name `aptos_core_mempool_index_size`, value `254`, labels
/// `{"index": "priority"}`. A trailing timestamp after the value is
/// ignored.
fn parse_sample_line(line: &str) -> Result<MetricSample, ParseError> {
    match line.find('{') {
        None => {
            let mut parts = line.split_whitespace();
            let (Some(name), Some(value)) = (parts.next(), parts.next()) else {
                return Err(invalid(line, "expected `name value`"));
            };
            Ok(MetricSample {
                name: name.to_string(),
                value: parse_number(line, value)?,
                labels: Map::new(),
            })
        }
        Some(open) => {
            let name = line[..open].trim_end();
            let rest = &line[open + 1..];
            let close =
                closing_brace(rest).ok_or_else(|| invalid(line, "unterminated label set"))?;
            let labels = parse_labels(line, &rest[..close])?;
            let value = rest[close + 1..]
                .split_whitespace()
                .next()
                .ok_or_else(|| invalid(line, "missing value after label set"))?;
            Ok(MetricSample {
                name: name.to_string(),
                value: parse_number(line, value)?,
                labels,
            })
        }
    }
}

/// Splits the text between the braces into key/value pairs.
///
/// Each value is parsed as a JSON literal; unquoted values that are not
/// valid JSON are kept as raw strings.
fn parse_labels(line: &str, segment: &str) -> Result<Map<String, Value>, ParseError> {
    let mut labels = Map::new();
    for pair in split_outside_quotes(segment) {
        let pair = pair.trim();
        if pair.is_empty() {
            continue;
        }
        let (key, raw) = pair
            .split_once('=')
            .ok_or_else(|| invalid(line, &format!("label `{pair}` has no `=`")))?;
        let raw = raw.trim();
        let value =
            serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        labels.insert(key.trim().to_string(), value);
    }
    Ok(labels)
}

/// Byte offset of the closing `}` in `s` (the text following `{`),
/// skipping braces inside quoted label values.
fn closing_brace(s: &str) -> Option<usize> {
    let mut in_quotes = false;
    let mut escaped = false;
    for (i, c) in s.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            '}' if !in_quotes => return Some(i),
            _ => {}
        }
    }
    None
}

/// Splits a label segment on commas that sit outside quoted values.
fn split_outside_quotes(segment: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    let mut escaped = false;
    for (i, c) in segment.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                parts.push(&segment[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&segment[start..]);
    parts
}

fn parse_number(line: &str, token: &str) -> Result<Number, ParseError> {
    serde_json::from_str(token)
        .map_err(|e| invalid(line, &format!("value `{token}` is not a number: {e}")))
}

fn invalid(line: &str, reason: &str) -> ParseError {
    ParseError::InvalidLine {
        line: line.to_string(),
        reason: reason.to_string(),
    }
}

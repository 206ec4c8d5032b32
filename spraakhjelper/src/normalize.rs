//! Turns the oracle's text payload into well-shaped models.
//!
//! Parsing happens in two phases: the payload must parse as JSON, then it
//! must match the expected shape. Anything else is rejected as malformed.

use crate::error::OracleError;
use common::models::{CheckOutcome, SentenceAnalysis, SentenceSplit, SentenceStatus};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

pub const POSITIVE_FEEDBACK: &str = "Denne setningen er riktig! Godt jobbet! 🎉";

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Explanation {
    Text(String),
    Points(Vec<String>),
}

impl Explanation {
    fn into_text(self) -> String {
        match self {
            Explanation::Text(text) => text,
            Explanation::Points(points) => points
                .iter()
                .enumerate()
                .map(|(i, point)| format!("{}. {point}", i + 1))
                .collect::<Vec<_>>()
                .join("\n\n"),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
enum Verdict {
    #[serde(rename = "riktig")]
    Correct,
    #[serde(rename = "feil")]
    Incorrect,
}

#[derive(Debug, Deserialize)]
struct RawSplit {
    original: String,
    corrected: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawAnalysis {
    bruker_setning: String,
    riktig_setning: String,
    forklaring: Option<Explanation>,
    forklaring_morsmaal: Option<Explanation>,
    setning_status: Option<Verdict>,
}

#[derive(Debug, Deserialize)]
struct RawCheck {
    er_riktig: bool,
    forklaring: Explanation,
    forklaring_morsmaal: Explanation,
}

/// Removes a markdown code fence wrapped around the payload.
pub fn strip_code_fence(raw: &str) -> &str {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix("```") {
        text = rest.strip_prefix("json").unwrap_or(rest);
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

fn parse(raw: &str) -> Result<Value, OracleError> {
    serde_json::from_str(strip_code_fence(raw))
        .map_err(|e| OracleError::Malformed(format!("invalid JSON: {e}")))
}

fn expect_array(value: Value, wrapper: Option<&str>) -> Result<Vec<Value>, OracleError> {
    let value = match wrapper {
        Some(field) => match value {
            Value::Object(mut map) => map.remove(field).ok_or_else(|| {
                OracleError::Malformed(format!("expected field \"{field}\" holding the sentences"))
            })?,
            _ => {
                return Err(OracleError::Malformed(format!(
                    "expected an object with field \"{field}\""
                )));
            }
        },
        None => value,
    };
    match value {
        Value::Array(entries) => Ok(entries),
        _ => Err(OracleError::Malformed(
            "expected an array of sentence objects".to_string(),
        )),
    }
}

fn entry<T: DeserializeOwned>(index: usize, value: Value) -> Result<T, OracleError> {
    serde_json::from_value(value)
        .map_err(|e| OracleError::Malformed(format!("sentence {index}: {e}")))
}

pub fn sentence_splits(raw: &str) -> Result<Vec<SentenceSplit>, OracleError> {
    let entries = expect_array(parse(raw)?, None)?;
    if entries.is_empty() {
        return Err(OracleError::Malformed("no sentences returned".to_string()));
    }
    entries
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            let split: RawSplit = entry(index, value)?;
            Ok(SentenceSplit {
                corrected: split.corrected.unwrap_or_else(|| split.original.clone()),
                original: split.original,
            })
        })
        .collect()
}

/// Normalizes analysis entries and assigns `{submission_id}-{index}` ids.
///
/// `wrapper` names the object field holding the array when the backend
/// answered under a schema constraint.
pub fn sentence_analyses(
    raw: &str,
    submission_id: &str,
    wrapper: Option<&str>,
) -> Result<Vec<SentenceAnalysis>, OracleError> {
    expect_array(parse(raw)?, wrapper)?
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            let raw: RawAnalysis = entry(index, value)?;
            analysis(index, raw, submission_id)
        })
        .collect()
}

fn analysis(
    index: usize,
    raw: RawAnalysis,
    submission_id: &str,
) -> Result<SentenceAnalysis, OracleError> {
    let status = match raw.setning_status {
        Some(Verdict::Correct) => SentenceStatus::InitiallyCorrect,
        Some(Verdict::Incorrect) => SentenceStatus::Incorrect,
        None if raw.bruker_setning == raw.riktig_setning => SentenceStatus::InitiallyCorrect,
        None => SentenceStatus::Incorrect,
    };
    let native = raw.forklaring.map(Explanation::into_text);
    let mother_tongue = raw.forklaring_morsmaal.map(Explanation::into_text);

    let (explanation_native, explanation_mother_tongue) = if status.is_correct() {
        let native = native
            .filter(|text| !text.trim().is_empty())
            .unwrap_or_else(|| POSITIVE_FEEDBACK.to_string());
        let mother_tongue = mother_tongue
            .filter(|text| !text.trim().is_empty())
            .unwrap_or_else(|| native.clone());
        (native, mother_tongue)
    } else {
        match (native, mother_tongue) {
            (Some(native), Some(mother_tongue)) => (native, mother_tongue),
            _ => {
                return Err(OracleError::Malformed(format!(
                    "sentence {index}: incorrect sentence without explanation"
                )));
            }
        }
    };

    Ok(SentenceAnalysis {
        user_sentence: raw.bruker_setning,
        correct_sentence: raw.riktig_setning,
        explanation_native,
        explanation_mother_tongue,
        status,
        sentence_id: format!("{submission_id}-{index}"),
    })
}

pub fn check_outcome(raw: &str) -> Result<CheckOutcome, OracleError> {
    let value = parse(raw)?;
    if !value.is_object() {
        return Err(OracleError::Malformed("expected a JSON object".to_string()));
    }
    let check: RawCheck = serde_json::from_value(value)
        .map_err(|e| OracleError::Malformed(format!("check result: {e}")))?;
    Ok(CheckOutcome {
        is_correct: check.er_riktig,
        explanation_native: check.forklaring.into_text(),
        explanation_mother_tongue: check.forklaring_morsmaal.into_text(),
    })
}

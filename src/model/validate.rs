//! Checks on question payloads submitted through the admin API.
//!
//! Payload fields are deserialized loosely so that a value of the wrong shape
//! is reported as a validation failure naming the field, rather than as an
//! opaque JSON error.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use super::question::{Answer, NewQuestion, QuestionPatch, QuestionType, DEFAULT_CATEGORY};

/// A question as submitted by the admin panel, before validation.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct QuestionPayload {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub question: Option<String>,
    pub options: Option<Value>,
    pub correct_answer: Option<Value>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Field '{0}' is required")]
    MissingField(&'static str),
    #[error("Question type must be 'mcq' or 'tf', got '{0}'")]
    InvalidType(String),
    #[error("Options must be a non-empty list of strings")]
    InvalidOptions,
    #[error("Correct answer must be text, a number or a boolean")]
    InvalidAnswer,
}

/// Validate a payload for a brand-new question.
///
/// Required fields are checked first, then the shape of each field. An absent
/// `type` means `mcq` and an absent `category` means [`DEFAULT_CATEGORY`].
pub fn validate(payload: QuestionPayload) -> Result<NewQuestion, ValidationError> {
    let QuestionPayload {
        kind,
        question,
        options,
        correct_answer,
        category,
    } = payload;

    let question = question
        .filter(|q| !q.is_empty())
        .ok_or(ValidationError::MissingField("question"))?;
    let options = options
        .filter(|o| !is_blank(o))
        .ok_or(ValidationError::MissingField("options"))?;
    let correct_answer = correct_answer
        .filter(|a| !is_blank(a))
        .ok_or(ValidationError::MissingField("correct_answer"))?;

    Ok(NewQuestion {
        kind: kind.as_deref().map(parse_type).transpose()?.unwrap_or_default(),
        question,
        options: parse_options(options)?,
        correct_answer: parse_answer(correct_answer)?,
        category: category.unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
    })
}

/// Validate the fields present in a partial update.
///
/// An empty payload is a valid, empty patch.
pub fn validate_patch(payload: QuestionPayload) -> Result<QuestionPatch, ValidationError> {
    let QuestionPayload {
        kind,
        question,
        options,
        correct_answer,
        category,
    } = payload;

    if question.as_deref() == Some("") {
        return Err(ValidationError::MissingField("question"));
    }

    Ok(QuestionPatch {
        kind: kind.as_deref().map(parse_type).transpose()?,
        question,
        options: options.map(parse_options).transpose()?,
        correct_answer: correct_answer
            .map(|answer| {
                if is_blank(&answer) {
                    Err(ValidationError::MissingField("correct_answer"))
                } else {
                    parse_answer(answer)
                }
            })
            .transpose()?,
        category,
    })
}

/// Whether a value counts as "not provided": null, or an empty string, list or object.
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

fn parse_type(kind: &str) -> Result<QuestionType, ValidationError> {
    kind.parse().map_err(ValidationError::InvalidType)
}

fn parse_options(options: Value) -> Result<Vec<String>, ValidationError> {
    let Value::Array(items) = options else {
        return Err(ValidationError::InvalidOptions);
    };
    if items.is_empty() {
        return Err(ValidationError::InvalidOptions);
    }
    items
        .into_iter()
        .map(|item| match item {
            Value::String(s) => Ok(s),
            _ => Err(ValidationError::InvalidOptions),
        })
        .collect()
}

fn parse_answer(answer: Value) -> Result<Answer, ValidationError> {
    match answer {
        Value::String(s) => Ok(Answer::Text(s)),
        Value::Number(n) => n
            .as_i64()
            .map(Answer::Integer)
            .or_else(|| n.as_f64().map(Answer::Float))
            .ok_or(ValidationError::InvalidAnswer),
        Value::Bool(b) => Ok(Answer::Boolean(b)),
        _ => Err(ValidationError::InvalidAnswer),
    }
}

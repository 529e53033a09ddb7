use std::borrow::Cow;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use super::question::{Answer, Question};

/// The outcome of marking one submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub score: u32,
    pub total: u32,
    /// `score / total * 100`, rounded to two decimal places.
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoreError {
    #[error("No questions are available; add some from the admin panel first")]
    NoQuestions,
    #[error("Invalid question ID '{0}'")]
    InvalidQuestionId(String),
}

/// Mark the submitted answers against the stored questions.
///
/// `answers` maps question IDs (as strings) to the submitted value. Answers for
/// IDs that match no question are skipped, and each question is counted at
/// most once.
pub fn score(questions: &[Question], answers: &Map<String, Value>) -> Result<Score, ScoreError> {
    if questions.is_empty() {
        return Err(ScoreError::NoQuestions);
    }
    let total = u32::try_from(questions.len()).unwrap_or(u32::MAX);

    let mut marked = HashSet::new();
    let mut score = 0;
    for (key, submitted) in answers {
        let id = parse_question_id(key)?;
        let Some(question) = questions.iter().find(|q| i64::from(q.id) == id) else {
            continue;
        };
        if !marked.insert(question.id) {
            continue;
        }
        if answers_match(submitted, &question.correct_answer) {
            score += 1;
        }
    }

    Ok(Score {
        score,
        total,
        percentage: percentage(score, total),
    })
}

/// Compare a submitted answer with the stored one.
///
/// Both sides are first read as numbers: numbers as they are, booleans as 1
/// and 0, and strings holding an integer. If both succeed the numbers are
/// compared, so `2.0` matches `2` and `true` matches `1`. Otherwise the
/// canonical string forms are compared exactly.
pub fn answers_match(submitted: &Value, correct: &Answer) -> bool {
    match (submitted_number(submitted), stored_number(correct)) {
        (Some(submitted), Some(correct)) => submitted == correct,
        _ => submitted_text(submitted) == stored_text(correct),
    }
}

fn parse_question_id(key: &str) -> Result<i64, ScoreError> {
    key.trim()
        .parse()
        .map_err(|_| ScoreError::InvalidQuestionId(key.to_string()))
}

/// A numeric reading of an answer.
#[derive(Debug, Clone, Copy)]
enum Number {
    Integer(i64),
    Float(f64),
}

impl Number {
    fn as_f64(self) -> f64 {
        match self {
            Self::Integer(i) => i as f64,
            Self::Float(x) => x,
        }
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        match (*self, *other) {
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (a, b) => a.as_f64() == b.as_f64(),
        }
    }
}

fn submitted_number(value: &Value) -> Option<Number> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .map(Number::Integer)
            .or_else(|| n.as_f64().map(Number::Float)),
        Value::Bool(b) => Some(Number::Integer(i64::from(*b))),
        Value::String(s) => s.trim().parse().ok().map(Number::Integer),
        _ => None,
    }
}

fn stored_number(answer: &Answer) -> Option<Number> {
    match answer {
        Answer::Integer(i) => Some(Number::Integer(*i)),
        Answer::Float(x) => Some(Number::Float(*x)),
        Answer::Boolean(b) => Some(Number::Integer(i64::from(*b))),
        Answer::Text(text) => text.trim().parse().ok().map(Number::Integer),
    }
}

fn submitted_text(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(s) => Cow::Borrowed(s),
        other => Cow::Owned(other.to_string()),
    }
}

fn stored_text(answer: &Answer) -> Cow<'_, str> {
    match answer {
        Answer::Text(text) => Cow::Borrowed(text),
        other => Cow::Owned(other.to_string()),
    }
}

fn percentage(score: u32, total: u32) -> f64 {
    let raw = f64::from(score) / f64::from(total) * 100.0;
    (raw * 100.0).round() / 100.0
}

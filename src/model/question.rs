use std::fmt::{Display, Formatter};
use std::ops::{Deref, DerefMut};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Unique, positive question identifier. Matches the `serial` column type.
pub type QuestionId = i32;

/// Category given to questions that are created without one.
pub const DEFAULT_CATEGORY: &str = "رومانسي";

/// The kind of question being asked.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    /// Multiple choice; the answer indexes into the options.
    #[default]
    Mcq,
    /// True/false.
    Tf,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mcq => "mcq",
            Self::Tf => "tf",
        }
    }
}

impl Display for QuestionType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mcq" => Ok(Self::Mcq),
            "tf" => Ok(Self::Tf),
            other => Err(other.to_string()),
        }
    }
}

/// A stored correct answer: usually an option index or a free-text token.
///
/// Older question files may also hold booleans or non-integer numbers, which
/// are kept as they are.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Text(String),
}

impl Display for Answer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

impl From<i64> for Answer {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<&str> for Answer {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

/// Core question data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionCore {
    #[serde(rename = "type", default)]
    pub kind: QuestionType,
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: Answer,
    #[serde(default = "default_category")]
    pub category: String,
}

impl QuestionCore {
    /// Overwrite every field that is present in the patch.
    pub fn apply(&mut self, patch: QuestionPatch) {
        let QuestionPatch {
            kind,
            question,
            options,
            correct_answer,
            category,
        } = patch;
        if let Some(kind) = kind {
            self.kind = kind;
        }
        if let Some(question) = question {
            self.question = question;
        }
        if let Some(options) = options {
            self.options = options;
        }
        if let Some(correct_answer) = correct_answer {
            self.correct_answer = correct_answer;
        }
        if let Some(category) = category {
            self.category = category;
        }
    }
}

/// A question that has not been assigned an ID yet.
pub type NewQuestion = QuestionCore;

/// A stored question, with its unique ID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    #[serde(flatten)]
    pub core: QuestionCore,
}

impl Question {
    pub fn new(id: QuestionId, core: NewQuestion) -> Self {
        Self { id, core }
    }
}

impl Deref for Question {
    type Target = QuestionCore;

    fn deref(&self) -> &Self::Target {
        &self.core
    }
}

impl DerefMut for Question {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.core
    }
}

/// A partial update; `None` fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuestionPatch {
    pub kind: Option<QuestionType>,
    pub question: Option<String>,
    pub options: Option<Vec<String>>,
    pub correct_answer: Option<Answer>,
    pub category: Option<String>,
}

impl QuestionPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl QuestionCore {
        pub fn example() -> Self {
            Self {
                kind: QuestionType::Mcq,
                question: "ما هو أجمل يوم قضيناه معاً؟".to_string(),
                options: vec![
                    "يوم لقائنا الأول".to_string(),
                    "رحلتنا إلى البحر".to_string(),
                    "عيد ميلادك".to_string(),
                ],
                correct_answer: Answer::Text("0".to_string()),
                category: DEFAULT_CATEGORY.to_string(),
            }
        }

        pub fn example_tf() -> Self {
            Self {
                kind: QuestionType::Tf,
                question: "Is the sky blue?".to_string(),
                options: vec!["True".to_string(), "False".to_string()],
                correct_answer: Answer::Integer(0),
                category: "general".to_string(),
            }
        }
    }
}

//! Request and response bodies of the JSON API.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::question::Question;

/// Body of `POST /api/submit`. The `answers` object is required but may be empty.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct Submission {
    /// Question ID to submitted answer.
    pub answers: Map<String, Value>,
}

/// Successful answer of the add and update endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionSaved {
    pub success: bool,
    pub question: Question,
}

impl From<Question> for QuestionSaved {
    fn from(question: Question) -> Self {
        Self {
            success: true,
            question,
        }
    }
}

/// Successful answer of the delete endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deleted {
    pub success: bool,
}

/// Form posted by the admin login page.
#[derive(Debug, FromForm)]
pub struct LoginForm {
    #[field(default = String::new())]
    pub password: String,
}

//! Server-rendered HTML pages: the quiz, the admin login form and the admin
//! dashboard. The dashboard drives the JSON admin API from the browser.
//!
//! Pages are Handlebars templates compiled into the binary. Every template
//! wraps its body in the `layout` partial.

use handlebars::{Handlebars, TemplateError};
use log::error;
use rocket::{
    fairing::{Fairing, Info, Kind},
    response::content::RawHtml,
    Build, Rocket,
};
use serde::Serialize;
use serde_json::json;

use crate::error::Result;
use crate::model::question::{Question, QuestionId, QuestionType};

const LAYOUT: &str = include_str!("../templates/layout.html.hbs");

const TEMPLATES: [(&str, &str); 4] = [
    ("quiz", include_str!("../templates/quiz.html.hbs")),
    ("login", include_str!("../templates/login.html.hbs")),
    ("dashboard", include_str!("../templates/dashboard.html.hbs")),
    ("error", include_str!("../templates/error.html.hbs")),
];

/// Labels shown for the two implicit options of a true/false question.
const TRUE_FALSE_LABELS: [&str; 2] = ["صح", "خطأ"];

/// One radio button of the quiz. `value` is the option index.
#[derive(Serialize)]
struct QuizOption<'a> {
    name: QuestionId,
    value: usize,
    label: &'a str,
}

#[derive(Serialize)]
struct QuizQuestion<'a> {
    question: &'a str,
    category: &'a str,
    options: Vec<QuizOption<'a>>,
}

impl<'a> From<&'a Question> for QuizQuestion<'a> {
    fn from(question: &'a Question) -> Self {
        let labels: Vec<&str> = match question.kind {
            QuestionType::Tf if question.options.len() != 2 => TRUE_FALSE_LABELS.to_vec(),
            _ => question.options.iter().map(String::as_str).collect(),
        };
        Self {
            question: &question.question,
            category: &question.category,
            options: labels
                .into_iter()
                .enumerate()
                .map(|(value, label)| QuizOption {
                    name: question.id,
                    value,
                    label,
                })
                .collect(),
        }
    }
}

/// One row of the dashboard table, with what the edit form needs.
#[derive(Serialize)]
struct DashboardRow<'a> {
    id: QuestionId,
    kind: QuestionType,
    question: &'a str,
    option_list: String,
    option_lines: String,
    correct_answer: String,
    category: &'a str,
}

impl<'a> From<&'a Question> for DashboardRow<'a> {
    fn from(question: &'a Question) -> Self {
        Self {
            id: question.id,
            kind: question.kind,
            question: &question.question,
            option_list: question.options.join(" | "),
            option_lines: question.options.join("\n"),
            correct_answer: question.correct_answer.to_string(),
            category: &question.category,
        }
    }
}

/// The compiled page templates.
pub struct Pages {
    registry: Handlebars<'static>,
}

impl Pages {
    pub fn new() -> std::result::Result<Self, TemplateError> {
        let mut registry = Handlebars::new();
        registry.register_partial("layout", LAYOUT)?;
        for (name, source) in TEMPLATES {
            registry.register_template_string(name, source)?;
        }
        Ok(Self { registry })
    }

    fn render(&self, name: &str, data: &serde_json::Value) -> Result<RawHtml<String>> {
        Ok(RawHtml(self.registry.render(name, data)?))
    }

    /// The quiz itself. Every option submits its index, for both question types.
    pub fn quiz(&self, questions: &[Question]) -> Result<RawHtml<String>> {
        let questions: Vec<QuizQuestion> = questions.iter().map(QuizQuestion::from).collect();
        self.render(
            "quiz",
            &json!({ "title": "اختبار الحب", "questions": questions }),
        )
    }

    /// The admin login form, optionally with an error message.
    pub fn login(&self, error: Option<&str>) -> Result<RawHtml<String>> {
        self.render("login", &json!({ "title": "دخول المسؤول", "error": error }))
    }

    /// The admin dashboard: the current questions plus an add/edit form.
    pub fn dashboard(&self, questions: &[Question]) -> Result<RawHtml<String>> {
        let questions: Vec<DashboardRow> = questions.iter().map(DashboardRow::from).collect();
        self.render(
            "dashboard",
            &json!({ "title": "لوحة التحكم", "questions": questions }),
        )
    }

    /// A top-level page shown when the questions cannot be loaded.
    pub fn error(&self, message: &str) -> Result<RawHtml<String>> {
        self.render("error", &json!({ "title": "خطأ", "message": message }))
    }
}

/// A fairing that compiles the page templates and puts them in managed state.
pub struct PagesFairing;

#[rocket::async_trait]
impl Fairing for PagesFairing {
    fn info(&self) -> Info {
        Info {
            name: "Pages",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, rocket: Rocket<Build>) -> rocket::fairing::Result {
        match Pages::new() {
            Ok(pages) => Ok(rocket.manage(pages)),
            Err(e) => {
                error!("Failed to compile page templates: {e}");
                Err(rocket)
            }
        }
    }
}

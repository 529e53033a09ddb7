use log::{error, warn};
use rocket::{
    http::Status,
    response::{self, Redirect, Responder},
    serde::json::Json,
    Request,
};
use serde_json::json;
use thiserror::Error;

use crate::logging::RequestId;
use crate::model::{score::ScoreError, validate::ValidationError};

pub type Result<T> = std::result::Result<T, Error>;

/// Where unauthenticated admin requests are sent.
pub const LOGIN_PAGE: &str = "/admin/login";

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Db(#[from] sqlx::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("Failed to render page: {0}")]
    Render(#[from] handlebars::RenderError),
    #[error("Corrupt stored question: {0}")]
    Corrupt(String),
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error(transparent)]
    Score(#[from] ScoreError),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Admin session required")]
    Unauthorized,
}

impl Error {
    pub fn not_found(what: impl std::fmt::Display) -> Self {
        Self::NotFound(format!("{what} does not exist"))
    }

    /// The HTTP status this error maps to.
    pub fn status(&self) -> Status {
        match self {
            Self::Db(_) | Self::Io(_) | Self::Json(_) | Self::Render(_) | Self::Corrupt(_) => {
                Status::InternalServerError
            }
            Self::Invalid(_) | Self::BadRequest(_) => Status::BadRequest,
            Self::Score(ScoreError::InvalidQuestionId(_)) => Status::BadRequest,
            Self::Score(ScoreError::NoQuestions) | Self::NotFound(_) => Status::NotFound,
            Self::Unauthorized => Status::SeeOther,
        }
    }

    /// The message shown to the client. Server-side failures stay generic.
    pub fn public_message(&self) -> String {
        if self.status().class().is_server_error() {
            "An unexpected server error occurred, please try again later".to_string()
        } else {
            self.to_string()
        }
    }

    /// Log the error and turn it into a response whose JSON body is built by `body`.
    fn respond_with<'r, 'o: 'r>(
        self,
        req: &'r Request<'_>,
        body: impl FnOnce(String) -> serde_json::Value,
    ) -> response::Result<'o> {
        if let Self::Unauthorized = self {
            return Redirect::to(LOGIN_PAGE).respond_to(req);
        }

        let id = RequestId::of(req);
        let status = self.status();
        if status.class().is_server_error() {
            error!("req{id} failed: {self}");
        } else {
            warn!("req{id} rejected: {self}");
        }
        (status, Json(body(self.public_message()))).respond_to(req)
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'o> {
        self.respond_with(req, |message| json!({ "error": message }))
    }
}

/// An [`Error`] raised by an admin API endpoint, which answers with
/// `{"success": false, "error": ...}`.
#[derive(Debug)]
pub struct AdminError(pub Error);

impl From<Error> for AdminError {
    fn from(error: Error) -> Self {
        Self(error)
    }
}

impl From<ValidationError> for AdminError {
    fn from(error: ValidationError) -> Self {
        Self(error.into())
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for AdminError {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'o> {
        self.0
            .respond_with(req, |message| json!({ "success": false, "error": message }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses() {
        assert_eq!(Error::BadRequest("x".into()).status(), Status::BadRequest);
        assert_eq!(Error::not_found("Question 4").status(), Status::NotFound);
        assert_eq!(Error::from(ScoreError::NoQuestions).status(), Status::NotFound);
        assert_eq!(
            Error::from(ValidationError::InvalidOptions).status(),
            Status::BadRequest
        );
        assert_eq!(Error::Corrupt("x".into()).status(), Status::InternalServerError);
    }

    #[test]
    fn server_errors_hide_details() {
        let error = Error::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "/srv/questions.json",
        ));
        assert!(!error.public_message().contains("/srv"));
        assert_eq!(
            Error::not_found("Question 4").public_message(),
            "Not found: Question 4 does not exist"
        );
    }
}

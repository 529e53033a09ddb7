use log::error;
use rocket::{
    http::Status,
    response::content::RawHtml,
    serde::json::{self, Json},
    Route, State,
};

use crate::error::{Error, Result};
use crate::model::{
    api::Submission,
    question::Question,
    score::{self, Score},
};
use crate::pages::Pages;
use crate::store::Store;

pub fn routes() -> Vec<Route> {
    routes![index, questions, submit]
}

#[get("/")]
async fn index(store: Store, pages: &State<Pages>) -> Result<(Status, RawHtml<String>)> {
    match store.list_all().await {
        Ok(questions) => Ok((Status::Ok, pages.quiz(&questions)?)),
        Err(e) => {
            error!("Failed to load questions for the quiz page: {e}");
            Ok((
                Status::InternalServerError,
                pages.error("تعذر تحميل الأسئلة، يرجى المحاولة لاحقاً")?,
            ))
        }
    }
}

#[get("/api/questions")]
async fn questions(store: Store) -> Result<Json<Vec<Question>>> {
    Ok(Json(store.list_all().await?))
}

#[post("/api/submit", data = "<submission>")]
async fn submit(
    submission: std::result::Result<Json<Submission>, json::Error<'_>>,
    store: Store,
) -> Result<Json<Score>> {
    let submission = submission.map_err(|e| Error::BadRequest(format!("Invalid answers: {e}")))?;
    let questions = store.list_all().await?;
    let score = score::score(&questions, &submission.answers)?;
    Ok(Json(score))
}

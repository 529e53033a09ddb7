use log::info;
use rocket::{
    http::Status,
    response::content::RawHtml,
    serde::json::{self, Json},
    Route, State,
};

use crate::{
    config::Config,
    error::{AdminError, Error, Result},
    model::{
        admin::AdminSession,
        api::{Deleted, QuestionSaved},
        question::QuestionId,
        validate::{validate, validate_patch, QuestionPayload},
    },
    pages::Pages,
    store::Store,
};

type AdminResult<T> = std::result::Result<T, AdminError>;

pub fn routes() -> Vec<Route> {
    routes![
        dashboard,
        dashboard_post,
        add_question,
        update_question_post,
        update_question_put,
        delete_question,
    ]
}

#[get("/admin")]
async fn dashboard(
    session: AdminSession,
    store: Store,
    pages: &State<Pages>,
) -> Result<RawHtml<String>> {
    session.require()?;
    pages.dashboard(&store.list_all().await?)
}

#[post("/admin")]
async fn dashboard_post(
    session: AdminSession,
    store: Store,
    pages: &State<Pages>,
) -> Result<RawHtml<String>> {
    dashboard(session, store, pages).await
}

/// Turn a body that is not a JSON object of the expected shape into a 400.
fn payload(
    payload: std::result::Result<Json<QuestionPayload>, json::Error<'_>>,
) -> AdminResult<QuestionPayload> {
    payload
        .map(Json::into_inner)
        .map_err(|e| Error::BadRequest(format!("Invalid question: {e}")).into())
}

#[post("/api/admin/add-question", data = "<question>")]
async fn add_question(
    session: AdminSession,
    question: std::result::Result<Json<QuestionPayload>, json::Error<'_>>,
    store: Store,
    config: &State<Config>,
) -> AdminResult<(Status, Json<QuestionSaved>)> {
    session.require()?;
    let question = validate(payload(question)?)?;

    if store.list_all().await?.len() >= config.max_questions() {
        return Err(Error::BadRequest(format!(
            "Cannot store more than {} questions",
            config.max_questions()
        ))
        .into());
    }

    let question = store.create(question).await?;
    info!("Added question {}", question.id);
    Ok((Status::Created, Json(question.into())))
}

async fn update_question(
    session: AdminSession,
    id: QuestionId,
    changes: std::result::Result<Json<QuestionPayload>, json::Error<'_>>,
    store: Store,
) -> AdminResult<Json<QuestionSaved>> {
    session.require()?;
    let patch = validate_patch(payload(changes)?)?;

    // Nothing to write.
    if patch.is_empty() {
        let question = store
            .find(id)
            .await?
            .ok_or_else(|| Error::not_found(format!("Question {id}")))?;
        return Ok(Json(question.into()));
    }

    let question = store.update(id, patch).await?;
    info!("Updated question {id}");
    Ok(Json(question.into()))
}

#[post("/api/admin/update-question/<id>", data = "<changes>")]
async fn update_question_post(
    session: AdminSession,
    id: QuestionId,
    changes: std::result::Result<Json<QuestionPayload>, json::Error<'_>>,
    store: Store,
) -> AdminResult<Json<QuestionSaved>> {
    update_question(session, id, changes, store).await
}

#[put("/api/admin/update-question/<id>", data = "<changes>")]
async fn update_question_put(
    session: AdminSession,
    id: QuestionId,
    changes: std::result::Result<Json<QuestionPayload>, json::Error<'_>>,
    store: Store,
) -> AdminResult<Json<QuestionSaved>> {
    update_question(session, id, changes, store).await
}

#[delete("/api/admin/delete-question/<id>")]
async fn delete_question(
    session: AdminSession,
    id: QuestionId,
    store: Store,
) -> AdminResult<Json<Deleted>> {
    session.require()?;
    store.delete(id).await?;
    info!("Deleted question {id}");
    Ok(Json(Deleted { success: true }))
}

#[cfg(test)]
mod tests {
    use rocket::{http::ContentType, local::asynchronous::Client};
    use serde_json::{json, Value};

    use super::*;
    use crate::model::question::{Answer, Question, QuestionCore, QuestionType};

    fn new_question() -> Value {
        json!({
            "type": "tf",
            "question": "Is the sky blue?",
            "options": ["True", "False"],
            "correct_answer": 0,
            "category": "general",
        })
    }

    #[backend_test(admin)]
    async fn dashboard_lists_questions(client: Client, store: Store) {
        store.create(QuestionCore::example()).await.unwrap();

        for response in [
            client.get(uri!(dashboard)).dispatch().await,
            client.post(uri!(dashboard_post)).dispatch().await,
        ] {
            assert_eq!(Status::Ok, response.status());
            let page = response.into_string().await.unwrap();
            assert!(page.contains(&QuestionCore::example().question));
            assert!(page.contains("data-edit=\"1\""));
        }
    }

    #[backend_test]
    async fn dashboard_requires_login(client: Client) {
        let response = client.get(uri!(dashboard)).dispatch().await;

        assert_eq!(Status::SeeOther, response.status());
        assert_eq!(
            Some(crate::error::LOGIN_PAGE),
            response.headers().get_one("Location")
        );
    }

    #[backend_test(admin)]
    async fn add_question_succeeds(client: Client, store: Store) {
        let response = client
            .post(uri!(add_question))
            .header(ContentType::JSON)
            .body(new_question().to_string())
            .dispatch()
            .await;

        assert_eq!(Status::Created, response.status());
        let saved: QuestionSaved = response.into_json().await.unwrap();
        assert!(saved.success);
        assert_eq!(saved.question, Question::new(1, QuestionCore::example_tf()));

        let stored = store.list_all().await.unwrap();
        assert_eq!(stored, vec![saved.question]);
    }

    #[backend_test(admin)]
    async fn add_question_fills_defaults(client: Client) {
        let response = client
            .post(uri!(add_question))
            .header(ContentType::JSON)
            .body(json!({ "question": "Q", "options": ["a", "b"], "correct_answer": "b" }).to_string())
            .dispatch()
            .await;

        assert_eq!(Status::Created, response.status());
        let saved: QuestionSaved = response.into_json().await.unwrap();
        assert_eq!(saved.question.kind, QuestionType::Mcq);
        assert_eq!(saved.question.correct_answer, Answer::from("b"));
        assert_eq!(
            saved.question.category,
            crate::model::question::DEFAULT_CATEGORY
        );
    }

    #[backend_test(admin)]
    async fn add_invalid_question(client: Client, store: Store) {
        let mut essay = new_question();
        essay["type"] = json!("essay");
        let mut missing_answer = new_question();
        missing_answer.as_object_mut().unwrap().remove("correct_answer");
        let mut empty_options = new_question();
        empty_options["options"] = json!([]);

        for body in [
            essay.to_string(),
            missing_answer.to_string(),
            empty_options.to_string(),
            "not json".to_string(),
        ] {
            let response = client
                .post(uri!(add_question))
                .header(ContentType::JSON)
                .body(body)
                .dispatch()
                .await;

            assert_eq!(Status::BadRequest, response.status());
            let body: Value = response.into_json().await.unwrap();
            assert_eq!(body["success"], json!(false));
            assert!(body["error"].is_string());
        }

        assert!(store.list_all().await.unwrap().is_empty());
    }

    #[backend_test]
    async fn add_question_requires_login(client: Client, store: Store) {
        let response = client
            .post(uri!(add_question))
            .header(ContentType::JSON)
            .body(new_question().to_string())
            .dispatch()
            .await;

        assert_eq!(Status::SeeOther, response.status());
        assert!(store.list_all().await.unwrap().is_empty());
    }

    #[backend_test(admin)]
    async fn add_question_respects_limit(client: Client, store: Store) {
        let limit = client.rocket().state::<Config>().unwrap().max_questions();
        for _ in 0..limit {
            store.create(QuestionCore::example()).await.unwrap();
        }

        let response = client
            .post(uri!(add_question))
            .header(ContentType::JSON)
            .body(new_question().to_string())
            .dispatch()
            .await;

        assert_eq!(Status::BadRequest, response.status());
        assert_eq!(store.list_all().await.unwrap().len(), limit);
    }

    #[backend_test(admin)]
    async fn update_question_merges_fields(client: Client, store: Store) {
        let question = store.create(QuestionCore::example()).await.unwrap();

        let response = client
            .put(uri!(update_question_put(question.id)))
            .header(ContentType::JSON)
            .body(json!({ "correct_answer": "2" }).to_string())
            .dispatch()
            .await;

        assert_eq!(Status::Ok, response.status());
        let saved: QuestionSaved = response.into_json().await.unwrap();
        assert_eq!(saved.question.correct_answer, Answer::from("2"));
        assert_eq!(saved.question.question, question.question);
        assert_eq!(saved.question.options, question.options);

        let response = client
            .post(uri!(update_question_post(question.id)))
            .header(ContentType::JSON)
            .body(json!({ "category": "general" }).to_string())
            .dispatch()
            .await;

        assert_eq!(Status::Ok, response.status());
        let stored = store.find(question.id).await.unwrap().unwrap();
        assert_eq!(stored.category, "general");
        assert_eq!(stored.correct_answer, Answer::from("2"));
    }

    #[backend_test(admin)]
    async fn update_with_empty_body_changes_nothing(client: Client, store: Store) {
        let question = store.create(QuestionCore::example()).await.unwrap();

        let response = client
            .put(uri!(update_question_put(question.id)))
            .header(ContentType::JSON)
            .body("{}")
            .dispatch()
            .await;

        assert_eq!(Status::Ok, response.status());
        assert_eq!(store.find(question.id).await.unwrap(), Some(question));
    }

    #[backend_test(admin)]
    async fn update_invalid_or_missing(client: Client, store: Store) {
        let question = store.create(QuestionCore::example()).await.unwrap();

        let response = client
            .put(uri!(update_question_put(question.id)))
            .header(ContentType::JSON)
            .body(json!({ "type": "essay" }).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::BadRequest, response.status());

        let response = client
            .put(uri!(update_question_put(9999)))
            .header(ContentType::JSON)
            .body(json!({ "question": "Q" }).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::NotFound, response.status());
        let body: Value = response.into_json().await.unwrap();
        assert_eq!(body["success"], json!(false));

        assert_eq!(store.find(question.id).await.unwrap(), Some(question));
    }

    #[backend_test]
    async fn update_requires_login(client: Client, store: Store) {
        let question = store.create(QuestionCore::example()).await.unwrap();

        let response = client
            .put(uri!(update_question_put(question.id)))
            .header(ContentType::JSON)
            .body(json!({ "question": "Q" }).to_string())
            .dispatch()
            .await;

        assert_eq!(Status::SeeOther, response.status());
        assert_eq!(store.find(question.id).await.unwrap(), Some(question));
    }

    #[backend_test(admin)]
    async fn delete_question_succeeds(client: Client, store: Store) {
        let first = store.create(QuestionCore::example()).await.unwrap();
        let second = store.create(QuestionCore::example_tf()).await.unwrap();

        let response = client
            .delete(uri!(delete_question(first.id)))
            .dispatch()
            .await;

        assert_eq!(Status::Ok, response.status());
        let body: Value = response.into_json().await.unwrap();
        assert_eq!(body, json!({ "success": true }));
        assert_eq!(store.list_all().await.unwrap(), vec![second]);

        let response = client
            .delete(uri!(delete_question(first.id)))
            .dispatch()
            .await;
        assert_eq!(Status::NotFound, response.status());
    }

    #[backend_test]
    async fn delete_requires_login(client: Client, store: Store) {
        let question = store.create(QuestionCore::example()).await.unwrap();

        let response = client
            .delete(uri!(delete_question(question.id)))
            .dispatch()
            .await;

        assert_eq!(Status::SeeOther, response.status());
        assert_eq!(store.list_all().await.unwrap(), vec![question]);
    }
}

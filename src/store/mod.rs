use std::ops::Deref;
use std::sync::Arc;

use rocket::{
    http::Status,
    request::{self, FromRequest, Request},
    State,
};

use crate::error::Result;
use crate::model::question::{NewQuestion, Question, QuestionId, QuestionPatch};

pub mod file;
pub mod postgres;

/// Persistence of the question collection.
///
/// Every call goes back to the backing medium; implementations keep no cache.
#[rocket::async_trait]
pub trait QuestionStore: Send + Sync {
    /// All questions, ordered by ascending ID.
    async fn list_all(&self) -> Result<Vec<Question>>;

    /// The question with the given ID, if there is one.
    async fn find(&self, id: QuestionId) -> Result<Option<Question>>;

    /// Persist a new question under the next free ID (highest existing ID plus one).
    async fn create(&self, question: NewQuestion) -> Result<Question>;

    /// Overwrite the fields present in `patch`, failing with
    /// [`crate::error::Error::NotFound`] if the ID does not exist.
    async fn update(&self, id: QuestionId, patch: QuestionPatch) -> Result<Question>;

    /// Remove a question, failing with [`crate::error::Error::NotFound`] if
    /// the ID does not exist.
    async fn delete(&self, id: QuestionId) -> Result<()>;
}

/// Shared handle on whichever [`QuestionStore`] is configured.
#[derive(Clone)]
pub struct Store(Arc<dyn QuestionStore>);

impl Store {
    pub fn new(store: Arc<dyn QuestionStore>) -> Self {
        Self(store)
    }
}

impl Deref for Store {
    type Target = dyn QuestionStore;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Store {
    type Error = ();

    /// Get the store from the managed state.
    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        match req.guard::<&State<Store>>().await {
            request::Outcome::Success(store) => request::Outcome::Success(store.inner().clone()),
            _ => request::Outcome::Error((Status::InternalServerError, ())),
        }
    }
}

/// Behaviour every [`QuestionStore`] implementation must share.
#[cfg(test)]
pub(crate) mod contract {
    use crate::error::Error;
    use crate::model::question::{Answer, QuestionCore, QuestionType};

    use super::*;

    /// Run every check against a store that starts out empty.
    pub async fn check_all(store: &dyn QuestionStore) {
        empty_store(store).await;
        create_then_find(store).await;
        ids_are_distinct_and_increasing(store).await;
        update_merges_fields(store).await;
        delete_removes(store).await;
        missing_ids(store).await;
    }

    async fn empty_store(store: &dyn QuestionStore) {
        assert!(store.list_all().await.unwrap().is_empty());
        assert_eq!(store.find(1).await.unwrap(), None);
    }

    async fn create_then_find(store: &dyn QuestionStore) {
        let created = store.create(QuestionCore::example()).await.unwrap();
        assert_eq!(created.id, 1);
        assert_eq!(created.core, QuestionCore::example());

        let found = store.find(created.id).await.unwrap();
        assert_eq!(found, Some(created));
    }

    async fn ids_are_distinct_and_increasing(store: &dyn QuestionStore) {
        let mut last = store
            .list_all()
            .await
            .unwrap()
            .last()
            .map_or(0, |q| q.id);
        for _ in 0..5 {
            let created = store.create(QuestionCore::example_tf()).await.unwrap();
            assert!(created.id > last);
            last = created.id;
        }

        let ids = store
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|q| q.id)
            .collect::<Vec<_>>();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(ids, sorted);
    }

    async fn update_merges_fields(store: &dyn QuestionStore) {
        let created = store.create(QuestionCore::example()).await.unwrap();

        let unchanged = store
            .update(created.id, QuestionPatch::default())
            .await
            .unwrap();
        assert_eq!(unchanged, created);

        let updated = store
            .update(
                created.id,
                QuestionPatch {
                    kind: Some(QuestionType::Tf),
                    correct_answer: Some(Answer::Integer(1)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.kind, QuestionType::Tf);
        assert_eq!(updated.correct_answer, Answer::Integer(1));
        assert_eq!(updated.question, created.question);
        assert_eq!(updated.options, created.options);
        assert_eq!(updated.category, created.category);

        assert_eq!(store.find(created.id).await.unwrap(), Some(updated));
    }

    async fn delete_removes(store: &dyn QuestionStore) {
        let created = store.create(QuestionCore::example()).await.unwrap();
        let before = store.list_all().await.unwrap().len();

        store.delete(created.id).await.unwrap();
        assert_eq!(store.find(created.id).await.unwrap(), None);
        assert_eq!(store.list_all().await.unwrap().len(), before - 1);
    }

    async fn missing_ids(store: &dyn QuestionStore) {
        let before = store.list_all().await.unwrap().len();

        let result = store.delete(9999).await;
        assert!(matches!(result, Err(Error::NotFound(_))));
        let result = store.update(9999, QuestionPatch::default()).await;
        assert!(matches!(result, Err(Error::NotFound(_))));

        assert_eq!(store.list_all().await.unwrap().len(), before);
    }
}

use log::debug;
use sqlx::{
    postgres::{PgPool, PgPoolOptions},
    types::Json,
    FromRow,
};

use crate::error::{Error, Result};
use crate::model::question::{
    Answer, NewQuestion, Question, QuestionCore, QuestionId, QuestionPatch, DEFAULT_CATEGORY,
};

use super::QuestionStore;

const COLUMNS: &str = "id, type, question, options, correct_answer, category";

/// Questions kept in the `questions` table of a PostgreSQL database.
///
/// Connections come from a bounded pool. Each mutation runs in its own
/// transaction, which rolls back if it is dropped before committing.
pub struct PgQuestionStore {
    pool: PgPool,
}

impl PgQuestionStore {
    /// Open a pool of at most `pool_size` connections.
    pub async fn connect(database_url: &str, pool_size: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(pool_size)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    /// Create the questions table if it does not exist yet.
    ///
    /// This operation is idempotent.
    pub async fn ensure_schema(&self) -> Result<()> {
        debug!("Ensuring questions table exists");
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS questions (
                id SERIAL PRIMARY KEY,
                type VARCHAR(10) NOT NULL,
                question TEXT NOT NULL,
                options JSONB NOT NULL,
                correct_answer TEXT NOT NULL,
                category VARCHAR(100),
                created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

/// A raw row of the questions table.
#[derive(FromRow)]
struct QuestionRow {
    id: QuestionId,
    #[sqlx(rename = "type")]
    kind: String,
    question: String,
    options: Json<Vec<String>>,
    correct_answer: String,
    category: Option<String>,
}

impl TryFrom<QuestionRow> for Question {
    type Error = Error;

    fn try_from(row: QuestionRow) -> Result<Self> {
        let kind = row
            .kind
            .parse()
            .map_err(|kind| Error::Corrupt(format!("question {} has type '{kind}'", row.id)))?;
        Ok(Question::new(
            row.id,
            QuestionCore {
                kind,
                question: row.question,
                options: row.options.0,
                correct_answer: decode_answer(row.correct_answer),
                category: row
                    .category
                    .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            },
        ))
    }
}

/// Answers are stored as their JSON text so integers and strings stay distinct.
fn encode_answer(answer: &Answer) -> Result<String> {
    Ok(serde_json::to_string(answer)?)
}

/// Text that is not a JSON string or integer predates [`encode_answer`] and is taken verbatim.
fn decode_answer(stored: String) -> Answer {
    serde_json::from_str(&stored).unwrap_or(Answer::Text(stored))
}

#[rocket::async_trait]
impl QuestionStore for PgQuestionStore {
    async fn list_all(&self) -> Result<Vec<Question>> {
        sqlx::query_as::<_, QuestionRow>(&format!("SELECT {COLUMNS} FROM questions ORDER BY id"))
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Question::try_from)
            .collect()
    }

    async fn find(&self, id: QuestionId) -> Result<Option<Question>> {
        sqlx::query_as::<_, QuestionRow>(&format!("SELECT {COLUMNS} FROM questions WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Question::try_from)
            .transpose()
    }

    async fn create(&self, question: NewQuestion) -> Result<Question> {
        let mut tx = self.pool.begin().await?;

        // Concurrent creates must not compute the same next ID.
        sqlx::query("LOCK TABLE questions IN SHARE ROW EXCLUSIVE MODE")
            .execute(&mut *tx)
            .await?;

        let row = sqlx::query_as::<_, QuestionRow>(&format!(
            "INSERT INTO questions ({COLUMNS}) \
             SELECT COALESCE(MAX(id), 0) + 1, $1, $2, $3, $4, $5 FROM questions \
             RETURNING {COLUMNS}"
        ))
        .bind(question.kind.as_str())
        .bind(&question.question)
        .bind(Json(&question.options))
        .bind(encode_answer(&question.correct_answer)?)
        .bind(&question.category)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Question::try_from(row)
    }

    async fn update(&self, id: QuestionId, patch: QuestionPatch) -> Result<Question> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, QuestionRow>(&format!(
            "SELECT {COLUMNS} FROM questions WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| Error::not_found(format!("Question {id}")))?;
        let mut question = Question::try_from(row)?;
        question.apply(patch);

        sqlx::query(
            "UPDATE questions \
             SET type = $2, question = $3, options = $4, correct_answer = $5, category = $6, \
                 updated_at = CURRENT_TIMESTAMP \
             WHERE id = $1",
        )
        .bind(id)
        .bind(question.kind.as_str())
        .bind(&question.question)
        .bind(Json(&question.options))
        .bind(encode_answer(&question.correct_answer)?)
        .bind(&question.category)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(question)
    }

    async fn delete(&self, id: QuestionId) -> Result<()> {
        let result = sqlx::query("DELETE FROM questions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            Err(Error::not_found(format!("Question {id}")))
        } else {
            Ok(())
        }
    }
}

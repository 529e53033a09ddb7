use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use rocket::tokio::{fs, sync::Mutex};

use crate::error::{Error, Result};
use crate::model::question::{NewQuestion, Question, QuestionId, QuestionPatch};

use super::QuestionStore;

/// Questions kept as a pretty-printed JSON array in a single UTF-8 file.
///
/// Every operation re-reads the file. Mutations within this process are
/// serialised so that rapid creates never hand out the same ID; separate
/// processes sharing the file can still overwrite each other. A file that
/// cannot be parsed is left untouched and every mutation fails.
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole collection in file order.
    ///
    /// A missing file is an empty collection. `None` means the file exists but
    /// does not hold a JSON array of questions; a warning is logged.
    async fn read(&self) -> Result<Option<Vec<Question>>> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Some(Vec::new())),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_str(&raw) {
            Ok(questions) => Ok(Some(questions)),
            Err(e) => {
                warn!("Unreadable questions file {}: {e}", self.path.display());
                Ok(None)
            }
        }
    }

    /// The collection for reading. An unreadable file reads as empty.
    async fn load(&self) -> Result<Vec<Question>> {
        Ok(self.read().await?.unwrap_or_default())
    }

    /// The collection for modification. An unreadable file is never
    /// overwritten, so this fails instead.
    async fn load_for_update(&self) -> Result<Vec<Question>> {
        self.read().await?.ok_or_else(|| {
            Error::Corrupt(format!(
                "{} cannot be read as a list of questions",
                self.path.display()
            ))
        })
    }

    /// Overwrite the file with the given collection.
    ///
    /// The data is written to a sibling temporary file first and then renamed
    /// into place.
    async fn save(&self, questions: &[Question]) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir).await?;
        }
        let json = serde_json::to_string_pretty(questions)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        fs::write(&tmp, json).await?;
        fs::rename(&tmp, &self.path).await?;
        debug!(
            "Saved {} questions to {}",
            questions.len(),
            self.path.display()
        );
        Ok(())
    }
}

#[rocket::async_trait]
impl QuestionStore for JsonFileStore {
    async fn list_all(&self) -> Result<Vec<Question>> {
        let mut questions = self.load().await?;
        questions.sort_by_key(|q| q.id);
        Ok(questions)
    }

    async fn find(&self, id: QuestionId) -> Result<Option<Question>> {
        Ok(self.load().await?.into_iter().find(|q| q.id == id))
    }

    async fn create(&self, question: NewQuestion) -> Result<Question> {
        let _guard = self.write_lock.lock().await;
        let mut questions = self.load_for_update().await?;
        let id = questions.iter().map(|q| q.id).max().unwrap_or(0) + 1;
        let question = Question::new(id, question);
        questions.push(question.clone());
        self.save(&questions).await?;
        Ok(question)
    }

    async fn update(&self, id: QuestionId, patch: QuestionPatch) -> Result<Question> {
        let _guard = self.write_lock.lock().await;
        let mut questions = self.load_for_update().await?;
        let question = questions
            .iter_mut()
            .find(|q| q.id == id)
            .ok_or_else(|| Error::not_found(format!("Question {id}")))?;
        question.apply(patch);
        let question = question.clone();
        self.save(&questions).await?;
        Ok(question)
    }

    async fn delete(&self, id: QuestionId) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut questions = self.load_for_update().await?;
        let before = questions.len();
        questions.retain(|q| q.id != id);
        if questions.len() == before {
            return Err(Error::not_found(format!("Question {id}")));
        }
        self.save(&questions).await
    }
}

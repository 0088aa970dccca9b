use async_trait::async_trait;

use crate::models::*;

#[derive(thiserror::Error, Debug)]
pub enum RepoError {
    #[error("not found")] NotFound,
    #[error("invalid: {0}")] Invalid(String),
    #[error("store unavailable")] Unavailable,
    #[error("internal: {0}")] Internal(String),
}

pub type RepoResult<T> = Result<T, RepoError>;

#[async_trait]
pub trait CategoryRepo: Send + Sync {
    /// All categories, ascending id.
    async fn list_categories(&self) -> RepoResult<Vec<Category>>;
    async fn get_category(&self, id: Id) -> RepoResult<Category>;
}

#[async_trait]
pub trait QuestionRepo: Send + Sync {
    /// All questions, ascending id.
    async fn list_questions(&self) -> RepoResult<Vec<Question>>;
    async fn get_question(&self, id: Id) -> RepoResult<Question>;
    async fn create_question(&self, new: NewQuestion) -> RepoResult<Question>;
    async fn delete_question(&self, id: Id) -> RepoResult<()>;
    /// Case-insensitive substring match on the question text.
    async fn search_questions(&self, term: &str) -> RepoResult<Vec<Question>>;
    /// Questions whose text category equals `category`.
    async fn questions_in_category(&self, category: &str) -> RepoResult<Vec<Question>>;
    /// Questions not in `previous`, restricted to `category` when given.
    async fn quiz_pool(&self, previous: &[Id], category: Option<&str>) -> RepoResult<Vec<Question>>;
}

pub trait Repo: CategoryRepo + QuestionRepo {}

impl<T> Repo for T where T: CategoryRepo + QuestionRepo {}

#[cfg(feature = "inmem-store")]
pub mod inmem {
    use super::*;
    use serde::{Deserialize, Serialize};
    use std::collections::BTreeMap;
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
    use tracing::{info, warn};

    use crate::seed;

    #[derive(Default, Serialize, Deserialize)]
    struct State {
        categories: BTreeMap<Id, Category>,
        questions: BTreeMap<Id, Question>,
        next_id: Id,
    }

    impl State {
        fn from_rows(categories: Vec<Category>, questions: Vec<Question>) -> Self {
            let next_id = questions.iter().map(|q| q.id).max().unwrap_or(0);
            Self {
                categories: categories.into_iter().map(|c| (c.id, c)).collect(),
                questions: questions.into_iter().map(|q| (q.id, q)).collect(),
                next_id,
            }
        }
    }

    /// Process-local store. With a snapshot path every mutation is written
    /// through to a JSON file.
    #[derive(Clone, Default)]
    pub struct InMemRepo {
        state: Arc<RwLock<State>>,
        snapshot_path: Option<Arc<PathBuf>>,
    }

    impl InMemRepo {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_data(categories: Vec<Category>, questions: Vec<Question>) -> Self {
            Self {
                state: Arc::new(RwLock::new(State::from_rows(categories, questions))),
                snapshot_path: None,
            }
        }

        /// Stock trivia data, not persisted.
        pub fn seeded() -> Self {
            Self::with_data(seed::categories(), seed::questions())
        }

        /// Load the snapshot at `path`, falling back to the stock data (or an
        /// empty store) when there is none.
        pub fn open(path: impl Into<PathBuf>, seed_when_missing: bool) -> Self {
            let path = path.into();
            let state = Self::load_state_from(&path).unwrap_or_else(|| {
                if seed_when_missing {
                    info!("seeding in-memory store with stock trivia data");
                    State::from_rows(seed::categories(), seed::questions())
                } else {
                    State::default()
                }
            });
            Self {
                state: Arc::new(RwLock::new(state)),
                snapshot_path: Some(Arc::new(path)),
            }
        }

        fn load_state_from(path: &Path) -> Option<State> {
            let bytes = match std::fs::read(path) {
                Ok(b) => b,
                Err(e) => {
                    info!("no snapshot at '{}': {e}", path.display());
                    return None;
                }
            };
            match serde_json::from_slice::<State>(&bytes) {
                Ok(s) => {
                    info!("loaded snapshot '{}'", path.display());
                    Some(s)
                }
                Err(e) => {
                    warn!("failed to parse snapshot '{}': {e}", path.display());
                    None
                }
            }
        }

        fn read(&self) -> RwLockReadGuard<'_, State> {
            self.state.read().unwrap_or_else(PoisonError::into_inner)
        }

        fn write(&self) -> RwLockWriteGuard<'_, State> {
            self.state.write().unwrap_or_else(PoisonError::into_inner)
        }

        // callers hold the write guard, so the snapshot is exactly `state`
        fn persist(&self, state: &State) -> RepoResult<()> {
            let Some(path) = self.snapshot_path.as_deref() else { return Ok(()) };
            let bytes = serde_json::to_vec_pretty(state)
                .map_err(|e| RepoError::Internal(e.to_string()))?;
            if let Some(dir) = path.parent() {
                std::fs::create_dir_all(dir).map_err(|e| RepoError::Internal(e.to_string()))?;
            }
            std::fs::write(path, bytes).map_err(|e| {
                warn!("failed to write snapshot '{}': {e}", path.display());
                RepoError::Internal(e.to_string())
            })
        }

        fn collect<F>(&self, keep: F) -> Vec<Question>
        where
            F: Fn(&Question) -> bool,
        {
            self.read().questions.values().filter(|&q| keep(q)).cloned().collect()
        }
    }

    #[async_trait]
    impl CategoryRepo for InMemRepo {
        async fn list_categories(&self) -> RepoResult<Vec<Category>> {
            Ok(self.read().categories.values().cloned().collect())
        }

        async fn get_category(&self, id: Id) -> RepoResult<Category> {
            self.read().categories.get(&id).cloned().ok_or(RepoError::NotFound)
        }
    }

    #[async_trait]
    impl QuestionRepo for InMemRepo {
        async fn list_questions(&self) -> RepoResult<Vec<Question>> {
            Ok(self.collect(|_| true))
        }

        async fn get_question(&self, id: Id) -> RepoResult<Question> {
            self.read().questions.get(&id).cloned().ok_or(RepoError::NotFound)
        }

        async fn create_question(&self, new: NewQuestion) -> RepoResult<Question> {
            let mut s = self.write();
            let question = Question {
                id: s.next_id + 1,
                question: new.question,
                answer: new.answer,
                category: new.category,
                difficulty: new.difficulty,
            };
            s.next_id = question.id;
            s.questions.insert(question.id, question.clone());
            if let Err(e) = self.persist(&s) {
                s.questions.remove(&question.id);
                s.next_id -= 1;
                return Err(e);
            }
            Ok(question)
        }

        async fn delete_question(&self, id: Id) -> RepoResult<()> {
            let mut s = self.write();
            let removed = s.questions.remove(&id).ok_or(RepoError::NotFound)?;
            if let Err(e) = self.persist(&s) {
                // roll back
                s.questions.insert(id, removed);
                return Err(e);
            }
            Ok(())
        }

        async fn search_questions(&self, term: &str) -> RepoResult<Vec<Question>> {
            let needle = term.to_lowercase();
            Ok(self.collect(|q| q.question.to_lowercase().contains(&needle)))
        }

        async fn questions_in_category(&self, category: &str) -> RepoResult<Vec<Question>> {
            Ok(self.collect(|q| q.category == category))
        }

        async fn quiz_pool(&self, previous: &[Id], category: Option<&str>) -> RepoResult<Vec<Question>> {
            Ok(self.collect(|q| {
                !previous.contains(&q.id) && category.map_or(true, |c| q.category == c)
            }))
        }
    }
}

#[cfg(feature = "postgres-store")]
pub mod pg {
    use super::*;
    use sqlx::{Pool, Postgres};

    const QUESTION_COLUMNS: &str = "id, question, answer, category, difficulty";

    // `%` and `_` in a search term match literally, as in the in-memory store
    pub(crate) fn like_pattern(term: &str) -> String {
        let mut escaped = String::with_capacity(term.len() + 2);
        escaped.push('%');
        for c in term.chars() {
            if matches!(c, '\\' | '%' | '_') {
                escaped.push('\\');
            }
            escaped.push(c);
        }
        escaped.push('%');
        escaped
    }

    #[derive(Clone)]
    pub struct PgRepo { pool: Pool<Postgres> }

    impl PgRepo {
        pub fn new(pool: Pool<Postgres>) -> Self { Self { pool } }

        pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
            sqlx::migrate!("./migrations").run(&self.pool).await
        }
    }

    fn db_err(e: sqlx::Error) -> RepoError {
        match e {
            sqlx::Error::RowNotFound => RepoError::NotFound,
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => RepoError::Unavailable,
            // SQLSTATE class 22 (data exception) / 23 (integrity constraint)
            sqlx::Error::Database(db)
                if db.code().is_some_and(|c| c.starts_with("22") || c.starts_with("23")) =>
            {
                RepoError::Invalid(db.message().to_string())
            }
            other => RepoError::Internal(other.to_string()),
        }
    }

    #[async_trait]
    impl CategoryRepo for PgRepo {
        async fn list_categories(&self) -> RepoResult<Vec<Category>> {
            sqlx::query_as::<_, Category>("SELECT id, type FROM categories ORDER BY id")
                .fetch_all(&self.pool).await.map_err(db_err)
        }

        async fn get_category(&self, id: Id) -> RepoResult<Category> {
            sqlx::query_as::<_, Category>("SELECT id, type FROM categories WHERE id = $1")
                .bind(id)
                .fetch_one(&self.pool).await.map_err(db_err)
        }
    }

    #[async_trait]
    impl QuestionRepo for PgRepo {
        async fn list_questions(&self) -> RepoResult<Vec<Question>> {
            let sql = format!("SELECT {QUESTION_COLUMNS} FROM questions ORDER BY id");
            sqlx::query_as::<_, Question>(&sql)
                .fetch_all(&self.pool).await.map_err(db_err)
        }

        async fn get_question(&self, id: Id) -> RepoResult<Question> {
            let sql = format!("SELECT {QUESTION_COLUMNS} FROM questions WHERE id = $1");
            sqlx::query_as::<_, Question>(&sql)
                .bind(id)
                .fetch_one(&self.pool).await.map_err(db_err)
        }

        async fn create_question(&self, new: NewQuestion) -> RepoResult<Question> {
            let sql = format!(
                "INSERT INTO questions (question, answer, category, difficulty) VALUES ($1,$2,$3,$4) RETURNING {QUESTION_COLUMNS}"
            );
            sqlx::query_as::<_, Question>(&sql)
                .bind(&new.question)
                .bind(&new.answer)
                .bind(&new.category)
                .bind(new.difficulty)
                .fetch_one(&self.pool).await.map_err(db_err)
        }

        async fn delete_question(&self, id: Id) -> RepoResult<()> {
            let mut tx = self.pool.begin().await.map_err(db_err)?;
            let res = sqlx::query("DELETE FROM questions WHERE id = $1")
                .bind(id)
                .execute(&mut *tx).await.map_err(db_err)?;
            if res.rows_affected() == 0 {
                return Err(RepoError::NotFound); // tx dropped -> rollback
            }
            tx.commit().await.map_err(db_err)
        }

        async fn search_questions(&self, term: &str) -> RepoResult<Vec<Question>> {
            let sql = format!(
                "SELECT {QUESTION_COLUMNS} FROM questions WHERE question ILIKE $1 ESCAPE '\\' ORDER BY id"
            );
            sqlx::query_as::<_, Question>(&sql)
                .bind(like_pattern(term))
                .fetch_all(&self.pool).await.map_err(db_err)
        }

        async fn questions_in_category(&self, category: &str) -> RepoResult<Vec<Question>> {
            let sql = format!("SELECT {QUESTION_COLUMNS} FROM questions WHERE category = $1 ORDER BY id");
            sqlx::query_as::<_, Question>(&sql)
                .bind(category)
                .fetch_all(&self.pool).await.map_err(db_err)
        }

        async fn quiz_pool(&self, previous: &[Id], category: Option<&str>) -> RepoResult<Vec<Question>> {
            let sql = format!(
                "SELECT {QUESTION_COLUMNS} FROM questions \
                 WHERE NOT (id = ANY($1)) AND ($2::TEXT IS NULL OR category = $2) \
                 ORDER BY id"
            );
            sqlx::query_as::<_, Question>(&sql)
                .bind(previous.to_vec())
                .bind(category)
                .fetch_all(&self.pool).await.map_err(db_err)
        }
    }

}

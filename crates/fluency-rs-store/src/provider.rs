//! Test store interface and the JSONL file implementation.

use crate::error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fluency_rs_protocol::{
    AttemptId, AttemptSubmission, CefrLevel, NewTest, Skill, Subject, Test, TestAttempt, TestId,
};
use log::{debug, info};
use parking_lot::Mutex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// File holding one test per line.
const TESTS_FILE: &str = "tests.jsonl";
/// File holding one attempt per line.
const ATTEMPTS_FILE: &str = "test_attempts.jsonl";

/// Filter for listing tests. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestFilter {
    pub subject: Option<Subject>,
    pub skill: Option<Skill>,
    pub level: Option<CefrLevel>,
    pub user_id: Option<String>,
}

impl TestFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subject(mut self, subject: Subject) -> Self {
        self.subject = Some(subject);
        self
    }

    pub fn skill(mut self, skill: Skill) -> Self {
        self.skill = Some(skill);
        self
    }

    pub fn level(mut self, level: CefrLevel) -> Self {
        self.level = Some(level);
        self
    }

    pub fn owner(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn matches(&self, test: &Test) -> bool {
        self.subject.is_none_or(|subject| test.subject == subject)
            && self.skill.is_none_or(|skill| test.skill == skill)
            && self.level.is_none_or(|level| test.level == level)
            && self
                .user_id
                .as_deref()
                .is_none_or(|user_id| test.user_id.as_deref() == Some(user_id))
    }
}

/// Test and attempt persistence used by the orchestrator.
#[async_trait]
pub trait TestStore: Send + Sync {
    /// Persist a new test, assigning its id and creation time.
    async fn insert_test(&self, test: NewTest) -> Result<Test, StoreError>;

    /// Fetch a test by id.
    async fn get_test(&self, id: TestId) -> Result<Option<Test>, StoreError>;

    /// List tests matching a filter, newest first.
    async fn list_tests(&self, filter: &TestFilter) -> Result<Vec<Test>, StoreError>;

    /// Begin an attempt on an existing test.
    async fn create_attempt(
        &self,
        test_id: TestId,
        user_id: &str,
    ) -> Result<TestAttempt, StoreError>;

    /// Write answers, feedback, score, and completion time in one update.
    async fn submit_attempt(
        &self,
        attempt_id: AttemptId,
        submission: AttemptSubmission,
    ) -> Result<TestAttempt, StoreError>;

    /// Fetch an attempt by id.
    async fn get_attempt(&self, id: AttemptId) -> Result<Option<TestAttempt>, StoreError>;

    /// List a user's attempts, most recently started first.
    async fn user_attempts(&self, user_id: &str) -> Result<Vec<TestAttempt>, StoreError>;

    /// Oldest test for the catalog slot that the user has not attempted.
    async fn next_unattempted_test(
        &self,
        user_id: &str,
        subject: Subject,
        skill: Skill,
        level: CefrLevel,
    ) -> Result<Option<Test>, StoreError> {
        let filter = TestFilter::new().subject(subject).skill(skill).level(level);
        let mut tests = self.list_tests(&filter).await?;
        if tests.is_empty() {
            return Ok(None);
        }
        tests.reverse();
        tests.sort_by_key(|test| test.created_at);
        let attempted: HashSet<TestId> = self
            .user_attempts(user_id)
            .await?
            .into_iter()
            .map(|attempt| attempt.test_id)
            .collect();
        Ok(tests.into_iter().find(|test| !attempted.contains(&test.id)))
    }

    /// Whether the user completed every test for a subject and skill.
    ///
    /// True when no such tests exist, so callers know to generate one.
    async fn has_completed_all(
        &self,
        user_id: &str,
        subject: Subject,
        skill: Skill,
    ) -> Result<bool, StoreError> {
        let filter = TestFilter::new().subject(subject).skill(skill);
        let tests = self.list_tests(&filter).await?;
        if tests.is_empty() {
            return Ok(true);
        }
        let completed: HashSet<TestId> = self
            .user_attempts(user_id)
            .await?
            .into_iter()
            .filter(TestAttempt::is_completed)
            .map(|attempt| attempt.test_id)
            .collect();
        Ok(tests.iter().all(|test| completed.contains(&test.id)))
    }
}

/// Build a fresh attempt row.
pub(crate) fn new_attempt(test_id: TestId, user_id: &str) -> TestAttempt {
    TestAttempt {
        id: Uuid::new_v4(),
        test_id,
        user_id: user_id.to_string(),
        started_at: Utc::now(),
        completed_at: None,
        answers: Default::default(),
        feedback: None,
        score: None,
    }
}

/// Apply a submission to an attempt, refusing a second submission.
pub(crate) fn apply_submission(
    attempt: &mut TestAttempt,
    submission: AttemptSubmission,
    now: DateTime<Utc>,
) -> Result<(), StoreError> {
    if attempt.is_completed() {
        return Err(StoreError::AttemptCompleted(attempt.id));
    }
    attempt.answers = submission.answers;
    attempt.feedback = submission.feedback;
    attempt.score = submission.score;
    attempt.completed_at = Some(now);
    Ok(())
}

/// Sort tests newest first; ties keep the latest insert first.
pub(crate) fn newest_first(mut tests: Vec<Test>) -> Vec<Test> {
    tests.reverse();
    tests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    tests
}

/// Sort attempts most recently started first.
pub(crate) fn latest_attempts_first(mut attempts: Vec<TestAttempt>) -> Vec<TestAttempt> {
    attempts.reverse();
    attempts.sort_by(|a, b| b.started_at.cmp(&a.started_at));
    attempts
}

/// File-backed store keeping tests and attempts as JSONL tables.
#[derive(Debug)]
pub struct FileTestStore {
    /// Root directory for the tables.
    root: PathBuf,
    /// Serializes writers within this process.
    write_lock: Mutex<()>,
}

impl FileTestStore {
    /// Create a new file-backed store under the given root.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        info!("initialized file test store (root={})", root.display());
        Ok(Self {
            root,
            write_lock: Mutex::new(()),
        })
    }

    fn tests_path(&self) -> PathBuf {
        self.root.join(TESTS_FILE)
    }

    fn attempts_path(&self) -> PathBuf {
        self.root.join(ATTEMPTS_FILE)
    }

    fn load_tests(&self) -> Result<Vec<Test>, StoreError> {
        load_rows(&self.tests_path())
    }

    fn load_attempts(&self) -> Result<Vec<TestAttempt>, StoreError> {
        load_rows(&self.attempts_path())
    }
}

/// Load all rows from a JSONL table.
fn load_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, StoreError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let file = OpenOptions::new().read(true).open(path)?;
    let reader = BufReader::new(file);
    let mut rows = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        rows.push(serde_json::from_str(&line)?);
    }
    Ok(rows)
}

/// Append one row to a JSONL table.
fn append_row<T: Serialize>(path: &Path, row: &T) -> Result<(), StoreError> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let line = serde_json::to_string(row)?;
    writeln!(file, "{line}")?;
    Ok(())
}

/// Rewrite a table atomically through a temp file.
fn write_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), StoreError> {
    let temp_path = path.with_extension("jsonl.tmp");
    {
        let mut file = OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(&temp_path)?;
        for row in rows {
            let line = serde_json::to_string(row)?;
            writeln!(file, "{line}")?;
        }
    }
    std::fs::rename(temp_path, path)?;
    Ok(())
}

#[async_trait]
impl TestStore for FileTestStore {
    async fn insert_test(&self, test: NewTest) -> Result<Test, StoreError> {
        let test = Test::from_new(test, Uuid::new_v4(), Utc::now());
        let _guard = self.write_lock.lock();
        append_row(&self.tests_path(), &test)?;
        debug!(
            "stored test (id={}, subject={}, skill={}, level={}, questions={})",
            test.id,
            test.subject,
            test.skill,
            test.level,
            test.questions.len()
        );
        Ok(test)
    }

    async fn get_test(&self, id: TestId) -> Result<Option<Test>, StoreError> {
        Ok(self.load_tests()?.into_iter().find(|test| test.id == id))
    }

    async fn list_tests(&self, filter: &TestFilter) -> Result<Vec<Test>, StoreError> {
        let mut tests = self.load_tests()?;
        tests.retain(|test| filter.matches(test));
        Ok(newest_first(tests))
    }

    async fn create_attempt(
        &self,
        test_id: TestId,
        user_id: &str,
    ) -> Result<TestAttempt, StoreError> {
        if self.get_test(test_id).await?.is_none() {
            return Err(StoreError::TestNotFound(test_id));
        }
        let attempt = new_attempt(test_id, user_id);
        let _guard = self.write_lock.lock();
        append_row(&self.attempts_path(), &attempt)?;
        debug!(
            "started attempt (id={}, test_id={}, user_id={})",
            attempt.id, test_id, user_id
        );
        Ok(attempt)
    }

    async fn submit_attempt(
        &self,
        attempt_id: AttemptId,
        submission: AttemptSubmission,
    ) -> Result<TestAttempt, StoreError> {
        let _guard = self.write_lock.lock();
        let mut attempts = self.load_attempts()?;
        let attempt = attempts
            .iter_mut()
            .find(|attempt| attempt.id == attempt_id)
            .ok_or(StoreError::AttemptNotFound(attempt_id))?;
        apply_submission(attempt, submission, Utc::now())?;
        let updated = attempt.clone();
        write_rows(&self.attempts_path(), &attempts)?;
        info!(
            "attempt submitted (id={}, answers={}, score={:?})",
            updated.id,
            updated.answers.len(),
            updated.score
        );
        Ok(updated)
    }

    async fn get_attempt(&self, id: AttemptId) -> Result<Option<TestAttempt>, StoreError> {
        Ok(self
            .load_attempts()?
            .into_iter()
            .find(|attempt| attempt.id == id))
    }

    async fn user_attempts(&self, user_id: &str) -> Result<Vec<TestAttempt>, StoreError> {
        let mut attempts = self.load_attempts()?;
        attempts.retain(|attempt| attempt.user_id == user_id);
        Ok(latest_attempts_first(attempts))
    }
}

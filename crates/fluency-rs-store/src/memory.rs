//! In-process test store used by tests and the `memory` store provider.

use crate::error::StoreError;
use crate::provider::{
    TestFilter, TestStore, apply_submission, latest_attempts_first, new_attempt, newest_first,
};
use async_trait::async_trait;
use chrono::Utc;
use fluency_rs_protocol::{AttemptId, AttemptSubmission, NewTest, Test, TestAttempt, TestId};
use log::debug;
use parking_lot::RwLock;
use uuid::Uuid;

/// Test store holding every row in memory; contents are lost on drop.
#[derive(Debug, Default)]
pub struct InMemoryTestStore {
    tests: RwLock<Vec<Test>>,
    attempts: RwLock<Vec<TestAttempt>>,
}

impl InMemoryTestStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with already-persisted tests.
    pub fn with_tests(tests: Vec<Test>) -> Self {
        Self {
            tests: RwLock::new(tests),
            attempts: RwLock::new(Vec::new()),
        }
    }

    pub fn test_count(&self) -> usize {
        self.tests.read().len()
    }
}

#[async_trait]
impl TestStore for InMemoryTestStore {
    async fn insert_test(&self, test: NewTest) -> Result<Test, StoreError> {
        let test = Test::from_new(test, Uuid::new_v4(), Utc::now());
        self.tests.write().push(test.clone());
        debug!("stored test in memory (id={})", test.id);
        Ok(test)
    }

    async fn get_test(&self, id: TestId) -> Result<Option<Test>, StoreError> {
        Ok(self.tests.read().iter().find(|test| test.id == id).cloned())
    }

    async fn list_tests(&self, filter: &TestFilter) -> Result<Vec<Test>, StoreError> {
        let tests = self
            .tests
            .read()
            .iter()
            .filter(|test| filter.matches(test))
            .cloned()
            .collect();
        Ok(newest_first(tests))
    }

    async fn create_attempt(
        &self,
        test_id: TestId,
        user_id: &str,
    ) -> Result<TestAttempt, StoreError> {
        if !self.tests.read().iter().any(|test| test.id == test_id) {
            return Err(StoreError::TestNotFound(test_id));
        }
        let attempt = new_attempt(test_id, user_id);
        self.attempts.write().push(attempt.clone());
        Ok(attempt)
    }

    async fn submit_attempt(
        &self,
        attempt_id: AttemptId,
        submission: AttemptSubmission,
    ) -> Result<TestAttempt, StoreError> {
        let mut attempts = self.attempts.write();
        let attempt = attempts
            .iter_mut()
            .find(|attempt| attempt.id == attempt_id)
            .ok_or(StoreError::AttemptNotFound(attempt_id))?;
        apply_submission(attempt, submission, Utc::now())?;
        Ok(attempt.clone())
    }

    async fn get_attempt(&self, id: AttemptId) -> Result<Option<TestAttempt>, StoreError> {
        Ok(self
            .attempts
            .read()
            .iter()
            .find(|attempt| attempt.id == id)
            .cloned())
    }

    async fn user_attempts(&self, user_id: &str) -> Result<Vec<TestAttempt>, StoreError> {
        let attempts = self
            .attempts
            .read()
            .iter()
            .filter(|attempt| attempt.user_id == user_id)
            .cloned()
            .collect();
        Ok(latest_attempts_first(attempts))
    }
}

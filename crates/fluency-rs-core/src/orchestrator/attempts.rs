//! Attempt lifecycle and catalog queries on the orchestrator.

use super::Orchestrator;
use crate::error::GenerationError;
use crate::scoring::score_answers;
use fluency_rs_protocol::{
    AnswerSheet, AttemptId, AttemptSubmission, CefrLevel, Skill, Subject, Test, TestAttempt,
    TestId,
};
use fluency_rs_store::{StoreError, TestFilter};
use log::{info, warn};

impl Orchestrator {
    /// Begin an attempt at a stored test.
    pub async fn start_attempt(
        &self,
        test_id: TestId,
        user_id: &str,
    ) -> Result<TestAttempt, GenerationError> {
        let attempt = self
            .store
            .create_attempt(test_id, user_id)
            .await
            .map_err(not_found)?;
        info!(
            "attempt started (id={}, test={}, user={})",
            attempt.id, test_id, user_id
        );
        Ok(attempt)
    }

    /// Score, request feedback for, and store a finished attempt.
    ///
    /// A feedback failure is logged and the attempt is stored without
    /// feedback. A second submission of the same attempt is refused.
    pub async fn submit_attempt(
        &self,
        attempt_id: AttemptId,
        answers: AnswerSheet,
    ) -> Result<TestAttempt, GenerationError> {
        let attempt = self
            .store
            .get_attempt(attempt_id)
            .await?
            .ok_or_else(|| GenerationError::NotFound(format!("attempt {attempt_id}")))?;
        if attempt.is_completed() {
            return Err(StoreError::AttemptCompleted(attempt_id).into());
        }
        let test = self
            .store
            .get_test(attempt.test_id)
            .await?
            .ok_or_else(|| GenerationError::NotFound(format!("test {}", attempt.test_id)))?;

        let score = score_answers(&test.questions, &answers);
        let feedback = match self
            .generate_feedback(test.level, &answers, &test.questions)
            .await
        {
            Ok(feedback) => Some(feedback),
            Err(err) => {
                warn!("storing attempt without feedback (id={attempt_id}, error={err})");
                None
            }
        };

        let submission = AttemptSubmission {
            answers,
            feedback,
            score: Some(f64::from(score.percent)),
        };
        let attempt = self.store.submit_attempt(attempt_id, submission).await?;
        info!(
            "attempt submitted (id={}, score={}/{})",
            attempt.id, score.correct, score.total_scorable
        );
        Ok(attempt)
    }

    /// Oldest stored test for the catalog slot the user has not attempted.
    pub async fn next_available_test(
        &self,
        user_id: &str,
        subject: Subject,
        skill: Skill,
        level: CefrLevel,
    ) -> Result<Option<Test>, GenerationError> {
        Ok(self
            .store
            .next_unattempted_test(user_id, subject, skill, level)
            .await?)
    }

    /// Whether every stored test for `subject`/`skill` has a completed attempt.
    pub async fn has_completed_all(
        &self,
        user_id: &str,
        subject: Subject,
        skill: Skill,
    ) -> Result<bool, GenerationError> {
        Ok(self.store.has_completed_all(user_id, subject, skill).await?)
    }

    pub async fn list_tests(&self, filter: &TestFilter) -> Result<Vec<Test>, GenerationError> {
        Ok(self.store.list_tests(filter).await?)
    }

    pub async fn user_attempts(&self, user_id: &str) -> Result<Vec<TestAttempt>, GenerationError> {
        Ok(self.store.user_attempts(user_id).await?)
    }
}

fn not_found(err: StoreError) -> GenerationError {
    match err {
        StoreError::TestNotFound(id) => GenerationError::NotFound(format!("test {id}")),
        StoreError::AttemptNotFound(id) => GenerationError::NotFound(format!("attempt {id}")),
        other => GenerationError::Store(other),
    }
}

//! Tests, attempts, and generation requests.

use crate::catalog::{CefrLevel, Skill, Subject};
use crate::question::{AnswerSheet, Question};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a test.
pub type TestId = Uuid;
/// Unique identifier for a test attempt.
pub type AttemptId = Uuid;
/// Identifier of the owning user, as issued by the auth backend.
pub type UserId = String;

/// Default number of questions per generated test.
pub const DEFAULT_QUESTION_COUNT: usize = 5;

/// Parameters for a single test generation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub level: CefrLevel,
    pub skill: Skill,
    pub subject: Subject,
    pub question_count: usize,
    /// Owner of the generated test; enables the reuse check.
    pub user_id: Option<UserId>,
    /// Skip reuse and cache lookups.
    pub force_regenerate: bool,
}

impl GenerationRequest {
    pub fn new(level: CefrLevel, skill: Skill, subject: Subject) -> Self {
        Self {
            level,
            skill,
            subject,
            question_count: DEFAULT_QUESTION_COUNT,
            user_id: None,
            force_regenerate: false,
        }
    }

    pub fn with_question_count(mut self, question_count: usize) -> Self {
        self.question_count = question_count;
        self
    }

    pub fn for_user(mut self, user_id: impl Into<UserId>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn force(mut self, force_regenerate: bool) -> Self {
        self.force_regenerate = force_regenerate;
        self
    }
}

/// Test body produced by the language model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedTest {
    pub title: String,
    pub description: String,
    /// Duration in minutes.
    pub duration: u32,
    pub questions: Vec<Question>,
}

/// A test ready to be written to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTest {
    pub title: String,
    pub description: String,
    pub duration: u32,
    pub level: CefrLevel,
    pub skill: Skill,
    pub subject: Subject,
    pub questions: Vec<Question>,
    pub user_id: Option<UserId>,
}

impl NewTest {
    /// Attach catalog coordinates and owner to a generated body.
    pub fn from_generated(generated: GeneratedTest, request: &GenerationRequest) -> Self {
        Self {
            title: generated.title,
            description: generated.description,
            duration: generated.duration,
            level: request.level,
            skill: request.skill,
            subject: request.subject,
            questions: generated.questions,
            user_id: request.user_id.clone(),
        }
    }
}

/// Persisted test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Test {
    pub id: TestId,
    pub title: String,
    pub description: String,
    /// Duration in minutes.
    pub duration: u32,
    #[serde(alias = "cefr_level")]
    pub level: CefrLevel,
    pub skill: Skill,
    pub subject: Subject,
    pub questions: Vec<Question>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

impl Test {
    /// Materialize a stored test from an insert payload.
    pub fn from_new(new: NewTest, id: TestId, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            title: new.title,
            description: new.description,
            duration: new.duration,
            level: new.level,
            skill: new.skill,
            subject: new.subject,
            questions: new.questions,
            user_id: new.user_id,
            created_at,
        }
    }

    pub fn time_limit(&self) -> Duration {
        Duration::minutes(i64::from(self.duration))
    }
}

/// A user's run through a test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestAttempt {
    pub id: AttemptId,
    pub test_id: TestId,
    pub user_id: UserId,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub answers: AnswerSheet,
    #[serde(default)]
    pub feedback: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
}

impl TestAttempt {
    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }
}

/// Values written to an attempt when it is submitted.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AttemptSubmission {
    pub answers: AnswerSheet,
    pub feedback: Option<String>,
    pub score: Option<f64>,
}

/// Countdown for a running attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptClock {
    deadline: DateTime<Utc>,
}

impl AttemptClock {
    pub fn new(started_at: DateTime<Utc>, time_limit: Duration) -> Self {
        Self {
            deadline: started_at + time_limit,
        }
    }

    pub fn for_attempt(test: &Test, attempt: &TestAttempt) -> Self {
        Self::new(attempt.started_at, test.time_limit())
    }

    pub fn deadline(&self) -> DateTime<Utc> {
        self.deadline
    }

    /// Time left before auto-submission, never negative.
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        let left = self.deadline - now;
        if left < Duration::zero() {
            Duration::zero()
        } else {
            left
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.deadline
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::question::Answer;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn stored_test() -> Test {
        Test {
            id: Uuid::new_v4(),
            title: "Reading A2".to_string(),
            description: "Short texts".to_string(),
            duration: 20,
            level: CefrLevel::A2,
            skill: Skill::Reading,
            subject: Subject::English,
            questions: Vec::new(),
            user_id: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_reads_legacy_level_column() {
        let test = stored_test();
        let mut value = serde_json::to_value(&test).expect("json");
        let level = value
            .as_object_mut()
            .expect("object")
            .remove("level")
            .expect("level");
        value["cefr_level"] = level;
        let back: Test = serde_json::from_value(value).expect("test");
        assert_eq!(back, test);
    }

    #[test]
    fn new_test_takes_request_coordinates() {
        let request = GenerationRequest::new(CefrLevel::C1, Skill::Writing, Subject::History)
            .for_user("user-1");
        let generated = GeneratedTest {
            title: "t".to_string(),
            description: "d".to_string(),
            duration: 45,
            questions: Vec::new(),
        };
        let new = NewTest::from_generated(generated, &request);
        assert_eq!(new.level, CefrLevel::C1);
        assert_eq!(new.subject, Subject::History);
        assert_eq!(new.user_id.as_deref(), Some("user-1"));
    }

    #[test]
    fn attempt_defaults_missing_columns() {
        let raw = json!({
            "id": Uuid::new_v4(),
            "test_id": Uuid::new_v4(),
            "user_id": "u",
            "started_at": "2025-01-01T00:00:00Z"
        });
        let attempt: TestAttempt = serde_json::from_value(raw).expect("attempt");
        assert!(!attempt.is_completed());
        assert!(attempt.answers.is_empty());
        assert_eq!(attempt.score, None);
    }

    #[test]
    fn attempt_answers_round_trip_through_json() {
        let mut attempt = TestAttempt {
            id: Uuid::new_v4(),
            test_id: Uuid::new_v4(),
            user_id: "u".to_string(),
            started_at: Utc::now(),
            completed_at: None,
            answers: Default::default(),
            feedback: None,
            score: None,
        };
        attempt.answers.insert(3, Answer::Text("hello".to_string()));
        let value = serde_json::to_value(&attempt).expect("json");
        assert_eq!(value["answers"], json!({"3": "hello"}));
    }

    #[test]
    fn clock_counts_down_to_zero() {
        let started = Utc::now();
        let clock = AttemptClock::new(started, Duration::minutes(10));
        assert_eq!(clock.remaining(started), Duration::minutes(10));
        assert!(!clock.is_expired(started + Duration::minutes(9)));
        assert!(clock.is_expired(started + Duration::minutes(10)));
        assert_eq!(
            clock.remaining(started + Duration::minutes(11)),
            Duration::zero()
        );
    }
}

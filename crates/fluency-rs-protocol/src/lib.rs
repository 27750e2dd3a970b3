//! Shared domain and wire types for Fluency: the CEFR catalog, questions,
//! tests, attempts, and the completion proxy bodies.

mod assessment;
mod catalog;
mod proxy;
mod question;

pub use assessment::{
    AttemptClock, AttemptId, AttemptSubmission, DEFAULT_QUESTION_COUNT, GeneratedTest,
    GenerationRequest, NewTest, Test, TestAttempt, TestId, UserId,
};
pub use catalog::{CefrLevel, ParseCatalogError, Skill, Subject};
pub use proxy::{ErrorBody, HealthStatus, PROXY_ROUTE, ProxyRequest, ProxyResponse};
pub use question::{Answer, AnswerSheet, Question, QuestionId};

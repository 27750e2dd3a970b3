//! Test generation orchestrator.
//!
//! Every generation call runs the same pipeline: quota check, reuse of an
//! unattempted stored test, memory cache lookup, generation through the
//! configured transport, parsing, and finally persistence.

mod attempts;
mod stores;

pub use stores::{StoreBundle, build_default_stores};

use crate::error::GenerationError;
use crate::parse::parse_generated_test;
use crate::prompt::{answer_transcript, feedback_prompt, test_generation_prompt};
use crate::rate_limit::RateLimiter;
use crate::transport::{CompletionTransport, build_transport};
use crate::upstream::CompletionParams;
use chrono::Utc;
use fluency_rs_config::{FluencyConfig, GenerationConfig};
use fluency_rs_protocol::{
    AnswerSheet, CefrLevel, GenerationRequest, NewTest, Question, Skill, Subject, Test,
};
use fluency_rs_store::{CacheKey, MemoryTestCache, QuotaStore, TestCache, TestStore};
use log::{debug, error, info, warn};
use std::sync::Arc;

/// Generation and attempt facade used by the CLI and embedding apps.
pub struct Orchestrator {
    config: Arc<GenerationConfig>,
    transport: Arc<dyn CompletionTransport>,
    store: Arc<dyn TestStore>,
    cache: Arc<dyn TestCache>,
    rate_limiter: RateLimiter,
}

impl Orchestrator {
    /// Construct an orchestrator. A missing transport is built from
    /// `generation.transport`; a missing cache defaults to [`MemoryTestCache`].
    pub fn new(
        config: &FluencyConfig,
        store: Arc<dyn TestStore>,
        quota_store: Arc<dyn QuotaStore>,
        transport: Option<Arc<dyn CompletionTransport>>,
        cache: Option<Arc<dyn TestCache>>,
    ) -> Result<Self, GenerationError> {
        info!("initializing orchestrator");
        let transport = match transport {
            Some(transport) => transport,
            None => build_transport(&config.generation)?,
        };
        let cache = cache.unwrap_or_else(|| Arc::new(MemoryTestCache::new()));
        let rate_limiter = RateLimiter::from_config(quota_store, &config.quota);
        debug!(
            "orchestrator wired (transport={}, max_requests={}, window_hours={})",
            transport.name(),
            config.quota.max_requests,
            config.quota.window_hours
        );
        Ok(Self {
            config: Arc::new(config.generation.clone()),
            transport,
            store,
            cache,
            rate_limiter,
        })
    }

    /// Generation settings in effect.
    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Underlying test store.
    pub fn store(&self) -> &Arc<dyn TestStore> {
        &self.store
    }

    /// Request with the configured default question count.
    pub fn request(&self, level: CefrLevel, skill: Skill, subject: Subject) -> GenerationRequest {
        GenerationRequest::new(level, skill, subject).with_question_count(self.config.question_count)
    }

    /// Return a test for `request`, generating and storing one if needed.
    pub async fn generate_test(&self, request: GenerationRequest) -> Result<Test, GenerationError> {
        let result = self.run_generation(&request).await;
        if let Err(err) = &result {
            error!(
                "test generation failed (subject={}, skill={}, level={}, error={})",
                request.subject, request.skill, request.level, err
            );
        }
        result
    }

    async fn run_generation(&self, request: &GenerationRequest) -> Result<Test, GenerationError> {
        if request.question_count == 0 {
            return Err(GenerationError::Validation(
                "question count must be greater than zero".to_string(),
            ));
        }
        self.rate_limiter.acquire(Utc::now())?;

        let key = CacheKey::for_request(request);
        if !request.force_regenerate {
            if let Some(user_id) = request.user_id.as_deref() {
                if let Some(test) = self
                    .store
                    .next_unattempted_test(user_id, request.subject, request.skill, request.level)
                    .await?
                {
                    info!("reusing unattempted test (id={}, user={})", test.id, user_id);
                    return Ok(test);
                }
            }
            if let Some(test) = self.cache.get(&key) {
                if self.cached_test_usable(&test, request.user_id.as_deref()).await? {
                    info!("serving cached test (id={})", test.id);
                    return Ok(test);
                }
                debug!("skipping cached test already attempted (id={})", test.id);
            }
        }

        let prompt = test_generation_prompt(request);
        let params = CompletionParams {
            model: self.config.model.clone(),
            max_tokens: self.config.test_max_tokens,
            temperature: self.config.temperature,
        };
        debug!(
            "requesting generation (transport={}, questions={})",
            self.transport.name(),
            request.question_count
        );
        let text = self.transport.complete(&prompt, &params).await?;
        let generated = parse_generated_test(&text)?;
        if generated.questions.len() != request.question_count {
            warn!(
                "generated question count differs (requested={}, received={})",
                request.question_count,
                generated.questions.len()
            );
        }

        let test = self
            .store
            .insert_test(NewTest::from_generated(generated, request))
            .await?;
        self.cache.set(key, test.clone());
        info!(
            "generated test (id={}, questions={})",
            test.id,
            test.questions.len()
        );
        Ok(test)
    }

    /// A cached test is only handed to a user who has not attempted it.
    async fn cached_test_usable(
        &self,
        test: &Test,
        user_id: Option<&str>,
    ) -> Result<bool, GenerationError> {
        let Some(user_id) = user_id else {
            return Ok(true);
        };
        let attempts = self.store.user_attempts(user_id).await?;
        Ok(!attempts.iter().any(|attempt| attempt.test_id == test.id))
    }

    /// Ask the model for free-text feedback on a set of answers.
    pub async fn generate_feedback(
        &self,
        level: CefrLevel,
        answers: &AnswerSheet,
        questions: &[Question],
    ) -> Result<String, GenerationError> {
        let result = self.run_feedback(level, answers, questions).await;
        if let Err(err) = &result {
            error!("feedback generation failed (level={level}, error={err})");
        }
        result
    }

    async fn run_feedback(
        &self,
        level: CefrLevel,
        answers: &AnswerSheet,
        questions: &[Question],
    ) -> Result<String, GenerationError> {
        self.rate_limiter.acquire(Utc::now())?;
        let transcript = answer_transcript(questions, answers);
        let prompt = feedback_prompt(level, &transcript);
        let params = CompletionParams {
            model: self.config.model.clone(),
            max_tokens: self.config.feedback_max_tokens,
            temperature: self.config.temperature,
        };
        let text = self.transport.complete(&prompt, &params).await?;
        Ok(text.trim().to_string())
    }
}

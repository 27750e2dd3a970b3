//! Turning model output into a [`GeneratedTest`].

use crate::error::GenerationError;
use fluency_rs_protocol::GeneratedTest;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

static CODE_FENCE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?s)^```[A-Za-z0-9_-]*\s*\n(.*?)\n?\s*```$").ok());

/// Strip a surrounding markdown code fence, if the model added one.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(regex) = CODE_FENCE.as_ref() else {
        return trimmed;
    };
    regex
        .captures(trimmed)
        .and_then(|captures| captures.get(1))
        .map(|body| body.as_str().trim())
        .unwrap_or(trimmed)
}

/// Parse generated text as a test and check every question's shape.
pub fn parse_generated_test(text: &str) -> Result<GeneratedTest, GenerationError> {
    let body = strip_code_fence(text);
    if body.is_empty() {
        return Err(GenerationError::Parse("empty response".to_string()));
    }
    let test: GeneratedTest =
        serde_json::from_str(body).map_err(|err| GenerationError::Parse(err.to_string()))?;
    if test.questions.is_empty() {
        return Err(GenerationError::Parse("test has no questions".to_string()));
    }
    let mut seen = HashSet::new();
    for question in &test.questions {
        if !seen.insert(question.id()) {
            return Err(GenerationError::Parse(format!(
                "duplicate question id {}",
                question.id()
            )));
        }
        question.check_shape().map_err(|reason| {
            GenerationError::Parse(format!("question {}: {reason}", question.id()))
        })?;
    }
    Ok(test)
}

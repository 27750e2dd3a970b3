//! Process-local cache of generated tests.

use fluency_rs_protocol::{CefrLevel, GenerationRequest, Skill, Subject, Test};
use parking_lot::Mutex;
use std::collections::HashMap;

/// Identifies interchangeable generated tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub level: CefrLevel,
    pub skill: Skill,
    pub subject: Subject,
    pub question_count: usize,
}

impl CacheKey {
    pub fn for_request(request: &GenerationRequest) -> Self {
        Self {
            level: request.level,
            skill: request.skill,
            subject: request.subject,
            question_count: request.question_count,
        }
    }
}

/// Get/set cache placed in front of the test store.
pub trait TestCache: Send + Sync {
    fn get(&self, key: &CacheKey) -> Option<Test>;

    fn set(&self, key: CacheKey, test: Test);
}

/// Unbounded in-memory cache; cleared when the process exits.
#[derive(Debug, Default)]
pub struct MemoryTestCache {
    entries: Mutex<HashMap<CacheKey, Test>>,
}

impl MemoryTestCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl TestCache for MemoryTestCache {
    fn get(&self, key: &CacheKey) -> Option<Test> {
        self.entries.lock().get(key).cloned()
    }

    fn set(&self, key: CacheKey, test: Test) {
        self.entries.lock().insert(key, test);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    #[test]
    fn key_includes_question_count() {
        let request = GenerationRequest::new(CefrLevel::B2, Skill::Listening, Subject::Mandarin);
        let five = CacheKey::for_request(&request);
        let ten = CacheKey::for_request(&request.clone().with_question_count(10));
        assert!(five != ten);

        let cache = MemoryTestCache::new();
        let test = Test {
            id: Uuid::new_v4(),
            title: "Listening".to_string(),
            description: String::new(),
            duration: 15,
            level: CefrLevel::B2,
            skill: Skill::Listening,
            subject: Subject::Mandarin,
            questions: Vec::new(),
            user_id: None,
            created_at: Utc::now(),
        };
        cache.set(five, test.clone());
        assert_eq!(cache.get(&five), Some(test));
        assert_eq!(cache.get(&ten), None);
        assert_eq!(cache.len(), 1);
    }
}

use chrono::{DateTime, Utc};
use fluency_rs_protocol::{CefrLevel, Question, Skill, Subject, Test};
use serde_json::json;
use uuid::Uuid;

/// One question of each variant; question 1 is multiple-choice with answer 1.
pub fn sample_questions() -> Vec<Question> {
    vec![
        Question::MultipleChoice {
            id: 1,
            question_text: "Choose the correct past tense of 'go'.".to_string(),
            options: vec!["goed".to_string(), "went".to_string(), "gone".to_string()],
            correct_answer: 1,
        },
        Question::Essay {
            id: 2,
            question_text: "Describe your last holiday.".to_string(),
        },
        Question::AudioResponse {
            id: 3,
            question_text: "Read the sentence aloud.".to_string(),
            audio_url: None,
        },
    ]
}

/// Stored test with sample questions.
pub fn sample_test(
    subject: Subject,
    skill: Skill,
    level: CefrLevel,
    created_at: DateTime<Utc>,
) -> Test {
    Test {
        id: Uuid::new_v4(),
        title: format!("{} {} {}", subject.display_name(), skill, level),
        description: "Fixture test".to_string(),
        duration: 15,
        level,
        skill,
        subject,
        questions: sample_questions(),
        user_id: None,
        created_at,
    }
}

/// Model output for a test with `count` multiple-choice questions.
pub fn generated_test_json(count: usize) -> String {
    let questions: Vec<_> = (1..=count)
        .map(|id| {
            json!({
                "id": id,
                "questionText": format!("Question {id}"),
                "questionType": "multiple-choice",
                "options": ["A", "B", "C", "D"],
                "correctAnswer": 0
            })
        })
        .collect();
    json!({
        "title": "Generated test",
        "description": "Produced by a stub model",
        "duration": 20,
        "questions": questions
    })
    .to_string()
}

//! Instruction prompts sent to the language model.

use fluency_rs_protocol::{AnswerSheet, CefrLevel, GenerationRequest, Question};
use std::fmt::Write;

/// JSON shape the model must answer with when generating a test.
const TEST_SCHEMA: &str = r#"{
  "title": "Title of the test",
  "description": "Brief description of the test",
  "duration": duration in minutes,
  "questions": [
    {
      "id": 1,
      "questionText": "The full text of the question",
      "questionType": "multiple-choice" or "essay" or "audio-response",
      "options": ["option1", "option2", "option3", "option4"] (for multiple-choice only),
      "correctAnswer": index of correct option (for multiple-choice only),
      "audioUrl": "url" (for listening questions only)
    }
  ]
}"#;

/// Placeholder used in transcripts for unanswered questions.
pub const NO_ANSWER: &str = "No answer";

/// Prompt asking for a new test as JSON.
pub fn test_generation_prompt(request: &GenerationRequest) -> String {
    format!(
        "Create a {level} level {subject} {skill} test with {count} questions following CEFR guidelines.\n\
Respond with only a valid JSON object with the following structure:\n{TEST_SCHEMA}",
        level = request.level,
        subject = request.subject.display_name(),
        skill = request.skill,
        count = request.question_count,
    )
}

/// Question/answer transcript used for feedback.
///
/// Multiple-choice answers are replaced by the selected option's text.
pub fn answer_transcript(questions: &[Question], answers: &AnswerSheet) -> String {
    let mut transcript = String::new();
    for question in questions {
        let answer = answers
            .get(&question.id())
            .and_then(|answer| question.answer_text(answer))
            .unwrap_or_else(|| NO_ANSWER.to_string());
        let _ = writeln!(transcript, "Question: {}", question.text());
        let _ = writeln!(transcript, "Student's answer: {answer}\n");
    }
    transcript
}

/// Evaluative prompt for a completed attempt.
pub fn feedback_prompt(level: CefrLevel, transcript: &str) -> String {
    format!(
        "You are a {level} CEFR language proficiency assessor.\n\
Evaluate the following student responses and provide detailed feedback according to CEFR standards.\n\n\
{transcript}\n\
Provide constructive feedback on the student's language abilities at the {level} level.\n\
Include strengths, areas for improvement, and suggestions for further practice."
    )
}

//! Question variants and submitted answers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Identifier of a question within a test.
pub type QuestionId = u32;

/// Submitted answers keyed by question id.
pub type AnswerSheet = BTreeMap<QuestionId, Answer>;

/// A single test question.
///
/// Serialized with the `questionType` tag and camelCase fields, matching the
/// JSON the generation prompt asks the model to produce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "questionType",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum Question {
    /// Fixed options with one correct index.
    MultipleChoice {
        id: QuestionId,
        question_text: String,
        options: Vec<String>,
        correct_answer: usize,
    },
    /// Free-text response, graded only by feedback.
    Essay {
        id: QuestionId,
        question_text: String,
    },
    /// Spoken response to optional reference media.
    AudioResponse {
        id: QuestionId,
        question_text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        audio_url: Option<String>,
    },
}

impl Question {
    pub fn id(&self) -> QuestionId {
        match self {
            Question::MultipleChoice { id, .. }
            | Question::Essay { id, .. }
            | Question::AudioResponse { id, .. } => *id,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Question::MultipleChoice { question_text, .. }
            | Question::Essay { question_text, .. }
            | Question::AudioResponse { question_text, .. } => question_text,
        }
    }

    /// Whether the question has a machine-checkable correct answer.
    pub fn is_scorable(&self) -> bool {
        matches!(self, Question::MultipleChoice { .. })
    }

    /// Whether the question carries an option list.
    pub fn requires_options(&self) -> bool {
        matches!(self, Question::MultipleChoice { .. })
    }

    /// Check variant-specific constraints that serde cannot express.
    pub fn check_shape(&self) -> Result<(), String> {
        if self.text().trim().is_empty() {
            return Err(format!("question {} has empty text", self.id()));
        }
        if let Question::MultipleChoice {
            id,
            options,
            correct_answer,
            ..
        } = self
        {
            if options.is_empty() {
                return Err(format!("question {id} has no options"));
            }
            if *correct_answer >= options.len() {
                return Err(format!(
                    "question {id} correct answer {correct_answer} is out of range ({} options)",
                    options.len()
                ));
            }
        }
        Ok(())
    }

    /// Whether the given answer matches the correct option.
    ///
    /// Always false for questions that are not scorable.
    pub fn is_correct(&self, answer: &Answer) -> bool {
        match (self, answer) {
            (Question::MultipleChoice { correct_answer, .. }, Answer::Choice(choice)) => {
                choice == correct_answer
            }
            _ => false,
        }
    }

    /// Resolve an answer to the text shown to an assessor.
    ///
    /// Multiple-choice selections are replaced by the option text.
    pub fn answer_text(&self, answer: &Answer) -> Option<String> {
        match (self, answer) {
            (Question::MultipleChoice { options, .. }, Answer::Choice(choice)) => {
                options.get(*choice).cloned()
            }
            (_, Answer::Choice(choice)) => Some(choice.to_string()),
            (_, Answer::Text(text)) if text.trim().is_empty() => None,
            (_, Answer::Text(text)) => Some(text.clone()),
        }
    }
}

/// A submitted answer: an option index or free text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    Choice(usize),
    Text(String),
}

impl From<usize> for Answer {
    fn from(value: usize) -> Self {
        Answer::Choice(value)
    }
}

impl From<&str> for Answer {
    fn from(value: &str) -> Self {
        Answer::Text(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::{Answer, AnswerSheet, Question};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn choice() -> Question {
        Question::MultipleChoice {
            id: 1,
            question_text: "Pick the verb".to_string(),
            options: vec!["run".to_string(), "blue".to_string()],
            correct_answer: 0,
        }
    }

    #[test]
    fn deserializes_generated_question_shapes() {
        let raw = json!([
            {
                "id": 1,
                "questionText": "Pick the verb",
                "questionType": "multiple-choice",
                "options": ["run", "blue"],
                "correctAnswer": 0
            },
            {
                "id": 2,
                "questionText": "Describe your town",
                "questionType": "essay",
                "options": null,
                "correctAnswer": null
            },
            {
                "id": 3,
                "questionText": "Repeat the phrase",
                "questionType": "audio-response",
                "audioUrl": "https://cdn.example/phrase.mp3"
            }
        ]);
        let questions: Vec<Question> = serde_json::from_value(raw).expect("questions");
        assert_eq!(questions[0], choice());
        assert!(matches!(questions[1], Question::Essay { id: 2, .. }));
        match &questions[2] {
            Question::AudioResponse { audio_url, .. } => {
                assert_eq!(audio_url.as_deref(), Some("https://cdn.example/phrase.mp3"));
            }
            other => panic!("unexpected question: {other:?}"),
        }
    }

    #[test]
    fn serializes_with_type_tag() {
        let value = serde_json::to_value(choice()).expect("json");
        assert_eq!(value["questionType"], json!("multiple-choice"));
        assert_eq!(value["questionText"], json!("Pick the verb"));
        assert_eq!(value["correctAnswer"], json!(0));
    }

    #[test]
    fn capabilities_follow_variant() {
        let essay = Question::Essay {
            id: 2,
            question_text: "Why?".to_string(),
        };
        assert!(choice().is_scorable());
        assert!(choice().requires_options());
        assert!(!essay.is_scorable());
        assert!(!essay.requires_options());
        assert!(!essay.is_correct(&Answer::Choice(0)));
    }

    #[test]
    fn check_shape_rejects_out_of_range_answer() {
        let question = Question::MultipleChoice {
            id: 4,
            question_text: "Pick".to_string(),
            options: vec!["a".to_string()],
            correct_answer: 3,
        };
        let err = question.check_shape().unwrap_err();
        assert!(err.contains("out of range"));
    }

    #[test]
    fn answer_text_substitutes_option() {
        assert_eq!(
            choice().answer_text(&Answer::Choice(1)),
            Some("blue".to_string())
        );
        assert_eq!(choice().answer_text(&Answer::Choice(9)), None);
        assert_eq!(choice().answer_text(&Answer::Text("  ".into())), None);
    }

    #[test]
    fn answer_sheet_uses_string_keys_on_the_wire() {
        let mut sheet = AnswerSheet::new();
        sheet.insert(1, Answer::Choice(2));
        sheet.insert(2, Answer::from("My town is small"));
        let value = serde_json::to_value(&sheet).expect("json");
        assert_eq!(value, json!({"1": 2, "2": "My town is small"}));
        let back: AnswerSheet = serde_json::from_value(value).expect("sheet");
        assert_eq!(back, sheet);
    }
}

//! Multiple-choice scoring for submitted attempts.

use fluency_rs_protocol::{AnswerSheet, Question};

/// Tally of correct multiple-choice answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Score {
    pub correct: usize,
    pub total_scorable: usize,
    /// Whole-number percentage; 0 when nothing is scorable.
    pub percent: u32,
}

/// Score `answers` against the scorable questions in `questions`.
pub fn score_answers(questions: &[Question], answers: &AnswerSheet) -> Score {
    let scorable: Vec<&Question> = questions.iter().filter(|q| q.is_scorable()).collect();
    let correct = scorable
        .iter()
        .filter(|question| {
            answers
                .get(&question.id())
                .is_some_and(|answer| question.is_correct(answer))
        })
        .count();
    let total_scorable = scorable.len();
    let percent = if total_scorable == 0 {
        0
    } else {
        ((correct as f64 / total_scorable as f64) * 100.0).round() as u32
    };
    Score {
        correct,
        total_scorable,
        percent,
    }
}

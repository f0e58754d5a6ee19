//! Exam eligibility and scoring.
//!
//! An exam unlocks for a student once they are enrolled, the exam is
//! published and their course percentage has reached the exam's
//! `activation_threshold`. A question is answered correctly only when the
//! chosen option set equals the answer key exactly.

use serde::Serialize;

use crate::content::ExamQuestion;
use crate::error::CoreError;
use crate::progress::percent_of;

/// Whether a student may sit an exam, and why not when they may not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Eligibility {
    pub eligible: bool,
    pub reason: Option<String>,
}

impl Eligibility {
    fn denied(reason: impl Into<String>) -> Self {
        Self {
            eligible: false,
            reason: Some(reason.into()),
        }
    }

    /// Turn a denial into a `Forbidden` error.
    pub fn require(self) -> Result<(), CoreError> {
        match self.reason {
            Some(reason) if !self.eligible => Err(CoreError::Forbidden(reason)),
            _ => Ok(()),
        }
    }
}

pub fn check_eligibility(
    enrolled: bool,
    is_published: bool,
    percent_complete: i32,
    activation_threshold: i32,
) -> Eligibility {
    if !enrolled {
        return Eligibility::denied("You must be enrolled in this course to take its exams");
    }
    if !is_published {
        return Eligibility::denied("Exam is not published");
    }
    if percent_complete < activation_threshold {
        return Eligibility::denied(format!(
            "Complete at least {activation_threshold}% of the course to unlock this exam \
             (current: {percent_complete}%)"
        ));
    }
    Eligibility {
        eligible: true,
        reason: None,
    }
}

/// Result of grading one submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExamScore {
    pub correct_count: i32,
    pub total_questions: i32,
    pub score_percent: i32,
    pub passed: bool,
}

/// Grade `answers` (one option list per question, in question order).
pub fn score_answers(
    questions: &[ExamQuestion],
    answers: &[Vec<usize>],
    passing_score: i32,
) -> Result<ExamScore, CoreError> {
    if questions.is_empty() {
        return Err(CoreError::Validation("Exam has no questions".into()));
    }
    if answers.len() != questions.len() {
        return Err(CoreError::Validation(format!(
            "Expected answers for {} questions, got {}",
            questions.len(),
            answers.len()
        )));
    }

    let mut correct = 0usize;
    for (n, (question, chosen)) in questions.iter().zip(answers).enumerate() {
        if let Some(bad) = chosen.iter().find(|&&i| i >= question.options.len()) {
            return Err(CoreError::Validation(format!(
                "Answer {} selects option {bad}, which does not exist",
                n + 1
            )));
        }
        let mut chosen = chosen.clone();
        chosen.sort_unstable();
        chosen.dedup();
        let mut key = question.correct_option_indices.clone();
        key.sort_unstable();
        key.dedup();
        if chosen == key {
            correct += 1;
        }
    }

    let score_percent = percent_of(correct, questions.len()).unwrap_or(0);
    Ok(ExamScore {
        correct_count: correct as i32,
        total_questions: questions.len() as i32,
        score_percent,
        passed: score_percent >= passing_score,
    })
}

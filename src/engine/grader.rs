// src/engine/grader.rs

//! Pure grading of a submission against a stored quiz.
//!
//! Policy:
//! * Letters are compared case-insensitively and reported upper-cased.
//! * An index outside the quiz is reported as `OutOfBounds` and never scored;
//!   the rest of the batch is still graded.
//! * Several answers for the same index: the last one in submission order wins.
//! * Graded results are ordered by question index, followed by out-of-bounds
//!   entries in submission order. Unanswered questions produce no result but
//!   still count toward `total_questions`.

use crate::models::{
    quiz::QuizRecord,
    submission::{AnswerEntry, AnswerOutcome, GradeReport},
};

fn normalize_letter(letter: &str) -> String {
    letter.trim().to_uppercase()
}

pub fn grade(quiz: &QuizRecord, answers: &[AnswerEntry]) -> GradeReport {
    let questions = &quiz.questions;
    let mut latest: Vec<Option<String>> = vec![None; questions.len()];
    let mut out_of_bounds = Vec::new();

    for answer in answers {
        let letter = normalize_letter(&answer.selected_letter);
        match usize::try_from(answer.question_index) {
            Ok(index) if index < questions.len() => latest[index] = Some(letter),
            _ => out_of_bounds.push(AnswerOutcome::OutOfBounds {
                question_index: answer.question_index,
                user_selected_letter: letter,
            }),
        }
    }

    let mut score = 0;
    let mut results = Vec::with_capacity(answers.len());
    for (index, selected) in latest.into_iter().enumerate() {
        let Some(selected) = selected else { continue };
        let question = &questions[index];
        let correct_letter = normalize_letter(&question.correct_letter);
        let is_correct = selected == correct_letter;
        if is_correct {
            score += 1;
        }
        results.push(AnswerOutcome::Graded {
            question_index: index,
            question_text: question.text.clone(),
            options: question.options.clone(),
            user_selected_letter: selected,
            correct_letter,
            is_correct,
        });
    }
    results.extend(out_of_bounds);

    GradeReport {
        score,
        total_questions: quiz.total_questions() as u32,
        results,
    }
}

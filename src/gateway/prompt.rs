// src/gateway/prompt.rs

use crate::{gateway::GenerationRequest, models::quiz::Difficulty};

fn difficulty_hint(difficulty: Difficulty) -> &'static str {
    match difficulty {
        Difficulty::Easy => "Make them relatively straightforward and widely known.",
        Difficulty::Medium => "Include some common and some slightly less common facts.",
        Difficulty::Hard => "Challenge the user with more obscure or detailed questions.",
    }
}

/// Letters used for `option_count` options, e.g. "A, B, C, D".
fn letter_list(option_count: usize) -> String {
    (b'A'..=b'Z')
        .take(option_count)
        .map(|b| (b as char).to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn build_prompt(request: &GenerationRequest, option_count: usize) -> String {
    format!(
        "Generate {count} {level} multiple choice quiz questions on the topic '{topic}'. {hint} \
         Each question should have {option_count} options ({letters}) and clearly specify the correct answer. \
         Respond strictly in a JSON array with 'question', 'options' (array of strings), and 'answer' (correct letter).",
        count = request.count,
        topic = request.topic,
        level = request.difficulty.as_str(),
        hint = difficulty_hint(request.difficulty),
        letters = letter_list(option_count),
    )
}

// src/gateway/parse.rs

//! Normalizes raw LLM output into validated question records.
//!
//! Anything that does not fit the expected shape is rejected as
//! [`GenerationError::BadResponse`]; partial quizzes are never returned.

use std::{collections::BTreeMap, sync::LazyLock};

use regex::Regex;
use serde::Deserialize;

use crate::{config::MAX_OPTIONS_PER_QUESTION, gateway::GenerationError, models::quiz::QuestionRecord};

static CODE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^\s*```[A-Za-z]*\s*(.*?)\s*```\s*$").expect("valid regex"));

/// "A. Paris", "b) Rome", "C: Berlin"
static LETTER_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([A-Za-z])\s*[.):]\s*(.*?)\s*$").expect("valid regex"));

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawPayload {
    List(Vec<RawQuestion>),
    Wrapped { questions: Vec<RawQuestion> },
}

#[derive(Debug, Deserialize)]
struct RawQuestion {
    #[serde(alias = "question_text")]
    question: String,
    options: RawOptions,
    #[serde(alias = "correct_answer")]
    answer: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawOptions {
    List(Vec<String>),
    Keyed(BTreeMap<String, String>),
}

fn bad(msg: impl Into<String>) -> GenerationError {
    GenerationError::BadResponse(msg.into())
}

fn strip_code_fence(content: &str) -> &str {
    match CODE_FENCE.captures(content).and_then(|caps| caps.get(1)) {
        Some(inner) => inner.as_str(),
        None => content.trim(),
    }
}

fn letter_at(position: usize) -> String {
    ((b'A' + position as u8) as char).to_string()
}

/// Assigns option letters.
///
/// A list is read by its own letter prefixes only when every entry carries one;
/// otherwise entries are lettered by position and kept verbatim.
fn normalize_options(raw: RawOptions) -> Result<BTreeMap<String, String>, GenerationError> {
    let pairs: Vec<(String, String)> = match raw {
        RawOptions::Keyed(map) => map
            .into_iter()
            .map(|(key, text)| (key.trim().to_ascii_uppercase(), text.trim().to_string()))
            .collect(),
        RawOptions::List(list) => {
            if list.len() > MAX_OPTIONS_PER_QUESTION {
                return Err(bad(format!("{} options exceed the letter range", list.len())));
            }
            let prefixed: Option<Vec<(String, String)>> = list
                .iter()
                .map(|opt| {
                    LETTER_PREFIX.captures(opt).map(|caps| {
                        (caps[1].to_ascii_uppercase(), caps[2].to_string())
                    })
                })
                .collect();
            match prefixed {
                Some(pairs) => pairs,
                None => list
                    .iter()
                    .enumerate()
                    .map(|(i, opt)| (letter_at(i), opt.trim().to_string()))
                    .collect(),
            }
        }
    };

    let mut options = BTreeMap::new();
    for (letter, text) in pairs {
        if options.insert(letter.clone(), text).is_some() {
            return Err(bad(format!("duplicate option letter '{letter}'")));
        }
    }
    Ok(options)
}

/// Resolves the answer to an option letter: a bare letter, a prefixed option,
/// or the exact text of one of the options.
fn resolve_answer(answer: &str, options: &BTreeMap<String, String>) -> Option<String> {
    let answer = answer.trim();
    let letter = if answer.len() == 1 && answer.chars().all(|c| c.is_ascii_alphabetic()) {
        Some(answer.to_ascii_uppercase())
    } else {
        LETTER_PREFIX
            .captures(answer)
            .map(|caps| caps[1].to_ascii_uppercase())
    };

    letter.filter(|l| options.contains_key(l)).or_else(|| {
        options
            .iter()
            .find(|(_, text)| text.eq_ignore_ascii_case(answer))
            .map(|(letter, _)| letter.clone())
    })
}

/// Parses the model's message content into at most `max_questions` questions,
/// each with no more than `max_options` options.
pub fn parse_questions(
    content: &str,
    max_questions: usize,
    max_options: usize,
) -> Result<Vec<QuestionRecord>, GenerationError> {
    let body = strip_code_fence(content);
    let payload: RawPayload =
        serde_json::from_str(body).map_err(|e| bad(format!("not a question array: {e}")))?;
    let raw_questions = match payload {
        RawPayload::List(list) | RawPayload::Wrapped { questions: list } => list,
    };

    if raw_questions.is_empty() {
        return Err(bad("no questions returned"));
    }

    let mut questions = Vec::with_capacity(raw_questions.len().min(max_questions));
    for (index, raw) in raw_questions.into_iter().take(max_questions).enumerate() {
        let options = normalize_options(raw.options)?;
        if options.len() > max_options {
            return Err(bad(format!(
                "question {index} has {} options, at most {max_options} allowed",
                options.len()
            )));
        }
        let correct_letter = resolve_answer(&raw.answer, &options).ok_or_else(|| {
            bad(format!(
                "question {index} answer '{}' is not among the options",
                raw.answer
            ))
        })?;

        let question = QuestionRecord {
            text: raw.question.trim().to_string(),
            options,
            correct_letter,
        };
        question
            .validate()
            .map_err(|reason| bad(format!("question {index}: {reason}")))?;
        questions.push(question);
    }

    Ok(questions)
}

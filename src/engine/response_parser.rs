//! Best-effort extraction of structured answers from the agent's free text.
//!
//! Every function here is total: whatever the input, a value comes back,
//! with `used_default` telling whether the markers were actually found.

use std::sync::LazyLock;

use regex::Regex;

use crate::model::survey::SurveyRecord;

pub const DEFAULT_CHARACTER_REASONING: &str = "Selected based on background";
pub const INVALID_CHARACTER_REASONING: &str = "Default selection due to invalid response";
pub const DEFAULT_DECISION_REASONING: &str = "Default reasoning";
pub const INVALID_DECISION_REASONING: &str = "Default choice due to invalid response";

static CHARACTER_CHOICE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)CHOICE:\s*(.+?)(?:\n|REASONING|$)").expect("valid character regex")
});

static REASONING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)REASONING:\s*(.+?)$").expect("valid reasoning regex"));

/// ASCII digits only: every match must parse, so matching and counting agree.
static RATING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Rate:\s*([0-9])").expect("valid rating regex"));

/// One pattern per survey question, 1..=10. Questions 1-5 carry an
/// `Explain:` marker, 6-10 an `Answer:` marker. A span runs until the next
/// numbered line or the end of the text.
static SURVEY_ANSWERS: LazyLock<Vec<(usize, Regex)>> = LazyLock::new(|| {
    (1..=10)
        .map(|n| {
            let marker = if n <= 5 { "Explain" } else { "Answer" };
            let pattern = format!(r"(?is){}\..*?{}:\s*(.+?)(?:\n\d+\.|$)", n, marker);
            (n, Regex::new(&pattern).expect("valid survey regex"))
        })
        .collect()
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted<T> {
    pub value: T,
    /// True when the primary field could not be read and a default was used
    pub used_default: bool,
}

impl<T> Extracted<T> {
    fn found(value: T) -> Self {
        Self {
            value,
            used_default: false,
        }
    }

    fn defaulted(value: T) -> Self {
        Self {
            value,
            used_default: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterChoice {
    pub name: String,
    pub reasoning: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionChoice {
    pub label: String,
    pub reasoning: String,
}

fn reasoning(text: &str, default: &str) -> String {
    REASONING
        .captures(text)
        .map(|c| c[1].trim().to_string())
        .filter(|r| !r.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Reads `CHOICE: <name>` and matches it against `roster` by
/// case-insensitive substring. Falls back to the first roster entry.
pub fn extract_character_choice(text: &str, roster: &[String]) -> Extracted<CharacterChoice> {
    let fallback_name = roster.first().cloned().unwrap_or_default();

    if text.trim().is_empty() {
        return Extracted::defaulted(CharacterChoice {
            name: fallback_name,
            reasoning: INVALID_CHARACTER_REASONING.to_string(),
        });
    }

    let reasoning = reasoning(text, DEFAULT_CHARACTER_REASONING);

    let matched = CHARACTER_CHOICE.captures(text).and_then(|cap| {
        let said = cap[1].trim().to_lowercase();
        roster
            .iter()
            .find(|name| said.contains(&name.to_lowercase()))
            .cloned()
    });

    match matched {
        Some(name) => Extracted::found(CharacterChoice { name, reasoning }),
        None => Extracted::defaulted(CharacterChoice {
            name: fallback_name,
            reasoning,
        }),
    }
}

/// Reads the chosen option label.
///
/// Tries `CHOICE: <label>` (case-insensitive) first, then a legal label at
/// the start of a line followed by `.`, `)`, `:` or whitespace. Falls back
/// to the first legal label.
pub fn extract_decision_choice(text: &str, legal: &[String]) -> Extracted<DecisionChoice> {
    let fallback_label = legal.first().cloned().unwrap_or_default();

    if text.trim().is_empty() {
        return Extracted::defaulted(DecisionChoice {
            label: fallback_label,
            reasoning: INVALID_DECISION_REASONING.to_string(),
        });
    }

    let reasoning = reasoning(text, DEFAULT_DECISION_REASONING);

    let label = marked_label(text, legal).or_else(|| line_start_label(text, legal));

    match label {
        Some(label) => Extracted::found(DecisionChoice { label, reasoning }),
        None => Extracted::defaulted(DecisionChoice {
            label: fallback_label,
            reasoning,
        }),
    }
}

/// Alternation of the escaped labels, longest first so that multi-character
/// labels win over their prefixes.
fn label_alternation(legal: &[String]) -> Option<String> {
    if legal.is_empty() {
        return None;
    }
    let mut labels: Vec<&String> = legal.iter().filter(|l| !l.is_empty()).collect();
    labels.sort_by(|a, b| b.len().cmp(&a.len()));
    if labels.is_empty() {
        return None;
    }
    Some(
        labels
            .iter()
            .map(|l| regex::escape(l))
            .collect::<Vec<_>>()
            .join("|"),
    )
}

fn marked_label(text: &str, legal: &[String]) -> Option<String> {
    let alternation = label_alternation(legal)?;
    let re = Regex::new(&format!(r"(?i)CHOICE:\s*({})", alternation)).ok()?;
    let said = re.captures(text)?;
    legal
        .iter()
        .find(|l| l.eq_ignore_ascii_case(&said[1]))
        .cloned()
}

/// Case-sensitive on purpose: a lowercase "a" opening a sentence is prose.
fn line_start_label(text: &str, legal: &[String]) -> Option<String> {
    let alternation = label_alternation(legal)?;
    let re = Regex::new(&format!(r"(?m)^({})[.):\s]", alternation)).ok()?;
    let said = re.captures(text)?;
    legal.iter().find(|l| l.as_str() == &said[1]).cloned()
}

/// Parses the closing survey.
///
/// Ratings are all-or-nothing: only when at least five `Rate: <digit>`
/// markers are present do the first five replace the defaults, in order.
/// Each question's explanation or answer is read independently.
pub fn extract_survey(text: &str) -> Extracted<SurveyRecord> {
    let mut survey = SurveyRecord::with_raw(text);

    let ratings: Vec<u8> = RATING
        .captures_iter(text)
        .filter_map(|c| c[1].parse::<u8>().ok())
        .take(5)
        .collect();

    let ratings_found = ratings.len() == 5;
    if ratings_found {
        let mut fixed = [0u8; 5];
        for (slot, rating) in fixed.iter_mut().zip(ratings) {
            *slot = rating.clamp(1, 5);
        }
        survey.set_ratings(fixed);
    }

    for (number, re) in SURVEY_ANSWERS.iter() {
        let Some(cap) = re.captures(text) else {
            continue;
        };
        if let Some(field) = survey.answer_mut(*number) {
            *field = cap[1].trim().to_string();
        }
    }

    Extracted {
        value: survey,
        used_default: !ratings_found,
    }
}

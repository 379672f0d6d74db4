use rand::seq::SliceRandom;
use rand::Rng;

use crate::engine::response_parser::{DecisionChoice, Extracted};

/// Reasoning recorded whenever the extracted label could not be used.
pub const PARSING_ERROR_REASONING: &str = "Default choice due to parsing error";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The extracted label is legal and is used as-is.
    Accepted { label: String, reasoning: String },
    /// The extraction was unusable; a uniformly random legal label was drawn.
    Substituted { label: String },
}

impl Resolution {
    pub fn label(&self) -> &str {
        match self {
            Resolution::Accepted { label, .. } | Resolution::Substituted { label } => label,
        }
    }

    pub fn reasoning(&self) -> &str {
        match self {
            Resolution::Accepted { reasoning, .. } => reasoning,
            Resolution::Substituted { .. } => PARSING_ERROR_REASONING,
        }
    }

    pub fn is_substituted(&self) -> bool {
        matches!(self, Resolution::Substituted { .. })
    }
}

/// Turns an extracted choice into a legal one.
///
/// A label outside `legal`, or one the extractor only produced as its
/// fallback, is replaced by a random legal label. Returns `None` only when
/// `legal` is empty.
pub fn resolve_decision<R: Rng + ?Sized>(
    extracted: &Extracted<DecisionChoice>,
    legal: &[String],
    rng: &mut R,
) -> Option<Resolution> {
    let choice = &extracted.value;

    if !extracted.used_default && legal.contains(&choice.label) {
        return Some(Resolution::Accepted {
            label: choice.label.clone(),
            reasoning: choice.reasoning.clone(),
        });
    }

    legal.choose(rng).map(|label| Resolution::Substituted {
        label: label.clone(),
    })
}

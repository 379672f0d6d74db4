use serde::{Deserialize, Serialize};

pub const DEFAULT_RATING: u8 = 3;

/// Post-module survey, as extracted from the agent's free-text answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurveyRecord {
    pub realistic: u8,
    pub realistic_explain: String,
    pub felt_safe: u8,
    pub felt_safe_explain: String,
    pub helpful_feedback: u8,
    pub helpful_feedback_explain: String,
    pub would_recommend: u8,
    pub would_recommend_explain: String,
    pub confidence: u8,
    pub confidence_explain: String,
    pub most_valuable_scenario: String,
    pub likely_strategy: String,
    pub what_worked: String,
    pub improvements: String,
    pub cultural_relevance: String,
    /// Verbatim agent reply, kept for audit
    pub raw_response: String,
}

impl SurveyRecord {
    pub fn with_raw(raw: &str) -> Self {
        Self {
            realistic: DEFAULT_RATING,
            realistic_explain: String::new(),
            felt_safe: DEFAULT_RATING,
            felt_safe_explain: String::new(),
            helpful_feedback: DEFAULT_RATING,
            helpful_feedback_explain: String::new(),
            would_recommend: DEFAULT_RATING,
            would_recommend_explain: String::new(),
            confidence: DEFAULT_RATING,
            confidence_explain: String::new(),
            most_valuable_scenario: String::new(),
            likely_strategy: String::new(),
            what_worked: String::new(),
            improvements: String::new(),
            cultural_relevance: String::new(),
            raw_response: raw.to_string(),
        }
    }

    /// Ratings in survey order: realism, safety, feedback quality,
    /// recommendation, confidence.
    pub fn ratings(&self) -> [u8; 5] {
        [
            self.realistic,
            self.felt_safe,
            self.helpful_feedback,
            self.would_recommend,
            self.confidence,
        ]
    }

    pub fn set_ratings(&mut self, ratings: [u8; 5]) {
        let [realistic, felt_safe, helpful, recommend, confidence] = ratings;
        self.realistic = realistic;
        self.felt_safe = felt_safe;
        self.helpful_feedback = helpful;
        self.would_recommend = recommend;
        self.confidence = confidence;
    }

    /// Mutable text field for survey question `number` (1..=10).
    pub(crate) fn answer_mut(&mut self, number: usize) -> Option<&mut String> {
        Some(match number {
            1 => &mut self.realistic_explain,
            2 => &mut self.felt_safe_explain,
            3 => &mut self.helpful_feedback_explain,
            4 => &mut self.would_recommend_explain,
            5 => &mut self.confidence_explain,
            6 => &mut self.most_valuable_scenario,
            7 => &mut self.likely_strategy,
            8 => &mut self.what_worked,
            9 => &mut self.improvements,
            10 => &mut self.cultural_relevance,
            _ => return None,
        })
    }
}

impl Default for SurveyRecord {
    fn default() -> Self {
        Self::with_raw("")
    }
}

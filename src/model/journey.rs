use serde::{Deserialize, Serialize};

use crate::model::skills::SkillState;
use crate::model::survey::SurveyRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionStatus {
    Completed,
    Incomplete,
    Error,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterSelection {
    pub character_selected: String,
    pub reasoning: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub decision_id: String,
    pub choice: String,
    pub choice_text: String,
    pub reasoning: String,
    pub feedback_received: String,
    /// Set when the extracted label was unusable and a random one was drawn
    #[serde(default)]
    pub choice_substituted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioRecord {
    pub scenario_id: String,
    pub scenario_name: String,
    pub decisions: Vec<DecisionRecord>,
    /// Skills earned in this scenario, in first-earned order, no repeats
    pub skills_earned: Vec<String>,
    /// Synthetic duration, not wall-clock
    pub time_spent_seconds: u32,
}

/// One participant's journey. Written once it reaches a terminal status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JourneyRecord {
    pub persona_id: String,
    pub persona_background: String,
    pub start_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    pub character_selection: CharacterSelection,
    pub scenarios: Vec<ScenarioRecord>,
    pub final_skills: SkillState,
    #[serde(default)]
    pub feedback: SurveyRecord,
    pub completion_status: CompletionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
}

impl JourneyRecord {
    pub fn total_seconds(&self) -> u32 {
        self.scenarios.iter().map(|s| s.time_spent_seconds).sum()
    }

    pub fn decision_count(&self) -> usize {
        self.scenarios.iter().map(|s| s.decisions.len()).sum()
    }

    pub fn is_completed(&self) -> bool {
        self.completion_status == CompletionStatus::Completed
    }
}

/// All journeys of one run, in roster order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultSet {
    journeys: Vec<JourneyRecord>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, journey: JourneyRecord) {
        self.journeys.push(journey);
    }

    pub fn journeys(&self) -> &[JourneyRecord] {
        &self.journeys
    }

    pub fn len(&self) -> usize {
        self.journeys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.journeys.is_empty()
    }

    pub fn count(&self, status: CompletionStatus) -> usize {
        self.journeys
            .iter()
            .filter(|j| j.completion_status == status)
            .count()
    }

    /// Percentage of completed journeys; 0.0 for an empty set.
    pub fn completion_rate(&self) -> f64 {
        if self.journeys.is_empty() {
            return 0.0;
        }
        self.count(CompletionStatus::Completed) as f64 / self.journeys.len() as f64 * 100.0
    }
}

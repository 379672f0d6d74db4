use std::ops::RangeInclusive;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::model::character::{default_characters, Character};
use crate::model::skills::default_skills;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    pub num_participants: usize,
    /// Seeds the single random stream used for durations and substitutions
    pub seed: u64,
    /// Number of catalog scenarios to traverse; `None` means all of them
    pub scenario_count: Option<usize>,

    pub scenarios_file: PathBuf,
    pub roster_file: PathBuf,
    pub output_dir: PathBuf,
    pub results_file_name: String,

    pub skills: Vec<String>,
    pub characters: Vec<Character>,

    /// Inclusive bounds of the synthetic per-scenario duration
    pub scenario_seconds: [u32; 2],

    pub agent: AgentSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    /// Root of an OpenAI-compatible API, e.g. `https://api.openai.com/v1`
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub timeout_secs: u64,
    /// Environment variable holding the API key; unset means no auth header
    pub api_key_env: String,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            num_participants: 12,
            seed: 42,
            scenario_count: Some(5),

            scenarios_file: PathBuf::from("data/scenarios_map.json"),
            roster_file: PathBuf::from("data/participants.json"),
            output_dir: PathBuf::from("outputs"),
            results_file_name: "simulation_results.json".into(),

            skills: default_skills(),
            characters: default_characters(),

            scenario_seconds: [180, 420],

            agent: AgentSettings::default(),
        }
    }
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".into(),
            model: "gpt-4o-mini".into(),
            temperature: 0.7,
            timeout_secs: 120,
            api_key_env: "OPENAI_API_KEY".into(),
        }
    }
}

impl SimulationSettings {
    pub fn results_path(&self) -> PathBuf {
        self.output_dir.join(&self.results_file_name)
    }

    pub fn scenario_seconds(&self) -> RangeInclusive<u32> {
        let [a, b] = self.scenario_seconds;
        a.min(b)..=a.max(b)
    }

    pub fn character_names(&self) -> Vec<String> {
        self.characters.iter().map(|c| c.name.clone()).collect()
    }
}

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub fn default_skills() -> Vec<String> {
    [
        "warning_signs",
        "direct_intervention",
        "distraction",
        "support_survivor",
        "know_resources",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Skill name -> points earned. Counts only ever go up.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SkillState {
    counts: BTreeMap<String, u32>,
}

impl SkillState {
    pub fn new(skills: &[String]) -> Self {
        Self {
            counts: skills.iter().map(|s| (s.clone(), 0)).collect(),
        }
    }

    pub fn accrue(&mut self, skill: &str) {
        *self.counts.entry(skill.to_string()).or_insert(0) += 1;
    }

    pub fn get(&self, skill: &str) -> u32 {
        self.counts.get(skill).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.counts.values().sum()
    }

    /// Number of tracked skill areas
    pub fn areas(&self) -> usize {
        self.counts.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.counts.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

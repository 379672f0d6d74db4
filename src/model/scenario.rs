use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Errors raised while loading or validating the scenario catalog.
/// All of these are fatal at startup.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read scenario catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("scenario catalog is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("scenario catalog contains no scenarios")]
    Empty,

    #[error("duplicate scenario id '{0}'")]
    DuplicateScenario(String),

    #[error("scenario '{0}' has no decision points")]
    NoDecisionPoints(String),

    #[error("decision point '{decision}' in scenario '{scenario}' has no options")]
    NoOptions { scenario: String, decision: String },

    #[error("option {label} of decision point '{decision}' grants unknown skill '{skill}'")]
    UnknownSkill {
        decision: String,
        label: String,
        skill: String,
    },
}

/// Read-only catalog of scenarios, in traversal order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioCatalog {
    pub scenarios: Vec<Scenario>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
    /// Narrative context shown before every decision point of the scenario
    pub context: String,
    pub decision_points: Vec<DecisionPoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionPoint {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub prompt: String,
    /// Labelled options, in the order the catalog lists them.
    pub options: OptionSet,
}

/// Label -> option map that keeps catalog order. Labels are unique.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionSet {
    entries: Vec<(String, ChoiceOption)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub text: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub feedback: String,
}

impl DecisionPoint {
    pub fn legal_labels(&self) -> Vec<String> {
        self.options.labels().map(String::from).collect()
    }

    pub fn option(&self, label: &str) -> Option<&ChoiceOption> {
        self.options.get(label)
    }
}

impl OptionSet {
    pub fn get(&self, label: &str) -> Option<&ChoiceOption> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, option)| option)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(l, _)| l.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ChoiceOption)> {
        self.entries.iter().map(|(l, o)| (l.as_str(), o))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Appends `option`, replacing any earlier option with the same label
    /// in place.
    pub fn insert(&mut self, label: impl Into<String>, option: ChoiceOption) {
        let label = label.into();
        match self.entries.iter_mut().find(|(l, _)| *l == label) {
            Some((_, existing)) => *existing = option,
            None => self.entries.push((label, option)),
        }
    }
}

impl<L: Into<String>> FromIterator<(L, ChoiceOption)> for OptionSet {
    fn from_iter<I: IntoIterator<Item = (L, ChoiceOption)>>(iter: I) -> Self {
        let mut set = OptionSet::default();
        for (label, option) in iter {
            set.insert(label, option);
        }
        set
    }
}

impl Serialize for OptionSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (label, option) in &self.entries {
            map.serialize_entry(label, option)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for OptionSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OptionSetVisitor;

        impl<'de> Visitor<'de> for OptionSetVisitor {
            type Value = OptionSet;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of option labels to options")
            }

            fn visit_map<M: MapAccess<'de>>(self, mut access: M) -> Result<OptionSet, M::Error> {
                let mut set = OptionSet::default();
                while let Some((label, option)) = access.next_entry::<String, ChoiceOption>()? {
                    if set.get(&label).is_some() {
                        return Err(serde::de::Error::custom(format!(
                            "duplicate option label '{}'",
                            label
                        )));
                    }
                    set.insert(label, option);
                }
                Ok(set)
            }
        }

        deserializer.deserialize_map(OptionSetVisitor)
    }
}

impl ScenarioCatalog {
    pub fn load(path: &Path, known_skills: &[String]) -> Result<Self, CatalogError> {
        let raw = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw, known_skills)
    }

    pub fn from_json(raw: &str, known_skills: &[String]) -> Result<Self, CatalogError> {
        let catalog: ScenarioCatalog = serde_json::from_str(raw)?;
        catalog.validate(known_skills)?;
        Ok(catalog)
    }

    /// Checks the structural invariants of the catalog. An empty
    /// `known_skills` list disables the skill-tag check.
    pub fn validate(&self, known_skills: &[String]) -> Result<(), CatalogError> {
        if self.scenarios.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut seen = HashSet::new();
        for scenario in &self.scenarios {
            if !seen.insert(scenario.id.as_str()) {
                return Err(CatalogError::DuplicateScenario(scenario.id.clone()));
            }
            if scenario.decision_points.is_empty() {
                return Err(CatalogError::NoDecisionPoints(scenario.id.clone()));
            }

            for point in &scenario.decision_points {
                if point.options.is_empty() {
                    return Err(CatalogError::NoOptions {
                        scenario: scenario.id.clone(),
                        decision: point.id.clone(),
                    });
                }

                if known_skills.is_empty() {
                    continue;
                }
                for (label, option) in point.options.iter() {
                    if let Some(skill) = option.skills.iter().find(|s| !known_skills.contains(s)) {
                        return Err(CatalogError::UnknownSkill {
                            decision: point.id.clone(),
                            label: label.to_string(),
                            skill: skill.clone(),
                        });
                    }
                }
            }
        }

        Ok(())
    }

    /// Keeps only the first `count` scenarios. Never empties the catalog.
    pub fn truncate(&mut self, count: usize) {
        self.scenarios.truncate(count.max(1));
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    pub fn scenario_names(&self) -> Vec<&str> {
        self.scenarios.iter().map(|s| s.name.as_str()).collect()
    }
}

/// Scenario maps written by hand use numeric ids; exported ones use strings.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(i64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}

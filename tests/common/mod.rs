#![allow(dead_code)]

use bystander_sim::model::message::Conversation;
use bystander_sim::model::participant::Participant;
use bystander_sim::model::scenario::{ChoiceOption, DecisionPoint, Scenario, ScenarioCatalog};
use bystander_sim::{AgentError, SimulationSettings};

pub fn option(text: &str, skills: &[&str]) -> ChoiceOption {
    ChoiceOption {
        text: text.into(),
        skills: skills.iter().map(|s| s.to_string()).collect(),
        feedback: format!("feedback for {}", text),
    }
}

pub fn point(id: &str, options: Vec<(&str, ChoiceOption)>) -> DecisionPoint {
    DecisionPoint {
        id: id.into(),
        prompt: format!("What do you do at {}?", id),
        options: options.into_iter().collect(),
    }
}

pub fn scenario(id: &str, name: &str, points: Vec<DecisionPoint>) -> Scenario {
    Scenario {
        id: id.into(),
        name: name.into(),
        context: format!("Context of {}", name),
        decision_points: points,
    }
}

/// One scenario, one decision point: A grants warning_signs, B grants nothing.
pub fn single_decision_catalog() -> ScenarioCatalog {
    ScenarioCatalog {
        scenarios: vec![scenario(
            "1",
            "Party Observation",
            vec![point(
                "1a",
                vec![
                    ("A", option("Keep an eye on them", &["warning_signs"])),
                    ("B", option("Go get a drink", &[])),
                ],
            )],
        )],
    }
}

pub fn four_option_point(id: &str) -> DecisionPoint {
    point(
        id,
        vec![
            ("A", option("Step in directly", &["direct_intervention"])),
            ("B", option("Create a distraction", &["distraction"])),
            ("C", option("Find their friends", &["warning_signs", "support_survivor"])),
            ("D", option("Tell staff", &["know_resources"])),
        ],
    )
}

/// Two scenarios with two four-option decision points each.
pub fn two_scenario_catalog() -> ScenarioCatalog {
    ScenarioCatalog {
        scenarios: vec![
            scenario(
                "1",
                "Party Observation",
                vec![four_option_point("1a"), four_option_point("1b")],
            ),
            scenario(
                "2",
                "Group Chat",
                vec![four_option_point("2a"), four_option_point("2b")],
            ),
        ],
    }
}

pub fn participant(name: &str) -> Participant {
    let mut p = Participant::new(name);
    p.nationality = "American".into();
    p.professional_interests = vec!["Sport Management".into()];
    p.preferences
        .insert("intervention_style".into(), "direct but friendly".into());
    p
}

pub fn settings() -> SimulationSettings {
    SimulationSettings {
        seed: 7,
        ..SimulationSettings::default()
    }
}

/// Agent that always gives the same reply.
pub fn fixed(reply: &'static str) -> impl Fn(&Conversation, &str) -> Result<String, AgentError> {
    move |_, _| Ok(reply.to_string())
}

pub fn is_decision_prompt(prompt: &str) -> bool {
    prompt.starts_with("SCENARIO CONTEXT:")
}

pub const SURVEY_REPLY: &str = "1. REALISM\nRate: 4\nExplain: Real enough.\n\
2. SAFETY\nRate: 5\nExplain: Felt safe.\n\
3. FEEDBACK\nRate: 4\nExplain: Useful.\n\
4. RECOMMENDATION\nRate: 5\nExplain: Yes.\n\
5. CONFIDENCE\nRate: 3\nExplain: Somewhat.\n\
6. MOST VALUABLE\nAnswer: Group Chat.\n\
7. STRATEGY\nAnswer: Delegation.\n\
8. WORKED\nAnswer: Feedback.\n\
9. IMPROVE\nAnswer: Longer.\n\
10. CULTURE\nAnswer: Fine.";

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Local;
use rand::Rng;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::engine::llm_client::{Agent, AgentError};
use crate::engine::prompt_builder::PromptBuilder;
use crate::engine::resolver::resolve_decision;
use crate::engine::response_parser::{
    extract_character_choice, extract_decision_choice, extract_survey,
};
use crate::model::journey::{
    CharacterSelection, CompletionStatus, DecisionRecord, JourneyRecord, ScenarioRecord,
};
use crate::model::message::Conversation;
use crate::model::participant::Participant;
use crate::model::scenario::{DecisionPoint, Scenario, ScenarioCatalog};
use crate::model::skills::SkillState;
use crate::model::survey::SurveyRecord;
use crate::settings::SimulationSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JourneyPhase {
    NotStarted,
    CharacterSelected,
    /// 1-based index of the scenario being traversed
    InScenario(usize),
    SurveyPending,
    Completed,
    Errored,
}

impl JourneyPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, JourneyPhase::Completed | JourneyPhase::Errored)
    }
}

impl fmt::Display for JourneyPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JourneyPhase::NotStarted => write!(f, "character selection"),
            JourneyPhase::CharacterSelected => write!(f, "scenario start"),
            JourneyPhase::InScenario(i) => write!(f, "scenario {}", i),
            JourneyPhase::SurveyPending => write!(f, "closing survey"),
            JourneyPhase::Completed => write!(f, "completed"),
            JourneyPhase::Errored => write!(f, "errored"),
        }
    }
}

#[derive(Debug, Error)]
pub enum JourneyError {
    #[error("agent failed during {phase}")]
    Agent {
        phase: JourneyPhase,
        #[source]
        source: AgentError,
    },

    #[error("cancelled during {phase}")]
    Cancelled { phase: JourneyPhase },

    #[error("journey panicked during {phase}: {message}")]
    Panicked { phase: JourneyPhase, message: String },

    #[error("decision point '{0}' offers no options")]
    NoOptions(String),

    #[error("decision point '{decision}' has no option labelled '{label}'")]
    MissingOption { decision: String, label: String },
}

/// Drives one participant from character selection to the closing survey.
///
/// The engine owns the participant's record for the whole journey and hands
/// it back from [`JourneyEngine::run`]; a finished journey cannot be resumed.
pub struct JourneyEngine<'a, A: Agent + ?Sized, R: Rng> {
    agent: &'a A,
    catalog: &'a ScenarioCatalog,
    settings: &'a SimulationSettings,
    participant: &'a Participant,
    rng: &'a mut R,
    cancel: Option<&'a AtomicBool>,

    phase: JourneyPhase,
    conversation: Conversation,
    record: JourneyRecord,
}

impl<'a, A: Agent + ?Sized, R: Rng> JourneyEngine<'a, A, R> {
    pub fn new(
        agent: &'a A,
        catalog: &'a ScenarioCatalog,
        settings: &'a SimulationSettings,
        participant: &'a Participant,
        rng: &'a mut R,
    ) -> Self {
        let conversation =
            Conversation::new(participant.name.clone(), PromptBuilder::persona(participant));

        let record = JourneyRecord {
            persona_id: participant.name.clone(),
            persona_background: participant.background_summary(),
            start_time: Local::now().to_rfc3339(),
            end_time: None,
            character_selection: CharacterSelection::default(),
            scenarios: Vec::new(),
            final_skills: SkillState::new(&settings.skills),
            feedback: SurveyRecord::default(),
            completion_status: CompletionStatus::Incomplete,
            error: None,
            error_detail: None,
        };

        Self {
            agent,
            catalog,
            settings,
            participant,
            rng,
            cancel: None,
            phase: JourneyPhase::NotStarted,
            conversation,
            record,
        }
    }

    /// Once `flag` is set, the next agent call ends the journey as errored.
    pub fn with_cancel_flag(mut self, flag: &'a AtomicBool) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Runs the journey to a terminal state. Faults never escape, panics
    /// included: they are captured in the returned record alongside
    /// everything recorded so far.
    pub fn run(mut self) -> JourneyRecord {
        info!(participant = %self.participant.name, "starting journey");

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.drive())).unwrap_or_else(
            |payload| {
                Err(JourneyError::Panicked {
                    phase: self.phase,
                    message: panic_message(payload.as_ref()),
                })
            },
        );

        match outcome {
            Ok(()) => {
                self.enter(JourneyPhase::Completed);
                self.record.completion_status = CompletionStatus::Completed;
                info!(
                    participant = %self.participant.name,
                    skills = self.record.final_skills.total(),
                    "journey completed"
                );
            }
            Err(e) => self.fail(e),
        }

        self.record.end_time = Some(Local::now().to_rfc3339());
        self.record
    }

    fn drive(&mut self) -> Result<(), JourneyError> {
        self.select_character()?;

        let catalog = self.catalog;
        for (i, scenario) in catalog.scenarios.iter().enumerate() {
            self.enter(JourneyPhase::InScenario(i + 1));
            info!(
                participant = %self.participant.name,
                scenario = %scenario.id,
                name = %scenario.name,
                "entering scenario"
            );
            self.run_scenario(scenario)?;
        }

        self.enter(JourneyPhase::SurveyPending);
        self.take_survey()
    }

    fn enter(&mut self, next: JourneyPhase) {
        debug_assert!(!self.phase.is_terminal(), "terminal journeys do not reopen");
        debug!(participant = %self.participant.name, from = %self.phase, to = %next, "journey phase");
        self.phase = next;
    }

    fn ask(&mut self, prompt: &str) -> Result<String, JourneyError> {
        if self.cancel.is_some_and(|flag| flag.load(Ordering::SeqCst)) {
            return Err(JourneyError::Cancelled { phase: self.phase });
        }

        let reply = self
            .agent
            .converse(&self.conversation, prompt)
            .map_err(|source| JourneyError::Agent {
                phase: self.phase,
                source,
            })?;

        self.conversation.record(prompt, &reply);
        Ok(reply)
    }

    fn select_character(&mut self) -> Result<(), JourneyError> {
        let prompt = PromptBuilder::character_selection(&self.settings.characters);
        let reply = self.ask(&prompt)?;

        let extracted = extract_character_choice(&reply, &self.settings.character_names());
        if extracted.used_default {
            warn!(participant = %self.participant.name, "no character recognised, using default");
        }

        self.record.character_selection = CharacterSelection {
            character_selected: extracted.value.name,
            reasoning: extracted.value.reasoning,
            timestamp: Local::now().to_rfc3339(),
        };
        self.enter(JourneyPhase::CharacterSelected);

        Ok(())
    }

    fn run_scenario(&mut self, scenario: &'a Scenario) -> Result<(), JourneyError> {
        // Opened up front so a fault mid-scenario keeps the decisions made so far.
        self.record.scenarios.push(ScenarioRecord {
            scenario_id: scenario.id.clone(),
            scenario_name: scenario.name.clone(),
            decisions: Vec::new(),
            skills_earned: Vec::new(),
            time_spent_seconds: 0,
        });

        for point in &scenario.decision_points {
            let (decision, skills) = self.decide(scenario, point)?;
            self.apply(decision, skills);
        }

        let seconds = self.rng.gen_range(self.settings.scenario_seconds());
        if let Some(open) = self.record.scenarios.last_mut() {
            open.time_spent_seconds = seconds;
        }

        Ok(())
    }

    fn decide(
        &mut self,
        scenario: &Scenario,
        point: &'a DecisionPoint,
    ) -> Result<(DecisionRecord, &'a [String]), JourneyError> {
        let prompt = PromptBuilder::decision(scenario, point);
        let reply = self.ask(&prompt)?;

        let legal = point.legal_labels();
        let extracted = extract_decision_choice(&reply, &legal);

        let resolution = resolve_decision(&extracted, &legal, &mut *self.rng)
            .ok_or_else(|| JourneyError::NoOptions(point.id.clone()))?;

        if resolution.is_substituted() {
            warn!(
                participant = %self.participant.name,
                decision = %point.id,
                extracted = %extracted.value.label,
                substituted = %resolution.label(),
                "unusable choice, substituted a random option"
            );
        }

        let option = point
            .option(resolution.label())
            .ok_or_else(|| JourneyError::MissingOption {
                decision: point.id.clone(),
                label: resolution.label().to_string(),
            })?;

        let record = DecisionRecord {
            decision_id: point.id.clone(),
            choice: resolution.label().to_string(),
            choice_text: option.text.clone(),
            reasoning: resolution.reasoning().to_string(),
            feedback_received: option.feedback.clone(),
            choice_substituted: resolution.is_substituted(),
        };

        Ok((record, &option.skills))
    }

    /// One point per skill tag of the chosen option.
    fn apply(&mut self, decision: DecisionRecord, skills: &[String]) {
        let record = &mut self.record;

        for skill in skills {
            record.final_skills.accrue(skill);
        }

        if let Some(open) = record.scenarios.last_mut() {
            for skill in skills {
                if !open.skills_earned.contains(skill) {
                    open.skills_earned.push(skill.clone());
                }
            }
            open.decisions.push(decision);
        }
    }

    fn take_survey(&mut self) -> Result<(), JourneyError> {
        let names = self.catalog.scenario_names();
        let prompt = PromptBuilder::survey(&self.record, self.participant, &names);
        let reply = self.ask(&prompt)?;

        let survey = extract_survey(&reply);
        if survey.used_default {
            warn!(participant = %self.participant.name, "survey ratings not found, keeping defaults");
        }
        self.record.feedback = survey.value;

        Ok(())
    }

    fn fail(&mut self, e: JourneyError) {
        let e = anyhow::Error::new(e);
        let message = format!("{:#}", e);
        error!(participant = %self.participant.name, phase = %self.phase, error = %message, "journey failed");

        self.enter(JourneyPhase::Errored);
        self.record.completion_status = CompletionStatus::Error;
        self.record.error = Some(message);
        self.record.error_detail = Some(format!("{:?}", e));
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

mod common;

use std::cell::{Cell, RefCell};
use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bystander_sim::model::message::Conversation;
use bystander_sim::{
    load_results, save_results, AgentError, CompletionStatus, PersistError, ResultSet,
    SimulationRunner,
};

use common::*;

fn roster(names: &[&str]) -> Vec<bystander_sim::model::participant::Participant> {
    names.iter().map(|n| participant(n)).collect()
}

#[test]
fn failing_participant_does_not_abort_the_run() {
    let catalog = two_scenario_catalog();
    let settings = settings();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out").join("simulation_results.json");

    let agent = |conversation: &Conversation, prompt: &str| {
        if conversation.participant == "P2" && is_decision_prompt(prompt) && conversation.turns() >= 2 {
            return Err(AgentError::Failed("agent crashed".into()));
        }
        Ok(if is_decision_prompt(prompt) {
            "CHOICE: B\nREASONING: distraction is easier".to_string()
        } else {
            SURVEY_REPLY.to_string()
        })
    };

    let summary = SimulationRunner::new(&agent, &catalog, &settings)
        .run_to(&roster(&["P1", "P2", "P3"]), &path)
        .unwrap();

    assert_eq!(summary.total, 3);
    assert_eq!(summary.completed, 2);
    assert_eq!(summary.errored, 1);
    assert!(!summary.cancelled);
    assert!((summary.completion_rate - 200.0 / 3.0).abs() < 1e-9);

    let saved = load_results(&path).unwrap();
    let statuses: Vec<CompletionStatus> = saved
        .journeys()
        .iter()
        .map(|j| j.completion_status)
        .collect();
    assert_eq!(
        statuses,
        [
            CompletionStatus::Completed,
            CompletionStatus::Error,
            CompletionStatus::Completed
        ]
    );

    let broken = &saved.journeys()[1];
    assert_eq!(broken.persona_id, "P2");
    assert_eq!(broken.scenarios[0].decisions.len(), 1);
    assert!(broken.error.as_deref().unwrap().contains("agent crashed"));
}

#[test]
fn persisted_results_reload_identically() {
    let catalog = two_scenario_catalog();
    let settings = settings();
    let agent = fixed("CHOICE: D\nREASONING: staff know what to do\n\n1. Rate: 2");

    let (results, cancelled) =
        SimulationRunner::new(&agent, &catalog, &settings).run(&roster(&["A", "B", "C", "D"]));
    assert!(!cancelled);
    assert_eq!(results.len(), 4);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("results.json");
    save_results(&path, &results).unwrap();

    let reloaded = load_results(&path).unwrap();
    assert_eq!(reloaded, results);

    // Top-level JSON array with snake_case status values.
    let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(raw.as_array().unwrap().len(), 4);
    assert_eq!(raw[0]["completion_status"], "completed");
    assert_eq!(raw[0]["final_skills"]["know_resources"], 4);
}

#[test]
fn same_seed_same_journeys() {
    let catalog = two_scenario_catalog();
    let settings = settings();
    let agent = fixed("no idea");
    let people = roster(&["P1", "P2"]);

    let (first, _) = SimulationRunner::new(&agent, &catalog, &settings).run(&people);
    let (second, _) = SimulationRunner::new(&agent, &catalog, &settings).run(&people);

    for (a, b) in first.journeys().iter().zip(second.journeys()) {
        assert_eq!(a.scenarios, b.scenarios);
        assert_eq!(a.final_skills, b.final_skills);
    }
}

#[test]
fn failed_save_keeps_nothing_behind() {
    let dir = tempfile::tempdir().unwrap();
    // A directory squatting on the target path makes the final rename fail.
    let target = dir.path().join("simulation_results.json");
    fs::create_dir(&target).unwrap();
    fs::write(target.join("keep.txt"), "previous").unwrap();

    let err = save_results(&target, &ResultSet::new()).unwrap_err();
    assert!(matches!(err, PersistError::Replace { .. }), "{:?}", err);

    let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
    assert_eq!(entries.len(), 1, "temporary file left behind");
    assert_eq!(fs::read_to_string(target.join("keep.txt")).unwrap(), "previous");
}

#[test]
fn save_replaces_previous_results() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("simulation_results.json");
    fs::write(&path, "stale").unwrap();

    save_results(&path, &ResultSet::new()).unwrap();

    assert_eq!(load_results(&path).unwrap(), ResultSet::new());
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn cancellation_after_a_finished_journey_stops_the_run() {
    let catalog = single_decision_catalog();
    let settings = settings();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("simulation_results.json");

    let stop = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&stop);
    // Interrupt arrives during P1's closing survey, its last agent call.
    let agent = move |conversation: &Conversation, _: &str| {
        if conversation.turns() == 2 {
            flag.store(true, Ordering::SeqCst);
        }
        Ok::<_, AgentError>("CHOICE: A".to_string())
    };

    let summary = SimulationRunner::new(&agent, &catalog, &settings)
        .with_cancel_flag(stop)
        .run_to(&roster(&["P1", "P2", "P3"]), &path)
        .unwrap();

    assert!(summary.cancelled);
    assert_eq!(summary.total, 1);

    let saved = load_results(&path).unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved.journeys()[0].completion_status, CompletionStatus::Completed);
}

#[test]
fn cancellation_mid_journey_ends_it_at_the_next_agent_call() {
    let catalog = two_scenario_catalog();
    let settings = settings();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("simulation_results.json");

    let stop = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&stop);
    let calls_after_stop = Cell::new(0);
    // Interrupt arrives while P2 answers its first decision.
    let agent = |conversation: &Conversation, prompt: &str| {
        if flag.load(Ordering::SeqCst) {
            calls_after_stop.set(calls_after_stop.get() + 1);
        }
        if conversation.participant == "P2" && conversation.turns() == 1 {
            flag.store(true, Ordering::SeqCst);
        }
        Ok::<_, AgentError>(if is_decision_prompt(prompt) {
            "CHOICE: A".to_string()
        } else {
            SURVEY_REPLY.to_string()
        })
    };

    let summary = SimulationRunner::new(&agent, &catalog, &settings)
        .with_cancel_flag(Arc::clone(&stop))
        .run_to(&roster(&["P1", "P2", "P3"]), &path)
        .unwrap();

    assert_eq!(calls_after_stop.get(), 0, "agent called after the stop request");
    assert!(summary.cancelled);
    assert_eq!(summary.total, 2);

    let saved = load_results(&path).unwrap();
    assert_eq!(saved.journeys()[0].completion_status, CompletionStatus::Completed);

    let interrupted = &saved.journeys()[1];
    assert_eq!(interrupted.completion_status, CompletionStatus::Error);
    assert_eq!(interrupted.scenarios[0].decisions.len(), 1);
    let error = interrupted.error.as_deref().unwrap();
    assert!(error.contains("cancelled during scenario 1"), "{}", error);
}

#[test]
fn finished_journeys_are_saved_before_the_next_starts() {
    let catalog = single_decision_catalog();
    let settings = settings();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("simulation_results.json");

    // Size of the saved result set when each participant starts.
    let seen_on_disk = RefCell::new(Vec::new());
    let agent = |conversation: &Conversation, _: &str| {
        if conversation.turns() == 0 {
            let saved = load_results(&path).map(|r| r.len()).unwrap_or(0);
            seen_on_disk.borrow_mut().push(saved);
        }
        Ok::<_, AgentError>("CHOICE: B".to_string())
    };

    SimulationRunner::new(&agent, &catalog, &settings)
        .run_to(&roster(&["P1", "P2", "P3"]), &path)
        .unwrap();

    assert_eq!(*seen_on_disk.borrow(), vec![0, 1, 2]);
    assert_eq!(load_results(&path).unwrap().len(), 3);
}

#[test]
fn panicking_journey_is_recorded_and_the_run_continues() {
    let catalog = two_scenario_catalog();
    let settings = settings();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("simulation_results.json");

    let agent = |conversation: &Conversation, prompt: &str| {
        if conversation.participant == "P2" && conversation.turns() == 2 {
            panic!("agent exploded");
        }
        Ok::<_, AgentError>(if is_decision_prompt(prompt) {
            "CHOICE: C".to_string()
        } else {
            SURVEY_REPLY.to_string()
        })
    };

    let summary = SimulationRunner::new(&agent, &catalog, &settings)
        .run_to(&roster(&["P1", "P2", "P3"]), &path)
        .unwrap();

    assert_eq!(summary.total, 3);
    assert_eq!(summary.completed, 2);
    assert_eq!(summary.errored, 1);

    let saved = load_results(&path).unwrap();
    let broken = &saved.journeys()[1];
    assert_eq!(broken.completion_status, CompletionStatus::Error);
    assert_eq!(broken.scenarios[0].decisions.len(), 1);
    assert_eq!(broken.final_skills.get("support_survivor"), 1);
    let error = broken.error.as_deref().unwrap();
    assert!(error.contains("panicked during scenario 1"), "{}", error);
    assert!(error.contains("agent exploded"), "{}", error);
    assert!(broken.end_time.is_some());
}

#[test]
fn completion_rate_of_empty_set_is_zero() {
    assert_eq!(ResultSet::new().completion_rate(), 0.0);
}

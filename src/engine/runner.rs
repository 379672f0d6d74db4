use std::convert::Infallible;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};

use crate::engine::journey::JourneyEngine;
use crate::engine::llm_client::Agent;
use crate::engine::store::{save_results, PersistError};
use crate::model::journey::{CompletionStatus, ResultSet};
use crate::model::participant::Participant;
use crate::model::scenario::ScenarioCatalog;
use crate::settings::SimulationSettings;

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub total: usize,
    pub completed: usize,
    pub errored: usize,
    /// Percentage of completed journeys
    pub completion_rate: f64,
    pub results_path: PathBuf,
    /// True when the run stopped early on request
    pub cancelled: bool,
}

/// Runs every participant through the module, one at a time, in roster order.
pub struct SimulationRunner<'a, A: Agent + ?Sized> {
    agent: &'a A,
    catalog: &'a ScenarioCatalog,
    settings: &'a SimulationSettings,
    cancel: Option<Arc<AtomicBool>>,
}

impl<'a, A: Agent + ?Sized> SimulationRunner<'a, A> {
    pub fn new(agent: &'a A, catalog: &'a ScenarioCatalog, settings: &'a SimulationSettings) -> Self {
        Self {
            agent,
            catalog,
            settings,
            cancel: None,
        }
    }

    /// Once `flag` is set no further journeys are started, and the one in
    /// progress ends as errored at its next agent call.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    fn cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    /// Runs all journeys and returns them without persisting. The second
    /// value is true when the run was cut short by the cancel flag.
    pub fn run(&self, roster: &[Participant]) -> (ResultSet, bool) {
        match self.drive(roster, |_| Ok::<(), Infallible>(())) {
            Ok(outcome) => outcome,
            Err(never) => match never {},
        }
    }

    /// Runs all journeys, saving the result set to `path` after each one.
    /// Every save is an atomic replace, so an abort at any point leaves the
    /// journeys finished so far on disk.
    pub fn run_to(&self, roster: &[Participant], path: &Path) -> Result<RunSummary, PersistError> {
        let (results, cancelled) = self.drive(roster, |so_far| save_results(path, so_far))?;
        if results.is_empty() {
            save_results(path, &results)?;
        }

        let summary = RunSummary {
            total: results.len(),
            completed: results.count(CompletionStatus::Completed),
            errored: results.count(CompletionStatus::Error),
            completion_rate: results.completion_rate(),
            results_path: path.to_path_buf(),
            cancelled,
        };

        info!(
            total = summary.total,
            completed = summary.completed,
            errored = summary.errored,
            "completion rate {:.1}%",
            summary.completion_rate
        );

        Ok(summary)
    }

    /// Runs participants in roster order, handing the results so far to
    /// `checkpoint` after every finished journey.
    fn drive<E>(
        &self,
        roster: &[Participant],
        mut checkpoint: impl FnMut(&ResultSet) -> Result<(), E>,
    ) -> Result<(ResultSet, bool), E> {
        let mut rng = StdRng::seed_from_u64(self.settings.seed);
        let mut results = ResultSet::new();

        info!(
            participants = roster.len(),
            scenarios = self.catalog.len(),
            seed = self.settings.seed,
            "starting simulation"
        );

        for (i, participant) in roster.iter().enumerate() {
            if self.cancelled() {
                warn!(done = i, remaining = roster.len() - i, "run cancelled, stopping early");
                return Ok((results, true));
            }

            info!("[{}/{}] simulating {}", i + 1, roster.len(), participant.name);
            let mut engine =
                JourneyEngine::new(self.agent, self.catalog, self.settings, participant, &mut rng);
            if let Some(flag) = self.cancel.as_deref() {
                engine = engine.with_cancel_flag(flag);
            }
            results.push(engine.run());
            checkpoint(&results)?;
        }

        Ok((results, self.cancelled()))
    }
}

//! Drives synthetic participants through a branching bystander-intervention
//! training module and turns their free-text answers into structured records.

pub mod engine;
pub mod model;
pub mod settings;
pub mod settings_io;

pub use engine::journey::{JourneyEngine, JourneyError, JourneyPhase};
pub use engine::llm_client::{Agent, AgentError, ChatAgent};
pub use engine::runner::{RunSummary, SimulationRunner};
pub use engine::store::{load_results, save_results, PersistError};
pub use model::journey::{CompletionStatus, JourneyRecord, ResultSet};
pub use settings::SimulationSettings;

use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use signal_hook::consts::TERM_SIGNALS;
use signal_hook::flag;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use bystander_sim::engine::llm_client::ChatAgent;
use bystander_sim::engine::runner::SimulationRunner;
use bystander_sim::model::participant::load_roster;
use bystander_sim::model::scenario::ScenarioCatalog;
use bystander_sim::settings::SimulationSettings;
use bystander_sim::settings_io::load_settings;

#[derive(Parser)]
#[command(name = "bystander-sim")]
#[command(about = "Simulate participants through a branching bystander-intervention module")]
struct Cli {
    /// Settings file (JSON). Defaults to the user config dir, then built-in defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run every participant through the module and save the results
    Run(RunArgs),
    /// Check that the configured agent endpoint answers
    CheckAgent,
}

#[derive(Args)]
struct RunArgs {
    /// Scenario catalog (JSON)
    #[arg(long)]
    scenarios: Option<PathBuf>,

    /// Participant roster (JSON array)
    #[arg(long)]
    roster: Option<PathBuf>,

    #[arg(short = 'n', long)]
    participants: Option<usize>,

    #[arg(long)]
    seed: Option<u64>,

    /// Traverse only the first N scenarios of the catalog
    #[arg(long)]
    scenario_count: Option<usize>,

    #[arg(short, long)]
    output_dir: Option<PathBuf>,
}

impl RunArgs {
    fn apply(self, settings: &mut SimulationSettings) {
        if let Some(path) = self.scenarios {
            settings.scenarios_file = path;
        }
        if let Some(path) = self.roster {
            settings.roster_file = path;
        }
        if let Some(n) = self.participants {
            settings.num_participants = n;
        }
        if let Some(seed) = self.seed {
            settings.seed = seed;
        }
        if let Some(count) = self.scenario_count {
            settings.scenario_count = Some(count);
        }
        if let Some(dir) = self.output_dir {
            settings.output_dir = dir;
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut settings = load_settings(cli.config.as_deref()).context("loading settings")?;

    match cli.command {
        Command::Run(args) => {
            args.apply(&mut settings);
            run(&settings)
        }
        Command::CheckAgent => {
            let agent = ChatAgent::new(&settings.agent).context("building agent client")?;
            let status = agent
                .check_connection()
                .with_context(|| format!("checking {}", settings.agent.base_url))?;
            info!("{}", status);
            Ok(())
        }
    }
}

fn run(settings: &SimulationSettings) -> Result<()> {
    let mut catalog = ScenarioCatalog::load(&settings.scenarios_file, &settings.skills)
        .with_context(|| format!("loading scenarios from {}", settings.scenarios_file.display()))?;
    if let Some(count) = settings.scenario_count {
        catalog.truncate(count);
    }

    let mut roster = load_roster(&settings.roster_file)
        .with_context(|| format!("loading participants from {}", settings.roster_file.display()))?;
    roster.truncate(settings.num_participants);

    let agent = ChatAgent::new(&settings.agent).context("building agent client")?;
    if !agent.has_api_key() {
        warn!(
            env = %settings.agent.api_key_env,
            "no API key in environment, sending unauthenticated requests"
        );
    }

    // First signal asks for a graceful stop, a second one terminates.
    let stop = Arc::new(AtomicBool::new(false));
    for sig in TERM_SIGNALS {
        flag::register_conditional_shutdown(*sig, 1, Arc::clone(&stop))
            .context("installing signal handler")?;
        flag::register(*sig, Arc::clone(&stop)).context("installing signal handler")?;
    }

    let summary = SimulationRunner::new(&agent, &catalog, settings)
        .with_cancel_flag(stop)
        .run_to(&roster, &settings.results_path())
        .context("saving results")?;

    if summary.cancelled {
        warn!("run was interrupted; results hold the journeys that reached a terminal state");
    }
    info!(
        "simulated {}, completed {} ({:.1}%), results in {}",
        summary.total,
        summary.completed,
        summary.completion_rate,
        summary.results_path.display()
    );

    Ok(())
}

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chemo_core::{PlanConfig, TreatmentPlan, TreatmentReport};
use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod prompt;
mod render;

use prompt::Prompter;

#[derive(Parser, Debug)]
#[command(
    name = "chemo-cli",
    about = "Simulate a Hodgkin lymphoma chemotherapy course."
)]
struct Args {
    /// Scenario JSON file. Prompts for patient data and feedback when omitted.
    #[arg(short, long)]
    scenario: Option<PathBuf>,

    /// Plan config JSON file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the final report as JSON.
    #[arg(long)]
    json: bool,

    /// Append logs to this file instead of stderr.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let _guard = init_logging(args.log_file.as_deref())?;
    tracing::info!("Starting chemo-cli...");

    let config: PlanConfig = match &args.config {
        Some(path) => {
            let data = fs::read_to_string(path)
                .with_context(|| format!("Could not read config {path:?}"))?;
            serde_json::from_str(&data).with_context(|| format!("Invalid config {path:?}"))?
        }
        None => PlanConfig::default(),
    };

    let report = match &args.scenario {
        Some(path) => {
            let data = fs::read_to_string(path)
                .with_context(|| format!("Could not read scenario {path:?}"))?;
            chemo_scenario::simulate_scenario_str(&data, &config)
                .with_context(|| format!("Could not simulate scenario {path:?}"))?
        }
        None => run_interactive(config)?,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render::final_report(&report));
    }

    tracing::info!(cycles = report.current_cycle, "Simulation complete.");
    Ok(())
}

fn init_logging(log_file: Option<&Path>) -> anyhow::Result<WorkerGuard> {
    let (writer, guard) = match log_file {
        Some(path) => {
            let file = open_log_file(path)?;
            tracing_appender::non_blocking(file)
        }
        None => tracing_appender::non_blocking(io::stderr()),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(writer))
        .init();

    Ok(guard)
}

fn open_log_file(path: &Path) -> anyhow::Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Could not create log directory {parent:?}"))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Could not open log file {path:?}"))
}

fn run_interactive(config: PlanConfig) -> anyhow::Result<TreatmentReport> {
    let stdin = io::stdin();
    let mut prompter = Prompter::new(stdin.lock(), io::stdout());

    let patient = prompter.patient()?;
    let mut plan = TreatmentPlan::with_config(patient, config);
    plan.choose_initial_regimen()?;
    print!("{}", plan.summary());

    // Escalation resets the cycle count and may change the total, so the
    // bound is re-read on every pass.
    while plan.current_cycle() < plan.total_cycles() {
        let cycle = plan.run_cycle()?;
        print!("{}", render::cycle(&cycle));

        let feedback = prompter.feedback(plan.current_cycle(), plan.interim_pet_due())?;
        let assessment = plan.assess_feedback_and_adjust(&feedback)?;
        print!("{}", render::assessment(&assessment));

        if plan.is_delayed() {
            println!("\n--- Cycle Delayed ---");
            println!("Simulating a 1-week delay for patient recovery...");
        }

        if plan.current_cycle() >= plan.total_cycles() {
            break;
        }
        if !prompter.confirm("\nContinue to the next cycle? (Y/N): ")? {
            println!("Treatment discontinued by user.");
            break;
        }
    }

    Ok(plan.report())
}

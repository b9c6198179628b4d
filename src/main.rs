use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use tokio::time::MissedTickBehavior;
use tracing::info;
use tracing_subscriber::EnvFilter;

use keepalive::{
    engine::{EngineBuilder, EngineError, EngineSettings, TickReport},
    scenario::ScenarioLoader,
    systems,
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Planetary customer demand and hosting allocation simulator")]
struct Cli {
    /// Path to the scenario YAML file
    #[arg(long, default_value = "scenarios/earth_small.yaml")]
    scenario: PathBuf,

    /// Stop after this many ticks (runs until Ctrl-C when omitted)
    #[arg(long)]
    ticks: Option<u64>,

    /// Override the wall-clock tick period in milliseconds
    #[arg(long)]
    tick_interval_ms: Option<u64>,

    /// Emit one JSON object per tick instead of a status line
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let loader = ScenarioLoader::new(".");
    let scenario = loader.load(&cli.scenario)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&scenario.logging.level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    info!(
        scenario = %scenario.name,
        seed = scenario.seed,
        grid = ?scenario.grid,
        time_rate = scenario.time_rate,
        "scenario loaded"
    );

    let mut world = scenario.build_world(Utc::now())?;
    let ticks = scenario.ticks(cli.ticks);
    let period_ms = cli
        .tick_interval_ms
        .unwrap_or(scenario.tick_interval_ms)
        .max(1);

    let settings = EngineSettings {
        scenario_name: scenario.name.clone(),
        seed: scenario.seed,
    };
    let mut engine = systems::with_tick_systems(EngineBuilder::new(settings)).build();

    let mut interval = tokio::time::interval(Duration::from_millis(period_ms));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    engine.start();
    info!(period_ms, ?ticks, "simulation running");
    let mut completed = 0_u64;
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("stop requested");
                engine.stop();
                break;
            }
            _ = interval.tick() => {}
        }

        match engine.tick(&mut world, Utc::now()) {
            Ok(report) => {
                print_report(&report, cli.json)?;
                completed += 1;
            }
            // already logged; the world is unchanged and the next tick retries
            Err(EngineError::TickAborted { .. }) => {}
            Err(err) => return Err(err.into()),
        }

        if ticks.is_some_and(|limit| completed >= limit) {
            engine.stop();
            break;
        }
    }

    info!(
        scenario = %engine.scenario_name(),
        ticks = completed,
        customers = world.planet().customers(),
        balance = world.account_balance(),
        "simulation stopped"
    );
    Ok(())
}

fn print_report(report: &TickReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(report)?);
    } else {
        println!(
            "[{}] active {:>10} of {:>12} ratio {:.4} served {:>8} unserved {:>8} balance {:>10.2}",
            report.simulated_time.to_rfc3339(),
            report.active_customers,
            report.total_population,
            report.customer_ratio,
            report.served,
            report.unserved,
            report.account_balance,
        );
    }
    Ok(())
}

//! MUIC scenario runner
//!
//! Drives the SM5502 cable engine against a simulated chip: loads settings,
//! plays the configured scenario and prints every engine event.

mod cli;
mod report;
mod scenario;
mod settings;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::Cli;
use report::describe_event;
use settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Include all our crates in the default filter
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "muicd=info,muic_regs=info,muic_engine=info,muic_sim=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    if cli.print_default {
        println!("{}", Settings::default().to_json()?);
        return Ok(());
    }

    let mut settings = match &cli.settings {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load(),
    };
    if cli.rustproof {
        settings.rustproof = true;
    }

    info!(
        "Starting muicd: {} scenario steps, startup delay {} ms",
        settings.scenario.len(),
        settings.engine.startup_delay_ms
    );

    let (runner, task, mut events) = scenario::start(&settings);
    let printer = tokio::spawn(async move {
        let mut announcements = 0usize;
        while let Some(event) = events.recv().await {
            if event.is_cable() {
                announcements += 1;
            }
            println!("{}", describe_event(&event));
        }
        announcements
    });

    let result = runner.run(&settings.scenario).await;
    if let Err(e) = &result {
        warn!("Scenario stopped early: {}", e);
    }

    if let Err(e) = runner.handle().shutdown().await {
        warn!("Engine already stopped: {}", e);
    }
    task.await?;
    let announcements = printer.await?;

    info!("muicd finished: {} cable announcements", announcements);
    result
}

//! vjoy-sim - replay scripted touch input through the virtual joystick
//!
//! Loads a joystick/motion configuration and a touch script, runs them at the
//! configured tick rate and prints where the body ended up.

use anyhow::Result;
use clap::Parser;
use colored::*;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vjoy_motion::{AppConfig, SimReport, Simulation, TouchScript};

/// Virtual joystick simulator
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (defaults are used when omitted)
    #[arg(short, long)]
    config: Option<String>,

    /// Path to the touch script to replay
    #[arg(short, long)]
    script: String,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Pace ticks in real time instead of replaying as fast as possible
    #[arg(long)]
    realtime: bool,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let args = Args::parse();

    init_logging(&args.log_level)?;

    let config = match &args.config {
        Some(path) => {
            info!("Configuration file: {}", path);
            AppConfig::load(path).await?
        }
        None => {
            info!("No configuration file given, using defaults");
            AppConfig::default()
        }
    };

    let script = TouchScript::load(&args.script).await?;
    info!(
        "Loaded script {} ({} steps, {} ticks)",
        args.script,
        script.steps.len(),
        script.total_ticks()
    );

    let mut sim = Simulation::new(&config)?;
    let report = if args.realtime {
        run_realtime(&mut sim, &script).await
    } else {
        sim.run(&script)
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    Ok(())
}

async fn run_realtime(sim: &mut Simulation, script: &TouchScript) -> SimReport {
    let period = Duration::from_secs_f32(sim.tick_duration());
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    for step in &script.steps {
        for _ in 0..step.wait_ticks {
            interval.tick().await;
            sim.tick();
        }
        sim.perform(step);
    }

    sim.report()
}

fn print_report(report: &SimReport) {
    println!("\n{}", "=== Simulation Report ===".bold().cyan());
    println!(
        "  Ticks: {} ({:.2}s)",
        report.ticks.to_string().green(),
        report.duration_secs
    );

    let mode = match report.joystick_mode {
        Some(mode) => format!("{:?}", mode).green(),
        None => "inert (no anchors)".yellow(),
    };
    println!("  Joystick: {}", mode);

    println!("\n{}", "Events:".bold());
    if report.events.is_empty() {
        println!("  {}", "none".dimmed());
    }
    for (topic, count) in &report.events {
        println!("  {:<20} {}", topic, count);
    }

    println!("\n{}", "Body:".bold());
    println!(
        "  Position: ({:.3}, {:.3})",
        report.body.position.x, report.body.position.y
    );
    println!("  Angle:    {:.1}°", report.body.angle_deg);
    println!(
        "  Tier:     {:?} (speed {})",
        report.motion.speed_tier, report.motion.resolved_speed
    );

    if report.forces.applied > 0 {
        println!(
            "  Forces:   {} applied, total ({:.3}, {:.3})",
            report.forces.applied, report.forces.total.x, report.forces.total.y
        );
    }
}

fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false),
        )
        .init();

    Ok(())
}

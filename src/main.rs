mod cli;
mod ui;

use std::env;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use cli::{Cli, Command};
use stagetime::{
    BusinessCalendar, Clock, FixedClock, ItemRecord, SlaClassifier, StageClock, StagetimeConfig,
    SystemClock, WorkItemTimingContext, parse_instant,
};
use ui::Report;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => StagetimeConfig::load_from(path),
        None => StagetimeConfig::load(),
    }
    .context("failed to load configuration")?;
    let calendar = config.calendar()?;
    let report = Report::new(cli.json);

    match &cli.now {
        Some(raw) => {
            let now = parse_instant(raw).with_context(|| format!("invalid --now value `{raw}`"))?;
            run(&cli, &config, calendar, FixedClock::new(now), &report)
        }
        None => run(&cli, &config, calendar, SystemClock, &report),
    }
}

fn run<C: Clock>(
    cli: &Cli,
    config: &StagetimeConfig,
    calendar: BusinessCalendar,
    clock: C,
    report: &Report,
) -> Result<()> {
    match &cli.command {
        Command::Hours { start, end } => {
            let hours = calendar.business_hours_between(start, end)?;
            report.hours(hours);
        }
        Command::Deadline { start, hours } => {
            let at = calendar.add_business_hours_to(start, *hours)?;
            report.deadline(at);
        }
        Command::StageTime { item, stage } => {
            let ctx = load_item(item)?.1;
            let target = stage.as_deref().unwrap_or(&ctx.current_stage);
            let stage_clock = StageClock::new(calendar, clock);
            let stage_report =
                stage_clock.stage_report(&ctx.chronology, target, ctx.created_at, &ctx.current_stage);
            report.stage_time(&stage_report);
        }
        Command::Status { item } => {
            let (workflow, ctx) = load_item(item)?;
            let thresholds = config.thresholds_for(workflow.as_deref(), &ctx.current_stage);
            let sla = SlaClassifier::new(StageClock::new(calendar, clock));
            let status = sla.classify(&ctx, &thresholds);
            report.status(&ctx.current_stage, &status);
        }
    }
    Ok(())
}

fn load_item(path: &Path) -> Result<(Option<String>, WorkItemTimingContext)> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read item file {}", path.display()))?;
    let record: ItemRecord = serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse item file {}", path.display()))?;
    let workflow = record.workflow_type.clone();
    let ctx = WorkItemTimingContext::try_from(record)
        .with_context(|| format!("invalid item metadata in {}", path.display()))?;
    Ok((workflow, ctx))
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("STAGETIME_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose {
            "stagetime=debug,info"
        } else {
            "stagetime=info,warn"
        })
    });

    let format = env::var("STAGETIME_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());
    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

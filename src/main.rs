use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use fleetline::app::{AppEvent, AppState};
use fleetline::cli::{Cli, Command};
use fleetline::config::{API_KEY_ENV, DEFAULT_CONFIG_FILE, FleetlineConfig};
use fleetline::error::FleetlineError;
use fleetline::fleet::{Dispatcher, Fleet, FleetEvent, FleetSimulation, scenario};
use fleetline::intelligence::advisor;
use fleetline::intelligence::{GeminiClient, RetryPolicy};
use fleetline::shift::{self, JobStatus, ShiftStats};
use fleetline::tracking::MileageWatch;
use fleetline::triage::{self, OfferDraft, OfferMetrics, TriageError};
use fleetline::{input, logging, planner, ui};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => FleetlineConfig::load_from(path),
        None => FleetlineConfig::load(),
    }
    .context("failed to load configuration")?;
    if let Some(model) = cli.model {
        config.model = model;
    }
    if let Some(retries) = cli.max_retries {
        config.max_retries = retries;
    }

    match cli.command {
        Command::Simulate {
            scenario,
            ai,
            max_ticks,
            admin,
        } => simulate(&config, scenario, ai, max_ticks, admin).await,
        Command::Track { file } => track(&config, file).await,
        Command::Triage {
            pay,
            distance,
            minutes,
            screenshot,
            ai,
        } => {
            let draft = OfferDraft {
                pay,
                distance,
                estimated_minutes: minutes,
            };
            run_triage(&config, draft, screenshot, ai).await
        }
        Command::Plan { jobs, ai } => plan(&config, &jobs, ai).await,
        Command::Shift {
            jobs,
            hours,
            miles,
            ai,
        } => shift_report(&config, &jobs, hours, miles, ai).await,
        Command::Verify { photo } => verify(&config, &photo).await,
    }
}

fn build_client(config: &FleetlineConfig) -> Result<GeminiClient> {
    if !config.has_api_key() {
        bail!("no API key: set {API_KEY_ENV} or api_key in {DEFAULT_CONFIG_FILE}");
    }
    let client = GeminiClient::with_base_url(
        config.api_key.clone(),
        config.model.clone(),
        config.base_url.clone(),
    )?
    .with_retry(RetryPolicy {
        max_retries: config.max_retries,
        base_delay_ms: config.base_delay_ms,
    });
    Ok(client)
}

/// Client for `--ai` runs; without one the caller falls back to local
/// heuristics.
fn optional_client(config: &FleetlineConfig, wanted: bool) -> Option<GeminiClient> {
    if !wanted {
        return None;
    }
    match build_client(config) {
        Ok(client) => Some(client),
        Err(e) => {
            ui::warn(&format!("{e:#}; using local heuristics"));
            None
        }
    }
}

async fn simulate(
    config: &FleetlineConfig,
    scenario_path: Option<PathBuf>,
    ai: bool,
    max_ticks: u64,
    admin: bool,
) -> Result<()> {
    let client = optional_client(config, ai);

    let loaded = match (scenario_path, &client) {
        (Some(path), _) => input::read_scenario(&path)?,
        (None, Some(client)) => match advisor::generate_fleet_scenario(client).await {
            Ok(generated) => generated,
            Err(e) => {
                ui::warn(&format!("scenario generation failed ({e}); using local generator"));
                scenario::generate(&mut rand::rng())
            }
        },
        (None, None) => scenario::generate(&mut rand::rng()),
    };

    let mut fleet = Fleet::new(config.fleet.motion(), config.fleet.notification_limit);
    Dispatcher::next(&mut fleet, FleetEvent::LoadScenario(loaded));

    let plan = match &client {
        Some(client) => match advisor::dispatch_fleet(client, &fleet).await {
            Ok(plan) if !plan.assignments.is_empty() => plan,
            Ok(_) => planner::plan_dispatch(&fleet),
            Err(e) => {
                ui::warn(&format!("dispatch failed ({e}); assigning nearest drivers"));
                planner::plan_dispatch(&fleet)
            }
        },
        None => planner::plan_dispatch(&fleet),
    };
    let report = Dispatcher::assign(&mut fleet, plan.assignments);
    info!(
        applied = report.applied.len(),
        rejected = report.rejected.len(),
        "dispatch plan applied"
    );

    let tick = Duration::from_millis(config.fleet.tick_interval_ms);
    let (command_tx, command_rx) = mpsc::channel(16);
    let (snapshot_tx, mut snapshot_rx) = watch::channel(fleet.clone());
    let cancel = CancellationToken::new();
    let admin_work =
        admin && (fleet.pending_approvals().next().is_some() || fleet.disputes().next().is_some());
    let needs_run = fleet.busy_count() > 0 || admin_work;
    let handle = tokio::spawn(
        FleetSimulation::new(fleet.clone(), tick)
            .with_tick_limit(max_ticks)
            .run(command_rx, snapshot_tx, cancel.clone()),
    );

    if admin_work {
        for driver in fleet.pending_approvals() {
            command_tx.send(FleetEvent::ApproveDriver(driver.id.clone())).await?;
        }
        for order in fleet.disputes() {
            command_tx.send(FleetEvent::ResolveDispute(order.id.clone())).await?;
        }
    }
    drop(command_tx);

    let mut progress = ui::SimulationProgress::start("Dispatching…");
    if needs_run {
        // Ends when the fleet settles or the simulation stops at its tick
        // limit and drops the sender.
        while snapshot_rx.changed().await.is_ok() {
            let snapshot = snapshot_rx.borrow_and_update().clone();
            progress.update(&snapshot);
            if snapshot.busy_count() == 0 {
                break;
            }
        }
    }

    cancel.cancel();
    let fleet = handle.await.context("fleet simulation task panicked")?;
    let settled = fleet.busy_count() == 0;
    progress.finish(settled);
    if !settled {
        warn!(busy = fleet.busy_count(), "simulation hit the tick limit");
    }
    ui::print_fleet(&fleet);
    Ok(())
}

async fn track(config: &FleetlineConfig, file: Option<PathBuf>) -> Result<()> {
    let fixes = match file {
        Some(path) => {
            let f = File::open(&path).with_context(|| format!("cannot open {}", path.display()))?;
            input::read_fixes(BufReader::new(f))?
        }
        None => input::read_fixes(io::stdin().lock())?,
    };

    let (fix_tx, fix_rx) = mpsc::channel(64);
    let mileage = MileageWatch::spawn(
        config.tracking.jitter_threshold_miles,
        fix_rx,
        CancellationToken::new(),
    );
    for fix in fixes {
        fix_tx
            .send(fix)
            .await
            .context("mileage watch stopped early")?;
    }
    drop(fix_tx);

    let tracker = mileage.join().await?;
    ui::print_mileage(tracker.total_miles(), tracker.accepted(), tracker.discarded());
    Ok(())
}

async fn run_triage(
    config: &FleetlineConfig,
    mut draft: OfferDraft,
    screenshot: Option<PathBuf>,
    ai: bool,
) -> Result<()> {
    let client = optional_client(config, ai || screenshot.is_some());

    if let Some(path) = screenshot {
        let Some(client) = &client else {
            bail!("reading a screenshot needs the intelligence service");
        };
        let (data, mime) = input::read_image(&path)?;
        let extraction = advisor::extract_offer(client, &data, mime).await?;
        let read = OfferDraft::from(&extraction);
        draft = OfferDraft {
            pay: draft.pay.or(read.pay),
            distance: draft.distance.or(read.distance),
            estimated_minutes: draft.estimated_minutes.or(read.estimated_minutes),
        };
        info!(platform = %extraction.platform, restaurant = %extraction.restaurant, "offer read from screenshot");
    }

    let offer = draft.validate().map_err(FleetlineError::from)?;
    let metrics = OfferMetrics::compute(&offer, &config.settings);

    let recommendation = match client.as_ref().filter(|_| ai) {
        Some(client) => match triage::assess_offer(client, &draft, &config.settings).await {
            Ok(assessment) => Some(assessment.recommendation),
            Err(TriageError::Invalid(e)) => return Err(FleetlineError::from(e).into()),
            Err(TriageError::Intelligence(e)) => {
                ui::warn(&format!("no recommendation: {e}"));
                None
            }
        },
        None => None,
    };

    ui::print_offer(&offer, &metrics, recommendation.as_ref());
    Ok(())
}

async fn plan(config: &FleetlineConfig, path: &Path, ai: bool) -> Result<()> {
    let jobs = input::read_jobs(path)?;
    let client = optional_client(config, ai);
    let mut rng = rand::rng();

    let route = match &client {
        Some(client) => advisor::optimize_route(client, &mut rng, &jobs)
            .await
            .unwrap_or_else(|e| {
                ui::warn(&format!("route optimization failed ({e}); ordering by $/mile"));
                planner::plan_route(&jobs)
            }),
        None => planner::plan_route(&jobs),
    };
    let jobs = shift::apply_route_order(jobs, &route);
    let active: Vec<_> = jobs
        .iter()
        .filter(|j| j.status == JobStatus::Active)
        .cloned()
        .collect();
    if active.is_empty() {
        ui::warn("no active jobs to plan");
        return Ok(());
    }
    let ordered: Vec<String> = active.iter().map(|j| j.id.clone()).collect();
    ui::print_route(&jobs, &ordered);

    let stack = match &client {
        Some(client) => match advisor::analyze_stack(client, &mut rng, &active).await {
            Ok(stack) => Some(stack),
            Err(e) => {
                ui::warn(&format!("stack analysis failed ({e}); using local rules"));
                planner::plan_stack(&active)
            }
        },
        None => planner::plan_stack(&active),
    };
    if let Some(stack) = stack {
        ui::print_stack(&stack);
    }
    Ok(())
}

async fn shift_report(
    config: &FleetlineConfig,
    path: &Path,
    hours: f64,
    miles: f64,
    ai: bool,
) -> Result<()> {
    let jobs = input::read_jobs(path)?;
    // Jobs are prepended as they arrive; replay oldest first.
    let state = jobs
        .into_iter()
        .rev()
        .map(AppEvent::AddJob)
        .fold(
            AppState::new(config.settings.clone(), config.tracking.jitter_threshold_miles),
            AppState::reduce,
        );

    let stats = ShiftStats::compute(&state.jobs, miles, hours, &state.settings);
    ui::print_shift(&stats);
    ui::print_notifications(&state.notifications);

    if let Some(client) = optional_client(config, ai) {
        match advisor::forecast_earnings(&client, &state.jobs).await {
            Ok(forecast) => ui::print_forecast(&forecast),
            Err(e) => ui::warn(&format!("forecast unavailable: {e}")),
        }
        match advisor::analyze_earnings(&client, &state.jobs).await {
            Ok(analysis) => ui::print_analysis(&analysis),
            Err(e) => ui::warn(&format!("insights unavailable: {e}")),
        }
    }
    Ok(())
}

async fn verify(config: &FleetlineConfig, photo: &Path) -> Result<()> {
    let client = build_client(config)?;
    let (data, mime) = input::read_image(photo)?;
    let verdict = advisor::verify_delivery_photo(&client, &data, mime).await?;
    ui::print_verification(&verdict);
    Ok(())
}

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use anyhow::Result;
use tokio::sync::{Mutex, mpsc};
use tracing::{Instrument, debug, debug_span, info_span, warn};

use super::timing::ScenarioTimings;
use crate::artifacts;
use crate::compare::CompareOptions;
use crate::config::ResolvedRunConfig;
use crate::driver::{Browser, CdpBrowser};
use crate::pages::Site;
use crate::scenarios::{Scenario, ScenarioContext};

/// Consecutive tab-creation failures before we declare Chrome dead.
const MAX_SESSION_FAILURES: u32 = 3;

/// Upper bound for the page screenshot taken after a failure.
const FAILURE_SCREENSHOT_TIMEOUT: Duration = Duration::from_secs(10);

/// Per-scenario outcome.
#[derive(Debug)]
pub enum ScenarioOutcome {
    Pass(ScenarioTimings),
    /// The scenario ran and an expectation did not hold.
    Fail(String, ScenarioTimings),
    /// The scenario could not run to completion (no tab, timeout, crash).
    Err(String),
}

/// Everything workers share besides the browser.
#[derive(Clone, Debug)]
pub struct RunSettings {
    pub site: Site,
    pub compare: CompareOptions,
    pub artifacts_dir: PathBuf,
    pub scenario_timeout: Duration,
    pub parallel: usize,
}

impl RunSettings {
    pub fn from_config(config: &ResolvedRunConfig) -> Self {
        Self {
            site: config.site.clone(),
            compare: config.compare.clone(),
            artifacts_dir: config.artifacts_dir.clone(),
            scenario_timeout: config.scenario_timeout,
            parallel: config.browser.parallel,
        }
    }
}

/// Where a scenario stopped: setup problems are errors, body problems are failures.
enum Failure {
    Setup(anyhow::Error),
    Body(anyhow::Error),
}

type Results = mpsc::Sender<(Scenario, ScenarioOutcome)>;

/// Drain remaining scenarios from the queue, reporting each as a Chrome crash error.
async fn drain_crashed(queue: &Mutex<Vec<Scenario>>, tx: &Results) {
    while let Some(scenario) = queue.lock().await.pop() {
        let _ = tx
            .send((scenario, ScenarioOutcome::Err("Chrome process crashed".into())))
            .await;
    }
}

/// Run a pre-built list of scenarios.
///
/// Individual failures are reported per-scenario rather than aborting the run.
///
/// Returns a `Receiver`; results stream in as scenarios complete.
pub async fn run_all(
    scenarios: Vec<Scenario>,
    config: &ResolvedRunConfig,
) -> Result<mpsc::Receiver<(Scenario, ScenarioOutcome)>> {
    if scenarios.is_empty() {
        let (_tx, rx) = mpsc::channel(1);
        return Ok(rx);
    }

    let browser = CdpBrowser::launch(&config.browser).await?;
    Ok(run_all_with(
        Arc::new(browser),
        scenarios,
        RunSettings::from_config(config),
    ))
}

/// Run orchestration: parallel workers over a shared queue, one fresh tab
/// per scenario.
pub fn run_all_with(
    browser: Arc<dyn Browser>,
    mut scenarios: Vec<Scenario>,
    settings: RunSettings,
) -> mpsc::Receiver<(Scenario, ScenarioOutcome)> {
    let count = scenarios.len();
    let parallel = settings.parallel.max(1);
    let worker_count = count.min(parallel);
    debug!(scenarios = count, workers = worker_count, parallel, "starting run");

    // Workers pop from the back; keep registry order.
    scenarios.reverse();
    let queue = Arc::new(Mutex::new(scenarios));
    let chrome_dead = Arc::new(AtomicBool::new(false));
    let settings = Arc::new(settings);

    let (tx, rx) = mpsc::channel(parallel * 2);

    let mut set = tokio::task::JoinSet::new();
    for idx in 0..worker_count {
        let queue = queue.clone();
        let tx = tx.clone();
        let browser = browser.clone();
        let chrome_dead = chrome_dead.clone();
        let settings = settings.clone();
        let span = info_span!("worker", id = idx);
        set.spawn(
            async move {
                debug!("started");
                let mut consecutive_session_failures: u32 = 0;

                loop {
                    // If another worker detected Chrome is dead, drain and exit.
                    if chrome_dead.load(Ordering::Relaxed) {
                        debug!("chrome is dead, draining remaining scenarios");
                        drain_crashed(&queue, &tx).await;
                        break;
                    }

                    let (scenario, remaining) = {
                        let mut q = queue.lock().await;
                        match q.pop() {
                            Some(s) => {
                                let remaining = q.len();
                                (s, remaining)
                            }
                            None => {
                                debug!("queue empty, exiting");
                                break;
                            }
                        }
                    };
                    let id = scenario.id();
                    debug!(scenario = %id, remaining, "picked scenario");

                    let start = Instant::now();
                    let (tab_id, driver) = match browser.open_tab().await {
                        Ok(tab) => {
                            consecutive_session_failures = 0;
                            debug!(
                                tab_id = %tab.0,
                                elapsed_ms = start.elapsed().as_millis() as u64,
                                "tab opened"
                            );
                            tab
                        }
                        Err(e) => {
                            consecutive_session_failures += 1;
                            warn!(
                                error = %format!("{e:#}"),
                                consecutive = consecutive_session_failures,
                                "failed to open tab"
                            );
                            let _ = tx
                                .send((
                                    scenario,
                                    ScenarioOutcome::Err(format!("Tab creation failed: {e:#}")),
                                ))
                                .await;

                            if consecutive_session_failures >= MAX_SESSION_FAILURES {
                                warn!(
                                    "Chrome appears to have crashed \
                                     ({consecutive_session_failures} consecutive tab failures), \
                                     aborting remaining scenarios"
                                );
                                chrome_dead.store(true, Ordering::Relaxed);
                                drain_crashed(&queue, &tx).await;
                                break;
                            }
                            continue;
                        }
                    };
                    let mut timings = ScenarioTimings {
                        open_tab: start.elapsed(),
                        ..Default::default()
                    };

                    let dir = artifacts::scenario_dir(&settings.artifacts_dir, &id);
                    artifacts::clear_scenario_dir(&dir);
                    let mut ctx = ScenarioContext::new(
                        driver,
                        settings.site.clone(),
                        scenario.persona,
                        settings.compare.clone(),
                        dir.clone(),
                    );

                    let scenario_span = debug_span!("scenario", name = %id);
                    let t_run = Instant::now();
                    let result = tokio::time::timeout(
                        settings.scenario_timeout,
                        async {
                            if let Err(e) = scenario.setup(&mut ctx).await {
                                return Err(Failure::Setup(e));
                            }
                            scenario.run(&mut ctx).await.map_err(Failure::Body)
                        }
                        .instrument(scenario_span),
                    )
                    .await;
                    timings.scenario = t_run.elapsed();

                    let error = match result {
                        Ok(Ok(())) => {
                            debug!(elapsed_ms = timings.scenario.as_millis() as u64, "passed");
                            None
                        }
                        Ok(Err(Failure::Body(e))) => {
                            let message = format!("{e:#}");
                            warn!(error = %message, "scenario failed");
                            let t_shot = Instant::now();
                            save_failure_screenshot(&mut ctx, &dir).await;
                            timings.screenshot = t_shot.elapsed();
                            Some(message)
                        }
                        Ok(Err(Failure::Setup(e))) => {
                            let message = format!("{e:#}");
                            warn!(error = %message, "scenario setup failed");
                            drop(ctx);
                            close_tab(browser.as_ref(), &tab_id).await;
                            let _ = tx.send((scenario, ScenarioOutcome::Err(message))).await;
                            continue;
                        }
                        Err(_) => {
                            let secs = settings.scenario_timeout.as_secs();
                            warn!("scenario timed out after {secs}s");
                            drop(ctx);
                            close_tab(browser.as_ref(), &tab_id).await;
                            let _ = tx
                                .send((
                                    scenario,
                                    ScenarioOutcome::Err(format!("Scenario timed out after {secs}s")),
                                ))
                                .await;
                            continue;
                        }
                    };

                    // Driver goes first; it holds the tab's connection.
                    drop(ctx);
                    let t_close = Instant::now();
                    close_tab(browser.as_ref(), &tab_id).await;
                    timings.close_tab = t_close.elapsed();
                    timings.total = start.elapsed();

                    let outcome = match error {
                        None => ScenarioOutcome::Pass(timings),
                        Some(message) => ScenarioOutcome::Fail(message, timings),
                    };
                    if tx.send((scenario, outcome)).await.is_err() {
                        warn!("channel send failed (receiver dropped), stopping");
                        break;
                    }
                }
                debug!("exiting");
            }
            .instrument(span),
        );
    }

    // Our sender is not needed; channel closes when worker clones drop.
    drop(tx);

    // Keep Chrome alive until all workers finish.
    tokio::spawn(async move {
        let _browser = browser;
        while let Some(result) = set.join_next().await {
            match result {
                Ok(()) => debug!("worker task joined"),
                Err(e) => warn!(error = %e, "worker task panicked"),
            }
        }
        debug!("all workers done, dropping browser");
    });

    rx
}

async fn close_tab(browser: &dyn Browser, tab_id: &str) {
    if let Err(e) = browser.close_tab(tab_id).await {
        warn!(error = %format!("{e:#}"), "failed to close tab");
    }
}

/// Best effort: a screenshot of the whole page next to the scenario's other
/// artifacts.
async fn save_failure_screenshot(ctx: &mut ScenarioContext, dir: &Path) {
    let path = artifacts::failure_screenshot_path(dir);
    match tokio::time::timeout(
        FAILURE_SCREENSHOT_TIMEOUT,
        ctx.driver().screenshot("body", &path),
    )
    .await
    {
        Ok(Ok(())) => debug!(path = %path.display(), "failure screenshot saved"),
        Ok(Err(e)) => warn!(error = %format!("{e:#}"), "failure screenshot failed"),
        Err(_) => warn!("failure screenshot timed out"),
    }
}

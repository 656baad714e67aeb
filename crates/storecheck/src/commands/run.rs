use std::time::Instant;

use anyhow::Result;
use tracing::debug;

use crate::config::ResolvedRunConfig;
use crate::model::Persona;
use crate::report::terminal;
use crate::run::{RunPlan, ScenarioOutcome, ScenarioTimings};

/// `storecheck run`: run the selected scenarios, report.
/// Returns exit code: 0 = all pass, 1 = any fail or error, or no scenario selected.
pub async fn run(
    config: ResolvedRunConfig,
    filter: Option<&str>,
    persona: Option<Persona>,
    timings: bool,
) -> Result<i32> {
    let plan = RunPlan::plan(filter, persona);
    if plan.total() == 0 {
        // Nothing ran, so nothing passed.
        return Ok(1);
    }
    debug!(
        base_url = config.site.base_url(),
        scenarios = ?plan.scenario_ids(),
        "planned"
    );

    let run_start = Instant::now();
    let total = plan.total();
    let mut rx = plan.execute(&config).await?;

    let mut done = 0usize;
    let mut passed = 0usize;
    let mut all_timings: Vec<(String, ScenarioTimings)> = Vec::new();
    let mut failed_ids: Vec<String> = Vec::new();
    let mut errored_ids: Vec<String> = Vec::new();

    debug!(total, "waiting for scenario results");
    while let Some((scenario, outcome)) = rx.recv().await {
        done += 1;
        let id = scenario.id();
        debug!(done, total, id = %id, "received result");
        match outcome {
            ScenarioOutcome::Pass(t) => {
                passed += 1;
                terminal::print_pass_line(&id, t.total);
                all_timings.push((id, t));
            }
            ScenarioOutcome::Fail(message, t) => {
                terminal::print_fail_line(&id, &message, t.total);
                failed_ids.push(id.clone());
                all_timings.push((id, t));
            }
            ScenarioOutcome::Err(message) => {
                terminal::print_error_line(&id, &message);
                errored_ids.push(id);
            }
        }
        terminal::show_progress(done, total);
    }

    if timings {
        terminal::print_timing_table(&all_timings);
        terminal::print_timing_summary(&all_timings);
    }

    failed_ids.sort();
    errored_ids.sort();
    terminal::print_actionable_summary(&failed_ids, &errored_ids);
    terminal::print_summary(
        total,
        passed,
        failed_ids.len(),
        errored_ids.len(),
        run_start.elapsed(),
    );

    if failed_ids.is_empty() && errored_ids.is_empty() {
        Ok(0)
    } else {
        Ok(1)
    }
}

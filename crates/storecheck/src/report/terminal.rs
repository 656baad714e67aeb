use std::io::Write;
use std::time::Duration;

use crate::run::ScenarioTimings;

const STAGE_NAMES: [&str; 4] = ["tab", "scenario", "screenshot", "close"];

fn stage_durations(t: &ScenarioTimings) -> [Duration; 4] {
    [t.open_tab, t.scenario, t.screenshot, t.close_tab]
}

/// Clear the current terminal line (wipes progress indicator).
pub fn clear_line() {
    print!("\r\x1b[2K");
}

pub fn format_duration(d: Duration) -> String {
    let ms = d.as_millis();
    if ms < 1000 {
        format!("{ms}ms")
    } else {
        format!("{:.1}s", d.as_secs_f64())
    }
}

/// Print a passing scenario.
pub fn print_pass_line(id: &str, elapsed: Duration) {
    clear_line();
    println!("  \x1b[32mPASS\x1b[0m  {id}  \x1b[2m{}\x1b[0m", format_duration(elapsed));
}

/// Print a failed expectation. Only the first line of the message goes on
/// the result line; the rest is indented beneath it.
pub fn print_fail_line(id: &str, message: &str, elapsed: Duration) {
    clear_line();
    let mut lines = message.lines();
    let first = lines.next().unwrap_or_default();
    println!(
        "  \x1b[31mFAIL\x1b[0m  {id}  ({first})  \x1b[2m{}\x1b[0m",
        format_duration(elapsed)
    );
    for line in lines {
        println!("          \x1b[2m{line}\x1b[0m");
    }
}

/// Print an error line (no timing available).
pub fn print_error_line(id: &str, msg: &str) {
    clear_line();
    println!("  \x1b[31m ERR\x1b[0m  {id}  ({msg})");
}

/// Show run progress indicator.
pub fn show_progress(done: usize, total: usize) {
    if done < total {
        print!("  Running  [{done}/{total}]");
        let _ = std::io::stdout().flush();
    }
}

/// Print an actionable summary listing scenario ids grouped by outcome.
/// Only prints sections with at least one entry.
pub fn print_actionable_summary(failed: &[String], errored: &[String]) {
    if failed.is_empty() && errored.is_empty() {
        return;
    }

    clear_line();
    println!();
    println!("Actionable scenarios:");

    for (label, ids) in [("Failed", failed), ("Errored", errored)] {
        if !ids.is_empty() {
            println!();
            println!("  {label} ({}):", ids.len());
            for id in ids {
                println!("    {id}");
            }
        }
    }
}

/// Print the final summary.
pub fn print_summary(total: usize, passed: usize, failed: usize, errored: usize, elapsed: Duration) {
    clear_line();
    println!();
    print!(
        "Scenarios:  {total} total, \x1b[32m{passed} passed\x1b[0m, \x1b[31m{failed} failed\x1b[0m"
    );
    if errored > 0 {
        print!(", \x1b[31m{errored} errored\x1b[0m");
    }
    println!();
    println!("Time:       {}", format_duration(elapsed));

    if failed > 0 || errored > 0 {
        println!();
        if failed > 0 {
            println!("{failed} scenario(s) did not behave as expected.");
        }
        if errored > 0 {
            println!("{errored} scenario(s) could not run to completion.");
        }
        println!("Failure screenshots are under the artifacts directory, one folder per scenario.");
    }
}

/// Print a per-scenario timing table with all stage breakdowns.
///
/// Sorted by total descending (slowest first). Right-aligned numeric columns.
pub fn print_timing_table(entries: &[(String, ScenarioTimings)]) {
    if entries.is_empty() {
        return;
    }

    let mut sorted: Vec<&(String, ScenarioTimings)> = entries.iter().collect();
    sorted.sort_by(|a, b| b.1.total.cmp(&a.1.total));

    // Column width from the longest id (min 8, max 60).
    let name_width = sorted
        .iter()
        .map(|(n, _)| n.len())
        .max()
        .unwrap_or(8)
        .clamp(8, 60);

    let headers = ["total", "tab", "scenario", "screen", "close"];

    println!();
    println!("\x1b[1mScenario timings:\x1b[0m");
    println!();

    print!("  {:<width$}", "Scenario", width = name_width);
    for h in &headers {
        print!("  {:>8}", h);
    }
    println!();

    print!("  ");
    print!("{}", "\u{2500}".repeat(name_width + headers.len() * 10));
    println!();

    for (name, t) in &sorted {
        print!("  {:<width$}", truncate_name(name, name_width), width = name_width);
        print!("  {:>6}ms", t.total.as_millis());
        for d in stage_durations(t) {
            print!("  {:>6}ms", d.as_millis());
        }
        println!();
    }
}

/// Print an aggregate timing breakdown across all finished scenarios.
///
/// Shows average time per stage with a proportional bar chart, and the
/// 5 slowest scenarios with their dominant stage. Needs 2+ entries.
pub fn print_timing_summary(entries: &[(String, ScenarioTimings)]) {
    if entries.len() < 2 {
        return;
    }

    let n = entries.len() as u128;

    let mut stage_sums = [0u128; 4];
    for (_, t) in entries {
        for (i, d) in stage_durations(t).iter().enumerate() {
            stage_sums[i] += d.as_millis();
        }
    }

    let stage_avgs: Vec<u128> = stage_sums.iter().map(|s| s / n).collect();
    let total_avg: u128 = stage_avgs.iter().sum();

    let mut indexed: Vec<(usize, u128)> = stage_avgs.iter().copied().enumerate().collect();
    indexed.sort_by(|a, b| b.1.cmp(&a.1));

    const BAR_MAX: usize = 20;
    let max_avg = indexed.first().map_or(1, |&(_, v)| v.max(1));

    println!();
    println!("\x1b[1mTiming breakdown\x1b[0m (avg per scenario):");

    for &(i, avg) in &indexed {
        let pct = if total_avg > 0 {
            (avg as f64 / total_avg as f64) * 100.0
        } else {
            0.0
        };
        let bar_len = ((avg as f64 / max_avg as f64) * BAR_MAX as f64).round() as usize;
        let bar: String = "\u{2588}".repeat(bar_len);
        let pct_str = if pct < 1.0 {
            "<1%".to_string()
        } else {
            format!("{:.0}%", pct)
        };
        println!(
            "  {:<12} {:>5}ms  {:<width$}  {:>4}",
            STAGE_NAMES[i],
            avg,
            bar,
            pct_str,
            width = BAR_MAX,
        );
    }

    let mut by_total: Vec<(usize, u128)> = entries
        .iter()
        .enumerate()
        .map(|(i, (_, t))| (i, t.total.as_millis()))
        .collect();
    by_total.sort_by(|a, b| b.1.cmp(&a.1));

    let top_n = by_total.len().min(5);
    println!();
    println!("\x1b[1mSlowest scenarios:\x1b[0m");
    for &(i, total_ms) in &by_total[..top_n] {
        let (name, t) = &entries[i];
        let (dom_name, dom_ms) = dominant_stage(t);
        println!(
            "  {:<50} {:>5}ms  ({dom_name} {dom_ms}ms)",
            truncate_name(name, 50),
            total_ms,
        );
    }
}

/// Return the name and duration (ms) of the dominant (longest) stage.
fn dominant_stage(t: &ScenarioTimings) -> (&'static str, u128) {
    STAGE_NAMES
        .iter()
        .zip(stage_durations(t))
        .map(|(&name, d)| (name, d.as_millis()))
        .max_by_key(|&(_, ms)| ms)
        .unwrap_or(("unknown", 0))
}

/// Truncate a scenario id to `max` chars, keeping the tail (the unique part).
fn truncate_name(name: &str, max: usize) -> String {
    let len = name.chars().count();
    if len <= max {
        name.to_string()
    } else {
        let skip = len - (max - 1);
        let truncated: String = name.chars().skip(skip).collect();
        format!("\u{2026}{truncated}")
    }
}

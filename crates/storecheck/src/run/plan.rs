use anyhow::Result;
use tokio::sync::mpsc;

use super::runner::{ScenarioOutcome, run_all};
use crate::config::ResolvedRunConfig;
use crate::model::Persona;
use crate::scenarios::{self, Scenario};

/// Plans and executes a scenario run: selection from the registry, filtering, execution.
pub struct RunPlan {
    scenarios: Vec<Scenario>,
}

impl RunPlan {
    /// Select scenarios by id/title pattern and persona.
    pub fn plan(filter: Option<&str>, persona: Option<Persona>) -> Self {
        Self::select(scenarios::registry(), filter, persona)
    }

    fn select(mut all: Vec<Scenario>, filter: Option<&str>, persona: Option<Persona>) -> Self {
        let registered = all.len();

        if let Some(persona) = persona {
            all.retain(|s| s.persona == persona);
        }
        if let Some(pattern) = filter {
            all.retain(|s| s.matches_filter(pattern));
        }

        if all.is_empty() {
            println!("No scenarios match {}", describe_selection(filter, persona));
        } else {
            let suites = {
                let mut suites: Vec<_> = all.iter().map(|s| s.suite).collect();
                suites.dedup();
                suites.len()
            };
            println!(
                "Selected {} of {registered} scenarios across {suites} suite(s)",
                all.len()
            );
            println!();
        }

        Self { scenarios: all }
    }

    pub fn total(&self) -> usize {
        self.scenarios.len()
    }

    /// Ids of every scenario in this run, in registry order.
    pub fn scenario_ids(&self) -> Vec<String> {
        self.scenarios.iter().map(Scenario::id).collect()
    }

    /// Launch Chrome and start running. Consumes self.
    pub async fn execute(
        self,
        config: &ResolvedRunConfig,
    ) -> Result<mpsc::Receiver<(Scenario, ScenarioOutcome)>> {
        run_all(self.scenarios, config).await
    }
}

/// The selection flags as typed, for the "nothing matched" message.
fn describe_selection(filter: Option<&str>, persona: Option<Persona>) -> String {
    let mut parts = Vec::new();
    if let Some(pattern) = filter {
        parts.push(format!("--filter '{pattern}'"));
    }
    if let Some(persona) = persona {
        parts.push(format!("--persona {persona}"));
    }
    parts.join(" ")
}

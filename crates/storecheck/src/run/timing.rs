use std::time::Duration;

/// Per-stage timing breakdown for a single scenario.
#[derive(Clone, Debug, Default)]
pub struct ScenarioTimings {
    /// Opening the tab and applying the viewport.
    pub open_tab: Duration,
    /// Setup plus the scenario body.
    pub scenario: Duration,
    /// Failure screenshot. Zero when the scenario passed.
    pub screenshot: Duration,
    pub close_tab: Duration,
    pub total: Duration,
}

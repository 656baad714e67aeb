pub mod plan;
pub mod runner;
pub mod timing;

pub use self::plan::RunPlan;
pub use self::runner::ScenarioOutcome;
pub use self::timing::ScenarioTimings;

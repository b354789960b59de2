//! Catalogue tree: epics, stories and scenarios with reconciliation status.

use std::fmt;
use std::str::FromStr;

use crate::step::{StepSet, name_key};

/// Reconciliation status of one catalogue scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ScenarioStatus {
    /// No executed test claims this scenario.
    Pending,
    /// Executed, succeeded, and every step matches the catalogue.
    Pass,
    /// Executed and the test failed or raised an error.
    Fail,
    /// Executed and succeeded, but its steps differ from the catalogue.
    Mismatch,
}

impl ScenarioStatus {
    pub const ALL: [Self; 4] = [Self::Pending, Self::Pass, Self::Fail, Self::Mismatch];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Pass => "pass",
            Self::Fail => "fail",
            Self::Mismatch => "mismatch",
        }
    }
}

impl fmt::Display for ScenarioStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown scenario status {:?}", self.0)
    }
}

impl std::error::Error for UnknownStatus {}

impl FromStr for ScenarioStatus {
    type Err = UnknownStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "pending" => Ok(Self::Pending),
            "pass" => Ok(Self::Pass),
            "fail" => Ok(Self::Fail),
            "mismatch" => Ok(Self::Mismatch),
            other => Err(UnknownStatus(other.to_owned())),
        }
    }
}

/// A concrete example of a story.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scenario {
    pub name: String,
    pub steps: StepSet,
    pub status: Option<ScenarioStatus>,
    /// Attributes not interpreted by this crate, in document order.
    pub extra: Vec<(String, String)>,
}

impl Scenario {
    pub fn new(name: impl Into<String>, steps: StepSet) -> Self {
        Self {
            name: name.into(),
            steps,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn key(&self) -> String {
        name_key(&self.name)
    }
}

/// A named unit of behavior. `steps` are shared by every scenario.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Story {
    /// Story identifier; the name tests refer to.
    pub name: String,
    pub title: Option<String>,
    pub steps: StepSet,
    pub scenarios: Vec<Scenario>,
    pub extra: Vec<(String, String)>,
}

impl Story {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn key(&self) -> String {
        name_key(&self.name)
    }

    /// Shared steps followed by the scenario's own, per kind.
    #[must_use]
    pub fn effective_steps(&self, scenario: &Scenario) -> StepSet {
        self.steps.concat(&scenario.steps)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Epic {
    pub name: String,
    pub title: Option<String>,
    pub stories: Vec<Story>,
    pub extra: Vec<(String, String)>,
}

impl Epic {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// The full requirements tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalogue {
    pub project: Option<String>,
    pub extract_time: Option<String>,
    /// When the catalogue was last reconciled against a test run.
    pub test_time: Option<String>,
    pub epics: Vec<Epic>,
    pub extra: Vec<(String, String)>,
}

impl Catalogue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stories(&self) -> impl Iterator<Item = &Story> {
        self.epics.iter().flat_map(|epic| epic.stories.iter())
    }

    pub fn scenarios(&self) -> impl Iterator<Item = (&Story, &Scenario)> {
        self.stories()
            .flat_map(|story| story.scenarios.iter().map(move |scenario| (story, scenario)))
    }

    #[must_use]
    pub fn scenario_count(&self) -> usize {
        self.stories().map(|story| story.scenarios.len()).sum()
    }

    /// Find a scenario by story and scenario name, using name keys.
    #[must_use]
    pub fn find_scenario(&self, story: &str, scenario: &str) -> Option<&Scenario> {
        let story_key = name_key(story);
        let scenario_key = name_key(scenario);
        self.scenarios()
            .find(|(candidate_story, candidate)| {
                candidate_story.key() == story_key && candidate.key() == scenario_key
            })
            .map(|(_, candidate)| candidate)
    }

    #[must_use]
    pub fn status_tally(&self) -> StatusTally {
        let mut tally = StatusTally::default();
        for (_, scenario) in self.scenarios() {
            tally.record(scenario.status);
        }
        tally
    }
}

/// Scenario counts per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusTally {
    pub pending: usize,
    pub pass: usize,
    pub fail: usize,
    pub mismatch: usize,
    /// Scenarios that have not been reconciled at all.
    pub unset: usize,
}

impl StatusTally {
    pub fn record(&mut self, status: Option<ScenarioStatus>) {
        match status {
            Some(ScenarioStatus::Pending) => self.pending += 1,
            Some(ScenarioStatus::Pass) => self.pass += 1,
            Some(ScenarioStatus::Fail) => self.fail += 1,
            Some(ScenarioStatus::Mismatch) => self.mismatch += 1,
            None => self.unset += 1,
        }
    }

    #[must_use]
    pub const fn get(&self, status: ScenarioStatus) -> usize {
        match status {
            ScenarioStatus::Pending => self.pending,
            ScenarioStatus::Pass => self.pass,
            ScenarioStatus::Fail => self.fail,
            ScenarioStatus::Mismatch => self.mismatch,
        }
    }

    #[must_use]
    pub const fn total(&self) -> usize {
        self.pending + self.pass + self.fail + self.mismatch + self.unset
    }
}

impl fmt::Display for StatusTally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pass={} fail={} mismatch={} pending={}",
            self.pass, self.fail, self.mismatch, self.pending
        )
    }
}

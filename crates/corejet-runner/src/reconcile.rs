//! Reconciliation engine: assigns a [`ScenarioStatus`] to every catalogue
//! scenario from the recorded test run.
//!
//! Classification order for a scenario:
//! 1. no executed test claims it: `pending`,
//! 2. the claiming test failed or errored: `fail` (never downgraded),
//! 3. any Given/When/Then count differs from the tested scenario: `mismatch`,
//! 4. any step text differs (trimmed, case-insensitive): `mismatch`,
//! 5. otherwise `pass`.
//!
//! Expected steps are the story's shared steps followed by the scenario's own.
//! Executed tests that claim no catalogue scenario are reported in the log
//! only; they never receive a status.

use std::collections::{BTreeMap, BTreeSet};

use corejet_error::Result;
use corejet_model::{Catalogue, Scenario, ScenarioStatus, StepSet, Story, name_key};
use tracing::{debug, info, warn};

use crate::handle::TestedScenario;
use crate::recorder::{ExecutedCase, Outcome, SuiteMap};
use crate::story_adapter::resolve_story;

/// One executed test as seen from the catalogue side.
#[derive(Debug, Clone, Copy)]
pub struct TestedEntry<'a> {
    pub scenario: &'a TestedScenario,
    pub case: &'a ExecutedCase,
}

/// story key -> scenario key -> executed test. Built once per pass.
#[derive(Debug, Default)]
pub struct TestedStoryIndex<'a> {
    stories: BTreeMap<String, BTreeMap<String, TestedEntry<'a>>>,
}

impl<'a> TestedStoryIndex<'a> {
    /// Scan every recorded case through the story adapter.
    ///
    /// When two cases claim the same scenario, the later one wins.
    pub fn build(suites: &'a SuiteMap) -> Result<Self> {
        let mut index = Self::default();
        for case in suites.values().flat_map(|suite| suite.cases()) {
            let Some(found) = resolve_story(case)? else {
                continue;
            };
            let story_key = found.story_key();
            let scenario_key = found.scenario_key();
            let entry = TestedEntry {
                scenario: found.scenario,
                case,
            };
            let previous = index
                .stories
                .entry(story_key.clone())
                .or_default()
                .insert(scenario_key.clone(), entry);
            if previous.is_some() {
                debug!(
                    story = %story_key,
                    scenario = %scenario_key,
                    test = case.test_name(),
                    "scenario claimed by more than one test; keeping the latest"
                );
            }
        }
        Ok(index)
    }

    #[must_use]
    pub fn lookup(&self, story: &str, scenario: &str) -> Option<&TestedEntry<'a>> {
        self.stories.get(&name_key(story))?.get(&name_key(scenario))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.stories.values().map(BTreeMap::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn keys(&self) -> impl Iterator<Item = (&str, &str)> {
        self.stories.iter().flat_map(|(story, scenarios)| {
            scenarios
                .keys()
                .map(move |scenario| (story.as_str(), scenario.as_str()))
        })
    }
}

/// Status of one matched scenario.
///
/// `expected` is the catalogue's effective step sequence (shared + own);
/// `tested` is what the executed test captured.
#[must_use]
pub fn classify(outcome: &Outcome, expected: &StepSet, tested: &StepSet) -> ScenarioStatus {
    if !outcome.is_success() {
        return ScenarioStatus::Fail;
    }
    if let Some(kind) = expected.first_count_difference(tested) {
        debug!(
            kind = %kind,
            expected = expected.steps(kind).len(),
            tested = tested.steps(kind).len(),
            "step count mismatch"
        );
        return ScenarioStatus::Mismatch;
    }
    if let Some((kind, position)) = expected.first_text_difference(tested) {
        debug!(kind = %kind, position, "step text mismatch");
        return ScenarioStatus::Mismatch;
    }
    ScenarioStatus::Pass
}

fn scenario_status(
    index: &TestedStoryIndex<'_>,
    story: &Story,
    scenario: &Scenario,
    claimed: &mut BTreeSet<(String, String)>,
) -> ScenarioStatus {
    let story_key = story.key();
    let scenario_key = scenario.key();
    let status = match index.lookup(&story_key, &scenario_key) {
        None => ScenarioStatus::Pending,
        Some(entry) => {
            claimed.insert((story_key, scenario_key));
            let expected = story.effective_steps(scenario);
            classify(entry.case.outcome(), &expected, &entry.scenario.steps)
        }
    };
    debug!(
        story = %story.name,
        scenario = %scenario.name,
        status = %status,
        "scenario reconciled"
    );
    status
}

/// Set the status of every scenario in `catalogue` from the recorded suites.
///
/// Fails only when a recorded case declares a story it is not bound into.
pub fn reconcile(catalogue: &mut Catalogue, suites: &SuiteMap) -> Result<()> {
    let index = TestedStoryIndex::build(suites)?;
    let mut claimed: BTreeSet<(String, String)> = BTreeSet::new();

    for epic in &mut catalogue.epics {
        for story in &mut epic.stories {
            let statuses: Vec<ScenarioStatus> = {
                let story: &Story = story;
                story
                    .scenarios
                    .iter()
                    .map(|scenario| scenario_status(&index, story, scenario, &mut claimed))
                    .collect()
            };
            for (scenario, status) in story.scenarios.iter_mut().zip(statuses) {
                scenario.status = Some(status);
            }
        }
    }

    for (story, scenario) in index.keys() {
        if !claimed.contains(&(story.to_owned(), scenario.to_owned())) {
            warn!(
                story = story,
                scenario = scenario,
                "executed scenario has no catalogue entry"
            );
        }
    }

    let tally = catalogue.status_tally();
    info!(
        scenarios = tally.total(),
        pass = tally.pass,
        fail = tally.fail,
        mismatch = tally.mismatch,
        pending = tally.pending,
        tested = index.len(),
        "catalogue reconciled"
    );
    Ok(())
}

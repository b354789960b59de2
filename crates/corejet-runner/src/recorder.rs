//! Execution recorder: files every completed test under its resolved suite.
//!
//! The harness drives [`HarnessListener`] callbacks sequentially, one per
//! completed test. Recorded cases are never removed.

use std::collections::BTreeMap;

use corejet_error::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::handle::TestHandle;
use crate::identity::{CaseIdentity, IdentityResolver};
use crate::workdir::WorkingDirBaseline;

/// Failure or error detail captured from the harness.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Fault {
    /// Exception or panic type, e.g. `AssertionError`.
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    pub traceback: String,
}

impl Fault {
    pub fn new(
        kind: impl Into<String>,
        message: impl Into<String>,
        traceback: impl Into<String>,
    ) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            traceback: traceback.into(),
        }
    }

    /// First line of the message.
    #[must_use]
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }

    /// Full message, a blank line, then the trace.
    #[must_use]
    pub fn detail(&self) -> String {
        format!("{}\n\n{}", self.message, self.traceback)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure(Fault),
    Error(Fault),
}

impl Outcome {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    #[must_use]
    pub const fn failure(&self) -> Option<&Fault> {
        match self {
            Self::Failure(fault) => Some(fault),
            _ => None,
        }
    }

    #[must_use]
    pub const fn error(&self) -> Option<&Fault> {
        match self {
            Self::Error(fault) => Some(fault),
            _ => None,
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure(_) => "failure",
            Self::Error(_) => "error",
        }
    }
}

/// One completed test invocation.
#[derive(Debug)]
pub struct ExecutedCase {
    handle: Box<dyn TestHandle>,
    seconds: f64,
    class_name: String,
    test_name: String,
    outcome: Outcome,
}

impl ExecutedCase {
    #[must_use]
    pub fn handle(&self) -> &dyn TestHandle {
        self.handle.as_ref()
    }

    #[must_use]
    pub fn seconds(&self) -> f64 {
        self.seconds
    }

    #[must_use]
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    #[must_use]
    pub fn test_name(&self) -> &str {
        &self.test_name
    }

    #[must_use]
    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }
}

/// Cases filed under one suite name, with rollup counters.
#[derive(Debug, Default)]
pub struct SuiteRecord {
    cases: Vec<ExecutedCase>,
    errors: usize,
    failures: usize,
    time: f64,
}

impl SuiteRecord {
    #[must_use]
    pub fn cases(&self) -> &[ExecutedCase] {
        &self.cases
    }

    #[must_use]
    pub fn tests(&self) -> usize {
        self.cases.len()
    }

    #[must_use]
    pub fn errors(&self) -> usize {
        self.errors
    }

    #[must_use]
    pub fn failures(&self) -> usize {
        self.failures
    }

    #[must_use]
    pub fn successes(&self) -> usize {
        self.tests().saturating_sub(self.errors + self.failures)
    }

    /// Sum of the non-zero elapsed times of the suite's cases.
    #[must_use]
    pub fn time(&self) -> f64 {
        self.time
    }

    fn push(&mut self, case: ExecutedCase) {
        match case.outcome {
            Outcome::Success => {}
            Outcome::Failure(_) => self.failures += 1,
            Outcome::Error(_) => self.errors += 1,
        }
        if case.seconds != 0.0 {
            self.time += case.seconds;
        }
        self.cases.push(case);
    }
}

/// Suites keyed by suite name, in name order.
pub type SuiteMap = BTreeMap<String, SuiteRecord>;

/// Callbacks the test harness invokes as each test completes.
pub trait HarnessListener {
    fn on_success(&mut self, handle: Box<dyn TestHandle>, seconds: f64) -> Result<()>;

    fn on_failure(&mut self, handle: Box<dyn TestHandle>, seconds: f64, fault: Fault)
    -> Result<()>;

    fn on_error(&mut self, handle: Box<dyn TestHandle>, seconds: f64, fault: Fault) -> Result<()>;
}

#[derive(Debug)]
pub struct ExecutionRecorder {
    resolver: IdentityResolver,
    baseline: WorkingDirBaseline,
    suites: SuiteMap,
}

impl ExecutionRecorder {
    pub fn new(resolver: IdentityResolver, baseline: WorkingDirBaseline) -> Self {
        Self {
            resolver,
            baseline,
            suites: SuiteMap::new(),
        }
    }

    #[must_use]
    pub fn baseline(&self) -> &WorkingDirBaseline {
        &self.baseline
    }

    #[must_use]
    pub fn suites(&self) -> &SuiteMap {
        &self.suites
    }

    #[must_use]
    pub fn suite(&self, name: &str) -> Option<&SuiteRecord> {
        self.suites.get(name)
    }

    #[must_use]
    pub fn total_cases(&self) -> usize {
        self.suites.values().map(SuiteRecord::tests).sum()
    }

    /// Whether any recorded case failed or errored.
    #[must_use]
    pub fn failed(&self) -> bool {
        self.suites
            .values()
            .any(|suite| suite.failures > 0 || suite.errors > 0)
    }

    /// Resolve the handle's identity and file the case under its suite.
    ///
    /// An unrecognized handle aborts with `UnknownTestType`.
    pub fn record(
        &mut self,
        handle: Box<dyn TestHandle>,
        seconds: f64,
        outcome: Outcome,
    ) -> Result<()> {
        self.baseline.ensure_current()?;
        let CaseIdentity {
            suite,
            test_name,
            class_name,
        } = self.resolver.resolve(handle.as_ref(), self.baseline.path())?;

        debug!(
            suite = %suite,
            test = %test_name,
            outcome = outcome.label(),
            seconds,
            "test case recorded"
        );

        let record = self.suites.entry(suite).or_insert_with_key(|name| {
            debug!(suite = %name, "suite created");
            SuiteRecord::default()
        });
        record.push(ExecutedCase {
            handle,
            seconds,
            class_name,
            test_name,
            outcome,
        });
        Ok(())
    }
}

impl HarnessListener for ExecutionRecorder {
    fn on_success(&mut self, handle: Box<dyn TestHandle>, seconds: f64) -> Result<()> {
        self.record(handle, seconds, Outcome::Success)
    }

    fn on_failure(
        &mut self,
        handle: Box<dyn TestHandle>,
        seconds: f64,
        fault: Fault,
    ) -> Result<()> {
        self.record(handle, seconds, Outcome::Failure(fault))
    }

    fn on_error(&mut self, handle: Box<dyn TestHandle>, seconds: f64, fault: Fault) -> Result<()> {
        self.record(handle, seconds, Outcome::Error(fault))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::CaseDescriptor;
    use corejet_error::CoreJetError;
    use proptest::prelude::*;

    fn recorder() -> ExecutionRecorder {
        ExecutionRecorder::new(
            IdentityResolver::with_defaults(),
            WorkingDirBaseline::capture().expect("capture cwd"),
        )
    }

    fn unit(method: &str) -> Box<dyn TestHandle> {
        Box::new(CaseDescriptor::unit("shop.tests.CartTests", method))
    }

    #[test]
    fn test_cases_are_grouped_by_suite_with_counters() {
        let mut recorder = recorder();
        recorder.on_success(unit("test_add"), 0.5).expect("record");
        recorder
            .on_failure(unit("test_remove"), 0.25, Fault::new("AssertionError", "1 != 2", ""))
            .expect("record");
        recorder
            .on_error(unit("test_total"), 0.0, Fault::new("KeyError", "'sku'", ""))
            .expect("record");
        recorder
            .on_success(Box::new(CaseDescriptor::dotted("shop.prices.round")), 1.0)
            .expect("record");

        assert_eq!(recorder.suites().len(), 2);
        let cart = recorder.suite("shop.tests.CartTests").expect("cart suite");
        assert_eq!(cart.tests(), 3);
        assert_eq!(cart.failures(), 1);
        assert_eq!(cart.errors(), 1);
        assert_eq!(cart.successes(), 1);
        assert_eq!(cart.time(), 0.75);
        assert_eq!(cart.cases()[1].test_name(), "test_remove");
        assert_eq!(cart.cases()[1].class_name(), "shop.tests.CartTests");
        assert!(recorder.failed());
        assert_eq!(recorder.total_cases(), 4);
    }

    #[test]
    fn test_zero_duration_counts_case_but_not_time() {
        let mut recorder = recorder();
        recorder.on_success(unit("test_a"), 0.0).expect("record");
        recorder.on_success(unit("test_b"), 0.0).expect("record");
        let suite = recorder.suite("shop.tests.CartTests").expect("suite");
        assert_eq!(suite.tests(), 2);
        assert_eq!(suite.time(), 0.0);
        assert!(!recorder.failed());
    }

    #[test]
    fn test_unknown_handle_is_fatal_and_not_recorded() {
        let mut recorder = recorder();
        let err = recorder
            .on_success(Box::new(CaseDescriptor::default()), 0.1)
            .expect_err("opaque handle");
        assert!(matches!(err, CoreJetError::UnknownTestType { .. }));
        assert_eq!(recorder.total_cases(), 0);
    }

    #[test]
    fn test_fault_summary_and_detail() {
        let fault = Fault::new("AssertionError", "totals differ\nexpected 3", "at cart.rs:10");
        assert_eq!(fault.summary(), "totals differ");
        assert_eq!(fault.detail(), "totals differ\nexpected 3\n\nat cart.rs:10");
        assert_eq!(Fault::default().summary(), "");
    }

    proptest! {
        #[test]
        fn prop_suite_time_is_sum_of_nonzero_times(
            times in prop::collection::vec(prop_oneof![Just(0.0_f64), 0.001_f64..10.0], 0..20)
        ) {
            let mut recorder = recorder();
            for (index, seconds) in times.iter().enumerate() {
                recorder.on_success(unit(&format!("test_{index}")), *seconds).expect("record");
            }
            let expected: f64 = times.iter().filter(|seconds| **seconds != 0.0).sum();
            match recorder.suite("shop.tests.CartTests") {
                Some(suite) => {
                    prop_assert_eq!(suite.tests(), times.len());
                    prop_assert!((suite.time() - expected).abs() < 1e-9);
                }
                None => prop_assert!(times.is_empty()),
            }
        }
    }
}

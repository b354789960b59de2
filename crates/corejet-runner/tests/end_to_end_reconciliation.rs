//! Replayed harness events reconciled against an XML catalogue.

use std::path::Path;

use corejet_model::{Catalogue, ScenarioStatus, StepSet};
use corejet_runner::replay::EventOutcome;
use corejet_runner::{
    CaseDescriptor, CaseEvent, ExecutionRecorder, Fault, IdentityResolver, StoryBinding,
    WorkingDirBaseline, reconcile, replay_str,
};

const CATALOGUE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<requirementscatalogue project="Accounts" extractTime="2024-02-01T09:00:00">
  <epic id="ACC" title="Account access">
    <story id=" Sessions " title="User sessions" points="3">
      <scenario name="Login">
        <given>user exists</given>
        <when>user submits credentials</when>
        <then>user is logged in</then>
      </scenario>
      <scenario name="Logout">
        <given>user is logged in</given>
        <when>user logs out</when>
        <then>session ends</then>
      </scenario>
    </story>
  </epic>
</requirementscatalogue>
"#;

fn sessions_story() -> StoryBinding {
    StoryBinding::new("sessions", StepSet::new())
}

fn login_steps(then: &str) -> StepSet {
    StepSet::from_texts(&["User exists"], &["user submits credentials"], &[then])
}

fn login_case(then: &str) -> CaseDescriptor {
    let story = sessions_story().with_scenario("test_login", "LOGIN", &login_steps(then));
    CaseDescriptor::unit("accounts.tests.SessionTests", "test_login").with_story(story)
}

fn event(outcome: EventOutcome, case: CaseDescriptor, fault: Option<Fault>) -> String {
    let event = CaseEvent {
        outcome,
        seconds: 0.25,
        fault,
        case,
    };
    serde_json::to_string(&event).expect("serialize event")
}

fn reconciled(events: &[String], cwd: &Path) -> Catalogue {
    let mut recorder = ExecutionRecorder::new(
        IdentityResolver::with_defaults(),
        WorkingDirBaseline::from_path(cwd),
    );
    replay_str(&mut recorder, &events.join("\n")).expect("replay");
    let mut catalogue = Catalogue::from_xml_str(CATALOGUE).expect("parse catalogue");
    reconcile(&mut catalogue, recorder.suites()).expect("reconcile");
    catalogue
}

fn status(catalogue: &Catalogue, scenario: &str) -> Option<ScenarioStatus> {
    catalogue
        .find_scenario("sessions", scenario)
        .and_then(|found| found.status)
}

#[test]
fn test_matching_success_is_pass() {
    let catalogue = reconciled(
        &[event(EventOutcome::Success, login_case("user is logged in"), None)],
        Path::new("/work"),
    );
    assert_eq!(status(&catalogue, "Login"), Some(ScenarioStatus::Pass));
}

#[test]
fn test_differing_then_is_mismatch() {
    let catalogue = reconciled(
        &[event(EventOutcome::Success, login_case("user sees error"), None)],
        Path::new("/work"),
    );
    assert_eq!(status(&catalogue, "Login"), Some(ScenarioStatus::Mismatch));
}

#[test]
fn test_assertion_failure_is_fail() {
    let fault = Fault::new("AssertionError", "expected a session", "session.rs:42");
    let catalogue = reconciled(
        &[event(
            EventOutcome::Failure,
            login_case("user is logged in"),
            Some(fault),
        )],
        Path::new("/work"),
    );
    assert_eq!(status(&catalogue, "Login"), Some(ScenarioStatus::Fail));
}

#[test]
fn test_untested_scenario_is_pending() {
    let catalogue = reconciled(
        &[event(EventOutcome::Success, login_case("user is logged in"), None)],
        Path::new("/work"),
    );
    assert_eq!(status(&catalogue, "Logout"), Some(ScenarioStatus::Pending));
    assert_eq!(reconciled(&[], Path::new("/work")).status_tally().pending, 2);
}

#[test]
fn test_dotted_and_literate_cases_reconcile_independently() {
    let cwd = Path::new("/work/project");

    let dotted_story = sessions_story().with_scenario(
        "test_login",
        "Login",
        &login_steps("user is logged in"),
    );
    let dotted = CaseDescriptor::dotted("accounts.tests.test_login").with_story(dotted_story);

    let literate_story = sessions_story().with_scenario(
        "logout.txt",
        " logout ",
        &StepSet::from_texts(&["user is logged in"], &["user logs out"], &["session ends"]),
    );
    let literate = CaseDescriptor::literate_file("/work/project/docs/logout.txt", "logout.txt")
        .with_method("logout.txt")
        .with_story(literate_story);

    let mut recorder = ExecutionRecorder::new(
        IdentityResolver::with_defaults(),
        WorkingDirBaseline::from_path(cwd),
    );
    let events = [
        event(EventOutcome::Success, dotted, None),
        event(EventOutcome::Success, literate, None),
    ];
    replay_str(&mut recorder, &events.join("\n")).expect("replay");

    let suites: Vec<&str> = recorder.suites().keys().map(String::as_str).collect();
    assert_eq!(suites, vec!["accounts.tests", "doctest-project-docs-logout.txt"]);

    let mut catalogue = Catalogue::from_xml_str(CATALOGUE).expect("parse catalogue");
    reconcile(&mut catalogue, recorder.suites()).expect("reconcile");
    assert_eq!(status(&catalogue, "Login"), Some(ScenarioStatus::Pass));
    assert_eq!(status(&catalogue, "Logout"), Some(ScenarioStatus::Pass));
}

#[test]
fn test_unknown_handle_aborts_replay() {
    let mut recorder = ExecutionRecorder::new(
        IdentityResolver::with_defaults(),
        WorkingDirBaseline::from_path("/work"),
    );
    let events = [
        event(EventOutcome::Success, login_case("user is logged in"), None),
        event(EventOutcome::Success, CaseDescriptor::default(), None),
    ];
    let err = replay_str(&mut recorder, &events.join("\n")).expect_err("opaque handle");
    assert!(err.to_string().contains("unknown test type"));
    assert!(err.is_fatal_configuration());
    assert_eq!(recorder.total_cases(), 1);
}

#[test]
fn test_annotated_catalogue_keeps_unknown_attributes_and_order() {
    let catalogue = reconciled(
        &[event(EventOutcome::Success, login_case("user sees error"), None)],
        Path::new("/work"),
    );
    let xml = catalogue.to_xml_string().expect("serialize");
    assert!(xml.contains(r#"points="3""#));
    assert!(xml.contains(r#"extractTime="2024-02-01T09:00:00""#));
    let login = xml.find(r#"name="Login""#).expect("login");
    let logout = xml.find(r#"name="Logout""#).expect("logout");
    assert!(login < logout);
    assert!(xml.contains(r#"testStatus="mismatch""#));
    assert!(xml.contains(r#"testStatus="pending""#));
}

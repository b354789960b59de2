//! Catalogue documents read from disk and name-key behavior.

use std::fs;

use corejet_model::{Catalogue, ScenarioStatus, Step, StepKind, name_key};
use proptest::prelude::*;

const DOCUMENT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<requirementscatalogue project="Library" extractTime="2024-01-05T10:00:00">
  <epic id="LIB-1" title="Lending">
    <story id="LIB-10" title="Borrow a book" points="5" priority="high">
      <given>a registered member</given>
      <given>the member has no overdue books</given>
      <scenario name="Borrow available book" testStatus="pass">
        <given>the book is on the shelf</given>
        <when>the member borrows it</when>
        <then>the loan is recorded</then>
        <then>the due date is three weeks away</then>
      </scenario>
      <scenario name="Borrow reserved book">
        <given>the book is reserved for someone else</given>
        <when>the member borrows it</when>
        <then>the loan is refused</then>
      </scenario>
    </story>
  </epic>
</requirementscatalogue>
"#;

#[test]
fn test_document_round_trips_through_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("corejet.xml");
    fs::write(&path, DOCUMENT).expect("write document");

    let catalogue = Catalogue::read_from_path(&path).expect("read catalogue");
    assert_eq!(catalogue.project.as_deref(), Some("Library"));
    let story = catalogue.stories().next().expect("story");
    assert_eq!(story.name, "LIB-10");
    assert_eq!(story.steps.steps(StepKind::Given).len(), 2);
    assert!(
        story
            .extra
            .iter()
            .any(|(key, value)| key == "points" && value == "5")
    );

    let borrow = &story.scenarios[0];
    assert_eq!(borrow.status, Some(ScenarioStatus::Pass));
    let thens: Vec<&str> = borrow
        .steps
        .steps(StepKind::Then)
        .iter()
        .map(|step| step.text.as_str())
        .collect();
    assert_eq!(
        thens,
        vec!["the loan is recorded", "the due date is three weeks away"]
    );
    assert_eq!(story.scenarios[1].status, None);

    let out = dir.path().join("rewritten.xml");
    catalogue
        .write(fs::File::create(&out).expect("create output"))
        .expect("write catalogue");
    let reread = Catalogue::read_from_path(&out).expect("reread");
    assert_eq!(reread, catalogue);
}

#[test]
fn test_missing_file_names_the_path() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("absent.xml");
    let err = Catalogue::read_from_path(&path).expect_err("missing file");
    assert!(err.to_string().contains("absent.xml"), "{err}");
}

proptest! {
    #[test]
    fn prop_name_key_ignores_case_and_surrounding_space(
        name in "[A-Za-z][A-Za-z0-9 ]{0,20}",
        left in " {0,3}",
        right in "[ \t]{0,3}",
    ) {
        let padded = format!("{left}{}{right}", name.to_uppercase());
        prop_assert_eq!(name_key(&padded), name_key(&name));
        prop_assert_eq!(name_key(&name_key(&name)), name_key(&name));
        prop_assert!(Step::new(padded).matches(&Step::new(name)));
    }
}

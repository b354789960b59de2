//! Executed-test handles and the capabilities the runner can query on them.
//!
//! The harness hands the runner an opaque handle for every completed test.
//! Which authoring convention produced the test is discovered by asking the
//! handle for optional capabilities; a handle only answers the questions that
//! apply to it.

use std::collections::BTreeMap;
use std::fmt;

use corejet_model::StepSet;
use serde::{Deserialize, Serialize};

/// Source file and example name of a file-based literate test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiterateSource<'a> {
    pub path: &'a str,
    pub name: &'a str,
}

/// Capability surface of one executed test.
pub trait TestHandle: fmt::Debug {
    /// File-based literate test: the document path and the example name.
    fn doc_file(&self) -> Option<LiterateSource<'_>> {
        None
    }

    /// Fully dotted identifier, `module.submodule.Class.test_name`.
    fn dotted_name(&self) -> Option<&str> {
        None
    }

    /// Document location of a region-based literate test.
    fn regions_location(&self) -> Option<&str> {
        None
    }

    /// Self-describing identifier, usually `<class_name>.<test_name>`.
    fn test_id(&self) -> Option<String> {
        None
    }

    /// Class name derived from the handle's runtime type.
    fn class_name(&self) -> Option<String> {
        None
    }

    /// Name of the test method the handle runs.
    fn method_name(&self) -> Option<&str> {
        None
    }

    /// Story declared on this specific test.
    fn story(&self) -> Option<&StoryBinding> {
        None
    }

    /// Story declared on the test's class.
    fn class_story(&self) -> Option<&StoryBinding> {
        None
    }
}

/// Dotted class name for a Rust type, e.g. `my_crate.tests.LoginCase`.
#[must_use]
pub fn type_class_name<T: ?Sized>() -> String {
    std::any::type_name::<T>().replace("::", ".")
}

/// A scenario as the executed test describes it.
///
/// `steps` already include the story's shared steps ahead of the scenario's
/// own, exactly as they were captured when the test was defined.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestedScenario {
    pub name: String,
    #[serde(default)]
    pub steps: StepSet,
}

/// Story association carried by a test or its class.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryBinding {
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
    /// Steps every bound scenario inherits.
    #[serde(default)]
    pub steps: StepSet,
    /// Test method name to the scenario that method exercises.
    #[serde(default)]
    pub scenarios: BTreeMap<String, TestedScenario>,
}

impl StoryBinding {
    pub fn new(name: impl Into<String>, steps: StepSet) -> Self {
        Self {
            name: name.into(),
            steps,
            ..Self::default()
        }
    }

    /// Bind `method` to a scenario, capturing shared + own steps.
    pub fn bind(&mut self, method: impl Into<String>, scenario: impl Into<String>, own: &StepSet) {
        let tested = TestedScenario {
            name: scenario.into(),
            steps: self.steps.concat(own),
        };
        self.scenarios.insert(method.into(), tested);
    }

    #[must_use]
    pub fn with_scenario(
        mut self,
        method: impl Into<String>,
        scenario: impl Into<String>,
        own: &StepSet,
    ) -> Self {
        self.bind(method, scenario, own);
        self
    }

    #[must_use]
    pub fn scenario_for(&self, method: &str) -> Option<&TestedScenario> {
        self.scenarios.get(method)
    }
}

/// Path and example name of a file-based literate test, as data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocFileRef {
    pub path: String,
    pub name: String,
}

/// Data-described handle, as recorded in a harness event stream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaseDescriptor {
    pub doc_file: Option<DocFileRef>,
    pub dotted_name: Option<String>,
    pub regions_location: Option<String>,
    pub id: Option<String>,
    pub class_name: Option<String>,
    pub method: Option<String>,
    pub story: Option<StoryBinding>,
    pub class_story: Option<StoryBinding>,
}

impl CaseDescriptor {
    /// A conventional unit test: `id` is `<class_name>.<method>`.
    pub fn unit(class_name: impl Into<String>, method: impl Into<String>) -> Self {
        let class_name = class_name.into();
        let method = method.into();
        Self {
            id: Some(format!("{class_name}.{method}")),
            class_name: Some(class_name),
            method: Some(method),
            ..Self::default()
        }
    }

    pub fn dotted(dotted_name: impl Into<String>) -> Self {
        let dotted_name = dotted_name.into();
        let method = dotted_name.rsplit('.').next().map(str::to_owned);
        Self {
            dotted_name: Some(dotted_name),
            method,
            ..Self::default()
        }
    }

    pub fn literate_file(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            doc_file: Some(DocFileRef {
                path: path.into(),
                name: name.into(),
            }),
            ..Self::default()
        }
    }

    pub fn regions(location: impl Into<String>) -> Self {
        Self {
            regions_location: Some(location.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    #[must_use]
    pub fn with_story(mut self, story: StoryBinding) -> Self {
        self.story = Some(story);
        self
    }

    #[must_use]
    pub fn with_class_story(mut self, story: StoryBinding) -> Self {
        self.class_story = Some(story);
        self
    }
}

impl TestHandle for CaseDescriptor {
    fn doc_file(&self) -> Option<LiterateSource<'_>> {
        self.doc_file.as_ref().map(|doc| LiterateSource {
            path: &doc.path,
            name: &doc.name,
        })
    }

    fn dotted_name(&self) -> Option<&str> {
        self.dotted_name.as_deref()
    }

    fn regions_location(&self) -> Option<&str> {
        self.regions_location.as_deref()
    }

    fn test_id(&self) -> Option<String> {
        self.id.clone()
    }

    fn class_name(&self) -> Option<String> {
        self.class_name.clone()
    }

    fn method_name(&self) -> Option<&str> {
        self.method.as_deref()
    }

    fn story(&self) -> Option<&StoryBinding> {
        self.story.as_ref()
    }

    fn class_story(&self) -> Option<&StoryBinding> {
        self.class_story.as_ref()
    }
}

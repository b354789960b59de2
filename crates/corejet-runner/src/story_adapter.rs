//! Maps an executed test to the story and scenario it claims to exercise.

use corejet_error::{CoreJetError, Result};
use corejet_model::name_key;

use crate::handle::{StoryBinding, TestHandle, TestedScenario};
use crate::recorder::ExecutedCase;

/// Story/scenario claimed by one executed test, with normalized keys.
#[derive(Debug, Clone, Copy)]
pub struct StoryMatch<'a> {
    pub story: &'a StoryBinding,
    pub scenario: &'a TestedScenario,
}

impl StoryMatch<'_> {
    #[must_use]
    pub fn story_key(&self) -> String {
        name_key(&self.story.name)
    }

    #[must_use]
    pub fn scenario_key(&self) -> String {
        name_key(&self.scenario.name)
    }
}

/// Story declared by the handle itself, else by its class.
#[must_use]
pub fn declared_story(handle: &dyn TestHandle) -> Option<&StoryBinding> {
    handle.story().or_else(|| handle.class_story())
}

/// Resolve the story and scenario an executed case exercises.
///
/// Cases without a story capability are not requirements-linked and yield
/// `None`. A declared story without a scenario for the case's method is an
/// inconsistency and yields `UnboundScenario`.
pub fn resolve_story(case: &ExecutedCase) -> Result<Option<StoryMatch<'_>>> {
    resolve_handle(case.handle())
}

pub fn resolve_handle(handle: &dyn TestHandle) -> Result<Option<StoryMatch<'_>>> {
    let Some(story) = declared_story(handle) else {
        return Ok(None);
    };
    let method = handle.method_name().unwrap_or_default();
    let scenario = story
        .scenario_for(method)
        .ok_or_else(|| CoreJetError::UnboundScenario {
            story: story.name.clone(),
            method: method.to_owned(),
        })?;
    Ok(Some(StoryMatch { story, scenario }))
}

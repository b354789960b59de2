//! Requirements catalogue model for CoreJet behavior-driven reports.
//!
//! A catalogue is an ordered tree of epics, stories and scenarios. Stories
//! carry shared Given/When/Then steps that every one of their scenarios
//! inherits ahead of its own steps. Names are the only linking identifiers;
//! lookups go through [`name_key`].

pub mod catalogue;
pub mod step;
pub mod xml;

pub use catalogue::{
    Catalogue, Epic, Scenario, ScenarioStatus, StatusTally, Story, UnknownStatus,
};
pub use step::{Step, StepKind, StepSet, name_key};

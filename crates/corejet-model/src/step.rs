//! Given/When/Then steps and the comparison rules used during reconciliation.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Normalize a story or scenario name into its lookup key.
///
/// Keys are trimmed and lower-cased; `" Checkout "` and `"checkout"` name the
/// same story.
#[must_use]
pub fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// The three ordered step categories of a scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Given,
    When,
    Then,
}

impl StepKind {
    pub const ALL: [Self; 3] = [Self::Given, Self::When, Self::Then];

    /// XML element name for steps of this kind.
    #[must_use]
    pub const fn element_name(self) -> &'static str {
        match self {
            Self::Given => "given",
            Self::When => "when",
            Self::Then => "then",
        }
    }

    #[must_use]
    pub fn from_element_name(name: &[u8]) -> Option<Self> {
        match name {
            b"given" => Some(Self::Given),
            b"when" => Some(Self::When),
            b"then" => Some(Self::Then),
            _ => None,
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.element_name())
    }
}

/// A single step directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Step {
    pub text: String,
}

impl Step {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Exact text equality after trimming, ignoring case. No fuzzy matching.
    #[must_use]
    pub fn matches(&self, other: &Self) -> bool {
        name_key(&self.text) == name_key(&other.text)
    }
}

impl From<&str> for Step {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

/// Ordered Given, When and Then step lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepSet {
    #[serde(rename = "given")]
    pub givens: Vec<Step>,
    #[serde(rename = "when")]
    pub whens: Vec<Step>,
    #[serde(rename = "then")]
    pub thens: Vec<Step>,
}

impl StepSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a step set from plain text lists.
    #[must_use]
    pub fn from_texts(givens: &[&str], whens: &[&str], thens: &[&str]) -> Self {
        let collect = |texts: &[&str]| -> Vec<Step> {
            texts.iter().map(|text| Step::new(*text)).collect()
        };
        Self {
            givens: collect(givens),
            whens: collect(whens),
            thens: collect(thens),
        }
    }

    #[must_use]
    pub fn steps(&self, kind: StepKind) -> &[Step] {
        match kind {
            StepKind::Given => &self.givens,
            StepKind::When => &self.whens,
            StepKind::Then => &self.thens,
        }
    }

    pub fn steps_mut(&mut self, kind: StepKind) -> &mut Vec<Step> {
        match kind {
            StepKind::Given => &mut self.givens,
            StepKind::When => &mut self.whens,
            StepKind::Then => &mut self.thens,
        }
    }

    pub fn push(&mut self, kind: StepKind, step: Step) {
        self.steps_mut(kind).push(step);
    }

    /// These steps followed by `other`'s, independently per kind.
    #[must_use]
    pub fn concat(&self, other: &Self) -> Self {
        let join = |kind: StepKind| -> Vec<Step> {
            self.steps(kind)
                .iter()
                .chain(other.steps(kind))
                .cloned()
                .collect()
        };
        Self {
            givens: join(StepKind::Given),
            whens: join(StepKind::When),
            thens: join(StepKind::Then),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        StepKind::ALL.iter().all(|kind| self.steps(*kind).is_empty())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        StepKind::ALL.iter().map(|kind| self.steps(*kind).len()).sum()
    }

    /// First kind whose step count differs from `other`'s.
    #[must_use]
    pub fn first_count_difference(&self, other: &Self) -> Option<StepKind> {
        StepKind::ALL
            .into_iter()
            .find(|kind| self.steps(*kind).len() != other.steps(*kind).len())
    }

    /// First kind and position where the step texts disagree.
    ///
    /// Only positions present in both sets are compared; callers check counts
    /// with [`StepSet::first_count_difference`] first.
    #[must_use]
    pub fn first_text_difference(&self, other: &Self) -> Option<(StepKind, usize)> {
        StepKind::ALL.into_iter().find_map(|kind| {
            self.steps(kind)
                .iter()
                .zip(other.steps(kind))
                .position(|(left, right)| !left.matches(right))
                .map(|index| (kind, index))
        })
    }
}

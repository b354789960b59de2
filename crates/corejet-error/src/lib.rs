//! Error type for the CoreJet test runner workspace.
//!
//! Fatal conditions (unrecognized test handles, unknown catalogue sources,
//! broken story bindings) are variants here. Test failures and scenario
//! mismatches are data, not errors, and never pass through this type.

/// Workspace-wide result alias.
pub type Result<T> = std::result::Result<T, CoreJetError>;

#[derive(Debug, thiserror::Error)]
pub enum CoreJetError {
    /// No identity strategy recognized the executed test handle.
    #[error(
        "unknown test type: could not compute suite, test name and class name for {handle}"
    )]
    UnknownTestType { handle: String },

    /// No catalogue source provider is registered under this name.
    #[error("unknown CoreJet source type {name:?}")]
    UnknownSource { name: String },

    /// A test declares a story but the story has no scenario bound to the
    /// test's method.
    #[error("story {story:?} has no scenario bound to test method {method:?}")]
    UnboundScenario { story: String, method: String },

    /// The requirements catalogue document could not be parsed.
    #[error("malformed requirements catalogue: {detail}")]
    CatalogueParse { detail: String },

    /// A report could not be serialized.
    #[error("report generation failed: {detail}")]
    Report { detail: String },

    /// Invalid command-line or configuration input.
    #[error("invalid argument: {detail}")]
    InvalidArgument { detail: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CoreJetError {
    pub fn catalogue_parse(detail: impl Into<String>) -> Self {
        Self::CatalogueParse {
            detail: detail.into(),
        }
    }

    pub fn report(detail: impl Into<String>) -> Self {
        Self::Report {
            detail: detail.into(),
        }
    }

    pub fn invalid_argument(detail: impl Into<String>) -> Self {
        Self::InvalidArgument {
            detail: detail.into(),
        }
    }

    /// Whether this error should stop report generation for the whole run.
    #[must_use]
    pub const fn is_fatal_configuration(&self) -> bool {
        matches!(
            self,
            Self::UnknownTestType { .. } | Self::UnknownSource { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_offender() {
        let err = CoreJetError::UnknownSource {
            name: "jira".to_owned(),
        };
        assert_eq!(err.to_string(), "unknown CoreJet source type \"jira\"");

        let err = CoreJetError::UnknownTestType {
            handle: "OpaqueCase(42)".to_owned(),
        };
        assert!(err.to_string().contains("OpaqueCase(42)"));
    }

    #[test]
    fn test_fatal_configuration_classification() {
        assert!(
            CoreJetError::UnknownSource {
                name: "x".to_owned()
            }
            .is_fatal_configuration()
        );
        assert!(!CoreJetError::catalogue_parse("bad").is_fatal_configuration());
        let io: CoreJetError = std::io::Error::other("disk").into();
        assert!(!io.is_fatal_configuration());
    }

    #[test]
    fn test_constructors_keep_detail_in_message() {
        let cases = [
            (
                CoreJetError::catalogue_parse("unclosed <story>"),
                "malformed requirements catalogue: unclosed <story>",
            ),
            (
                CoreJetError::report("suite a.b: disk full"),
                "report generation failed: suite a.b: disk full",
            ),
            (
                CoreJetError::invalid_argument("--corejet needs a value"),
                "invalid argument: --corejet needs a value",
            ),
            (
                CoreJetError::UnboundScenario {
                    story: "Checkout".to_owned(),
                    method: "test_card".to_owned(),
                },
                "story \"Checkout\" has no scenario bound to test method \"test_card\"",
            ),
        ];
        for (err, message) in cases {
            assert_eq!(err.to_string(), message);
            assert!(!err.is_fatal_configuration());
        }
    }
}

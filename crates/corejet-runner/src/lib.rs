//! CoreJet test runner: records executed tests, reconciles them against a
//! behavior-driven requirements catalogue, and writes JUnit and CoreJet
//! reports.
//!
//! Flow of one run:
//! - the harness reports each completed test to an [`ExecutionRecorder`]
//!   (via [`HarnessListener`]), which files it under a suite computed by the
//!   [`IdentityResolver`];
//! - [`write_suite_reports`] emits one JUnit file per suite;
//! - [`reconcile()`] assigns `pending`, `pass`, `fail` or `mismatch` to every
//!   catalogue scenario, and [`write_corejet_output`] writes the annotated
//!   catalogue with its rendered views.

pub mod config;
pub mod corejet_report;
pub mod handle;
pub mod html;
pub mod identity;
pub mod junit;
pub mod logging;
pub mod reconcile;
pub mod recorder;
pub mod replay;
pub mod session;
pub mod source;
pub mod story_adapter;
pub mod workdir;

pub use config::{CliCommand, RunnerConfig, parse_args};
pub use corejet_report::{COREJET_DIR_NAME, COREJET_FILE_NAME, write_corejet_output};
pub use handle::{CaseDescriptor, StoryBinding, TestHandle, TestedScenario};
pub use html::{HtmlSummaryRenderer, ReportRenderer};
pub use identity::{CaseIdentity, IdentityResolver, IdentityStrategy};
pub use junit::{REPORTS_DIR_NAME, SuiteReportContext, write_suite_reports};
pub use reconcile::{TestedStoryIndex, classify, reconcile};
pub use recorder::{ExecutedCase, ExecutionRecorder, Fault, HarnessListener, Outcome, SuiteMap};
pub use replay::{CaseEvent, replay_file, replay_str};
pub use session::{CoreJetRun, RunSession, RunSummary};
pub use source::{SourceRegistry, SourceSpec};
pub use story_adapter::{StoryMatch, resolve_story};
pub use workdir::WorkingDirBaseline;

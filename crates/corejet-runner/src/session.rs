//! One test run: records outcomes, then writes whichever reports the
//! configuration asks for.

use std::path::PathBuf;

use chrono::Local;
use corejet_error::Result;
use corejet_model::{Catalogue, StatusTally};
use tracing::info;

use crate::config::RunnerConfig;
use crate::corejet_report::write_corejet_output;
use crate::html::{HtmlSummaryRenderer, ReportRenderer};
use crate::identity::IdentityResolver;
use crate::junit::{SuiteReportContext, write_suite_reports};
use crate::reconcile::reconcile;
use crate::recorder::ExecutionRecorder;
use crate::source::{SourceRegistry, SourceSpec};
use crate::workdir::WorkingDirBaseline;

/// Local wall-clock time in ISO-8601 without offset, e.g.
/// `2024-03-01T12:00:00.123456`.
#[must_use]
pub fn local_test_time() -> String {
    Local::now()
        .naive_local()
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string()
}

/// Result of a reconciliation pass.
#[derive(Debug, Clone)]
pub struct CoreJetRun {
    pub dir: PathBuf,
    pub files: Vec<PathBuf>,
    pub tally: StatusTally,
    pub catalogue: Catalogue,
}

/// Everything the run produced.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub tests: usize,
    pub failed: bool,
    pub suite_reports: Vec<PathBuf>,
    pub corejet: Option<CoreJetRun>,
}

impl RunSummary {
    /// 0 when every case succeeded, 1 otherwise. Reconciliation results never
    /// affect it.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        if self.failed { 1 } else { 0 }
    }
}

pub struct RunSession {
    config: RunnerConfig,
    recorder: ExecutionRecorder,
    sources: SourceRegistry,
    renderers: Vec<Box<dyn ReportRenderer>>,
}

impl std::fmt::Debug for RunSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let renderers: Vec<&str> = self.renderers.iter().map(|renderer| renderer.name()).collect();
        f.debug_struct("RunSession")
            .field("config", &self.config)
            .field("recorder", &self.recorder)
            .field("sources", &self.sources)
            .field("renderers", &renderers)
            .finish()
    }
}

impl RunSession {
    /// Session with the built-in identity strategies, the `file` source and
    /// the HTML summary view.
    #[must_use]
    pub fn new(config: RunnerConfig, baseline: WorkingDirBaseline) -> Self {
        Self::with_parts(
            config,
            ExecutionRecorder::new(IdentityResolver::with_defaults(), baseline),
            SourceRegistry::with_defaults(),
            vec![Box::new(HtmlSummaryRenderer::default())],
        )
    }

    #[must_use]
    pub fn with_parts(
        config: RunnerConfig,
        recorder: ExecutionRecorder,
        sources: SourceRegistry,
        renderers: Vec<Box<dyn ReportRenderer>>,
    ) -> Self {
        Self {
            config,
            recorder,
            sources,
            renderers,
        }
    }

    #[must_use]
    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    #[must_use]
    pub fn recorder(&self) -> &ExecutionRecorder {
        &self.recorder
    }

    /// The harness listener for this run.
    pub fn recorder_mut(&mut self) -> &mut ExecutionRecorder {
        &mut self.recorder
    }

    pub fn sources_mut(&mut self) -> &mut SourceRegistry {
        &mut self.sources
    }

    pub fn add_renderer(&mut self, renderer: Box<dyn ReportRenderer>) {
        self.renderers.push(renderer);
    }

    /// Reject an unknown catalogue source before any test is recorded.
    pub fn validate(&self) -> Result<()> {
        if let Some(spec) = &self.config.corejet {
            self.sources.loader(&spec.name)?;
        }
        Ok(())
    }

    /// Write one JUnit file per suite into the configured reports directory.
    pub fn write_xml_reports(&self) -> Result<Vec<PathBuf>> {
        let context = SuiteReportContext::capture(self.config.properties.clone());
        write_suite_reports(&self.config.reports_dir, self.recorder.suites(), &context)
    }

    /// Load the catalogue, reconcile it against the recorded run and write
    /// the annotated catalogue with its views.
    pub fn write_corejet_reports(&self, spec: &SourceSpec) -> Result<CoreJetRun> {
        let dir = self.config.corejet_dir.clone();
        info!(source = %spec.name, dir = %dir.display(), "writing CoreJet report");

        let mut catalogue = self.sources.load(spec)?;
        catalogue.test_time = Some(local_test_time());
        reconcile(&mut catalogue, self.recorder.suites())?;

        let files = write_corejet_output(
            &catalogue,
            &dir,
            &self.config.corejet_filename,
            &self.renderers,
        )?;
        Ok(CoreJetRun {
            dir,
            files,
            tally: catalogue.status_tally(),
            catalogue,
        })
    }

    /// Write every report the configuration enables.
    pub fn finish(&self) -> Result<RunSummary> {
        let suite_reports = if self.config.xml_output {
            self.write_xml_reports()?
        } else {
            Vec::new()
        };
        let corejet = self
            .config
            .corejet
            .as_ref()
            .map(|spec| self.write_corejet_reports(spec))
            .transpose()?;
        Ok(RunSummary {
            tests: self.recorder.total_cases(),
            failed: self.recorder.failed(),
            suite_reports,
            corejet,
        })
    }
}

//! Human-readable view of an annotated catalogue.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use corejet_error::Result;
use corejet_model::{Catalogue, ScenarioStatus, Step, StepKind, StepSet, Story};
use quick_xml::escape::escape;
use tracing::info;

/// Renders an annotated catalogue into an output directory.
pub trait ReportRenderer {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Write the view into `dir` and return the files produced.
    fn render(&self, catalogue: &Catalogue, dir: &Path) -> Result<Vec<PathBuf>>;
}

/// Single-page HTML summary: status tallies, then one table per story.
#[derive(Debug, Clone)]
pub struct HtmlSummaryRenderer {
    file_name: String,
}

impl Default for HtmlSummaryRenderer {
    fn default() -> Self {
        Self {
            file_name: "index.html".to_owned(),
        }
    }
}

impl HtmlSummaryRenderer {
    #[must_use]
    pub fn with_file_name(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
        }
    }
}

impl ReportRenderer for HtmlSummaryRenderer {
    fn name(&self) -> &'static str {
        "html-summary"
    }

    fn render(&self, catalogue: &Catalogue, dir: &Path) -> Result<Vec<PathBuf>> {
        let path = dir.join(&self.file_name);
        fs::write(&path, render_summary_html(catalogue))?;
        info!(renderer = self.name(), path = %path.display(), "catalogue view written");
        Ok(vec![path])
    }
}

fn status_label(status: Option<ScenarioStatus>) -> &'static str {
    status.map_or("unknown", ScenarioStatus::as_str)
}

fn write_steps(out: &mut String, story: &Story, steps: &StepSet) {
    for kind in StepKind::ALL {
        let shared: &[Step] = story.steps.steps(kind);
        for step in shared.iter().chain(steps.steps(kind)) {
            let _ = writeln!(
                out,
                "<li><b>{}</b> {}</li>",
                kind.element_name(),
                escape(step.text.as_str())
            );
        }
    }
}

/// Render the whole page. Text content is XML-escaped.
#[must_use]
pub fn render_summary_html(catalogue: &Catalogue) -> String {
    let project = catalogue.project.as_deref().unwrap_or("CoreJet");
    let tally = catalogue.status_tally();
    let mut out = String::new();

    let _ = writeln!(out, "<!DOCTYPE html>");
    let _ = writeln!(out, "<html><head><meta charset=\"utf-8\">");
    let _ = writeln!(out, "<title>{} requirements</title>", escape(project));
    let _ = writeln!(out, "</head><body>");
    let _ = writeln!(out, "<h1>{}</h1>", escape(project));
    if let Some(test_time) = &catalogue.test_time {
        let _ = writeln!(out, "<p>Tested: {}</p>", escape(test_time.as_str()));
    }
    let _ = writeln!(out, "<table class=\"tally\">");
    for status in ScenarioStatus::ALL {
        let _ = writeln!(
            out,
            "<tr class=\"{status}\"><th>{status}</th><td>{}</td></tr>",
            tally.get(status)
        );
    }
    let _ = writeln!(out, "</table>");

    for epic in &catalogue.epics {
        let title = epic.title.as_deref().unwrap_or("");
        let _ = writeln!(
            out,
            "<h2>{} {}</h2>",
            escape(epic.name.as_str()),
            escape(title)
        );
        for story in &epic.stories {
            let title = story.title.as_deref().unwrap_or("");
            let _ = writeln!(
                out,
                "<h3>{} {}</h3>",
                escape(story.name.as_str()),
                escape(title)
            );
            let _ = writeln!(out, "<table class=\"story\">");
            for scenario in &story.scenarios {
                let status = status_label(scenario.status);
                let _ = writeln!(
                    out,
                    "<tr class=\"{status}\"><td>{}</td><td>{status}</td><td><ul>",
                    escape(scenario.name.as_str())
                );
                write_steps(&mut out, story, &scenario.steps);
                let _ = writeln!(out, "</ul></td></tr>");
            }
            let _ = writeln!(out, "</table>");
        }
    }
    let _ = writeln!(out, "</body></html>");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use corejet_model::{Epic, Scenario};

    fn catalogue() -> Catalogue {
        let mut story = Story::new("S1");
        story.title = Some("Checkout <fast>".to_owned());
        story.steps = StepSet::from_texts(&["a shop"], &[], &[]);
        let mut scenario = Scenario::new(
            "Pay",
            StepSet::from_texts(&["a basket"], &["pay"], &["paid & done"]),
        );
        scenario.status = Some(ScenarioStatus::Mismatch);
        story.scenarios.push(scenario);
        story.scenarios.push(Scenario::new("Refund", StepSet::new()));
        let mut epic = Epic::new("E1");
        epic.stories.push(story);
        Catalogue {
            project: Some("Shop".to_owned()),
            epics: vec![epic],
            ..Catalogue::default()
        }
    }

    #[test]
    fn test_page_lists_scenarios_with_status_and_escaped_text() {
        let html = render_summary_html(&catalogue());
        assert!(html.contains("<h1>Shop</h1>"));
        assert!(html.contains("Checkout &lt;fast&gt;"));
        assert!(html.contains("paid &amp; done"));
        assert!(html.contains("<td>mismatch</td>"));
        assert!(html.contains("<td>unknown</td>"));
        assert!(html.find("a shop").expect("shared step") < html.find("a basket").expect("own step"));
    }

    #[test]
    fn test_renderer_writes_index_html() {
        let dir = tempfile::tempdir().expect("tempdir");
        let written = HtmlSummaryRenderer::default()
            .render(&catalogue(), dir.path())
            .expect("render");
        assert_eq!(written, vec![dir.path().join("index.html")]);
        assert!(fs::read_to_string(&written[0]).expect("read").contains("Refund"));
    }
}

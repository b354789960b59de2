//! JUnit-style suite reports, one XML file per recorded suite.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset, Local};
use corejet_error::{CoreJetError, Result};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use tracing::info;

use crate::recorder::{ExecutedCase, Fault, Outcome, SuiteMap, SuiteRecord};

/// Default reports directory name, relative to the working directory.
pub const REPORTS_DIR_NAME: &str = "testreports";

/// Run-wide values stamped onto every suite report.
#[derive(Debug, Clone)]
pub struct SuiteReportContext {
    pub hostname: String,
    pub timestamp: DateTime<FixedOffset>,
    pub properties: Vec<(String, String)>,
}

impl SuiteReportContext {
    /// Context for "now" on this host.
    #[must_use]
    pub fn capture(properties: Vec<(String, String)>) -> Self {
        Self {
            hostname: local_hostname(),
            timestamp: Local::now().fixed_offset(),
            properties,
        }
    }
}

/// Host name for report metadata.
///
/// Falls back to `$HOSTNAME`, then `localhost`.
#[must_use]
pub fn local_hostname() -> String {
    #[cfg(unix)]
    {
        if let Some(name) = nix::unistd::gethostname()
            .ok()
            .and_then(|name| name.into_string().ok())
            .filter(|name| !name.is_empty())
        {
            return name;
        }
    }
    std::env::var("HOSTNAME")
        .ok()
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "localhost".to_owned())
}

/// File name for a suite's report. Path separators in the suite name are
/// replaced so every report lands directly in the reports directory.
#[must_use]
pub fn suite_file_name(suite: &str) -> String {
    let safe: String = suite
        .chars()
        .map(|ch| if matches!(ch, '/' | '\\') { '_' } else { ch })
        .collect();
    format!("{safe}.xml")
}

fn seconds(value: f64) -> String {
    format!("{:.3}", if value.is_finite() { value.max(0.0) } else { 0.0 })
}

fn write_error(err: impl std::fmt::Display) -> CoreJetError {
    CoreJetError::report(format!("cannot write suite report: {err}"))
}

fn element<'a>(name: &'a str, attributes: &[(&str, &str)]) -> BytesStart<'a> {
    let mut element = BytesStart::new(name);
    for &attribute in attributes {
        element.push_attribute(attribute);
    }
    element
}

fn write_fault<W: Write>(writer: &mut Writer<W>, name: &str, fault: &Fault) -> Result<()> {
    let summary = fault.summary();
    let start = element(name, &[("message", summary), ("type", fault.kind.as_str())]);
    writer.write_event(Event::Start(start)).map_err(write_error)?;
    writer
        .write_event(Event::Text(BytesText::new(&fault.detail())))
        .map_err(write_error)?;
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(write_error)?;
    Ok(())
}

fn write_case<W: Write>(writer: &mut Writer<W>, case: &ExecutedCase) -> Result<()> {
    let time = seconds(case.seconds());
    let start = element(
        "testcase",
        &[
            ("classname", case.class_name()),
            ("name", case.test_name()),
            ("time", time.as_str()),
        ],
    );
    let fault = match case.outcome() {
        Outcome::Success => None,
        Outcome::Failure(fault) => Some(("failure", fault)),
        Outcome::Error(fault) => Some(("error", fault)),
    };
    let Some((kind, fault)) = fault else {
        writer.write_event(Event::Empty(start)).map_err(write_error)?;
        return Ok(());
    };
    writer.write_event(Event::Start(start)).map_err(write_error)?;
    write_fault(writer, kind, fault)?;
    writer
        .write_event(Event::End(BytesEnd::new("testcase")))
        .map_err(write_error)?;
    Ok(())
}

fn write_suite<W: Write>(
    output: W,
    name: &str,
    suite: &SuiteRecord,
    context: &SuiteReportContext,
) -> Result<()> {
    let mut writer = Writer::new_with_indent(output, b' ', 2);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(write_error)?;

    let tests = suite.tests().to_string();
    let errors = suite.errors().to_string();
    let failures = suite.failures().to_string();
    let time = seconds(suite.time());
    let timestamp = context.timestamp.format("%Y-%m-%dT%H:%M:%S").to_string();
    let root = element(
        "testsuite",
        &[
            ("tests", tests.as_str()),
            ("errors", errors.as_str()),
            ("failures", failures.as_str()),
            ("hostname", context.hostname.as_str()),
            ("name", name),
            ("time", time.as_str()),
            ("timestamp", timestamp.as_str()),
        ],
    );
    writer.write_event(Event::Start(root)).map_err(write_error)?;

    writer
        .write_event(Event::Start(BytesStart::new("properties")))
        .map_err(write_error)?;
    for (key, value) in &context.properties {
        let property = element("property", &[("name", key.as_str()), ("value", value.as_str())]);
        writer.write_event(Event::Empty(property)).map_err(write_error)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new("properties")))
        .map_err(write_error)?;

    for case in suite.cases() {
        write_case(&mut writer, case)?;
    }
    for stream in ["system-out", "system-err"] {
        writer
            .write_event(Event::Empty(BytesStart::new(stream)))
            .map_err(write_error)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new("testsuite")))
        .map_err(write_error)?;
    Ok(())
}

/// Render the JUnit document for one suite. The document root is the
/// `<testsuite>` element itself.
pub fn suite_report_xml(name: &str, suite: &SuiteRecord, context: &SuiteReportContext) -> Result<String> {
    let mut buffer = Vec::new();
    write_suite(&mut buffer, name, suite, context)?;
    String::from_utf8(buffer)
        .map_err(|err| CoreJetError::report(format!("suite {name}: report is not UTF-8: {err}")))
}

/// Write one report per suite into `dir`, creating it when absent.
///
/// Returns the written paths in suite-name order.
pub fn write_suite_reports(
    dir: &Path,
    suites: &SuiteMap,
    context: &SuiteReportContext,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    let mut written = Vec::with_capacity(suites.len());
    for (name, suite) in suites {
        let path = dir.join(suite_file_name(name));
        let xml = suite_report_xml(name, suite, context)?;
        fs::write(&path, xml)?;
        info!(
            suite = %name,
            tests = suite.tests(),
            failures = suite.failures(),
            errors = suite.errors(),
            path = %path.display(),
            "suite report written"
        );
        written.push(path);
    }
    Ok(written)
}

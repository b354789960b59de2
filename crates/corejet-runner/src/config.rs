//! Runner configuration and command-line parsing.

use std::path::{Path, PathBuf};

use corejet_error::{CoreJetError, Result};

use crate::corejet_report::{COREJET_DIR_NAME, COREJET_FILE_NAME};
use crate::junit::REPORTS_DIR_NAME;
use crate::source::SourceSpec;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Directory for per-suite JUnit reports.
    pub reports_dir: PathBuf,
    /// Write per-suite reports (`--xml`).
    pub xml_output: bool,
    /// Catalogue source to reconcile against (`--corejet`).
    pub corejet: Option<SourceSpec>,
    /// Output directory for the annotated catalogue; recreated on each run.
    pub corejet_dir: PathBuf,
    pub corejet_filename: String,
    /// Extra `<property>` entries for every suite report, in order.
    pub properties: Vec<(String, String)>,
    /// Harness event stream to replay.
    pub results_path: Option<PathBuf>,
    pub log_json: bool,
}

impl RunnerConfig {
    /// Defaults rooted at `cwd`.
    #[must_use]
    pub fn rooted_at(cwd: &Path) -> Self {
        Self {
            reports_dir: cwd.join(REPORTS_DIR_NAME),
            xml_output: false,
            corejet: None,
            corejet_dir: cwd.join(COREJET_DIR_NAME),
            corejet_filename: COREJET_FILE_NAME.to_owned(),
            properties: Vec::new(),
            results_path: None,
            log_json: false,
        }
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self::rooted_at(Path::new("."))
    }
}

/// What the command line asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    Help,
    Run(RunnerConfig),
}

fn value<'a>(args: &'a [String], index: usize, flag: &str) -> Result<&'a str> {
    args.get(index)
        .map(String::as_str)
        .ok_or_else(|| CoreJetError::invalid_argument(format!("{flag} requires a value")))
}

fn property(raw: &str) -> Result<(String, String)> {
    let (key, value) = raw.split_once('=').ok_or_else(|| {
        CoreJetError::invalid_argument(format!("--property expects <key>=<value>, got {raw:?}"))
    })?;
    let key = key.trim();
    if key.is_empty() {
        return Err(CoreJetError::invalid_argument(format!(
            "--property has an empty key in {raw:?}"
        )));
    }
    Ok((key.to_owned(), value.to_owned()))
}

/// Parse arguments (without the program name). Relative defaults resolve
/// against `cwd`.
pub fn parse_args(args: &[String], cwd: &Path) -> Result<CliCommand> {
    let mut config = RunnerConfig::rooted_at(cwd);

    let mut index = 0;
    while index < args.len() {
        let arg = args[index].as_str();
        let (flag, inline) = match arg.split_once('=') {
            Some((flag, inline)) if flag.starts_with("--") => (flag, Some(inline)),
            _ => (arg, None),
        };
        let take = |index: &mut usize| -> Result<String> {
            if let Some(inline) = inline {
                return Ok(inline.to_owned());
            }
            *index += 1;
            value(args, *index, flag).map(str::to_owned)
        };
        match flag {
            "--xml" => config.xml_output = true,
            "--corejet" => config.corejet = Some(SourceSpec::parse(&take(&mut index)?)),
            "--corejet-dir" => config.corejet_dir = cwd.join(take(&mut index)?),
            "--results" => config.results_path = Some(cwd.join(take(&mut index)?)),
            "--property" => config.properties.push(property(&take(&mut index)?)?),
            "--log-json" => config.log_json = true,
            "-h" | "--help" => return Ok(CliCommand::Help),
            unknown => {
                return Err(CoreJetError::invalid_argument(format!(
                    "unknown option: {unknown}"
                )));
            }
        }
        index += 1;
    }

    Ok(CliCommand::Run(config))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|arg| (*arg).to_owned()).collect()
    }

    fn run_config(raw: &[&str]) -> RunnerConfig {
        match parse_args(&args(raw), Path::new("/work")).expect("parse") {
            CliCommand::Run(config) => config,
            CliCommand::Help => panic!("unexpected help"),
        }
    }

    #[test]
    fn test_defaults_live_under_cwd() {
        let config = run_config(&[]);
        assert_eq!(config.reports_dir, Path::new("/work/testreports"));
        assert_eq!(config.corejet_dir, Path::new("/work/corejet"));
        assert_eq!(config.corejet_filename, "corejet.xml");
        assert!(!config.xml_output);
        assert!(config.corejet.is_none());
    }

    #[test]
    fn test_all_flags() {
        let config = run_config(&[
            "--xml",
            "--corejet",
            "file,reqs/catalogue.xml",
            "--corejet-dir=out/cj",
            "--results",
            "events.jsonl",
            "--property",
            "branch=main",
            "--property=build=42=x",
            "--log-json",
        ]);
        assert!(config.xml_output);
        assert_eq!(
            config.corejet,
            Some(SourceSpec {
                name: "file".to_owned(),
                options: "reqs/catalogue.xml".to_owned(),
            })
        );
        assert_eq!(config.corejet_dir, Path::new("/work/out/cj"));
        assert_eq!(config.results_path.as_deref(), Some(Path::new("/work/events.jsonl")));
        assert_eq!(
            config.properties,
            vec![
                ("branch".to_owned(), "main".to_owned()),
                ("build".to_owned(), "42=x".to_owned()),
            ]
        );
        assert!(config.log_json);
    }

    #[test]
    fn test_absolute_paths_are_kept() {
        let config = run_config(&["--corejet-dir", "/tmp/cj"]);
        assert_eq!(config.corejet_dir, Path::new("/tmp/cj"));
    }

    #[test]
    fn test_help_and_errors() {
        assert_eq!(
            parse_args(&args(&["--xml", "-h"]), Path::new("/")).expect("help"),
            CliCommand::Help
        );
        let missing = parse_args(&args(&["--corejet"]), Path::new("/")).expect_err("missing");
        assert!(missing.to_string().contains("--corejet requires a value"));
        let unknown = parse_args(&args(&["--bogus"]), Path::new("/")).expect_err("unknown");
        assert!(unknown.to_string().contains("unknown option: --bogus"));
        let bad = parse_args(&args(&["--property", "novalue"]), Path::new("/")).expect_err("bad");
        assert!(matches!(bad, CoreJetError::InvalidArgument { .. }));
    }
}

use std::env;
use std::process::ExitCode;

use corejet_error::Result;
use corejet_runner::logging::init_tracing;
use corejet_runner::{CliCommand, RunSession, WorkingDirBaseline, parse_args, replay_file};

fn print_help() {
    let help = "\
corejet-testrunner — reconcile a test run against a CoreJet requirements catalogue

USAGE:
    corejet-testrunner [OPTIONS]

OPTIONS:
    --results <PATH>            JSON Lines event stream of completed tests to replay
    --xml                       Write one JUnit XML report per suite to ./testreports
    --corejet <SOURCE>,<OPTS>   Reconcile against a catalogue source, e.g. file,reqs/corejet.xml
    --corejet-dir <PATH>        Output directory for CoreJet reports (default: ./corejet)
    --property <KEY>=<VALUE>    Add a property to every suite report (repeatable)
    --log-json                  Emit logs as JSON on stderr (filter with RUST_LOG)
    -h, --help                  Show this help

EXIT STATUS:
    0  every test succeeded
    1  at least one test failed or errored
    2  fatal error (bad arguments, unknown test type or source, unreadable input)
";
    println!("{help}");
}

fn run(args: &[String]) -> Result<u8> {
    let baseline = WorkingDirBaseline::capture()?;
    let config = match parse_args(args, baseline.path())? {
        CliCommand::Help => {
            print_help();
            return Ok(0);
        }
        CliCommand::Run(config) => config,
    };
    init_tracing(config.log_json);

    let mut session = RunSession::new(config, baseline);
    session.validate()?;

    if let Some(results) = session.config().results_path.clone() {
        replay_file(session.recorder_mut(), &results)?;
    }

    if session.config().corejet.is_some() {
        println!(
            "Writing CoreJet report to {}",
            session.config().corejet_dir.display()
        );
    }
    let summary = session.finish()?;

    println!(
        "Ran {} tests: {}",
        summary.tests,
        if summary.failed { "FAILED" } else { "OK" }
    );
    for path in &summary.suite_reports {
        println!("  suite report {}", path.display());
    }
    if let Some(corejet) = &summary.corejet {
        println!("CoreJet scenarios: {}", corejet.tally);
    }
    Ok(summary.exit_code())
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();
    match run(&args) {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("ERROR corejet-testrunner failed: {err}");
            ExitCode::from(2)
        }
    }
}

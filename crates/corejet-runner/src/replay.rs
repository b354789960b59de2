//! Replays a recorded harness event stream (JSON Lines) into a listener.
//!
//! Each non-blank line is one completed test:
//!
//! ```json
//! {"outcome":"failure","seconds":0.2,"fault":{"type":"AssertionError","message":"boom","traceback":""},
//!  "case":{"class_name":"shop.tests.Cart","method":"test_add","id":"shop.tests.Cart.test_add"}}
//! ```

use std::fs;
use std::path::Path;

use corejet_error::{CoreJetError, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::handle::CaseDescriptor;
use crate::recorder::{Fault, HarnessListener};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventOutcome {
    Success,
    Failure,
    Error,
}

/// One line of the event stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseEvent {
    pub outcome: EventOutcome,
    #[serde(default)]
    pub seconds: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fault: Option<Fault>,
    pub case: CaseDescriptor,
}

impl CaseEvent {
    /// Hand the event to the matching listener callback.
    pub fn dispatch(self, listener: &mut dyn HarnessListener) -> Result<()> {
        let seconds = if self.seconds.is_finite() {
            self.seconds.max(0.0)
        } else {
            0.0
        };
        let handle = Box::new(self.case);
        match self.outcome {
            EventOutcome::Success => listener.on_success(handle, seconds),
            EventOutcome::Failure => {
                listener.on_failure(handle, seconds, self.fault.unwrap_or_default())
            }
            EventOutcome::Error => listener.on_error(handle, seconds, self.fault.unwrap_or_default()),
        }
    }
}

/// Replay every event in `input`, in order. Returns the number replayed.
pub fn replay_str(listener: &mut dyn HarnessListener, input: &str) -> Result<usize> {
    let mut replayed = 0;
    for (line_no, line) in input.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let event: CaseEvent = serde_json::from_str(line).map_err(|err| {
            CoreJetError::invalid_argument(format!("event line {}: {err}", line_no + 1))
        })?;
        debug!(line = line_no + 1, outcome = ?event.outcome, "replaying event");
        event.dispatch(listener)?;
        replayed += 1;
    }
    Ok(replayed)
}

pub fn replay_file(listener: &mut dyn HarnessListener, path: &Path) -> Result<usize> {
    let input = fs::read_to_string(path).map_err(|err| {
        CoreJetError::invalid_argument(format!("cannot read results {}: {err}", path.display()))
    })?;
    let replayed = replay_str(listener, &input)?;
    info!(path = %path.display(), events = replayed, "results replayed");
    Ok(replayed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::TestHandle;
    use serde_json::json;

    #[derive(Default)]
    struct Tape {
        calls: Vec<(String, String, f64)>,
    }

    impl HarnessListener for Tape {
        fn on_success(&mut self, handle: Box<dyn TestHandle>, seconds: f64) -> Result<()> {
            let id = handle.test_id().unwrap_or_default();
            self.calls.push(("success".to_owned(), id, seconds));
            Ok(())
        }

        fn on_failure(&mut self, handle: Box<dyn TestHandle>, seconds: f64, fault: Fault) -> Result<()> {
            let id = handle.test_id().unwrap_or_default();
            self.calls.push((format!("failure:{}", fault.kind), id, seconds));
            Ok(())
        }

        fn on_error(&mut self, handle: Box<dyn TestHandle>, seconds: f64, fault: Fault) -> Result<()> {
            let id = handle.test_id().unwrap_or_default();
            self.calls.push((format!("error:{}", fault.message), id, seconds));
            Ok(())
        }
    }

    #[test]
    fn test_events_dispatch_in_order() {
        let lines = [
            json!({"outcome": "success", "seconds": 0.5,
                   "case": {"class_name": "a.B", "method": "test_x", "id": "a.B.test_x"}}),
            json!({"outcome": "failure", "seconds": 0.1,
                   "fault": {"type": "AssertionError", "message": "boom", "traceback": "tb"},
                   "case": {"id": "a.B.test_y"}}),
            json!({"outcome": "error", "case": {"id": "a.B.test_z"}}),
        ];
        let input = lines
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n\n");

        let mut tape = Tape::default();
        assert_eq!(replay_str(&mut tape, &input).expect("replay"), 3);
        assert_eq!(
            tape.calls,
            vec![
                ("success".to_owned(), "a.B.test_x".to_owned(), 0.5),
                ("failure:AssertionError".to_owned(), "a.B.test_y".to_owned(), 0.1),
                ("error:".to_owned(), "a.B.test_z".to_owned(), 0.0),
            ]
        );
    }

    #[test]
    fn test_bad_line_names_its_position() {
        let mut tape = Tape::default();
        let input = "{\"outcome\":\"success\",\"case\":{}}\nnot json\n";
        let err = replay_str(&mut tape, input).expect_err("bad line");
        assert!(err.to_string().contains("event line 2"));
        assert_eq!(tape.calls.len(), 1);
    }

    #[test]
    fn test_negative_time_is_clamped() {
        let mut tape = Tape::default();
        replay_str(&mut tape, r#"{"outcome":"success","seconds":-3.0,"case":{"id":"x.y"}}"#)
            .expect("replay");
        assert_eq!(tape.calls[0].2, 0.0);
    }
}

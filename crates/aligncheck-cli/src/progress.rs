//! `-v` progress display: a spinner while a tool runs, one line per finished
//! scenario.

use aligncheck::runner::{ProgressCallback, ProgressEvent};
use aligncheck::{ScenarioStatus, SuiteStatus};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::sync::Mutex;
use std::time::Duration;

const GREEN: &str = "32";
const RED: &str = "31";
const YELLOW: &str = "33";

pub struct VerboseProgress {
    color: bool,
    spinner: Mutex<Option<ProgressBar>>,
}

impl VerboseProgress {
    /// `color` is the outcome of `--color` and terminal detection.
    pub fn new(color: bool) -> Self {
        Self {
            color,
            spinner: Mutex::new(None),
        }
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.color {
            format!("\x1b[{code}m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }

    fn status_mark(&self, status: ScenarioStatus) -> String {
        match status {
            ScenarioStatus::Passed => self.paint(GREEN, "ok"),
            ScenarioStatus::Failed => self.paint(RED, "FAIL"),
            ScenarioStatus::Errored => self.paint(RED, "ERROR"),
            ScenarioStatus::Skipped => self.paint(YELLOW, "skip"),
        }
    }

    fn start_spinner(&self, message: String) {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .template("{spinner} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        bar.set_style(style);
        bar.set_message(message);
        bar.enable_steady_tick(Duration::from_millis(120));
        if let Ok(mut slot) = self.spinner.lock() {
            if let Some(previous) = slot.replace(bar) {
                previous.finish_and_clear();
            }
        }
    }

    fn stop_spinner(&self) {
        if let Ok(mut slot) = self.spinner.lock() {
            if let Some(bar) = slot.take() {
                bar.finish_and_clear();
            }
        }
    }

    fn render(&self, event: &ProgressEvent) -> Option<String> {
        match event {
            ProgressEvent::SuiteStarted { run_id, suite, total } => {
                Some(format!("running {suite}: {total} scenarios (run {run_id})"))
            }
            ProgressEvent::ScenarioStarted { .. } => None,
            ProgressEvent::ScenarioFinished {
                index,
                name,
                status,
                duration_ms,
                matched,
                failed,
                message,
            } => {
                let mut line = format!(
                    "[{index}] {} {name} in {duration_ms}ms",
                    self.status_mark(*status)
                );
                if matched + failed > 0 {
                    line.push_str(&format!(", {matched}/{} files matched", matched + failed));
                }
                if let Some(message) = message {
                    line.push_str(&format!("\n      {message}"));
                }
                Some(line)
            }
            ProgressEvent::SuiteFinished {
                status,
                duration_ms,
                ..
            } => {
                let word = match status {
                    SuiteStatus::Passed => self.paint(GREEN, "passed"),
                    SuiteStatus::Failed => self.paint(RED, "failed"),
                    SuiteStatus::Errored => self.paint(RED, "errored"),
                };
                Some(format!("suite {word} after {duration_ms}ms"))
            }
        }
    }
}

impl ProgressCallback for VerboseProgress {
    fn on_progress(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::ScenarioStarted { index, total, name } => {
                self.start_spinner(format!("[{index}/{total}] {name}"));
            }
            ProgressEvent::ScenarioFinished { .. } | ProgressEvent::SuiteFinished { .. } => {
                self.stop_spinner();
            }
            ProgressEvent::SuiteStarted { .. } => {}
        }
        if let Some(line) = self.render(event) {
            let _ = writeln!(std::io::stderr(), "{line}");
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic, clippy::indexing_slicing)]

    use super::*;

    fn finished(status: ScenarioStatus) -> ProgressEvent {
        ProgressEvent::ScenarioFinished {
            index: 2,
            name: "mafft-trimal".to_string(),
            status,
            duration_ms: 15,
            matched: 1,
            failed: 1,
            message: Some("`uce-2.nexus` differs from its fixture".to_string()),
        }
    }

    #[test]
    fn plain_output_has_no_escape_codes() {
        let line = VerboseProgress::new(false)
            .render(&finished(ScenarioStatus::Failed))
            .unwrap();
        assert!(!line.contains('\x1b'));
        assert!(line.starts_with("[2] FAIL mafft-trimal in 15ms, 1/2 files matched"));
        assert!(line.ends_with("\n      `uce-2.nexus` differs from its fixture"));
    }

    #[test]
    fn colored_output_wraps_the_status() {
        let line = VerboseProgress::new(true)
            .render(&finished(ScenarioStatus::Errored))
            .unwrap();
        assert!(line.contains("\x1b[31mERROR\x1b[0m"));
    }

    #[test]
    fn scenario_start_prints_nothing() {
        let event = ProgressEvent::ScenarioStarted {
            index: 1,
            total: 8,
            name: "mafft-gblocks".to_string(),
        };
        assert!(VerboseProgress::new(false).render(&event).is_none());
    }
}

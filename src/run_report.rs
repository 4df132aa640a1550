use std::time::Duration;

use crate::translation::usage::{cost_for, UsageTotals};

// @module: Per-file status lines and the run total

const YELLOW: &str = "\x1b[33m";
const BLUE: &str = "\x1b[34m";
const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[39m";

/// Outcome of translating one file
#[derive(Debug, Clone, PartialEq)]
pub struct FileReport {
    /// File name as shown to the user
    pub filename: String,
    /// Tokens spent, including those of a failed walk
    pub tokens: u64,
    /// Wall time spent on the file
    pub elapsed: Duration,
    /// Error message when the file failed
    pub error: Option<String>,
}

impl FileReport {
    pub fn success(filename: impl Into<String>, tokens: u64, elapsed: Duration) -> Self {
        Self {
            filename: filename.into(),
            tokens,
            elapsed,
            error: None,
        }
    }

    pub fn failure(filename: impl Into<String>, tokens: u64, elapsed: Duration, error: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            tokens,
            elapsed,
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Colored one-line summary, e.g. `a.txt: [120 Tokens/$0.0002][3.1s] ✓`
    pub fn status_line(&self, cost_per_1k_tokens: f64) -> String {
        format_status(
            &self.filename,
            self.tokens,
            cost_for(self.tokens, cost_per_1k_tokens),
            self.elapsed,
            self.error.as_deref(),
        )
    }
}

/// Status line for the whole run
pub fn total_line(totals: &UsageTotals, elapsed: Duration) -> String {
    format_status("TOTAL", totals.tokens, totals.cost, elapsed, None)
}

fn format_status(name: &str, tokens: u64, cost: f64, elapsed: Duration, error: Option<&str>) -> String {
    let outcome = match error {
        None => format!("{} ✓ {}", GREEN, RESET),
        Some(message) => format!("{} ✗ {}{}", RED, message, RESET),
    };
    format!(
        "{}: {}[{} Tokens/${:.4}]{}[{:.1}s]{}",
        name,
        YELLOW,
        tokens,
        cost,
        BLUE,
        elapsed.as_secs_f64(),
        outcome
    )
}

use chrono::Utc;
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use answercheck::batch::RowReport;
use answercheck::types::AnswerRecord;

const MAX_QUESTION_BYTES: usize = 1024;

#[derive(Debug, Serialize)]
pub struct LogEntry {
    pub ts: String,
    pub file: String,
    pub row: usize,
    pub model: String,
    pub correct: bool,
    pub attempts: u32,
    pub error: Option<String>,
    pub question: String,
}

/// Default log directory.
fn default_log_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home)
        .join(".local")
        .join("state")
        .join("answercheck")
}

/// Default log file path.
pub fn log_file_path() -> PathBuf {
    default_log_dir().join("judgments.jsonl")
}

/// Write a log entry. Errors are printed to stderr but do not fail the run.
pub fn log_judgment(entry: &LogEntry) {
    log_judgment_to(entry, &log_file_path());
}

/// Write a log entry to a specific path (for testing).
pub fn log_judgment_to(entry: &LogEntry, path: &Path) {
    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            eprintln!("answercheck: failed to create log directory: {e}");
            return;
        }
    }

    let json = match serde_json::to_string(entry) {
        Ok(j) => j,
        Err(e) => {
            eprintln!("answercheck: failed to serialize log entry: {e}");
            return;
        }
    };

    let mut file = match OpenOptions::new().create(true).append(true).open(path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("answercheck: failed to open log file: {e}");
            return;
        }
    };

    if let Err(e) = writeln!(file, "{json}") {
        eprintln!("answercheck: failed to write log entry: {e}");
    }
}

/// Create a log entry for one judged row.
pub fn make_entry(
    file: &Path,
    model: &str,
    record: &AnswerRecord<'_>,
    report: &RowReport,
) -> LogEntry {
    LogEntry {
        ts: Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        file: file.display().to_string(),
        row: report.row,
        model: model.to_string(),
        correct: report.judgment.verdict.correct,
        attempts: report.judgment.attempts,
        error: report.judgment.diagnostic.clone(),
        question: truncate(record.question, MAX_QUESTION_BYTES),
    }
}

/// Cut `s` to at most `max` bytes on a char boundary, marking the cut with `...`.
fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}

use serde::{Deserialize, Serialize};

/// Column holding the question asked to the model under test.
pub const QUESTION_COLUMN: &str = "questions";
/// Column holding the reference answer.
pub const EXPECTED_COLUMN: &str = "correct_answers";
/// Column holding the answer produced by the model under test.
pub const CANDIDATE_COLUMN: &str = "answers_by_llm";
/// Column appended to the output with one verdict flag per row.
pub const FLAG_COLUMN: &str = "correction_flag";

/// The columns every input table must carry.
pub const REQUIRED_COLUMNS: [&str; 3] = [QUESTION_COLUMN, EXPECTED_COLUMN, CANDIDATE_COLUMN];

/// One row of input, borrowed from the source table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerRecord<'a> {
    pub question: &'a str,
    pub expected_answer: &'a str,
    pub candidate_answer: &'a str,
}

/// Binary correctness judgment for a single row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub correct: bool,
}

impl Verdict {
    pub const CORRECT: Verdict = Verdict { correct: true };
    pub const INCORRECT: Verdict = Verdict { correct: false };

    /// Value written to the `correction_flag` column.
    pub fn as_flag(self) -> &'static str {
        if self.correct {
            "1"
        } else {
            "0"
        }
    }
}

impl From<bool> for Verdict {
    fn from(correct: bool) -> Self {
        Self { correct }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(if self.correct { "correct" } else { "incorrect" })
    }
}

/// Outcome of judging one row: the verdict plus how it was reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Judgment {
    pub verdict: Verdict,
    /// Number of endpoint calls made, including retries.
    pub attempts: u32,
    /// Set when the endpoint failed permanently and the verdict defaulted to incorrect.
    pub diagnostic: Option<String>,
}

impl Judgment {
    pub fn succeeded(verdict: Verdict, attempts: u32) -> Self {
        Self {
            verdict,
            attempts,
            diagnostic: None,
        }
    }

    pub fn failed(attempts: u32, diagnostic: String) -> Self {
        Self {
            verdict: Verdict::INCORRECT,
            attempts,
            diagnostic: Some(diagnostic),
        }
    }
}

use crate::types::Verdict;

/// How a judge response is turned into a verdict.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParseMode {
    /// Correct if "yes" appears anywhere in the lowercased, trimmed response.
    ///
    /// "not yes" therefore counts as correct.
    #[default]
    Substring,
    /// Correct only if the whole response is "yes", ignoring case and a trailing `.` or `!`.
    Exact,
}

pub fn parse_verdict(response: &str, mode: ParseMode) -> Verdict {
    let normalized = response.trim().to_lowercase();
    let correct = match mode {
        ParseMode::Substring => normalized.contains("yes"),
        ParseMode::Exact => normalized.trim_end_matches(['.', '!']).trim_end() == "yes",
    };
    Verdict::from(correct)
}

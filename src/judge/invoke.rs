use crate::client::Generate;
use crate::types::{AnswerRecord, Judgment};

use super::config::JudgeConfig;
use super::prompt::{build_prompt, build_prompt_strict};
use super::response::{parse_verdict, ParseMode};
use super::retry::{RetryPolicy, Sleep, ThreadSleep};

/// Asks the endpoint whether a candidate answer matches the expected one.
///
/// The client is only read; each call gets a fresh retry budget.
pub struct Judge<C, S = ThreadSleep> {
    client: C,
    policy: RetryPolicy,
    mode: ParseMode,
    sleeper: S,
}

impl<C: Generate> Judge<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            policy: RetryPolicy::default(),
            mode: ParseMode::default(),
            sleeper: ThreadSleep,
        }
    }

    /// Build a judge using the retry settings from `config`.
    pub fn from_config(client: C, config: &JudgeConfig) -> Self {
        Self::new(client).with_policy(RetryPolicy {
            max_attempts: config.max_attempts,
            backoff_unit: config.backoff_unit(),
        })
    }
}

impl<C: Generate, S: Sleep> Judge<C, S> {
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_mode(mut self, mode: ParseMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_sleeper<T: Sleep>(self, sleeper: T) -> Judge<C, T> {
        Judge {
            client: self.client,
            policy: self.policy,
            mode: self.mode,
            sleeper,
        }
    }

    /// Judge one record. Never fails: an unrecoverable endpoint error yields an
    /// incorrect verdict carrying a diagnostic.
    pub fn judge(&self, record: &AnswerRecord<'_>) -> Judgment {
        let prompt = match self.mode {
            ParseMode::Substring => build_prompt(
                record.question,
                record.expected_answer,
                record.candidate_answer,
            ),
            ParseMode::Exact => build_prompt_strict(
                record.question,
                record.expected_answer,
                record.candidate_answer,
            ),
        };

        let mut attempt = 0;
        loop {
            match self.client.generate(&prompt) {
                Ok(text) => {
                    return Judgment::succeeded(parse_verdict(&text, self.mode), attempt + 1);
                }
                Err(e) if e.is_rate_limited() && self.policy.has_attempts_after(attempt) => {
                    self.sleeper.sleep(self.policy.backoff(attempt));
                    attempt += 1;
                }
                Err(e) => {
                    return Judgment::failed(
                        attempt + 1,
                        format!("Error while calling Gemini API: {e}"),
                    );
                }
            }
        }
    }
}

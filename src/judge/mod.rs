mod config;
mod invoke;
mod prompt;
mod response;
mod retry;

pub use config::{default_config_path, load_config, ConfigError, JudgeConfig};
pub use invoke::Judge;
pub use prompt::{build_prompt, build_prompt_strict};
pub use response::{parse_verdict, ParseMode};
pub use retry::{RetryPolicy, Sleep, ThreadSleep};

use clap::Parser as ClapParser;
use clap::Subcommand;
use std::path::{Path, PathBuf};

use crate::logger;
use answercheck::batch;
use answercheck::client::GeminiClient;
use answercheck::judge::{self, Judge, JudgeConfig, ParseMode};
use answercheck::table::Table;

#[derive(ClapParser)]
#[command(
    name = "answercheck",
    version,
    about = "Grade LLM answers against expected answers with a Gemini judge",
    subcommand_negates_reqs = true,
    args_conflicts_with_subcommands = true
)]
struct Cli {
    /// Path to judge config YAML file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Override the judge model
    #[arg(short, long, value_name = "MODEL", global = true)]
    model: Option<String>,

    /// CSV or Excel file with questions, correct_answers and answers_by_llm columns
    #[arg(value_name = "FILE", required = true)]
    file: Option<PathBuf>,

    /// Where to write the graded CSV
    #[arg(short, long, value_name = "FILE", default_value = "processed_data.csv")]
    output: PathBuf,

    /// Require a bare yes/no answer instead of accepting "yes" anywhere in the reply
    #[arg(long)]
    strict: bool,

    /// Do not print the graded table
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the effective judge configuration
    Config,
}

/// Main entry point. Returns the process exit code.
pub fn run() -> i32 {
    yansi::whenever(yansi::Condition::TTY_AND_COLOR);

    let cli = Cli::parse();

    // A .env file may carry the API key; variables already set win
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("answercheck: failed to load .env: {e}");
        }
    }

    let mut config = match judge::load_config(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("answercheck: {e}");
            return 2;
        }
    };

    // Apply CLI model override
    if let Some(model) = cli.model {
        config.model = model;
    }

    let mode = if cli.strict {
        ParseMode::Exact
    } else {
        ParseMode::Substring
    };

    match (cli.command, cli.file) {
        (Some(Commands::Config), _) => run_config(&config),
        (None, Some(file)) => run_grade(&config, &file, &cli.output, mode, cli.quiet),
        (None, None) => {
            eprintln!("answercheck: no input file given");
            2
        }
    }
}

/// Grade every row of `file` and write the annotated table to `output`.
fn run_grade(
    config: &JudgeConfig,
    file: &Path,
    output: &Path,
    mode: ParseMode,
    quiet: bool,
) -> i32 {
    // Credential problems are fatal before any input is touched
    let api_key = match config.api_key() {
        Ok(k) => k,
        Err(e) => {
            eprintln!("answercheck: {e}");
            return 2;
        }
    };
    let client = match GeminiClient::new(config, api_key) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("answercheck: failed to create HTTP client: {e}");
            return 2;
        }
    };

    let table = match Table::read_path(file) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("answercheck: {e}");
            return 1;
        }
    };

    let judge = Judge::from_config(&client, config).with_mode(mode);
    let result = batch::run_with(&table, &judge, |record, report| {
        if let Some(diagnostic) = &report.judgment.diagnostic {
            eprintln!("answercheck: row {}: {diagnostic}", report.row + 1);
        }
        if config.log {
            logger::log_judgment(&logger::make_entry(file, &config.model, record, report));
        }
    });
    let result = match result {
        Ok(r) => r,
        Err(e) => {
            eprintln!("answercheck: {e}");
            return 1;
        }
    };

    if let Err(e) = result.table().write_path(output) {
        eprintln!("answercheck: {e}");
        return 1;
    }

    if !quiet {
        println!("{}", crate::output::result_table(&result));
    }
    println!("{}", crate::output::summary(&result));
    println!("Results written to {}", output.display());

    0
}

fn run_config(config: &JudgeConfig) -> i32 {
    let yaml = match serde_norway::to_string(config) {
        Ok(y) => y,
        Err(e) => {
            eprintln!("answercheck: failed to serialize config: {e}");
            return 1;
        }
    };
    print!("{yaml}");

    let key_status = if config.api_key().is_ok() {
        "set"
    } else {
        "missing"
    };
    println!("# {}: {key_status}", config.api_key_env);
    println!("# default config path: {}", judge::default_config_path().display());

    0
}

//! Scriptorium CLI binary.
//!
//! This binary provides command-line access to Scriptorium's functionality:
//! - Run the outline, story bible and scene pipeline
//! - Merge outline revisions by hand
//! - Send one-off prompts to the configured models

use clap::Parser;
use scriptorium::{LoggingConfig, ScriptoriumConfig, init_logging};

mod cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use cli::{Cli, Commands, ask, merge_outline_files, run_flags, run_pipeline};

    // API keys may live in a local .env
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut logging = LoggingConfig::from_env().with_json_logs(cli.json_logs);
    if cli.verbose {
        logging = logging.with_log_level("debug").with_target(true);
    }
    init_logging(&logging)?;

    match cli.command {
        Commands::Run {
            outline,
            characters,
            themes,
            scenes,
            input_dir,
            output_dir,
        } => {
            let config = ScriptoriumConfig::load_with(cli.config.as_deref())?;
            let flags = run_flags(outline, characters, themes, scenes);
            run_pipeline(config, flags, input_dir, output_dir).await?;
        }

        Commands::MergeOutline {
            original,
            patch,
            out,
        } => {
            merge_outline_files(&original, &patch, out.as_deref())?;
        }

        Commands::Ask {
            prompt,
            validation,
            json,
        } => {
            let config = ScriptoriumConfig::load_with(cli.config.as_deref())?;
            ask(&config, &prompt, validation, json).await?;
        }
    }

    Ok(())
}

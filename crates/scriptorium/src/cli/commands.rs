//! CLI command definitions.

use clap::{Parser, Subcommand};
use scriptorium::RunFlags;
use std::path::PathBuf;

/// Scriptorium - generate, validate and refine screenplays with LLMs
#[derive(Parser, Debug)]
#[command(name = "scriptorium")]
#[command(about = "Generate, validate and refine screenplays with LLMs", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Configuration file layered above the user's scriptorium.toml
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the pipeline; with no step flags, every step runs
    Run {
        /// Build a new outline
        #[arg(long)]
        outline: bool,

        /// Develop new characters
        #[arg(long)]
        characters: bool,

        /// Identify new themes
        #[arg(long)]
        themes: bool,

        /// Write the scenes
        #[arg(long)]
        scenes: bool,

        /// Directory holding concept.txt and the optional inputs
        #[arg(long)]
        input_dir: Option<PathBuf>,

        /// Directory receiving the generated artifacts
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },

    /// Merge an outline revision into an outline
    MergeOutline {
        /// Outline JSON to merge into
        original: PathBuf,

        /// Sparse revision JSON
        patch: PathBuf,

        /// Write the result here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Send one prompt to the configured generation model
    Ask {
        /// Prompt text
        prompt: String,

        /// Use the validation model instead
        #[arg(long)]
        validation: bool,

        /// Ask for JSON and pretty-print it instead of streaming text
        #[arg(long)]
        json: bool,
    },
}

/// Steps selected on the command line; none selected means all.
pub fn run_flags(outline: bool, characters: bool, themes: bool, scenes: bool) -> RunFlags {
    let flags = RunFlags {
        outline,
        characters,
        themes,
        scenes,
    };
    if flags.is_empty() {
        RunFlags::all()
    } else {
        flags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_step_flags_selects_everything() {
        assert_eq!(run_flags(false, false, false, false), RunFlags::all());
    }

    #[test]
    fn step_flags_select_only_those_steps() {
        let flags = run_flags(false, false, false, true);
        assert!(flags.scenes);
        assert!(!flags.outline);
    }

    #[test]
    fn run_command_parses() {
        let cli = Cli::try_parse_from([
            "scriptorium",
            "--verbose",
            "run",
            "--scenes",
            "--output-dir",
            "out",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Run {
                scenes, output_dir, ..
            } => {
                assert!(scenes);
                assert_eq!(output_dir, Some(PathBuf::from("out")));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn ask_takes_global_config_after_subcommand() {
        let cli = Cli::try_parse_from([
            "scriptorium",
            "ask",
            "Name three lighthouses.",
            "--json",
            "--config",
            "local.toml",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("local.toml")));
        assert!(matches!(cli.command, Commands::Ask { json: true, .. }));
    }
}

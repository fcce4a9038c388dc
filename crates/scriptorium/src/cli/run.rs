//! Command handlers.

use futures_util::StreamExt;
use scriptorium::{
    GenerateOptions, ModelResponse, Outline, RunFlags, ScriptAutomator, ScriptoriumConfig,
    ScriptoriumResult, TieredModel, merge_outlines,
};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

/// Run the pipeline with directory overrides applied to `config`.
#[instrument(skip(config))]
pub async fn run_pipeline(
    mut config: ScriptoriumConfig,
    flags: RunFlags,
    input_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
) -> ScriptoriumResult<()> {
    if let Some(dir) = input_dir {
        config.paths.input_dir = dir;
    }
    if let Some(dir) = output_dir {
        config.paths.output_dir = dir;
    }

    let automator = ScriptAutomator::from_config(config)?;
    let summary = automator.run(flags).await?;

    info!(
        acts = summary.outline().acts.len(),
        sub_scenes = summary.outline().sub_scene_count(),
        characters = summary.characters().0.len(),
        "Run finished"
    );
    if let Some(script) = summary.script() {
        let accepted = script.scenes().iter().filter(|s| s.accepted).count();
        println!(
            "Wrote {} scenes ({} accepted), refined {}; artifacts in {}",
            script.scenes().len(),
            accepted,
            script.refined_scenes().len(),
            automator.config().paths.output_dir.display()
        );
        if let Some(evaluation) = script.evaluation() {
            println!("Full script score: {}", evaluation.total_score);
        }
    }
    Ok(())
}

/// Merge `patch` into `original` and print or save the result.
pub fn merge_outline_files(
    original: &Path,
    patch: &Path,
    out: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let original: Outline = serde_json::from_str(&std::fs::read_to_string(original)?)?;
    let patch: Outline = serde_json::from_str(&std::fs::read_to_string(patch)?)?;
    let merged = serde_json::to_string_pretty(&merge_outlines(&original, &patch))?;

    match out {
        Some(path) => {
            std::fs::write(path, merged)?;
            info!(path = %path.display(), "Merged outline written");
        }
        None => println!("{}", merged),
    }
    Ok(())
}

/// Send one prompt and print the answer, streaming unless JSON is wanted.
#[instrument(skip(config, prompt), fields(prompt_length = prompt.len()))]
pub async fn ask(
    config: &ScriptoriumConfig,
    prompt: &str,
    validation: bool,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let selection = if validation {
        config.validation()
    } else {
        config.generation()
    };
    let model = TieredModel::from_config(&selection, config)?;
    info!(model = %model.primary().label(), "Asking");

    let options = if json {
        GenerateOptions::json()
    } else {
        GenerateOptions::streaming()
    };

    match model.generate(prompt, &options).await? {
        ModelResponse::Text(text) => println!("{}", text),
        ModelResponse::Structured(value) => println!("{}", serde_json::to_string_pretty(&value)?),
        ModelResponse::Stream(mut fragments) => {
            let mut stdout = std::io::stdout();
            while let Some(fragment) = fragments.next().await {
                write!(stdout, "{}", fragment?)?;
                stdout.flush()?;
            }
            writeln!(stdout)?;
        }
    }
    Ok(())
}

//! Tests for the layered configuration system.

use scriptorium_config::{ModelSelection, ScriptoriumConfig};
use std::path::PathBuf;

#[test]
fn test_bundled_defaults() {
    let config = ScriptoriumConfig::from_toml_str("").unwrap();

    assert_eq!(config.generation(), ModelSelection::new("ollama", "gemma2:27b"));
    assert_eq!(config.validation(), ModelSelection::new("ollama", "gemma2:27b"));
    assert_eq!(config.fallback(), ModelSelection::new("openai", "gpt-4o"));
    assert_eq!(config.max_scene_iterations, 5);
    assert_eq!(config.good_scene_threshold, 80);
    assert_eq!(config.max_outline_generation_attempts, 3);
    assert_eq!(config.full_script_threshold, 80);
    assert_eq!(config.max_json_attempts, 3);
    assert!(config.use_local_context);
    assert_eq!(config.context_length, None);
    assert_eq!(config.genre, "unknown");
    assert_eq!(config.paths.input_dir, PathBuf::from("data"));
    assert_eq!(config.paths.output_dir, PathBuf::from("output"));
}

#[test]
fn test_bundled_providers() {
    let config = ScriptoriumConfig::from_toml_str("").unwrap();

    let ollama = config.provider_settings("ollama");
    assert_eq!(ollama.base_url, "http://localhost:11434");
    assert_eq!(ollama.api_key_env, None);

    let openai = config.provider_settings("openai");
    assert_eq!(openai.api_key_env.as_deref(), Some("OPENAI_API_KEY"));

    let replicate = config.provider_settings("replicate");
    assert_eq!(replicate.base_url, "https://api.replicate.com/v1");

    assert!(config.provider_settings("nonexistent").base_url.is_empty());
}

#[test]
fn test_partial_override_keeps_other_defaults() {
    let config = ScriptoriumConfig::from_toml_str(
        r#"
llm_provider_validation = "openai"
llm_model_validation = "gpt-4o-mini"
use_local_context = false
context_length = 2000

[providers.ollama]
base_url = "http://gpu-box:11434"
"#,
    )
    .unwrap();

    assert_eq!(
        config.validation(),
        ModelSelection::new("openai", "gpt-4o-mini")
    );
    assert_eq!(config.generation(), ModelSelection::new("ollama", "gemma2:27b"));
    assert!(!config.use_local_context);
    assert_eq!(config.context_length, Some(2000));
    assert_eq!(
        config.provider_settings("ollama").base_url,
        "http://gpu-box:11434"
    );
    // Sibling providers survive a partial [providers] table.
    assert_eq!(
        config.provider_settings("openai").base_url,
        "https://api.openai.com/v1"
    );
}

#[test]
fn test_config_from_file() {
    use std::io::Write;
    use tempfile::Builder;

    let mut temp_file = Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(
        temp_file,
        r#"
genre = "space opera"
max_scene_iterations = 2

[paths]
input_dir = "story"
"#
    )
    .unwrap();

    let config = ScriptoriumConfig::from_file(temp_file.path()).unwrap();

    assert_eq!(config.genre, "space opera");
    assert_eq!(config.max_scene_iterations, 2);
    assert_eq!(config.paths.input_dir, PathBuf::from("story"));
    assert_eq!(config.paths.output_dir, PathBuf::from("output"));
}

#[test]
fn test_missing_explicit_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.toml");

    assert!(ScriptoriumConfig::from_file(&missing).is_err());
}

#[test]
fn test_invalid_values_rejected() {
    assert!(ScriptoriumConfig::from_toml_str("max_json_attempts = 0").is_err());
    assert!(ScriptoriumConfig::from_toml_str("context_length = 0").is_err());
    assert!(ScriptoriumConfig::from_toml_str("good_scene_threshold = 101").is_err());
}

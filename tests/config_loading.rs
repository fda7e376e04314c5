use std::io::Write;

use wayfarer_core::config::AppConfig;
use wayfarer_core::error::WayfarerError;

#[test]
fn test_load_full_config_from_file() {
    let toml_content = r#"
[model]
provider = "groq"
model_id = "llama-3.3-70b-versatile"
api_key = "gsk-test-key"
max_tokens = 2048
temperature = 0.2

[model.retry]
max_retries = 5
initial_backoff_ms = 200

[[fallback_models]]
provider = "openai"
model_id = "gpt-4o-mini"
api_key = "sk-fallback"

[places]
api_key = "places-key"
max_results = 2

[places.aliases]
lisbon = ["Lisboa"]

[search]
api_key = "tvly-key"

[workflow]
max_flight_attempts = 4
max_steps = 40

[output]
dir = "/tmp/wayfarer-out"

[log]
level = 3
log_dir = "/tmp/wayfarer-logs"
"#;

    let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
    tmp.write_all(toml_content.as_bytes()).expect("write toml");

    let config = AppConfig::load(tmp.path()).expect("load config");

    assert_eq!(config.model.provider, "groq");
    assert_eq!(config.model.model_id, "llama-3.3-70b-versatile");
    assert_eq!(config.model.api_key, Some("gsk-test-key".to_string()));
    assert_eq!(config.model.max_tokens, 2048);

    let retry = config.model.retry.as_ref().expect("retry present");
    assert_eq!(retry.max_retries, 5);
    assert_eq!(retry.initial_backoff_ms, 200);
    assert_eq!(retry.max_backoff_ms, 30000);

    assert_eq!(config.fallback_models.len(), 1);
    assert_eq!(config.fallback_models[0].model_id, "gpt-4o-mini");

    let places = config.places.as_ref().expect("places present");
    assert_eq!(places.max_results, 2);
    assert_eq!(places.aliases["lisbon"], vec!["Lisboa"]);

    let search = config.search.as_ref().expect("search present");
    assert_eq!(search.provider, "tavily");
    assert_eq!(search.max_results, 5);

    assert_eq!(config.workflow.max_flight_attempts, 4);
    assert_eq!(config.workflow.max_steps, 40);
    assert_eq!(config.output_dir().to_str(), Some("/tmp/wayfarer-out"));

    let log = config.log.as_ref().expect("log present");
    assert!(log.enabled);
    assert_eq!(log.level, 3);
    assert_eq!(config.log_dir().to_str(), Some("/tmp/wayfarer-logs"));
}

#[test]
fn test_env_var_expansion_in_config() {
    std::env::set_var("WAYFARER_TEST_API_KEY", "expanded-key-value");

    let toml_content = r#"
[model]
model_id = "test-model"
api_key = "${WAYFARER_TEST_API_KEY}"
"#;

    let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
    tmp.write_all(toml_content.as_bytes()).expect("write toml");

    let config = AppConfig::load(tmp.path()).expect("load config");
    assert_eq!(config.model.api_key, Some("expanded-key-value".to_string()));

    std::env::remove_var("WAYFARER_TEST_API_KEY");
}

#[test]
fn test_minimal_config_uses_defaults() {
    let toml_content = r#"
[model]
model_id = "llama3.2"
"#;

    let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
    tmp.write_all(toml_content.as_bytes()).expect("write toml");

    let config = AppConfig::load(tmp.path()).expect("load config");

    assert_eq!(config.model.provider, "groq");
    assert_eq!(config.model.temperature, 0.0);
    assert!(config.model.retry.is_none());
    assert!(config.fallback_models.is_empty());
    assert!(config.places.is_none());
    assert!(config.search.is_none());
    assert!(config.log.is_none());
    assert_eq!(config.workflow.max_flight_attempts, 3);
    assert_eq!(config.workflow.max_steps, 64);
    assert_eq!(config.output_dir().to_str(), Some("outputs"));
    assert_eq!(config.log_dir().to_str(), Some("logs"));
}

#[test]
fn test_missing_file_is_config_not_found() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let err = AppConfig::load(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, WayfarerError::ConfigNotFound(_)));
}

#[test]
fn test_masked_config_serializes_without_secrets() {
    let toml_content = r#"
[model]
model_id = "llama3.2"
api_key = "gsk-very-secret"

[search]
api_key = "tvly-very-secret"
"#;
    let config = AppConfig::from_toml(toml_content).expect("parse config");
    let shown = toml::to_string_pretty(&config.masked()).expect("serialize");

    assert!(!shown.contains("very-secret"));
    assert!(shown.contains("gsk-****"));
    assert!(shown.contains("tvly****"));
}

use std::env;
use std::fs;
use std::path::Path;

use secrecy::ExposeSecret;
use skyhop_core::config::{resolve_config_path, AppConfig, LoadOptions};
use toml::Value;

struct FieldLine {
    key: &'static str,
    value: String,
    env_keys: &'static [&'static str],
}

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = resolve_config_path(None);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for field in fields(&config) {
        let source = field_source(
            field.key,
            field.env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(render_line(field.key, &field.value, source));
    }

    lines.join("\n")
}

fn fields(config: &AppConfig) -> Vec<FieldLine> {
    let api_key = config
        .llm
        .api_key
        .as_ref()
        .map(|key| redact_key(key.expose_secret()))
        .unwrap_or_else(|| "<unset>".to_string());

    vec![
        FieldLine {
            key: "budget.limit",
            value: config.budget.limit.to_string(),
            env_keys: &["SKYHOP_BUDGET_LIMIT"],
        },
        FieldLine {
            key: "budget.currency",
            value: config.budget.currency.clone(),
            env_keys: &["SKYHOP_BUDGET_CURRENCY"],
        },
        FieldLine {
            key: "catalog.mode",
            value: format!("{:?}", config.catalog.mode),
            env_keys: &["SKYHOP_CATALOG_MODE"],
        },
        FieldLine {
            key: "catalog.max_results",
            value: config.catalog.max_results.to_string(),
            env_keys: &["SKYHOP_CATALOG_MAX_RESULTS"],
        },
        FieldLine {
            key: "llm.provider",
            value: config.llm.provider.as_str().to_string(),
            env_keys: &["SKYHOP_LLM_PROVIDER"],
        },
        FieldLine {
            key: "llm.api_key",
            value: api_key,
            env_keys: &["SKYHOP_LLM_API_KEY", "OPENAI_API_KEY"],
        },
        FieldLine {
            key: "llm.base_url",
            value: config.llm.base_url.clone(),
            env_keys: &["SKYHOP_LLM_BASE_URL"],
        },
        FieldLine {
            key: "llm.model",
            value: config.llm.model.clone(),
            env_keys: &["SKYHOP_LLM_MODEL", "OPENAI_MODEL"],
        },
        FieldLine {
            key: "llm.temperature",
            value: config.llm.temperature.to_string(),
            env_keys: &["SKYHOP_LLM_TEMPERATURE", "AGENT_TEMPERATURE"],
        },
        FieldLine {
            key: "llm.timeout_secs",
            value: config.llm.timeout_secs.to_string(),
            env_keys: &["SKYHOP_LLM_TIMEOUT_SECS"],
        },
        FieldLine {
            key: "llm.max_iterations",
            value: config.llm.max_iterations.to_string(),
            env_keys: &["SKYHOP_LLM_MAX_ITERATIONS"],
        },
        FieldLine {
            key: "server.bind_address",
            value: config.server.bind_address.clone(),
            env_keys: &["SKYHOP_SERVER_BIND_ADDRESS"],
        },
        FieldLine {
            key: "server.port",
            value: config.server.port.to_string(),
            env_keys: &["SKYHOP_SERVER_PORT"],
        },
        FieldLine {
            key: "server.environment",
            value: config.server.environment.clone(),
            env_keys: &["SKYHOP_SERVER_ENVIRONMENT"],
        },
        FieldLine {
            key: "server.graceful_shutdown_secs",
            value: config.server.graceful_shutdown_secs.to_string(),
            env_keys: &["SKYHOP_SERVER_GRACEFUL_SHUTDOWN_SECS"],
        },
        FieldLine {
            key: "logging.level",
            value: config.logging.level.clone(),
            env_keys: &["SKYHOP_LOGGING_LEVEL", "SKYHOP_LOG_LEVEL"],
        },
        FieldLine {
            key: "logging.format",
            value: format!("{:?}", config.logging.format),
            env_keys: &["SKYHOP_LOGGING_FORMAT", "SKYHOP_LOG_FORMAT"],
        },
    ]
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

fn redact_key(key: &str) -> String {
    let trimmed = key.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Some((prefix, _)) = trimmed.split_once('-') {
        return format!("{prefix}-***");
    }

    "<redacted>".to_string()
}

#[cfg(test)]
mod tests {
    use toml::Value;

    use super::{contains_path, redact_key};

    #[test]
    fn redaction_keeps_only_the_key_prefix() {
        assert_eq!(redact_key("sk-live-123456"), "sk-***");
        assert_eq!(redact_key("opaque"), "<redacted>");
        assert_eq!(redact_key("  "), "<empty>");
    }

    #[test]
    fn nested_paths_are_found_in_the_file_document() {
        let doc = "[budget]\nlimit = 750\n".parse::<Value>().expect("toml");
        assert!(contains_path(&doc, "budget.limit"));
        assert!(!contains_path(&doc, "budget.currency"));
        assert!(!contains_path(&doc, "llm.model"));
    }
}

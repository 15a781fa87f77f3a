use std::path::PathBuf;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Every variable is optional; unparsable values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// Directory holding the bundled sample standards packs (`*.json`).
    pub packs_dir: PathBuf,
    /// Upper bound on `numQuestions`; keeps the answer key grid on one page.
    pub max_questions: usize,
    /// Upper bound on `topic` length in characters. The topic is repeated in the stem
    /// and every choice, so it bounds the height of one question.
    pub max_topic_chars: usize,
    /// Product name stamped into every page footer.
    pub product_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: 8080,
            rust_log: "info".to_string(),
            packs_dir: PathBuf::from("packs"),
            max_questions: 30,
            max_topic_chars: 200,
            product_name: "DynamicSheets4Teach™".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        let defaults = Config::default();

        Ok(Config {
            port: parse_env("PORT", defaults.port)
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or(defaults.rust_log),
            packs_dir: std::env::var("PACKS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.packs_dir),
            max_questions: parse_env("MAX_QUESTIONS", defaults.max_questions)
                .context("MAX_QUESTIONS must be a positive integer")?,
            max_topic_chars: parse_env("MAX_TOPIC_CHARS", defaults.max_topic_chars)
                .context("MAX_TOPIC_CHARS must be a positive integer")?,
            product_name: std::env::var("PRODUCT_NAME").unwrap_or(defaults.product_name),
        })
    }
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has invalid value '{raw}'")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.max_questions, 30);
        assert_eq!(config.max_topic_chars, 200);
        assert_eq!(config.packs_dir, PathBuf::from("packs"));
        assert!(config.product_name.starts_with("DynamicSheets4Teach"));
    }

    #[test]
    fn test_parse_env_missing_uses_default() {
        let value: u16 = parse_env("WORKSHEETS_TEST_UNSET_VARIABLE", 42).unwrap();
        assert_eq!(value, 42);
    }
}

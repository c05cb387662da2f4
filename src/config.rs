use crate::llm::{claude::ClaudeConfig, gemini::GeminiConfig, openai::OpenAiConfig, Provider};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Service settings. Every flag can also come from the environment or `.env`.
#[derive(Debug, Clone, Parser)]
#[command(name = "catalog-chat", about = "Product catalog API with an AI chat assistant")]
pub struct Config {
    #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1:8000")]
    pub bind_addr: SocketAddr,

    #[arg(long, env = "DATABASE_PATH", default_value = "catalog.db")]
    pub database_path: PathBuf,

    /// Model as `<provider>/<model>`; provider is one of gemini, openai, ollama, claude.
    #[arg(long, env = "LLM_MODEL", default_value = "gemini/gemini-2.5-flash")]
    pub model: String,

    #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true)]
    pub google_api_key: Option<String>,

    #[arg(long, env = "GEMINI_BASE_URL", default_value = crate::llm::gemini::DEFAULT_BASE_URL)]
    pub gemini_base_url: String,

    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    #[arg(long, env = "OPENAI_BASE_URL", default_value = "https://api.openai.com/v1")]
    pub openai_base_url: String,

    #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    pub anthropic_api_key: Option<String>,

    #[arg(long, env = "ANTHROPIC_BASE_URL", default_value = "https://api.anthropic.com")]
    pub anthropic_base_url: String,

    #[arg(long, env = "OLLAMA_HOST", default_value = "http://localhost:11434")]
    pub ollama_host: String,

    #[arg(
        long,
        env = "CORS_ORIGINS",
        value_delimiter = ',',
        default_value = "http://localhost:3000,http://localhost:5173"
    )]
    pub cors_origins: Vec<String>,

    /// Markdown description of the catalog schema appended to the system instruction.
    #[arg(long, env = "SCHEMA_DOC")]
    pub schema_doc: Option<PathBuf>,

    #[arg(long, env = "PROJECT_NAME", default_value = "Jeans Product API")]
    pub project_name: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is not configured")]
    MissingApiKey(&'static str),
    #[error("unknown model provider '{0}'")]
    UnknownProvider(String),
}

impl Config {
    /// Resolves `model` into a provider and the provider-side model id.
    /// A bare model name is treated as a Gemini model.
    pub fn resolve_provider(&self) -> Result<(Provider, String), ConfigError> {
        let (prefix, model_id) = match self.model.split_once('/') {
            Some((prefix, model_id)) => (prefix, model_id),
            None => ("gemini", self.model.as_str()),
        };

        let provider = match prefix {
            "gemini" => Provider::Gemini(GeminiConfig {
                api_key: require(&self.google_api_key, "GOOGLE_API_KEY")?,
                base_url: self.gemini_base_url.clone(),
            }),
            "openai" => Provider::OpenAi(OpenAiConfig {
                api_key: require(&self.openai_api_key, "OPENAI_API_KEY")?,
                base_url: self.openai_base_url.clone(),
            }),
            "claude" => Provider::Claude(ClaudeConfig {
                api_key: require(&self.anthropic_api_key, "ANTHROPIC_API_KEY")?,
                base_url: self.anthropic_base_url.clone(),
            }),
            "ollama" => Provider::ollama(self.ollama_host.clone()),
            other => return Err(ConfigError::UnknownProvider(other.to_string())),
        };

        Ok((provider, model_id.to_string()))
    }
}

fn require(value: &Option<String>, name: &'static str) -> Result<String, ConfigError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or(ConfigError::MissingApiKey(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(args: &[&str]) -> Config {
        let mut argv = vec!["catalog-chat"];
        argv.extend_from_slice(args);
        Config::try_parse_from(argv).unwrap()
    }

    #[test]
    fn defaults_are_sensible() {
        let config = config(&["--google-api-key", "k"]);

        assert_eq!(config.bind_addr.port(), 8000);
        assert_eq!(config.cors_origins.len(), 2);
        assert_eq!(config.model, "gemini/gemini-2.5-flash");
    }

    #[test]
    fn provider_prefix_selects_backend() {
        let config = config(&["--model", "openai/gpt-4o-mini", "--openai-api-key", "sk-test"]);

        let (provider, model_id) = config.resolve_provider().unwrap();

        assert_eq!(provider.name(), "openai");
        assert_eq!(model_id, "gpt-4o-mini");
    }

    #[test]
    fn bare_model_name_means_gemini() {
        let config = config(&["--model", "gemini-2.5-pro", "--google-api-key", "g"]);

        let (provider, model_id) = config.resolve_provider().unwrap();

        assert_eq!(provider.name(), "gemini");
        assert_eq!(model_id, "gemini-2.5-pro");
    }

    #[test]
    fn ollama_needs_no_key() {
        let config = config(&["--model", "ollama/llama3.1"]);

        let (provider, _) = config.resolve_provider().unwrap();

        assert_eq!(provider.name(), "ollama");
    }

    #[test]
    fn missing_key_and_unknown_provider_are_errors() {
        let missing = config(&["--model", "claude/claude-sonnet-4", "--anthropic-api-key", " "]);
        let unknown = config(&["--model", "mystery/model"]);

        assert!(matches!(
            missing.resolve_provider(),
            Err(ConfigError::MissingApiKey("ANTHROPIC_API_KEY"))
        ));
        assert!(matches!(
            unknown.resolve_provider(),
            Err(ConfigError::UnknownProvider(p)) if p == "mystery"
        ));
    }
}

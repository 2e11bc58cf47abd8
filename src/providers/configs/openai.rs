use super::base::ProviderConfig;
use anyhow::{anyhow, Result};

pub const OPENAI_DEFAULT_HOST: &str = "https://api.openai.com";
pub const OPENAI_DEFAULT_MODEL: &str = "gpt-4o";

#[derive(Debug, Clone, PartialEq)]
pub struct OpenAiProviderConfig {
    pub api_key: String,
    pub host: String,
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<i32>,
}

impl OpenAiProviderConfig {
    pub fn new(api_key: String, host: String, model: String) -> Self {
        Self {
            api_key,
            host,
            model,
            temperature: None,
            max_tokens: None,
        }
    }

    /// Environment configuration with an explicitly supplied key taking
    /// precedence over `OPENAI_API_KEY`
    pub fn from_env_with(api_key: Option<String>) -> Result<Self> {
        let api_key = match api_key.filter(|key| !key.trim().is_empty()) {
            Some(key) => key,
            None => Self::get_env("OPENAI_API_KEY", true, None)?
                .filter(|key| !key.trim().is_empty())
                .ok_or_else(|| anyhow!("OpenAI API key should be present"))?,
        };

        let host = Self::get_env("OPENAI_API_HOST", false, None)?
            .unwrap_or_else(|| OPENAI_DEFAULT_HOST.to_string());

        let model = Self::get_env("OPENAI_MODEL", false, None)?
            .unwrap_or_else(|| OPENAI_DEFAULT_MODEL.to_string());

        Ok(Self {
            api_key,
            host,
            model,
            temperature: Self::parse_env("OPENAI_TEMPERATURE")?,
            max_tokens: Self::parse_env("OPENAI_MAX_TOKENS")?,
        })
    }

    /// Full URL of the chat-completion endpoint, tolerant of a trailing slash on the host
    pub fn completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.host.trim_end_matches('/'))
    }
}

impl ProviderConfig for OpenAiProviderConfig {
    fn from_env() -> Result<Self> {
        Self::from_env_with(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completions_url() {
        let mut config = OpenAiProviderConfig::new(
            "key".to_string(),
            "https://api.openai.com/".to_string(),
            OPENAI_DEFAULT_MODEL.to_string(),
        );
        assert_eq!(
            config.completions_url(),
            "https://api.openai.com/v1/chat/completions"
        );

        config.host = "http://127.0.0.1:1234".to_string();
        assert_eq!(config.completions_url(), "http://127.0.0.1:1234/v1/chat/completions");
    }

    #[test]
    fn test_explicit_api_key_wins() -> Result<()> {
        let config = OpenAiProviderConfig::from_env_with(Some("sk-explicit".to_string()))?;
        assert_eq!(config.api_key, "sk-explicit");
        assert!(!config.host.is_empty());
        assert!(!config.model.is_empty());
        Ok(())
    }

    #[test]
    fn test_parse_env() -> Result<()> {
        std::env::set_var("TALLY_TEST_MAX_TOKENS", "256");
        std::env::set_var("TALLY_TEST_BAD_TEMPERATURE", "warm");

        let tokens: Option<i32> = OpenAiProviderConfig::parse_env("TALLY_TEST_MAX_TOKENS")?;
        assert_eq!(tokens, Some(256));

        let missing: Option<f32> = OpenAiProviderConfig::parse_env("TALLY_TEST_UNSET_VALUE")?;
        assert_eq!(missing, None);

        let bad = OpenAiProviderConfig::parse_env::<f32>("TALLY_TEST_BAD_TEMPERATURE");
        assert!(bad.unwrap_err().to_string().contains("invalid value 'warm'"));

        std::env::remove_var("TALLY_TEST_MAX_TOKENS");
        std::env::remove_var("TALLY_TEST_BAD_TEMPERATURE");
        Ok(())
    }

    #[test]
    fn test_get_env_required() {
        let result = OpenAiProviderConfig::get_env("TALLY_TEST_REQUIRED_UNSET", true, None);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("is required but not set"));
    }
}

use std::{env, time::Duration};

const PLACEHOLDER_ENDPOINT: &str = "YOUR_GOOGLE_APPS_SCRIPT_URL_HERE";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    pub sheet_endpoint: Option<String>,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub http_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let value = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty())
        };

        let sheet_endpoint = value("SHEET_ENDPOINT").filter(|url| !url.contains(PLACEHOLDER_ENDPOINT));
        let port = value("PORT")
            .and_then(|raw| raw.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);
        let http_timeout = value("HTTP_TIMEOUT_SECS")
            .and_then(|raw| raw.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Self {
            port,
            sheet_endpoint,
            gemini_api_key: value("GEMINI_API_KEY").or_else(|| value("API_KEY")),
            gemini_model: value("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            gemini_base_url: value("GEMINI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
            http_timeout: Duration::from_secs(http_timeout),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_environment_is_empty() {
        let config = config_from(&[]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.sheet_endpoint, None);
        assert_eq!(config.gemini_api_key, None);
        assert_eq!(config.gemini_model, DEFAULT_GEMINI_MODEL);
        assert_eq!(config.http_timeout, Duration::from_secs(15));
    }

    #[test]
    fn placeholder_and_blank_endpoints_count_as_unconfigured() {
        let placeholder = config_from(&[(
            "SHEET_ENDPOINT",
            "https://script.google.com/YOUR_GOOGLE_APPS_SCRIPT_URL_HERE",
        )]);
        assert_eq!(placeholder.sheet_endpoint, None);

        let blank = config_from(&[("SHEET_ENDPOINT", "   ")]);
        assert_eq!(blank.sheet_endpoint, None);
    }

    #[test]
    fn api_key_falls_back_to_generic_variable() {
        let config = config_from(&[("API_KEY", "secret"), ("PORT", "9000")]);
        assert_eq!(config.gemini_api_key.as_deref(), Some("secret"));
        assert_eq!(config.port, 9000);

        let both = config_from(&[("API_KEY", "generic"), ("GEMINI_API_KEY", "specific")]);
        assert_eq!(both.gemini_api_key.as_deref(), Some("specific"));
    }
}

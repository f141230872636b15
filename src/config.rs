use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_VIACEP_BASE_URL: &str = "https://viacep.com.br";
pub const DEFAULT_CNPJA_BASE_URL: &str = "https://open.cnpja.com";
pub const DEFAULT_SUBMISSION_WEBHOOK_URL: &str =
    "https://boxdesk.app.n8n.cloud/webhook-test/contato/f1";
pub const DEFAULT_SUPPORT_CHAT_URL: &str = "https://1550.3cx.cloud/boxdesk/";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub viacep_base_url: String,
    pub cnpja_base_url: String,
    pub submission_webhook_url: String,
    pub support_chat_url: String,
    /// Artificial pause between posting the payload and showing the confirmation.
    pub submit_delay_ms: u64,
    /// How long the confirmation stays up before the form returns to editing.
    pub confirmation_dwell_ms: u64,
    /// Drop lookup responses superseded by a newer request for the same field.
    pub discard_stale_lookups: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            viacep_base_url: DEFAULT_VIACEP_BASE_URL.to_string(),
            cnpja_base_url: DEFAULT_CNPJA_BASE_URL.to_string(),
            submission_webhook_url: DEFAULT_SUBMISSION_WEBHOOK_URL.to_string(),
            support_chat_url: DEFAULT_SUPPORT_CHAT_URL.to_string(),
            submit_delay_ms: 1500,
            confirmation_dwell_ms: 3000,
            discard_stale_lookups: true,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        let config = Self {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| defaults.port.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            viacep_base_url: url_var("VIACEP_BASE_URL", defaults.viacep_base_url)?,
            cnpja_base_url: url_var("CNPJA_BASE_URL", defaults.cnpja_base_url)?,
            submission_webhook_url: url_var(
                "SUBMISSION_WEBHOOK_URL",
                defaults.submission_webhook_url,
            )?,
            support_chat_url: url_var("SUPPORT_CHAT_URL", defaults.support_chat_url)?,
            submit_delay_ms: std::env::var("SUBMIT_DELAY_MS")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(|s| s.trim().parse::<u64>())
                .transpose()
                .map_err(|_| anyhow::anyhow!("SUBMIT_DELAY_MS must be a number of milliseconds"))?
                .unwrap_or(defaults.submit_delay_ms),
            confirmation_dwell_ms: std::env::var("CONFIRMATION_DWELL_MS")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(|s| s.trim().parse::<u64>())
                .transpose()
                .map_err(|_| {
                    anyhow::anyhow!("CONFIRMATION_DWELL_MS must be a number of milliseconds")
                })?
                .unwrap_or(defaults.confirmation_dwell_ms),
            discard_stale_lookups: std::env::var("DISCARD_STALE_LOOKUPS")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(|s| parse_bool(&s))
                .transpose()?
                .unwrap_or(defaults.discard_stale_lookups),
        };

        tracing::info!("Configuration loaded successfully");
        tracing::debug!("ViaCEP Base URL: {}", config.viacep_base_url);
        tracing::debug!("CNPJá Base URL: {}", config.cnpja_base_url);
        tracing::debug!("Submission webhook: {}", config.submission_webhook_url);
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }

    pub fn submit_delay(&self) -> Duration {
        Duration::from_millis(self.submit_delay_ms)
    }

    pub fn confirmation_dwell(&self) -> Duration {
        Duration::from_millis(self.confirmation_dwell_ms)
    }
}

/// Read an optional URL variable, falling back to `default` when unset or blank.
fn url_var(name: &str, default: String) -> anyhow::Result<String> {
    let Some(url) = std::env::var(name).ok().filter(|s| !s.trim().is_empty()) else {
        return Ok(default);
    };
    validate_url(name, url)
}

fn validate_url(name: &str, url: String) -> anyhow::Result<String> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        anyhow::bail!("{} must start with http:// or https://", name);
    }
    Ok(url.trim_end_matches('/').to_string())
}

fn parse_bool(raw: &str) -> anyhow::Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("DISCARD_STALE_LOOKUPS must be a boolean, got '{}'", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_form_constants() {
        let config = Config::default();
        assert_eq!(config.submit_delay(), Duration::from_millis(1500));
        assert_eq!(config.confirmation_dwell(), Duration::from_secs(3));
        assert!(config.discard_stale_lookups);
        assert_eq!(config.viacep_base_url, "https://viacep.com.br");
    }

    #[test]
    fn test_validate_url() {
        assert_eq!(
            validate_url("X", "http://localhost:8080/".to_string()).unwrap(),
            "http://localhost:8080"
        );
        assert!(validate_url("X", "ftp://example.com".to_string()).is_err());
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("TRUE").unwrap());
        assert!(!parse_bool("0").unwrap());
        assert!(parse_bool("maybe").is_err());
    }
}

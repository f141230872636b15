use crate::errors::AppError;
use crate::models::ContactRecord;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use url::Url;

/// Body posted to the registration webhook.
///
/// `{ "tipoContato": ..., <every field of the active record>, "dataEnvio": ... }`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionPayload {
    pub tipo_contato: &'static str,
    #[serde(flatten)]
    pub record: ContactRecord,
    /// ISO-8601 UTC timestamp with milliseconds.
    pub data_envio: String,
}

impl SubmissionPayload {
    pub fn new(record: ContactRecord, sent_at: DateTime<Utc>) -> Self {
        Self {
            tipo_contato: record.person_type().label(),
            record,
            data_envio: sent_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

/// Client for the registration webhook.
#[derive(Clone)]
pub struct WebhookClient {
    client: reqwest::Client,
    url: Url,
}

impl WebhookClient {
    /// Creates a new `WebhookClient`.
    ///
    /// No request timeout is configured; the platform default applies.
    pub fn new(webhook_url: &str) -> Result<Self, AppError> {
        let url = Url::parse(webhook_url).map_err(|e| {
            AppError::InternalError(format!("Invalid webhook URL '{}': {}", webhook_url, e))
        })?;

        Ok(Self {
            client: reqwest::Client::new(),
            url,
        })
    }

    /// Posts a submission. The response body is ignored; only the status is
    /// inspected.
    pub async fn send(&self, payload: &SubmissionPayload) -> Result<(), AppError> {
        tracing::info!(
            "Posting {} registration to webhook {}",
            payload.tipo_contato,
            self.url
        );

        let response = self
            .client
            .post(self.url.clone())
            .header("Content-Type", "application/json")
            .json(payload)
            .send()
            .await
            .map_err(|e| AppError::ExternalApiError(format!("Failed to send registration: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AppError::ExternalApiError(format!(
                "Webhook returned {}",
                status
            )));
        }

        tracing::info!("✓ Registration delivered to webhook");
        Ok(())
    }
}

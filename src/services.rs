use crate::config::Config;
use crate::errors::AppError;
use crate::formatters::{digits_only, CEP_DIGITS, CNPJ_DIGITS};
use crate::models::{AddressLookupResult, CnpjaOfficeResponse, CompanyLookupResult, ViaCepResponse};
use reqwest::Client;

/// Client for the ViaCEP postal-code service.
#[derive(Clone)]
pub struct ViaCepService {
    client: Client,
    base_url: String,
}

impl ViaCepService {
    pub fn new(config: &Config) -> Self {
        Self::with_client(Client::new(), config)
    }

    pub fn with_client(client: Client, config: &Config) -> Self {
        Self {
            client,
            base_url: config.viacep_base_url.clone(),
        }
    }

    /// Look up the address for a CEP.
    ///
    /// Accepts formatted or raw input. Returns `Ok(None)` when ViaCEP answers
    /// with its `erro` flag (the CEP does not exist).
    pub async fn lookup(&self, cep: &str) -> Result<Option<AddressLookupResult>, AppError> {
        let digits = digits_only(cep);
        if digits.len() != CEP_DIGITS {
            return Err(AppError::BadRequest(format!(
                "CEP must have {} digits, got {}",
                CEP_DIGITS,
                digits.len()
            )));
        }

        let url = format!("{}/ws/{}/json/", self.base_url, digits);
        tracing::info!("Fetching address from ViaCEP for CEP: {}", digits);
        tracing::debug!("ViaCEP URL: {}", url);

        let response =
            self.client.get(&url).send().await.map_err(|e| {
                AppError::ExternalApiError(format!("ViaCEP request failed: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::error!("ViaCEP returned error {}: {}", status, error_text);
            return Err(AppError::ExternalApiError(format!(
                "ViaCEP returned status {}: {}",
                status, error_text
            )));
        }

        let body: ViaCepResponse = response.json().await.map_err(|e| {
            AppError::ExternalApiError(format!("Failed to parse ViaCEP response: {}", e))
        })?;

        match body.into_result() {
            Some(result) => {
                tracing::info!("✓ CEP {} resolved to {} / {}", digits, result.city, result.state);
                Ok(Some(result))
            }
            None => {
                tracing::warn!("CEP {} not found on ViaCEP", digits);
                Ok(None)
            }
        }
    }
}

/// Client for the CNPJá open company registry.
#[derive(Clone)]
pub struct CnpjaService {
    client: Client,
    base_url: String,
}

impl CnpjaService {
    pub fn new(config: &Config) -> Self {
        Self::with_client(Client::new(), config)
    }

    pub fn with_client(client: Client, config: &Config) -> Self {
        Self {
            client,
            base_url: config.cnpja_base_url.clone(),
        }
    }

    /// Look up a company by CNPJ.
    ///
    /// Non-success statuses and bodies without a `taxId` both come back as
    /// `Ok(None)`; only transport and parse failures are errors.
    pub async fn lookup(&self, cnpj: &str) -> Result<Option<CompanyLookupResult>, AppError> {
        let digits = digits_only(cnpj);
        if digits.len() != CNPJ_DIGITS {
            return Err(AppError::BadRequest(format!(
                "CNPJ must have {} digits, got {}",
                CNPJ_DIGITS,
                digits.len()
            )));
        }

        let url = format!("{}/office/{}", self.base_url, digits);
        tracing::info!("Fetching company from CNPJá for CNPJ: {}", digits);
        tracing::debug!("CNPJá URL: {}", url);

        let response =
            self.client.get(&url).send().await.map_err(|e| {
                AppError::ExternalApiError(format!("CNPJá request failed: {}", e))
            })?;

        if !response.status().is_success() {
            tracing::warn!(
                "CNPJá returned non-success status {} for {}",
                response.status(),
                digits
            );
            return Ok(None);
        }

        let body: CnpjaOfficeResponse = response.json().await.map_err(|e| {
            AppError::ExternalApiError(format!("Failed to parse CNPJá response: {}", e))
        })?;

        match body.into_result() {
            Some(result) => {
                tracing::info!("✓ CNPJ {} resolved", digits);
                Ok(Some(result))
            }
            None => {
                tracing::warn!("CNPJá response for {} has no taxId", digits);
                Ok(None)
            }
        }
    }
}

//! Geolocation lookup for candidate addresses
//!
//! Each address is resolved through a primary provider (ip-api.com JSON
//! protocol) and, when that fails for any reason, a fallback provider
//! (ipapi.co plain text protocol). A lookup never fails the batch: when both
//! providers fail the language's placeholder label is used instead.

mod countries;
mod providers;

pub use countries::translate_country;
pub use providers::{GeoProvider, IpApiProvider, IpApiCoProvider};

use crate::{
    error::{AppError, Result},
    logging::ProbeLogger,
    models::Config,
    types::Language,
};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

/// Location reported by a provider, names as the provider spelled them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub country: String,
    pub region: Option<String>,
    pub city: Option<String>,
}

impl GeoLocation {
    pub fn country(country: impl Into<String>) -> Self {
        Self {
            country: country.into(),
            region: None,
            city: None,
        }
    }

    /// Label used in the report.
    ///
    /// The country is translated for [`Language::Chinese`]; with `detail`
    /// region and city follow, joined by `-`, skipping empty or repeated parts.
    pub fn label(&self, language: Language, detail: bool) -> String {
        let country = match language {
            Language::Chinese => translate_country(&self.country).to_string(),
            Language::English => self.country.clone(),
        };

        if !detail {
            return country;
        }

        let mut parts = vec![country];
        for part in [&self.region, &self.city].into_iter().flatten() {
            let part = part.trim();
            if !part.is_empty() && !parts.iter().any(|p| p == part) {
                parts.push(part.to_string());
            }
        }
        parts.join("-")
    }
}

/// Resolves candidate addresses to location labels
pub struct GeoLocator {
    primary: Option<Box<dyn GeoProvider>>,
    fallback: Option<Box<dyn GeoProvider>>,
    language: Language,
    detail: bool,
    logger: ProbeLogger,
}

impl GeoLocator {
    /// Build the provider chain from configuration
    pub fn new(config: &Config, logger: ProbeLogger) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.geo_timeout())
            .user_agent(crate::defaults::BROWSER_USER_AGENT)
            .build()
            .map_err(|e| AppError::geolocation(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            primary: Some(Box::new(IpApiProvider::new(client.clone(), &config.geo_primary_url))),
            fallback: Some(Box::new(IpApiCoProvider::new(client, &config.geo_fallback_url))),
            language: config.language,
            detail: config.geo_detail,
            logger,
        })
    }

    /// A locator that labels every address with the placeholder
    pub fn disabled(language: Language, logger: ProbeLogger) -> Self {
        Self {
            primary: None,
            fallback: None,
            language,
            detail: false,
            logger,
        }
    }

    /// Build a locator from explicit providers
    pub fn with_providers(
        primary: Box<dyn GeoProvider>,
        fallback: Box<dyn GeoProvider>,
        language: Language,
        detail: bool,
        logger: ProbeLogger,
    ) -> Self {
        Self {
            primary: Some(primary),
            fallback: Some(fallback),
            language,
            detail,
            logger,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.primary.is_some() || self.fallback.is_some()
    }

    /// Placeholder label for addresses that could not be located
    pub fn unknown_label(&self) -> &'static str {
        self.language.unknown_label()
    }

    /// Resolve `ip` to a report label, falling back to the placeholder
    pub async fn locate(&self, ip: Ipv4Addr) -> String {
        match self.lookup(ip).await {
            Ok(location) => location.label(self.language, self.detail),
            Err(_) => self.unknown_label().to_string(),
        }
    }

    /// Try the primary provider, then the fallback
    pub async fn lookup(&self, ip: Ipv4Addr) -> Result<GeoLocation> {
        let ip_str = ip.to_string();
        let mut last_error = AppError::geolocation("geolocation disabled");

        for provider in [&self.primary, &self.fallback].into_iter().flatten() {
            match provider.lookup(ip).await {
                Ok(location) => {
                    self.logger.log_geo_success(provider.name(), &ip_str, &location.country).await;
                    return Ok(location);
                }
                Err(e) => {
                    self.logger.log_geo_failure(provider.name(), &ip_str, &e).await;
                    last_error = e;
                }
            }
        }

        Err(last_error)
    }
}

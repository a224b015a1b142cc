//! Geolocation provider protocols

use super::GeoLocation;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use std::net::Ipv4Addr;

/// Fields requested from the ip-api.com protocol
pub const IP_API_FIELDS: &str = "status,message,country,regionName,city";

const BODY_PREVIEW_CHARS: usize = 50;

/// A service that maps an address to a location
#[async_trait]
pub trait GeoProvider: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    async fn lookup(&self, ip: Ipv4Addr) -> Result<GeoLocation>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IpApiResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    region_name: Option<String>,
    #[serde(default)]
    city: Option<String>,
}

/// JSON protocol: `GET {base}/json/{ip}?fields=...`
pub struct IpApiProvider {
    client: Client,
    base_url: String,
}

impl IpApiProvider {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl GeoProvider for IpApiProvider {
    fn name(&self) -> &'static str {
        "ip-api"
    }

    async fn lookup(&self, ip: Ipv4Addr) -> Result<GeoLocation> {
        let url = format!("{}/json/{}", self.base_url, ip);
        let response = self.client
            .get(&url)
            .query(&[("fields", IP_API_FIELDS)])
            .send()
            .await
            .map_err(|e| AppError::geolocation(format!("ip-api request failed: {}", e)))?;

        let body = successful_body(self.name(), response).await?;

        let parsed: IpApiResponse = serde_json::from_str(&body)
            .map_err(|e| AppError::geolocation(format!("ip-api returned malformed JSON: {}", e)))?;

        if parsed.status != "success" {
            return Err(AppError::geolocation(format!(
                "ip-api status '{}': {}",
                parsed.status,
                parsed.message.as_deref().unwrap_or("no message")
            )));
        }

        let country = parsed.country
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| AppError::geolocation("ip-api response has no country"))?;

        Ok(GeoLocation {
            country,
            region: parsed.region_name,
            city: parsed.city,
        })
    }
}

/// Plain text protocol: `GET {base}/{ip}/country_name/`
pub struct IpApiCoProvider {
    client: Client,
    base_url: String,
}

impl IpApiCoProvider {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl GeoProvider for IpApiCoProvider {
    fn name(&self) -> &'static str {
        "ipapi.co"
    }

    async fn lookup(&self, ip: Ipv4Addr) -> Result<GeoLocation> {
        let url = format!("{}/{}/country_name/", self.base_url, ip);
        let response = self.client
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::geolocation(format!("ipapi.co request failed: {}", e)))?;

        let body = successful_body(self.name(), response).await?;
        let country = body.trim();

        if country.is_empty() {
            return Err(AppError::geolocation("ipapi.co returned an empty body"));
        }

        Ok(GeoLocation::country(country))
    }
}

/// Read the body, turning non-2xx responses into errors carrying a preview
async fn successful_body(provider: &str, response: Response) -> Result<String> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| AppError::geolocation(format!("Failed to read {} response: {}", provider, e)))?;

    if !status.is_success() {
        return Err(AppError::geolocation(format!(
            "{} returned HTTP {}: {}",
            provider,
            status.as_u16(),
            preview(&body)
        )));
    }

    Ok(body)
}

fn preview(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() > BODY_PREVIEW_CHARS {
        format!("{}...", trimmed.chars().take(BODY_PREVIEW_CHARS).collect::<String>())
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{Mock, MockServer, ResponseTemplate, matchers::{method, path}};

    #[test]
    fn test_preview_truncates() {
        let long = "x".repeat(80);
        assert_eq!(preview(&long).len(), BODY_PREVIEW_CHARS + 3);
        assert_eq!(preview("  short  "), "short");
    }

    #[tokio::test]
    async fn test_error_carries_status_and_preview() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/1.1.1.1/country_name/"))
            .respond_with(ResponseTemplate::new(429).set_body_string("RateLimited"))
            .mount(&server)
            .await;

        let provider = IpApiCoProvider::new(Client::new(), &format!("{}/", server.uri()));
        let err = provider.lookup(Ipv4Addr::new(1, 1, 1, 1)).await.unwrap_err();

        assert_eq!(err.category(), "GEO");
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("RateLimited"));
    }

    #[tokio::test]
    async fn test_empty_fallback_body_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/1.1.1.1/country_name/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("  \n"))
            .mount(&server)
            .await;

        let provider = IpApiCoProvider::new(Client::new(), &server.uri());
        assert!(provider.lookup(Ipv4Addr::new(1, 1, 1, 1)).await.is_err());
    }

    #[tokio::test]
    async fn test_malformed_json_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/json/1.1.1.1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let provider = IpApiProvider::new(Client::new(), &server.uri());
        let err = provider.lookup(Ipv4Addr::new(1, 1, 1, 1)).await.unwrap_err();
        assert!(err.to_string().contains("malformed"));
    }
}

//! Best-effort IP to location lookup
//!
//! The lookup service is an untrusted third party. Every request is bounded by
//! a hard timeout and any failure falls back to the raw address, so a login
//! never depends on it.

use axum::http::HeaderMap;
use reqwest::Client;
use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};
use tracing::{debug, warn};

use crate::config::Settings;

/// Location lookup client
#[derive(Clone, Debug)]
pub struct Geolocator {
    /// `None` when lookups are disabled
    client: Option<Client>,
    url: String,
}

/// Fields of the lookup service answer we care about
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupResponse {
    status: String,
    city: Option<String>,
    region_name: Option<String>,
    country: Option<String>,
}

impl LookupResponse {
    fn describe(&self) -> Option<String> {
        if self.status != "success" {
            return None;
        }

        let parts: Vec<&str> = [&self.city, &self.region_name, &self.country]
            .into_iter()
            .filter_map(|part| part.as_deref())
            .filter(|part| !part.is_empty())
            .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(", "))
        }
    }
}

impl Geolocator {
    /// Build a geolocator from the service settings
    pub fn new(settings: &Settings) -> Self {
        if !settings.geolocation_enabled {
            return Self::disabled();
        }

        match Client::builder()
            .timeout(settings.geolocation_timeout())
            .build()
        {
            Ok(client) => Self {
                client: Some(client),
                url: settings.geolocation_url.clone(),
            },
            Err(e) => {
                warn!("Geolocation disabled, failed to build HTTP client: {}", e);
                Self::disabled()
            }
        }
    }

    /// A geolocator that always answers with the raw address
    pub fn disabled() -> Self {
        Self {
            client: None,
            url: String::new(),
        }
    }

    /// Resolve `ip` to `"city, region, country"`, or return `ip` unchanged
    pub async fn locate(&self, ip: &str) -> String {
        let Some(client) = &self.client else {
            return ip.to_string();
        };

        if !is_public(ip) {
            debug!("Skipping geolocation of non-public address {}", ip);
            return ip.to_string();
        }

        let url = self.url.replace("{ip}", ip);
        let response = match client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("Geolocation request failed: {}", e);
                return ip.to_string();
            }
        };

        match response.json::<LookupResponse>().await {
            Ok(body) => body.describe().unwrap_or_else(|| ip.to_string()),
            Err(e) => {
                warn!("Geolocation response could not be decoded: {}", e);
                ip.to_string()
            }
        }
    }
}

/// Client address: first `X-Forwarded-For` entry, then `X-Real-IP`, then the peer
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<String> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
    };

    if let Some(forwarded) = header("x-forwarded-for") {
        if let Some(first) = forwarded.split(',').map(str::trim).find(|s| !s.is_empty()) {
            return Some(first.to_string());
        }
    }

    if let Some(real_ip) = header("x-real-ip") {
        return Some(real_ip.to_string());
    }

    peer.map(|addr| addr.ip().to_string())
}

fn is_public(ip: &str) -> bool {
    match ip.parse::<IpAddr>() {
        Ok(IpAddr::V4(v4)) => {
            !(v4.is_private()
                || v4.is_loopback()
                || v4.is_link_local()
                || v4.is_unspecified()
                || v4.is_broadcast())
        }
        Ok(IpAddr::V6(v6)) => {
            let first = v6.segments()[0];
            !(v6.is_loopback()
                || v6.is_unspecified()
                || (first & 0xfe00) == 0xfc00
                || (first & 0xffc0) == 0xfe80)
        }
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn enabled(url: &str) -> Geolocator {
        let settings = Settings {
            geolocation_enabled: true,
            geolocation_url: url.to_string(),
            geolocation_timeout_seconds: 1,
            ..Settings::default()
        };
        Geolocator::new(&settings)
    }

    #[test]
    fn test_client_ip_prefers_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("198.51.100.7, 10.0.0.1"),
        );
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.8"));
        let peer = "10.0.0.2:5000".parse().ok();

        assert_eq!(client_ip(&headers, peer).as_deref(), Some("198.51.100.7"));
    }

    #[test]
    fn test_client_ip_falls_back_to_real_ip_then_peer() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.8"));
        let peer = "10.0.0.2:5000".parse().ok();

        assert_eq!(client_ip(&headers, peer).as_deref(), Some("198.51.100.8"));
        assert_eq!(
            client_ip(&HeaderMap::new(), peer).as_deref(),
            Some("10.0.0.2")
        );
        assert_eq!(client_ip(&HeaderMap::new(), None), None);
    }

    #[test]
    fn test_public_address_detection() {
        assert!(is_public("8.8.8.8"));
        assert!(is_public("2001:4860:4860::8888"));
        assert!(!is_public("127.0.0.1"));
        assert!(!is_public("192.168.1.10"));
        assert!(!is_public("::1"));
        assert!(!is_public("fd00::1"));
        assert!(!is_public("not an ip"));
    }

    #[test]
    fn test_describe_lookup_response() {
        let body: LookupResponse = serde_json::from_value(serde_json::json!({
            "status": "success",
            "city": "Douala",
            "regionName": "Littoral",
            "country": "Cameroon"
        }))
        .unwrap();
        assert_eq!(body.describe().as_deref(), Some("Douala, Littoral, Cameroon"));

        let failed: LookupResponse =
            serde_json::from_value(serde_json::json!({"status": "fail"})).unwrap();
        assert_eq!(failed.describe(), None);
    }

    #[tokio::test]
    async fn test_disabled_returns_raw_ip() {
        assert_eq!(Geolocator::disabled().locate("8.8.8.8").await, "8.8.8.8");
    }

    #[tokio::test]
    async fn test_private_address_is_not_looked_up() {
        let geolocator = enabled("http://127.0.0.1:9/{ip}");
        assert_eq!(geolocator.locate("10.1.2.3").await, "10.1.2.3");
    }

    #[tokio::test]
    async fn test_unreachable_service_falls_back_to_raw_ip() {
        let geolocator = enabled("http://127.0.0.1:9/{ip}");
        assert_eq!(geolocator.locate("8.8.8.8").await, "8.8.8.8");
    }
}

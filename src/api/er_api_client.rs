// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;

use crate::error::FetchError;
use crate::models::{RateTable, BASE_CURRENCY};

pub const DEFAULT_API_URL: &str = "https://open.er-api.com/v6";

/// Source of the latest USD-based rate table
#[async_trait::async_trait]
pub trait RateProvider: Send + Sync {
    async fn latest_rates(&self) -> Result<RateTable, FetchError>;
}

/// Client for the open.er-api.com `latest` endpoint
#[derive(Clone)]
pub struct ErApiClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct LatestResponse {
    result: String,
    #[serde(default)]
    rates: Option<HashMap<String, f64>>,
    #[serde(rename = "error-type")]
    error_type: Option<String>,
}

impl ErApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn latest_url(&self) -> String {
        format!("{}/latest/{}", self.base_url, BASE_CURRENCY)
    }
}

impl Default for ErApiClient {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}

#[async_trait::async_trait]
impl RateProvider for ErApiClient {
    async fn latest_rates(&self) -> Result<RateTable, FetchError> {
        let url = self.latest_url();
        log::debug!("GET {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        let text = response.text().await?;

        // The provider reports its own failures in the body, so look there first
        match parse_latest_response(&text) {
            Ok(table) if status.is_success() => Ok(table),
            Ok(_) => Err(FetchError::Network(format!("API request failed: {}", status))),
            Err(FetchError::Network(e)) if !status.is_success() => Err(FetchError::Network(
                format!("API request failed: {} ({})", status, e),
            )),
            Err(e) => Err(e),
        }
    }
}

/// Interpret a `latest` response body.
///
/// `result: "error"` becomes [`FetchError::ProviderError`] carrying the
/// `error-type`; anything that is not a well-formed success payload is a
/// [`FetchError::Network`].
pub fn parse_latest_response(body: &str) -> Result<RateTable, FetchError> {
    let response: LatestResponse = serde_json::from_str(body)?;

    match response.result.as_str() {
        "success" => match response.rates {
            Some(rates) => {
                let table = RateTable::new(rates);
                if table.is_empty() {
                    return Err(FetchError::Network("Response contained no rates".to_string()));
                }
                Ok(table)
            }
            None => Err(FetchError::Network(
                "Success response without rates".to_string(),
            )),
        },
        "error" => Err(FetchError::ProviderError(
            response.error_type.unwrap_or_else(|| "unknown".to_string()),
        )),
        other => Err(FetchError::Network(format!(
            "Unexpected result status: {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_success() {
        let body = r#"{
            "result": "success",
            "base_code": "USD",
            "time_last_update_unix": 1715904001,
            "rates": { "USD": 1, "EUR": 0.9, "GBP": 0.8 }
        }"#;

        let table = parse_latest_response(body).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.get("EUR"), Some(0.9));
        assert_eq!(table.get("USD"), Some(1.0));
    }

    #[test]
    fn test_parse_provider_error() {
        let body = r#"{ "result": "error", "error-type": "invalid-base" }"#;
        assert_eq!(
            parse_latest_response(body),
            Err(FetchError::ProviderError("invalid-base".to_string()))
        );

        let body = r#"{ "result": "error" }"#;
        assert_eq!(
            parse_latest_response(body),
            Err(FetchError::ProviderError("unknown".to_string()))
        );
    }

    #[test]
    fn test_parse_garbled_is_network() {
        for body in [
            "",
            "<html>502 Bad Gateway</html>",
            r#"{ "rates": { "EUR": 0.9 } }"#,
            r#"{ "result": "success" }"#,
            r#"{ "result": "success", "rates": { "EUR": "abc" } }"#,
            r#"{ "result": "success", "rates": {} }"#,
            r#"{ "result": "pending", "rates": {} }"#,
        ] {
            assert!(
                matches!(parse_latest_response(body), Err(FetchError::Network(_))),
                "expected network error for {:?}",
                body
            );
        }
    }

    #[test]
    fn test_latest_url() {
        assert_eq!(
            ErApiClient::default().latest_url(),
            "https://open.er-api.com/v6/latest/USD"
        );
        assert_eq!(
            ErApiClient::new("http://localhost:8080/v6/").latest_url(),
            "http://localhost:8080/v6/latest/USD"
        );
    }

    /// Answer a single request with the given status line and body, returning the base URL
    async fn serve_once(status: &'static str, body: &'static str) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        });

        format!("http://{}/v6", addr)
    }

    #[tokio::test]
    async fn test_client_success() {
        let url = serve_once(
            "200 OK",
            r#"{"result":"success","rates":{"USD":1,"EUR":0.9,"GBP":0.8}}"#,
        )
        .await;

        let table = ErApiClient::new(url).latest_rates().await.unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.get("GBP"), Some(0.8));
    }

    #[tokio::test]
    async fn test_client_provider_error_on_error_status() {
        let url = serve_once(
            "404 Not Found",
            r#"{"result":"error","error-type":"invalid-base"}"#,
        )
        .await;

        let result = ErApiClient::new(url).latest_rates().await;
        assert_eq!(
            result,
            Err(FetchError::ProviderError("invalid-base".to_string()))
        );
    }

    #[tokio::test]
    async fn test_client_provider_error_on_ok_status() {
        let url = serve_once(
            "200 OK",
            r#"{"result":"error","error-type":"invalid-base"}"#,
        )
        .await;

        let result = ErApiClient::new(url).latest_rates().await;
        assert_eq!(
            result,
            Err(FetchError::ProviderError("invalid-base".to_string()))
        );
    }

    #[tokio::test]
    async fn test_client_garbled_body_on_error_status() {
        let url = serve_once("502 Bad Gateway", "<html>502 Bad Gateway</html>").await;

        match ErApiClient::new(url).latest_rates().await {
            Err(FetchError::Network(msg)) => assert!(msg.contains("502"), "{}", msg),
            other => panic!("expected network error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_client_garbled_body_on_ok_status() {
        let url = serve_once("200 OK", r#"{"result":"success","rates":"#).await;

        let result = ErApiClient::new(url).latest_rates().await;
        assert!(matches!(result, Err(FetchError::Network(_))));
    }

    #[tokio::test]
    async fn test_client_success_body_on_error_status() {
        let url = serve_once(
            "500 Internal Server Error",
            r#"{"result":"success","rates":{"EUR":0.9}}"#,
        )
        .await;

        match ErApiClient::new(url).latest_rates().await {
            Err(FetchError::Network(msg)) => assert!(msg.contains("500"), "{}", msg),
            other => panic!("expected network error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        let client = ErApiClient::new("http://127.0.0.1:1");
        let result = client.latest_rates().await;
        assert!(matches!(result, Err(FetchError::Network(_))));
    }
}

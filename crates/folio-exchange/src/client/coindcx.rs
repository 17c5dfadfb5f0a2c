//! CoinDCX HTTP 클라이언트.
//!
//! 인증 요청은 모두 POST이며, 본문에 타임스탬프를 주입한 압축 JSON을
//! HMAC-SHA256으로 서명합니다. 서명된 문자열이 그대로 전송 본문이
//! 되므로 서명 바이트와 전송 바이트가 항상 일치합니다.

use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fmt;
use std::time::Duration;
use tracing::debug;

use crate::client::{map_status, timestamp_ms};
use crate::error::{ExchangeError, ExchangeResult};
use crate::sign::hmac;

/// CoinDCX 기본 API URL.
pub const DEFAULT_BASE_URL: &str = "https://api.coindcx.com";

/// CoinDCX 클라이언트 설정.
///
/// # 보안
/// `Debug` 구현은 민감 정보(`api_key`, `api_secret`)를 마스킹합니다.
#[derive(Clone)]
pub struct CoinDcxConfig {
    /// API 키
    pub api_key: String,
    /// API 시크릿
    pub api_secret: String,
    /// 기본 URL (테스트/설정에서 오버라이드 가능)
    pub base_url: String,
    /// 요청 타임아웃 (초)
    pub timeout_secs: u64,
}

impl CoinDcxConfig {
    /// 새 설정 생성.
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
        }
    }

    /// 기본 URL 오버라이드.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// 요청 타임아웃 설정.
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

impl fmt::Debug for CoinDcxConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoinDcxConfig")
            .field("api_key", &"***REDACTED***")
            .field("api_secret", &"***REDACTED***")
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// CoinDCX 잔고 응답 항목.
#[derive(Debug, Clone, Deserialize)]
pub struct CoinDcxBalance {
    pub currency: String,
    pub balance: Decimal,
    pub locked_balance: Decimal,
}

/// CoinDCX 거래소 클라이언트.
pub struct CoinDcxClient {
    config: CoinDcxConfig,
    client: reqwest::Client,
}

impl CoinDcxClient {
    /// 새 CoinDCX 클라이언트 생성.
    ///
    /// # Errors
    /// HTTP 클라이언트 생성에 실패하면 `ExchangeError::Network`를 반환합니다.
    pub fn new(config: CoinDcxConfig) -> ExchangeResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ExchangeError::Network(e.to_string()))?;

        Ok(Self { config, client })
    }

    /// 인증 POST 요청.
    ///
    /// 타임스탬프는 호출마다 새로 생성되며, 서명은 전송 직전에 수행됩니다.
    pub async fn post<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: Map<String, Value>,
    ) -> ExchangeResult<T> {
        let payload = hmac::signed_payload(&body, timestamp_ms());
        let signature = hmac::sign(&payload, &self.config.api_secret);

        let url = format!("{}{}", self.config.base_url, endpoint);
        debug!(endpoint, "POST (signed)");

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header(hmac::HEADER_API_KEY, &self.config.api_key)
            .header(hmac::HEADER_SIGNATURE, signature)
            .body(payload)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            serde_json::from_str(&body).map_err(|e| ExchangeError::Parse(e.to_string()))
        } else {
            Err(map_status(status, &body))
        }
    }

    /// 계좌 잔고 조회.
    ///
    /// Endpoint: `POST /exchange/v1/users/balances`
    pub async fn user_balances(&self) -> ExchangeResult<Vec<CoinDcxBalance>> {
        self.post("/exchange/v1/users/balances", Map::new()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client(base_url: &str) -> CoinDcxClient {
        let config = CoinDcxConfig::new("test-key", "test-secret").with_base_url(base_url);
        CoinDcxClient::new(config).unwrap()
    }

    #[test]
    fn test_config_debug_masks_secrets() {
        let config = CoinDcxConfig::new("visible-key", "visible-secret");
        let debug = format!("{:?}", config);

        assert!(!debug.contains("visible-key"));
        assert!(!debug.contains("visible-secret"));
        assert!(debug.contains(DEFAULT_BASE_URL));
    }

    #[tokio::test]
    async fn test_user_balances_sends_auth_headers() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/exchange/v1/users/balances")
            .match_header("x-auth-apikey", "test-key")
            .match_header("content-type", "application/json")
            .match_header(
                "x-auth-signature",
                mockito::Matcher::Regex("^[0-9a-f]{64}$".to_string()),
            )
            .match_body(mockito::Matcher::Regex(
                r#"^\{"timestamp":\d+\}$"#.to_string(),
            ))
            .with_status(200)
            .with_body(r#"[{"currency":"BTC","balance":1.5,"locked_balance":0.5}]"#)
            .create_async()
            .await;

        let balances = test_client(&server.url()).user_balances().await.unwrap();

        mock.assert_async().await;
        assert_eq!(balances.len(), 1);
        assert_eq!(balances[0].currency, "BTC");
    }

    #[tokio::test]
    async fn test_unauthorized_maps_to_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/exchange/v1/users/balances")
            .with_status(401)
            .with_body(r#"{"message":"Invalid API key"}"#)
            .create_async()
            .await;

        let result = test_client(&server.url()).user_balances().await;
        assert!(
            matches!(result, Err(ExchangeError::Unauthorized(ref m)) if m == "Invalid API key")
        );
    }

    #[tokio::test]
    async fn test_server_error_maps_to_upstream() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/exchange/v1/users/balances")
            .with_status(503)
            .with_body("unavailable")
            .create_async()
            .await;

        let result = test_client(&server.url()).user_balances().await;
        assert!(matches!(
            result,
            Err(ExchangeError::Upstream { status: 503, .. })
        ));
    }
}

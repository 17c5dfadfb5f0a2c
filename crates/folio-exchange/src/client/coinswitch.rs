//! CoinSwitch PRO HTTP 클라이언트.
//!
//! 요청마다 `METHOD + PATH + EPOCH(+ 정렬된 본문)` 메시지를 Ed25519로
//! 서명합니다. `X-AUTH-EPOCH` 헤더에는 서명에 쓰인 epoch 문자열이
//! 그대로 들어갑니다. 쿼리 파라미터는 서명 대상 경로에 포함되지
//! 않습니다.

use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fmt;
use std::time::Duration;
use tracing::debug;

use crate::client::{map_status, timestamp_ms};
use crate::error::{ExchangeError, ExchangeResult};
use crate::sign::ed25519;

/// CoinSwitch 기본 API URL.
pub const DEFAULT_BASE_URL: &str = "https://coinswitch.co";

/// CoinSwitch 클라이언트 설정.
///
/// # 보안
/// `Debug` 구현은 민감 정보(`api_key`, `api_secret`)를 마스킹합니다.
#[derive(Clone)]
pub struct CoinSwitchConfig {
    /// API 키
    pub api_key: String,
    /// hex 인코딩된 Ed25519 개인키
    pub api_secret: String,
    /// 기본 URL (테스트/설정에서 오버라이드 가능)
    pub base_url: String,
    /// 요청 타임아웃 (초)
    pub timeout_secs: u64,
}

impl CoinSwitchConfig {
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

impl fmt::Debug for CoinSwitchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoinSwitchConfig")
            .field("api_key", &"***REDACTED***")
            .field("api_secret", &"***REDACTED***")
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

// ============================================================================
// API 응답 타입
// ============================================================================

/// 포트폴리오 응답 항목.
#[derive(Debug, Clone, Deserialize)]
pub struct CoinSwitchPortfolioItem {
    pub currency: String,
    /// 사용 가능 잔고 (문자열 십진수)
    pub main_balance: Decimal,
    /// 주문에 묶인 잔고 (문자열 십진수)
    pub blocked_balance_order: Decimal,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PortfolioResponse {
    pub data: Vec<CoinSwitchPortfolioItem>,
}

/// 주문 응답 항목.
#[derive(Debug, Clone, Deserialize)]
pub struct CoinSwitchOrder {
    pub order_id: String,
    /// 예: "BTC/INR"
    pub symbol: String,
    pub price: Decimal,
    pub average_price: Decimal,
    pub orig_qty: Decimal,
    pub executed_qty: Decimal,
    pub status: String,
    pub side: String,
    pub exchange: String,
    pub order_source: String,
    /// 생성 시각 (epoch 밀리초)
    pub created_time: i64,
    /// 갱신 시각 (epoch 밀리초)
    pub updated_time: i64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OrdersData {
    pub orders: Vec<CoinSwitchOrder>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OrdersResponse {
    pub data: OrdersData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServerTimeResponse {
    server_time: i64,
}

/// 주문 목록 조회 파라미터.
#[derive(Debug, Clone, Default)]
pub struct OrderListParams {
    pub count: Option<u32>,
    pub from_time: Option<i64>,
    pub to_time: Option<i64>,
    pub symbols: Option<String>,
}

impl OrderListParams {
    fn to_query(&self, open: bool) -> Vec<(String, String)> {
        let mut query = Vec::new();
        if let Some(count) = self.count {
            query.push(("count".to_string(), count.to_string()));
        }
        if let Some(from_time) = self.from_time {
            query.push(("from_time".to_string(), from_time.to_string()));
        }
        if let Some(to_time) = self.to_time {
            query.push(("to_time".to_string(), to_time.to_string()));
        }
        if let Some(ref symbols) = self.symbols {
            query.push(("symbols".to_string(), symbols.clone()));
        }
        query.push(("open".to_string(), open.to_string()));
        query
    }
}

/// CoinSwitch 거래소 클라이언트.
pub struct CoinSwitchClient {
    config: CoinSwitchConfig,
    client: reqwest::Client,
}

impl CoinSwitchClient {
    /// 새 CoinSwitch 클라이언트 생성.
    ///
    /// # Errors
    /// HTTP 클라이언트 생성에 실패하면 `ExchangeError::Network`를 반환합니다.
    pub fn new(config: CoinSwitchConfig) -> ExchangeResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ExchangeError::Network(e.to_string()))?;

        Ok(Self { config, client })
    }

    /// 인증 요청 프리미티브.
    ///
    /// epoch 타임스탬프는 호출마다 새로 생성되며, 헤더와 서명 메시지에
    /// 바이트 단위로 동일하게 들어갑니다.
    async fn request<T: DeserializeOwned>(
        &self,
        method: reqwest::Method,
        path: &str,
        query: &[(String, String)],
        body: Option<Map<String, Value>>,
    ) -> ExchangeResult<T> {
        let epoch = timestamp_ms().to_string();
        let message = ed25519::signature_message(method.as_str(), path, &epoch, body.as_ref());
        let signature = ed25519::sign(&message, &self.config.api_secret)?;

        let url = format!("{}{}", self.config.base_url, path);
        debug!(%method, path, "request (signed)");

        let mut builder = self
            .client
            .request(method.clone(), &url)
            .header("Content-Type", "application/json")
            .header(ed25519::HEADER_API_KEY, &self.config.api_key)
            .header(ed25519::HEADER_SIGNATURE, signature)
            .header(ed25519::HEADER_EPOCH, &epoch);

        if !query.is_empty() {
            builder = builder.query(query);
        }
        if let Some(body) = body {
            if method != reqwest::Method::GET {
                // 전송 본문은 서명된 메시지에 포함된 직렬화와 동일해야 함
                builder = builder.body(Value::Object(body).to_string());
            }
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            serde_json::from_str(&body).map_err(|e| ExchangeError::Parse(e.to_string()))
        } else {
            Err(map_status(status, &body))
        }
    }

    /// API 키 유효성 검증.
    ///
    /// Endpoint: `GET /trade/api/v2/validate/keys`
    pub async fn validate_keys(&self) -> ExchangeResult<()> {
        let _: Value = self
            .request(reqwest::Method::GET, "/trade/api/v2/validate/keys", &[], None)
            .await?;
        Ok(())
    }

    /// 서버 시간 조회 (epoch 밀리초).
    ///
    /// Endpoint: `GET /trade/api/v2/time`
    pub async fn server_time(&self) -> ExchangeResult<i64> {
        let response: ServerTimeResponse = self
            .request(reqwest::Method::GET, "/trade/api/v2/time", &[], None)
            .await?;
        Ok(response.server_time)
    }

    /// 포트폴리오(잔고) 조회.
    ///
    /// Endpoint: `GET /trade/api/v2/user/portfolio`
    pub async fn portfolio(&self) -> ExchangeResult<Vec<CoinSwitchPortfolioItem>> {
        let response: PortfolioResponse = self
            .request(reqwest::Method::GET, "/trade/api/v2/user/portfolio", &[], None)
            .await?;
        Ok(response.data)
    }

    /// 주문 목록 조회. `open`으로 미체결/체결 목록을 선택합니다.
    ///
    /// Endpoint: `GET /trade/api/v2/orders`
    pub async fn orders(
        &self,
        open: bool,
        params: &OrderListParams,
    ) -> ExchangeResult<Vec<CoinSwitchOrder>> {
        let query = params.to_query(open);
        let response: OrdersResponse = self
            .request(reqwest::Method::GET, "/trade/api/v2/orders", &query, None)
            .await?;
        Ok(response.data.orders)
    }
}

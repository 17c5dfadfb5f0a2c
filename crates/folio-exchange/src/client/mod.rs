//! 거래소 HTTP 클라이언트.
//!
//! 클라이언트는 서명 프로토콜을 인증 요청 프리미티브로 감싸고,
//! 전송 실패를 작은 에러 분류 체계로 변환합니다. 타임스탬프/논스는
//! 호출마다 새로 생성되며 재사용되지 않습니다.

mod coindcx;
mod coinswitch;

pub use coindcx::{CoinDcxBalance, CoinDcxClient, CoinDcxConfig};
pub use coinswitch::{
    CoinSwitchClient, CoinSwitchConfig, CoinSwitchOrder, CoinSwitchPortfolioItem, OrderListParams,
};

use serde::Deserialize;

use crate::error::ExchangeError;

/// 업스트림 에러 응답 본문. 메시지 필드만 관심 대상.
#[derive(Debug, Deserialize)]
struct UpstreamErrorBody {
    message: Option<String>,
}

/// 에러 응답 본문에서 사람이 읽을 메시지 추출.
fn upstream_message(body: &str) -> String {
    serde_json::from_str::<UpstreamErrorBody>(body)
        .ok()
        .and_then(|e| e.message)
        .unwrap_or_else(|| body.to_string())
}

/// 거래소 중립 HTTP 상태 → 에러 매핑.
///
/// 401 → Unauthorized, 422 → Validation, 429 → RateLimited,
/// 500 이상 → Upstream, 그 외 → Api (업스트림 메시지 포함).
pub(crate) fn map_status(status: reqwest::StatusCode, body: &str) -> ExchangeError {
    let message = upstream_message(body);

    match status.as_u16() {
        401 => ExchangeError::Unauthorized(message),
        422 => ExchangeError::Validation(message),
        429 => ExchangeError::RateLimited,
        s if s >= 500 => ExchangeError::Upstream { status: s, message },
        s => ExchangeError::Api { status: s, message },
    }
}

/// 현재 epoch 타임스탬프(밀리초).
pub(crate) fn timestamp_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

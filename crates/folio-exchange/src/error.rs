//! 거래소 에러 타입.

use thiserror::Error;

/// 거래소 작업을 위한 Result 타입.
pub type ExchangeResult<T> = Result<T, ExchangeError>;

/// 거래소 관련 에러.
///
/// HTTP 상태 매핑은 거래소 중립적입니다:
/// 401 → `Unauthorized`, 422 → `Validation`, 429 → `RateLimited`,
/// 500 이상 → `Upstream`, 그 외 비정상 응답 → `Api`.
#[derive(Debug, Error)]
pub enum ExchangeError {
    /// 네트워크/연결 에러
    #[error("Network error: {0}")]
    Network(String),

    /// 요청 타임아웃
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// 인증/권한 에러 (HTTP 401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// 요청 형식 에러 (HTTP 422)
    #[error("Validation error: {0}")]
    Validation(String),

    /// 요청 한도 초과 (HTTP 429)
    #[error("Rate limit exceeded")]
    RateLimited,

    /// 거래소 서버 장애 (HTTP 5xx)
    #[error("Upstream error {status}: {message}")]
    Upstream { status: u16, message: String },

    /// 기타 API 에러 (업스트림 메시지 포함)
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// 응답 파싱/역직렬화 에러
    #[error("Parse error: {0}")]
    Parse(String),

    /// 잘못된 형식의 자격증명 (예: Ed25519 키 hex 디코드 실패)
    #[error("Invalid credential: {0}")]
    InvalidCredential(String),

    /// 지원되지 않는 작업
    #[error("Not supported: {0}")]
    NotSupported(String),
}

impl ExchangeError {
    /// 재시도 레이어가 키로 삼을 수 있는, 재시도 가능한 에러인지 확인.
    /// (이 크레이트 자체는 자동 재시도를 하지 않습니다.)
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ExchangeError::Network(_)
                | ExchangeError::Timeout(_)
                | ExchangeError::RateLimited
                | ExchangeError::Upstream { .. }
        )
    }
}

impl From<reqwest::Error> for ExchangeError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ExchangeError::Timeout(e.to_string())
        } else {
            ExchangeError::Network(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(ExchangeError::RateLimited.is_retryable());
        assert!(ExchangeError::Timeout("t".into()).is_retryable());
        assert!(ExchangeError::Upstream {
            status: 502,
            message: "bad gateway".into()
        }
        .is_retryable());

        assert!(!ExchangeError::Unauthorized("bad key".into()).is_retryable());
        assert!(!ExchangeError::Validation("bad body".into()).is_retryable());
    }
}

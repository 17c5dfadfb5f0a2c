//! 동기화 서비스 에러 타입.
//!
//! 치명적 설정 문제와 복구 가능한 거래소 실패를 한 분류 체계로
//! 구분합니다. `sync_all`은 이 타입을 패턴 매칭하여 거래소별 실패를
//! SyncResult로 강등합니다. 에러 메시지에는 거래소 id와 단계가
//! 포함되지만 자격증명은 절대 포함되지 않습니다.

use thiserror::Error;

use folio_core::{CryptoError, ExchangeId};
use folio_exchange::ExchangeError;

use crate::store::StoreError;

/// 실패가 발생한 워크플로우 단계.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Connect,
    Balances,
    Transactions,
}

impl std::fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SyncPhase::Connect => "connect",
            SyncPhase::Balances => "balances",
            SyncPhase::Transactions => "transactions",
        };
        f.write_str(s)
    }
}

/// 동기화 서비스 에러.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// 활성 연결 기록 없음 (사용자 조치 필요)
    #[error("Exchange {exchange} is not connected for this user")]
    NotConnected { exchange: ExchangeId },

    /// 업스트림이 자격증명을 거부함 (사용자 조치 필요, 자동 재시도 없음)
    #[error("Invalid API credentials for {exchange}")]
    InvalidCredentials { exchange: ExchangeId },

    /// 자격증명 복호화 실패 (해당 자격증명에 치명적, 무시되지 않음)
    #[error("Credential decryption failed for {exchange}: {source}")]
    Crypto {
        exchange: ExchangeId,
        source: CryptoError,
    },

    /// 거래소 호출 실패 (단계 정보 포함)
    #[error("Exchange {exchange} failed during {phase}: {source}")]
    Exchange {
        exchange: ExchangeId,
        phase: SyncPhase,
        source: ExchangeError,
    },

    /// 영속성 경계 에러
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

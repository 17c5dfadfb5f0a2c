//! 영속성 경계.
//!
//! 코어는 이 trait을 통해서만 저장소에 접근합니다. 임의 쿼리는
//! 발행하지 않으며, 전역 핸들 대신 명시적인 trait 객체가
//! 오케스트레이터 생성 시 주입됩니다.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use folio_core::{Balance, ConnectedExchange, ExchangeId, Transaction};

/// 저장소 작업을 위한 Result 타입.
pub type StoreResult<T> = Result<T, StoreError>;

/// 영속성 경계 에러.
#[derive(Debug, Error)]
pub enum StoreError {
    /// 대상 레코드 없음
    #[error("Record not found: {0}")]
    NotFound(String),

    /// 백엔드 실패
    #[error("Store backend error: {0}")]
    Backend(String),
}

/// 포트폴리오 저장소 경계.
///
/// 잔고는 (portfolio, exchange, currency), 거래는
/// (portfolio, exchange, external_id) 키로 upsert됩니다. 같은 키의
/// 레코드는 제자리에서 갱신되며 절대 중복 생성되지 않습니다.
#[async_trait]
pub trait PortfolioStore: Send + Sync {
    /// (user, exchange)의 연결 기록 조회. 비활성 기록도 반환합니다.
    async fn find_connected_exchange(
        &self,
        user_id: Uuid,
        exchange_id: ExchangeId,
    ) -> StoreResult<Option<ConnectedExchange>>;

    /// 사용자의 활성 연결 기록 전체 조회.
    async fn find_connected_exchanges_for_user(
        &self,
        user_id: Uuid,
    ) -> StoreResult<Vec<ConnectedExchange>>;

    /// 연결 기록 upsert. (user, exchange) 기준으로 생성 또는 교체.
    async fn upsert_connected_exchange(
        &self,
        record: ConnectedExchange,
    ) -> StoreResult<ConnectedExchange>;

    /// 연결 기록 비활성화 (soft delete).
    async fn deactivate_connected_exchange(&self, id: Uuid) -> StoreResult<()>;

    /// 잔고 upsert.
    async fn upsert_balance(
        &self,
        portfolio_id: Uuid,
        exchange_id: ExchangeId,
        balance: &Balance,
    ) -> StoreResult<()>;

    /// 거래 upsert.
    async fn upsert_transaction(
        &self,
        portfolio_id: Uuid,
        exchange_id: ExchangeId,
        transaction: &Transaction,
    ) -> StoreResult<()>;

    /// 연결 기록의 마지막 동기화 시각 갱신.
    async fn touch_last_synced(&self, id: Uuid) -> StoreResult<()>;
}

//! ExchangeProvider 구현체.
//!
//! 거래소 중립적인 ExchangeProvider trait과 거래소별 어댑터를 제공합니다.
//! 어댑터는 거래소별 응답 형태를 아는 유일한 장소입니다.

mod coindcx;
mod coinswitch;

pub use coindcx::CoinDcxProvider;
pub use coinswitch::CoinSwitchProvider;

use async_trait::async_trait;

use folio_core::{Balance, Credentials, ExchangeId, ExchangeInfo, Transaction, TransactionFilters};

use crate::client::{CoinDcxClient, CoinDcxConfig, CoinSwitchClient, CoinSwitchConfig};
use crate::error::ExchangeResult;

/// 통합 거래소 인터페이스.
///
/// 모든 거래소 연동은 이 trait을 구현해야 하며, 응답은 공통
/// 잔고/거래 모델로 정규화됩니다.
#[async_trait]
pub trait ExchangeProvider: Send + Sync {
    /// 자격증명이 유효한지 가장 저렴한 인증 호출로 확인.
    ///
    /// 어떤 실패(인증, 네트워크, 파싱)도 전파하지 않고 false를 반환합니다.
    async fn test_connection(&self) -> bool;

    /// 계좌 잔고를 조회하여 공통 Balance 형태로 정규화.
    async fn get_balances(&self) -> ExchangeResult<Vec<Balance>>;

    /// 거래 내역을 조회하여 공통 Transaction 형태로 정규화.
    ///
    /// 필터는 정규화 이후에 적용되므로 어댑터 간 의미가 동일합니다.
    async fn get_transactions(
        &self,
        filters: &TransactionFilters,
    ) -> ExchangeResult<Vec<Transaction>>;

    /// 거래소 메타데이터. 네트워크 호출 없음.
    fn exchange_info(&self) -> ExchangeInfo;
}

/// 거래소 식별자 → provider 생성자 매핑.
///
/// 닫힌 집합에 대한 유일한 전수 매핑입니다. 거래소를 추가할 때는
/// 여기에 한 갈래와 어댑터 하나를 추가하면 되고, 오케스트레이터는
/// 수정되지 않습니다.
pub fn build_provider(
    exchange_id: ExchangeId,
    credentials: &Credentials,
    base_url: Option<&str>,
    timeout_secs: u64,
) -> ExchangeResult<Box<dyn ExchangeProvider>> {
    match exchange_id {
        ExchangeId::CoinDcx => {
            let mut config = CoinDcxConfig::new(&credentials.api_key, &credentials.api_secret)
                .with_timeout_secs(timeout_secs);
            if let Some(base_url) = base_url {
                config = config.with_base_url(base_url);
            }
            Ok(Box::new(CoinDcxProvider::new(CoinDcxClient::new(config)?)))
        }
        ExchangeId::CoinSwitch => {
            let mut config = CoinSwitchConfig::new(&credentials.api_key, &credentials.api_secret)
                .with_timeout_secs(timeout_secs);
            if let Some(base_url) = base_url {
                config = config.with_base_url(base_url);
            }
            Ok(Box::new(CoinSwitchProvider::new(CoinSwitchClient::new(
                config,
            )?)))
        }
    }
}

//! CoinDCX ExchangeProvider 구현.
//!
//! 잔고 정규화 정책: 0 잔고 항목도 그대로 유지합니다 (업스트림이
//! 이미 보유 통화만 반환하므로 추가 필터링을 하지 않음).

use async_trait::async_trait;
use tracing::warn;

use folio_core::{Balance, ExchangeId, ExchangeInfo, Transaction, TransactionFilters};

use crate::client::{CoinDcxBalance, CoinDcxClient};
use crate::error::{ExchangeError, ExchangeResult};

use super::ExchangeProvider;

/// CoinDCX ExchangeProvider 구현.
pub struct CoinDcxProvider {
    client: CoinDcxClient,
}

impl CoinDcxProvider {
    /// 새 CoinDcxProvider 생성.
    pub fn new(client: CoinDcxClient) -> Self {
        Self { client }
    }

    fn normalize_balance(raw: CoinDcxBalance) -> Balance {
        Balance::new(raw.currency, raw.balance, raw.locked_balance)
    }
}

#[async_trait]
impl ExchangeProvider for CoinDcxProvider {
    async fn test_connection(&self) -> bool {
        // 잔고 조회가 자격증명을 검증하는 가장 저렴한 인증 호출
        match self.client.user_balances().await {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "CoinDCX connection test failed");
                false
            }
        }
    }

    async fn get_balances(&self) -> ExchangeResult<Vec<Balance>> {
        let raw = self.client.user_balances().await?;
        Ok(raw.into_iter().map(Self::normalize_balance).collect())
    }

    async fn get_transactions(
        &self,
        _filters: &TransactionFilters,
    ) -> ExchangeResult<Vec<Transaction>> {
        // 여기서 사용하는 CoinDCX 트레이딩 API 표면에는 거래 내역
        // 엔드포인트가 없음
        Err(ExchangeError::NotSupported(
            "CoinDCX transaction history".to_string(),
        ))
    }

    fn exchange_info(&self) -> ExchangeInfo {
        ExchangeInfo {
            id: ExchangeId::CoinDcx,
            name: "CoinDCX".to_string(),
            country: "India".to_string(),
            api_version: "v1".to_string(),
        }
    }
}

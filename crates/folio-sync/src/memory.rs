//! 테스트용 인메모리 저장소.
//!
//! PortfolioStore의 참조 구현으로, upsert 키 규칙과 soft delete
//! 의미론을 그대로 따릅니다. 운영 환경용이 아닙니다.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use folio_core::{Balance, ConnectedExchange, ExchangeId, Transaction};

use crate::store::{PortfolioStore, StoreError, StoreResult};

type BalanceKey = (Uuid, ExchangeId, String);
type TransactionKey = (Uuid, ExchangeId, String);

/// 인메모리 PortfolioStore 구현.
#[derive(Default)]
pub struct MemoryStore {
    connections: Arc<RwLock<HashMap<(Uuid, ExchangeId), ConnectedExchange>>>,
    balances: Arc<RwLock<HashMap<BalanceKey, Balance>>>,
    transactions: Arc<RwLock<HashMap<TransactionKey, Transaction>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 포트폴리오의 잔고 레코드 수 (테스트 검증용).
    pub async fn balance_count(&self, portfolio_id: Uuid) -> usize {
        self.balances
            .read()
            .await
            .keys()
            .filter(|(p, _, _)| *p == portfolio_id)
            .count()
    }

    /// 포트폴리오의 거래 레코드 수 (테스트 검증용).
    pub async fn transaction_count(&self, portfolio_id: Uuid) -> usize {
        self.transactions
            .read()
            .await
            .keys()
            .filter(|(p, _, _)| *p == portfolio_id)
            .count()
    }

    /// 특정 잔고 레코드 조회 (테스트 검증용).
    pub async fn balance(
        &self,
        portfolio_id: Uuid,
        exchange_id: ExchangeId,
        currency: &str,
    ) -> Option<Balance> {
        self.balances
            .read()
            .await
            .get(&(portfolio_id, exchange_id, currency.to_string()))
            .cloned()
    }

    /// 특정 거래 레코드 조회 (테스트 검증용).
    pub async fn transaction(
        &self,
        portfolio_id: Uuid,
        exchange_id: ExchangeId,
        external_id: &str,
    ) -> Option<Transaction> {
        self.transactions
            .read()
            .await
            .get(&(portfolio_id, exchange_id, external_id.to_string()))
            .cloned()
    }
}

#[async_trait]
impl PortfolioStore for MemoryStore {
    async fn find_connected_exchange(
        &self,
        user_id: Uuid,
        exchange_id: ExchangeId,
    ) -> StoreResult<Option<ConnectedExchange>> {
        Ok(self
            .connections
            .read()
            .await
            .get(&(user_id, exchange_id))
            .cloned())
    }

    async fn find_connected_exchanges_for_user(
        &self,
        user_id: Uuid,
    ) -> StoreResult<Vec<ConnectedExchange>> {
        let mut records: Vec<ConnectedExchange> = self
            .connections
            .read()
            .await
            .values()
            .filter(|record| record.user_id == user_id && record.is_active)
            .cloned()
            .collect();
        records.sort_by_key(|record| record.created_at);
        Ok(records)
    }

    async fn upsert_connected_exchange(
        &self,
        record: ConnectedExchange,
    ) -> StoreResult<ConnectedExchange> {
        self.connections
            .write()
            .await
            .insert((record.user_id, record.exchange_id), record.clone());
        Ok(record)
    }

    async fn deactivate_connected_exchange(&self, id: Uuid) -> StoreResult<()> {
        let mut connections = self.connections.write().await;
        let record = connections
            .values_mut()
            .find(|record| record.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("connected exchange {}", id)))?;
        record.is_active = false;
        Ok(())
    }

    async fn upsert_balance(
        &self,
        portfolio_id: Uuid,
        exchange_id: ExchangeId,
        balance: &Balance,
    ) -> StoreResult<()> {
        self.balances.write().await.insert(
            (portfolio_id, exchange_id, balance.currency.clone()),
            balance.clone(),
        );
        Ok(())
    }

    async fn upsert_transaction(
        &self,
        portfolio_id: Uuid,
        exchange_id: ExchangeId,
        transaction: &Transaction,
    ) -> StoreResult<()> {
        self.transactions.write().await.insert(
            (portfolio_id, exchange_id, transaction.external_id.clone()),
            transaction.clone(),
        );
        Ok(())
    }

    async fn touch_last_synced(&self, id: Uuid) -> StoreResult<()> {
        let mut connections = self.connections.write().await;
        let record = connections
            .values_mut()
            .find(|record| record.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("connected exchange {}", id)))?;
        record.last_synced_at = Some(Utc::now());
        Ok(())
    }
}

//! 거래소 연결/동기화 오케스트레이터.
//!
//! 평문 자격증명은 연결 검증과 프로바이더 생성 시에만 메모리에
//! 존재하며, 저장소에는 암호화된 형태만 기록됩니다. `sync_all`은
//! 거래소별 실패를 격리하여 한 거래소의 장애가 다른 거래소의
//! 동기화를 막지 않도록 합니다.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::{join_all, try_join_all};
use tracing::{info, warn};
use uuid::Uuid;

use folio_core::{
    ConnectedExchange, ConnectedExchangeView, Credentials, CredentialCipher, ExchangeEndpointConfig,
    ExchangeId, SyncResult, TransactionFilters,
};
use folio_exchange::{build_provider, ExchangeError, ExchangeProvider, ExchangeResult};

use crate::error::{ServiceError, SyncPhase};
use crate::store::PortfolioStore;

// ============================================================
// 프로바이더 팩토리
// ============================================================

/// 복호화된 자격증명으로 프로바이더를 생성하는 seam.
///
/// 테스트에서 스크립트된 프로바이더를 주입할 수 있도록 trait으로
/// 분리되어 있습니다.
pub trait ProviderFactory: Send + Sync {
    fn build(
        &self,
        exchange_id: ExchangeId,
        credentials: &Credentials,
    ) -> ExchangeResult<Box<dyn ExchangeProvider>>;
}

/// 실제 HTTP 클라이언트를 생성하는 기본 팩토리.
#[derive(Default)]
pub struct HttpProviderFactory {
    endpoints: HashMap<ExchangeId, ExchangeEndpointConfig>,
}

impl HttpProviderFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// 거래소별 엔드포인트 설정 (base URL 오버라이드, 타임아웃) 등록.
    pub fn with_endpoint(mut self, exchange_id: ExchangeId, config: ExchangeEndpointConfig) -> Self {
        self.endpoints.insert(exchange_id, config);
        self
    }
}

impl ProviderFactory for HttpProviderFactory {
    fn build(
        &self,
        exchange_id: ExchangeId,
        credentials: &Credentials,
    ) -> ExchangeResult<Box<dyn ExchangeProvider>> {
        let endpoint = self.endpoints.get(&exchange_id).cloned().unwrap_or_default();
        build_provider(
            exchange_id,
            credentials,
            endpoint.base_url.as_deref(),
            endpoint.timeout_secs,
        )
    }
}

// ============================================================
// 동기화 범위
// ============================================================

/// 거래 동기화 시간 범위.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl SyncRange {
    pub fn new(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        Self { start, end }
    }

    fn to_filters(self) -> TransactionFilters {
        TransactionFilters {
            start: self.start,
            end: self.end,
            ..TransactionFilters::default()
        }
    }
}

// ============================================================
// 거래소 서비스
// ============================================================

/// 거래소 연결과 포트폴리오 동기화 워크플로우.
pub struct ExchangeService {
    store: Arc<dyn PortfolioStore>,
    cipher: Arc<CredentialCipher>,
    factory: Arc<dyn ProviderFactory>,
}

impl ExchangeService {
    pub fn new(
        store: Arc<dyn PortfolioStore>,
        cipher: Arc<CredentialCipher>,
        factory: Arc<dyn ProviderFactory>,
    ) -> Self {
        Self {
            store,
            cipher,
            factory,
        }
    }

    /// 거래소 연결.
    ///
    /// 자격증명을 먼저 실제 호출로 검증하고, 유효할 때만 암호화하여
    /// 저장합니다. 검증 실패 시 저장소에 아무것도 기록하지 않습니다.
    /// 같은 (user, exchange)의 기존 기록이 있으면 새 자격증명으로
    /// 교체하고 재활성화합니다.
    pub async fn connect_exchange(
        &self,
        user_id: Uuid,
        exchange_id: ExchangeId,
        credentials: Credentials,
    ) -> Result<ConnectedExchangeView, ServiceError> {
        let provider =
            self.factory
                .build(exchange_id, &credentials)
                .map_err(|source| ServiceError::Exchange {
                    exchange: exchange_id,
                    phase: SyncPhase::Connect,
                    source,
                })?;

        if !provider.test_connection().await {
            warn!(exchange = %exchange_id, "Credential validation failed, nothing stored");
            return Err(ServiceError::InvalidCredentials {
                exchange: exchange_id,
            });
        }

        let encrypted = self
            .cipher
            .encrypt_credentials(&credentials)
            .map_err(|source| ServiceError::Crypto {
                exchange: exchange_id,
                source,
            })?;

        let record = match self.store.find_connected_exchange(user_id, exchange_id).await? {
            Some(mut existing) => {
                existing.credentials = encrypted;
                existing.is_active = true;
                existing
            }
            None => ConnectedExchange::new(user_id, exchange_id, encrypted),
        };

        let stored = self.store.upsert_connected_exchange(record).await?;
        info!(exchange = %exchange_id, user = %user_id, "Exchange connected");
        Ok(ConnectedExchangeView::from(&stored))
    }

    /// 거래소 연결 해제 (soft delete).
    ///
    /// 기록과 암호화된 자격증명은 감사 목적상 유지되며 비활성
    /// 표시만 합니다.
    pub async fn disconnect_exchange(
        &self,
        user_id: Uuid,
        exchange_id: ExchangeId,
    ) -> Result<(), ServiceError> {
        let record = self
            .store
            .find_connected_exchange(user_id, exchange_id)
            .await?
            .filter(|record| record.is_active)
            .ok_or(ServiceError::NotConnected {
                exchange: exchange_id,
            })?;

        self.store.deactivate_connected_exchange(record.id).await?;
        info!(exchange = %exchange_id, user = %user_id, "Exchange disconnected");
        Ok(())
    }

    /// 사용자의 활성 연결 목록 (자격증명 제외).
    pub async fn connected_exchanges(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<ConnectedExchangeView>, ServiceError> {
        let records = self.store.find_connected_exchanges_for_user(user_id).await?;
        Ok(records.iter().map(ConnectedExchangeView::from).collect())
    }

    /// 저장된 자격증명이 여전히 유효한지 확인.
    ///
    /// 어떤 실패에도 에러를 반환하지 않고 false를 돌려줍니다.
    pub async fn test_connection(&self, user_id: Uuid, exchange_id: ExchangeId) -> bool {
        let record = match self.store.find_connected_exchange(user_id, exchange_id).await {
            Ok(Some(record)) if record.is_active => record,
            Ok(_) => return false,
            Err(error) => {
                warn!(exchange = %exchange_id, %error, "Store lookup failed during connection test");
                return false;
            }
        };

        let credentials = match self.cipher.decrypt_credentials(&record.credentials) {
            Ok(credentials) => credentials,
            Err(error) => {
                warn!(exchange = %exchange_id, %error, "Credential decryption failed during connection test");
                return false;
            }
        };

        match self.factory.build(exchange_id, &credentials) {
            Ok(provider) => provider.test_connection().await,
            Err(error) => {
                warn!(exchange = %exchange_id, %error, "Provider build failed during connection test");
                false
            }
        }
    }

    /// 잔고 동기화. 저장된 잔고 레코드 수를 반환합니다.
    pub async fn sync_balances(
        &self,
        user_id: Uuid,
        portfolio_id: Uuid,
        exchange_id: ExchangeId,
    ) -> Result<usize, ServiceError> {
        let (record, provider) = self.active_provider(user_id, exchange_id).await?;

        let balances = provider
            .get_balances()
            .await
            .map_err(|source| ServiceError::Exchange {
                exchange: exchange_id,
                phase: SyncPhase::Balances,
                source,
            })?;

        // 통화별 upsert는 서로 독립이므로 동시 실행
        try_join_all(
            balances
                .iter()
                .map(|balance| self.store.upsert_balance(portfolio_id, exchange_id, balance)),
        )
        .await?;

        self.store.touch_last_synced(record.id).await?;
        info!(
            exchange = %exchange_id,
            count = balances.len(),
            "Balances synced"
        );
        Ok(balances.len())
    }

    /// 거래 내역 동기화. 저장된 거래 레코드 수를 반환합니다.
    ///
    /// 빈 external_id를 가진 레코드는 upsert 키를 만들 수 없으므로
    /// 건너뛰고 경고를 남깁니다.
    pub async fn sync_transactions(
        &self,
        user_id: Uuid,
        portfolio_id: Uuid,
        exchange_id: ExchangeId,
        range: SyncRange,
    ) -> Result<usize, ServiceError> {
        let (record, provider) = self.active_provider(user_id, exchange_id).await?;

        let transactions = provider
            .get_transactions(&range.to_filters())
            .await
            .map_err(|source| ServiceError::Exchange {
                exchange: exchange_id,
                phase: SyncPhase::Transactions,
                source,
            })?;

        // 같은 external id의 나중 레코드가 결정적으로 우선하도록 순차 upsert
        let mut stored = 0;
        for transaction in &transactions {
            if transaction.external_id.is_empty() {
                warn!(exchange = %exchange_id, "Skipping transaction without external id");
                continue;
            }
            self.store
                .upsert_transaction(portfolio_id, exchange_id, transaction)
                .await?;
            stored += 1;
        }

        self.store.touch_last_synced(record.id).await?;
        info!(exchange = %exchange_id, count = stored, "Transactions synced");
        Ok(stored)
    }

    /// 사용자의 모든 활성 거래소 동기화.
    ///
    /// 거래소별로 독립 실행되며, 한 거래소의 실패는 해당 거래소의
    /// SyncResult::failure로만 기록됩니다. 이 메서드 자체는 저장소
    /// 조회 외에는 실패하지 않습니다.
    pub async fn sync_all(
        &self,
        user_id: Uuid,
        portfolio_id: Uuid,
        range: SyncRange,
    ) -> Result<Vec<SyncResult>, ServiceError> {
        let records = self.store.find_connected_exchanges_for_user(user_id).await?;

        let futures = records.iter().map(|record| {
            let exchange_id = record.exchange_id;
            async move {
                match self.sync_one(user_id, portfolio_id, exchange_id, range).await {
                    Ok(result) => result,
                    Err(error) => {
                        warn!(exchange = %exchange_id, %error, "Exchange sync failed");
                        SyncResult::failure(exchange_id, error.to_string())
                    }
                }
            }
        });

        Ok(join_all(futures).await)
    }

    /// 단일 거래소의 잔고 + 거래 동기화.
    ///
    /// 거래 내역을 지원하지 않는 거래소는 0건 동기화된 성공으로
    /// 취급합니다.
    async fn sync_one(
        &self,
        user_id: Uuid,
        portfolio_id: Uuid,
        exchange_id: ExchangeId,
        range: SyncRange,
    ) -> Result<SyncResult, ServiceError> {
        let balances = self.sync_balances(user_id, portfolio_id, exchange_id).await?;
        let transactions = match self
            .sync_transactions(user_id, portfolio_id, exchange_id, range)
            .await
        {
            Ok(count) => count,
            Err(ServiceError::Exchange {
                source: ExchangeError::NotSupported(feature),
                ..
            }) => {
                info!(exchange = %exchange_id, feature, "Transaction history not supported, skipping");
                0
            }
            Err(error) => return Err(error),
        };
        Ok(SyncResult::success(exchange_id, balances, transactions))
    }

    /// 활성 연결 기록 조회 후 복호화된 자격증명으로 프로바이더 생성.
    async fn active_provider(
        &self,
        user_id: Uuid,
        exchange_id: ExchangeId,
    ) -> Result<(ConnectedExchange, Box<dyn ExchangeProvider>), ServiceError> {
        let record = self
            .store
            .find_connected_exchange(user_id, exchange_id)
            .await?
            .filter(|record| record.is_active)
            .ok_or(ServiceError::NotConnected {
                exchange: exchange_id,
            })?;

        let credentials = self
            .cipher
            .decrypt_credentials(&record.credentials)
            .map_err(|source| ServiceError::Crypto {
                exchange: exchange_id,
                source,
            })?;

        let provider =
            self.factory
                .build(exchange_id, &credentials)
                .map_err(|source| ServiceError::Exchange {
                    exchange: exchange_id,
                    phase: SyncPhase::Connect,
                    source,
                })?;

        Ok((record, provider))
    }
}

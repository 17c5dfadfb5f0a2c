//! ExchangeService 통합 테스트.
//!
//! MemoryStore와 스크립트된 프로바이더 팩토리로 실제 네트워크 없이
//! connect/disconnect/sync 워크플로우를 검증합니다.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal_macros::dec;
use uuid::Uuid;

use folio_core::{
    Balance, Credentials, CredentialCipher, ExchangeId, ExchangeInfo, Transaction,
    TransactionFilters, TransactionKind,
};
use folio_exchange::{ExchangeError, ExchangeProvider, ExchangeResult};
use folio_sync::{
    ExchangeService, MemoryStore, PortfolioStore, ProviderFactory, ServiceError, SyncRange,
};

const MASTER_SECRET: &str = "a-test-master-secret-of-32-chars!";

// ============================================================
// 스크립트된 프로바이더
// ============================================================

/// 테스트 시나리오별로 동작을 지정할 수 있는 프로바이더.
#[derive(Clone)]
struct ScriptedProvider {
    connection_ok: bool,
    balances: Result<Vec<Balance>, String>,
    transactions: Result<Vec<Transaction>, String>,
    transactions_not_supported: bool,
}

impl ScriptedProvider {
    fn healthy(balances: Vec<Balance>, transactions: Vec<Transaction>) -> Self {
        Self {
            connection_ok: true,
            balances: Ok(balances),
            transactions: Ok(transactions),
            transactions_not_supported: false,
        }
    }

    fn rejecting_credentials() -> Self {
        Self {
            connection_ok: false,
            ..Self::healthy(Vec::new(), Vec::new())
        }
    }

    fn failing_balances(message: &str) -> Self {
        Self {
            balances: Err(message.to_string()),
            ..Self::healthy(Vec::new(), Vec::new())
        }
    }

    fn without_transaction_history(balances: Vec<Balance>) -> Self {
        Self {
            transactions_not_supported: true,
            ..Self::healthy(balances, Vec::new())
        }
    }
}

#[async_trait]
impl ExchangeProvider for ScriptedProvider {
    async fn test_connection(&self) -> bool {
        self.connection_ok
    }

    async fn get_balances(&self) -> ExchangeResult<Vec<Balance>> {
        match &self.balances {
            Ok(balances) => Ok(balances.clone()),
            Err(message) => Err(ExchangeError::Upstream {
                status: 503,
                message: message.clone(),
            }),
        }
    }

    async fn get_transactions(
        &self,
        filters: &TransactionFilters,
    ) -> ExchangeResult<Vec<Transaction>> {
        if self.transactions_not_supported {
            return Err(ExchangeError::NotSupported(
                "transaction history".to_string(),
            ));
        }
        match &self.transactions {
            Ok(transactions) => Ok(transactions
                .iter()
                .filter(|tx| filters.matches(tx))
                .cloned()
                .collect()),
            Err(message) => Err(ExchangeError::Upstream {
                status: 503,
                message: message.clone(),
            }),
        }
    }

    fn exchange_info(&self) -> ExchangeInfo {
        ExchangeInfo {
            id: ExchangeId::CoinDcx,
            name: ExchangeId::CoinDcx.display_name().to_string(),
            country: "India".to_string(),
            api_version: "test".to_string(),
        }
    }
}

/// 거래소별 프로바이더를 돌려주는 스크립트 팩토리.
#[derive(Default)]
struct ScriptedFactory {
    providers: HashMap<ExchangeId, ScriptedProvider>,
}

impl ScriptedFactory {
    fn with(mut self, exchange_id: ExchangeId, provider: ScriptedProvider) -> Self {
        self.providers.insert(exchange_id, provider);
        self
    }
}

impl ProviderFactory for ScriptedFactory {
    fn build(
        &self,
        exchange_id: ExchangeId,
        _credentials: &Credentials,
    ) -> ExchangeResult<Box<dyn ExchangeProvider>> {
        let provider = self
            .providers
            .get(&exchange_id)
            .cloned()
            .unwrap_or_else(ScriptedProvider::rejecting_credentials);
        Ok(Box::new(provider))
    }
}

// ============================================================
// 픽스처
// ============================================================

fn sample_balances() -> Vec<Balance> {
    vec![
        Balance::new("BTC", dec!(0.5), dec!(0.1)),
        Balance::new("INR", dec!(1000), dec!(0)),
    ]
}

fn sample_transaction(external_id: &str, kind: TransactionKind) -> Transaction {
    Transaction {
        external_id: external_id.to_string(),
        kind,
        currency: "BTC".to_string(),
        amount: dec!(0.25),
        timestamp: Utc::now(),
        fee: None,
        status: Some("EXECUTED".to_string()),
        metadata: serde_json::Value::Null,
    }
}

struct Harness {
    store: Arc<MemoryStore>,
    service: ExchangeService,
    user_id: Uuid,
    portfolio_id: Uuid,
}

fn harness(factory: ScriptedFactory) -> Harness {
    let store = Arc::new(MemoryStore::new());
    let cipher = Arc::new(CredentialCipher::new(MASTER_SECRET).unwrap());
    let service = ExchangeService::new(store.clone(), cipher, Arc::new(factory));
    Harness {
        store,
        service,
        user_id: Uuid::new_v4(),
        portfolio_id: Uuid::new_v4(),
    }
}

fn credentials() -> Credentials {
    Credentials::new("test-api-key", "test-api-secret")
}

// ============================================================
// connect / disconnect
// ============================================================

#[tokio::test]
async fn test_connect_stores_encrypted_credentials() {
    let factory = ScriptedFactory::default().with(
        ExchangeId::CoinDcx,
        ScriptedProvider::healthy(Vec::new(), Vec::new()),
    );
    let h = harness(factory);

    let view = h
        .service
        .connect_exchange(h.user_id, ExchangeId::CoinDcx, credentials())
        .await
        .unwrap();

    assert_eq!(view.exchange_id, ExchangeId::CoinDcx);
    assert!(view.is_active);

    // 저장소에는 평문이 절대 남지 않지만 복호화는 가능해야 함
    let record = h
        .store
        .find_connected_exchange(h.user_id, ExchangeId::CoinDcx)
        .await
        .unwrap()
        .unwrap();
    assert_ne!(record.credentials.api_key, "test-api-key");
    assert_ne!(record.credentials.api_secret, "test-api-secret");

    let cipher = CredentialCipher::new(MASTER_SECRET).unwrap();
    let decrypted = cipher.decrypt_credentials(&record.credentials).unwrap();
    assert_eq!(decrypted.api_key, "test-api-key");
    assert_eq!(decrypted.api_secret, "test-api-secret");
}

#[tokio::test]
async fn test_connect_invalid_credentials_writes_nothing() {
    let factory = ScriptedFactory::default()
        .with(ExchangeId::CoinDcx, ScriptedProvider::rejecting_credentials());
    let h = harness(factory);

    let result = h
        .service
        .connect_exchange(h.user_id, ExchangeId::CoinDcx, credentials())
        .await;

    assert!(matches!(
        result,
        Err(ServiceError::InvalidCredentials {
            exchange: ExchangeId::CoinDcx
        })
    ));

    let record = h
        .store
        .find_connected_exchange(h.user_id, ExchangeId::CoinDcx)
        .await
        .unwrap();
    assert!(record.is_none());
}

#[tokio::test]
async fn test_reconnect_replaces_credentials_and_reactivates() {
    let factory = ScriptedFactory::default().with(
        ExchangeId::CoinSwitch,
        ScriptedProvider::healthy(Vec::new(), Vec::new()),
    );
    let h = harness(factory);

    let first = h
        .service
        .connect_exchange(h.user_id, ExchangeId::CoinSwitch, credentials())
        .await
        .unwrap();

    h.service
        .disconnect_exchange(h.user_id, ExchangeId::CoinSwitch)
        .await
        .unwrap();

    let second = h
        .service
        .connect_exchange(
            h.user_id,
            ExchangeId::CoinSwitch,
            Credentials::new("rotated-key", "rotated-secret"),
        )
        .await
        .unwrap();

    // 같은 기록이 재활성화되고 자격증명만 교체됨
    assert_eq!(first.id, second.id);
    assert!(second.is_active);

    let record = h
        .store
        .find_connected_exchange(h.user_id, ExchangeId::CoinSwitch)
        .await
        .unwrap()
        .unwrap();
    let cipher = CredentialCipher::new(MASTER_SECRET).unwrap();
    let decrypted = cipher.decrypt_credentials(&record.credentials).unwrap();
    assert_eq!(decrypted.api_key, "rotated-key");
}

#[tokio::test]
async fn test_disconnect_is_soft_delete() {
    let factory = ScriptedFactory::default().with(
        ExchangeId::CoinDcx,
        ScriptedProvider::healthy(Vec::new(), Vec::new()),
    );
    let h = harness(factory);

    h.service
        .connect_exchange(h.user_id, ExchangeId::CoinDcx, credentials())
        .await
        .unwrap();
    h.service
        .disconnect_exchange(h.user_id, ExchangeId::CoinDcx)
        .await
        .unwrap();

    // 기록은 남아 있으나 비활성
    let record = h
        .store
        .find_connected_exchange(h.user_id, ExchangeId::CoinDcx)
        .await
        .unwrap()
        .unwrap();
    assert!(!record.is_active);

    // 활성 목록에서는 제외됨
    let active = h.service.connected_exchanges(h.user_id).await.unwrap();
    assert!(active.is_empty());
}

#[tokio::test]
async fn test_disconnect_without_connection_fails() {
    let h = harness(ScriptedFactory::default());

    let result = h
        .service
        .disconnect_exchange(h.user_id, ExchangeId::CoinDcx)
        .await;

    assert!(matches!(
        result,
        Err(ServiceError::NotConnected {
            exchange: ExchangeId::CoinDcx
        })
    ));
}

#[tokio::test]
async fn test_connected_exchanges_strip_credentials() {
    let factory = ScriptedFactory::default().with(
        ExchangeId::CoinDcx,
        ScriptedProvider::healthy(Vec::new(), Vec::new()),
    );
    let h = harness(factory);

    h.service
        .connect_exchange(h.user_id, ExchangeId::CoinDcx, credentials())
        .await
        .unwrap();

    let views = h.service.connected_exchanges(h.user_id).await.unwrap();
    assert_eq!(views.len(), 1);

    // 직렬화된 뷰에 자격증명 필드가 없어야 함
    let json = serde_json::to_string(&views[0]).unwrap();
    assert!(!json.contains("credentials"));
    assert!(!json.contains("api_key"));
}

// ============================================================
// test_connection
// ============================================================

#[tokio::test]
async fn test_connection_false_when_not_connected() {
    let h = harness(ScriptedFactory::default());
    assert!(!h.service.test_connection(h.user_id, ExchangeId::CoinDcx).await);
}

#[tokio::test]
async fn test_connection_false_after_disconnect() {
    let factory = ScriptedFactory::default().with(
        ExchangeId::CoinDcx,
        ScriptedProvider::healthy(Vec::new(), Vec::new()),
    );
    let h = harness(factory);

    h.service
        .connect_exchange(h.user_id, ExchangeId::CoinDcx, credentials())
        .await
        .unwrap();
    h.service
        .disconnect_exchange(h.user_id, ExchangeId::CoinDcx)
        .await
        .unwrap();

    assert!(!h.service.test_connection(h.user_id, ExchangeId::CoinDcx).await);
}

#[tokio::test]
async fn test_connection_true_for_active_record() {
    let factory = ScriptedFactory::default().with(
        ExchangeId::CoinSwitch,
        ScriptedProvider::healthy(Vec::new(), Vec::new()),
    );
    let h = harness(factory);

    h.service
        .connect_exchange(h.user_id, ExchangeId::CoinSwitch, credentials())
        .await
        .unwrap();

    assert!(h.service.test_connection(h.user_id, ExchangeId::CoinSwitch).await);
}

// ============================================================
// sync_balances / sync_transactions
// ============================================================

#[tokio::test]
async fn test_sync_balances_upserts_without_duplicates() {
    let factory = ScriptedFactory::default().with(
        ExchangeId::CoinDcx,
        ScriptedProvider::healthy(sample_balances(), Vec::new()),
    );
    let h = harness(factory);

    h.service
        .connect_exchange(h.user_id, ExchangeId::CoinDcx, credentials())
        .await
        .unwrap();

    let count = h
        .service
        .sync_balances(h.user_id, h.portfolio_id, ExchangeId::CoinDcx)
        .await
        .unwrap();
    assert_eq!(count, 2);
    assert_eq!(h.store.balance_count(h.portfolio_id).await, 2);

    // 재실행해도 같은 (exchange, currency) 키는 갱신만 됨
    h.service
        .sync_balances(h.user_id, h.portfolio_id, ExchangeId::CoinDcx)
        .await
        .unwrap();
    assert_eq!(h.store.balance_count(h.portfolio_id).await, 2);

    let btc = h
        .store
        .balance(h.portfolio_id, ExchangeId::CoinDcx, "BTC")
        .await
        .unwrap();
    assert_eq!(btc.total, dec!(0.6));
}

#[tokio::test]
async fn test_sync_balances_stamps_last_synced() {
    let factory = ScriptedFactory::default().with(
        ExchangeId::CoinDcx,
        ScriptedProvider::healthy(sample_balances(), Vec::new()),
    );
    let h = harness(factory);

    h.service
        .connect_exchange(h.user_id, ExchangeId::CoinDcx, credentials())
        .await
        .unwrap();

    let before = h
        .store
        .find_connected_exchange(h.user_id, ExchangeId::CoinDcx)
        .await
        .unwrap()
        .unwrap();
    assert!(before.last_synced_at.is_none());

    h.service
        .sync_balances(h.user_id, h.portfolio_id, ExchangeId::CoinDcx)
        .await
        .unwrap();

    let after = h
        .store
        .find_connected_exchange(h.user_id, ExchangeId::CoinDcx)
        .await
        .unwrap()
        .unwrap();
    assert!(after.last_synced_at.is_some());
}

#[tokio::test]
async fn test_sync_balances_requires_active_connection() {
    let h = harness(ScriptedFactory::default());

    let result = h.service.sync_balances(h.user_id, h.portfolio_id, ExchangeId::CoinDcx).await;
    assert!(matches!(
        result,
        Err(ServiceError::NotConnected { .. })
    ));
}

#[tokio::test]
async fn test_sync_transactions_is_idempotent() {
    let transactions = vec![
        sample_transaction("order-1", TransactionKind::Buy),
        sample_transaction("order-2", TransactionKind::Sell),
    ];
    let factory = ScriptedFactory::default().with(
        ExchangeId::CoinSwitch,
        ScriptedProvider::healthy(Vec::new(), transactions),
    );
    let h = harness(factory);

    h.service
        .connect_exchange(h.user_id, ExchangeId::CoinSwitch, credentials())
        .await
        .unwrap();

    let first = h
        .service
        .sync_transactions(h.user_id, h.portfolio_id, ExchangeId::CoinSwitch, SyncRange::default())
        .await
        .unwrap();
    let second = h
        .service
        .sync_transactions(h.user_id, h.portfolio_id, ExchangeId::CoinSwitch, SyncRange::default())
        .await
        .unwrap();

    assert_eq!(first, 2);
    assert_eq!(second, 2);
    assert_eq!(h.store.transaction_count(h.portfolio_id).await, 2);
}

#[tokio::test]
async fn test_sync_transactions_skips_empty_external_id() {
    let transactions = vec![
        sample_transaction("order-1", TransactionKind::Buy),
        sample_transaction("", TransactionKind::Sell),
    ];
    let factory = ScriptedFactory::default().with(
        ExchangeId::CoinSwitch,
        ScriptedProvider::healthy(Vec::new(), transactions),
    );
    let h = harness(factory);

    h.service
        .connect_exchange(h.user_id, ExchangeId::CoinSwitch, credentials())
        .await
        .unwrap();

    let count = h
        .service
        .sync_transactions(h.user_id, h.portfolio_id, ExchangeId::CoinSwitch, SyncRange::default())
        .await
        .unwrap();

    assert_eq!(count, 1);
    assert_eq!(h.store.transaction_count(h.portfolio_id).await, 1);
}

// ============================================================
// sync_all
// ============================================================

#[tokio::test]
async fn test_sync_all_isolates_partial_failure() {
    let factory = ScriptedFactory::default()
        .with(
            ExchangeId::CoinDcx,
            ScriptedProvider::healthy(sample_balances(), Vec::new()),
        )
        .with(
            ExchangeId::CoinSwitch,
            ScriptedProvider::failing_balances("maintenance window"),
        );
    let h = harness(factory);

    // CoinSwitch는 연결 시점에는 정상이었다가 이후 장애가 난 상황을
    // 흉내내기 위해 기록을 저장소에 직접 넣는다.
    h.service
        .connect_exchange(h.user_id, ExchangeId::CoinDcx, credentials())
        .await
        .unwrap();
    let cipher = CredentialCipher::new(MASTER_SECRET).unwrap();
    let encrypted = cipher.encrypt_credentials(&credentials()).unwrap();
    h.store
        .upsert_connected_exchange(folio_core::ConnectedExchange::new(
            h.user_id,
            ExchangeId::CoinSwitch,
            encrypted,
        ))
        .await
        .unwrap();

    let results = h
        .service
        .sync_all(h.user_id, h.portfolio_id, SyncRange::default())
        .await
        .unwrap();

    assert_eq!(results.len(), 2);

    let dcx = results
        .iter()
        .find(|r| r.exchange_id == ExchangeId::CoinDcx)
        .unwrap();
    assert!(dcx.success);
    assert_eq!(dcx.balances_synced, 2);

    let switch = results
        .iter()
        .find(|r| r.exchange_id == ExchangeId::CoinSwitch)
        .unwrap();
    assert!(!switch.success);
    let error = switch.error.as_deref().unwrap();
    assert!(!error.is_empty());
    assert!(error.contains("balances"));
}

#[tokio::test]
async fn test_sync_all_treats_unsupported_transactions_as_success() {
    let factory = ScriptedFactory::default().with(
        ExchangeId::CoinDcx,
        ScriptedProvider::without_transaction_history(sample_balances()),
    );
    let h = harness(factory);

    h.service
        .connect_exchange(h.user_id, ExchangeId::CoinDcx, credentials())
        .await
        .unwrap();

    let results = h
        .service
        .sync_all(h.user_id, h.portfolio_id, SyncRange::default())
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert!(results[0].success);
    assert_eq!(results[0].balances_synced, 2);
    assert_eq!(results[0].transactions_synced, 0);
}

#[tokio::test]
async fn test_sync_all_with_no_connections_is_empty() {
    let h = harness(ScriptedFactory::default());

    let results = h
        .service
        .sync_all(h.user_id, h.portfolio_id, SyncRange::default())
        .await
        .unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn test_sync_transactions_applies_range_filter() {
    let mut old = sample_transaction("order-old", TransactionKind::Buy);
    old.timestamp = Utc::now() - chrono::Duration::days(30);
    let recent = sample_transaction("order-new", TransactionKind::Buy);

    let factory = ScriptedFactory::default().with(
        ExchangeId::CoinSwitch,
        ScriptedProvider::healthy(Vec::new(), vec![old, recent]),
    );
    let h = harness(factory);

    h.service
        .connect_exchange(h.user_id, ExchangeId::CoinSwitch, credentials())
        .await
        .unwrap();

    let range = SyncRange::new(Some(Utc::now() - chrono::Duration::days(7)), None);
    let count = h
        .service
        .sync_transactions(h.user_id, h.portfolio_id, ExchangeId::CoinSwitch, range)
        .await
        .unwrap();

    assert_eq!(count, 1);
    assert!(h
        .store
        .transaction(h.portfolio_id, ExchangeId::CoinSwitch, "order-new")
        .await
        .is_some());
    assert!(h
        .store
        .transaction(h.portfolio_id, ExchangeId::CoinSwitch, "order-old")
        .await
        .is_none());
}

//! CoinSwitch ExchangeProvider 구현.
//!
//! 잔고 정규화 정책: 총액이 0인 항목은 제거합니다 (업스트림 포트폴리오가
//! 상장 폐지 통화까지 포함하므로).
//!
//! 거래 내역은 미체결/체결 주문 목록을 동시에 조회한 뒤 하나의 시간순
//! 목록으로 병합합니다. 같은 주문 id가 양쪽 목록에 모두 나타나면 체결
//! 목록이 결정적으로 우선합니다.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use serde_json::json;
use std::collections::HashMap;
use tracing::warn;

use folio_core::{
    Balance, ExchangeId, ExchangeInfo, Transaction, TransactionFilters, TransactionKind,
};

use crate::client::{CoinSwitchClient, CoinSwitchOrder, CoinSwitchPortfolioItem, OrderListParams};
use crate::error::ExchangeResult;

use super::ExchangeProvider;

/// 업스트림 주문 목록의 페이지당 최대 건수.
const MAX_ORDER_COUNT: u32 = 500;

/// CoinSwitch ExchangeProvider 구현.
pub struct CoinSwitchProvider {
    client: CoinSwitchClient,
}

impl CoinSwitchProvider {
    /// 새 CoinSwitchProvider 생성.
    pub fn new(client: CoinSwitchClient) -> Self {
        Self { client }
    }

    fn normalize_balance(item: CoinSwitchPortfolioItem) -> Balance {
        Balance::new(item.currency, item.main_balance, item.blocked_balance_order)
    }

    fn normalize_order(order: CoinSwitchOrder) -> Transaction {
        let kind = if order.side.eq_ignore_ascii_case("buy") {
            TransactionKind::Buy
        } else {
            TransactionKind::Sell
        };

        // "BTC/INR" -> "BTC"
        let currency = order
            .symbol
            .split('/')
            .next()
            .unwrap_or(order.symbol.as_str())
            .to_string();

        let amount = if order.executed_qty > Decimal::ZERO {
            order.executed_qty
        } else {
            order.orig_qty
        };

        let timestamp = Utc
            .timestamp_millis_opt(order.created_time)
            .single()
            .unwrap_or_else(Utc::now);
        let updated_at = Utc
            .timestamp_millis_opt(order.updated_time)
            .single()
            .unwrap_or(timestamp);

        Transaction {
            external_id: order.order_id,
            kind,
            currency,
            amount,
            timestamp,
            // CoinSwitch는 주문 응답에 수수료를 제공하지 않음
            fee: None,
            status: Some(order.status.clone()),
            metadata: json!({
                "symbol": order.symbol,
                "price": order.price,
                "average_price": order.average_price,
                "status": order.status,
                "exchange": order.exchange,
                "order_source": order.order_source,
                "updated_at": updated_at,
            }),
        }
    }

    fn order_params(filters: &TransactionFilters) -> OrderListParams {
        OrderListParams {
            count: Some(MAX_ORDER_COUNT),
            from_time: filters.start.map(|t| t.timestamp_millis()),
            to_time: filters.end.map(|t| t.timestamp_millis()),
            symbols: filters
                .currency
                .as_ref()
                .map(|c| format!("{}/INR", c.to_uppercase())),
        }
    }
}

#[async_trait]
impl ExchangeProvider for CoinSwitchProvider {
    async fn test_connection(&self) -> bool {
        match self.client.validate_keys().await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "CoinSwitch connection test failed");
                false
            }
        }
    }

    async fn get_balances(&self) -> ExchangeResult<Vec<Balance>> {
        let items = self.client.portfolio().await?;
        Ok(items
            .into_iter()
            .map(Self::normalize_balance)
            .filter(|balance| !balance.is_zero())
            .collect())
    }

    async fn get_transactions(
        &self,
        filters: &TransactionFilters,
    ) -> ExchangeResult<Vec<Transaction>> {
        let params = Self::order_params(filters);

        // 미체결/체결 목록을 동시에 조회
        let (open, closed) = tokio::join!(
            self.client.orders(true, &params),
            self.client.orders(false, &params),
        );
        let (open, closed) = (open?, closed?);

        // 주문 id 기준 병합. 체결 목록을 나중에 넣어 같은 id에서
        // 체결 쪽이 우선하도록 함
        let mut by_id: HashMap<String, Transaction> = HashMap::new();
        for order in open.into_iter().chain(closed) {
            let tx = Self::normalize_order(order);
            by_id.insert(tx.external_id.clone(), tx);
        }

        let mut transactions: Vec<Transaction> = by_id
            .into_values()
            .filter(|tx| filters.matches(tx))
            .collect();
        transactions.sort_by_key(|tx| tx.timestamp);

        if let Some(limit) = filters.limit {
            transactions.truncate(limit);
        }

        Ok(transactions)
    }

    fn exchange_info(&self) -> ExchangeInfo {
        ExchangeInfo {
            id: ExchangeId::CoinSwitch,
            name: "CoinSwitch PRO".to_string(),
            country: "India".to_string(),
            api_version: "v2".to_string(),
        }
    }
}

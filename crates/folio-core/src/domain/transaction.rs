//! 정규화된 거래 내역 모델.
//!
//! 이 모듈은 거래 내역 관련 타입을 정의합니다:
//! - `TransactionKind` - 거래 유형
//! - `Transaction` - 정규화된 거래 기록
//! - `TransactionFilters` - 정규화 이후 적용되는 필터

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 거래 유형.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Buy,
    Sell,
    Deposit,
    Withdrawal,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Buy => "buy",
            TransactionKind::Sell => "sell",
            TransactionKind::Deposit => "deposit",
            TransactionKind::Withdrawal => "withdrawal",
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 정규화된 거래 기록.
///
/// 중복 제거 식별자는 (portfolio, exchange, external_id)입니다. 같은 키로
/// 이미 기록된 거래는 제자리에서 갱신되며 절대 중복 저장되지 않습니다.
/// `external_id`가 빈 문자열인 기록은 중복 제거가 불가능하므로 저장 대상에서
/// 제외됩니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// 거래소가 부여한 외부 식별자
    pub external_id: String,
    /// 거래 유형
    pub kind: TransactionKind,
    /// 통화 코드
    pub currency: String,
    /// 수량
    pub amount: Decimal,
    /// 거래 시각
    pub timestamp: DateTime<Utc>,
    /// 수수료 (제공되지 않는 거래소도 있음)
    pub fee: Option<Decimal>,
    /// 거래소 측 상태 문자열
    pub status: Option<String>,
    /// 거래소별 추가 데이터
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// 거래 내역 조회 필터.
///
/// 모든 필터는 정규화 이후에 적용되므로 업스트림 API 지원 여부와
/// 무관하게 어댑터 간 의미가 동일합니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionFilters {
    pub kind: Option<TransactionKind>,
    pub currency: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
}

impl TransactionFilters {
    /// 거래가 이 필터를 통과하는지 검사합니다.
    pub fn matches(&self, tx: &Transaction) -> bool {
        if let Some(kind) = self.kind {
            if tx.kind != kind {
                return false;
            }
        }
        if let Some(ref currency) = self.currency {
            if !tx.currency.eq_ignore_ascii_case(currency) {
                return false;
            }
        }
        if let Some(start) = self.start {
            if tx.timestamp < start {
                return false;
            }
        }
        if let Some(end) = self.end {
            if tx.timestamp > end {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn sample_tx(kind: TransactionKind, currency: &str, ts: i64) -> Transaction {
        Transaction {
            external_id: "order-1".to_string(),
            kind,
            currency: currency.to_string(),
            amount: dec!(1.5),
            timestamp: Utc.timestamp_millis_opt(ts).unwrap(),
            fee: None,
            status: None,
            metadata: serde_json::Value::Null,
        }
    }

    #[test]
    fn test_filter_by_kind_and_currency() {
        let tx = sample_tx(TransactionKind::Buy, "BTC", 1_700_000_000_000);

        let filters = TransactionFilters {
            kind: Some(TransactionKind::Buy),
            currency: Some("btc".to_string()),
            ..Default::default()
        };
        assert!(filters.matches(&tx));

        let filters = TransactionFilters {
            kind: Some(TransactionKind::Sell),
            ..Default::default()
        };
        assert!(!filters.matches(&tx));
    }

    #[test]
    fn test_filter_by_date_range() {
        let tx = sample_tx(TransactionKind::Sell, "ETH", 1_700_000_000_000);

        let filters = TransactionFilters {
            start: Some(Utc.timestamp_millis_opt(1_600_000_000_000).unwrap()),
            end: Some(Utc.timestamp_millis_opt(1_800_000_000_000).unwrap()),
            ..Default::default()
        };
        assert!(filters.matches(&tx));

        let filters = TransactionFilters {
            end: Some(Utc.timestamp_millis_opt(1_600_000_000_000).unwrap()),
            ..Default::default()
        };
        assert!(!filters.matches(&tx));
    }
}

//! 정규화된 잔고 모델.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 한 거래소의 한 통화에 대한 정규화된 잔고.
///
/// 모든 어댑터는 거래소별 응답을 이 형태로 변환해야 합니다.
/// 불변식: `total == available + locked`, 모든 값은 음수가 아님.
/// (portfolio, exchange, currency)당 논리 레코드는 하나이며,
/// 저장은 항상 upsert로만 이루어집니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    /// 통화 코드 (예: "BTC", "USDT", "INR")
    pub currency: String,
    /// 거래/출금 가능한 잔고
    pub available: Decimal,
    /// 미체결 주문에 묶인 잔고
    pub locked: Decimal,
    /// 총 잔고 (available + locked)
    pub total: Decimal,
}

impl Balance {
    /// available/locked에서 잔고를 생성합니다. total은 합으로 계산됩니다.
    ///
    /// 두 값 모두 음수가 아니어야 합니다. 거래소는 음수 잔고를
    /// 보고하지 않으므로 어댑터 정규화 버그 검출용 디버그 단정으로만
    /// 검사합니다.
    pub fn new(currency: impl Into<String>, available: Decimal, locked: Decimal) -> Self {
        debug_assert!(
            available >= Decimal::ZERO && locked >= Decimal::ZERO,
            "balance components must be non-negative"
        );
        Self {
            currency: currency.into(),
            available,
            locked,
            total: available + locked,
        }
    }

    /// 총 잔고가 0인지 여부. 0 잔고 필터링은 어댑터 재량이지만
    /// 어댑터별로 일관되게 문서화되어야 합니다.
    pub fn is_zero(&self) -> bool {
        self.total.is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_total_is_sum() {
        let balance = Balance::new("BTC", dec!(5), dec!(3));
        assert_eq!(balance.total, dec!(8));
    }

    #[test]
    fn test_zero_balance_is_distinguishable() {
        // 0 잔고는 "잔고 없음"과 다른, 존재하는 레코드임
        let balance = Balance::new("ETH", dec!(0), dec!(0));
        assert!(balance.is_zero());
        assert_eq!(balance.currency, "ETH");
    }

    #[test]
    #[should_panic(expected = "non-negative")]
    #[cfg(debug_assertions)]
    fn test_negative_component_asserts_in_debug() {
        Balance::new("BTC", dec!(-1), dec!(0));
    }
}

//! 거래소 식별자 및 연결 기록.
//!
//! 이 모듈은 거래소 관련 타입을 정의합니다:
//! - `ExchangeId` - 지원 거래소의 닫힌 집합
//! - `ExchangeInfo` - 거래소 메타데이터
//! - `ConnectedExchange` - 사용자-거래소 연결 기록 (암호화된 자격증명 포함)
//! - `SyncResult` - 거래소별 동기화 결과

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::crypto::EncryptedCredentials;

/// 지원 거래소 식별자.
///
/// 거래소 추가는 변형 하나와 provider 어댑터 하나를 추가하는 것으로
/// 끝나야 합니다. 오케스트레이터는 수정되지 않습니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExchangeId {
    #[serde(rename = "coindcx")]
    CoinDcx,
    #[serde(rename = "coinswitch")]
    CoinSwitch,
}

impl ExchangeId {
    /// 모든 지원 거래소.
    pub const ALL: [ExchangeId; 2] = [ExchangeId::CoinDcx, ExchangeId::CoinSwitch];

    /// 저장소 키로 쓰이는 정규 식별자 문자열.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExchangeId::CoinDcx => "coindcx",
            ExchangeId::CoinSwitch => "coinswitch",
        }
    }

    /// 사용자에게 표시되는 이름.
    pub fn display_name(&self) -> &'static str {
        match self {
            ExchangeId::CoinDcx => "CoinDCX",
            ExchangeId::CoinSwitch => "CoinSwitch PRO",
        }
    }
}

impl std::fmt::Display for ExchangeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ExchangeId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "coindcx" => Ok(ExchangeId::CoinDcx),
            "coinswitch" => Ok(ExchangeId::CoinSwitch),
            _ => Err(format!("Unsupported exchange: {}", s)),
        }
    }
}

/// 거래소 메타데이터. 네트워크 호출 없이 제공됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeInfo {
    pub id: ExchangeId,
    pub name: String,
    pub country: String,
    pub api_version: String,
}

/// 사용자와 거래소 간 연결 기록.
///
/// 자격증명은 항상 암호화된 형태로만 보관됩니다. 비활성화(soft delete)는
/// `is_active` 플래그를 내리는 것이며, 물리 삭제는 명시적으로만 수행됩니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectedExchange {
    /// 내부 기록 ID
    pub id: Uuid,
    /// 사용자 ID
    pub user_id: Uuid,
    /// 거래소 식별자
    pub exchange_id: ExchangeId,
    /// 암호화된 자격증명
    pub credentials: EncryptedCredentials,
    /// 활성 여부
    pub is_active: bool,
    /// 마지막 동기화 시각
    pub last_synced_at: Option<DateTime<Utc>>,
    /// 생성 시각
    pub created_at: DateTime<Utc>,
}

impl ConnectedExchange {
    /// 새 활성 연결 기록을 생성합니다.
    pub fn new(user_id: Uuid, exchange_id: ExchangeId, credentials: EncryptedCredentials) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            exchange_id,
            credentials,
            is_active: true,
            last_synced_at: None,
            created_at: Utc::now(),
        }
    }
}

/// 자격증명이 제거된 연결 기록 뷰. API/로그 노출용.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectedExchangeView {
    pub id: Uuid,
    pub user_id: Uuid,
    pub exchange_id: ExchangeId,
    pub exchange_name: String,
    pub is_active: bool,
    pub last_synced_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<&ConnectedExchange> for ConnectedExchangeView {
    fn from(record: &ConnectedExchange) -> Self {
        Self {
            id: record.id,
            user_id: record.user_id,
            exchange_id: record.exchange_id,
            exchange_name: record.exchange_id.display_name().to_string(),
            is_active: record.is_active,
            last_synced_at: record.last_synced_at,
            created_at: record.created_at,
        }
    }
}

/// 거래소별 동기화 결과. 호출마다 생성되며 저장되지 않습니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncResult {
    pub exchange_id: ExchangeId,
    pub balances_synced: usize,
    pub transactions_synced: usize,
    pub success: bool,
    pub error: Option<String>,
}

impl SyncResult {
    /// 성공 결과를 생성합니다.
    pub fn success(exchange_id: ExchangeId, balances: usize, transactions: usize) -> Self {
        Self {
            exchange_id,
            balances_synced: balances,
            transactions_synced: transactions,
            success: true,
            error: None,
        }
    }

    /// 실패 결과를 생성합니다.
    pub fn failure(exchange_id: ExchangeId, error: impl Into<String>) -> Self {
        Self {
            exchange_id,
            balances_synced: 0,
            transactions_synced: 0,
            success: false,
            error: Some(error.into()),
        }
    }
}

//! 거래소 연동 계층.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - 거래소별 요청 서명 프로토콜 (HMAC-SHA256, Ed25519)
//! - 인증 HTTP 클라이언트 (타임아웃, 상태 코드 → 에러 매핑)
//! - ExchangeProvider trait: 거래소 중립 정규화 인터페이스
//! - CoinDCX / CoinSwitch provider 어댑터

pub mod client;
pub mod error;
pub mod provider;
pub mod sign;

pub use client::{CoinDcxClient, CoinDcxConfig, CoinSwitchClient, CoinSwitchConfig};
pub use error::{ExchangeError, ExchangeResult};
pub use provider::{build_provider, CoinDcxProvider, CoinSwitchProvider, ExchangeProvider};

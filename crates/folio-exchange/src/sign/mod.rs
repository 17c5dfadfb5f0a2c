//! 요청 서명 프로토콜.
//!
//! 거래소마다 독립적이고 호환되지 않는 두 전략을 제공합니다:
//! - [`hmac`]: CoinDCX — 본문에 타임스탬프를 주입한 압축 JSON에 대한
//!   HMAC-SHA256 (소문자 hex)
//! - [`ed25519`]: CoinSwitch — `METHOD + PATH + EPOCH(+ 정렬된 본문)`
//!   메시지에 대한 Ed25519 서명 (hex)
//!
//! 두 전략 모두 (method, path, body, secret, timestamp)의 순수 함수이므로
//! 네트워크 없이 단위 테스트할 수 있습니다.

pub mod ed25519;
pub mod hmac;

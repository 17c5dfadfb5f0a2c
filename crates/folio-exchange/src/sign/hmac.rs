//! CoinDCX HMAC-SHA256 서명 전략.
//!
//! 요청 본문에 서버 기준 밀리초 타임스탬프 필드를 주입하고, 공백 없는
//! 압축 JSON으로 직렬화한 문자열 전체를 `HMAC-SHA256(secret, payload)`로
//! 서명합니다. 타임스탬프는 헤더가 아니라 서명 대상 본문에 포함됩니다.
//! 서버가 오래된 타임스탬프를 거부하므로 서명은 전송 직전에 수행해야
//! 하며, 미리 계산해 두면 안 됩니다.
//!
//! 전송되는 본문 바이트는 서명된 payload 문자열과 동일해야 합니다.

use hmac::{Hmac, Mac};
use serde_json::{Map, Value};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// API 키 헤더 이름.
pub const HEADER_API_KEY: &str = "X-AUTH-APIKEY";

/// 서명 헤더 이름.
pub const HEADER_SIGNATURE: &str = "X-AUTH-SIGNATURE";

/// 타임스탬프를 주입한 서명 대상 payload 생성.
///
/// 반환된 문자열이 서명 대상이자 전송 본문입니다 (공백 없는 압축 JSON).
pub fn signed_payload(body: &Map<String, Value>, timestamp_ms: i64) -> String {
    let mut payload = body.clone();
    payload.insert("timestamp".to_string(), Value::from(timestamp_ms));

    // serde_json의 압축 직렬화는 공백을 넣지 않음 (CoinDCX 요구사항)
    Value::Object(payload).to_string()
}

/// payload를 HMAC-SHA256으로 서명하여 소문자 hex로 반환.
pub fn sign(payload: &str, secret: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(payload.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_injects_timestamp() {
        let mut body = Map::new();
        body.insert("a".to_string(), json!(1));

        let payload = signed_payload(&body, 1_499_827_319_559);
        assert_eq!(payload, r#"{"a":1,"timestamp":1499827319559}"#);
    }

    #[test]
    fn test_empty_body_payload() {
        let payload = signed_payload(&Map::new(), 1_700_000_000_000);
        assert_eq!(payload, r#"{"timestamp":1700000000000}"#);
    }

    #[test]
    fn test_known_vector() {
        // 참조 구현으로 재현한 고정 벡터:
        // HMAC-SHA256(k, {"a":1,"timestamp":1499827319559})
        let mut body = Map::new();
        body.insert("a".to_string(), json!(1));
        let payload = signed_payload(&body, 1_499_827_319_559);

        assert_eq!(
            sign(&payload, "k"),
            "0b541080b6d3990ec02e685de0b94b34b9e9eeca86f15fa8f3333039dcf82b68"
        );
    }

    #[test]
    fn test_known_vector_empty_body() {
        let payload = signed_payload(&Map::new(), 1_700_000_000_000);
        assert_eq!(
            sign(&payload, "test-secret"),
            "67332dd108edaf5183991cfff880ca9b30de11e502b1a6914b1c100431868cd1"
        );
    }

    #[test]
    fn test_signature_is_lowercase_hex() {
        let signature = sign("payload", "secret");
        assert_eq!(signature.len(), 64);
        assert!(signature
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }
}

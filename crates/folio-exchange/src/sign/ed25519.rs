//! CoinSwitch Ed25519 서명 전략.
//!
//! 서명 메시지는 `METHOD + PATH + EPOCH_MILLIS` 연결이며, 본문이 있는
//! POST/DELETE 요청은 본문 키를 사전순으로 정렬한 압축 JSON을 메시지
//! 뒤에 붙입니다. GET 요청은 본문이 잘못 전달되어도 메시지에 포함하지
//! 않습니다. 서명 키는 hex 인코딩된 Ed25519 개인키(32바이트 시드)이고,
//! 서명은 UTF-8 메시지 바이트에 대해 수행되어 hex로 반환됩니다.
//!
//! `X-AUTH-EPOCH` 헤더 값은 서명에 사용된 epoch 문자열과 바이트 단위로
//! 동일해야 합니다.

use ed25519_dalek::{Signer, SigningKey, SECRET_KEY_LENGTH};
use serde_json::{Map, Value};

use crate::error::ExchangeError;

/// API 키 헤더 이름.
pub const HEADER_API_KEY: &str = "X-AUTH-APIKEY";

/// 서명 헤더 이름.
pub const HEADER_SIGNATURE: &str = "X-AUTH-SIGNATURE";

/// epoch 타임스탬프 헤더 이름.
pub const HEADER_EPOCH: &str = "X-AUTH-EPOCH";

/// 서명 대상 메시지 생성.
///
/// 본문은 GET이 아닌 요청에서 비어 있지 않을 때만 포함됩니다.
/// serde_json의 객체 직렬화는 모든 깊이에서 키를 사전순으로 정렬하므로
/// 호출자가 키를 어떤 순서로 넣어도 메시지는 동일합니다.
pub fn signature_message(
    method: &str,
    path: &str,
    epoch_ms: &str,
    body: Option<&Map<String, Value>>,
) -> String {
    let mut message = format!("{}{}{}", method, path, epoch_ms);

    if !method.eq_ignore_ascii_case("GET") {
        if let Some(body) = body {
            if !body.is_empty() {
                message.push_str(&Value::Object(body.clone()).to_string());
            }
        }
    }

    message
}

/// 메시지를 Ed25519로 서명하여 hex로 반환.
///
/// # Errors
/// `secret_hex`가 유효한 32바이트 hex 시드가 아니면
/// `ExchangeError::InvalidCredential`을 반환합니다.
pub fn sign(message: &str, secret_hex: &str) -> Result<String, ExchangeError> {
    let bytes = hex::decode(secret_hex)
        .map_err(|e| ExchangeError::InvalidCredential(format!("Ed25519 key hex: {}", e)))?;

    let seed: [u8; SECRET_KEY_LENGTH] = bytes.try_into().map_err(|b: Vec<u8>| {
        ExchangeError::InvalidCredential(format!(
            "Ed25519 key must be {} bytes, got {}",
            SECRET_KEY_LENGTH,
            b.len()
        ))
    })?;

    let signing_key = SigningKey::from_bytes(&seed);
    let signature = signing_key.sign(message.as_bytes());

    Ok(hex::encode(signature.to_bytes()))
}

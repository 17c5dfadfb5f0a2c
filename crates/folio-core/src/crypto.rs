//! # 암호화 모듈
//!
//! AES-256-GCM을 사용한 자격증명 암호화/복호화 기능을 제공합니다.
//!
//! ## 보안 고려사항
//! - 마스터 시크릿은 환경변수 또는 설정 파일에서 로드 (최소 32자)
//! - 키는 Argon2id로 마스터 시크릿에서 파생 (호출마다 새로운 salt)
//! - 각 암호화마다 고유한 nonce (12바이트) 사용
//! - 동일한 평문을 두 번 암호화해도 서로 다른 블롭이 생성됨
//!   (암호문 비교로 동등성이 유출되지 않도록 하기 위한 요구사항)
//!
//! ## 블롭 형식
//! `hex( salt(32) || nonce(12) || ciphertext+tag(16) )`

use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use thiserror::Error;

/// 암호화 에러
#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("Master secret must be at least {min} characters, got {actual}")]
    WeakMasterSecret { min: usize, actual: usize },

    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("Invalid encrypted blob: {0}")]
    InvalidBlob(String),

    #[error("Hex decode error: {0}")]
    HexDecode(#[from] hex::FromHexError),

    #[error("UTF-8 decode error: {0}")]
    Utf8Error(#[from] std::string::FromUtf8Error),
}

/// 키 파생용 salt 크기 (바이트)
pub const SALT_SIZE: usize = 32;

/// AES-256-GCM nonce 크기 (바이트)
pub const NONCE_SIZE: usize = 12;

/// GCM 인증 태그 크기 (바이트)
pub const TAG_SIZE: usize = 16;

/// AES-256 키 크기 (바이트)
pub const KEY_SIZE: usize = 32;

/// 마스터 시크릿 최소 길이 (문자)
pub const MIN_MASTER_SECRET_LEN: usize = 32;

/// API 자격증명 쌍 (평문).
///
/// 요청 처리 중에만 메모리에 존재해야 하며, 절대 저장소나 로그에
/// 평문으로 기록되면 안 됩니다. `Debug` 구현은 전체를 마스킹합니다.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub api_key: String,
    pub api_secret: String,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"***REDACTED***")
            .field("api_secret", &"***REDACTED***")
            .finish()
    }
}

/// 암호화된 자격증명 쌍. 저장소에 기록되는 유일한 형태입니다.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct EncryptedCredentials {
    pub api_key: String,
    pub api_secret: String,
}

/// 자격증명 암호화 관리자.
///
/// 마스터 시크릿을 보관하고, 호출마다 새로운 salt로 AES-256 키를
/// 파생하여 암호화/복호화를 수행합니다.
pub struct CredentialCipher {
    master_secret: SecretString,
}

impl CredentialCipher {
    /// 마스터 시크릿으로 암호화 관리자 생성.
    ///
    /// # Errors
    /// 마스터 시크릿이 32자 미만이면 `CryptoError::WeakMasterSecret`을
    /// 반환합니다. 이 검증은 프로세스 시작 시점에 수행되어야 합니다.
    pub fn new(master_secret: impl Into<String>) -> Result<Self, CryptoError> {
        let master_secret: String = master_secret.into();
        let len = master_secret.chars().count();
        if len < MIN_MASTER_SECRET_LEN {
            return Err(CryptoError::WeakMasterSecret {
                min: MIN_MASTER_SECRET_LEN,
                actual: len,
            });
        }

        Ok(Self {
            master_secret: SecretString::new(master_secret.into()),
        })
    }

    /// Argon2id로 마스터 시크릿에서 AES-256 키 파생.
    fn derive_key(&self, salt: &[u8]) -> Result<[u8; KEY_SIZE], CryptoError> {
        let mut key = [0u8; KEY_SIZE];
        argon2::Argon2::default()
            .hash_password_into(self.master_secret.expose_secret().as_bytes(), salt, &mut key)
            .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;
        Ok(key)
    }

    /// 문자열 암호화.
    ///
    /// 호출마다 독립적인 랜덤 salt와 nonce를 생성하므로 같은 평문을
    /// 같은 시크릿으로 두 번 암호화해도 결과가 다릅니다.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError> {
        let mut salt = [0u8; SALT_SIZE];
        OsRng.fill_bytes(&mut salt);
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce_bytes);

        let key = self.derive_key(&salt)?;
        let cipher = Aes256Gcm::new_from_slice(&key)
            .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

        let nonce = Nonce::from_slice(&nonce_bytes);
        let ciphertext = cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

        let mut blob = Vec::with_capacity(SALT_SIZE + NONCE_SIZE + ciphertext.len());
        blob.extend_from_slice(&salt);
        blob.extend_from_slice(&nonce_bytes);
        blob.extend_from_slice(&ciphertext);

        Ok(hex::encode(blob))
    }

    /// 암호화된 블롭 복호화.
    ///
    /// # Errors
    /// 블롭의 어느 부분이라도 변조되었거나 마스터 시크릿이 다르면
    /// GCM 인증 태그 검증이 실패하여 `CryptoError::DecryptionFailed`를
    /// 반환합니다. 부분 복호화는 발생하지 않습니다.
    pub fn decrypt(&self, blob: &str) -> Result<String, CryptoError> {
        let bytes = hex::decode(blob)?;

        if bytes.len() < SALT_SIZE + NONCE_SIZE + TAG_SIZE {
            return Err(CryptoError::InvalidBlob(format!(
                "blob too short: {} bytes",
                bytes.len()
            )));
        }

        let (salt, rest) = bytes.split_at(SALT_SIZE);
        let (nonce_bytes, ciphertext) = rest.split_at(NONCE_SIZE);

        let key = self.derive_key(salt)?;
        let cipher = Aes256Gcm::new_from_slice(&key)
            .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))?;

        let nonce = Nonce::from_slice(nonce_bytes);
        let plaintext = cipher
            .decrypt(nonce, ciphertext)
            .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))?;

        String::from_utf8(plaintext).map_err(CryptoError::from)
    }

    /// 자격증명 쌍 암호화.
    pub fn encrypt_credentials(
        &self,
        credentials: &Credentials,
    ) -> Result<EncryptedCredentials, CryptoError> {
        Ok(EncryptedCredentials {
            api_key: self.encrypt(&credentials.api_key)?,
            api_secret: self.encrypt(&credentials.api_secret)?,
        })
    }

    /// 암호화된 자격증명 쌍 복호화.
    pub fn decrypt_credentials(
        &self,
        encrypted: &EncryptedCredentials,
    ) -> Result<Credentials, CryptoError> {
        Ok(Credentials {
            api_key: self.decrypt(&encrypted.api_key)?,
            api_secret: self.decrypt(&encrypted.api_secret)?,
        })
    }
}

impl fmt::Debug for CredentialCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialCipher")
            .field("master_secret", &"***REDACTED***")
            .finish()
    }
}

//! 설정 관리.
//!
//! 이 모듈은 애플리케이션 설정을 정의하고 관리합니다.
//! 마스터 시크릿 검증은 설정 로드 시점에 수행됩니다 (첫 사용 시점이 아님).

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

use crate::crypto::MIN_MASTER_SECRET_LEN;

/// 설정 에러.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 설정 소스 로드/파싱 실패
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// 마스터 시크릿 누락 또는 길이 미달 (치명적, 시작 시점에 검출)
    #[error("Encryption master secret must be at least {MIN_MASTER_SECRET_LEN} characters")]
    WeakMasterSecret,
}

/// 애플리케이션 설정.
#[derive(Debug, Deserialize)]
pub struct AppConfig {
    /// 암호화 설정
    pub encryption: EncryptionConfig,
    /// 거래소별 설정 (키: 거래소 id)
    #[serde(default)]
    pub exchanges: HashMap<String, ExchangeEndpointConfig>,
    /// 로깅 설정
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// 암호화 설정.
#[derive(Debug, Deserialize)]
pub struct EncryptionConfig {
    /// 자격증명 암호화 마스터 시크릿 (최소 32자)
    pub master_secret: SecretString,
}

/// 거래소 엔드포인트 설정.
#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeEndpointConfig {
    /// 기본 URL 오버라이드 (미설정 시 거래소 기본값 사용)
    pub base_url: Option<String>,
    /// 요청 타임아웃 (초)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ExchangeEndpointConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// 로그 레벨 필터 (예: "info", "folio_sync=debug")
    pub level: String,
    /// 출력 형식 ("pretty", "json", "compact")
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl AppConfig {
    /// 파일과 환경 변수에서 설정을 로드합니다.
    ///
    /// 환경 변수는 `FOLIO` 접두어와 `__` 구분자를 사용합니다.
    /// 예: `FOLIO__ENCRYPTION__MASTER_SECRET`
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let builder = config::Config::builder()
            // 파일에서 로드
            .add_source(config::File::from(path.as_ref()).required(false))
            // 환경 변수로 오버라이드
            .add_source(
                config::Environment::with_prefix("FOLIO")
                    .separator("__")
                    .try_parsing(true),
            );

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// 기본 경로에서 설정을 로드합니다.
    pub fn load_default() -> Result<Self, ConfigError> {
        Self::load("config/default.toml")
    }

    /// 설정 유효성 검증. 로드 직후 호출됩니다.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let len = self
            .encryption
            .master_secret
            .expose_secret()
            .chars()
            .count();
        if len < MIN_MASTER_SECRET_LEN {
            return Err(ConfigError::WeakMasterSecret);
        }
        Ok(())
    }

    /// 거래소별 설정 조회 (없으면 기본값).
    pub fn exchange(&self, exchange_id: &str) -> ExchangeEndpointConfig {
        self.exchanges
            .get(exchange_id)
            .cloned()
            .unwrap_or_default()
    }
}

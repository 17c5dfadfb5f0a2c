//! # Folio Core
//!
//! 포트폴리오 집계 시스템의 핵심 도메인 모델 및 타입을 제공합니다.
//!
//! 이 크레이트는 시스템 전반에서 사용되는 기본 타입을 제공합니다:
//! - 거래소 식별자 및 연결 기록
//! - 잔고 및 거래 내역 구조체
//! - 자격증명 암호화 (AES-256-GCM + Argon2id)
//! - 설정 관리
//! - 로깅 인프라

pub mod config;
pub mod crypto;
pub mod domain;
pub mod logging;

pub use config::*;
pub use crypto::{Credentials, CredentialCipher, CryptoError, EncryptedCredentials};
pub use domain::*;
pub use logging::*;

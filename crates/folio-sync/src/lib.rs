//! 동기화 오케스트레이션 계층.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - PortfolioStore trait: 영속성 경계 (소비만 하고 구현하지 않음)
//! - ExchangeService: connect/disconnect/sync 워크플로우
//! - 거래소 간 부분 실패 격리 (`sync_all`)
//! - MemoryStore: 테스트용 인메모리 저장소

pub mod error;
pub mod memory;
pub mod service;
pub mod store;

pub use error::{ServiceError, SyncPhase};
pub use memory::MemoryStore;
pub use service::{ExchangeService, HttpProviderFactory, ProviderFactory, SyncRange};
pub use store::{PortfolioStore, StoreError, StoreResult};

//! 포트폴리오 집계를 위한 도메인 모델.

mod balance;
mod exchange;
mod transaction;

pub use balance::*;
pub use exchange::*;
pub use transaction::*;

//! 포트 인터페이스 (trait).
//!
//! Hexagonal Architecture의 포트 레이어.
//! 어댑터 crate가 이 trait들을 구현하며,
//! 수집기(`clerk-telemetry`)에서 `Arc<dyn T>`로 와이어링한다.
//!
//! 네트워크 전송만 async이고, 수집 경로(`record`)에서 동기 호출되는
//! 저장소/시계/파서 포트는 동기 trait이다.

pub mod clock;
pub mod debug_sink;
pub mod key_parser;
pub mod key_value_store;
pub mod sdk_metadata;
pub mod transport;

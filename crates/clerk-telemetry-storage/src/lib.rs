//! # clerk-telemetry-storage
//!
//! `KeyValueStore` 포트 어댑터.
//! 쓰로틀러의 TTL 캐시를 보관하는 저장소 구현들을 제공한다.
//!
//! ## 모듈
//! - `memory`: 인메모리 저장소 (용량 제한/쓰기 거부 주입 지원)
//! - `file_store`: JSON 파일 저장소 (원자적 재작성)
//! - `sqlite`: SQLite 저장소
//! - `migration`: SQLite 스키마 마이그레이션

pub mod file_store;
pub mod memory;
pub mod migration;
pub mod sqlite;

pub use file_store::JsonFileStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

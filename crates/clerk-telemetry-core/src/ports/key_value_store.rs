//! 영속 키-값 저장소 포트.
//!
//! 쓰로틀러의 TTL 캐시가 저장되는 곳.
//! 구현: `clerk-telemetry-storage` crate (메모리, JSON 파일, SQLite)

use crate::error::StorageError;

/// 문자열 키-값 저장소
///
/// 여러 수집기 인스턴스/프로세스가 공유할 수 있으며, 읽기-수정-쓰기에
/// 원자성을 요구하지 않는다.
pub trait KeyValueStore: Send + Sync {
    /// 값 조회. 키가 없으면 `Ok(None)`.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// 값 저장 (덮어쓰기)
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// 키 삭제. 없는 키는 no-op.
    fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// 저장된 항목 수
    fn len(&self) -> Result<usize, StorageError>;

    /// 비어 있는지 여부
    fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.len()? == 0)
    }
}

//! 인메모리 키-값 저장소.
//!
//! 프로세스 수명 동안만 유지된다. 용량 제한과 쓰기 거부를 주입할 수 있어
//! 쓰로틀러의 "저장소 사용 불가" 경로를 결정적으로 재현한다.

use clerk_telemetry_core::error::StorageError;
use clerk_telemetry_core::ports::key_value_store::KeyValueStore;
use parking_lot::Mutex;
use std::collections::HashMap;

/// 인메모리 저장소
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
    /// 키+값 바이트 합계 상한
    quota_bytes: Option<usize>,
    /// 모든 쓰기를 거부 (프라이버시 모드 재현)
    reject_writes: bool,
}

impl MemoryStore {
    /// 빈 저장소 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 바이트 용량 제한 설정
    pub fn with_quota(mut self, quota_bytes: usize) -> Self {
        self.quota_bytes = Some(quota_bytes);
        self
    }

    /// 모든 쓰기를 `Unavailable`로 거부
    pub fn rejecting_writes(mut self) -> Self {
        self.reject_writes = true;
        self
    }

    fn used_bytes(entries: &HashMap<String, String>) -> usize {
        entries.iter().map(|(k, v)| k.len() + v.len()).sum()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.reject_writes {
            return Err(StorageError::Unavailable("쓰기 거부됨".to_string()));
        }

        let mut entries = self.entries.lock();
        if let Some(quota) = self.quota_bytes {
            let existing = entries.get(key).map_or(0, |v| key.len() + v.len());
            let projected = Self::used_bytes(&entries) - existing + key.len() + value.len();
            if projected > quota {
                return Err(StorageError::QuotaExceeded);
            }
        }
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.lock().remove(key);
        Ok(())
    }

    fn len(&self) -> Result<usize, StorageError> {
        Ok(self.entries.lock().len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_remove() {
        let store = MemoryStore::new();
        assert_eq!(store.get("k").unwrap(), None);

        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
        assert_eq!(store.len().unwrap(), 1);

        store.remove("k").unwrap();
        assert!(store.is_empty().unwrap());
        // 없는 키 삭제는 no-op
        store.remove("k").unwrap();
    }

    #[test]
    fn quota_is_enforced() {
        let store = MemoryStore::new().with_quota(10);
        store.set("abc", "1234567").unwrap(); // 10 bytes
        let err = store.set("x", "y").unwrap_err();
        assert!(err.is_quota_exceeded());

        // 같은 키 덮어쓰기는 기존 크기를 제외하고 계산
        store.set("abc", "123").unwrap();
        store.set("x", "y").unwrap();
    }

    #[test]
    fn rejecting_store_fails_writes_but_reads() {
        let store = MemoryStore::new().rejecting_writes();
        assert!(matches!(
            store.set("k", "v"),
            Err(StorageError::Unavailable(_))
        ));
        assert_eq!(store.get("k").unwrap(), None);
    }
}

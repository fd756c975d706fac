//! JSON 파일 키-값 저장소.
//!
//! 하나의 JSON 객체 파일에 모든 항목을 보관한다. 다른 프로세스와 파일을
//! 공유할 수 있도록 매 연산마다 파일을 다시 읽고, 쓰기는 임시 파일 +
//! rename으로 원자적으로 교체한다.

use clerk_telemetry_core::error::StorageError;
use clerk_telemetry_core::ports::key_value_store::KeyValueStore;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

type Entries = BTreeMap<String, String>;

/// JSON 파일 저장소
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    /// 같은 프로세스 내 읽기-수정-쓰기 직렬화
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// 지정된 경로로 저장소 열기. 상위 디렉토리가 없으면 생성한다.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
                info!("저장소 디렉토리 생성: {}", parent.display());
            }
        }

        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    /// 저장소 파일 경로
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Entries, StorageError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Entries::new()),
            Err(e) => return Err(e.into()),
        };

        if content.trim().is_empty() {
            return Ok(Entries::new());
        }

        match serde_json::from_str(&content) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                // 손상된 파일은 빈 저장소로 취급하고 다음 쓰기에서 덮어쓴다
                warn!("저장소 파일 파싱 실패, 빈 저장소로 취급: {}: {e}", self.path.display());
                Ok(Entries::new())
            }
        }
    }

    fn persist(&self, entries: &Entries) -> Result<(), StorageError> {
        let json = serde_json::to_string(entries)
            .map_err(|e| StorageError::Backend(format!("직렬화 실패: {e}")))?;

        // 확장자 교체가 아닌 접미사 추가
        let mut tmp_path = self.path.clone().into_os_string();
        tmp_path.push(".tmp");
        let tmp_path = PathBuf::from(tmp_path);
        fs::write(&tmp_path, json).map_err(map_write_error)?;
        fs::rename(&tmp_path, &self.path).map_err(map_write_error)?;
        debug!("저장소 파일 저장: {} ({}개 항목)", self.path.display(), entries.len());
        Ok(())
    }
}

/// 쓰기 권한 없음은 사용 불가로 매핑
fn map_write_error(e: std::io::Error) -> StorageError {
    if e.kind() == ErrorKind::PermissionDenied {
        StorageError::Unavailable(e.to_string())
    } else {
        StorageError::Io(e)
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock();
        let mut entries = self.load()?;
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock();
        let mut entries = self.load()?;
        if entries.remove(key).is_some() {
            self.persist(&entries)?;
        }
        Ok(())
    }

    fn len(&self) -> Result<usize, StorageError> {
        Ok(self.load()?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::open(dir.path().join("kv.json")).unwrap();
        assert_eq!(store.get("k").unwrap(), None);
        assert_eq!(store.len().unwrap(), 0);
    }

    #[test]
    fn creates_parent_directory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("deeper").join("kv.json");
        let store = JsonFileStore::open(&path).unwrap();
        store.set("k", "v").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn persists_across_instances() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("kv.json");

        {
            let store = JsonFileStore::open(&path).unwrap();
            store.set("clerk_telemetry_throttler", r#"{"a":1}"#).unwrap();
            store.set("other", "x").unwrap();
        }

        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(
            reopened.get("clerk_telemetry_throttler").unwrap().as_deref(),
            Some(r#"{"a":1}"#)
        );
        assert_eq!(reopened.len().unwrap(), 2);

        reopened.remove("other").unwrap();
        assert_eq!(reopened.len().unwrap(), 1);
    }

    #[test]
    fn corrupt_file_reads_as_empty_and_is_overwritten() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("kv.json");
        fs::write(&path, "{not json").unwrap();

        let store = JsonFileStore::open(&path).unwrap();
        assert_eq!(store.len().unwrap(), 0);

        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn temp_file_does_not_clobber_sibling_or_tmp_named_store() {
        let dir = TempDir::new().unwrap();
        let tmp_named = JsonFileStore::open(dir.path().join("kv.tmp")).unwrap();
        tmp_named.set("k", "v").unwrap();
        assert_eq!(tmp_named.get("k").unwrap().as_deref(), Some("v"));

        let json = JsonFileStore::open(dir.path().join("cache.json")).unwrap();
        let db = JsonFileStore::open(dir.path().join("cache.db")).unwrap();
        json.set("from", "json").unwrap();
        db.set("from", "db").unwrap();

        assert_eq!(json.get("from").unwrap().as_deref(), Some("json"));
        assert_eq!(db.get("from").unwrap().as_deref(), Some("db"));
        assert!(!dir.path().join("kv.tmp.tmp").exists());
        assert!(!dir.path().join("cache.json.tmp").exists());
    }
}

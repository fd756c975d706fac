//! SQLite 키-값 저장소 어댑터.
//!
//! `KeyValueStore` 포트 구현. 여러 프로세스가 같은 DB 파일을 열어
//! 쓰로틀 캐시를 공유할 수 있다 (WAL 모드).

use clerk_telemetry_core::error::StorageError;
use clerk_telemetry_core::ports::key_value_store::KeyValueStore;
use parking_lot::Mutex;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use std::path::Path;
use tracing::info;

use crate::migration;

/// SQLite 저장소
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// 파일 기반 SQLite 저장소 생성
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let conn = Connection::open(path).map_err(map_sqlite_error)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
            PRAGMA busy_timeout=2000;
            ",
        )
        .map_err(map_sqlite_error)?;

        migration::run_migrations(&conn).map_err(map_sqlite_error)?;
        info!("SQLite 저장소 초기화: {}", path.display());

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// 인메모리 SQLite 저장소 생성 (테스트용)
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory().map_err(map_sqlite_error)?;
        migration::run_migrations(&conn).map_err(map_sqlite_error)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

/// rusqlite 에러 → 저장소 에러
fn map_sqlite_error(e: rusqlite::Error) -> StorageError {
    match e.sqlite_error_code() {
        Some(ErrorCode::DiskFull) => StorageError::QuotaExceeded,
        Some(ErrorCode::ReadOnly) | Some(ErrorCode::CannotOpen) | Some(ErrorCode::PermissionDenied) => {
            StorageError::Unavailable(e.to_string())
        }
        _ => StorageError::Backend(e.to_string()),
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT value FROM kv_store WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()
        .map_err(map_sqlite_error)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value],
        )
        .map_err(map_sqlite_error)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let conn = self.conn.lock();
        conn.execute("DELETE FROM kv_store WHERE key = ?1", params![key])
            .map_err(map_sqlite_error)?;
        Ok(())
    }

    fn len(&self) -> Result<usize, StorageError> {
        let conn = self.conn.lock();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM kv_store", [], |row| row.get(0))
            .map_err(map_sqlite_error)?;
        Ok(usize::try_from(count).unwrap_or_default())
    }
}

//! 텔레메트리 핵심 에러 타입.
//!
//! 어댑터 crate는 외부 에러(reqwest, rusqlite, io)를 이 타입들로 매핑한다.
//! 수집기 내부 실패는 호출자에게 전파되지 않고 로그 후 흡수된다.

use thiserror::Error;

/// 코어 레이어 에러.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// JSON 직렬화/역직렬화 실패
    #[error("직렬화 에러: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 설정값 오류
    #[error("설정 에러: {0}")]
    Config(String),

    /// 필드 유효성 검증 실패
    #[error("유효성 검증 실패 ({field}): {message}")]
    Validation {
        /// 검증 실패한 필드명
        field: String,
        /// 실패 사유
        message: String,
    },

    /// 네트워크 에러 (연결 실패, 타임아웃)
    #[error("네트워크 에러: {0}")]
    Network(String),

    /// 수집 서버가 비정상 상태 코드를 반환
    #[error("수집 서버 응답 에러 ({status}): {body}")]
    Http {
        /// HTTP 상태 코드
        status: u16,
        /// 응답 본문 (진단용)
        body: String,
    },

    /// 영속 저장소 에러
    #[error("저장소 에러: {0}")]
    Storage(#[from] StorageError),

    /// 내부 에러 (예상치 못한 상황)
    #[error("내부 에러: {0}")]
    Internal(String),
}

/// 키-값 저장소 에러.
///
/// 쓰로틀러는 어떤 변형이든 "쓰로틀링 불가"로 취급한다.
#[derive(Debug, Error)]
pub enum StorageError {
    /// 저장소를 사용할 수 없음 (권한, 프라이버시 모드 등)
    #[error("저장소 사용 불가: {0}")]
    Unavailable(String),

    /// 저장 용량 초과
    #[error("저장소 용량 초과")]
    QuotaExceeded,

    /// I/O 에러
    #[error("I/O 에러: {0}")]
    Io(#[from] std::io::Error),

    /// 백엔드 고유 에러 (SQLite 등)
    #[error("저장소 백엔드 에러: {0}")]
    Backend(String),
}

impl StorageError {
    /// 용량 초과 에러 여부
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, StorageError::QuotaExceeded)
    }
}

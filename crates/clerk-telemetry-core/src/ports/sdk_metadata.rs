//! SDK 메타데이터 제공 포트.
//!
//! 런타임에 SDK가 스스로를 등록하는 경우, 수집기는 매 `record` 시점에
//! 이 포트를 조회하여 최신 등록값을 사용한다.
//! 구현: `clerk-telemetry` crate (`SdkRegistry`)

use crate::models::sdk::SdkMetadata;

/// 현재 등록된 SDK 메타데이터 제공자
pub trait SdkMetadataProvider: Send + Sync {
    /// 현재 등록값. 등록 전이면 `None`.
    fn sdk_metadata(&self) -> Option<SdkMetadata>;
}

//! SDK 메타데이터 모델.

use serde::{Deserialize, Serialize};

/// 텔레메트리를 발생시키는 SDK 이름/버전
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SdkMetadata {
    /// SDK 패키지 이름 (예: "@clerk/nextjs")
    pub name: String,
    /// SDK 버전
    pub version: String,
}

impl SdkMetadata {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

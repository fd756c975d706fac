//! 텔레메트리 도메인 모델.
//!
//! 수집 서버와 주고받는 데이터 구조체를 정의한다.
//! 모든 모델은 `serde` Serialize/Deserialize를 구현한다.

pub mod event;
pub mod sdk;

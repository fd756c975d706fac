//! # clerk-telemetry-core
//!
//! 텔레메트리 도메인 모델, 포트(trait) 정의, 에러 타입.
//! 모든 크레이트가 공유하는 핵심 타입과 인터페이스를 제공한다.
//!
//! ## 구조
//!
//! - [`models`]: 원시 이벤트 / 보강된 이벤트 / 배치 (serde Serialize/Deserialize)
//! - [`ports`]: Hexagonal Architecture 포트 인터페이스
//! - [`error`]: 핵심 에러 타입 (thiserror)
//! - [`config`]: 수집기 설정 구조체
//! - [`environment`]: 환경 변수 기반 오버라이드
//! - [`publishable_key`]: publishable key 파서

pub mod config;
pub mod environment;
pub mod error;
pub mod models;
pub mod ports;
pub mod publishable_key;

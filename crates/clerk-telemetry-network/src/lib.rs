//! # clerk-telemetry-network
//!
//! 수집 엔드포인트 네트워크 어댑터.
//! `EventTransport` 포트를 reqwest로 구현하여 `POST {endpoint}/v1/event`로
//! 이벤트 배치를 전송한다.
//!
//! ## 사용 예시
//!
//! ```rust,ignore
//! use clerk_telemetry_network::http_transport::HttpEventTransport;
//!
//! let transport = HttpEventTransport::new("https://clerk-telemetry.com", Duration::from_secs(10))?;
//! ```

pub mod http_transport;

pub use http_transport::HttpEventTransport;

//! 플러시 스케줄링.
//!
//! 실행 컨텍스트에 따라 플러시 시점을 정한다.
//! - 서버: 이후 실행이 보장되지 않으므로 매 이벤트마다 즉시 플러시
//! - 이벤트 루프: tokio 런타임에 지연 플러시 태스크를 예약하고 취소 가능한 핸들 보관

use clerk_telemetry_core::config::{DeferMode, ExecutionContextKind};
use std::time::Duration;
use tokio::runtime::{Handle, Runtime};
use tokio::task::JoinHandle;
use tracing::warn;

/// 확정된 실행 컨텍스트
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionContext {
    /// 요청 단위 실행: 배치 없이 즉시 플러시
    Server,
    /// 장수명 이벤트 루프: 지연 플러시
    EventLoop(DeferMode),
}

impl ExecutionContext {
    /// 설정값과 런타임 유무로 실행 컨텍스트 결정
    pub fn resolve(kind: ExecutionContextKind, defer: DeferMode, runtime_available: bool) -> Self {
        match kind {
            ExecutionContextKind::Server => Self::Server,
            ExecutionContextKind::Auto if runtime_available => Self::EventLoop(defer),
            ExecutionContextKind::Auto => Self::Server,
            ExecutionContextKind::EventLoop if runtime_available => Self::EventLoop(defer),
            ExecutionContextKind::EventLoop => {
                warn!("tokio 런타임 없음: 이벤트 루프 모드 대신 즉시 플러시로 동작");
                Self::Server
            }
        }
    }

    pub fn is_server(&self) -> bool {
        matches!(self, Self::Server)
    }
}

/// 예약된 지연 플러시 핸들
#[derive(Debug)]
pub struct PendingFlush {
    handle: JoinHandle<()>,
}

impl PendingFlush {
    /// 예약 취소. 이미 실행 중이거나 끝났으면 no-op.
    pub fn cancel(self) {
        self.handle.abort();
    }

    /// 예약된 플러시가 이미 실행되었는지 여부
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// 호스트에 tokio 런타임이 없을 때 전송 전용으로 띄우는 런타임
///
/// 드롭 시 워커를 기다리지 않고 종료하므로 비동기 컨텍스트에서 드롭해도 안전하다.
#[derive(Debug)]
pub struct BackgroundRuntime {
    runtime: Option<Runtime>,
    handle: Handle,
}

impl BackgroundRuntime {
    pub fn start() -> std::io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("clerk-telemetry")
            .enable_all()
            .build()?;
        let handle = runtime.handle().clone();

        Ok(Self {
            runtime: Some(runtime),
            handle,
        })
    }

    pub fn handle(&self) -> Handle {
        self.handle.clone()
    }
}

impl Drop for BackgroundRuntime {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

/// 지연 플러시 예약
///
/// `Idle`은 현재 준비된 태스크에 양보한 뒤, `Timer`는 0ms 타이머 후 실행한다.
pub fn schedule_deferred<F>(runtime: &Handle, mode: DeferMode, flush: F) -> PendingFlush
where
    F: FnOnce() + Send + 'static,
{
    let handle = runtime.spawn(async move {
        match mode {
            DeferMode::Idle => tokio::task::yield_now().await,
            DeferMode::Timer => tokio::time::sleep(Duration::ZERO).await,
        }
        flush();
    });

    PendingFlush { handle }
}

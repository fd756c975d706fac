//! 환경 변수 기반 오버라이드.
//!
//! 호스트 프로세스가 설정 코드를 건드리지 않고도 텔레메트리를 끄거나
//! 디버그 모드로 전환할 수 있게 한다. 수집기 생성 시 한 번 읽는다.

/// 텔레메트리 강제 비활성화 환경 변수
pub const TELEMETRY_DISABLED_ENV: &str = "CLERK_TELEMETRY_DISABLED";
/// 디버그 모드 환경 변수
pub const TELEMETRY_DEBUG_ENV: &str = "CLERK_TELEMETRY_DEBUG";

/// 수집기 동작에 영향을 주는 실행 환경 플래그
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnvironmentFlags {
    /// `CLERK_TELEMETRY_DISABLED`가 참
    pub telemetry_disabled: bool,
    /// `CLERK_TELEMETRY_DEBUG`가 참
    pub telemetry_debug: bool,
    /// 자동화 테스트 드라이버(headless 브라우저 등) 환경
    ///
    /// 호스트(웹뷰 등)만 알 수 있으므로 환경 변수에서 읽지 않는다.
    pub automated_driver: bool,
}

impl EnvironmentFlags {
    /// 현재 프로세스 환경 변수에서 읽기
    pub fn from_process_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// 임의의 조회 함수로 읽기 (테스트용)
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let flag = |name: &str| lookup(name).as_deref().is_some_and(is_truthy);
        Self {
            telemetry_disabled: flag(TELEMETRY_DISABLED_ENV),
            telemetry_debug: flag(TELEMETRY_DEBUG_ENV),
            automated_driver: false,
        }
    }

    /// 자동화 드라이버 플래그 설정
    pub fn with_automated_driver(mut self, automated: bool) -> Self {
        self.automated_driver = automated;
        self
    }
}

/// 참으로 해석되는 문자열인지 판별
///
/// `true`(대소문자 무시), `1` 또는 양의 정수.
pub fn is_truthy(value: &str) -> bool {
    let value = value.trim();
    if value.eq_ignore_ascii_case("true") {
        return true;
    }
    value.parse::<i64>().is_ok_and(|n| n > 0)
}

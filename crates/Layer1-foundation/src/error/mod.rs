//! Error types for skiff
//!
//! 모든 에러를 중앙에서 관리

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// skiff 에러 타입
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // 설정 관련
    // ========================================================================
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not logged in. Please run `skiff login`.")]
    NotLoggedIn,

    // ========================================================================
    // 저장소 관련
    // ========================================================================
    #[error("Storage error: {0}")]
    Storage(String),

    // ========================================================================
    // Sandbox 서비스 관련
    // ========================================================================
    #[error("Service not found: {0}")]
    ServiceNotFound(String),

    #[error("Service {0} has never started")]
    ServiceNotStarted(String),

    // ========================================================================
    // 로그 스트림 관련
    // ========================================================================
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Malformed log line: {0}")]
    MalformedLine(String),

    // ========================================================================
    // 일반
    // ========================================================================
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // ========================================================================
    // 외부 에러 변환
    // ========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Transport 에러 생성 헬퍼
    pub fn transport(context: &str, err: impl std::fmt::Display) -> Self {
        Error::Transport(format!("{}: {}", context, err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_messages() {
        assert_eq!(
            Error::ServiceNotFound("web".into()).to_string(),
            "Service not found: web"
        );
        assert_eq!(
            Error::ServiceNotStarted("db".into()).to_string(),
            "Service db has never started"
        );
    }

    #[test]
    fn test_transport_helper() {
        let err = Error::transport("open logs for web", "connection refused");
        assert_eq!(
            err.to_string(),
            "Transport error: open logs for web: connection refused"
        );
    }

    #[test]
    fn test_not_logged_in_message() {
        assert!(Error::NotLoggedIn.to_string().contains("skiff login"));
    }
}

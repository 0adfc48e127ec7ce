//! # skiff-foundation
//!
//! Foundation layer for skiff:
//! - Error: 중앙 에러 타입
//! - Storage: JsonStore (글로벌 / 프로젝트 설정 파일)
//! - Config: SkiffConfig, LogsConfig
//! - Auth: AuthStore (토큰 + sandbox endpoint)

pub mod auth;
pub mod config;
pub mod error;
pub mod storage;

// ============================================================================
// Error
// ============================================================================
pub use error::{Error, Result};

// ============================================================================
// Config (설정)
// ============================================================================
pub use config::{LogsConfig, SkiffConfig, SKIFF_CONFIG_FILE};

// ============================================================================
// Auth (인증)
// ============================================================================
pub use auth::{AuthStore, AUTH_FILE};

// ============================================================================
// Storage (저장소)
// ============================================================================
pub use storage::JsonStore;

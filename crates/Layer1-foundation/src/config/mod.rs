//! Config - 통합 설정 관리
//!
//! - `logs.rs` - 로그 스트리밍 튜닝 값
//! - `skiff.rs` - SkiffConfig 통합 설정

mod logs;
mod skiff;

pub use logs::{LogsConfig, LogsOverrides};
pub use skiff::{ConfigFile, SkiffConfig, SKIFF_CONFIG_FILE};

//! Skiff Config - 통합 설정
//!
//! 글로벌(`~/.config/skiff/config.json`)과 프로젝트(`.skiff/config.json`)
//! 설정을 병합한다. 프로젝트 설정이 우선한다.

use crate::storage::JsonStore;
use crate::Result;
use serde::Deserialize;
use tracing::debug;

use super::{LogsConfig, LogsOverrides};

/// 설정 파일명
pub const SKIFF_CONFIG_FILE: &str = "config.json";

/// skiff 통합 설정 (병합 결과)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkiffConfig {
    /// 버전 (마이그레이션용)
    pub version: u32,

    /// Docker Engine endpoint of the sandbox (`tcp://host:2375`).
    /// `None` uses the local defaults (`DOCKER_HOST` or the unix socket).
    pub docker_host: Option<String>,

    /// Compose project the services belong to
    pub project: Option<String>,

    /// 로그 스트리밍 설정
    pub logs: LogsConfig,
}

/// 설정 파일 하나의 내용. 파일에 없는 키는 `None`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigFile {
    pub version: Option<u32>,
    pub docker_host: Option<String>,
    pub project: Option<String>,
    #[serde(default)]
    pub logs: LogsOverrides,
}

fn default_version() -> u32 {
    1
}

impl SkiffConfig {
    pub fn new() -> Self {
        Self {
            version: default_version(),
            ..Default::default()
        }
    }

    // ========================================================================
    // Load
    // ========================================================================

    /// 글로벌 + 프로젝트 병합 로드
    pub fn load() -> Result<Self> {
        let global = JsonStore::global().ok();
        let project = JsonStore::current_project().ok();
        Self::load_from(global.as_ref(), project.as_ref())
    }

    /// Merge the given stores, later ones winning
    pub fn load_from(global: Option<&JsonStore>, project: Option<&JsonStore>) -> Result<Self> {
        let mut config = Self::new();

        for store in [global, project].into_iter().flatten() {
            if let Some(found) = store.load_optional::<ConfigFile>(SKIFF_CONFIG_FILE)? {
                debug!("Loaded config from {}", store.base_dir().display());
                config.merge(found);
            }
        }

        config.logs.validate()?;
        Ok(config)
    }

    // ========================================================================
    // Merge
    // ========================================================================

    /// 설정 파일 하나를 병합 (파일에 있는 키가 우선)
    pub fn merge(&mut self, other: ConfigFile) {
        if other.docker_host.is_some() {
            self.docker_host = other.docker_host;
        }
        if other.project.is_some() {
            self.project = other.project;
        }
        self.logs.merge(other.logs);
        if let Some(version) = other.version {
            self.version = self.version.max(version);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_prefers_other() {
        let mut base = SkiffConfig::new();
        base.docker_host = Some("tcp://global:2375".to_string());
        base.project = Some("shop".to_string());

        base.merge(ConfigFile {
            docker_host: Some("tcp://project:2375".to_string()),
            ..Default::default()
        });
        assert_eq!(base.docker_host.as_deref(), Some("tcp://project:2375"));
        assert_eq!(base.project.as_deref(), Some("shop"));
    }

    #[test]
    fn test_load_from_stores() {
        let global_dir = tempfile::tempdir().unwrap();
        let project_dir = tempfile::tempdir().unwrap();
        let global = JsonStore::new(global_dir.path());
        let project = JsonStore::new(project_dir.path());

        std::fs::write(
            global.file_path(SKIFF_CONFIG_FILE),
            r#"{"dockerHost": "tcp://sandbox:2375", "logs": {"windowMs": 200}}"#,
        )
        .unwrap();
        std::fs::write(project.file_path(SKIFF_CONFIG_FILE), r#"{"project": "shop"}"#).unwrap();

        let config = SkiffConfig::load_from(Some(&global), Some(&project)).unwrap();
        assert_eq!(config.docker_host.as_deref(), Some("tcp://sandbox:2375"));
        assert_eq!(config.project.as_deref(), Some("shop"));
        assert_eq!(config.logs.window_ms, 200);
    }

    #[test]
    fn test_project_logs_merged_per_key() {
        let global_dir = tempfile::tempdir().unwrap();
        let project_dir = tempfile::tempdir().unwrap();
        let global = JsonStore::new(global_dir.path());
        let project = JsonStore::new(project_dir.path());

        std::fs::write(
            global.file_path(SKIFF_CONFIG_FILE),
            r#"{"logs": {"windowMs": 250, "reconnectDelayMs": 1000}}"#,
        )
        .unwrap();
        // Explicitly the default value, still wins over the global 250
        std::fs::write(
            project.file_path(SKIFF_CONFIG_FILE),
            r#"{"logs": {"windowMs": 100}}"#,
        )
        .unwrap();

        let config = SkiffConfig::load_from(Some(&global), Some(&project)).unwrap();
        assert_eq!(config.logs.window_ms, 100);
        assert_eq!(config.logs.reconnect_delay_ms, 1000);
        assert_eq!(config.logs.open_retry_delay_ms, 5_000);
    }

    #[test]
    fn test_load_without_files() {
        let config = SkiffConfig::load_from(None, None).unwrap();
        assert_eq!(config, SkiffConfig::new());
    }

    #[test]
    fn test_invalid_logs_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path());
        std::fs::write(
            store.file_path(SKIFF_CONFIG_FILE),
            r#"{"logs": {"windowMs": 0}}"#,
        )
        .unwrap();

        assert!(SkiffConfig::load_from(Some(&store), None).is_err());
    }
}

//! Auth Store - 로컬 인증 정보
//!
//! `skiff login` stores the token and sandbox endpoint in
//! `~/.config/skiff/auth.json`; every other command reads them back.

use crate::storage::JsonStore;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// 인증 파일명
pub const AUTH_FILE: &str = "auth.json";

/// Credentials for the sandbox controller
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthStore {
    #[serde(default)]
    pub auth_token: String,

    /// Docker Engine endpoint of the user's sandbox
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sandbox_host: Option<String>,
}

impl AuthStore {
    /// 글로벌 저장소에서 로드 (없으면 빈 값)
    pub fn load() -> Result<Self> {
        Self::load_from(&JsonStore::global()?)
    }

    pub fn load_from(store: &JsonStore) -> Result<Self> {
        Ok(store.load_optional(AUTH_FILE)?.unwrap_or_default())
    }

    /// 글로벌 저장소에 저장
    pub fn save(&self) -> Result<()> {
        self.save_to(&JsonStore::global()?)
    }

    pub fn save_to(&self, store: &JsonStore) -> Result<()> {
        store.save(AUTH_FILE, self)
    }

    /// Forget stored credentials. Missing file is fine.
    pub fn clear_from(store: &JsonStore) -> Result<()> {
        store.remove(AUTH_FILE)
    }

    pub fn is_logged_in(&self) -> bool {
        !self.auth_token.trim().is_empty()
    }

    /// Fails with [`Error::NotLoggedIn`] when there is no token
    pub fn require_login(&self) -> Result<&Self> {
        if self.is_logged_in() {
            Ok(self)
        } else {
            Err(Error::NotLoggedIn)
        }
    }
}

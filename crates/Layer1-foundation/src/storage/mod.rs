//! Storage module for skiff
//!
//! - `json`: JSON - 설정/인증 파일 저장/로드

mod json;

pub use json::JsonStore;

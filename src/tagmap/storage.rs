//! 标签地址表模块：持久化边界（tags.json 读写，原子写入）。
//!
//! 约束：
//! - 写入先落 `*.tmp` 再改名，中途失败不得破坏既有文件
//! - Normalizer 输出写到独立的 `*.new` 路径，晋升（覆盖原文件）
//!   是单独的人工步骤
//! - 缺少顶层 `tags` 集合必须在任何改写发生之前报错

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::tagmap::legacy::LegacyTagsFile;
use crate::tagmap::model::{TagsV1, SCHEMA_VERSION_V1};

pub const TAGS_FILE_NAME: &str = "tags.json";
pub const NORMALIZED_EXTENSION: &str = "new";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("document has no top-level `tags` collection")]
    MissingTags,

    #[error("unsupported schemaVersion: {0}")]
    UnsupportedSchemaVersion(u32),
}

/// Normalizer 的输出路径：`tags.json` → `tags.json.new`。
pub fn normalized_output_path(input: &Path) -> PathBuf {
    let mut name = input
        .file_name()
        .map(|v| v.to_os_string())
        .unwrap_or_default();
    name.push(".");
    name.push(NORMALIZED_EXTENSION);
    input.with_file_name(name)
}

pub fn save_tags(path: &Path, payload: &TagsV1) -> Result<(), StorageError> {
    if payload.schema_version != SCHEMA_VERSION_V1 {
        return Err(StorageError::UnsupportedSchemaVersion(
            payload.schema_version,
        ));
    }
    write_json_atomic(path, payload)
}

pub fn load_tags(path: &Path) -> Result<TagsV1, StorageError> {
    let text = std::fs::read_to_string(path)?;
    let value: serde_json::Value = serde_json::from_str(&text)?;
    match value.get("tags") {
        Some(serde_json::Value::Array(_)) => {}
        _ => return Err(StorageError::MissingTags),
    }
    if let Some(version) = value.get("schemaVersion").and_then(|v| v.as_u64()) {
        if version != SCHEMA_VERSION_V1 as u64 {
            return Err(StorageError::UnsupportedSchemaVersion(version as u32));
        }
    }
    Ok(serde_json::from_value(value)?)
}

pub fn save_legacy_tags(path: &Path, payload: &LegacyTagsFile) -> Result<(), StorageError> {
    write_json_atomic(path, payload)
}

pub fn load_legacy_tags(path: &Path) -> Result<LegacyTagsFile, StorageError> {
    let text = std::fs::read_to_string(path)?;
    let value: serde_json::Value = serde_json::from_str(&text)?;
    match value.get("Tags") {
        Some(serde_json::Value::Array(_)) => {}
        _ => return Err(StorageError::MissingTags),
    }
    Ok(serde_json::from_value(value)?)
}

fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let json = serde_json::to_string_pretty(value)?;
    let tmp_path = path.with_extension("tmp");
    std::fs::write(&tmp_path, json)?;
    if path.exists() {
        std::fs::remove_file(path)?;
    }
    std::fs::rename(tmp_path, path)?;
    Ok(())
}

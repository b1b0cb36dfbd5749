//! 标签地址表模块：旧版数字编码 schema 适配器（兼容历史 tags.json）。
//!
//! 旧版文档以 PascalCase 键 + 整数枚举码持久化（如 `"Register": 2`、
//! `"Type": 5`）。码表来自旧客户端的枚举序号，一经对外使用即冻结：
//! - Register: 0=Holding, 1=Input, 2=Coils。旧表没有离散输入码，
//!   观测数据把 X 家族也记在 2（Coils）下，导出 Discrete 时按 2 写出
//!   （有损，导入后 X 会回到 Coil）。
//! - Type: 0=UInt16, 1=Int16, 2=UInt32, 3=Int32, 4=Float32, 5=Bool,
//!   6=Int64, 7=Double。2/6/7 在规范模型中无对应，解码报错。
//! - WordOrder: 0=HighLow, 1=LowHigh。
//!
//! 规范模型不携带任何一侧编码的怪癖；两种 schema 都是它的适配器。

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tagmap::model::{
    AddressRangeInfo, DataType, RegisterArea, Tag, TagsV1, TypeOrigin, WordOrder,
    SCHEMA_VERSION_V1,
};

pub const LEGACY_REGISTER_HOLDING: u8 = 0;
pub const LEGACY_REGISTER_INPUT: u8 = 1;
pub const LEGACY_REGISTER_COILS: u8 = 2;

pub const LEGACY_TYPE_UINT16: u8 = 0;
pub const LEGACY_TYPE_INT16: u8 = 1;
pub const LEGACY_TYPE_UINT32: u8 = 2;
pub const LEGACY_TYPE_INT32: u8 = 3;
pub const LEGACY_TYPE_FLOAT32: u8 = 4;
pub const LEGACY_TYPE_BOOL: u8 = 5;
pub const LEGACY_TYPE_INT64: u8 = 6;
pub const LEGACY_TYPE_DOUBLE: u8 = 7;

pub const LEGACY_WORD_ORDER_HIGH_LOW: u8 = 0;
pub const LEGACY_WORD_ORDER_LOW_HIGH: u8 = 1;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LegacyError {
    #[error("tag {name}: unknown legacy register code {code}")]
    UnknownRegisterCode { name: String, code: u8 },

    #[error("tag {name}: legacy type code {code} has no canonical counterpart")]
    UnsupportedTypeCode { name: String, code: u8 },

    #[error("tag {name}: unknown legacy word order code {code}")]
    UnknownWordOrderCode { name: String, code: u8 },
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct LegacyTag {
    pub enabled: bool,
    pub name: String,
    pub address: u16,
    pub register: u8,
    #[serde(rename = "Type")]
    pub type_code: u8,
    pub word_order: u8,
    pub scale: f64,
    pub offset: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct LegacyRange {
    pub start: u16,
    pub end: u16,
    pub description: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct LegacyTagsFile {
    pub tags: Vec<LegacyTag>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub groups: IndexMap<String, Vec<String>>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub address_ranges: IndexMap<String, LegacyRange>,
}

pub fn register_to_code(area: RegisterArea) -> u8 {
    match area {
        RegisterArea::Holding => LEGACY_REGISTER_HOLDING,
        RegisterArea::Input => LEGACY_REGISTER_INPUT,
        // 旧表没有离散输入码，观测数据把 X 记在 Coils 下。
        RegisterArea::Coil | RegisterArea::Discrete => LEGACY_REGISTER_COILS,
    }
}

pub fn register_from_code(name: &str, code: u8) -> Result<RegisterArea, LegacyError> {
    match code {
        LEGACY_REGISTER_HOLDING => Ok(RegisterArea::Holding),
        LEGACY_REGISTER_INPUT => Ok(RegisterArea::Input),
        LEGACY_REGISTER_COILS => Ok(RegisterArea::Coil),
        other => Err(LegacyError::UnknownRegisterCode {
            name: name.to_string(),
            code: other,
        }),
    }
}

pub fn data_type_to_code(data_type: DataType) -> u8 {
    match data_type {
        DataType::UInt16 => LEGACY_TYPE_UINT16,
        DataType::Int16 => LEGACY_TYPE_INT16,
        DataType::Int32 => LEGACY_TYPE_INT32,
        DataType::Float32 => LEGACY_TYPE_FLOAT32,
        DataType::Bool => LEGACY_TYPE_BOOL,
    }
}

pub fn data_type_from_code(name: &str, code: u8) -> Result<DataType, LegacyError> {
    match code {
        LEGACY_TYPE_UINT16 => Ok(DataType::UInt16),
        LEGACY_TYPE_INT16 => Ok(DataType::Int16),
        LEGACY_TYPE_INT32 => Ok(DataType::Int32),
        LEGACY_TYPE_FLOAT32 => Ok(DataType::Float32),
        LEGACY_TYPE_BOOL => Ok(DataType::Bool),
        other => Err(LegacyError::UnsupportedTypeCode {
            name: name.to_string(),
            code: other,
        }),
    }
}

pub fn word_order_to_code(word_order: WordOrder) -> u8 {
    match word_order {
        WordOrder::HighLow => LEGACY_WORD_ORDER_HIGH_LOW,
        WordOrder::LowHigh => LEGACY_WORD_ORDER_LOW_HIGH,
    }
}

pub fn word_order_from_code(name: &str, code: u8) -> Result<WordOrder, LegacyError> {
    match code {
        LEGACY_WORD_ORDER_HIGH_LOW => Ok(WordOrder::HighLow),
        LEGACY_WORD_ORDER_LOW_HIGH => Ok(WordOrder::LowHigh),
        other => Err(LegacyError::UnknownWordOrderCode {
            name: name.to_string(),
            code: other,
        }),
    }
}

impl LegacyTagsFile {
    pub fn from_canonical(config: &TagsV1) -> Self {
        let tags = config
            .tags
            .iter()
            .map(|tag| LegacyTag {
                enabled: tag.enabled,
                name: tag.name.clone(),
                address: tag.address,
                register: register_to_code(tag.register),
                type_code: data_type_to_code(tag.data_type),
                word_order: word_order_to_code(tag.word_order),
                scale: tag.scale,
                offset: tag.offset,
            })
            .collect();
        let address_ranges = config
            .address_ranges
            .iter()
            .map(|(prefix, info)| {
                (
                    prefix.clone(),
                    LegacyRange {
                        start: info.start,
                        end: info.end,
                        description: info.description.clone(),
                    },
                )
            })
            .collect();
        Self {
            tags,
            groups: config.groups.clone(),
            address_ranges,
        }
    }

    pub fn to_canonical(&self) -> Result<TagsV1, LegacyError> {
        let mut tags = Vec::with_capacity(self.tags.len());
        for tag in &self.tags {
            tags.push(Tag {
                enabled: tag.enabled,
                name: tag.name.clone(),
                address: tag.address,
                register: register_from_code(&tag.name, tag.register)?,
                data_type: data_type_from_code(&tag.name, tag.type_code)?,
                word_order: word_order_from_code(&tag.name, tag.word_order)?,
                scale: tag.scale,
                offset: tag.offset,
                type_origin: TypeOrigin::Default,
            });
        }
        let address_ranges = self
            .address_ranges
            .iter()
            .map(|(prefix, range)| {
                (
                    prefix.clone(),
                    AddressRangeInfo {
                        start: range.start,
                        end: range.end,
                        description: range.description.clone(),
                    },
                )
            })
            .collect();
        Ok(TagsV1 {
            schema_version: SCHEMA_VERSION_V1,
            tags,
            groups: self.groups.clone(),
            address_ranges,
        })
    }
}

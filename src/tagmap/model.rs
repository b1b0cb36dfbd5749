//! 标签地址表模块：稳定数据模型（冻结 v1）。
//!
//! 约束：
//! - 持久化 JSON 顶层必须包含 `schemaVersion: 1`
//! - 标签以 `name`（如 `X0`、`CV48`）作为全局唯一业务键
//! - Normalizer 只拥有 `dataType` 字段，其余字段一律原样保留

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub const SCHEMA_VERSION_V1: u32 = 1;

fn default_schema_version() -> u32 {
    SCHEMA_VERSION_V1
}

fn default_enabled() -> bool {
    true
}

fn default_scale() -> f64 {
    1.0
}

fn default_offset() -> f64 {
    0.0
}

/// Modbus 寄存器区。位地址空间（Discrete/Coil）与字地址空间
/// （Input/Holding）相互独立。
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum RegisterArea {
    Discrete,
    Coil,
    Input,
    Holding,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Access {
    ReadOnly,
    ReadWrite,
}

impl RegisterArea {
    pub fn is_bit(self) -> bool {
        matches!(self, Self::Discrete | Self::Coil)
    }

    pub fn access(self) -> Access {
        match self {
            Self::Discrete | Self::Input => Access::ReadOnly,
            Self::Coil | Self::Holding => Access::ReadWrite,
        }
    }

    pub fn element_width_bits(self) -> u16 {
        if self.is_bit() {
            1
        } else {
            16
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum DataType {
    Bool,
    Int16,
    UInt16,
    Int32,
    Float32,
}

impl DataType {
    /// 占用的 16 位寄存器数（Bool 按 1 个线圈/位计）。
    pub fn register_span(self) -> u16 {
        match self {
            Self::Int32 | Self::Float32 => 2,
            Self::Bool | Self::Int16 | Self::UInt16 => 1,
        }
    }
}

/// 多寄存器值的字序：HighLow 为标准 Modbus 高字在前，LowHigh 为字交换。
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum WordOrder {
    #[default]
    HighLow,
    LowHigh,
}

/// 类型来源：Default 为按名称规则赋的默认类型，Override 为人工指定的
/// 宽类型（如 V 区某标签改为 Float32）。Normalizer 不得把 Override
/// 改回默认值。
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum TypeOrigin {
    #[default]
    Default,
    Override,
}

impl TypeOrigin {
    pub fn is_default(&self) -> bool {
        matches!(self, Self::Default)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub name: String,
    /// 协议地址（内部 0-based）。
    pub address: u16,
    pub register: RegisterArea,
    pub data_type: DataType,
    #[serde(default)]
    pub word_order: WordOrder,
    #[serde(default = "default_scale")]
    pub scale: f64,
    #[serde(default = "default_offset")]
    pub offset: f64,
    #[serde(default, skip_serializing_if = "TypeOrigin::is_default")]
    pub type_origin: TypeOrigin,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AddressRangeInfo {
    pub start: u16,
    pub end: u16,
    pub description: String,
}

/// 完整持久化工件：标签序列 + 家族成员清单 + 地址段表。
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TagsV1 {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub tags: Vec<Tag>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub groups: IndexMap<String, Vec<String>>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub address_ranges: IndexMap<String, AddressRangeInfo>,
}

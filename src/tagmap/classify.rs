//! 标签地址表模块：按名称推导数据类型（生成与修复共用的单一规则）。
//!
//! 规则按前缀长度降序匹配（由 [`MemoryLayout::family_by_prefix`] 保证，
//! 不依赖源代码里的分支顺序）；未知前缀回退 UInt16——这是文档化回退，
//! 不是错误。

use crate::tagmap::layout::{FamilyRange, MemoryLayout, CV_WIDE_FROM_INDEX};
use crate::tagmap::model::DataType;

/// 家族内某序号的默认类型。
///
/// CV 为文档化特例：CV0..=CV47 为 UInt16，CV48..=CV255 为 Int32，
/// 但每个序号仍只占一个地址槽（见 layout 模块头）。
pub fn default_type_at(family: &FamilyRange, index: u16) -> DataType {
    if family.prefix == "CV" {
        if index < CV_WIDE_FROM_INDEX {
            DataType::UInt16
        } else {
            DataType::Int32
        }
    } else {
        family.default_type
    }
}

/// 任意名称的类型推导，全函数：任何输入都有结果，不会报错。
pub fn classify(layout: &MemoryLayout, name: &str) -> DataType {
    let Some(family) = layout.family_by_prefix(name) else {
        return DataType::UInt16;
    };
    match name[family.prefix.len()..].parse::<u16>() {
        Ok(index) => default_type_at(family, index),
        // 序号不可解析时退回家族默认（CV 即 Int16）。
        Err(_) => family.default_type,
    }
}

//! 标签地址表模块：修复既有标签地图的 dataType 字段（幂等字段级补丁）。
//!
//! 约束：
//! - 只改写 `dataType`，严禁重建 Tag 记录（避免丢掉 scale/offset/
//!   enabled/wordOrder 等不归本 pass 所有的字段）
//! - `typeOrigin: Override` 的标签跳过：人工加宽的类型不得改回默认值
//! - 对自身输出再跑一遍必须零改动（幂等）

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::tagmap::classify::classify;
use crate::tagmap::layout::MemoryLayout;
use crate::tagmap::model::{TagsV1, TypeOrigin};

/// 进度日志批大小（对齐原脚本的每 5000 条一报）。
const PROGRESS_EVERY: usize = 5000;

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NormalizeSummary {
    pub total: u32,
    pub changed: u32,
    pub skipped_overrides: u32,
}

pub fn normalize_types(layout: &MemoryLayout, config: &mut TagsV1) -> NormalizeSummary {
    let mut summary = NormalizeSummary {
        total: config.tags.len() as u32,
        ..Default::default()
    };

    for (processed, tag) in config.tags.iter_mut().enumerate() {
        if processed > 0 && processed % PROGRESS_EVERY == 0 {
            debug!(processed, total = summary.total, "normalizing tag types");
        }
        if tag.type_origin == TypeOrigin::Override {
            summary.skipped_overrides += 1;
            continue;
        }
        let expected = classify(layout, &tag.name);
        if tag.data_type != expected {
            tag.data_type = expected;
            summary.changed += 1;
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tagmap::generate::generate_tag_map;
    use crate::tagmap::model::{DataType, RegisterArea, Tag, WordOrder, SCHEMA_VERSION_V1};

    fn tag(name: &str, address: u16, data_type: DataType) -> Tag {
        Tag {
            enabled: true,
            name: name.to_string(),
            address,
            register: RegisterArea::Holding,
            data_type,
            word_order: WordOrder::HighLow,
            scale: 1.0,
            offset: 0.0,
            type_origin: TypeOrigin::Default,
        }
    }

    fn map_of(tags: Vec<Tag>) -> TagsV1 {
        TagsV1 {
            schema_version: SCHEMA_VERSION_V1,
            tags,
            groups: Default::default(),
            address_ranges: Default::default(),
        }
    }

    #[test]
    fn repairs_types_that_drifted_from_the_naming_rule() {
        let layout = MemoryLayout::builtin();
        let mut config = map_of(vec![
            tag("V0", 512, DataType::Bool),    // 手改错：应为 Int16
            tag("V1", 513, DataType::Int16),   // 已正确
            tag("CV48", 16432, DataType::Int16), // 应为 Int32
        ]);

        let summary = normalize_types(&layout, &mut config);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.changed, 2);
        assert_eq!(config.tags[0].data_type, DataType::Int16);
        assert_eq!(config.tags[1].data_type, DataType::Int16);
        assert_eq!(config.tags[2].data_type, DataType::Int32);
    }

    #[test]
    fn second_pass_changes_nothing() {
        let layout = MemoryLayout::builtin();
        let (mut config, _) = generate_tag_map(&layout);
        // 打乱一部分类型，模拟手工编辑。
        config.tags[0].data_type = DataType::Float32;
        config.tags[20000].data_type = DataType::Bool;

        let first = normalize_types(&layout, &mut config);
        assert!(first.changed > 0);
        let after_first = config.clone();

        let second = normalize_types(&layout, &mut config);
        assert_eq!(second.changed, 0);
        assert_eq!(config, after_first);
    }

    #[test]
    fn only_the_data_type_field_is_touched() {
        let layout = MemoryLayout::builtin();
        let mut edited = tag("TV10", 15370, DataType::Float32);
        edited.scale = 0.1;
        edited.offset = -40.0;
        edited.enabled = false;
        edited.word_order = WordOrder::LowHigh;
        let mut config = map_of(vec![edited.clone(), tag("V9", 521, DataType::Int16)]);

        let summary = normalize_types(&layout, &mut config);
        assert_eq!(summary.changed, 1);

        let repaired = &config.tags[0];
        assert_eq!(repaired.data_type, DataType::Int16);
        assert_eq!(repaired.name, edited.name);
        assert_eq!(repaired.address, edited.address);
        assert_eq!(repaired.register, edited.register);
        assert_eq!(repaired.scale, edited.scale);
        assert_eq!(repaired.offset, edited.offset);
        assert_eq!(repaired.enabled, edited.enabled);
        assert_eq!(repaired.word_order, edited.word_order);
        assert_eq!(config.tags.len(), 2);
    }

    #[test]
    fn overridden_types_are_never_downgraded() {
        let layout = MemoryLayout::builtin();
        let mut widened = tag("V100", 612, DataType::Float32);
        widened.type_origin = TypeOrigin::Override;
        let mut config = map_of(vec![widened]);

        let summary = normalize_types(&layout, &mut config);
        assert_eq!(summary.changed, 0);
        assert_eq!(summary.skipped_overrides, 1);
        assert_eq!(config.tags[0].data_type, DataType::Float32);
        assert_eq!(config.tags[0].type_origin, TypeOrigin::Override);
    }

    #[test]
    fn unknown_prefixes_settle_on_uint16() {
        let layout = MemoryLayout::builtin();
        let mut config = map_of(vec![tag("Z5", 42, DataType::Bool)]);
        let summary = normalize_types(&layout, &mut config);
        assert_eq!(summary.changed, 1);
        assert_eq!(config.tags[0].data_type, DataType::UInt16);
    }

    #[test]
    fn freshly_generated_map_is_already_normal() {
        let layout = MemoryLayout::builtin();
        let (mut config, _) = generate_tag_map(&layout);
        let summary = normalize_types(&layout, &mut config);
        assert_eq!(summary.total, 35421);
        assert_eq!(summary.changed, 0);
        assert_eq!(summary.skipped_overrides, 0);
    }
}

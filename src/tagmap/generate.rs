//! 标签地址表模块：从内存布局整表生成标签地图（纯函数，无外部输入）。
//!
//! 输出顺序是对外契约：按布局表顺序逐家族追加，家族内按序号升序。
//! 消费方可能按位置迭代，顺序不可变。持久化由调用方负责（整文件覆盖）。

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::tagmap::classify::default_type_at;
use crate::tagmap::layout::MemoryLayout;
use crate::tagmap::model::{
    AddressRangeInfo, Tag, TagsV1, TypeOrigin, WordOrder, SCHEMA_VERSION_V1,
};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GenerateSummary {
    pub total: u32,
    pub bit_tags: u32,
    pub word_tags: u32,
    pub per_family: IndexMap<String, u32>,
}

pub fn generate_tag_map(layout: &MemoryLayout) -> (TagsV1, GenerateSummary) {
    let mut tags: Vec<Tag> = Vec::new();
    let mut groups: IndexMap<String, Vec<String>> = IndexMap::new();
    let mut address_ranges: IndexMap<String, AddressRangeInfo> = IndexMap::new();
    let mut summary = GenerateSummary {
        total: 0,
        bit_tags: 0,
        word_tags: 0,
        per_family: IndexMap::new(),
    };

    for family in layout.families() {
        debug!(
            prefix = %family.prefix,
            base = family.base,
            count = family.count,
            "generating family"
        );

        let mut members = Vec::with_capacity(family.count as usize);
        for index in 0..family.count {
            let name = format!("{}{}", family.prefix, index);
            tags.push(Tag {
                enabled: true,
                name: name.clone(),
                address: family.base + index,
                register: family.register,
                data_type: default_type_at(family, index),
                word_order: WordOrder::HighLow,
                scale: 1.0,
                offset: 0.0,
                type_origin: TypeOrigin::Default,
            });
            members.push(name);
        }

        summary.total += family.count as u32;
        if family.register.is_bit() {
            summary.bit_tags += family.count as u32;
        } else {
            summary.word_tags += family.count as u32;
        }
        summary
            .per_family
            .insert(family.prefix.clone(), family.count as u32);

        groups.insert(family.group.clone(), members);
        address_ranges.insert(
            family.prefix.clone(),
            AddressRangeInfo {
                start: family.base,
                end: family.end(),
                description: family.description.clone(),
            },
        );
    }

    let config = TagsV1 {
        schema_version: SCHEMA_VERSION_V1,
        tags,
        groups,
        address_ranges,
    };
    (config, summary)
}

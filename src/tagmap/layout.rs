//! 标签地址表模块：控制器内存布局（单一真源，加载时校验）。
//!
//! 约束：
//! - 基址/数量为厂商文档常量，禁止相互推导
//! - 新增家族必须通过同一地址空间（位/字）内的不重叠校验
//! - CV 家族为文档化特例：CV0..=CV47 为 16 位，CV48..=CV255 为 32 位，
//!   但每个序号仍只占一个地址槽（观测数据如此；32 位值按常规应占两个
//!   连续地址，疑为原始映射的历史缺陷，确认硬件映射前保持原样）

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::tagmap::model::{DataType, RegisterArea};

/// CV 家族 16/32 位分界：序号 < 48 为 UInt16，>= 48 为 Int32。
pub const CV_WIDE_FROM_INDEX: u16 = 48;

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("layout entry for group {group} has an empty prefix")]
    EmptyPrefix { group: String },

    #[error("duplicate prefix in layout: {prefix}")]
    DuplicatePrefix { prefix: String },

    #[error("family {prefix} is empty (count = 0)")]
    EmptyFamily { prefix: String },

    #[error("family {prefix} exceeds the 16-bit address space (base={base}, count={count})")]
    AddressOverflow { prefix: String, base: u16, count: u16 },

    #[error("families {left} and {right} overlap in the {space} address space")]
    RangeOverlap {
        left: String,
        right: String,
        space: &'static str,
    },
}

/// 一个符号家族占用的连续协议地址段。
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FamilyRange {
    pub prefix: String,
    pub group: String,
    pub description: String,
    pub register: RegisterArea,
    pub base: u16,
    pub count: u16,
    pub default_type: DataType,
}

impl FamilyRange {
    /// 段末地址（含）。仅对通过校验的布局有意义。
    pub fn end(&self) -> u16 {
        self.base + (self.count - 1)
    }
}

/// 校验过的内存布局。只能经 [`MemoryLayout::new`] 构造，
/// Generator 与 Normalizer 按引用共享同一份。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemoryLayout {
    families: Vec<FamilyRange>,
}

#[derive(Deserialize)]
struct LayoutFile {
    families: Vec<FamilyRange>,
}

impl MemoryLayout {
    pub fn new(families: Vec<FamilyRange>) -> Result<Self, LayoutError> {
        validate(&families)?;
        Ok(Self { families })
    }

    /// 厂商文档内存映射表。常量表的合法性由单元测试钉死。
    pub fn builtin() -> Self {
        Self::new(builtin_families()).expect("builtin memory layout must be valid")
    }

    /// 从 JSON 覆盖文件加载；文件不存在回退内置表，存在但非法则报错。
    pub fn load_from_file(path: &Path) -> Result<Self, LayoutError> {
        if !path.exists() {
            debug!("layout file {} not found, using builtin table", path.display());
            return Ok(Self::builtin());
        }
        let text = std::fs::read_to_string(path)?;
        let raw: LayoutFile = serde_json::from_str(&text)?;
        Self::new(raw.families)
    }

    pub fn families(&self) -> &[FamilyRange] {
        &self.families
    }

    /// 名称的最长前缀匹配（SM 先于 S/M，TV/CV/SV 先于 T/C/S/V）。
    pub fn family_by_prefix(&self, name: &str) -> Option<&FamilyRange> {
        let mut best: Option<&FamilyRange> = None;
        for family in &self.families {
            if name.starts_with(family.prefix.as_str())
                && best.map_or(true, |b| family.prefix.len() > b.prefix.len())
            {
                best = Some(family);
            }
        }
        best
    }

    /// 把名称拆成（家族，序号）。序号不是十进制整数时返回 None。
    pub fn split_name(&self, name: &str) -> Option<(&FamilyRange, u16)> {
        let family = self.family_by_prefix(name)?;
        let index: u16 = name[family.prefix.len()..].parse().ok()?;
        Some((family, index))
    }
}

fn validate(families: &[FamilyRange]) -> Result<(), LayoutError> {
    let mut seen: HashSet<&str> = HashSet::new();
    for family in families {
        if family.prefix.is_empty() {
            return Err(LayoutError::EmptyPrefix {
                group: family.group.clone(),
            });
        }
        if family.count == 0 {
            return Err(LayoutError::EmptyFamily {
                prefix: family.prefix.clone(),
            });
        }
        if !seen.insert(family.prefix.as_str()) {
            return Err(LayoutError::DuplicatePrefix {
                prefix: family.prefix.clone(),
            });
        }
        let end = family.base as u32 + family.count as u32 - 1;
        if end > u16::MAX as u32 {
            return Err(LayoutError::AddressOverflow {
                prefix: family.prefix.clone(),
                base: family.base,
                count: family.count,
            });
        }
    }

    // 位/字地址空间相互独立，各自检查不重叠。
    check_overlap(families, true, "bit")?;
    check_overlap(families, false, "word")?;
    Ok(())
}

fn check_overlap(
    families: &[FamilyRange],
    bit_space: bool,
    space: &'static str,
) -> Result<(), LayoutError> {
    let mut ranges: Vec<&FamilyRange> = families
        .iter()
        .filter(|f| f.register.is_bit() == bit_space)
        .collect();
    ranges.sort_by_key(|f| f.base);
    for pair in ranges.windows(2) {
        if pair[1].base <= pair[0].end() {
            return Err(LayoutError::RangeOverlap {
                left: pair[0].prefix.clone(),
                right: pair[1].prefix.clone(),
                space,
            });
        }
    }
    Ok(())
}

fn family(
    prefix: &str,
    group: &str,
    description: &str,
    register: RegisterArea,
    base: u16,
    count: u16,
    default_type: DataType,
) -> FamilyRange {
    FamilyRange {
        prefix: prefix.to_string(),
        group: group.to_string(),
        description: description.to_string(),
        register,
        base,
        count,
        default_type,
    }
}

fn builtin_families() -> Vec<FamilyRange> {
    use DataType::{Bool, Int16};
    use RegisterArea::{Coil, Discrete, Holding, Input};

    vec![
        family("X", "DigitalInputs", "Digital Inputs (X0-X1023)", Discrete, 0, 1024, Bool),
        family("Y", "DigitalOutputs", "Digital Outputs (Y0-Y1023)", Coil, 1536, 1024, Bool),
        family("M", "InternalRelay", "Auxiliary Relay (M0-M12287)", Coil, 3072, 12288, Bool),
        family("T", "Timers", "Timers (T0-T1023)", Coil, 15360, 1024, Bool),
        family("C", "Counters", "Counters (C0-C255)", Coil, 16384, 256, Bool),
        family("SM", "SystemStatus", "System Status Bits (SM0-SM215)", Coil, 16896, 216, Bool),
        family("S", "StepRelay", "Step Relay (S0-S2047)", Coil, 28672, 2048, Bool),
        family("AI", "AnalogInputs", "Analog Inputs (AI0-AI255)", Input, 0, 256, Int16),
        family("AQ", "AnalogOutputs", "Analog Outputs (AQ0-AQ255)", Holding, 256, 256, Int16),
        family("V", "DataRegisters", "Data Registers (V0-V14847)", Holding, 512, 14848, Int16),
        family("TV", "TimerValues", "Timer Current Values (TV0-TV1023)", Holding, 15360, 1024, Int16),
        // CV0..=CV47 为 UInt16，CV48..=CV255 为 Int32（见模块头），
        // default_type 仅作为序号不可解析时的回退。
        family("CV", "CounterValues", "Counter Current Values (CV0-CV255)", Holding, 16384, 256, Int16),
        family("SV", "SystemRegisters", "System Registers (SV0-SV900)", Holding, 17408, 901, Int16),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_table_matches_vendor_documentation() {
        let layout = MemoryLayout::builtin();
        let rows: Vec<(&str, RegisterArea, u16, u16)> = layout
            .families()
            .iter()
            .map(|f| (f.prefix.as_str(), f.register, f.base, f.count))
            .collect();
        assert_eq!(
            rows,
            vec![
                ("X", RegisterArea::Discrete, 0, 1024),
                ("Y", RegisterArea::Coil, 1536, 1024),
                ("M", RegisterArea::Coil, 3072, 12288),
                ("T", RegisterArea::Coil, 15360, 1024),
                ("C", RegisterArea::Coil, 16384, 256),
                ("SM", RegisterArea::Coil, 16896, 216),
                ("S", RegisterArea::Coil, 28672, 2048),
                ("AI", RegisterArea::Input, 0, 256),
                ("AQ", RegisterArea::Holding, 256, 256),
                ("V", RegisterArea::Holding, 512, 14848),
                ("TV", RegisterArea::Holding, 15360, 1024),
                ("CV", RegisterArea::Holding, 16384, 256),
                ("SV", RegisterArea::Holding, 17408, 901),
            ]
        );
    }

    #[test]
    fn builtin_range_ends_match_documented_bounds() {
        let layout = MemoryLayout::builtin();
        let find = |prefix: &str| {
            layout
                .families()
                .iter()
                .find(|f| f.prefix == prefix)
                .unwrap()
        };
        assert_eq!(find("X").end(), 1023);
        assert_eq!(find("M").end(), 15359);
        assert_eq!(find("S").end(), 30719);
        assert_eq!(find("V").end(), 15359);
        assert_eq!(find("SV").end(), 18308);
    }

    #[test]
    fn longest_prefix_wins() {
        let layout = MemoryLayout::builtin();
        assert_eq!(layout.family_by_prefix("SM5").unwrap().prefix, "SM");
        assert_eq!(layout.family_by_prefix("S5").unwrap().prefix, "S");
        assert_eq!(layout.family_by_prefix("SV3").unwrap().prefix, "SV");
        assert_eq!(layout.family_by_prefix("TV10").unwrap().prefix, "TV");
        assert_eq!(layout.family_by_prefix("T10").unwrap().prefix, "T");
        assert_eq!(layout.family_by_prefix("CV48").unwrap().prefix, "CV");
        assert_eq!(layout.family_by_prefix("C48").unwrap().prefix, "C");
        assert!(layout.family_by_prefix("Z0").is_none());
    }

    #[test]
    fn split_name_requires_decimal_index() {
        let layout = MemoryLayout::builtin();
        let (family, index) = layout.split_name("M12287").unwrap();
        assert_eq!(family.prefix, "M");
        assert_eq!(index, 12287);
        assert!(layout.split_name("CVx").is_none());
        assert!(layout.split_name("SM").is_none());
    }

    #[test]
    fn overlapping_ranges_in_same_space_are_rejected() {
        let families = vec![
            family("A", "GroupA", "A", RegisterArea::Coil, 0, 100, DataType::Bool),
            family("B", "GroupB", "B", RegisterArea::Coil, 99, 10, DataType::Bool),
        ];
        let err = MemoryLayout::new(families).unwrap_err();
        assert!(matches!(
            err,
            LayoutError::RangeOverlap { ref left, ref right, space: "bit" }
                if left == "A" && right == "B"
        ));
    }

    #[test]
    fn bit_and_word_spaces_are_independent() {
        // T（线圈 15360）与 TV（保持寄存器 15360）同基址但不同地址空间。
        let families = vec![
            family("T", "Timers", "T", RegisterArea::Coil, 15360, 1024, DataType::Bool),
            family("TV", "TimerValues", "TV", RegisterArea::Holding, 15360, 1024, DataType::Int16),
        ];
        assert!(MemoryLayout::new(families).is_ok());
    }

    #[test]
    fn duplicate_prefix_is_rejected() {
        let families = vec![
            family("X", "A", "A", RegisterArea::Discrete, 0, 10, DataType::Bool),
            family("X", "B", "B", RegisterArea::Coil, 100, 10, DataType::Bool),
        ];
        assert!(matches!(
            MemoryLayout::new(families),
            Err(LayoutError::DuplicatePrefix { ref prefix }) if prefix == "X"
        ));
    }

    #[test]
    fn range_past_u16_is_rejected() {
        let families = vec![family(
            "V",
            "DataRegisters",
            "V",
            RegisterArea::Holding,
            65000,
            1000,
            DataType::Int16,
        )];
        assert!(matches!(
            MemoryLayout::new(families),
            Err(LayoutError::AddressOverflow { .. })
        ));
    }

    #[test]
    fn empty_family_is_rejected() {
        let families = vec![family("X", "A", "A", RegisterArea::Discrete, 0, 0, DataType::Bool)];
        assert!(matches!(
            MemoryLayout::new(families),
            Err(LayoutError::EmptyFamily { .. })
        ));
    }

    #[test]
    fn missing_layout_file_falls_back_to_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let layout = MemoryLayout::load_from_file(&dir.path().join("layout.json")).unwrap();
        assert_eq!(layout, MemoryLayout::builtin());
    }

    #[test]
    fn invalid_layout_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layout.json");
        std::fs::write(&path, "{\"families\": 1}").unwrap();
        assert!(matches!(
            MemoryLayout::load_from_file(&path),
            Err(LayoutError::Json(_))
        ));
    }
}

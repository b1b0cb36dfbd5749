//! Core tag-map crate.
//! Responsibilities: generate the controller tag map from the documented
//! memory layout and repair tag data types in an existing map.
//! Non-goals: live Modbus I/O and polling (handled by the consuming client).

pub mod tagmap;

pub use tagmap::classify::classify;
pub use tagmap::generate::generate_tag_map;
pub use tagmap::layout::MemoryLayout;
pub use tagmap::model::{Tag, TagsV1};
pub use tagmap::normalize::normalize_types;

pub mod classify;
pub mod generate;
pub mod layout;
pub mod legacy;
pub mod model;
pub mod normalize;
pub mod storage;

pub mod composer;
pub mod field;

pub use composer::{compose, PointSetFamily};
pub use field::OffsetField;

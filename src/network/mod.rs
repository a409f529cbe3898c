pub mod registry;
pub mod segment;

pub use registry::SegmentRegistry;
pub use segment::{BoundarySide, DirectedSegment, SegmentKey, SegmentRecord};

pub mod joint;
pub mod stitcher;

pub use stitcher::{
    split_toward, stitch_between, stitch_with_routes, ResolvedPath, RouteTable, StitchConfig,
};

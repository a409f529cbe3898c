pub mod anchor;
pub mod cache;
pub mod engine;
pub mod error;
pub mod math;
pub mod network;
pub mod offset;
pub mod path;
pub mod route;

pub use error::{Result, WaylineError};

pub mod chain;
pub mod reference;
pub mod resolver;

pub use chain::AnchorChain;
pub use reference::{PairKind, ReferencePair};
pub use resolver::{resolve, Anchor, ResolverConfig};

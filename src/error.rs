use thiserror::Error;

/// Top-level error type for the wayline engine.
#[derive(Debug, Error)]
pub enum WaylineError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Path(#[from] PathError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Invariant(#[from] InvariantError),
}

/// Errors related to geometric computations.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("zero-length vector")]
    ZeroVector,

    #[error("degenerate geometry: {0}")]
    Degenerate(String),
}

/// Recoverable path-resolution failures.
///
/// Callers handle these by keeping the prior chain state ("no change this
/// frame"); they never abort the session.
#[derive(Debug, Error)]
pub enum PathError {
    #[error("no route through the network between the anchors")]
    Unsolvable,
}

/// Configuration the engine cannot honor.
///
/// Surfaced immediately to the caller, never guessed at.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unsupported configuration: {0}")]
    Unsupported(String),
}

/// Internal invariant violations.
///
/// These indicate a bug in the stitcher or offset field, not bad user
/// input. They propagate to the top of the current operation and abort it
/// with no partial mutation committed.
#[derive(Debug, Error)]
pub enum InvariantError {
    #[error("duplicate consecutive points survived deduplication at index {0}")]
    DuplicatePoints(usize),

    #[error("zero-length offset basis at path point {0}")]
    ZeroOffsetBasis(usize),
}

/// Convenience type alias for results using [`WaylineError`].
pub type Result<T> = std::result::Result<T, WaylineError>;

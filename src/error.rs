use thiserror::Error;

/// Fatal conditions the map can raise. Every variant here corresponds to a
/// genuine runtime failure (allocator exhaustion) or a broken invariant
/// (the map's own bookkeeping disagreeing with itself) — never a recoverable
/// user mistake, since the map's public API has no fallible inputs.
#[derive(Error, Debug)]
pub enum MapError {
    #[error("allocation failed")]
    AllocationFailed,

    #[error("table full despite growth threshold")]
    TableFull,

    #[error("duplicate key found while redistributing a split table")]
    DuplicateOnSplit,
}

pub type Result<T> = std::result::Result<T, MapError>;

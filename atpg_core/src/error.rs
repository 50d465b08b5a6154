use thiserror::Error;

/// Error taxonomy for the engine's public API boundary. Internal invariant
/// violations (a structurally guaranteed dominator missing, an id out of
/// range) stay as `panic!`/`unreachable!` inside the engine, matching the
/// original's `ASSERT_COND` aborts — they indicate a bug in the engine, not
/// a malformed input.
#[derive(Debug, Error)]
pub enum AtpgError {
    #[error("malformed network: {0}")]
    MalformedNetwork(String),

    #[error("fault {0:?} is out of scope for this engine instance")]
    FaultOutOfScope(crate::fault::FaultId),

    #[error("SAT solver aborted: {0}")]
    SolverAborted(String),
}

pub type Result<T> = std::result::Result<T, AtpgError>;

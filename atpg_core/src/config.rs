/// Structural scope the engine builds its CNF over for a batch of faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeMode {
    /// One fan-out-free region per `DtpgEngine` instance.
    Ffr,
    /// One maximal fan-out-free cone, covering several FFRs with shared
    /// control variables.
    Mffc,
    /// A single node, no structural sharing.
    SingleNode,
}

/// Back-trace strategy used by the `Justifier` once a fault is detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JustifyStrategy {
    SinglePath,
    AllPath,
}

/// Runtime knobs for a `DtpgEngine`: SAT resource limits and justification
/// strategy, passed explicitly rather than read from global state.
#[derive(Debug, Clone)]
pub struct Config {
    pub scope: ScopeMode,
    pub justify: JustifyStrategy,
    /// Maximum SAT conflicts allowed per fault before the call is treated as
    /// aborted rather than unknown-forever. `None` means no limit.
    pub conflict_limit: Option<u64>,
    /// When true, faults within an FFR/MFFC batch are processed in
    /// ascending id order; otherwise the caller's order is kept as-is.
    pub deterministic_order: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            scope: ScopeMode::Ffr,
            justify: JustifyStrategy::SinglePath,
            conflict_limit: None,
            deterministic_order: true,
        }
    }
}

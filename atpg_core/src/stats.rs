use serde::Serialize;

/// Running counters for a batch of `DtpgEngine::solve` calls. Merged across
/// worker threads in `atpg_cli`'s parallel fault loop.
#[derive(Debug, Default, Clone, Serialize)]
pub struct DtpgStats {
    pub detected: u64,
    pub untestable: u64,
    pub aborted: u64,
    pub sat_calls: u64,
}

impl DtpgStats {
    pub fn merge(&mut self, other: &DtpgStats) {
        self.detected += other.detected;
        self.untestable += other.untestable;
        self.aborted += other.aborted;
        self.sat_calls += other.sat_calls;
    }
}

//! Configuration of a test generation run.
use crate::pattern::CaptureMode;

/// Default number of backtracks before the search for a single fault is aborted.
pub const DEFAULT_BACKTRACK_LIMIT: usize = 500;

/// Configuration of a test generation run.
#[derive(Clone, Debug)]
pub struct AtpgOptions {
    /// Target further faults with the don't care inputs of each generated pattern.
    pub dynamic_compression: bool,
    /// Assign random values to inputs left unassigned by generation.
    pub random_fill: bool,
    /// Number of backtracks after which the search for a fault is aborted.
    pub backtrack_limit: usize,
    /// Seed for the random fill.
    pub seed: u64,
    /// Capture mode recorded in the pattern output.
    pub capture_mode: CaptureMode,
}

impl Default for AtpgOptions {
    fn default() -> Self {
        Self {
            dynamic_compression: true,
            random_fill: false,
            backtrack_limit: DEFAULT_BACKTRACK_LIMIT,
            seed: 0,
            capture_mode: CaptureMode::BasicScan,
        }
    }
}

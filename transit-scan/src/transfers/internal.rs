use crate::domain::StopId;

use super::TransferGenerator;

/// Changes are only possible within a single stop, after a fixed time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InternalTransferGenerator {
    min_change_secs: u32,
}

impl InternalTransferGenerator {
    pub fn new(min_change_secs: u32) -> Self {
        Self { min_change_secs }
    }

    pub fn min_change_secs(&self) -> u32 {
        self.min_change_secs
    }
}

impl TransferGenerator for InternalTransferGenerator {
    fn time_between(&self, from: StopId, to: StopId) -> Option<u32> {
        (from == to).then_some(self.min_change_secs)
    }
}

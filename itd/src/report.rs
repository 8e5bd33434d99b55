/*
 * Copyright 2024 Fluence Labs Limited
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

use std::fmt;

use itd_msr::MSRError;
use itd_msr::ToggleOutcome;

use crate::LogicalCoreId;

/// Outcome of driving the feedback bit on a single logical core.
#[derive(Debug)]
pub struct CoreReport {
    pub core_id: LogicalCoreId,
    pub outcome: Result<ToggleOutcome, MSRError>,
}

impl CoreReport {
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Per-core outcomes of one activation or deactivation pass.
#[derive(Debug)]
pub struct ToggleReport {
    enable: bool,
    cores: Vec<CoreReport>,
}

impl ToggleReport {
    pub(crate) fn new(enable: bool, cores: Vec<CoreReport>) -> Self {
        Self { enable, cores }
    }

    /// Value the pass drove the feedback bit to.
    pub fn enable(&self) -> bool {
        self.enable
    }

    pub fn cores(&self) -> &[CoreReport] {
        &self.cores
    }

    pub fn total(&self) -> usize {
        self.cores.len()
    }

    pub fn succeeded_count(&self) -> usize {
        self.cores.iter().filter(|core| core.is_ok()).count()
    }

    pub fn written_count(&self) -> usize {
        self.cores
            .iter()
            .filter(|core| matches!(&core.outcome, Ok(outcome) if outcome.is_written()))
            .count()
    }

    pub fn unchanged_count(&self) -> usize {
        self.succeeded_count() - self.written_count()
    }

    pub fn failures(&self) -> impl Iterator<Item = (LogicalCoreId, &MSRError)> {
        self.cores
            .iter()
            .filter_map(|core| core.outcome.as_ref().err().map(|error| (core.core_id, error)))
    }

    pub fn failed_count(&self) -> usize {
        self.total() - self.succeeded_count()
    }

    /// True if every enumerated core ended up with the requested bit value.
    pub fn is_complete(&self) -> bool {
        self.failed_count() == 0
    }
}

impl fmt::Display for ToggleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let action = if self.enable { "enabled" } else { "disabled" };
        write!(
            f,
            "feedback {action} on {} of {} logical cores ({} written, {} unchanged, {} failed)",
            self.succeeded_count(),
            self.total(),
            self.written_count(),
            self.unchanged_count(),
            self.failed_count()
        )
    }
}
